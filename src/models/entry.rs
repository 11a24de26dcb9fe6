use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-side moderation verdict for a submitted photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    PendingReview,
    Approved,
    Rejected,
}

/// Payment state of an entry. An entry counts as a contest participation
/// only once this is `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// One user's photo submission to one contest. `id` is assigned by the
/// server; a local draft has none. Statuses are `None` until the
/// corresponding remote check has run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub contest_id: i64,
    pub user_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub camera_model: String,
    #[serde(default)]
    pub settings: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderation_status: Option<ModerationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn is_valid_participation(&self) -> bool {
        self.payment_status == Some(PaymentStatus::Completed)
    }

    /// Leftover record from an interrupted session; a purge target.
    pub fn is_pending_payment(&self) -> bool {
        self.payment_status == Some(PaymentStatus::Pending)
    }
}

/// User-editable free-text metadata, mutable until submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub camera_model: String,
    #[serde(default)]
    pub settings: String,
}

/// Photo binary staged locally after a successful drop; never sent anywhere
/// until a moderation or upload call is made.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Result of the stateless moderation check; does not persist an entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationVerdict {
    pub moderation_status: ModerationStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// Query filter for the user-photos listing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PhotoFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contest_id: Option<i64>,
}
