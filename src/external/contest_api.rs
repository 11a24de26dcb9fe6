use reqwest::Client;
use reqwest::multipart::{Form, Part};
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    ApiResponse, ChargeOutcome, ChargeRequest, Entry, EntryMetadata, ModerationVerdict,
    PhotoFilter, StagedFile,
};
use crate::session::SessionContext;

/// Everything the submission flow sends to the contest REST API.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub contest_id: i64,
    pub metadata: EntryMetadata,
    pub file: StagedFile,
}

/// Contest REST API as consumed by the flow. The concrete client talks HTTP;
/// tests substitute scripted implementations.
pub trait ContestApi {
    /// Persists the entry server-side with payment still pending.
    fn upload_photo(&self, payload: &UploadPayload)
    -> impl Future<Output = AppResult<Entry>> + Send;
    /// Stateless moderation check; persists nothing.
    fn moderate_photo(
        &self,
        payload: &UploadPayload,
    ) -> impl Future<Output = AppResult<ModerationVerdict>> + Send;
    fn delete_entry(&self, entry_id: i64) -> impl Future<Output = AppResult<()>> + Send;
    fn list_user_photos(
        &self,
        filter: &PhotoFilter,
    ) -> impl Future<Output = AppResult<Vec<Entry>>> + Send;
    /// Charges the entry fee for a persisted entry.
    fn charge(
        &self,
        entry_id: i64,
        payment_method_id: &str,
        amount_cents: i64,
    ) -> impl Future<Output = AppResult<ChargeOutcome>> + Send;
}

#[derive(Clone)]
pub struct ContestApiClient {
    client: Client,
    config: ApiConfig,
    session: SessionContext,
}

impl ContestApiClient {
    pub fn new(config: ApiConfig, session: SessionContext) -> Self {
        let client = Client::builder()
            .user_agent("photocontest-client")
            .build()
            .expect("reqwest client");
        Self {
            client,
            config,
            session,
        }
    }

    fn photo_form(payload: &UploadPayload) -> AppResult<Form> {
        let part = Part::bytes(payload.file.bytes.clone())
            .file_name(payload.file.file_name.clone())
            .mime_str(&payload.file.mime)
            .map_err(|e| AppError::InternalError(format!("invalid mime type: {e}")))?;

        Ok(Form::new()
            .part("photo", part)
            .text("contest_id", payload.contest_id.to_string())
            .text("title", payload.metadata.title.clone())
            .text("description", payload.metadata.description.clone())
            .text("location", payload.metadata.location.clone())
            .text("camera_model", payload.metadata.camera_model.clone())
            .text("settings", payload.metadata.settings.clone()))
    }
}

impl ContestApi for ContestApiClient {
    async fn upload_photo(&self, payload: &UploadPayload) -> AppResult<Entry> {
        let url = format!("{}/photos", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.session.bearer_token())
            .multipart(Self::photo_form(payload)?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApiError(format!(
                "photo upload failed: HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let result: ApiResponse<Entry> = response.json().await?;
        result.into_data("photo upload")
    }

    async fn moderate_photo(&self, payload: &UploadPayload) -> AppResult<ModerationVerdict> {
        let url = format!("{}/photos/moderate", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.session.bearer_token())
            .multipart(Self::photo_form(payload)?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApiError(format!(
                "moderation check failed: HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let result: ApiResponse<ModerationVerdict> = response.json().await?;
        result.into_data("moderation check")
    }

    async fn delete_entry(&self, entry_id: i64) -> AppResult<()> {
        let url = format!("{}/photos/{entry_id}", self.config.base_url);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(self.session.bearer_token())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApiError(format!(
                "entry delete failed: HTTP {}",
                status.as_u16()
            )));
        }

        log::info!("deleted entry {entry_id}");
        Ok(())
    }

    async fn list_user_photos(&self, filter: &PhotoFilter) -> AppResult<Vec<Entry>> {
        let url = format!("{}/users/me/photos", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.session.bearer_token())
            .query(filter)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApiError(format!(
                "photo listing failed: HTTP {}",
                status.as_u16()
            )));
        }

        let result: ApiResponse<Vec<Entry>> = response.json().await?;
        result.into_data("photo listing")
    }

    async fn charge(
        &self,
        entry_id: i64,
        payment_method_id: &str,
        amount_cents: i64,
    ) -> AppResult<ChargeOutcome> {
        let url = format!("{}/payments/charge", self.config.base_url);

        let request = ChargeRequest {
            entry_id,
            payment_method_id: payment_method_id.to_string(),
            amount_cents,
            idempotency_key: Uuid::new_v4().to_string(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.session.bearer_token())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApiError(format!(
                "charge request failed: HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let result: ApiResponse<ChargeOutcome> = response.json().await?;
        result.into_data("charge")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StagedFile;

    #[test]
    fn builds_multipart_form_with_all_metadata_parts() {
        let payload = UploadPayload {
            contest_id: 3,
            metadata: EntryMetadata {
                title: "Tramonto".to_string(),
                description: "Tramonto sul mare".to_string(),
                location: "Camogli".to_string(),
                camera_model: "X-T4".to_string(),
                settings: "f/8 1/250 ISO 200".to_string(),
            },
            file: StagedFile {
                file_name: "tramonto.jpg".to_string(),
                mime: "image/jpeg".to_string(),
                bytes: vec![0xFF, 0xD8, 0xFF],
            },
        };
        assert!(ContestApiClient::photo_form(&payload).is_ok());
    }

    #[test]
    fn rejects_malformed_mime_when_building_form() {
        let payload = UploadPayload {
            contest_id: 3,
            metadata: EntryMetadata::default(),
            file: StagedFile {
                file_name: "x".to_string(),
                mime: "not a mime".to_string(),
                bytes: vec![],
            },
        };
        assert!(ContestApiClient::photo_form(&payload).is_err());
    }
}
