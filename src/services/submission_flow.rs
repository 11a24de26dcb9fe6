use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::cache::{CacheKey, QueryCache, entry_dependents};
use crate::config::{FlowConfig, UploadConfig};
use crate::error::{AppError, AppResult};
use crate::external::{ContestApi, PaymentGateway, UploadPayload};
use crate::models::{
    CardDetails, Entry, EntryMetadata, ModerationStatus, ModerationVerdict, PaymentStatus,
    PhotoFilter, StagedFile,
};
use crate::services::navigation::{Navigator, Route};
use crate::session::SessionContext;
use crate::utils::file_intake::{DroppedFile, PhotoPreview, validate_drop};
use crate::utils::messages;

/// States of the entry submission lifecycle. `Uploading` and `Moderating`
/// cover one moderation request; the split between them is purely visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Uploading,
    Moderating,
    Approved,
    Pending,
    PendingReview,
    Rejected,
    Payment,
    PaymentRequiresConfirmation,
    Completed,
    Failed,
    AlreadyParticipating,
}

impl FlowState {
    /// Payment is gated on at least automated clearance: manual review may
    /// still be outstanding, but a rejected or unchecked photo is never
    /// charged.
    pub fn allows_payment(&self) -> bool {
        matches!(self, FlowState::Approved | FlowState::PendingReview)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Completed | FlowState::AlreadyParticipating)
    }
}

/// Construction parameters that are not collaborators.
#[derive(Debug, Clone)]
pub struct FlowParams {
    pub contest_id: i64,
    pub entry_fee_cents: i64,
    pub session: SessionContext,
    pub flow: FlowConfig,
    pub upload: UploadConfig,
}

/// Drives one entry submission for one (user, contest) pair: file intake,
/// moderation, payment and the cache/navigation side effects of each
/// transition. All operations take `&mut self`; the current state is the
/// mutual-exclusion mechanism, so at most one moderation and one payment
/// request is ever outstanding. Dropping the flow cancels anything in
/// flight.
pub struct SubmissionFlow<A, P, N> {
    params: FlowParams,
    api: A,
    gateway: P,
    navigator: N,
    cache: QueryCache,

    state: FlowState,
    state_tx: watch::Sender<FlowState>,
    staged: Option<StagedFile>,
    preview: Option<PhotoPreview>,
    metadata: EntryMetadata,
    entry: Option<Entry>,
    verdict: Option<ModerationVerdict>,
    error_message: Option<String>,
    notice: Option<String>,
}

impl<A, P, N> SubmissionFlow<A, P, N>
where
    A: ContestApi + Clone,
    P: PaymentGateway + Clone,
    N: Navigator,
{
    /// Construct the flow and reconcile existing server state before any
    /// input is accepted: a completed entry short-circuits to the read-only
    /// "already participating" view, and stale pending-payment leftovers
    /// from interrupted sessions are purged.
    pub async fn mount(
        params: FlowParams,
        api: A,
        gateway: P,
        navigator: N,
        cache: QueryCache,
    ) -> AppResult<Self> {
        let (state_tx, _) = watch::channel(FlowState::Idle);
        let mut flow = Self {
            params,
            api,
            gateway,
            navigator,
            cache,
            state: FlowState::Idle,
            state_tx,
            staged: None,
            preview: None,
            metadata: EntryMetadata::default(),
            entry: None,
            verdict: None,
            error_message: None,
            notice: None,
        };
        flow.reconcile_existing_entries().await?;
        Ok(flow)
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Watch the state from outside the flow, e.g. for progress indicators
    /// while a request is awaited.
    pub fn observe_state(&self) -> watch::Receiver<FlowState> {
        self.state_tx.subscribe()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn preview(&self) -> Option<&PhotoPreview> {
        self.preview.as_ref()
    }

    pub fn entry(&self) -> Option<&Entry> {
        self.entry.as_ref()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.verdict.as_ref().and_then(|v| v.rejection_reason.as_deref())
    }

    /// Metadata stays editable until submission.
    pub fn set_metadata(&mut self, metadata: EntryMetadata) -> AppResult<()> {
        self.ensure_state("edit metadata", &[FlowState::Idle, FlowState::Failed])?;
        self.metadata = metadata;
        Ok(())
    }

    pub fn metadata(&self) -> &EntryMetadata {
        &self.metadata
    }

    /// Handle a drop on the file target. Filter failures set the inline
    /// message and leave the state untouched; a passing file is staged and
    /// a local preview is built.
    pub fn stage_file(&mut self, files: &[DroppedFile]) -> AppResult<()> {
        self.ensure_state("stage a file", &[FlowState::Idle, FlowState::Failed])?;
        match validate_drop(files, self.params.upload.max_file_size_bytes) {
            Ok(staged) => {
                self.preview = Some(PhotoPreview::for_file(&staged));
                self.staged = Some(staged);
                self.error_message = None;
            }
            Err(rejection) => {
                log::warn!("file drop refused: {rejection:?}");
                self.error_message = Some(rejection.user_message().to_string());
            }
        }
        Ok(())
    }

    /// Submit the staged photo for moderation. Validation failures never
    /// leave `Idle`; transport failures land in `Failed` with the draft
    /// preserved, and `submit` may simply be called again to retry.
    pub async fn submit(&mut self) -> AppResult<()> {
        self.ensure_state("submit", &[FlowState::Idle, FlowState::Failed])?;

        let Some(file) = self.staged.clone() else {
            self.error_message = Some(messages::NO_FILE_STAGED.to_string());
            return Ok(());
        };
        if self.metadata.title.trim().is_empty() {
            self.error_message = Some(messages::TITLE_REQUIRED.to_string());
            return Ok(());
        }

        self.error_message = None;
        self.set_state(FlowState::Uploading);

        let payload = UploadPayload {
            contest_id: self.params.contest_id,
            metadata: self.metadata.clone(),
            file,
        };

        // The real request raced against the minimum-display timer. The
        // timer firing first only flips the visible state; the disabled
        // guard keeps the finished timer from being polled again.
        let api = self.api.clone();
        let request = api.moderate_photo(&payload);
        tokio::pin!(request);
        let min_display = sleep(Duration::from_millis(self.params.flow.min_upload_display_ms));
        tokio::pin!(min_display);

        let verdict = loop {
            tokio::select! {
                () = &mut min_display, if self.state == FlowState::Uploading => {
                    self.set_state(FlowState::Moderating);
                }
                result = &mut request => break result,
            }
        };

        match verdict {
            Ok(verdict) => {
                self.invalidate_entry_queries();
                self.apply_verdict(verdict);
                Ok(())
            }
            Err(err) => {
                let (_, message) = err.user_message();
                log::error!("moderation request failed: {err}");
                self.error_message = Some(message);
                self.set_state(FlowState::Failed);
                Ok(())
            }
        }
    }

    fn apply_verdict(&mut self, verdict: ModerationVerdict) {
        let next = match verdict.moderation_status {
            ModerationStatus::Approved => FlowState::Approved,
            ModerationStatus::Pending => FlowState::Pending,
            ModerationStatus::PendingReview => {
                // Manual review must not block payment, but publication is
                // deferred and the user has to know.
                self.notice = Some(messages::PENDING_REVIEW_NOTICE.to_string());
                FlowState::PendingReview
            }
            ModerationStatus::Rejected => {
                log::info!(
                    "photo rejected for contest {}: {:?}",
                    self.params.contest_id,
                    verdict.rejection_reason
                );
                FlowState::Rejected
            }
        };
        self.verdict = Some(verdict);
        self.set_state(next);
    }

    /// Proceed to payment. The entry is persisted server-side here, payment
    /// pending, because the charge needs an entry id; the moderation call
    /// itself persists nothing.
    pub async fn pay(&mut self) -> AppResult<()> {
        if !self.state.allows_payment() {
            return Err(AppError::InvalidState(format!(
                "cannot pay while {:?}",
                self.state
            )));
        }

        if self.entry.is_none() {
            let Some(file) = self.staged.clone() else {
                return Err(AppError::InternalError(
                    "no staged file for a cleared submission".to_string(),
                ));
            };
            let payload = UploadPayload {
                contest_id: self.params.contest_id,
                metadata: self.metadata.clone(),
                file,
            };
            match self.api.upload_photo(&payload).await {
                Ok(entry) => {
                    log::info!(
                        "entry {:?} persisted for contest {}, payment pending",
                        entry.id,
                        self.params.contest_id
                    );
                    self.entry = Some(entry);
                }
                Err(err) => {
                    // Transient: stay in the cleared moderation state so the
                    // user can retry without losing anything.
                    let (_, message) = err.user_message();
                    self.error_message = Some(message);
                    return Ok(());
                }
            }
        }

        self.set_state(FlowState::Payment);
        Ok(())
    }

    /// Charge the entry fee with the collected card. Declines return to the
    /// pre-payment state with the provider's message; transport anomalies
    /// reset the whole flow to guarantee client/server consistency.
    pub async fn submit_card(&mut self, card: &CardDetails) -> AppResult<()> {
        self.ensure_state("submit card details", &[FlowState::Payment])?;

        let entry_id = self
            .entry
            .as_ref()
            .and_then(|e| e.id)
            .ok_or_else(|| AppError::InternalError("payment without persisted entry".to_string()))?;

        let gateway = self.gateway.clone();
        let payment_method_id = match gateway.create_payment_method(card).await {
            Ok(id) => id,
            // Provider refused the card itself: a decline, not an anomaly.
            Err(AppError::PaymentError(msg)) => {
                self.return_to_pre_payment(Some(msg));
                return Ok(());
            }
            Err(err) => return self.handle_payment_failure(err).await,
        };

        let charge_result = self
            .api
            .charge(entry_id, &payment_method_id, self.params.entry_fee_cents)
            .await;
        let outcome = match charge_result {
            Ok(outcome) => outcome,
            Err(err) => return self.handle_payment_failure(err).await,
        };

        if outcome.requires_action {
            let Some(client_secret) = outcome.client_secret.clone() else {
                return self
                    .handle_payment_failure(AppError::PaymentError(
                        "requires_action without client secret".to_string(),
                    ))
                    .await;
            };
            self.set_state(FlowState::PaymentRequiresConfirmation);
            return match gateway.confirm_card_payment(&client_secret).await {
                Ok(confirmation) if confirmation.succeeded() => {
                    self.complete_payment(outcome.transaction_id)
                }
                Ok(confirmation) => {
                    log::warn!("card confirmation ended as {:?}", confirmation.status);
                    self.return_to_pre_payment(outcome.message);
                    Ok(())
                }
                Err(AppError::PaymentError(msg)) => {
                    self.return_to_pre_payment(Some(msg));
                    Ok(())
                }
                Err(err) => self.handle_payment_failure(err).await,
            };
        }

        if outcome.success {
            self.complete_payment(outcome.transaction_id)
        } else {
            self.return_to_pre_payment(outcome.message);
            Ok(())
        }
    }

    /// Start over after a rejection: new photo, clean form, no charge was
    /// ever made.
    pub fn retry_new_photo(&mut self) -> AppResult<()> {
        self.ensure_state("retry with a new photo", &[FlowState::Rejected])?;
        self.clear_draft();
        self.verdict = None;
        self.error_message = None;
        self.set_state(FlowState::Idle);
        Ok(())
    }

    /// Explicit reset from any non-terminal state: delete the server entry
    /// if one exists (exactly once), clear all local state, return to
    /// `Idle`. Idempotent.
    pub async fn reset(&mut self) -> AppResult<()> {
        if self.state.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "cannot reset while {:?}",
                self.state
            )));
        }

        if let Some(id) = self.entry.as_ref().and_then(|e| e.id) {
            if let Err(err) = self.api.delete_entry(id).await {
                // Reset must always land in Idle; the orphan is picked up by
                // the next mount's reconciliation.
                log::warn!("could not delete entry {id} during reset: {err}");
            }
            self.invalidate_entry_queries();
        }
        self.entry = None;
        self.verdict = None;
        self.clear_draft();
        self.error_message = None;
        self.notice = None;
        self.set_state(FlowState::Idle);
        Ok(())
    }

    async fn reconcile_existing_entries(&mut self) -> AppResult<()> {
        let filter = PhotoFilter {
            contest_id: Some(self.params.contest_id),
        };
        let entries = self.api.list_user_photos(&filter).await?;

        if let Some(completed) = entries.iter().find(|e| e.is_valid_participation()) {
            log::info!(
                "user {} already participates in contest {} with entry {:?}",
                self.params.session.user_id,
                self.params.contest_id,
                completed.id
            );
            self.entry = Some(completed.clone());
            self.set_state(FlowState::AlreadyParticipating);
            return Ok(());
        }

        let mut purged = false;
        for stale in entries.iter().filter(|e| e.is_pending_payment()) {
            if let Some(id) = stale.id {
                log::warn!("purging stale pending-payment entry {id}");
                // Mount must not fail over a leftover we could not remove;
                // the orphan stays for the next reconciliation pass.
                if let Err(err) = self.api.delete_entry(id).await {
                    log::warn!("could not purge stale entry {id}: {err}");
                }
                purged = true;
            }
        }
        if purged {
            self.invalidate_entry_queries();
        }
        Ok(())
    }

    fn complete_payment(&mut self, transaction_id: Option<String>) -> AppResult<()> {
        if let Some(entry) = self.entry.as_mut() {
            entry.payment_status = Some(PaymentStatus::Completed);
        }
        log::info!(
            "entry fee captured for contest {} (transaction {:?})",
            self.params.contest_id,
            transaction_id
        );
        self.invalidate_entry_queries();
        self.error_message = None;
        self.notice = Some(messages::UPLOAD_SUCCESS.to_string());
        self.set_state(FlowState::Completed);
        self.navigator.schedule(
            Route::Contest(self.params.contest_id),
            Duration::from_millis(self.params.flow.redirect_delay_ms),
        );
        Ok(())
    }

    /// Business decline: no fee captured, draft and pending entry kept, the
    /// user may try another card from the same place.
    fn return_to_pre_payment(&mut self, provider_message: Option<String>) {
        let message =
            provider_message.unwrap_or_else(|| "Pagamento rifiutato dalla banca".to_string());
        log::warn!("charge declined: {message}");
        self.error_message = Some(message);
        let back = match self.verdict.as_ref().map(|v| v.moderation_status) {
            Some(ModerationStatus::PendingReview) => FlowState::PendingReview,
            _ => FlowState::Approved,
        };
        self.set_state(back);
    }

    /// Transport anomaly during payment: the server may hold partial state,
    /// so purge the pending entry, invalidate and refetch every dependent
    /// query and reset the local form entirely. Costly, but consistent.
    async fn handle_payment_failure(&mut self, err: AppError) -> AppResult<()> {
        log::error!("payment failed, resetting flow: {err}");

        if let Some(id) = self.entry.as_ref().and_then(|e| e.id) {
            if let Err(del_err) = self.api.delete_entry(id).await {
                log::warn!("could not purge pending entry {id}: {del_err}");
            }
        }
        self.entry = None;
        self.verdict = None;
        self.invalidate_entry_queries();
        self.refetch_user_photos().await;
        self.clear_draft();
        self.error_message = Some(messages::PAYMENT_RESET.to_string());
        self.notice = None;
        self.set_state(FlowState::Idle);
        Ok(())
    }

    fn invalidate_entry_queries(&self) {
        self.cache.invalidate(&entry_dependents(
            self.params.session.user_id,
            self.params.contest_id,
        ));
    }

    async fn refetch_user_photos(&mut self) {
        // The user-photos key spans all contests, so the repopulating fetch
        // must not be contest-scoped.
        let filter = PhotoFilter::default();
        match self.api.list_user_photos(&filter).await {
            Ok(entries) => {
                let value = serde_json::to_value(&entries).unwrap_or_default();
                self.cache.put(
                    CacheKey::UserPhotos {
                        user_id: self.params.session.user_id,
                    },
                    value,
                );
            }
            Err(err) => log::warn!("refetch after payment failure failed: {err}"),
        }
    }

    fn clear_draft(&mut self) {
        self.staged = None;
        self.preview = None;
        self.metadata = EntryMetadata::default();
    }

    fn ensure_state(&self, action: &str, allowed: &[FlowState]) -> AppResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(AppError::InvalidState(format!(
                "cannot {action} while {:?}",
                self.state
            )))
        }
    }

    fn set_state(&mut self, next: FlowState) {
        log::debug!("flow state {:?} -> {next:?}", self.state);
        self.state = next;
        self.state_tx.send_replace(next);
    }
}
