use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::analytics::ScanRecorder;
use crate::content::{maps_search_url, VCardFields};
use crate::models::{QrAction, QrRecord, QrType, ScanContext};
use crate::storage::Storage;

use super::dispatcher::ActionDispatcher;
use super::outcome::{DownloadFile, FailureKind, ResolutionOutcome, TapOutcome};
use super::selector::MultiUrlSelector;

/// The store could not be read, so no decision was possible
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("storage lookup failed: {0}")]
    Storage(#[source] anyhow::Error),
}

/// Decides what a scan of a QR record should do.
///
/// One call per scan: look the record up, fire the scan recorder without waiting for it, then
/// dispatch on the record type.
pub struct RedirectResolver {
    storage: Arc<dyn Storage>,
    recorder: Option<Arc<dyn ScanRecorder>>,
    selector: MultiUrlSelector,
    dispatcher: ActionDispatcher,
}

impl RedirectResolver {
    pub fn new(storage: Arc<dyn Storage>, recorder: Option<Arc<dyn ScanRecorder>>) -> Self {
        Self {
            storage,
            recorder,
            selector: MultiUrlSelector,
            dispatcher: ActionDispatcher,
        }
    }

    pub async fn resolve(
        &self,
        qr_id: &str,
        context: ScanContext,
    ) -> Result<ResolutionOutcome, ResolveError> {
        let Some(record) = self.load_active(qr_id).await? else {
            return Ok(ResolutionOutcome::Failure(FailureKind::NotFoundOrInactive));
        };

        if let Some(recorder) = &self.recorder {
            recorder.record(&record.id, context);
        }

        let outcome = self.dispatch(&record).await?;
        debug!(qr_id = %record.id, qr_type = %record.qr_type, ?outcome, "scan resolved");
        Ok(outcome)
    }

    /// Menu of a multi-action record without counting a scan
    pub async fn menu(&self, qr_id: &str) -> Result<ResolutionOutcome, ResolveError> {
        match self.load_active(qr_id).await? {
            Some(record) if record.qr_type == QrType::MultiAction => Ok(
                ResolutionOutcome::ActionMenu(self.active_actions(&record.id).await?),
            ),
            _ => Ok(ResolutionOutcome::Failure(FailureKind::NotFoundOrInactive)),
        }
    }

    /// Handle one tap on a multi-action menu entry. Taps are not logged as scans.
    pub async fn tap(&self, qr_id: &str, action_id: &str) -> Result<TapOutcome, ResolveError> {
        let Some(record) = self.load_active(qr_id).await? else {
            return Ok(TapOutcome::Failure(FailureKind::NotFoundOrInactive));
        };
        if record.qr_type != QrType::MultiAction {
            return Ok(TapOutcome::Failure(FailureKind::NotFoundOrInactive));
        }

        let actions = self.active_actions(&record.id).await?;
        let Some(action) = actions.iter().find(|a| a.id == action_id) else {
            return Ok(TapOutcome::Failure(FailureKind::NotFoundOrInactive));
        };

        Ok(self
            .dispatcher
            .dispatch_menu_action(action)
            .unwrap_or_else(TapOutcome::Failure))
    }

    /// Record by id, only if it exists and is active
    async fn load_active(&self, qr_id: &str) -> Result<Option<QrRecord>, ResolveError> {
        let qr_id = qr_id.trim();
        if qr_id.is_empty() {
            return Ok(None);
        }

        let record = self
            .storage
            .get_qr_record(qr_id)
            .await
            .map_err(ResolveError::Storage)?;

        Ok(record.filter(|r| r.is_active))
    }

    async fn active_actions(&self, qr_id: &str) -> Result<Vec<QrAction>, ResolveError> {
        let mut actions = self
            .storage
            .get_qr_actions(qr_id)
            .await
            .map_err(ResolveError::Storage)?;

        // Stores are expected to filter and order already; keep the contract if one does not
        actions.retain(|a| a.is_active);
        actions.sort_by_key(|a| a.display_order);
        Ok(actions)
    }

    async fn dispatch(&self, record: &QrRecord) -> Result<ResolutionOutcome, ResolveError> {
        let outcome = match &record.qr_type {
            QrType::Static | QrType::Dynamic | QrType::Unknown(_) => direct_redirect(record),
            QrType::MultiUrl => match self.selector.select(&record.multi_urls) {
                Some(url) if !url.trim().is_empty() => ResolutionOutcome::redirect(url),
                _ => ResolutionOutcome::Failure(FailureKind::NoDestination),
            },
            QrType::Action => match self
                .dispatcher
                .dispatch(record.action_type.as_deref(), record.action_data.as_ref())
            {
                Ok(action) => ResolutionOutcome::ImmediateAction(action),
                Err(kind) => ResolutionOutcome::Failure(kind),
            },
            QrType::Geo => match record.geo_data.as_ref().and_then(maps_search_url) {
                Some(url) => ResolutionOutcome::redirect(&url),
                None => ResolutionOutcome::Failure(FailureKind::InvalidLocation),
            },
            QrType::MultiAction => ResolutionOutcome::ActionMenu(self.active_actions(&record.id).await?),
            QrType::Vcard => match record.destination() {
                Some(card) => {
                    let stem = vcard_file_stem(record);
                    ResolutionOutcome::Download(DownloadFile::vcard(&stem, card.to_string()))
                }
                None => ResolutionOutcome::Failure(FailureKind::NoDestination),
            },
            QrType::Event => match record.destination() {
                Some(ics) => ResolutionOutcome::Download(DownloadFile::calendar("event", ics.to_string())),
                None => ResolutionOutcome::Failure(FailureKind::NoDestination),
            },
            QrType::Text => match record.destination() {
                Some(text) => ResolutionOutcome::Text(text.to_string()),
                None => ResolutionOutcome::Failure(FailureKind::NoDestination),
            },
        };

        Ok(outcome)
    }
}

/// Static, dynamic and unrecognized types all redirect to `destination_url`
fn direct_redirect(record: &QrRecord) -> ResolutionOutcome {
    match record.destination() {
        Some(url) => ResolutionOutcome::redirect(url),
        None => ResolutionOutcome::Failure(FailureKind::NoDestination),
    }
}

/// File name for a stored vCard: the contact name from `action_data` when the editor kept the
/// source fields there, otherwise "contact"
fn vcard_file_stem(record: &QrRecord) -> String {
    record
        .action_data
        .clone()
        .and_then(|data| serde_json::from_value::<VCardFields>(data).ok())
        .unwrap_or_default()
        .file_stem()
}
