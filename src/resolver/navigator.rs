use crate::models::QrAction;

use super::outcome::{DownloadFile, FailureKind, ImmediateAction};

/// Host-side capability that carries out a resolution decision.
///
/// The redirect server implements this with HTTP responses; tests use recording navigators.
pub trait Navigator {
    type Output;

    /// Navigate the whole page to an already normalized URL
    fn redirect(&self, url: &str) -> Self::Output;

    /// Hand a `tel:`/`sms:`/`mailto:`/deep-link URI to the protocol handler
    fn invoke(&self, action: &ImmediateAction) -> Self::Output;

    fn open_in_new_context(&self, url: &str) -> Self::Output;

    fn download(&self, file: &DownloadFile) -> Self::Output;

    fn show_text(&self, text: &str) -> Self::Output;

    fn show_menu(&self, actions: &[QrAction]) -> Self::Output;

    fn fail(&self, kind: &FailureKind) -> Self::Output;
}
