use serde::Serialize;

use crate::models::QrAction;

use super::navigator::Navigator;

/// Why a scan could not be sent anywhere
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureKind {
    NotFoundOrInactive,
    NoDestination,
    InvalidLocation,
    UnknownAction(String),
    MissingField(&'static str),
}

impl FailureKind {
    /// Message shown to the scanning user
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureKind::NotFoundOrInactive | FailureKind::NoDestination => {
                "QR code not found or inactive"
            }
            FailureKind::InvalidLocation => "This QR code has no valid location",
            FailureKind::UnknownAction(_) => "This QR code uses an unsupported action",
            FailureKind::MissingField(_) => "This QR code is missing required information",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::NotFoundOrInactive => f.write_str("not found or inactive"),
            FailureKind::NoDestination => f.write_str("no destination"),
            FailureKind::InvalidLocation => f.write_str("invalid location"),
            FailureKind::UnknownAction(kind) => write!(f, "unknown action '{kind}'"),
            FailureKind::MissingField(field) => write!(f, "missing field '{field}'"),
        }
    }
}

/// Protocol handler family of an immediate action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImmediateKind {
    Email,
    Phone,
    Sms,
    Whatsapp,
    Maps,
}

/// A URI to hand straight to the platform's protocol handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImmediateAction {
    pub kind: ImmediateKind,
    pub uri: String,
}

/// A document generated for the client to save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

impl DownloadFile {
    pub fn vcard(stem: &str, body: String) -> Self {
        Self {
            filename: format!("{stem}.vcf"),
            content_type: "text/vcard; charset=utf-8",
            body,
        }
    }

    pub fn calendar(stem: &str, body: String) -> Self {
        Self {
            filename: format!("{stem}.ics"),
            content_type: "text/calendar; charset=utf-8",
            body,
        }
    }
}

/// Terminal result of resolving one scan
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    /// Full-page navigation; the URL is already normalized
    Redirect(String),
    /// Active menu entries ordered by display order
    ActionMenu(Vec<QrAction>),
    ImmediateAction(ImmediateAction),
    Download(DownloadFile),
    Text(String),
    Failure(FailureKind),
}

impl ResolutionOutcome {
    /// Redirect outcome with scheme normalization applied
    pub fn redirect(url: &str) -> Self {
        ResolutionOutcome::Redirect(normalize_url(url))
    }

    pub fn navigate<N: Navigator + ?Sized>(self, navigator: &N) -> N::Output {
        match self {
            ResolutionOutcome::Redirect(url) => navigator.redirect(&url),
            ResolutionOutcome::ActionMenu(actions) => navigator.show_menu(&actions),
            ResolutionOutcome::ImmediateAction(action) => navigator.invoke(&action),
            ResolutionOutcome::Download(file) => navigator.download(&file),
            ResolutionOutcome::Text(text) => navigator.show_text(&text),
            ResolutionOutcome::Failure(kind) => navigator.fail(&kind),
        }
    }
}

/// Result of one tap on a menu entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    Immediate(ImmediateAction),
    OpenInNewContext(String),
    Download(DownloadFile),
    Failure(FailureKind),
}

impl TapOutcome {
    pub fn navigate<N: Navigator + ?Sized>(self, navigator: &N) -> N::Output {
        match self {
            TapOutcome::Immediate(action) => navigator.invoke(&action),
            TapOutcome::OpenInNewContext(url) => navigator.open_in_new_context(&url),
            TapOutcome::Download(file) => navigator.download(&file),
            TapOutcome::Failure(kind) => navigator.fail(&kind),
        }
    }
}

/// Prefix `https://` unless the URL already carries an http(s) scheme.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
