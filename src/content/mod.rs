//! Content encoders
//!
//! Pure string builders that turn a QR payload into the exact text or URI to encode or act
//! upon. Optional fields that are absent or blank are left out entirely, and the line/parameter
//! order of every format is fixed so the output is deterministic.

pub mod event;
pub mod uri;
pub mod vcard;

pub use event::{encode_event, EventFields};
pub use uri::{
    directions_url, geo_uri, mailto_uri, maps_search_url, sms_uri, social_url, tel_uri,
    whatsapp_url, wifi_payload, SocialPlatform, WifiAuth, WifiFields,
};
pub use vcard::{encode_vcard, VCardFields};

/// Trimmed value, or `None` when absent or blank
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Text-value escaping shared by vCard and iCalendar
pub(crate) fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}
