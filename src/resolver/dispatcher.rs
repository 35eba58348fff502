use serde_json::Value;

use crate::content::{
    directions_url, encode_vcard, mailto_uri, sms_uri, tel_uri, whatsapp_url, VCardFields,
};
use crate::models::{GeoData, QrAction, QrActionKind};

use super::outcome::{normalize_url, DownloadFile, FailureKind, ImmediateAction, ImmediateKind, TapOutcome};

/// Action family of an `action` record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Email,
    Phone,
    Sms,
}

impl ActionKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(ActionKind::Email),
            "phone" => Some(ActionKind::Phone),
            "sms" => Some(ActionKind::Sms),
            _ => None,
        }
    }
}

/// Maps action payloads to concrete protocol URIs, links and downloads
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionDispatcher;

impl ActionDispatcher {
    /// Dispatch an `action` record's payload to an immediate protocol action
    pub fn dispatch(
        &self,
        action_type: Option<&str>,
        action_data: Option<&Value>,
    ) -> Result<ImmediateAction, FailureKind> {
        let action_type = action_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(FailureKind::MissingField("action_type"))?;

        let kind = ActionKind::parse(action_type)
            .ok_or_else(|| FailureKind::UnknownAction(action_type.to_string()))?;

        let empty = Value::Null;
        let data = action_data.unwrap_or(&empty);

        match kind {
            ActionKind::Email => {
                let email = text_field(data, &["email"]).ok_or(FailureKind::MissingField("email"))?;
                Ok(ImmediateAction {
                    kind: ImmediateKind::Email,
                    uri: mailto_uri(
                        email,
                        text_field(data, &["subject"]),
                        text_field(data, &["body", "message"]),
                    ),
                })
            }
            ActionKind::Phone => {
                let phone = text_field(data, &["phone", "number"])
                    .ok_or(FailureKind::MissingField("phone"))?;
                Ok(ImmediateAction {
                    kind: ImmediateKind::Phone,
                    uri: tel_uri(phone),
                })
            }
            ActionKind::Sms => {
                let phone = text_field(data, &["phone", "number"])
                    .ok_or(FailureKind::MissingField("phone"))?;
                Ok(ImmediateAction {
                    kind: ImmediateKind::Sms,
                    uri: sms_uri(phone, text_field(data, &["message", "body"])),
                })
            }
        }
    }

    /// Dispatch one tap on a multi-action menu entry
    pub fn dispatch_menu_action(&self, action: &QrAction) -> Result<TapOutcome, FailureKind> {
        let data = &action.action_data;

        match &action.action_type {
            QrActionKind::Call => {
                let phone = text_field(data, &["phone", "number"])
                    .ok_or(FailureKind::MissingField("phone"))?;
                Ok(TapOutcome::Immediate(ImmediateAction {
                    kind: ImmediateKind::Phone,
                    uri: tel_uri(phone),
                }))
            }
            QrActionKind::Website => {
                let url = text_field(data, &["url", "website"]).ok_or(FailureKind::MissingField("url"))?;
                Ok(TapOutcome::OpenInNewContext(normalize_url(url)))
            }
            QrActionKind::Whatsapp => {
                // wa.me needs at least one digit of the number
                let phone = text_field(data, &["phone", "number"])
                    .filter(|p| p.chars().any(|c| c.is_ascii_digit()))
                    .ok_or(FailureKind::MissingField("phone"))?;
                Ok(TapOutcome::Immediate(ImmediateAction {
                    kind: ImmediateKind::Whatsapp,
                    uri: whatsapp_url(phone, text_field(data, &["message", "text"])),
                }))
            }
            QrActionKind::Directions => {
                let geo = GeoData {
                    latitude: number_field(data, &["latitude", "lat"]),
                    longitude: number_field(data, &["longitude", "lng"]),
                    address: text_field(data, &["address"]).map(str::to_string),
                };
                let uri = directions_url(&geo).ok_or(FailureKind::InvalidLocation)?;
                Ok(TapOutcome::Immediate(ImmediateAction {
                    kind: ImmediateKind::Maps,
                    uri,
                }))
            }
            QrActionKind::Vcard => {
                let fields: VCardFields = serde_json::from_value(data.clone()).unwrap_or_default();
                Ok(TapOutcome::Download(DownloadFile::vcard(
                    &fields.file_stem(),
                    encode_vcard(&fields),
                )))
            }
            QrActionKind::Unknown(other) => Err(FailureKind::UnknownAction(other.clone())),
        }
    }
}

/// First non-blank string among the given keys
fn text_field<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| data.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// First number among the given keys; numeric strings are accepted
fn number_field(data: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match data.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
