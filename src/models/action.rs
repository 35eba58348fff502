use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Kind of one entry in a multi-action menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QrActionKind {
    Call,
    Website,
    Whatsapp,
    Directions,
    Vcard,
    Unknown(String),
}

impl QrActionKind {
    pub fn parse(value: &str) -> Self {
        match value {
            "call" => QrActionKind::Call,
            "website" => QrActionKind::Website,
            "whatsapp" => QrActionKind::Whatsapp,
            "directions" => QrActionKind::Directions,
            "vcard" => QrActionKind::Vcard,
            other => QrActionKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            QrActionKind::Call => "call",
            QrActionKind::Website => "website",
            QrActionKind::Whatsapp => "whatsapp",
            QrActionKind::Directions => "directions",
            QrActionKind::Vcard => "vcard",
            QrActionKind::Unknown(other) => other,
        }
    }
}

impl From<String> for QrActionKind {
    fn from(value: String) -> Self {
        QrActionKind::parse(&value)
    }
}

impl From<QrActionKind> for String {
    fn from(value: QrActionKind) -> Self {
        value.as_str().to_string()
    }
}

/// One tappable entry of a multi-action record's menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrAction {
    pub id: String,
    pub qr_code_id: String,
    pub action_type: QrActionKind,
    pub action_data: Value,
    pub display_order: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct QrActionRow {
    pub id: String,
    pub qr_code_id: String,
    pub action_type: String,
    pub action_data: Option<String>,
    pub display_order: i64,
    pub is_active: bool,
}

impl From<QrActionRow> for QrAction {
    fn from(row: QrActionRow) -> Self {
        let action_data = match row.action_data.as_deref() {
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|err| {
                tracing::warn!(action_id = %row.id, error = %err, "undecodable action_data, using empty object");
                Value::Object(Default::default())
            }),
            None => Value::Object(Default::default()),
        };

        QrAction {
            action_type: QrActionKind::parse(&row.action_type),
            id: row.id,
            qr_code_id: row.qr_code_id,
            action_data,
            display_order: row.display_order,
            is_active: row.is_active,
        }
    }
}
