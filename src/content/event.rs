use chrono::{DateTime, Utc};

use super::{escape_text, present};

const ICS_TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Calendar event payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub uid: Option<String>,
}

/// Build a `VCALENDAR` document with a single `VEVENT` (CRLF line endings).
///
/// `stamp` becomes `DTSTAMP` and, when no uid is given, seeds the generated `UID`.
pub fn encode_event(fields: &EventFields, stamp: DateTime<Utc>) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//scanroute//EN".to_string(),
        "BEGIN:VEVENT".to_string(),
    ];

    if let Some(title) = present(&fields.title) {
        lines.push(format!("SUMMARY:{}", escape_text(title)));
    }
    if let Some(description) = present(&fields.description) {
        lines.push(format!("DESCRIPTION:{}", escape_text(description)));
    }
    if let Some(location) = present(&fields.location) {
        lines.push(format!("LOCATION:{}", escape_text(location)));
    }
    if let Some(start) = fields.start {
        lines.push(format!("DTSTART:{}", start.format(ICS_TIME_FORMAT)));
    }
    if let Some(end) = fields.end {
        lines.push(format!("DTEND:{}", end.format(ICS_TIME_FORMAT)));
    }

    lines.push(format!("DTSTAMP:{}", stamp.format(ICS_TIME_FORMAT)));

    let uid = present(&fields.uid)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}@scanroute", stamp.timestamp_millis()));
    lines.push(format!("UID:{uid}"));

    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());
    lines.join("\r\n")
}
