use serde::{Deserialize, Serialize};

use super::{escape_text, present};

/// Contact fields of a vCard payload, as stored in record and action payloads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VCardFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(alias = "org", alias = "company")]
    pub organization: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "url")]
    pub website: Option<String>,
    pub address: Option<String>,
}

impl VCardFields {
    /// Name used for the `.vcf` file name, falling back to "contact"
    pub fn file_stem(&self) -> String {
        let name = [present(&self.first_name), present(&self.last_name)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("_");

        let stem: String = name
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();

        if stem.is_empty() {
            "contact".to_string()
        } else {
            stem
        }
    }
}

/// Build a vCard 3.0 document (CRLF line endings).
///
/// Line order: `FN`, `N`, `ORG`, `TITLE`, `TEL`, `EMAIL`, `URL`, `ADR`.
pub fn encode_vcard(fields: &VCardFields) -> String {
    let first = present(&fields.first_name);
    let last = present(&fields.last_name);

    let mut lines = vec!["BEGIN:VCARD".to_string(), "VERSION:3.0".to_string()];

    if first.is_some() || last.is_some() {
        let full_name = [first, last]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("FN:{}", escape_text(&full_name)));
        lines.push(format!(
            "N:{};{};;;",
            escape_text(last.unwrap_or_default()),
            escape_text(first.unwrap_or_default())
        ));
    }

    if let Some(org) = present(&fields.organization) {
        lines.push(format!("ORG:{}", escape_text(org)));
    }
    if let Some(title) = present(&fields.title) {
        lines.push(format!("TITLE:{}", escape_text(title)));
    }
    if let Some(phone) = present(&fields.phone) {
        lines.push(format!("TEL:{phone}"));
    }
    if let Some(email) = present(&fields.email) {
        lines.push(format!("EMAIL:{email}"));
    }
    if let Some(website) = present(&fields.website) {
        lines.push(format!("URL:{website}"));
    }
    if let Some(address) = present(&fields.address) {
        lines.push(format!("ADR:;;{};;;;", escape_text(address)));
    }

    lines.push("END:VCARD".to_string());
    lines.join("\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_contact_lines() {
        let fields: VCardFields = serde_json::from_value(json!({
            "firstName": "John",
            "lastName": "Doe",
            "phone": "+1234567890"
        }))
        .unwrap();

        let card = encode_vcard(&fields);
        let lines: Vec<&str> = card.lines().collect();

        assert_eq!(
            lines,
            vec![
                "BEGIN:VCARD",
                "VERSION:3.0",
                "FN:John Doe",
                "N:Doe;John;;;",
                "TEL:+1234567890",
                "END:VCARD",
            ]
        );
        assert!(!card.contains("ORG"));
        assert!(!card.contains("EMAIL"));
    }

    #[test]
    fn test_full_contact_field_order() {
        let fields = VCardFields {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            organization: Some("Analytical Engines, Ltd".to_string()),
            title: Some("Engineer".to_string()),
            phone: Some("+44 20 7946 0000".to_string()),
            email: Some("ada@example.com".to_string()),
            website: Some("https://example.com".to_string()),
            address: Some("12 St James's Square; London".to_string()),
        };

        let card = encode_vcard(&fields);
        let labels: Vec<&str> = card
            .lines()
            .map(|line| line.split(':').next().unwrap())
            .collect();

        assert_eq!(
            labels,
            vec!["BEGIN", "VERSION", "FN", "N", "ORG", "TITLE", "TEL", "EMAIL", "URL", "ADR", "END"]
        );
        assert!(card.contains("ORG:Analytical Engines\\, Ltd"));
        assert!(card.contains("ADR:;;12 St James's Square\\; London;;;;"));
        assert!(card.contains("\r\n"));
    }

    #[test]
    fn test_blank_fields_are_omitted() {
        let fields = VCardFields {
            first_name: Some("Solo".to_string()),
            email: Some("   ".to_string()),
            ..Default::default()
        };

        let card = encode_vcard(&fields);
        assert!(card.contains("FN:Solo"));
        assert!(card.contains("N:;Solo;;;"));
        assert!(!card.contains("EMAIL"));
    }

    #[test]
    fn test_payload_aliases() {
        let fields: VCardFields = serde_json::from_value(json!({
            "company": "Acme",
            "url": "acme.test"
        }))
        .unwrap();
        assert_eq!(fields.organization.as_deref(), Some("Acme"));
        assert_eq!(fields.website.as_deref(), Some("acme.test"));
    }

    #[test]
    fn test_file_stem() {
        let fields = VCardFields {
            first_name: Some("Jo".to_string()),
            last_name: Some("O'Neil".to_string()),
            ..Default::default()
        };
        assert_eq!(fields.file_stem(), "Jo_ONeil");
        assert_eq!(VCardFields::default().file_stem(), "contact");
    }
}
