use urlencoding::encode;

use crate::models::GeoData;

const MAPS_SEARCH_BASE: &str = "https://www.google.com/maps/search/?api=1&query=";
const MAPS_DIRECTIONS_BASE: &str = "https://www.google.com/maps/dir/?api=1&destination=";

/// `geo:` URI; coordinates win over the address, an address alone becomes a `q=` search.
pub fn geo_uri(geo: &GeoData) -> Option<String> {
    if let Some((lat, lng)) = geo.coordinates() {
        return Some(format!("geo:{lat},{lng}"));
    }
    geo.address()
        .map(|address| format!("geo:0,0?q={}", encode(address)))
}

/// Map search link for a geo record. The address is preferred over raw coordinates.
pub fn maps_search_url(geo: &GeoData) -> Option<String> {
    if let Some(address) = geo.address() {
        return Some(format!("{MAPS_SEARCH_BASE}{}", encode(address)));
    }
    geo.coordinates()
        .map(|(lat, lng)| format!("{MAPS_SEARCH_BASE}{lat},{lng}"))
}

/// Directions deep link. Coordinates are preferred over the free-text address.
pub fn directions_url(geo: &GeoData) -> Option<String> {
    if let Some((lat, lng)) = geo.coordinates() {
        return Some(format!("{MAPS_DIRECTIONS_BASE}{lat},{lng}"));
    }
    geo.address()
        .map(|address| format!("{MAPS_DIRECTIONS_BASE}{}", encode(address)))
}

/// `mailto:` URI with percent-encoded subject and body
pub fn mailto_uri(email: &str, subject: Option<&str>, body: Option<&str>) -> String {
    let params = [("subject", subject), ("body", body)];
    format!("mailto:{}{}", email.trim(), query_string(&params))
}

/// `tel:` URI; whitespace inside the number is dropped
pub fn tel_uri(phone: &str) -> String {
    format!("tel:{}", strip_whitespace(phone))
}

/// `sms:` URI with an optional pre-filled body
pub fn sms_uri(phone: &str, body: Option<&str>) -> String {
    format!(
        "sms:{}{}",
        strip_whitespace(phone),
        query_string(&[("body", body)])
    )
}

/// `https://wa.me/<digits>` with an optional pre-filled message
pub fn whatsapp_url(phone: &str, text: Option<&str>) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    format!("https://wa.me/{digits}{}", query_string(&[("text", text)]))
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// `?a=1&b=2` from the non-blank parameters, or an empty string
fn query_string(params: &[(&str, Option<&str>)]) -> String {
    let pairs: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| format!("{key}={}", encode(v)))
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialPlatform {
    Instagram,
    Facebook,
    Twitter,
    LinkedIn,
    TikTok,
    YouTube,
    GitHub,
    Telegram,
}

impl SocialPlatform {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "instagram" => Some(SocialPlatform::Instagram),
            "facebook" => Some(SocialPlatform::Facebook),
            "twitter" | "x" => Some(SocialPlatform::Twitter),
            "linkedin" => Some(SocialPlatform::LinkedIn),
            "tiktok" => Some(SocialPlatform::TikTok),
            "youtube" => Some(SocialPlatform::YouTube),
            "github" => Some(SocialPlatform::GitHub),
            "telegram" => Some(SocialPlatform::Telegram),
            _ => None,
        }
    }

    fn base_url(&self) -> &'static str {
        match self {
            SocialPlatform::Instagram => "https://instagram.com/",
            SocialPlatform::Facebook => "https://facebook.com/",
            SocialPlatform::Twitter => "https://x.com/",
            SocialPlatform::LinkedIn => "https://linkedin.com/in/",
            SocialPlatform::TikTok => "https://tiktok.com/@",
            SocialPlatform::YouTube => "https://youtube.com/@",
            SocialPlatform::GitHub => "https://github.com/",
            SocialPlatform::Telegram => "https://t.me/",
        }
    }
}

/// Profile URL for a handle; a leading `@` is stripped and full URLs pass through.
pub fn social_url(platform: SocialPlatform, handle: &str) -> String {
    let handle = handle.trim();
    if handle.starts_with("http://") || handle.starts_with("https://") {
        return handle.to_string();
    }
    let cleaned = handle.strip_prefix('@').unwrap_or(handle);
    format!("{}{}", platform.base_url(), cleaned)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WifiAuth {
    #[default]
    Wpa,
    Wep,
    NoPass,
}

impl WifiAuth {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "WPA" | "WPA2" | "WPA3" => Some(WifiAuth::Wpa),
            "WEP" => Some(WifiAuth::Wep),
            "NOPASS" | "NONE" | "OPEN" => Some(WifiAuth::NoPass),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            WifiAuth::Wpa => "WPA",
            WifiAuth::Wep => "WEP",
            WifiAuth::NoPass => "nopass",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WifiFields {
    pub ssid: String,
    pub password: Option<String>,
    pub auth: WifiAuth,
    pub hidden: bool,
}

/// `WIFI:` network join string
pub fn wifi_payload(fields: &WifiFields) -> String {
    let mut payload = format!(
        "WIFI:T:{};S:{};",
        fields.auth.as_str(),
        escape_wifi(&fields.ssid)
    );

    if fields.auth != WifiAuth::NoPass {
        if let Some(password) = fields.password.as_deref().filter(|p| !p.is_empty()) {
            payload.push_str(&format!("P:{};", escape_wifi(password)));
        }
    }
    if fields.hidden {
        payload.push_str("H:true;");
    }

    payload.push(';');
    payload
}

fn escape_wifi(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | ';' | ',' | ':' | '"') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
