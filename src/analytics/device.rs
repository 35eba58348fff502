use crate::models::DeviceType;

const MOBILE_TOKENS: [&str; 4] = ["Mobile", "Android", "iPhone", "iPad"];

/// Classify a user agent as mobile or desktop by substring match.
pub fn classify_device(user_agent: Option<&str>) -> DeviceType {
    match user_agent {
        Some(ua) if MOBILE_TOKENS.iter().any(|token| ua.contains(token)) => DeviceType::Mobile,
        _ => DeviceType::Desktop,
    }
}
