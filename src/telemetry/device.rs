//! Browser, OS and device class from the user agent

use crate::page::ClientEnvironment;
use serde::{Deserialize, Serialize};

/// Where the page was observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub user_agent: String,
    pub browser: String,
    pub os: String,
    pub device_type: DeviceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_ratio: Option<f64>,
}

/// Browser families, most specific token first. Chromium forks embed
/// "Chrome" and Chrome embeds "Safari".
const BROWSERS: [(&str, &str); 9] = [
    ("HeadlessChrome/", "Headless Chrome"),
    ("Edg/", "Edge"),
    ("OPR/", "Opera"),
    ("SamsungBrowser/", "Samsung Internet"),
    ("Firefox/", "Firefox"),
    ("FxiOS/", "Firefox"),
    ("CriOS/", "Chrome"),
    ("Chrome/", "Chrome"),
    ("Safari/", "Safari"),
];

const OPERATING_SYSTEMS: [(&str, &str); 8] = [
    ("Windows", "Windows"),
    ("iPhone", "iOS"),
    ("iPad", "iOS"),
    ("Android", "Android"),
    ("CrOS", "ChromeOS"),
    ("Mac OS X", "macOS"),
    ("Macintosh", "macOS"),
    ("Linux", "Linux"),
];

const BOT_TOKENS: [&str; 4] = ["bot", "crawler", "spider", "slurp"];

/// Fingerprint the observing client. `fallback_user_agent` is used when the
/// snapshot carries none, i.e. the page was fetched by this tool.
pub fn device_info(environment: &ClientEnvironment, fallback_user_agent: &str) -> DeviceInfo {
    let user_agent = environment
        .user_agent
        .clone()
        .unwrap_or_else(|| fallback_user_agent.to_string());

    let viewport = match (environment.viewport_width, environment.viewport_height) {
        (Some(width), Some(height)) => Some(Viewport {
            width,
            height,
            pixel_ratio: environment.device_pixel_ratio,
        }),
        _ => None,
    };

    DeviceInfo {
        browser: browser_of(&user_agent).to_string(),
        os: os_of(&user_agent).to_string(),
        device_type: device_type_of(&user_agent, environment.viewport_width),
        user_agent,
        viewport,
        connection: environment.connection_type.clone(),
    }
}

fn browser_of(ua: &str) -> &'static str {
    BROWSERS
        .iter()
        .find(|(token, _)| ua.contains(token))
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

fn os_of(ua: &str) -> &'static str {
    OPERATING_SYSTEMS
        .iter()
        .find(|(token, _)| ua.contains(token))
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

fn device_type_of(ua: &str, viewport_width: Option<u32>) -> DeviceType {
    let lower = ua.to_lowercase();
    if BOT_TOKENS.iter().any(|t| lower.contains(t)) {
        return DeviceType::Bot;
    }
    if ua.contains("iPad") || (ua.contains("Android") && !ua.contains("Mobile")) {
        return DeviceType::Tablet;
    }
    if ua.contains("Mobi") || ua.contains("iPhone") {
        return DeviceType::Mobile;
    }
    match viewport_width {
        Some(w) if w < 768 => DeviceType::Mobile,
        Some(w) if w < 1024 && ua.contains("Android") => DeviceType::Tablet,
        _ => DeviceType::Desktop,
    }
}
