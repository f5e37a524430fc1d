// Browser capabilities the engine branches on. Probed once by the JS side and handed over.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static MOBILE_AGENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry").expect("mobile pattern is valid")
});

/// Capabilities of the page the engine runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// CSS `background-size: cover` is available, so image layers size themselves.
    pub native_cover: bool,
    /// Opacity transitions fire transition-end events.
    pub transitions: bool,
    /// Mobile browser: video and embeds are skipped (autoplay policy, bandwidth).
    pub mobile: bool,
    /// Page protocol including the trailing colon, e.g. `https:`.
    pub protocol: String,
    /// Page origin, e.g. `https://example.com`.
    pub origin: String,
}

impl Platform {
    pub fn detect(probe: PlatformProbe) -> Self {
        let mobile = probe
            .user_agent
            .as_deref()
            .map(is_mobile_agent)
            .unwrap_or(false);
        let origin = if probe.host.is_empty() {
            String::new()
        } else {
            format!("{}//{}", probe.protocol, probe.host)
        };

        Platform {
            native_cover: probe.native_cover,
            transitions: probe.transitions,
            mobile,
            protocol: probe.protocol,
            origin,
        }
    }

    /// Protocol used for remote embed URLs. Pages served over anything but http(s) get https.
    pub fn embed_protocol(&self) -> &str {
        match self.protocol.as_str() {
            "http:" => "http:",
            _ => "https:",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform {
            native_cover: true,
            transitions: true,
            mobile: false,
            protocol: "https:".to_string(),
            origin: String::new(),
        }
    }
}

/// Raw values probed in the browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformProbe {
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default = "default_true")]
    pub native_cover: bool,
    #[serde(default = "default_true")]
    pub transitions: bool,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default)]
    pub host: String,
}

impl Default for PlatformProbe {
    fn default() -> Self {
        PlatformProbe {
            user_agent: None,
            native_cover: true,
            transitions: true,
            protocol: default_protocol(),
            host: String::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_protocol() -> String {
    "https:".to_string()
}

pub fn is_mobile_agent(user_agent: &str) -> bool {
    MOBILE_AGENT.is_match(user_agent)
}
