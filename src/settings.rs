use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::matcher::RuleSet;

/// Tracker configuration, loaded once and shared read-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Track clicks inside ignored containers too
    pub track_all_element_clicks: bool,

    /// Turn click tracking off entirely
    pub disable_clicks: bool,

    /// Allow rewriting anchor targets at document ready
    pub open_links_with_js: bool,
    pub open_internal_in_new_tab: bool,
    pub open_external_in_new_tab: bool,

    /// Collector path or URL, resolved against the page URL
    pub endpoint: String,

    pub request_timeout_secs: u64,

    pub text: TextFallbacks,

    pub rules: RuleSet,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            track_all_element_clicks: true,
            disable_clicks: false,
            open_links_with_js: true,
            open_internal_in_new_tab: true,
            open_external_in_new_tab: true,
            endpoint: "/track-link.php".to_string(),
            request_timeout_secs: 10,
            text: TextFallbacks::default(),
            rules: RuleSet::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextFallbacks {
    /// Prefix for links labelled by an image title
    pub image_text: String,
    pub image_no_text: String,
    pub no_text: String,
}

impl Default for TextFallbacks {
    fn default() -> Self {
        Self {
            image_text: "รูปภาพ: ".to_string(),
            image_no_text: "ลิงก์รูปภาพไม่มีข้อความ".to_string(),
            no_text: "ลิงก์ไม่มีข้อความ".to_string(),
        }
    }
}

impl Settings {
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).context("Failed to parse settings")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;

        Self::from_toml(&source).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Whether anchors get rewritten at document ready
    pub fn rewrites_targets(&self) -> bool {
        self.open_links_with_js && (self.open_internal_in_new_tab || self.open_external_in_new_tab)
    }
}
