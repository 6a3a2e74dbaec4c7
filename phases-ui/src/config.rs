use phases_core::TimelineConfig;
use serde::Deserialize;

/// Partial configuration as passed from JavaScript; present fields win.
#[derive(Debug, Default, Deserialize)]
pub struct JsTimelineConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub phase_list_path: Option<String>,
    #[serde(default)]
    pub phase_detail_path: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub loading_greeting: Option<String>,
    #[serde(default)]
    pub ready_greeting: Option<String>,
}

impl JsTimelineConfig {
    pub fn apply(self, mut base: TimelineConfig) -> TimelineConfig {
        if let Some(base_url) = self.base_url {
            base.base_url = base_url;
        }
        if let Some(path) = self.phase_list_path {
            base.phase_list_path = path;
        }
        if let Some(path) = self.phase_detail_path {
            base.phase_detail_path = path;
        }
        if let Some(name) = self.display_name.filter(|name| !name.trim().is_empty()) {
            base.display_name = name;
        }
        if let Some(text) = self.loading_greeting {
            base.loading_greeting = text;
        }
        if let Some(text) = self.ready_greeting {
            base.ready_greeting = text;
        }
        base
    }
}

impl From<JsTimelineConfig> for TimelineConfig {
    fn from(cfg: JsTimelineConfig) -> Self {
        cfg.apply(TimelineConfig::default())
    }
}
