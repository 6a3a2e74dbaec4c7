//! Core model for the listening-phase timeline: phases, card state, colors.

pub mod card;
pub mod color;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub use card::{derive_card_keys, CardKey, CardState};
pub use color::{foreground_for, luminance, AccentColor, AccentGenerator, Color, ColorError, Rgb, TextColor};

/// Image shown when neither the detail nor the listing carries a cover.
pub const PLACEHOLDER_COVER_URL: &str = "https://placehold.co/128x128/121212/FFFFFF?text=?";

/// Upper bound on sample tracks and genre tags shown on a card.
pub const MAX_LISTED_ITEMS: usize = 5;

/// Endpoint and greeting configuration for one timeline page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineConfig {
    /// Origin of the backend, e.g. `http://localhost:5000`. Empty means same origin.
    pub base_url: String,
    /// Path of the phase listing endpoint (GET).
    pub phase_list_path: String,
    /// Path of the per-phase detail endpoint (POST).
    pub phase_detail_path: String,
    /// Name substituted into the greeting templates.
    pub display_name: String,
    /// Status text while the phase list is loading. `{name}` is substituted.
    pub loading_greeting: String,
    /// Status text once placeholders are on screen. `{name}` is substituted.
    pub ready_greeting: String,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            phase_list_path: "/api/get_initial_phases".to_string(),
            phase_detail_path: "/api/get_ai_details_for_phase".to_string(),
            display_name: "friend".to_string(),
            loading_greeting: "Hang tight, {name}. Analyzing your library...".to_string(),
            ready_greeting: "Here's your musical journey, {name}.".to_string(),
        }
    }
}

impl TimelineConfig {
    pub fn phase_list_url(&self) -> String {
        join_url(&self.base_url, &self.phase_list_path)
    }

    pub fn phase_detail_url(&self) -> String {
        join_url(&self.base_url, &self.phase_detail_path)
    }

    pub fn loading_text(&self) -> String {
        self.loading_greeting.replace("{name}", &self.display_name)
    }

    pub fn ready_text(&self) -> String {
        self.ready_greeting.replace("{name}", &self.display_name)
    }
}

fn join_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// One entry of the initial phase listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseSummary {
    /// Stable identifier and display label, e.g. `Spring 2021`.
    pub phase_period: String,
    pub track_count: u32,
    /// Listing-side samples, used when the detail payload has none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_tracks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl PhaseSummary {
    pub fn new(phase_period: impl Into<String>, track_count: u32) -> Self {
        Self {
            phase_period: phase_period.into(),
            track_count,
            sample_tracks: Vec::new(),
            cover_url: None,
        }
    }
}

/// Average release year as reported by the backend, which sends `"N/A"`
/// when no track in the phase has a usable date. Numeric strings read as years.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ReleaseYear {
    Year(f64),
    Unknown(String),
}

impl<'de> Deserialize<'de> for ReleaseYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(year) => ReleaseYear::Year(year),
            Raw::Text(text) => match text.trim().parse::<f64>() {
                Ok(year) if year.is_finite() => ReleaseYear::Year(year),
                _ => ReleaseYear::Unknown(text),
            },
        })
    }
}

impl Default for ReleaseYear {
    fn default() -> Self {
        ReleaseYear::Unknown("N/A".to_string())
    }
}

impl fmt::Display for ReleaseYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseYear::Year(year) => f.write_str(&format_number(*year)),
            ReleaseYear::Unknown(_) => f.write_str("N/A"),
        }
    }
}

/// Rich per-phase detail, fetched lazily.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseDetail {
    #[serde(default, alias = "phase_name")]
    pub ai_phase_name: String,
    #[serde(default, alias = "phase_summary")]
    pub ai_phase_summary: String,
    #[serde(default)]
    pub average_release_year: ReleaseYear,
    #[serde(default)]
    pub average_popularity: f64,
    #[serde(default)]
    pub sample_tracks: Vec<String>,
    #[serde(default)]
    pub top_genres: Vec<String>,
    #[serde(default = "default_cover_url")]
    pub phase_cover_url: String,
}

fn default_cover_url() -> String {
    PLACEHOLDER_COVER_URL.to_string()
}

impl PhaseDetail {
    /// Display name, falling back to `Your <period> Era` when the backend sent none.
    pub fn display_name(&self, summary: &PhaseSummary) -> String {
        if self.ai_phase_name.trim().is_empty() {
            format!("Your {} Era", summary.phase_period)
        } else {
            self.ai_phase_name.clone()
        }
    }

    pub fn display_summary(&self) -> &str {
        if self.ai_phase_summary.trim().is_empty() {
            "A distinct period in your listening journey."
        } else {
            &self.ai_phase_summary
        }
    }

    /// Sample tracks to show, preferring the detail over the listing.
    pub fn samples<'a>(&'a self, summary: &'a PhaseSummary) -> &'a [String] {
        let samples = if self.sample_tracks.is_empty() {
            &summary.sample_tracks
        } else {
            &self.sample_tracks
        };
        &samples[..samples.len().min(MAX_LISTED_ITEMS)]
    }

    pub fn genres(&self) -> &[String] {
        &self.top_genres[..self.top_genres.len().min(MAX_LISTED_ITEMS)]
    }

    pub fn cover_url<'a>(&'a self, summary: &'a PhaseSummary) -> &'a str {
        match summary.cover_url.as_deref() {
            Some(listing_cover) if self.phase_cover_url == PLACEHOLDER_COVER_URL => listing_cover,
            _ => &self.phase_cover_url,
        }
    }
}

/// Formats whole numbers without a fraction and others with one decimal.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Errors raised while building or driving a timeline.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("could not load phases: {0}")]
    PhaseList(String),
    #[error("could not parse payload: {0}")]
    Parse(String),
    #[error("card for {phase} cannot move from {from} to {to}")]
    InvalidTransition {
        phase: String,
        from: &'static str,
        to: &'static str,
    },
    #[error("timeline was already loaded")]
    AlreadyLoaded,
}
