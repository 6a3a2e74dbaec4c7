//! Card fragments for the three visual states of a phase.

use std::fmt::Write as _;

use phases_core::{
    format_number, AccentColor, AccentGenerator, CardKey, PhaseDetail, PhaseSummary, TextColor,
};
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

/// Tag palette that stays distinguishable on the card background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagTone {
    /// Light tags for white text on a dark background.
    OnDark,
    /// Dark tags for black text on a light background.
    OnLight,
}

impl TagTone {
    pub fn for_text(text: TextColor) -> Self {
        match text {
            TextColor::White => TagTone::OnDark,
            TextColor::Black => TagTone::OnLight,
        }
    }

    pub fn css(self) -> &'static str {
        match self {
            TagTone::OnDark => {
                "background-color: rgba(255, 255, 255, 0.18); border-color: rgba(255, 255, 255, 0.4); color: white"
            }
            TagTone::OnLight => {
                "background-color: rgba(0, 0, 0, 0.12); border-color: rgba(0, 0, 0, 0.3); color: black"
            }
        }
    }
}

/// Inline style applied to the card node itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CardStyle {
    pub background: Option<String>,
    pub foreground: Option<TextColor>,
}

impl CardStyle {
    /// Declarations for a `style` attribute; empty for unstyled cards.
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        if let Some(background) = &self.background {
            let _ = write!(css, "background-color: {background};");
        }
        if let Some(foreground) = self.foreground {
            if !css.is_empty() {
                css.push(' ');
            }
            let _ = write!(css, "color: {foreground};");
        }
        css
    }
}

/// Full replacement content for the node owned by one phase key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardFragment {
    pub key: CardKey,
    pub markup: String,
    pub style: CardStyle,
    /// `false` means the node is mounted hidden and revealed on the next tick.
    pub visible: bool,
}

/// Renders phase cards, drawing one accent color per populated card.
#[derive(Debug, Clone)]
pub struct CardRenderer<R = StdRng> {
    accents: AccentGenerator<R>,
}

impl Default for CardRenderer<StdRng> {
    fn default() -> Self {
        Self::new(AccentGenerator::from_entropy())
    }
}

impl CardRenderer<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(AccentGenerator::seeded(seed))
    }
}

impl<R: Rng> CardRenderer<R> {
    pub fn new(accents: AccentGenerator<R>) -> Self {
        Self { accents }
    }

    /// Full card with a fresh accent background.
    pub fn render_populated(
        &mut self,
        key: &CardKey,
        summary: &PhaseSummary,
        detail: &PhaseDetail,
    ) -> CardFragment {
        let accent = self.accents.generate();
        render_populated_with(key, summary, detail, accent)
    }
}

/// Period and track count; everything else as loading skeletons.
pub fn render_placeholder(key: &CardKey, summary: &PhaseSummary) -> CardFragment {
    let mut markup = header(summary, None);
    markup.push_str(&stats(summary, None));
    markup.push_str(
        r#"<div class="phase-detail"><p class="skeleton skeleton-text"></p><p class="skeleton skeleton-text short"></p><div class="skeleton skeleton-tags"></div></div>"#,
    );

    CardFragment {
        key: key.clone(),
        markup,
        style: CardStyle::default(),
        visible: true,
    }
}

/// Keeps the shell and placeholder statistics; only the detail region changes.
pub fn render_error(key: &CardKey, summary: &PhaseSummary) -> CardFragment {
    let mut markup = header(summary, None);
    markup.push_str(&stats(summary, None));
    let _ = write!(
        markup,
        r#"<div class="phase-detail"><p class="phase-error">Could not load details for {}.</p></div>"#,
        escape_html(&summary.phase_period)
    );

    CardFragment {
        key: key.clone(),
        markup,
        style: CardStyle::default(),
        visible: true,
    }
}

/// Populated card for a given accent. Same inputs give the same fragment.
pub fn render_populated_with(
    key: &CardKey,
    summary: &PhaseSummary,
    detail: &PhaseDetail,
    accent: AccentColor,
) -> CardFragment {
    let foreground = accent.foreground();
    let tone = TagTone::for_text(foreground);
    let name = detail.display_name(summary);

    let mut markup = String::new();
    let _ = write!(
        markup,
        r#"<img class="phase-cover" src="{}" alt="Cover art for {}">"#,
        escape_html(detail.cover_url(summary)),
        escape_html(&summary.phase_period)
    );
    markup.push_str(&header(summary, Some(&name)));
    markup.push_str(&stats(summary, Some(detail)));

    markup.push_str(r#"<div class="phase-detail">"#);
    let _ = write!(
        markup,
        r#"<p class="phase-summary">{}</p>"#,
        escape_html(detail.display_summary())
    );
    markup.push_str(r#"<ul class="phase-tracks">"#);
    for track in detail.samples(summary) {
        let _ = write!(markup, "<li>{}</li>", escape_html(track));
    }
    markup.push_str(r#"</ul><div class="phase-tags">"#);
    for genre in detail.genres() {
        let _ = write!(
            markup,
            r#"<span class="tag" style="{}">{}</span>"#,
            tone.css(),
            escape_html(genre)
        );
    }
    markup.push_str("</div></div>");

    CardFragment {
        key: key.clone(),
        markup,
        style: CardStyle {
            background: Some(accent.to_css()),
            foreground: Some(foreground),
        },
        visible: false,
    }
}

fn header(summary: &PhaseSummary, name: Option<&str>) -> String {
    let title = match name {
        Some(name) => format!(r#"<h3 class="phase-name">{}</h3>"#, escape_html(name)),
        None => r#"<h3 class="phase-name skeleton skeleton-title"></h3>"#.to_string(),
    };
    format!(
        r#"<div class="phase-header"><span class="phase-period">{}</span>{title}</div>"#,
        escape_html(&summary.phase_period)
    )
}

fn stats(summary: &PhaseSummary, detail: Option<&PhaseDetail>) -> String {
    let mut out = format!(
        r#"<div class="phase-stats"><span class="stat">{}</span>"#,
        songs_saved(summary.track_count)
    );
    match detail {
        Some(detail) => {
            let _ = write!(
                out,
                r#"<span class="stat">Avg. Release Year: {}</span><span class="stat">Avg. Popularity: {}/100</span>"#,
                detail.average_release_year,
                format_number(detail.average_popularity)
            );
        }
        None => out.push_str(
            r#"<span class="stat skeleton skeleton-stat"></span><span class="stat skeleton skeleton-stat"></span>"#,
        ),
    }
    out.push_str("</div>");
    out
}

fn songs_saved(count: u32) -> String {
    if count == 1 {
        "1 song saved".to_string()
    } else {
        format!("{count} songs saved")
    }
}

/// Escapes text for element content and double-quoted attributes.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
