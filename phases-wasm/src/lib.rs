//! Framework-neutral WASM <-> JavaScript bridge for card rendering and colors.

use phases_core::{foreground_for, AccentColor, AccentGenerator, CardKey, Color, PhaseDetail, PhaseSummary};
use phases_ui::{render_placeholder, render_populated_with, CardFragment};
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// `"black"` or `"white"` for text drawn on `color`.
#[wasm_bindgen]
pub fn foreground_for_color(color: &str) -> Result<String, JsValue> {
    foreground_css(color).map_err(|err| JsValue::from_str(&err))
}

/// Fresh accent color, reproducible when a seed is given.
#[wasm_bindgen]
pub fn generate_accent(seed: Option<u64>) -> Result<JsValue, JsValue> {
    to_value(&accent_for(seed))
        .map_err(|err| JsValue::from_str(&format!("Could not serialize accent: {err}")))
}

/// Placeholder fragment (`key`, `markup`, `style`, `visible`) for a phase summary.
#[wasm_bindgen]
pub fn render_placeholder_card(summary: JsValue) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let summary = from_value::<Value>(summary)
        .map_err(|err| JsValue::from_str(&format!("Could not read summary: {err}")))?;
    let fragment = placeholder_value(summary).map_err(|err| JsValue::from_str(&err))?;
    to_value(&fragment)
        .map_err(|err| JsValue::from_str(&format!("Could not serialize card: {err}")))
}

/// Populated fragment for a summary/detail pair with an explicit accent.
#[wasm_bindgen]
pub fn render_populated_card(
    summary: JsValue,
    detail: JsValue,
    accent: JsValue,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let read = |value: JsValue, what: &str| {
        from_value::<Value>(value)
            .map_err(|err| JsValue::from_str(&format!("Could not read {what}: {err}")))
    };
    let fragment = populated_value(
        read(summary, "summary")?,
        read(detail, "detail")?,
        read(accent, "accent")?,
    )
    .map_err(|err| JsValue::from_str(&err))?;
    to_value(&fragment)
        .map_err(|err| JsValue::from_str(&format!("Could not serialize card: {err}")))
}

fn foreground_css(color: &str) -> Result<String, String> {
    let color: Color = color.parse().map_err(|err| format!("{err}"))?;
    Ok(foreground_for(&color).as_css().to_string())
}

fn accent_for(seed: Option<u64>) -> AccentColor {
    match seed {
        Some(seed) => AccentGenerator::seeded(seed).generate(),
        None => AccentGenerator::from_entropy().generate(),
    }
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, String> {
    serde_json::from_value(value).map_err(|err| format!("Invalid {what}: {err}"))
}

fn placeholder_value(summary: Value) -> Result<CardFragment, String> {
    let summary: PhaseSummary = decode(summary, "summary")?;
    let key = CardKey::from_period(&summary.phase_period);
    Ok(render_placeholder(&key, &summary))
}

fn populated_value(summary: Value, detail: Value, accent: Value) -> Result<CardFragment, String> {
    let summary: PhaseSummary = decode(summary, "summary")?;
    let detail: PhaseDetail = decode(detail, "detail")?;
    let accent: AccentColor = decode(accent, "accent")?;
    if !AccentColor::HUE_RANGE.contains(&accent.hue)
        || !AccentColor::SATURATION_RANGE.contains(&accent.saturation)
        || !AccentColor::LIGHTNESS_RANGE.contains(&accent.lightness)
    {
        return Err(format!(
            "Invalid accent: {} is outside the generated range",
            accent.to_css()
        ));
    }
    let key = CardKey::from_period(&summary.phase_period);
    Ok(render_populated_with(&key, &summary, &detail, accent))
}
