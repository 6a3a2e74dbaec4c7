//! Progressive timeline of listening phases: placeholders first, detail after.

pub mod config;
pub mod controller;
pub mod render;
pub mod surface;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod styles;

pub use config::JsTimelineConfig;
pub use controller::{LoadOutcome, PhaseCard, TimelineController, UiError};
pub use render::{
    render_error, render_placeholder, render_populated_with, CardFragment, CardRenderer, CardStyle,
    TagTone,
};
pub use surface::{
    FrameScheduler, ImmediateScheduler, MemoryCard, MemorySurface, MessageKind, SurfaceError,
    SurfaceEvent, TimelineSurface,
};

#[cfg(target_arch = "wasm32")]
pub use dom::mount_phase_timeline;

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_phase_timeline(
    _: &str,
    _: &str,
    _: wasm_bindgen::JsValue,
) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "phases-ui only mounts in a wasm32 browser build",
    ))
}
