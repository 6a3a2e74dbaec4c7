use async_trait::async_trait;
use phases_client::HttpPhaseSource;
use phases_core::{CardKey, TimelineConfig};
use serde_wasm_bindgen::from_value;
use wasm_bindgen::prelude::*;
use web_sys::{console, Document, Element, Window};

use crate::config::JsTimelineConfig;
use crate::controller::TimelineController;
use crate::render::CardFragment;
use crate::styles;
use crate::surface::{card_class, FrameScheduler, MessageKind, SurfaceError, TimelineSurface};

/// Delay before a hidden populated card gets its `visible` class.
const ENTRY_TICK_MS: i32 = 10;

fn js_error(err: JsValue) -> SurfaceError {
    SurfaceError(format!("{err:?}"))
}

/// Browser page: a status line and a container holding one `<article>` per phase.
struct DomSurface {
    document: Document,
    status: Element,
    container: Element,
}

impl DomSurface {
    fn node(&self, key: &CardKey) -> Result<Element, SurfaceError> {
        self.document
            .get_element_by_id(key.as_str())
            .ok_or_else(|| SurfaceError(format!("no card node for {key}")))
    }

    fn fill(node: &Element, fragment: &CardFragment) -> Result<(), SurfaceError> {
        node.set_class_name(card_class(fragment.visible));
        node.set_attribute("style", &fragment.style.to_css())
            .map_err(js_error)?;
        node.set_inner_html(&fragment.markup);
        Ok(())
    }
}

impl TimelineSurface for DomSurface {
    fn set_status(&mut self, text: &str) -> Result<(), SurfaceError> {
        self.status.set_text_content(Some(text));
        Ok(())
    }

    fn show_message(&mut self, kind: MessageKind, text: &str) -> Result<(), SurfaceError> {
        let message = self.document.create_element("p").map_err(js_error)?;
        message.set_class_name(kind.class_name());
        message.set_text_content(Some(text));

        self.container.set_inner_html("");
        self.container.append_child(&message).map_err(js_error)?;
        Ok(())
    }

    fn mount_card(&mut self, fragment: &CardFragment) -> Result<(), SurfaceError> {
        if self.document.get_element_by_id(fragment.key.as_str()).is_some() {
            return Err(SurfaceError(format!("card {} is already mounted", fragment.key)));
        }
        let node = self.document.create_element("article").map_err(js_error)?;
        node.set_id(fragment.key.as_str());
        Self::fill(&node, fragment)?;
        self.container.append_child(&node).map_err(js_error)?;
        Ok(())
    }

    fn replace_card(&mut self, fragment: &CardFragment) -> Result<(), SurfaceError> {
        let node = self.node(&fragment.key)?;
        Self::fill(&node, fragment)
    }

    fn set_visible(&mut self, key: &CardKey, visible: bool) -> Result<(), SurfaceError> {
        self.node(key)?
            .class_list()
            .toggle_with_force("visible", visible)
            .map_err(js_error)?;
        Ok(())
    }
}

/// Resolves after a short `setTimeout`, letting the browser paint the hidden card first.
struct TimeoutScheduler;

#[async_trait(?Send)]
impl FrameScheduler for TimeoutScheduler {
    async fn next_tick(&self) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().map(|window| {
                window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ENTRY_TICK_MS)
            });
            if !matches!(scheduled, Some(Ok(_))) {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }
}

fn query(document: &Document, selector: &str) -> Result<Element, JsValue> {
    document
        .query_selector(selector)
        .map_err(|err| JsValue::from_str(&format!("Invalid selector {selector}: {err:?}")))?
        .ok_or_else(|| JsValue::from_str(&format!("No element matches {selector}")))
}

/// Mounts the timeline into `selector`, writing status text into `status_selector`,
/// and starts loading on the browser event loop.
#[wasm_bindgen]
pub fn mount_phase_timeline(
    selector: &str,
    status_selector: &str,
    config: JsValue,
) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window: Window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let document: Document = window
        .document()
        .ok_or_else(|| JsValue::from_str("No document"))?;
    styles::ensure_styles(&document)?;

    let container = query(&document, selector)?;
    let status = query(&document, status_selector)?;

    let mut config: TimelineConfig = if config.is_undefined() || config.is_null() {
        TimelineConfig::default()
    } else {
        from_value::<JsTimelineConfig>(config)?.into()
    };
    if config.base_url.is_empty() {
        config.base_url = window.location().origin()?;
    }

    let source = HttpPhaseSource::new(&config);
    let surface = DomSurface {
        document,
        status,
        container,
    };
    let mut controller =
        TimelineController::new(config, source, surface).with_scheduler(TimeoutScheduler);

    wasm_bindgen_futures::spawn_local(async move {
        if let Err(err) = controller.load_timeline().await {
            console::error_1(&JsValue::from_str(&format!("Timeline error: {err}")));
        }
    });
    Ok(())
}
