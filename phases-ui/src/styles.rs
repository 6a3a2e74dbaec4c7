#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-phases-ui]";

/// Card states and skeleton shimmer. Page typography is left to the host page.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --phases-card-bg: #181818;
  --phases-card-text: #ffffff;
  --phases-radius: 16px;
  --phases-skeleton: rgba(255, 255, 255, 0.08);
  --phases-skeleton-shine: rgba(255, 255, 255, 0.16);
  --phases-error: #f97066;
}

.timeline-phases {
  display: flex;
  flex-direction: column;
  gap: 24px;
}

.phase-card {
  background: var(--phases-card-bg);
  color: var(--phases-card-text);
  border-radius: var(--phases-radius);
  padding: 24px;
  display: grid;
  grid-template-columns: 128px 1fr;
  gap: 8px 20px;
  opacity: 0;
  transform: translateY(16px);
  transition: opacity 0.5s ease, transform 0.5s ease, background-color 0.5s ease;
}

.phase-card.visible {
  opacity: 1;
  transform: translateY(0);
}

.phase-cover {
  grid-row: span 3;
  width: 128px;
  height: 128px;
  border-radius: 8px;
  object-fit: cover;
}

.phase-period {
  font-size: 0.8rem;
  letter-spacing: 0.08em;
  text-transform: uppercase;
  opacity: 0.8;
}

.phase-name {
  margin: 4px 0 0;
}

.phase-stats {
  display: flex;
  flex-wrap: wrap;
  gap: 12px;
  font-size: 0.85rem;
  font-variant-numeric: tabular-nums;
}

.phase-tracks {
  margin: 8px 0;
  padding-left: 18px;
}

.phase-tags {
  display: flex;
  flex-wrap: wrap;
  gap: 6px;
}

.phase-tags .tag {
  border: 1px solid transparent;
  border-radius: 999px;
  padding: 2px 10px;
  font-size: 0.75rem;
}

.phase-error,
.timeline-error {
  color: var(--phases-error);
}

.skeleton {
  background: linear-gradient(90deg, var(--phases-skeleton), var(--phases-skeleton-shine), var(--phases-skeleton));
  background-size: 200% 100%;
  border-radius: 6px;
  animation: phases-shimmer 1.4s ease-in-out infinite;
}

.skeleton-title { height: 1.4em; width: 60%; }
.skeleton-stat { display: inline-block; height: 1em; width: 120px; }
.skeleton-text { height: 0.9em; width: 100%; }
.skeleton-text.short { width: 70%; }
.skeleton-tags { height: 1.4em; width: 40%; }

@keyframes phases-shimmer {
  0% { background-position: 200% 0; }
  100% { background-position: -200% 0; }
}

@media (max-width: 640px) {
  .phase-card {
    grid-template-columns: 1fr;
  }

  .phase-cover {
    grid-row: auto;
  }
}
"#;

pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("Document has no <head>"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-phases-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
