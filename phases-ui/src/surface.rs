//! Where cards end up: a page surface plus the tick used for entry animations.

use async_trait::async_trait;
use phases_core::CardKey;
use serde::Serialize;

use crate::render::{escape_html, CardFragment, CardStyle};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("surface error: {0}")]
pub struct SurfaceError(pub String);

/// Single message that replaces the whole card container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Empty,
    Error,
}

impl MessageKind {
    pub fn class_name(self) -> &'static str {
        match self {
            MessageKind::Empty => "timeline-empty",
            MessageKind::Error => "timeline-error",
        }
    }
}

/// Page the timeline controller writes to.
///
/// Every card operation addresses exactly one node, identified by its key.
pub trait TimelineSurface {
    fn set_status(&mut self, text: &str) -> Result<(), SurfaceError>;

    /// Replaces the container contents with one message.
    fn show_message(&mut self, kind: MessageKind, text: &str) -> Result<(), SurfaceError>;

    /// Appends a new card node.
    fn mount_card(&mut self, fragment: &CardFragment) -> Result<(), SurfaceError>;

    /// Replaces the full content and style of an existing card node.
    fn replace_card(&mut self, fragment: &CardFragment) -> Result<(), SurfaceError>;

    fn set_visible(&mut self, key: &CardKey, visible: bool) -> Result<(), SurfaceError>;
}

/// Yields until the next scheduling tick, so a hidden card can animate in.
#[async_trait(?Send)]
pub trait FrameScheduler {
    async fn next_tick(&self);
}

/// Resolves at once. Used off-browser, where there is nothing to animate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

#[async_trait(?Send)]
impl FrameScheduler for ImmediateScheduler {
    async fn next_tick(&self) {}
}

/// Change applied to a surface, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SurfaceEvent {
    Status { text: String },
    Message { kind: MessageKind },
    Mounted { key: CardKey },
    Replaced { key: CardKey },
    Visibility { key: CardKey, visible: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryCard {
    pub key: CardKey,
    pub markup: String,
    pub style: CardStyle,
    pub visible: bool,
}

/// In-memory page, used by the CLI and by tests.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemorySurface {
    status: String,
    message: Option<(MessageKind, String)>,
    cards: Vec<MemoryCard>,
    events: Vec<SurfaceEvent>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn message(&self) -> Option<(MessageKind, &str)> {
        self.message.as_ref().map(|(kind, text)| (*kind, text.as_str()))
    }

    pub fn cards(&self) -> &[MemoryCard] {
        &self.cards
    }

    pub fn card(&self, key: &CardKey) -> Option<&MemoryCard> {
        self.cards.iter().find(|card| &card.key == key)
    }

    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }

    /// Page body as HTML: status line followed by the container.
    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<p class=\"timeline-status\">{}</p>\n<section class=\"timeline-phases\">\n",
            escape_html(&self.status)
        );
        match &self.message {
            Some((kind, text)) => {
                html.push_str(&format!(
                    "  <p class=\"{}\">{}</p>\n",
                    kind.class_name(),
                    escape_html(text)
                ));
            }
            None => {
                for card in &self.cards {
                    html.push_str(&format!(
                        "  <article id=\"{}\" class=\"{}\" style=\"{}\">{}</article>\n",
                        escape_html(card.key.as_str()),
                        card_class(card.visible),
                        escape_html(&card.style.to_css()),
                        card.markup
                    ));
                }
            }
        }
        html.push_str("</section>\n");
        html
    }

    fn card_mut(&mut self, key: &CardKey) -> Result<&mut MemoryCard, SurfaceError> {
        self.cards
            .iter_mut()
            .find(|card| &card.key == key)
            .ok_or_else(|| SurfaceError(format!("no card mounted for {key}")))
    }
}

/// Class list of a card node.
pub fn card_class(visible: bool) -> &'static str {
    if visible {
        "phase-card visible"
    } else {
        "phase-card"
    }
}

impl TimelineSurface for MemorySurface {
    fn set_status(&mut self, text: &str) -> Result<(), SurfaceError> {
        self.status = text.to_string();
        self.events.push(SurfaceEvent::Status {
            text: text.to_string(),
        });
        Ok(())
    }

    fn show_message(&mut self, kind: MessageKind, text: &str) -> Result<(), SurfaceError> {
        self.cards.clear();
        self.message = Some((kind, text.to_string()));
        self.events.push(SurfaceEvent::Message { kind });
        Ok(())
    }

    fn mount_card(&mut self, fragment: &CardFragment) -> Result<(), SurfaceError> {
        if self.card(&fragment.key).is_some() {
            return Err(SurfaceError(format!("card {} is already mounted", fragment.key)));
        }
        self.cards.push(MemoryCard {
            key: fragment.key.clone(),
            markup: fragment.markup.clone(),
            style: fragment.style.clone(),
            visible: fragment.visible,
        });
        self.events.push(SurfaceEvent::Mounted {
            key: fragment.key.clone(),
        });
        Ok(())
    }

    fn replace_card(&mut self, fragment: &CardFragment) -> Result<(), SurfaceError> {
        let card = self.card_mut(&fragment.key)?;
        card.markup = fragment.markup.clone();
        card.style = fragment.style.clone();
        card.visible = fragment.visible;
        self.events.push(SurfaceEvent::Replaced {
            key: fragment.key.clone(),
        });
        Ok(())
    }

    fn set_visible(&mut self, key: &CardKey, visible: bool) -> Result<(), SurfaceError> {
        self.card_mut(key)?.visible = visible;
        self.events.push(SurfaceEvent::Visibility {
            key: key.clone(),
            visible,
        });
        Ok(())
    }
}
