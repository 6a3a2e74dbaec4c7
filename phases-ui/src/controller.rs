//! Two-stage loading: phase list first, then detail for each phase in order.

use std::collections::HashMap;

use phases_client::PhaseSource;
use phases_core::{derive_card_keys, CardKey, CardState, PhaseSummary, TimelineConfig, TimelineError};
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::render::{render_error, render_placeholder, CardFragment, CardRenderer};
use crate::surface::{FrameScheduler, ImmediateScheduler, MessageKind, SurfaceError, TimelineSurface};

pub const FATAL_STATUS: &str = "Something went wrong.";
pub const EMPTY_MESSAGE: &str = "No listening phases to show yet. Save some songs and come back!";

#[derive(Debug, thiserror::Error)]
pub enum UiError {
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// One phase as owned by the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseCard {
    pub key: CardKey,
    pub summary: PhaseSummary,
    pub state: CardState,
}

/// How a successful load ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Empty,
    Loaded { populated: usize, failed: usize },
}

/// Drives one timeline page from a `PhaseSource` onto a `TimelineSurface`.
pub struct TimelineController<P, S, T = ImmediateScheduler, R = StdRng> {
    config: TimelineConfig,
    source: P,
    surface: S,
    scheduler: T,
    renderer: CardRenderer<R>,
    cards: Vec<PhaseCard>,
    by_period: HashMap<String, usize>,
    loaded: bool,
}

impl<P, S> TimelineController<P, S>
where
    P: PhaseSource,
    S: TimelineSurface,
{
    pub fn new(config: TimelineConfig, source: P, surface: S) -> Self {
        Self {
            config,
            source,
            surface,
            scheduler: ImmediateScheduler,
            renderer: CardRenderer::default(),
            cards: Vec::new(),
            by_period: HashMap::new(),
            loaded: false,
        }
    }
}

impl<P, S, T, R> TimelineController<P, S, T, R>
where
    P: PhaseSource,
    S: TimelineSurface,
    T: FrameScheduler,
    R: Rng,
{
    pub fn with_scheduler<U: FrameScheduler>(self, scheduler: U) -> TimelineController<P, S, U, R> {
        TimelineController {
            config: self.config,
            source: self.source,
            surface: self.surface,
            scheduler,
            renderer: self.renderer,
            cards: self.cards,
            by_period: self.by_period,
            loaded: self.loaded,
        }
    }

    pub fn with_renderer<Q: Rng>(self, renderer: CardRenderer<Q>) -> TimelineController<P, S, T, Q> {
        TimelineController {
            config: self.config,
            source: self.source,
            surface: self.surface,
            scheduler: self.scheduler,
            renderer,
            cards: self.cards,
            by_period: self.by_period,
            loaded: self.loaded,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Cards in server order.
    pub fn cards(&self) -> &[PhaseCard] {
        &self.cards
    }

    /// Card of a phase by its `phase_period`.
    pub fn card(&self, phase_period: &str) -> Option<&PhaseCard> {
        self.by_period
            .get(phase_period)
            .and_then(|&index| self.cards.get(index))
    }

    /// Loads the whole timeline. May run only once per controller.
    ///
    /// A failed phase list is fatal: the page shows one error message and the
    /// error is returned. A failed phase detail only marks that card failed.
    pub async fn load_timeline(&mut self) -> Result<LoadOutcome, UiError> {
        if self.loaded {
            return Err(TimelineError::AlreadyLoaded.into());
        }
        self.loaded = true;

        self.surface.set_status(&self.config.loading_text())?;

        let phases = match self.source.list_phases().await {
            Ok(phases) => phases,
            Err(err) => {
                error!(error = %err, "Phase list request failed");
                self.surface.set_status(FATAL_STATUS)?;
                self.surface.show_message(
                    MessageKind::Error,
                    &format!("Could not load your timeline: {err}"),
                )?;
                return Err(TimelineError::PhaseList(err.to_string()).into());
            }
        };

        if phases.is_empty() {
            info!("No phases to show");
            self.surface.set_status(&self.config.ready_text())?;
            self.surface.show_message(MessageKind::Empty, EMPTY_MESSAGE)?;
            return Ok(LoadOutcome::Empty);
        }

        self.mount_placeholders(phases)?;
        self.surface.set_status(&self.config.ready_text())?;

        for index in 0..self.cards.len() {
            self.load_detail(index).await?;
        }

        let failed = self
            .cards
            .iter()
            .filter(|card| matches!(card.state, CardState::Failed { .. }))
            .count();
        let populated = self.cards.len() - failed;
        info!(populated, failed, "Timeline loaded");
        Ok(LoadOutcome::Loaded { populated, failed })
    }

    fn mount_placeholders(&mut self, phases: Vec<PhaseSummary>) -> Result<(), UiError> {
        let keys = derive_card_keys(&phases);
        self.cards.reserve(phases.len());

        for (key, summary) in keys.into_iter().zip(phases) {
            if key != CardKey::from_period(&summary.phase_period) {
                warn!(phase = %summary.phase_period, key = %key, "Card key collided, using indexed key");
            }
            let fragment = render_placeholder(&key, &summary);
            self.surface.mount_card(&fragment)?;

            self.by_period
                .entry(summary.phase_period.clone())
                .or_insert(self.cards.len());
            self.cards.push(PhaseCard {
                key,
                summary,
                state: CardState::Placeholder,
            });
        }

        info!(count = self.cards.len(), "Placeholders mounted");
        Ok(())
    }

    /// Surface errors while filling one card fail that card only.
    async fn load_detail(&mut self, index: usize) -> Result<(), UiError> {
        let key = self.cards[index].key.clone();
        let summary = self.cards[index].summary.clone();
        debug!(phase = %summary.phase_period, "Loading phase detail");

        let detail = match self.source.phase_detail(&summary).await {
            Ok(detail) => detail,
            Err(err) => {
                warn!(phase = %summary.phase_period, error = %err, "Phase detail failed");
                return self.mark_failed(index, err.to_string());
            }
        };

        let fragment = self.renderer.render_populated(&key, &summary, &detail);
        if let Err(err) = self.reveal(&fragment).await {
            warn!(phase = %summary.phase_period, error = %err, "Could not show phase detail");
            return self.mark_failed(index, err.to_string());
        }
        self.cards[index]
            .state
            .populate(&summary.phase_period, detail)?;
        Ok(())
    }

    async fn reveal(&mut self, fragment: &CardFragment) -> Result<(), SurfaceError> {
        self.surface.replace_card(fragment)?;
        self.scheduler.next_tick().await;
        self.surface.set_visible(&fragment.key, true)
    }

    fn mark_failed(&mut self, index: usize, reason: String) -> Result<(), UiError> {
        let card = &mut self.cards[index];
        card.state.fail(&card.summary.phase_period, reason)?;

        let fragment = render_error(&card.key, &card.summary);
        if let Err(err) = self.surface.replace_card(&fragment) {
            warn!(phase = %card.summary.phase_period, error = %err, "Could not show phase error");
        }
        Ok(())
    }
}
