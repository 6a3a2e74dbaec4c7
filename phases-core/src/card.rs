//! Card identity and the placeholder -> populated/failed state machine.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PhaseDetail, PhaseSummary, TimelineError};

const KEY_PREFIX: &str = "phase-";

/// DOM-addressable key of one phase card, e.g. `phase-2020-H1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardKey(String);

impl CardKey {
    /// Slug of a phase label: every whitespace character becomes `-`.
    pub fn from_period(period: &str) -> Self {
        let slug: String = period
            .chars()
            .map(|ch| if ch.is_whitespace() { '-' } else { ch })
            .collect();
        CardKey(format!("{KEY_PREFIX}{slug}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives one unique key per phase, in list order.
///
/// Labels whose slugs collide (`"2020 H1"` and `"2020-H1"`, or a repeated
/// label) keep the plain slug for the first occurrence; later ones get the
/// list index appended.
pub fn derive_card_keys(phases: &[PhaseSummary]) -> Vec<CardKey> {
    let mut taken = HashSet::with_capacity(phases.len());
    let mut keys = Vec::with_capacity(phases.len());

    for (index, phase) in phases.iter().enumerate() {
        let mut key = CardKey::from_period(&phase.phase_period);
        if taken.contains(&key) {
            let mut suffix = index;
            loop {
                let candidate = CardKey(format!("{}-{suffix}", key.0));
                if !taken.contains(&candidate) {
                    key = candidate;
                    break;
                }
                suffix += phases.len();
            }
        }
        taken.insert(key.clone());
        keys.push(key);
    }

    keys
}

/// Lifecycle of one card. Populated and Failed are terminal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CardState {
    #[default]
    Placeholder,
    Populated { detail: PhaseDetail },
    Failed { reason: String },
}

impl CardState {
    pub fn name(&self) -> &'static str {
        match self {
            CardState::Placeholder => "placeholder",
            CardState::Populated { .. } => "populated",
            CardState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CardState::Placeholder)
    }

    pub fn detail(&self) -> Option<&PhaseDetail> {
        match self {
            CardState::Populated { detail } => Some(detail),
            _ => None,
        }
    }

    pub fn populate(&mut self, phase: &str, detail: PhaseDetail) -> Result<(), TimelineError> {
        self.ensure_placeholder(phase, "populated")?;
        *self = CardState::Populated { detail };
        Ok(())
    }

    pub fn fail(&mut self, phase: &str, reason: impl Into<String>) -> Result<(), TimelineError> {
        self.ensure_placeholder(phase, "failed")?;
        *self = CardState::Failed {
            reason: reason.into(),
        };
        Ok(())
    }

    fn ensure_placeholder(&self, phase: &str, to: &'static str) -> Result<(), TimelineError> {
        if self.is_terminal() {
            return Err(TimelineError::InvalidTransition {
                phase: phase.to_string(),
                from: self.name(),
                to,
            });
        }
        Ok(())
    }
}
