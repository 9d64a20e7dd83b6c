//! Single/double click disambiguation on the tray icon.
//!
//! The platform reports every click on the tray icon the same way. A first
//! click arms a timer bounded by the double-click interval:
//!
//! ```text
//! Idle  --click-->            Armed(deadline)
//! Armed --click-->            Idle   => ToggleConnection
//! Armed --deadline passed-->  Idle   => ToggleVisibility
//! ```
//!
//! This is a debounce, not a queue: a third click starts a new gesture.

use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

/// Timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Armed { deadline: Instant },
}

/// What a completed gesture asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    /// Double click: connect when disconnected, disconnect otherwise.
    ToggleConnection,
    /// Single click: show or hide the conversation list.
    ToggleVisibility,
}

/// Turns tray clicks into [`GestureAction`]s.
#[derive(Debug, Clone)]
pub struct GestureDisambiguator {
    interval: Duration,
    state: GestureState,
}

impl GestureDisambiguator {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: GestureState::Idle,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The pending timer deadline, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Armed { deadline } => Some(deadline),
        }
    }

    /// Feeds a click received at `now`.
    ///
    /// A click arriving after an unprocessed deadline first completes the
    /// pending single click, then arms a new gesture.
    pub fn click(&mut self, now: Instant) -> Option<GestureAction> {
        match self.state {
            GestureState::Armed { deadline } if now < deadline => {
                trace!("second click within interval");
                self.state = GestureState::Idle;
                Some(GestureAction::ToggleConnection)
            }
            GestureState::Armed { .. } => {
                self.arm(now);
                Some(GestureAction::ToggleVisibility)
            }
            GestureState::Idle => {
                self.arm(now);
                None
            }
        }
    }

    /// Feeds a timer tick at `now`; fires once the deadline has passed.
    pub fn expire(&mut self, now: Instant) -> Option<GestureAction> {
        match self.state {
            GestureState::Armed { deadline } if now >= deadline => {
                trace!("click interval expired");
                self.state = GestureState::Idle;
                Some(GestureAction::ToggleVisibility)
            }
            _ => None,
        }
    }

    fn arm(&mut self, now: Instant) {
        self.state = GestureState::Armed {
            deadline: now + self.interval,
        };
    }
}
