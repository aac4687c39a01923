//! Engine lifecycle state machine.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle state of an engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Opening storage and preparing caches.
    Installing,
    /// Installed, waiting to take over.
    Waiting,
    /// Handling requests.
    Active,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Installing => "installing",
            Self::Waiting => "waiting",
            Self::Active => "active",
        };
        f.write_str(name)
    }
}

/// Events that drive the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Installed,
    Activate,
    SkipWaiting,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Installed => "installed",
            Self::Activate => "activate",
            Self::SkipWaiting => "skipWaiting",
        };
        f.write_str(name)
    }
}

/// Message posted to the engine over the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ControlMessage {
    #[serde(rename = "skipWaiting")]
    SkipWaiting,
}

impl ControlMessage {
    /// Parse a JSON control message such as `{"action":"skipWaiting"}`.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| Error::InvalidInput(format!("unknown control message: {e}")))
    }

    pub const fn event(self) -> LifecycleEvent {
        match self {
            Self::SkipWaiting => LifecycleEvent::SkipWaiting,
        }
    }
}

/// A state change produced by [`Lifecycle::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

impl Transition {
    /// Whether this transition made the engine active.
    pub fn activated(self) -> bool {
        self.from != LifecycleState::Active && self.to == LifecycleState::Active
    }
}

#[derive(Debug)]
struct Inner {
    state: LifecycleState,
    skip_requested: bool,
}

/// Installing, then waiting, then active.
///
/// `skipWaiting` received while still installing is remembered and applied
/// as soon as installation completes.
#[derive(Debug)]
pub struct Lifecycle {
    inner: Mutex<Inner>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: LifecycleState::Installing,
                skip_requested: false,
            }),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    pub fn apply(&self, event: LifecycleEvent) -> Result<Transition> {
        let mut inner = self.lock();
        let from = inner.state;

        let to = match (from, event) {
            (LifecycleState::Installing, LifecycleEvent::Installed) if inner.skip_requested => {
                LifecycleState::Active
            }
            (LifecycleState::Installing, LifecycleEvent::Installed) => LifecycleState::Waiting,
            (LifecycleState::Installing, LifecycleEvent::SkipWaiting) => {
                inner.skip_requested = true;
                LifecycleState::Installing
            }
            (LifecycleState::Waiting, LifecycleEvent::Activate | LifecycleEvent::SkipWaiting) => {
                LifecycleState::Active
            }
            (LifecycleState::Active, LifecycleEvent::SkipWaiting) => LifecycleState::Active,
            _ => {
                return Err(Error::InvalidTransition {
                    from: from.to_string(),
                    event: event.to_string(),
                })
            }
        };

        inner.state = to;
        if from != to {
            tracing::info!(%from, %to, %event, "Lifecycle transition");
        }
        Ok(Transition { from, to })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
