//! Per-request state: `Idle → Validating → (Rejected | Dispatching) →
//! (Failed | Extracting) → (Failed | Ready)`.

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Rejected,
    Dispatching,
    Extracting,
    Failed,
    Ready,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Rejected | Phase::Failed | Phase::Ready)
    }

    fn allows(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Rejected)
                | (Validating, Dispatching)
                | (Dispatching, Failed)
                | (Dispatching, Extracting)
                | (Extracting, Failed)
                | (Extracting, Ready)
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: Phase,
    pub to: Phase,
}

/// Tracks one request through its phases. Never reused: a new action gets a
/// new `Lifecycle`.
#[derive(Debug)]
pub struct Lifecycle {
    endpoint: &'static str,
    phase: Phase,
}

impl Lifecycle {
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            phase: Phase::Idle,
        }
    }

    pub fn advance(&mut self, next: Phase) -> Result<(), IllegalTransition> {
        if !self.phase.allows(next) {
            return Err(IllegalTransition {
                from: self.phase,
                to: next,
            });
        }
        debug!(endpoint = self.endpoint, from = ?self.phase, to = ?next, "request phase");
        self.phase = next;
        Ok(())
    }

    /// Move to `Rejected` or `Failed`, whichever is legal from here.
    pub fn fail(&mut self) {
        let next = if self.phase == Phase::Validating {
            Phase::Rejected
        } else {
            Phase::Failed
        };
        if self.advance(next).is_err() {
            debug!(
                endpoint = self.endpoint,
                phase = ?self.phase,
                "failure after terminal phase ignored"
            );
        }
    }
}
