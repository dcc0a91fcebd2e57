//! Per-cycle state machine
//!
//! ```text
//! AwaitTelemetry -> Screened -> Confirmed -+-> Diagnosed -> Resolved -+-> Recorded
//!                                          |                          |
//!                                          +-> Skipped ---------------+
//! ```
//!
//! `Recorded` is terminal for the cycle; the orchestrator starts the next
//! cycle from `AwaitTelemetry`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    AwaitTelemetry,
    Screened,
    Confirmed,
    Diagnosed,
    Resolved,
    Skipped,
    Recorded,
}

impl CycleState {
    /// Next state. `confirmed` only matters when leaving `Confirmed`.
    /// `Recorded` stays put.
    pub fn advance(self, confirmed: bool) -> Self {
        match self {
            CycleState::AwaitTelemetry => CycleState::Screened,
            CycleState::Screened => CycleState::Confirmed,
            CycleState::Confirmed if confirmed => CycleState::Diagnosed,
            CycleState::Confirmed => CycleState::Skipped,
            CycleState::Diagnosed => CycleState::Resolved,
            CycleState::Resolved | CycleState::Skipped | CycleState::Recorded => CycleState::Recorded,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == CycleState::Recorded
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CycleState::AwaitTelemetry => "await_telemetry",
            CycleState::Screened => "screened",
            CycleState::Confirmed => "confirmed",
            CycleState::Diagnosed => "diagnosed",
            CycleState::Resolved => "resolved",
            CycleState::Skipped => "skipped",
            CycleState::Recorded => "recorded",
        }
    }
}

impl std::fmt::Display for CycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
