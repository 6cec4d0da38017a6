//! Local view of the game.
//!
//! Every snapshot replaces the held state wholesale. Nothing is merged, so a
//! field absent from a newer snapshot reads as its default, never as the
//! value an older snapshot carried.
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──snapshot──▶ Active ──snapshot{finished}──▶ Finished
//!       └──────────────snapshot{finished}──────────────────────▲
//! ```
//!
//! `Finished` is terminal. Later snapshots still replace the held state.

use credo_proto::GameState;

/// Lifecycle of the local game view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No snapshot applied yet; the game has not started for us.
    Uninitialized,
    /// At least one snapshot applied, game running.
    Active,
    /// A snapshot reported the game as finished.
    Finished,
}

/// Holds the latest snapshot and the phase derived from the snapshot history.
#[derive(Debug, Clone)]
pub struct StateReconciler {
    state: Option<GameState>,
    phase: Phase,
}

impl Default for StateReconciler {
    fn default() -> Self {
        Self { state: None, phase: Phase::Uninitialized }
    }
}

impl StateReconciler {
    /// Create a reconciler with no state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held state with `snapshot`. Returns the resulting phase.
    pub fn apply(&mut self, snapshot: GameState) -> Phase {
        self.phase = match self.phase {
            Phase::Finished => Phase::Finished,
            Phase::Uninitialized | Phase::Active if snapshot.game_finished => Phase::Finished,
            Phase::Uninitialized | Phase::Active => Phase::Active,
        };
        self.state = Some(snapshot);
        self.phase
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The most recently applied snapshot.
    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    /// True until the first snapshot is applied.
    pub fn is_waiting(&self) -> bool {
        self.state.is_none()
    }
}
