//! Race lifecycle state machine.
//!
//! Transitions: `Idle → Creating → CountingDown → Starting → Polling → Finished`,
//! with `Failed` reachable from every network step and `Idle` reachable from
//! every active phase on cancellation. `Finished` and `Failed` are terminal; a
//! new `StartRequested` from there supersedes the old race.
//!
//! [`transition`] is pure: it returns the next phase plus the synchronous
//! effects the orchestrator must apply. The async work each phase implies
//! (network calls, timers) is driven by the orchestrator itself.

use serde::Serialize;
use std::fmt;

use crate::error::{RaceError, Result};
use crate::types::{RaceId, RacePosition, RacerId, Selection, TrackId};
use crate::view::sort_by_final_position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    CreateRace,
    StartRace,
    PollFetch,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::CreateRace => "create_race",
            FailureKind::StartRace => "start_race",
            FailureKind::PollFetch => "poll_fetch",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RacePhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RacePhase {
    Idle,
    Creating {
        track_id: TrackId,
        player_id: RacerId,
    },
    CountingDown {
        race_id: RaceId,
    },
    Starting {
        race_id: RaceId,
    },
    Polling {
        race_id: RaceId,
    },
    Finished {
        race_id: RaceId,
    },
    Failed {
        kind: FailureKind,
        reason: String,
    },
}

impl RacePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RacePhase::Idle => "idle",
            RacePhase::Creating { .. } => "creating",
            RacePhase::CountingDown { .. } => "counting_down",
            RacePhase::Starting { .. } => "starting",
            RacePhase::Polling { .. } => "polling",
            RacePhase::Finished { .. } => "finished",
            RacePhase::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RacePhase::Finished { .. } | RacePhase::Failed { .. })
    }

    /// A race is underway: timers may be armed and `start_race` is rejected.
    pub fn is_active(&self) -> bool {
        !matches!(self, RacePhase::Idle) && !self.is_terminal()
    }

    pub fn race_id(&self) -> Option<RaceId> {
        match self {
            RacePhase::CountingDown { race_id }
            | RacePhase::Starting { race_id }
            | RacePhase::Polling { race_id }
            | RacePhase::Finished { race_id } => Some(*race_id),
            _ => None,
        }
    }
}

impl fmt::Display for RacePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Events and effects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RaceEvent {
    StartRequested(Selection),
    RaceCreated(RaceId),
    CreateFailed(String),
    CountdownElapsed,
    RaceStarted,
    StartFailed(String),
    RaceFinished(Vec<RacePosition>),
    PollFailed(String),
    Cancelled,
}

impl RaceEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            RaceEvent::StartRequested(_) => "start_requested",
            RaceEvent::RaceCreated(_) => "race_created",
            RaceEvent::CreateFailed(_) => "create_failed",
            RaceEvent::CountdownElapsed => "countdown_elapsed",
            RaceEvent::RaceStarted => "race_started",
            RaceEvent::StartFailed(_) => "start_failed",
            RaceEvent::RaceFinished(_) => "race_finished",
            RaceEvent::PollFailed(_) => "poll_failed",
            RaceEvent::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Drop the previous race's id and snapshot from the store.
    ClearRace,
    RenderStarting { track_id: TrackId },
    StoreRaceId(RaceId),
    /// Cancel and forget every armed timer.
    ReleaseTimers,
    /// Positions are already sorted by ascending final position.
    RenderResults(Vec<RacePosition>),
    RenderFailure { kind: FailureKind, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: RacePhase,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: RacePhase, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }
}

fn failed(kind: FailureKind, reason: String) -> Transition {
    Transition::to(
        RacePhase::Failed {
            kind,
            reason: reason.clone(),
        },
        vec![Effect::ReleaseTimers, Effect::RenderFailure { kind, reason }],
    )
}

pub fn transition(phase: &RacePhase, event: RaceEvent) -> Result<Transition> {
    use RaceEvent as E;
    use RacePhase as P;

    let t = match (phase, event) {
        (P::Idle | P::Finished { .. } | P::Failed { .. }, E::StartRequested(selection)) => {
            let (track_id, player_id) = selection.resolve().ok_or(RaceError::InvalidSelection)?;
            Transition::to(
                P::Creating {
                    track_id,
                    player_id,
                },
                vec![Effect::ClearRace, Effect::RenderStarting { track_id }],
            )
        }
        (p, E::StartRequested(_)) if p.is_active() => {
            return Err(RaceError::RaceAlreadyInProgress);
        }

        (P::Creating { .. }, E::RaceCreated(race_id)) => Transition::to(
            P::CountingDown { race_id },
            vec![Effect::StoreRaceId(race_id)],
        ),
        (P::Creating { .. }, E::CreateFailed(reason)) => failed(FailureKind::CreateRace, reason),

        (P::CountingDown { race_id }, E::CountdownElapsed) => Transition::to(
            P::Starting { race_id: *race_id },
            vec![Effect::ReleaseTimers],
        ),

        (P::Starting { race_id }, E::RaceStarted) => {
            Transition::to(P::Polling { race_id: *race_id }, vec![])
        }
        (P::CountingDown { .. } | P::Starting { .. }, E::StartFailed(reason)) => {
            failed(FailureKind::StartRace, reason)
        }

        (P::Polling { race_id }, E::RaceFinished(mut positions)) => {
            sort_by_final_position(&mut positions);
            Transition::to(
                P::Finished { race_id: *race_id },
                vec![Effect::ReleaseTimers, Effect::RenderResults(positions)],
            )
        }
        (P::Polling { .. }, E::PollFailed(reason)) => failed(FailureKind::PollFetch, reason),

        (p, E::Cancelled) if p.is_active() => {
            Transition::to(P::Idle, vec![Effect::ReleaseTimers])
        }
        (p, E::Cancelled) => Transition::to(p.clone(), vec![]),

        (p, e) => {
            return Err(RaceError::InvalidTransition {
                from: p.to_string(),
                event: e.as_str().to_string(),
            })
        }
    };
    Ok(t)
}
