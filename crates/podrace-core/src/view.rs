//! View models emitted at lifecycle transition points.
//!
//! Renderers only turn a [`ViewModel`] into output for its [`Mount`]; all
//! ordering and labelling happens here. Racer labels are projected per
//! render from the current player id and never written back to the store.

use serde::Serialize;
use std::cmp::Ordering;

use crate::lifecycle::FailureKind;
use crate::store::Store;
use crate::types::{RacePosition, Racer, RacerId, Track};

pub const PLAYER_MARKER: &str = " (you)";

/// Named mount points of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Mount {
    Tracks,
    Racers,
    Race,
    LeaderBoard,
    Countdown,
}

impl Mount {
    pub fn selector(self) -> &'static str {
        match self {
            Mount::Tracks => "#tracks",
            Mount::Racers => "#racers",
            Mount::Race => "#race",
            Mount::LeaderBoard => "#leaderBoard",
            Mount::Countdown => "#big-numbers",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub racer_id: RacerId,
    pub label: String,
    pub segment: u32,
    pub final_position: Option<u32>,
    pub is_player: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewModel {
    Tracks { tracks: Vec<Track> },
    Racers { racers: Vec<Racer> },
    RaceStart { track_name: String, countdown: u32 },
    Countdown { remaining: u32 },
    Leaderboard { rows: Vec<LeaderboardRow> },
    Results { rows: Vec<LeaderboardRow> },
    Failure { kind: FailureKind, message: String },
}

impl ViewModel {
    pub fn mount(&self) -> Mount {
        match self {
            ViewModel::Tracks { .. } => Mount::Tracks,
            ViewModel::Racers { .. } => Mount::Racers,
            ViewModel::RaceStart { .. } | ViewModel::Results { .. } | ViewModel::Failure { .. } => {
                Mount::Race
            }
            ViewModel::Countdown { .. } => Mount::Countdown,
            ViewModel::Leaderboard { .. } => Mount::LeaderBoard,
        }
    }
}

/// Turns view models into output. Implementations must not hold business
/// logic and must not block for long; they run inside timer callbacks.
pub trait Renderer: Send + Sync {
    fn render(&self, view: &ViewModel);
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// Append the player marker unless it is already present.
pub fn annotate_player(name: &str) -> String {
    if name.ends_with(PLAYER_MARKER) {
        name.to_string()
    } else {
        format!("{name}{PLAYER_MARKER}")
    }
}

pub fn racer_label(racer: &Racer, player_id: Option<RacerId>) -> String {
    if player_id == Some(racer.id) {
        annotate_player(&racer.display_name)
    } else {
        racer.display_name.clone()
    }
}

/// Descending segment; ties keep service order.
pub fn sort_by_progress(positions: &mut [RacePosition]) {
    positions.sort_by(|a, b| b.segment.cmp(&a.segment));
}

/// Ascending final position; racers without one go last.
pub fn sort_by_final_position(positions: &mut [RacePosition]) {
    positions.sort_by(|a, b| match (a.final_position, b.final_position) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn rows(positions: &[RacePosition], store: &Store) -> Vec<LeaderboardRow> {
    positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let label = match store.racer(p.racer_id) {
                Some(r) => racer_label(r, store.player_id),
                None if store.player_id == Some(p.racer_id) => {
                    annotate_player(&format!("Racer {}", p.racer_id))
                }
                None => format!("Racer {}", p.racer_id),
            };
            LeaderboardRow {
                rank: i + 1,
                racer_id: p.racer_id,
                label,
                segment: p.segment,
                final_position: p.final_position,
                is_player: store.player_id == Some(p.racer_id),
            }
        })
        .collect()
}

pub fn leaderboard(positions: &[RacePosition], store: &Store) -> ViewModel {
    let mut sorted = positions.to_vec();
    sort_by_progress(&mut sorted);
    ViewModel::Leaderboard {
        rows: rows(&sorted, store),
    }
}

pub fn results(positions: &[RacePosition], store: &Store) -> ViewModel {
    let mut sorted = positions.to_vec();
    sort_by_final_position(&mut sorted);
    ViewModel::Results {
        rows: rows(&sorted, store),
    }
}

pub fn race_start(track: Option<&Track>, countdown: u32) -> ViewModel {
    ViewModel::RaceStart {
        track_name: track.map(|t| t.name.clone()).unwrap_or_else(|| "Unknown track".into()),
        countdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn racer(id: RacerId, name: &str) -> Racer {
        Racer {
            id,
            display_name: name.into(),
            top_speed: 0,
            acceleration: 0,
            handling: 0,
            image_ref: String::new(),
        }
    }

    fn pos(racer_id: RacerId, segment: u32, final_position: Option<u32>) -> RacePosition {
        RacePosition {
            racer_id,
            segment,
            final_position,
        }
    }

    fn store() -> Store {
        Store {
            player_id: Some(7),
            racers: vec![racer(1, "Anakin"), racer(7, "Sebulba"), racer(9, "Gasgano")],
            ..Default::default()
        }
    }

    #[test]
    fn annotating_twice_leaves_one_marker() {
        let once = annotate_player("Sebulba");
        let twice = annotate_player(&once);
        assert_eq!(twice, "Sebulba (you)");
        assert_eq!(twice.matches("(you)").count(), 1);
    }

    #[test]
    fn labels_do_not_mutate_canonical_racers() {
        let store = store();
        let first = leaderboard(&[pos(7, 10, None)], &store);
        let second = leaderboard(&[pos(7, 12, None)], &store);
        assert_eq!(store.racer(7).unwrap().display_name, "Sebulba");
        for view in [first, second] {
            let ViewModel::Leaderboard { rows } = view else {
                panic!("expected Leaderboard")
            };
            assert_eq!(rows[0].label, "Sebulba (you)");
            assert!(rows[0].is_player);
        }
    }

    #[test]
    fn leaderboard_orders_by_descending_segment() {
        let view = leaderboard(&[pos(1, 10, None), pos(7, 25, None), pos(9, 17, None)], &store());
        let ViewModel::Leaderboard { rows } = view else {
            panic!("expected Leaderboard")
        };
        let order: Vec<_> = rows.iter().map(|r| r.racer_id).collect();
        assert_eq!(order, vec![7, 9, 1]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[2].rank, 3);
    }

    #[test]
    fn results_order_by_final_position_with_unranked_last() {
        let view = results(
            &[pos(1, 201, Some(3)), pos(9, 150, None), pos(7, 201, Some(1))],
            &store(),
        );
        let ViewModel::Results { rows } = view else {
            panic!("expected Results")
        };
        let order: Vec<_> = rows.iter().map(|r| r.racer_id).collect();
        assert_eq!(order, vec![7, 1, 9]);
    }

    #[test]
    fn unknown_racer_gets_placeholder_label() {
        let view = leaderboard(&[pos(42, 3, None)], &store());
        let ViewModel::Leaderboard { rows } = view else {
            panic!("expected Leaderboard")
        };
        assert_eq!(rows[0].label, "Racer 42");
    }

    #[test]
    fn views_know_their_mount() {
        assert_eq!(ViewModel::Countdown { remaining: 2 }.mount(), Mount::Countdown);
        assert_eq!(race_start(None, 3).mount(), Mount::Race);
        assert_eq!(Mount::LeaderBoard.selector(), "#leaderBoard");
    }
}
