use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type TrackId = u32;
pub type RacerId = u32;
pub type RaceId = u64;

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    #[serde(rename = "img", default)]
    pub image_ref: String,
}

/// Canonical racer record. Never mutated for display; see
/// [`crate::view::racer_label`] for the per-render projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Racer {
    pub id: RacerId,
    #[serde(rename = "driver_name")]
    pub display_name: String,
    #[serde(default)]
    pub top_speed: u32,
    #[serde(default)]
    pub acceleration: u32,
    #[serde(default)]
    pub handling: u32,
    #[serde(rename = "img", default)]
    pub image_ref: String,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub track_id: Option<TrackId>,
    pub player_id: Option<RacerId>,
}

impl Selection {
    pub fn new(track_id: TrackId, player_id: RacerId) -> Self {
        Self {
            track_id: Some(track_id),
            player_id: Some(player_id),
        }
    }

    /// Both identifiers, or `None` if either is missing.
    pub fn resolve(&self) -> Option<(TrackId, RacerId)> {
        Some((self.track_id?, self.player_id?))
    }
}

// ---------------------------------------------------------------------------
// Race
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RaceStatus {
    #[serde(alias = "unstarted")]
    Pending,
    InProgress,
    Finished,
}

impl RaceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RaceStatus::Pending => "pending",
            RaceStatus::InProgress => "in-progress",
            RaceStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for RaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacePosition {
    #[serde(rename = "id")]
    pub racer_id: RacerId,
    #[serde(default)]
    pub segment: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_position: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub id: RaceId,
    pub status: RaceStatus,
    pub positions: Vec<RacePosition>,
}

/// Body of `GET /api/races/{id}`; the service does not echo the id back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    #[serde(default)]
    pub positions: Vec<RacePosition>,
}

impl RaceSnapshot {
    pub fn into_race(self, id: RaceId) -> Race {
        Race {
            id,
            status: self.status,
            positions: self.positions,
        }
    }
}

/// Body of `POST /api/races`. Only the identifier is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRace {
    #[serde(rename = "ID")]
    pub id: RaceId,
}

/// Result of a race that reached `finished`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceOutcome {
    pub race_id: RaceId,
    pub track_id: TrackId,
    pub player_id: RacerId,
    /// Sorted by ascending final position.
    pub positions: Vec<RacePosition>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RaceOutcome {
    pub fn player_position(&self) -> Option<u32> {
        self.positions
            .iter()
            .find(|p| p.racer_id == self.player_id)
            .and_then(|p| p.final_position)
    }
}
