//! Single source of truth for selections, reference data and the current race.
//!
//! All writes go through [`Store::update`], which replaces the fields present
//! in a [`StorePatch`] and keeps the rest. [`SharedStore`] is the handle the
//! orchestrator, timer callbacks and renderers share; writes are visible to
//! the next read immediately.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::types::{Race, RaceId, Racer, RacerId, Selection, Track, TrackId};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Store {
    pub track_id: Option<TrackId>,
    pub player_id: Option<RacerId>,
    pub race_id: Option<RaceId>,
    /// Latest snapshot of the current race. Never a history.
    pub race: Option<Race>,
    pub tracks: Vec<Track>,
    pub racers: Vec<Racer>,
}

/// Partial update. `Some(x)` replaces the field; `None` leaves it alone.
/// Optional fields use a nested `Option` so they can be cleared.
#[derive(Debug, Clone, Default)]
pub struct StorePatch {
    pub track_id: Option<Option<TrackId>>,
    pub player_id: Option<Option<RacerId>>,
    pub race_id: Option<Option<RaceId>>,
    pub race: Option<Option<Race>>,
    pub tracks: Option<Vec<Track>>,
    pub racers: Option<Vec<Racer>>,
}

impl StorePatch {
    pub fn track(id: TrackId) -> Self {
        Self {
            track_id: Some(Some(id)),
            ..Default::default()
        }
    }

    pub fn player(id: RacerId) -> Self {
        Self {
            player_id: Some(Some(id)),
            ..Default::default()
        }
    }

    pub fn race_id(id: RaceId) -> Self {
        Self {
            race_id: Some(Some(id)),
            ..Default::default()
        }
    }

    pub fn race(race: Race) -> Self {
        Self {
            race: Some(Some(race)),
            ..Default::default()
        }
    }

    /// Forget the previous race so a new one starts from a clean slate.
    pub fn clear_race() -> Self {
        Self {
            race_id: Some(None),
            race: Some(None),
            ..Default::default()
        }
    }

    pub fn tracks(tracks: Vec<Track>) -> Self {
        Self {
            tracks: Some(tracks),
            ..Default::default()
        }
    }

    pub fn racers(racers: Vec<Racer>) -> Self {
        Self {
            racers: Some(racers),
            ..Default::default()
        }
    }
}

impl Store {
    pub fn update(&mut self, patch: StorePatch) {
        if let Some(v) = patch.track_id {
            self.track_id = v;
        }
        if let Some(v) = patch.player_id {
            self.player_id = v;
        }
        if let Some(v) = patch.race_id {
            self.race_id = v;
        }
        if let Some(v) = patch.race {
            self.race = v;
        }
        if let Some(v) = patch.tracks {
            self.tracks = v;
        }
        if let Some(v) = patch.racers {
            self.racers = v;
        }
    }

    pub fn selection(&self) -> Selection {
        Selection {
            track_id: self.track_id,
            player_id: self.player_id,
        }
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn racer(&self, id: RacerId) -> Option<&Racer> {
        self.racers.iter().find(|r| r.id == id)
    }
}

// ---------------------------------------------------------------------------
// SharedStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<Store>>,
}

impl SharedStore {
    pub fn new(store: Store) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn update(&self, patch: StorePatch) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .update(patch);
    }

    pub fn read<T>(&self, f: impl FnOnce(&Store) -> T) -> T {
        f(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn snapshot(&self) -> Store {
        self.read(Store::clone)
    }

    pub fn selection(&self) -> Selection {
        self.read(Store::selection)
    }

    pub fn select_track(&self, id: TrackId) {
        self.update(StorePatch::track(id));
    }

    pub fn select_racer(&self, id: RacerId) {
        self.update(StorePatch::player(id));
    }
}
