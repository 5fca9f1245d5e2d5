//! Scripted service and recording renderer shared by the client tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use podrace_core::types::{
    CreatedRace, Race, RaceId, RacePosition, RaceStatus, Racer, RacerId, Track, TrackId,
};
use podrace_core::view::{Renderer, ViewModel};
use podrace_core::ServiceError;

use crate::service::{RaceService, ServiceResult};

pub(crate) fn pos(racer_id: RacerId, segment: u32, final_position: Option<u32>) -> RacePosition {
    RacePosition {
        racer_id,
        segment,
        final_position,
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Poll {
    Progress(Vec<RacePosition>),
    Finished(Vec<RacePosition>),
    Pending,
    Fail,
    /// The fetch panics, taking the polling task down with it.
    Crash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Create {
        player_id: RacerId,
        track_id: TrackId,
    },
    Status(RaceId),
    Start(RaceId),
    Accelerate(RaceId),
}

pub(crate) struct StubService {
    race_id: RaceId,
    polls: Mutex<VecDeque<Poll>>,
    failing_create: bool,
    failing_start: bool,
    create_delay: Duration,
    poll_delay: Duration,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubService {
    pub(crate) fn new(race_id: RaceId) -> Self {
        Self {
            race_id,
            polls: Mutex::new(VecDeque::new()),
            failing_create: false,
            failing_start: false,
            create_delay: Duration::ZERO,
            poll_delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Queue poll responses; once exhausted every poll reports in-progress.
    pub(crate) fn with_polls(self, polls: impl IntoIterator<Item = Poll>) -> Self {
        self.polls.lock().unwrap().extend(polls);
        self
    }

    pub(crate) fn failing_create(mut self) -> Self {
        self.failing_create = true;
        self
    }

    pub(crate) fn failing_start(mut self) -> Self {
        self.failing_start = true;
        self
    }

    pub(crate) fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub(crate) fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Status(_)))
            .count()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn unavailable() -> ServiceError {
        ServiceError::Status {
            status: 503,
            body: "unavailable".into(),
        }
    }
}

impl RaceService for StubService {
    async fn create_race(
        &self,
        player_id: RacerId,
        track_id: TrackId,
    ) -> ServiceResult<CreatedRace> {
        self.record(Call::Create {
            player_id,
            track_id,
        });
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        if self.failing_create {
            return Err(Self::unavailable());
        }
        Ok(CreatedRace { id: self.race_id })
    }

    async fn race_status(&self, race_id: RaceId) -> ServiceResult<Race> {
        self.record(Call::Status(race_id));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.poll_delay.is_zero() {
            tokio::time::sleep(self.poll_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let next = self.polls.lock().unwrap().pop_front();
        let (status, positions) = match next {
            Some(Poll::Progress(p)) => (RaceStatus::InProgress, p),
            Some(Poll::Finished(p)) => (RaceStatus::Finished, p),
            Some(Poll::Pending) => (RaceStatus::Pending, Vec::new()),
            Some(Poll::Fail) => return Err(Self::unavailable()),
            Some(Poll::Crash) => panic!("status handler crashed"),
            None => (RaceStatus::InProgress, Vec::new()),
        };
        Ok(Race {
            id: race_id,
            status,
            positions,
        })
    }

    async fn start_race(&self, race_id: RaceId) -> ServiceResult<()> {
        self.record(Call::Start(race_id));
        if self.failing_start {
            return Err(Self::unavailable());
        }
        Ok(())
    }

    async fn accelerate(&self, race_id: RaceId) -> ServiceResult<()> {
        self.record(Call::Accelerate(race_id));
        Ok(())
    }

    async fn list_tracks(&self) -> ServiceResult<Vec<Track>> {
        Ok(Vec::new())
    }

    async fn list_racers(&self) -> ServiceResult<Vec<Racer>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub(crate) struct RecordingRenderer {
    views: Mutex<Vec<ViewModel>>,
}

impl RecordingRenderer {
    pub(crate) fn views(&self) -> Vec<ViewModel> {
        self.views.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&ViewModel) -> bool) -> usize {
        self.views.lock().unwrap().iter().filter(|v| pred(v)).count()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, view: &ViewModel) {
        self.views.lock().unwrap().push(view.clone());
    }
}
