use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use podrace_core::config::TimingConfig;
use podrace_core::lifecycle::{transition, Effect, RaceEvent, RacePhase, Transition};
use podrace_core::store::{SharedStore, StorePatch};
use podrace_core::types::{Race, RaceId, RaceOutcome, RacerId, Selection, TrackId};
use podrace_core::view::{self, Renderer, ViewModel};
use podrace_core::{RaceError, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::countdown::Countdown;
use crate::poller::ProgressPoller;
use crate::service::{RaceService, ServiceResult};
use crate::timer::TimerHandle;

// ─── Slot ─────────────────────────────────────────────────────────────────

/// The single active race: its phase plus whatever timer it currently owns.
///
/// `generation` is bumped whenever a race begins or is cancelled. Work that
/// carries an older generation is discarded without touching state.
struct Slot {
    generation: u64,
    phase: RacePhase,
    cancel: Option<watch::Sender<bool>>,
    countdown: Option<TimerHandle>,
    poller: Option<TimerHandle>,
}

impl Slot {
    fn release_timers(&mut self) {
        if let Some(t) = self.countdown.take() {
            t.cancel();
        }
        if let Some(t) = self.poller.take() {
            t.cancel();
        }
    }

    fn armed_timers(&self) -> usize {
        [&self.countdown, &self.poller]
            .into_iter()
            .flatten()
            .filter(|t| t.is_armed())
            .count()
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the race's timers when `start_race` returns or its future is
/// dropped. A race abandoned mid-flight falls back to `Idle`.
struct TimerGuard {
    slot: Arc<Mutex<Slot>>,
    generation: u64,
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        if slot.generation != self.generation {
            return;
        }
        slot.release_timers();
        if slot.phase.is_active() {
            tracing::debug!(phase = %slot.phase, "race abandoned, returning to idle");
            slot.phase = RacePhase::Idle;
            slot.cancel = None;
        }
    }
}

/// Per-call state of one `start_race` invocation.
struct Run {
    generation: u64,
    cancelled: watch::Receiver<bool>,
    track_id: TrackId,
    player_id: RacerId,
    started_at: DateTime<Utc>,
}

// ─── RaceOrchestrator ─────────────────────────────────────────────────────

/// Drives one race at a time through create → countdown → start → poll.
///
/// ```text
/// start_race ─► Creating ──create_race──► CountingDown ──countdown──► Starting
///                  │                                                     │
///                  └─► Failed ◄──────────── start_race fails ◄───────────┤
///                        ▲                                               ▼
///                        └──────── poll fails ◄──── Polling ──finished──► Finished
/// ```
///
/// Phase changes go through [`podrace_core::lifecycle::transition`]; this
/// type performs the awaits each phase implies and applies the returned
/// effects to the store, the renderer and the timers.
pub struct RaceOrchestrator<S: RaceService> {
    service: Arc<S>,
    poller: ProgressPoller<S>,
    countdown: Countdown,
    store: SharedStore,
    renderer: Arc<dyn Renderer>,
    timing: TimingConfig,
    slot: Arc<Mutex<Slot>>,
}

impl<S: RaceService> RaceOrchestrator<S> {
    /// Fails with `InvalidConfig` when `timing` has a zero tick or poll period.
    pub fn new(
        service: Arc<S>,
        store: SharedStore,
        renderer: Arc<dyn Renderer>,
        timing: TimingConfig,
    ) -> Result<Self> {
        timing.check()?;
        Ok(Self {
            poller: ProgressPoller::new(Arc::clone(&service)),
            countdown: Countdown::from_config(&timing),
            service,
            store,
            renderer,
            timing,
            slot: Arc::new(Mutex::new(Slot {
                generation: 0,
                phase: RacePhase::Idle,
                cancel: None,
                countdown: None,
                poller: None,
            })),
        })
    }

    pub fn phase(&self) -> RacePhase {
        lock(&self.slot).phase.clone()
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Timers that can still fire. Never more than one.
    pub fn armed_timer_count(&self) -> usize {
        lock(&self.slot).armed_timers()
    }

    pub fn select_track(&self, id: TrackId) {
        self.store.select_track(id);
    }

    pub fn select_racer(&self, id: RacerId) {
        self.store.select_racer(id);
    }

    /// Run a race for the selection currently held in the store.
    pub async fn start_selected_race(&self) -> Result<RaceOutcome> {
        let selection = self.store.selection();
        self.start_race(selection).await
    }

    /// Run one race to completion.
    ///
    /// Fails fast with `InvalidSelection` or `RaceAlreadyInProgress` without
    /// touching the network. Returns `Cancelled` if [`Self::cancel_race`]
    /// interrupts it.
    pub async fn start_race(&self, selection: Selection) -> Result<RaceOutcome> {
        let mut run = self.begin(selection)?;
        let _guard = TimerGuard {
            slot: Arc::clone(&self.slot),
            generation: run.generation,
        };

        let created = until_cancelled(
            &mut run.cancelled,
            self.service.create_race(run.player_id, run.track_id),
        )
        .await?;
        let race_id = match created {
            Ok(created) => created.id,
            Err(e) => {
                tracing::error!(error = %e, "failed to create race");
                self.apply(run.generation, RaceEvent::CreateFailed(e.to_string()))?;
                return Err(RaceError::CreateRace(e));
            }
        };
        self.apply(run.generation, RaceEvent::RaceCreated(race_id))?;
        tracing::info!(race_id, "race created, counting down");

        self.run_countdown(&mut run).await?;
        self.apply(run.generation, RaceEvent::CountdownElapsed)?;

        let started = until_cancelled(&mut run.cancelled, self.service.start_race(race_id)).await?;
        if let Err(e) = started {
            tracing::error!(race_id, error = %e, "failed to start race");
            self.apply(run.generation, RaceEvent::StartFailed(e.to_string()))?;
            return Err(RaceError::StartRace(e));
        }
        self.apply(run.generation, RaceEvent::RaceStarted)?;
        tracing::info!(race_id, "race started");

        match self.run_poller(&mut run, race_id).await? {
            Ok(race) => {
                let mut positions = race.positions;
                view::sort_by_final_position(&mut positions);
                self.apply(run.generation, RaceEvent::RaceFinished(positions.clone()))?;
                tracing::info!(race_id, racers = positions.len(), "race finished");
                Ok(RaceOutcome {
                    race_id,
                    track_id: run.track_id,
                    player_id: run.player_id,
                    positions,
                    started_at: run.started_at,
                    finished_at: Utc::now(),
                })
            }
            Err(e) => {
                tracing::error!(race_id, error = %e, "lost track of race progress");
                self.apply(run.generation, RaceEvent::PollFailed(e.to_string()))?;
                Err(RaceError::PollFetch(e))
            }
        }
    }

    /// Abort the active race. Returns `false` when nothing was running.
    pub fn cancel_race(&self) -> bool {
        let mut slot = lock(&self.slot);
        if !slot.phase.is_active() {
            return false;
        }
        let from = slot.phase.to_string();
        let effects = match transition(&slot.phase, RaceEvent::Cancelled) {
            Ok(Transition { next, effects }) => {
                slot.phase = next;
                effects
            }
            Err(e) => {
                tracing::warn!(error = %e, "cancel rejected");
                return false;
            }
        };
        slot.generation += 1;
        if let Some(cancel) = slot.cancel.take() {
            let _ = cancel.send(true);
        }
        self.run_effects(&mut slot, effects);
        tracing::info!(from = %from, "race cancelled");
        true
    }

    /// Fire-and-forget accelerate for the current race.
    pub fn accelerate(&self) -> Option<JoinHandle<()>> {
        let Some(race_id) = self.store.read(|s| s.race_id) else {
            tracing::debug!("accelerate ignored, no race yet");
            return None;
        };
        let service = Arc::clone(&self.service);
        Some(tokio::spawn(async move {
            if let Err(e) = service.accelerate(race_id).await {
                tracing::warn!(race_id, error = %e, "accelerate failed");
            }
        }))
    }

    // ── phases ──────────────────────────────────────────────────────────

    fn begin(&self, selection: Selection) -> Result<Run> {
        let mut slot = lock(&self.slot);
        let Transition { next, effects } =
            transition(&slot.phase, RaceEvent::StartRequested(selection)).inspect_err(|e| {
                tracing::warn!(phase = %slot.phase, error = %e, "race start rejected");
            })?;
        let &RacePhase::Creating {
            track_id,
            player_id,
        } = &next
        else {
            return Err(RaceError::InvalidTransition {
                from: slot.phase.to_string(),
                event: "start_requested".into(),
            });
        };

        slot.generation += 1;
        slot.release_timers();
        let (cancel_tx, cancelled) = watch::channel(false);
        slot.cancel = Some(cancel_tx);
        slot.phase = next;

        self.store.update(StorePatch::track(track_id));
        self.store.update(StorePatch::player(player_id));
        self.run_effects(&mut slot, effects);
        tracing::info!(track_id, player_id, "starting race");

        Ok(Run {
            generation: slot.generation,
            cancelled,
            track_id,
            player_id,
            started_at: Utc::now(),
        })
    }

    async fn run_countdown(&self, run: &mut Run) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        {
            let mut slot = lock(&self.slot);
            if slot.generation != run.generation {
                return Err(RaceError::Cancelled);
            }
            slot.release_timers();
            let renderer = Arc::clone(&self.renderer);
            slot.countdown = Some(self.countdown.start(
                self.timing.countdown_from,
                move |remaining| renderer.render(&ViewModel::Countdown { remaining }),
                move || {
                    let _ = done_tx.send(());
                },
            ));
        }
        match until_cancelled(&mut run.cancelled, done_rx).await? {
            Ok(()) => Ok(()),
            Err(_) => Err(self.timer_stopped(run, "countdown", RaceEvent::StartFailed)),
        }
    }

    async fn run_poller(&self, run: &mut Run, race_id: RaceId) -> Result<ServiceResult<Race>> {
        let (tx, mut rx) = mpsc::channel(1);
        {
            let mut slot = lock(&self.slot);
            if slot.generation != run.generation {
                return Err(RaceError::Cancelled);
            }
            slot.release_timers();

            let (store, renderer) = (self.store.clone(), Arc::clone(&self.renderer));
            let finished_store = self.store.clone();
            let finished_tx = tx.clone();
            slot.poller = Some(self.poller.start(
                race_id,
                self.timing.poll_interval(),
                move |race| {
                    store.update(StorePatch::race(race.clone()));
                    let board = store.read(|s| view::leaderboard(&race.positions, s));
                    renderer.render(&board);
                },
                move |race| {
                    finished_store.update(StorePatch::race(race.clone()));
                    let _ = finished_tx.try_send(Ok(race));
                },
                move |err| {
                    let _ = tx.try_send(Err(err));
                },
            ));
        }
        match until_cancelled(&mut run.cancelled, rx.recv()).await? {
            Some(result) => Ok(result),
            None => Err(self.timer_stopped(run, "poller", RaceEvent::PollFailed)),
        }
    }

    /// A timer dropped its callbacks without reporting. That is a cancel only
    /// when the race has moved to a newer generation; otherwise it fails.
    fn timer_stopped(
        &self,
        run: &Run,
        timer: &'static str,
        failed: fn(String) -> RaceEvent,
    ) -> RaceError {
        let err = RaceError::TimerStopped(timer);
        if let Err(e) = self.apply(run.generation, failed(err.to_string())) {
            return e;
        }
        tracing::error!(timer, "timer stopped without reporting, race failed");
        err
    }

    // ── transitions ─────────────────────────────────────────────────────

    fn apply(&self, generation: u64, event: RaceEvent) -> Result<()> {
        let mut slot = lock(&self.slot);
        if slot.generation != generation {
            tracing::debug!(event = event.as_str(), "dropping event from a stale race");
            return Err(RaceError::Cancelled);
        }
        let event_name = event.as_str();
        let Transition { next, effects } = transition(&slot.phase, event)?;
        tracing::debug!(from = %slot.phase, to = %next, event = event_name, "race transition");
        slot.phase = next;
        self.run_effects(&mut slot, effects);
        Ok(())
    }

    fn run_effects(&self, slot: &mut Slot, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ClearRace => self.store.update(StorePatch::clear_race()),
                Effect::RenderStarting { track_id } => {
                    let countdown = self.timing.countdown_from;
                    let start = self
                        .store
                        .read(|s| view::race_start(s.track(track_id), countdown));
                    self.renderer.render(&start);
                }
                Effect::StoreRaceId(id) => self.store.update(StorePatch::race_id(id)),
                Effect::ReleaseTimers => slot.release_timers(),
                Effect::RenderResults(positions) => {
                    let results = self.store.read(|s| view::results(&positions, s));
                    self.renderer.render(&results);
                }
                Effect::RenderFailure { kind, reason } => {
                    self.renderer.render(&ViewModel::Failure {
                        kind,
                        message: reason,
                    });
                }
            }
        }
    }
}

/// Await `fut` unless the race is cancelled first.
async fn until_cancelled<F: Future>(
    cancelled: &mut watch::Receiver<bool>,
    fut: F,
) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancelled.wait_for(|c| *c) => Err(RaceError::Cancelled),
        out = fut => Ok(out),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
