use std::sync::Arc;
use std::time::Duration;

use podrace_core::types::{Race, RaceId, RaceStatus};
use podrace_core::ServiceError;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::service::RaceService;
use crate::timer::{self, TimerHandle};

/// Fixed-interval race status poller.
///
/// Each tick awaits its fetch before the next tick is taken, and ticks
/// missed while a slow fetch was outstanding are skipped, so fetches for one
/// poller never overlap. A `finished` status or a failed fetch ends the
/// poller; neither is retried.
pub struct ProgressPoller<S> {
    service: Arc<S>,
}

impl<S: RaceService> ProgressPoller<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    pub fn start<P, F, E>(
        &self,
        race_id: RaceId,
        interval: Duration,
        mut on_progress: P,
        on_finished: F,
        on_error: E,
    ) -> TimerHandle
    where
        P: FnMut(&Race) + Send + 'static,
        F: FnOnce(Race) + Send + 'static,
        E: FnOnce(ServiceError) + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let interval = timer::period(interval);
        tracing::debug!(race_id, interval_ms = interval.as_millis() as u64, "poller armed");

        timer::spawn("poller", move |gate| async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match service.race_status(race_id).await {
                    Ok(race) => match race.status {
                        RaceStatus::InProgress => {
                            if !gate.fire(|| on_progress(&race)) {
                                return;
                            }
                        }
                        RaceStatus::Finished => {
                            tracing::debug!(race_id, "race finished");
                            gate.complete(|| on_finished(race));
                            return;
                        }
                        RaceStatus::Pending => {
                            tracing::debug!(race_id, "race not started yet, polling again");
                        }
                    },
                    Err(e) => {
                        tracing::warn!(race_id, error = %e, "race status fetch failed");
                        gate.complete(|| on_error(e));
                        return;
                    }
                }
            }
        })
    }
}

impl<S> Clone for ProgressPoller<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pos, Poll, StubService};
    use std::sync::Mutex;

    const INTERVAL: Duration = Duration::from_millis(500);

    #[derive(Default)]
    struct Record {
        progress: Mutex<Vec<u32>>,
        finished: Mutex<Vec<Race>>,
        errors: Mutex<Vec<String>>,
    }

    impl Record {
        fn progress(&self) -> usize {
            self.progress.lock().unwrap().len()
        }
        fn finished(&self) -> usize {
            self.finished.lock().unwrap().len()
        }
        fn errors(&self) -> usize {
            self.errors.lock().unwrap().len()
        }
    }

    fn arm(service: &Arc<StubService>, record: &Arc<Record>) -> TimerHandle {
        let (p, f, e) = (Arc::clone(record), Arc::clone(record), Arc::clone(record));
        ProgressPoller::new(Arc::clone(service)).start(
            42,
            INTERVAL,
            move |race| {
                let lead = race.positions.iter().map(|p| p.segment).max().unwrap_or(0);
                p.progress.lock().unwrap().push(lead);
            },
            move |race| f.finished.lock().unwrap().push(race),
            move |err| e.errors.lock().unwrap().push(err.to_string()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn progress_k_times_then_finished_once() {
        let service = Arc::new(StubService::new(42).with_polls([
            Poll::Progress(vec![pos(7, 10, None)]),
            Poll::Progress(vec![pos(7, 25, None)]),
            Poll::Finished(vec![pos(7, 201, Some(1))]),
        ]));
        let record = Arc::new(Record::default());
        let handle = arm(&service, &record);

        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(*record.progress.lock().unwrap(), vec![10, 25]);
        assert_eq!(record.finished(), 1);
        assert_eq!(record.errors(), 0);
        assert_eq!(service.status_calls(), 3);
        assert_eq!(record.finished.lock().unwrap()[0].positions[0].final_position, Some(1));
        assert!(handle.is_completed());
        assert!(!handle.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_error_is_fatal_and_reported_once() {
        let service = Arc::new(StubService::new(42).with_polls([
            Poll::Progress(vec![pos(7, 10, None)]),
            Poll::Fail,
        ]));
        let record = Arc::new(Record::default());
        let handle = arm(&service, &record);

        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(record.progress(), 1);
        assert_eq!(record.errors(), 1);
        assert_eq!(record.finished(), 0);
        assert_eq!(service.status_calls(), 2);
        assert!(!handle.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_silences_all_callbacks() {
        let service = Arc::new(StubService::new(42));
        let record = Arc::new(Record::default());
        let handle = arm(&service, &record);

        tokio::time::sleep(INTERVAL * 2 + INTERVAL / 2).await;
        let seen = record.progress();
        assert_eq!(seen, 2);
        assert!(handle.cancel());

        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(record.progress(), seen);
        assert_eq!(record.finished(), 0);
        assert_eq!(record.errors(), 0);
        assert_eq!(service.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_never_overlap() {
        let service = Arc::new(StubService::new(42).with_poll_delay(INTERVAL * 3));
        let record = Arc::new(Record::default());
        let handle = arm(&service, &record);

        tokio::time::sleep(INTERVAL * 20).await;
        handle.cancel();
        assert!(record.progress() >= 3);
        assert_eq!(service.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_status_keeps_polling_silently() {
        let service = Arc::new(StubService::new(42).with_polls([
            Poll::Pending,
            Poll::Pending,
            Poll::Finished(vec![pos(7, 201, Some(1))]),
        ]));
        let record = Arc::new(Record::default());
        let _handle = arm(&service, &record);

        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(record.progress(), 0);
        assert_eq!(record.finished(), 1);
        assert_eq!(service.status_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_polls_instead_of_panicking() {
        let service = Arc::new(
            StubService::new(42).with_polls([Poll::Finished(vec![pos(7, 201, Some(1))])]),
        );
        let finished = Arc::new(Mutex::new(0));
        let seen = Arc::clone(&finished);
        let handle = ProgressPoller::new(Arc::clone(&service)).start(
            42,
            Duration::ZERO,
            |_| {},
            move |_| *seen.lock().unwrap() += 1,
            |_| {},
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*finished.lock().unwrap(), 1);
        assert!(handle.is_completed());
    }
}
