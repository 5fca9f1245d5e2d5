use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;

/// Shortest period a repeating timer runs with.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// `interval_at` panics on a zero period.
pub(crate) fn period(requested: Duration) -> Duration {
    if requested < MIN_PERIOD {
        tracing::warn!(requested_ms = requested.as_millis() as u64, "timer period raised to 1ms");
    }
    requested.max(MIN_PERIOD)
}

// ─── TimerHandle ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Armed,
    Cancelled,
    Completed,
}

#[derive(Debug)]
struct Shared {
    label: &'static str,
    state: Mutex<TimerState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Disposable handle to a scheduled task (countdown or poller).
///
/// The task runs on a spawned Tokio task and invokes its callbacks through a
/// [`Gate`]. `cancel` takes the same lock the gate holds while a callback
/// runs, so once `cancel` returns no callback is running and none will start.
/// Callbacks must therefore never cancel their own handle.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    shared: Arc<Shared>,
    abort: AbortHandle,
}

impl TimerHandle {
    /// Stop the timer. Returns `false` if it had already completed or been
    /// cancelled; calling it again is a no-op.
    pub fn cancel(&self) -> bool {
        let mut state = self.shared.lock();
        if *state != TimerState::Armed {
            return false;
        }
        *state = TimerState::Cancelled;
        self.abort.abort();
        tracing::debug!(timer = self.shared.label, "timer cancelled");
        true
    }

    /// Still able to fire callbacks.
    pub fn is_armed(&self) -> bool {
        *self.shared.lock() == TimerState::Armed && !self.abort.is_finished()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.shared.lock() == TimerState::Cancelled
    }

    pub fn is_completed(&self) -> bool {
        *self.shared.lock() == TimerState::Completed
    }

    pub fn label(&self) -> &'static str {
        self.shared.label
    }
}

// ─── Gate ─────────────────────────────────────────────────────────────────

/// Callback dispatcher owned by the timer task.
pub(crate) struct Gate {
    shared: Arc<Shared>,
}

impl Gate {
    /// Run a non-terminal callback. Returns `false` (without running it) once
    /// the timer is no longer armed.
    pub(crate) fn fire(&self, f: impl FnOnce()) -> bool {
        let state = self.shared.lock();
        if *state != TimerState::Armed {
            return false;
        }
        f();
        true
    }

    /// Run the terminal callback exactly once and disarm the timer.
    pub(crate) fn complete(&self, f: impl FnOnce()) -> bool {
        let mut state = self.shared.lock();
        if *state != TimerState::Armed {
            return false;
        }
        *state = TimerState::Completed;
        f();
        tracing::debug!(timer = self.shared.label, "timer completed");
        true
    }
}

/// Spawn `body` as a timer task and return its handle.
pub(crate) fn spawn<F, Fut>(label: &'static str, body: F) -> TimerHandle
where
    F: FnOnce(Gate) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let shared = Arc::new(Shared {
        label,
        state: Mutex::new(TimerState::Armed),
    });
    let gate = Gate {
        shared: Arc::clone(&shared),
    };
    let task = tokio::spawn(body(gate));
    TimerHandle {
        shared,
        abort: task.abort_handle(),
    }
}
