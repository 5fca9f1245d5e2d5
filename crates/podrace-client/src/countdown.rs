use std::time::Duration;

use podrace_core::config::TimingConfig;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::timer::{self, TimerHandle};

/// Pre-race countdown.
///
/// Waits one initial beat, then decrements once per tick and reports the
/// remaining count. When the count reaches `floor` the completion callback
/// fires once and the timer disarms itself.
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    initial_delay: Duration,
    tick: Duration,
    floor: u32,
}

impl Countdown {
    pub fn new(initial_delay: Duration, tick: Duration, floor: u32) -> Self {
        Self {
            initial_delay,
            tick,
            floor,
        }
    }

    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(timing.initial_delay(), timing.tick(), timing.countdown_floor)
    }

    /// Arm the countdown. A count at or below the floor completes right after
    /// the initial beat without ticking.
    pub fn start<T, C>(&self, initial_count: u32, mut on_tick: T, on_complete: C) -> TimerHandle
    where
        T: FnMut(u32) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let Self {
            initial_delay,
            tick,
            floor,
        } = *self;
        let tick = timer::period(tick);
        tracing::debug!(initial_count, floor, "countdown armed");

        timer::spawn("countdown", move |gate| async move {
            tokio::time::sleep(initial_delay).await;

            let mut ticker = interval_at(Instant::now() + tick, tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut remaining = initial_count;
            while remaining > floor {
                ticker.tick().await;
                remaining -= 1;
                if !gate.fire(|| on_tick(remaining)) {
                    return;
                }
            }
            gate.complete(on_complete);
        })
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::from_config(&TimingConfig::default())
    }
}
