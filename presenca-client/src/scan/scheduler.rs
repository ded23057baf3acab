//! Decode loop pacing
//!
//! The scan loop makes one decode attempt per tick. Production uses a tokio
//! interval; tests inject a scheduler that runs a fixed number of ticks.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

#[async_trait]
pub trait Scheduler: Send {
    /// Wait for the next tick. Returns false once the scheduler has stopped.
    async fn next_tick(&mut self) -> bool;
}

/// Fixed-period ticks; late ticks are skipped rather than bunched up
#[derive(Debug)]
pub struct IntervalScheduler {
    period: Duration,
    interval: Option<Interval>,
}

impl IntervalScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            interval: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[async_trait]
impl Scheduler for IntervalScheduler {
    async fn next_tick(&mut self) -> bool {
        // Created lazily: an Interval needs a running runtime
        let period = self.period;
        let ticker = self.interval.get_or_insert_with(|| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        ticker.tick().await;
        true
    }
}
