#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Economy clock responsible for emitting periodic income commands.
//!
//! The clock owns at most one repeating timer. Starting installs a fresh timer
//! and cancels any previous one, so restarting never produces two concurrent
//! accrual streams. The clock does not know how much money a payment is worth:
//! the world reads the current money level when it applies
//! [`Command::AccrueIncome`].

use std::time::Duration;

use code_defence_core::{Command, Event};
use tracing::debug;

/// Configuration parameters required to construct the economy clock.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    income_interval: Duration,
}

impl Config {
    /// Creates a new configuration using the provided payment cadence.
    #[must_use]
    pub const fn new(income_interval: Duration) -> Self {
        Self { income_interval }
    }
}

/// Generation number identifying an installed repeating timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct RepeatingTimer {
    handle: TimerHandle,
    accumulator: Duration,
}

/// Pure system that converts elapsed time into income commands.
#[derive(Debug)]
pub struct EconomyClock {
    income_interval: Duration,
    timer: Option<RepeatingTimer>,
    next_handle: u64,
}

impl EconomyClock {
    /// Creates a stopped economy clock using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            income_interval: config.income_interval,
            timer: None,
            next_handle: 0,
        }
    }

    /// Installs a repeating timer, cancelling the previous one first.
    pub fn start(&mut self) {
        if let Some(previous) = self.timer.take() {
            debug!(handle = previous.handle.get(), "cancelled income timer");
        }

        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.timer = Some(RepeatingTimer {
            handle,
            accumulator: Duration::ZERO,
        });
        debug!(handle = handle.get(), interval = ?self.income_interval, "installed income timer");
    }

    /// Releases the running timer, if any.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            debug!(handle = timer.handle.get(), "released income timer");
        }
    }

    /// Reports whether a timer is currently installed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Handle of the installed timer, if any.
    #[must_use]
    pub fn active_timer(&self) -> Option<TimerHandle> {
        self.timer.as_ref().map(|timer| timer.handle)
    }

    /// Consumes world events and emits one income command per elapsed interval.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let interval = self.income_interval;
        let Some(timer) = self.timer.as_mut() else {
            return;
        };

        if interval.is_zero() {
            return;
        }

        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                timer.accumulator = timer.accumulator.saturating_add(*dt);
            }
        }

        while timer.accumulator >= interval {
            timer.accumulator -= interval;
            out.push(Command::AccrueIncome);
        }
    }
}
