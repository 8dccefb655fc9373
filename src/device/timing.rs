// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timer policy of a device worker.

use std::time::Duration;

/// Shortest period accepted for the tick and the poll interval.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Intervals driving a device worker.
///
/// `Default` gives the production values. Tests shrink them and run on the
/// paused tokio clock.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use deye_bridge::device::Timing;
///
/// let timing = Timing::default()
///     .with_liveness_window(10)
///     .with_poll_interval(Duration::from_secs(5));
///
/// assert_eq!(timing.tick(), Duration::from_secs(1));
/// assert_eq!(timing.liveness_window(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    tick: Duration,
    liveness_window: u32,
    poll_interval: Duration,
    debounce_quiet: Duration,
    outbox_capacity: usize,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            liveness_window: 120,
            poll_interval: Duration::from_secs(60),
            debounce_quiet: Duration::from_millis(500),
            outbox_capacity: 32,
        }
    }
}

impl Timing {
    /// Sets the liveness tick period, at least [`MIN_PERIOD`].
    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(MIN_PERIOD);
        self
    }

    /// Sets the number of ticks without a status frame before going stale.
    #[must_use]
    pub fn with_liveness_window(mut self, ticks: u32) -> Self {
        self.liveness_window = ticks;
        self
    }

    /// Sets the period of the unconditional status poll, at least [`MIN_PERIOD`].
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_PERIOD);
        self
    }

    /// Sets the quiet interval of the fan-speed debouncer.
    #[must_use]
    pub fn with_debounce_quiet(mut self, quiet: Duration) -> Self {
        self.debounce_quiet = quiet;
        self
    }

    /// Sets how many outbound frames may queue before new ones are dropped.
    #[must_use]
    pub fn with_outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn tick(&self) -> Duration {
        self.tick
    }

    #[must_use]
    pub fn liveness_window(&self) -> u32 {
        self.liveness_window
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    #[must_use]
    pub fn debounce_quiet(&self) -> Duration {
        self.debounce_quiet
    }

    #[must_use]
    pub fn outbox_capacity(&self) -> usize {
        self.outbox_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_defaults() {
        let timing = Timing::default();
        assert_eq!(timing.tick(), Duration::from_secs(1));
        assert_eq!(timing.liveness_window(), 120);
        assert_eq!(timing.poll_interval(), Duration::from_secs(60));
        assert_eq!(timing.debounce_quiet(), Duration::from_millis(500));
        assert_eq!(timing.outbox_capacity(), 32);
    }

    #[test]
    fn zero_periods_are_raised_to_minimum() {
        let timing = Timing::default()
            .with_tick(Duration::ZERO)
            .with_poll_interval(Duration::ZERO);
        assert_eq!(timing.tick(), MIN_PERIOD);
        assert_eq!(timing.poll_interval(), MIN_PERIOD);
    }

    #[test]
    fn outbox_capacity_is_at_least_one() {
        assert_eq!(Timing::default().with_outbox_capacity(0).outbox_capacity(), 1);
    }
}
