// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Countdown measuring the time since the last confirmed status frame.

use serde::{Deserialize, Serialize};

/// Whether a device has reported within its liveness window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    /// The countdown is above zero.
    #[default]
    Fresh,
    /// The countdown reached zero with no status frame in between.
    Stale,
}

impl Liveness {
    /// Returns `true` for [`Liveness::Stale`].
    #[must_use]
    pub const fn is_stale(self) -> bool {
        matches!(self, Self::Stale)
    }
}

/// Passive gauge decremented once per tick and refilled by status frames.
///
/// The counter never goes below zero. It only becomes stale by ticking down
/// and only becomes fresh again through [`reset`](Self::reset).
///
/// # Examples
///
/// ```
/// use deye_bridge::device::LivenessTracker;
///
/// let mut tracker = LivenessTracker::new(2);
/// assert!(!tracker.tick());
/// assert!(tracker.tick()); // reached zero
/// assert!(tracker.is_stale());
///
/// assert!(tracker.reset()); // was stale
/// assert_eq!(tracker.remaining(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessTracker {
    remaining: u32,
    window: u32,
}

impl LivenessTracker {
    /// Creates a full tracker with a window of `window` ticks.
    #[must_use]
    pub const fn new(window: u32) -> Self {
        Self {
            remaining: window,
            window,
        }
    }

    /// Decrements the counter by one tick.
    ///
    /// Returns `true` only on the tick that brings the counter to zero.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    /// Refills the window.
    ///
    /// Returns `true` if the tracker was stale before the reset.
    pub fn reset(&mut self) -> bool {
        let was_stale = self.is_stale();
        self.remaining = self.window;
        was_stale
    }

    /// Returns `true` once the counter has reached zero.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.remaining == 0
    }

    /// Returns the current liveness state.
    #[must_use]
    pub const fn liveness(&self) -> Liveness {
        if self.is_stale() {
            Liveness::Stale
        } else {
            Liveness::Fresh
        }
    }

    /// Returns the number of ticks left before the device goes stale.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns the full window length in ticks.
    #[must_use]
    pub const fn window(&self) -> u32 {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goes_stale_after_window() {
        let mut tracker = LivenessTracker::new(120);
        for _ in 0..119 {
            assert!(!tracker.tick());
        }
        assert_eq!(tracker.liveness(), Liveness::Fresh);
        assert!(tracker.tick());
        assert_eq!(tracker.liveness(), Liveness::Stale);
    }

    #[test]
    fn never_goes_negative() {
        let mut tracker = LivenessTracker::new(1);
        assert!(tracker.tick());
        assert!(!tracker.tick());
        assert!(!tracker.tick());
        assert_eq!(tracker.remaining(), 0);
    }

    #[test]
    fn reset_refills_window() {
        let mut tracker = LivenessTracker::new(5);
        tracker.tick();
        tracker.tick();
        assert!(!tracker.reset());
        assert_eq!(tracker.remaining(), 5);
    }

    #[test]
    fn reset_reports_recovery() {
        let mut tracker = LivenessTracker::new(1);
        tracker.tick();
        assert!(tracker.is_stale());
        assert!(tracker.reset());
        assert!(!tracker.is_stale());
    }

    #[test]
    fn zero_window_starts_stale() {
        let tracker = LivenessTracker::new(0);
        assert!(tracker.is_stale());
        assert!(Liveness::Stale.is_stale());
        assert!(!Liveness::default().is_stale());
    }
}
