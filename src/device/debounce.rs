// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Trailing-edge debouncer for bursty intents.

use std::time::Duration;

use tokio::time::Instant;

/// Holds the latest value of a burst until it has been quiet long enough.
///
/// Every [`push`](Self::push) replaces the pending value and re-arms the
/// deadline. Only the value present when the deadline passes is released.
/// The debouncer owns no timer; the owner sleeps until [`deadline`](Self::deadline)
/// and then calls [`take_due`](Self::take_due).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use deye_bridge::device::CommandDebouncer;
/// use tokio::time::Instant;
///
/// let mut debouncer = CommandDebouncer::new(Duration::from_millis(500));
/// let start = Instant::now();
///
/// debouncer.push(1, start);
/// debouncer.push(3, start + Duration::from_millis(100));
///
/// assert_eq!(debouncer.take_due(start + Duration::from_millis(500)), None);
/// assert_eq!(debouncer.take_due(start + Duration::from_millis(600)), Some(3));
/// ```
#[derive(Debug, Clone)]
pub struct CommandDebouncer<T> {
    pending: Option<T>,
    deadline: Option<Instant>,
    quiet: Duration,
}

impl<T> CommandDebouncer<T> {
    /// Creates an idle debouncer with the given quiet interval.
    #[must_use]
    pub const fn new(quiet: Duration) -> Self {
        Self {
            pending: None,
            deadline: None,
            quiet,
        }
    }

    /// Replaces the pending value and re-arms the deadline from `now`.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.deadline = Some(now + self.quiet);
    }

    /// Returns the instant at which the pending value becomes due.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Releases the pending value if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Drops the pending value without releasing it.
    pub fn cancel(&mut self) -> Option<T> {
        self.deadline = None;
        self.pending.take()
    }

    /// Returns `true` while a value is waiting for its deadline.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the quiet interval.
    #[must_use]
    pub const fn quiet(&self) -> Duration {
        self.quiet
    }
}
