// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan speed type.

use std::fmt;

use crate::error::ValueError;

/// Requested fan level (1-3).
///
/// The appliance reports its fan level as a raw hex digit, which may fall
/// outside this range; [`FanSpeed::from_level`] returns `None` for those.
///
/// # Examples
///
/// ```
/// use deye_bridge::types::FanSpeed;
///
/// let speed = FanSpeed::new(2).unwrap();
/// assert_eq!(speed.nibble(), 0b0010_0000);
///
/// assert!(FanSpeed::new(4).is_err());
/// assert_eq!(FanSpeed::from_level(0), None);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FanSpeed(u8);

impl FanSpeed {
    /// Minimum fan level.
    pub const MIN: u8 = 1;

    /// Maximum fan level.
    pub const MAX: u8 = 3;

    /// Lowest fan level.
    pub const LOW: Self = Self(1);

    /// Middle fan level.
    pub const MEDIUM: Self = Self(2);

    /// Highest fan level.
    pub const HIGH: Self = Self(3);

    /// Creates a new fan speed.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value is outside [1, 3].
    pub fn new(value: u8) -> Result<Self, ValueError> {
        Self::from_level(value).ok_or(ValueError::OutOfRange {
            min: u16::from(Self::MIN),
            max: u16::from(Self::MAX),
            actual: u16::from(value),
        })
    }

    /// Interprets a raw fan level, returning `None` outside [1, 3].
    #[must_use]
    pub const fn from_level(value: u8) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the fan level.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns the fan bits of the control frame's mode byte.
    #[must_use]
    pub const fn nibble(&self) -> u8 {
        self.0 << 4
    }
}

impl Default for FanSpeed {
    fn default() -> Self {
        Self::LOW
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for FanSpeed {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
