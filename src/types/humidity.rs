// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Humidity set-point type.

use std::fmt;

/// Target relative humidity accepted by the appliance (25-80 %).
///
/// Presentation layers may offer a wider 0-100 range; every value written
/// by a user passes through [`HumidityTarget::clamped`] before it reaches the
/// device. Values reported by the device itself are not clamped.
///
/// # Examples
///
/// ```
/// use deye_bridge::types::HumidityTarget;
///
/// assert_eq!(HumidityTarget::clamped(10).value(), 25);
/// assert_eq!(HumidityTarget::clamped(55).value(), 55);
/// assert_eq!(HumidityTarget::clamped(95).value(), 80);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct HumidityTarget(u8);

impl HumidityTarget {
    /// Lowest set-point the appliance accepts.
    pub const MIN: u8 = 25;

    /// Highest set-point the appliance accepts.
    pub const MAX: u8 = 80;

    /// Creates a set-point, clamping to [25, 80].
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value < Self::MIN {
            Self(Self::MIN)
        } else if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    /// Returns the set-point in percent.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl Default for HumidityTarget {
    fn default() -> Self {
        Self(60)
    }
}

impl fmt::Display for HumidityTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl From<u8> for HumidityTarget {
    fn from(value: u8) -> Self {
        Self::clamped(value)
    }
}
