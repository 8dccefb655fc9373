// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Water tank level.

/// Water tank level as reported by the fan status sentinel.
///
/// The appliance only tells whether the tank is full, so this is a
/// two-valued reading rather than a continuous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum WaterLevel {
    /// Tank is not full.
    #[default]
    Empty,
    /// Tank is full and the appliance has stopped.
    Full,
}

impl WaterLevel {
    /// Returns the level in percent (0 or 100).
    #[must_use]
    pub const fn percent(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Full => 100,
        }
    }

    /// Returns `true` if the tank is full.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }
}
