// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Current operating state of the dehumidifier.

use std::fmt;

/// What the appliance is doing right now.
///
/// This is derived from status codes and is never set by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OperatingState {
    /// Not running (for example, the water tank is full).
    Inactive,
    /// Powered but not removing moisture.
    Idle,
    /// Actively removing moisture.
    Dehumidifying,
}

impl OperatingState {
    /// Returns the accessory-protocol code for this state.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Inactive => 0,
            Self::Idle => 1,
            Self::Dehumidifying => 3,
        }
    }

    /// Returns the state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "INACTIVE",
            Self::Idle => "IDLE",
            Self::Dehumidifying => "DEHUMIDIFYING",
        }
    }
}

impl fmt::Display for OperatingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
