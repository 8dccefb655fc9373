// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state management types.
//!
//! The [`DeviceState`] struct holds the authoritative state of one
//! dehumidifier. Decoded status frames and user intents both reach it as
//! [`StateChange`]s; the presentation layer sees it through [`Attribute`]s
//! and [`AttributeValue`]s.
//!
//! # Examples
//!
//! ```
//! use deye_bridge::state::{Attribute, AttributeValue, DeviceState, StateChange};
//!
//! let mut state = DeviceState::new();
//!
//! let change = StateChange::Locked(true);
//! state.apply(&change);
//!
//! assert_eq!(state.value(Attribute::LockPhysicalControls), AttributeValue::Bool(true));
//! ```

mod attribute;
mod device_state;
mod state_change;

pub use attribute::{Attribute, AttributeValue};
pub use device_state::{DeviceState, snapshot_changes};
pub use state_change::StateChange;
