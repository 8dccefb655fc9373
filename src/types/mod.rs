// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Type-safe wrappers for dehumidifier values.
//!
//! These types enforce the ranges the appliance accepts and carry the
//! wire-level mappings (fan nibble, operating state codes) next to the
//! values they describe.

mod device_id;
mod fan_speed;
mod humidity;
mod operating_state;
mod water_level;

pub use device_id::DeviceId;
pub use fan_speed::FanSpeed;
pub use humidity::HumidityTarget;
pub use operating_state::OperatingState;
pub use water_level::WaterLevel;
