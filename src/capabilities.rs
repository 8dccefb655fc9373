// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Optional dehumidifier features.
//!
//! Every appliance exposes power, humidity, water level, lock and operating
//! state. The fan speed control, the two mode switches and the temperature
//! sensor depend on the model and are enabled per device in configuration.
//! The status frame is always decoded in full; capabilities only decide which
//! attributes the device handle exposes.

use crate::state::Attribute;

/// Optional features of a dehumidifier.
///
/// # Examples
///
/// ```
/// use deye_bridge::Capabilities;
/// use deye_bridge::state::Attribute;
///
/// // Base appliance: no optional features
/// let basic = Capabilities::default();
/// assert!(!basic.supports(Attribute::RotationSpeed));
/// assert!(basic.supports(Attribute::WaterLevel));
///
/// // Fully featured model
/// let full = Capabilities::full();
/// assert!(full.supports(Attribute::CurrentTemperature));
/// assert_eq!(full.attributes().len(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
// Each boolean represents an independent device feature flag that cannot be
// meaningfully combined into an enum or state machine.
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Supports fan speed control (RotationSpeed).
    pub fan_control: bool,

    /// Has a Dry Clothes Mode switch.
    pub dry_clothes: bool,

    /// Has a Sleep Mode switch.
    pub sleep_mode: bool,

    /// Reports ambient temperature.
    pub temperature_sensor: bool,
}

impl Capabilities {
    /// Creates capabilities with every optional feature enabled.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            fan_control: true,
            dry_clothes: true,
            sleep_mode: true,
            temperature_sensor: true,
        }
    }

    /// Returns whether the device exposes the given attribute.
    #[must_use]
    pub const fn supports(&self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::RotationSpeed => self.fan_control,
            Attribute::DryClothesMode => self.dry_clothes,
            Attribute::SleepMode => self.sleep_mode,
            Attribute::CurrentTemperature => self.temperature_sensor,
            Attribute::Active
            | Attribute::CurrentRelativeHumidity
            | Attribute::TargetHumidity
            | Attribute::CurrentOperatingState
            | Attribute::WaterLevel
            | Attribute::LockPhysicalControls => true,
        }
    }

    /// Returns the attributes the device exposes, in declaration order.
    #[must_use]
    pub fn attributes(&self) -> Vec<Attribute> {
        Attribute::ALL
            .into_iter()
            .filter(|attribute| self.supports(*attribute))
            .collect()
    }
}
