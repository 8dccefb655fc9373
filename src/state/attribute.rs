// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Presentation-facing attributes and their values.

use std::fmt;

use crate::types::OperatingState;

/// A named attribute the presentation layer reads or writes one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Attribute {
    /// Appliance on/off.
    Active,
    /// Last reported ambient humidity (read-only).
    CurrentRelativeHumidity,
    /// Fan level 1-3 (debounced write).
    RotationSpeed,
    /// Humidity set-point (write clamped to 25-80).
    TargetHumidity,
    /// Idle, inactive or dehumidifying (read-only).
    CurrentOperatingState,
    /// Water tank level, 0 or 100 (read-only).
    WaterLevel,
    /// Physical control lock.
    LockPhysicalControls,
    /// Dry clothes mode switch.
    DryClothesMode,
    /// Sleep mode switch.
    SleepMode,
    /// Last reported temperature (read-only).
    CurrentTemperature,
}

impl Attribute {
    /// Every attribute, in presentation order.
    pub const ALL: [Self; 10] = [
        Self::Active,
        Self::CurrentRelativeHumidity,
        Self::RotationSpeed,
        Self::TargetHumidity,
        Self::CurrentOperatingState,
        Self::WaterLevel,
        Self::LockPhysicalControls,
        Self::DryClothesMode,
        Self::SleepMode,
        Self::CurrentTemperature,
    ];

    /// Returns `true` if the presentation layer may write this attribute.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        matches!(
            self,
            Self::Active
                | Self::RotationSpeed
                | Self::TargetHumidity
                | Self::LockPhysicalControls
                | Self::DryClothesMode
                | Self::SleepMode
        )
    }

    /// Returns `true` if reads fail while the device is not responding.
    ///
    /// Settings (fan speed and humidity target) keep their last known value
    /// and stay readable while the device is stale.
    #[must_use]
    pub const fn is_telemetry(&self) -> bool {
        !matches!(self, Self::RotationSpeed | Self::TargetHumidity)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Value of an [`Attribute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AttributeValue {
    /// On/off value.
    Bool(bool),
    /// Percentage (humidity, water level).
    Percent(u8),
    /// Fan level.
    Speed(u8),
    /// Temperature in degrees.
    Temperature(i16),
    /// Operating state.
    OperatingState(OperatingState),
}

impl AttributeValue {
    /// Returns the boolean value, if this is a `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the percentage, if this is a `Percent`.
    #[must_use]
    pub const fn as_percent(&self) -> Option<u8> {
        match self {
            Self::Percent(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the fan level, if this is a `Speed`.
    #[must_use]
    pub const fn as_speed(&self) -> Option<u8> {
        match self {
            Self::Speed(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the temperature, if this is a `Temperature`.
    #[must_use]
    pub const fn as_temperature(&self) -> Option<i16> {
        match self {
            Self::Temperature(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the operating state, if this is an `OperatingState`.
    #[must_use]
    pub const fn as_operating_state(&self) -> Option<OperatingState> {
        match self {
            Self::OperatingState(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<OperatingState> for AttributeValue {
    fn from(value: OperatingState) -> Self {
        Self::OperatingState(value)
    }
}
