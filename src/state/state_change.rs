// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! State changes are the building blocks for updating a
//! [`DeviceState`](super::DeviceState). They come from two directions:
//! decoded status frames ([`DeviceState::apply_snapshot`](super::DeviceState::apply_snapshot))
//! and user intents ([`StateChange::from_intent`]). Subscribers receive one
//! change per attribute whose value actually moved.
//!
//! # Examples
//!
//! ```
//! use deye_bridge::state::{Attribute, AttributeValue, DeviceState, StateChange};
//!
//! let mut state = DeviceState::new();
//!
//! // Enabling sleep mode also turns dry clothes mode off
//! let changes = StateChange::from_intent(Attribute::SleepMode, AttributeValue::Bool(true)).unwrap();
//! assert_eq!(changes, vec![StateChange::SleepMode(true), StateChange::DryClothesMode(false)]);
//!
//! // Apply returns true only if the state actually changed
//! assert!(state.apply(&changes[0]));
//! assert!(!state.apply(&changes[1]));
//! ```

use crate::error::{DeviceError, Error};
use crate::types::{FanSpeed, HumidityTarget, OperatingState, WaterLevel};

use super::{Attribute, AttributeValue};

/// Represents a change of one field of the device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StateChange {
    /// Appliance switched on or off.
    Active(bool),
    /// Fan level changed (raw level as reported or requested).
    FanSpeed(u8),
    /// Dry clothes mode changed.
    DryClothesMode(bool),
    /// Sleep mode changed.
    SleepMode(bool),
    /// Humidity set-point changed.
    TargetHumidity(u8),
    /// Reported ambient humidity changed.
    CurrentHumidity(u8),
    /// Reported temperature changed.
    CurrentTemperature(i16),
    /// Water tank level changed.
    WaterLevel(WaterLevel),
    /// Physical control lock changed.
    Locked(bool),
    /// Operating state changed.
    OperatingState(OperatingState),
}

impl StateChange {
    /// Translates a presentation-layer write into the changes it implies.
    ///
    /// Humidity targets are clamped to [25, 80]. Enabling one of the two
    /// exclusive modes disables the other; disabling a mode leaves the other
    /// untouched.
    ///
    /// # Errors
    ///
    /// - `DeviceError::ReadOnly` for attributes derived from status frames
    /// - `DeviceError::TypeMismatch` if the value kind does not fit the attribute
    /// - `ValueError::OutOfRange` for a fan speed outside [1, 3]
    pub fn from_intent(attribute: Attribute, value: AttributeValue) -> Result<Vec<Self>, Error> {
        let mismatch = || Error::from(DeviceError::TypeMismatch { attribute });

        let changes = match attribute {
            Attribute::Active => vec![Self::Active(value.as_bool().ok_or_else(mismatch)?)],
            Attribute::LockPhysicalControls => {
                vec![Self::Locked(value.as_bool().ok_or_else(mismatch)?)]
            }
            Attribute::RotationSpeed => {
                let level = value.as_speed().ok_or_else(mismatch)?;
                vec![Self::FanSpeed(FanSpeed::new(level)?.value())]
            }
            Attribute::TargetHumidity => {
                let percent = value.as_percent().ok_or_else(mismatch)?;
                vec![Self::TargetHumidity(HumidityTarget::clamped(percent).value())]
            }
            Attribute::DryClothesMode => {
                if value.as_bool().ok_or_else(mismatch)? {
                    vec![Self::DryClothesMode(true), Self::SleepMode(false)]
                } else {
                    vec![Self::DryClothesMode(false)]
                }
            }
            Attribute::SleepMode => {
                if value.as_bool().ok_or_else(mismatch)? {
                    vec![Self::SleepMode(true), Self::DryClothesMode(false)]
                } else {
                    vec![Self::SleepMode(false)]
                }
            }
            Attribute::CurrentRelativeHumidity
            | Attribute::CurrentOperatingState
            | Attribute::WaterLevel
            | Attribute::CurrentTemperature => return Err(DeviceError::ReadOnly(attribute).into()),
        };

        Ok(changes)
    }

    /// Returns the attribute this change affects.
    #[must_use]
    pub const fn attribute(&self) -> Attribute {
        match self {
            Self::Active(_) => Attribute::Active,
            Self::FanSpeed(_) => Attribute::RotationSpeed,
            Self::DryClothesMode(_) => Attribute::DryClothesMode,
            Self::SleepMode(_) => Attribute::SleepMode,
            Self::TargetHumidity(_) => Attribute::TargetHumidity,
            Self::CurrentHumidity(_) => Attribute::CurrentRelativeHumidity,
            Self::CurrentTemperature(_) => Attribute::CurrentTemperature,
            Self::WaterLevel(_) => Attribute::WaterLevel,
            Self::Locked(_) => Attribute::LockPhysicalControls,
            Self::OperatingState(_) => Attribute::CurrentOperatingState,
        }
    }

    /// Returns the new value as the presentation layer sees it.
    #[must_use]
    pub const fn value(&self) -> AttributeValue {
        match self {
            Self::Active(v) | Self::DryClothesMode(v) | Self::SleepMode(v) | Self::Locked(v) => {
                AttributeValue::Bool(*v)
            }
            Self::FanSpeed(v) => AttributeValue::Speed(*v),
            Self::TargetHumidity(v) | Self::CurrentHumidity(v) => AttributeValue::Percent(*v),
            Self::CurrentTemperature(v) => AttributeValue::Temperature(*v),
            Self::WaterLevel(level) => AttributeValue::Percent(level.percent()),
            Self::OperatingState(s) => AttributeValue::OperatingState(*s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;

    #[test]
    fn target_humidity_intent_is_clamped() {
        for (input, stored) in [(0, 25), (24, 25), (25, 25), (55, 55), (80, 80), (81, 80), (100, 80)] {
            let changes =
                StateChange::from_intent(Attribute::TargetHumidity, AttributeValue::Percent(input))
                    .unwrap();
            assert_eq!(changes, vec![StateChange::TargetHumidity(stored)]);
        }
    }

    #[test]
    fn fan_speed_intent_is_validated() {
        let ok = StateChange::from_intent(Attribute::RotationSpeed, AttributeValue::Speed(3));
        assert_eq!(ok.unwrap(), vec![StateChange::FanSpeed(3)]);

        let err = StateChange::from_intent(Attribute::RotationSpeed, AttributeValue::Speed(0));
        assert!(matches!(
            err,
            Err(Error::Value(ValueError::OutOfRange { actual: 0, .. }))
        ));
    }

    #[test]
    fn enabling_dry_clothes_disables_sleep() {
        let changes =
            StateChange::from_intent(Attribute::DryClothesMode, AttributeValue::Bool(true)).unwrap();
        assert_eq!(
            changes,
            vec![
                StateChange::DryClothesMode(true),
                StateChange::SleepMode(false)
            ]
        );

        let changes =
            StateChange::from_intent(Attribute::DryClothesMode, AttributeValue::Bool(false))
                .unwrap();
        assert_eq!(changes, vec![StateChange::DryClothesMode(false)]);
    }

    #[test]
    fn read_only_attributes_reject_writes() {
        for attribute in [
            Attribute::CurrentRelativeHumidity,
            Attribute::CurrentOperatingState,
            Attribute::WaterLevel,
            Attribute::CurrentTemperature,
        ] {
            let err = StateChange::from_intent(attribute, AttributeValue::Percent(1)).unwrap_err();
            assert!(matches!(err, Error::Device(DeviceError::ReadOnly(a)) if a == attribute));
        }
    }

    #[test]
    fn wrong_value_kind_is_rejected() {
        let err =
            StateChange::from_intent(Attribute::Active, AttributeValue::Percent(1)).unwrap_err();
        assert!(matches!(
            err,
            Error::Device(DeviceError::TypeMismatch {
                attribute: Attribute::Active
            })
        ));
    }

    #[test]
    fn change_maps_to_attribute_and_value() {
        let change = StateChange::WaterLevel(WaterLevel::Full);
        assert_eq!(change.attribute(), Attribute::WaterLevel);
        assert_eq!(change.value(), AttributeValue::Percent(100));

        let change = StateChange::Locked(true);
        assert_eq!(change.attribute(), Attribute::LockPhysicalControls);
        assert_eq!(change.value(), AttributeValue::Bool(true));
    }
}
