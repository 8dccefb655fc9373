// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.

use crate::telemetry::StatusSnapshot;
use crate::types::{FanSpeed, HumidityTarget, OperatingState, WaterLevel};

use super::{Attribute, AttributeValue, StateChange};

/// Power status codes meaning the appliance is on.
const ACTIVE_POWER_CODES: [char; 3] = ['3', 'B', '7'];

/// Power status codes carrying the physical lock flag.
const LOCKED_POWER_CODES: [char; 2] = ['6', '7'];

/// Dehumidifier status code meaning the compressor is running.
const DEHUMIDIFYING_CODE: char = '8';

/// Fan status code to (water level, operating state).
///
/// Codes not listed leave both fields at their last known value.
const FAN_STATUS_TABLE: [(char, WaterLevel, Option<OperatingState>); 3] = [
    ('8', WaterLevel::Empty, None),
    ('0', WaterLevel::Empty, Some(OperatingState::Idle)),
    ('4', WaterLevel::Full, Some(OperatingState::Inactive)),
];

/// Device mode code to (dry clothes mode, sleep mode); `None` leaves a field as-is.
///
/// Code 6 leaves dry clothes mode untouched, unlike code 1 which clears
/// sleep mode. Codes not listed change nothing.
const DEVICE_MODE_TABLE: [(u8, Option<bool>, Option<bool>); 3] = [
    (0, Some(false), Some(false)),
    (1, Some(true), Some(false)),
    (6, None, Some(true)),
];

/// Tracked state of one dehumidifier.
///
/// The state is owned by a single device worker and only mutated through
/// [`apply`](Self::apply), [`apply_snapshot`](Self::apply_snapshot) or the
/// setters. All fields have a value from construction on; defaults mirror
/// what the appliance reports after power-up.
///
/// # Examples
///
/// ```
/// use deye_bridge::state::DeviceState;
/// use deye_bridge::types::{FanSpeed, HumidityTarget};
///
/// let mut state = DeviceState::new();
/// state.set_fan_speed(FanSpeed::HIGH);
/// state.set_humidity_target(HumidityTarget::clamped(90));
///
/// assert_eq!(state.fan_speed(), Some(FanSpeed::HIGH));
/// assert_eq!(state.humidity_target(), 80);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeviceState {
    active: bool,
    /// Raw fan level; only 1-3 are meaningful.
    fan_level: u8,
    dry_clothes_mode: bool,
    sleep_mode: bool,
    humidity_target: u8,
    humidity_current: u8,
    temperature: i16,
    water_level: WaterLevel,
    locked: bool,
    operating_state: OperatingState,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            active: true,
            fan_level: FanSpeed::LOW.value(),
            dry_clothes_mode: false,
            sleep_mode: false,
            humidity_target: HumidityTarget::default().value(),
            humidity_current: 60,
            temperature: 20,
            water_level: WaterLevel::Empty,
            locked: false,
            operating_state: OperatingState::Dehumidifying,
        }
    }
}

impl DeviceState {
    /// Creates a state with power-up defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Settings ==========

    /// Returns `true` if the appliance is on.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Switches the appliance on or off.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Returns the fan speed, or `None` if the raw level is outside 1-3.
    #[must_use]
    pub fn fan_speed(&self) -> Option<FanSpeed> {
        FanSpeed::from_level(self.fan_level)
    }

    /// Returns the raw fan level as last requested or reported.
    #[must_use]
    pub fn fan_level(&self) -> u8 {
        self.fan_level
    }

    /// Sets the fan speed.
    pub fn set_fan_speed(&mut self, speed: FanSpeed) {
        self.fan_level = speed.value();
    }

    /// Returns `true` if dry clothes mode is on.
    #[must_use]
    pub fn dry_clothes_mode(&self) -> bool {
        self.dry_clothes_mode
    }

    /// Sets dry clothes mode; enabling it turns sleep mode off.
    pub fn set_dry_clothes_mode(&mut self, on: bool) {
        self.dry_clothes_mode = on;
        if on {
            self.sleep_mode = false;
        }
    }

    /// Returns `true` if sleep mode is on.
    #[must_use]
    pub fn sleep_mode(&self) -> bool {
        self.sleep_mode
    }

    /// Sets sleep mode; enabling it turns dry clothes mode off.
    pub fn set_sleep_mode(&mut self, on: bool) {
        self.sleep_mode = on;
        if on {
            self.dry_clothes_mode = false;
        }
    }

    /// Returns the humidity set-point in percent.
    ///
    /// This is the value last written or reported; a device report is not
    /// clamped and may fall outside [25, 80].
    #[must_use]
    pub fn humidity_target(&self) -> u8 {
        self.humidity_target
    }

    /// Sets the humidity set-point.
    pub fn set_humidity_target(&mut self, target: HumidityTarget) {
        self.humidity_target = target.value();
    }

    /// Returns `true` if the physical controls are locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Locks or unlocks the physical controls.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    // ========== Telemetry ==========

    /// Returns the last reported relative humidity.
    #[must_use]
    pub fn humidity_current(&self) -> u8 {
        self.humidity_current
    }

    /// Returns the last reported temperature.
    #[must_use]
    pub fn temperature(&self) -> i16 {
        self.temperature
    }

    /// Returns the water tank level.
    #[must_use]
    pub fn water_level(&self) -> WaterLevel {
        self.water_level
    }

    /// Returns the current operating state.
    #[must_use]
    pub fn operating_state(&self) -> OperatingState {
        self.operating_state
    }

    // ========== Attributes ==========

    /// Returns the presentation value of an attribute.
    #[must_use]
    pub fn value(&self, attribute: Attribute) -> AttributeValue {
        match attribute {
            Attribute::Active => AttributeValue::Bool(self.active),
            Attribute::CurrentRelativeHumidity => AttributeValue::Percent(self.humidity_current),
            Attribute::RotationSpeed => AttributeValue::Speed(self.fan_level),
            Attribute::TargetHumidity => AttributeValue::Percent(self.humidity_target),
            Attribute::CurrentOperatingState => {
                AttributeValue::OperatingState(self.operating_state)
            }
            Attribute::WaterLevel => AttributeValue::Percent(self.water_level.percent()),
            Attribute::LockPhysicalControls => AttributeValue::Bool(self.locked),
            Attribute::DryClothesMode => AttributeValue::Bool(self.dry_clothes_mode),
            Attribute::SleepMode => AttributeValue::Bool(self.sleep_mode),
            Attribute::CurrentTemperature => AttributeValue::Temperature(self.temperature),
        }
    }

    // ========== State Changes ==========

    /// Applies a state change and returns whether the state actually changed.
    ///
    /// Unlike the mode setters, this writes exactly one field; callers that
    /// need mode exclusivity get it from [`StateChange::from_intent`].
    pub fn apply(&mut self, change: &StateChange) -> bool {
        fn update<T: PartialEq + Copy>(field: &mut T, value: T) -> bool {
            if *field == value {
                false
            } else {
                *field = value;
                true
            }
        }

        match *change {
            StateChange::Active(v) => update(&mut self.active, v),
            StateChange::FanSpeed(v) => update(&mut self.fan_level, v),
            StateChange::DryClothesMode(v) => update(&mut self.dry_clothes_mode, v),
            StateChange::SleepMode(v) => update(&mut self.sleep_mode, v),
            StateChange::TargetHumidity(v) => update(&mut self.humidity_target, v),
            StateChange::CurrentHumidity(v) => update(&mut self.humidity_current, v),
            StateChange::CurrentTemperature(v) => update(&mut self.temperature, v),
            StateChange::WaterLevel(v) => update(&mut self.water_level, v),
            StateChange::Locked(v) => update(&mut self.locked, v),
            StateChange::OperatingState(v) => update(&mut self.operating_state, v),
        }
    }

    /// Applies a decoded status frame and returns the changes that took effect.
    ///
    /// Only fields whose value moved are returned, in frame order.
    pub fn apply_snapshot(&mut self, snapshot: &StatusSnapshot) -> Vec<StateChange> {
        snapshot_changes(snapshot)
            .into_iter()
            .filter(|change| self.apply(change))
            .collect()
    }
}

/// Derives the field updates a status frame implies.
///
/// Later entries for the same attribute replace earlier ones, so the
/// dehumidifier status has the final say over the operating state derived
/// from the fan status.
#[must_use]
pub fn snapshot_changes(snapshot: &StatusSnapshot) -> Vec<StateChange> {
    let mut changes = Vec::with_capacity(10);

    set(&mut changes, StateChange::FanSpeed(snapshot.fan_level));

    if let Some((_, water_level, operating_state)) = FAN_STATUS_TABLE
        .iter()
        .find(|(code, ..)| *code == snapshot.fan_status)
    {
        set(&mut changes, StateChange::WaterLevel(*water_level));
        if let Some(state) = operating_state {
            set(&mut changes, StateChange::OperatingState(*state));
        }
    }

    if let Some((_, dry_clothes, sleep)) = DEVICE_MODE_TABLE
        .iter()
        .find(|(code, ..)| *code == snapshot.device_mode)
    {
        if let Some(on) = dry_clothes {
            set(&mut changes, StateChange::DryClothesMode(*on));
        }
        if let Some(on) = sleep {
            set(&mut changes, StateChange::SleepMode(*on));
        }
    }

    set(
        &mut changes,
        StateChange::Active(ACTIVE_POWER_CODES.contains(&snapshot.power_status)),
    );

    // The lock is only ever set from status; an intent is the sole way to clear it.
    if LOCKED_POWER_CODES.contains(&snapshot.power_status) {
        set(&mut changes, StateChange::Locked(true));
    }

    let operating_state = if snapshot.dehumidifier_status == DEHUMIDIFYING_CODE {
        OperatingState::Dehumidifying
    } else {
        OperatingState::Idle
    };
    set(&mut changes, StateChange::OperatingState(operating_state));

    set(&mut changes, StateChange::TargetHumidity(snapshot.humidity_target));
    set(&mut changes, StateChange::CurrentHumidity(snapshot.humidity_current));
    set(&mut changes, StateChange::CurrentTemperature(snapshot.temperature));

    changes
}

/// Pushes a change, replacing an earlier one for the same attribute.
fn set(changes: &mut Vec<StateChange>, change: StateChange) {
    let attribute = change.attribute();
    if let Some(existing) = changes.iter_mut().find(|c| c.attribute() == attribute) {
        *existing = change;
    } else {
        changes.push(change);
    }
}
