// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Control frame encoding.

use std::fmt;

use crate::state::DeviceState;

/// Length of a control frame in bytes.
pub const CONTROL_FRAME_LEN: usize = 10;

/// Status request payload.
pub const POLL_REQUEST: [u8; 2] = [0x00, 0x01];

const HEADER: [u8; 2] = [0x08, 0x02];

const POWER_ON: u8 = 0b0011;
const POWER_OFF: u8 = 0b0010;
const LOCK_BIT: u8 = 0b0100;
const DRY_CLOTHES_BIT: u8 = 0b0000_0001;
const SLEEP_BITS: u8 = 0b0000_0110;

/// Ten-byte control frame.
///
/// Layout: `[0x08, 0x02, power, mode, target, 0, 0, 0, 0, 0]`.
///
/// - `power`: `0b0011` when on, `0b0010` when off, XOR `0b0100` when locked
/// - `mode`: fan nibble (`0x10`, `0x20`, `0x30`), XOR `0b0001` for dry
///   clothes mode, else XOR `0b0110` for sleep mode
/// - `target`: humidity set-point as a raw percentage
///
/// Encoding cannot fail: a fan level outside 1-3 omits the fan nibble.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlFrame([u8; CONTROL_FRAME_LEN]);

impl ControlFrame {
    /// Encodes the desired state of a device.
    #[must_use]
    pub fn from_state(state: &DeviceState) -> Self {
        let mut power = if state.is_active() { POWER_ON } else { POWER_OFF };
        if state.is_locked() {
            power ^= LOCK_BIT;
        }

        let mut mode = state.fan_speed().map_or(0, |speed| speed.nibble());
        // Dry clothes wins when both modes are set
        if state.dry_clothes_mode() {
            mode ^= DRY_CLOTHES_BIT;
        } else if state.sleep_mode() {
            mode ^= SLEEP_BITS;
        }

        let mut bytes = [0u8; CONTROL_FRAME_LEN];
        bytes[..2].copy_from_slice(&HEADER);
        bytes[2] = power;
        bytes[3] = mode;
        bytes[4] = state.humidity_target();

        let frame = Self(bytes);
        tracing::debug!(frame = %frame, "Encoded control frame");
        frame
    }

    /// Returns the raw frame bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; CONTROL_FRAME_LEN] {
        &self.0
    }
}

impl fmt::Display for ControlFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ControlFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ControlFrame({self})")
    }
}
