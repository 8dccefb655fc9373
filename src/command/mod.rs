// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound command frames.
//!
//! Two payloads are ever published to
//! `<endpoint>/<productId>/<deviceId>/command/hex`:
//!
//! | Command | Payload | Purpose |
//! |---------|---------|---------|
//! | [`Command::Poll`] | `00 01` | Ask the appliance to report its status |
//! | [`Command::Control`] | 10 bytes, see [`ControlFrame`] | Set power, lock, fan, mode and target |
//!
//! # Examples
//!
//! ```
//! use deye_bridge::command::{Command, ControlFrame};
//! use deye_bridge::state::DeviceState;
//!
//! let mut state = DeviceState::new();
//! state.set_locked(true);
//!
//! let frame = ControlFrame::from_state(&state);
//! assert_eq!(frame.as_bytes()[2], 0b0111);
//!
//! assert_eq!(Command::Poll.payload(), vec![0x00, 0x01]);
//! ```

mod control;

pub use control::{CONTROL_FRAME_LEN, ControlFrame, POLL_REQUEST};

/// A payload for the device's command topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Status request.
    Poll,
    /// Full control frame encoding the desired state.
    Control(ControlFrame),
}

impl Command {
    /// Returns the raw bytes to publish.
    #[must_use]
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Self::Poll => POLL_REQUEST.to_vec(),
            Self::Control(frame) => frame.as_bytes().to_vec(),
        }
    }

    /// Returns `true` for status requests.
    #[must_use]
    pub fn is_poll(&self) -> bool {
        matches!(self, Self::Poll)
    }
}

impl From<ControlFrame> for Command {
    fn from(frame: ControlFrame) -> Self {
        Self::Control(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DeviceState;

    #[test]
    fn poll_payload() {
        assert_eq!(Command::Poll.payload(), vec![0x00, 0x01]);
        assert!(Command::Poll.is_poll());
    }

    #[test]
    fn control_payload_is_ten_bytes() {
        let cmd = Command::from(ControlFrame::from_state(&DeviceState::new()));
        assert_eq!(cmd.payload().len(), CONTROL_FRAME_LEN);
        assert!(!cmd.is_poll());
    }
}
