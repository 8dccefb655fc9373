// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status frame decoding.
//!
//! Dehumidifiers publish their status on
//! `<endpoint>/<productId>/<deviceId>/status/hex` as a JSON envelope whose
//! `data` array holds one hex character per element. The fields live at fixed
//! indices; there is no schema in the payload itself.
//!
//! | index | field |
//! |-------|-------|
//! | 4 | fan status code |
//! | 5 | power status code |
//! | 7 | dehumidifier status code |
//! | 8 | fan level |
//! | 9 | device mode code |
//! | 10-11 | humidity target (two hex digits) |
//! | 30-31 | temperature (two hex digits, offset by 40) |
//! | 32-33 | current humidity (two hex digits) |
//!
//! # Examples
//!
//! ```
//! use deye_bridge::telemetry::StatusSnapshot;
//!
//! let mut data = vec!["0"; 34];
//! data[5] = "3";
//! data[10] = "3";
//! data[11] = "C";
//! let payload = serde_json::json!({ "data": data }).to_string();
//!
//! let snapshot = StatusSnapshot::decode(payload.as_bytes()).unwrap();
//! assert_eq!(snapshot.power_status, '3');
//! assert_eq!(snapshot.humidity_target, 60);
//! ```

mod status_frame;

pub use status_frame::{FRAME_LEN, StatusSnapshot};
