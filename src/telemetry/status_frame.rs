// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status frame parser.

use serde::Deserialize;

use crate::error::{ParseError, ValueError};

/// Minimum number of `data` elements a status frame must carry.
pub const FRAME_LEN: usize = 34;

const FAN_STATUS: usize = 4;
const POWER_STATUS: usize = 5;
const DEHUMIDIFIER_STATUS: usize = 7;
const FAN_LEVEL: usize = 8;
const DEVICE_MODE: usize = 9;
const HUMIDITY_TARGET: usize = 10;
const TEMPERATURE: usize = 30;
const HUMIDITY_CURRENT: usize = 32;

/// Offset added by the appliance to every temperature reading.
const TEMPERATURE_OFFSET: i16 = 40;

/// JSON envelope of a status frame.
#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<Vec<String>>,
}

/// Fields decoded from one status frame.
///
/// A snapshot is produced for every inbound frame and consumed immediately
/// by the device state; it is never retained. Status codes are normalised to
/// upper-case hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Fan status code (water tank sentinel).
    pub fan_status: char,
    /// Power status code (power and lock flags).
    pub power_status: char,
    /// Dehumidifier status code.
    pub dehumidifier_status: char,
    /// Raw fan level (0-15).
    pub fan_level: u8,
    /// Device mode code (0 normal, 1 dry clothes, 6 sleep).
    pub device_mode: u8,
    /// Humidity set-point as reported by the device.
    pub humidity_target: u8,
    /// Current relative humidity.
    pub humidity_current: u8,
    /// Current temperature with the protocol offset removed.
    pub temperature: i16,
}

impl StatusSnapshot {
    /// Decodes a raw status payload.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the payload is not JSON, lacks the `data`
    /// array, the array is shorter than [`FRAME_LEN`], or a field is not a
    /// single hex digit.
    pub fn decode(payload: &[u8]) -> Result<Self, ParseError> {
        let envelope: Envelope = serde_json::from_slice(payload)?;
        let data = envelope
            .data
            .ok_or_else(|| ParseError::MissingField("data".to_string()))?;
        Self::from_digits(&data)
    }

    /// Decodes the fields from an already extracted `data` array.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the array is too short or a field is not a
    /// single hex digit.
    pub fn from_digits<S: AsRef<str>>(data: &[S]) -> Result<Self, ParseError> {
        if data.len() < FRAME_LEN {
            return Err(ParseError::UnexpectedFormat(format!(
                "status frame has {} elements, expected at least {FRAME_LEN}",
                data.len()
            )));
        }

        Ok(Self {
            fan_status: code(data, FAN_STATUS, "fan status")?,
            power_status: code(data, POWER_STATUS, "power status")?,
            dehumidifier_status: code(data, DEHUMIDIFIER_STATUS, "dehumidifier status")?,
            fan_level: digit(data, FAN_LEVEL, "fan level")?,
            device_mode: digit(data, DEVICE_MODE, "device mode")?,
            humidity_target: pair(data, HUMIDITY_TARGET, "humidity target")?,
            humidity_current: pair(data, HUMIDITY_CURRENT, "current humidity")?,
            temperature: i16::from(pair(data, TEMPERATURE, "temperature")?) - TEMPERATURE_OFFSET,
        })
    }
}

/// Parses a single hex character.
fn hex_value(c: char) -> Result<u8, ValueError> {
    c.to_digit(16)
        .and_then(|d| u8::try_from(d).ok())
        .ok_or(ValueError::InvalidHexDigit(c))
}

fn single_char<S: AsRef<str>>(data: &[S], index: usize, field: &str) -> Result<char, ParseError> {
    let element = data[index].as_ref();
    let mut chars = element.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ParseError::InvalidValue {
            field: field.to_string(),
            message: format!("expected one hex character at index {index}, got {element:?}"),
        }),
    }
}

fn digit<S: AsRef<str>>(data: &[S], index: usize, field: &str) -> Result<u8, ParseError> {
    let c = single_char(data, index, field)?;
    hex_value(c).map_err(|e| ParseError::InvalidValue {
        field: field.to_string(),
        message: e.to_string(),
    })
}

fn code<S: AsRef<str>>(data: &[S], index: usize, field: &str) -> Result<char, ParseError> {
    digit(data, index, field)?;
    Ok(single_char(data, index, field)?.to_ascii_uppercase())
}

fn pair<S: AsRef<str>>(data: &[S], index: usize, field: &str) -> Result<u8, ParseError> {
    let high = digit(data, index, field)?;
    let low = digit(data, index + 1, field)?;
    Ok((high << 4) | low)
}
