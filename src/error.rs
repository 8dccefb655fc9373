// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! This module provides the error hierarchy used across the crate: value
//! validation, transport communication, status frame decoding, and device
//! operations. None of these errors is fatal to the process; each one is
//! scoped to a single device and a single operation.

use thiserror::Error;

use crate::state::Attribute;
use crate::types::DeviceId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while talking to the transport.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while decoding a status frame or configuration.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred during a device operation.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// Device was not found in the manager.
    #[error("device not found")]
    DeviceNotFound,

    /// The device was not configured with the capability backing this attribute.
    #[error("device does not expose {0}")]
    CapabilityNotSupported(Attribute),
}

impl Error {
    /// Returns `true` if this is the "device not responding" condition.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Device(DeviceError::Stale { .. }))
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// A character that is not a hexadecimal digit.
    #[error("invalid hex digit: {0:?}")]
    InvalidHexDigit(char),
}

/// Errors related to transport communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT connection or communication failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid broker address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors related to decoding status frames and configuration documents.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),

    /// Unexpected payload format.
    #[error("unexpected payload format: {0}")]
    UnexpectedFormat(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors related to device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No status frame arrived within the liveness window.
    #[error("device {device_id} is not responding")]
    Stale {
        /// The device whose telemetry is stale.
        device_id: DeviceId,
    },

    /// The attribute is derived from device status and cannot be written.
    #[error("{0} is read-only")]
    ReadOnly(Attribute),

    /// The value kind does not match the attribute.
    #[error("value does not match attribute {attribute}")]
    TypeMismatch {
        /// The attribute that was written.
        attribute: Attribute,
    },

    /// The device worker has stopped.
    #[error("device worker is no longer running")]
    Unavailable,

    /// Device configuration is invalid.
    #[error("invalid device configuration: {0}")]
    InvalidConfiguration(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
