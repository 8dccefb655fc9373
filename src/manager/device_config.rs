// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge configuration types.
//!
//! The JSON shape matches the accessory host's plugin configuration:
//!
//! ```json
//! {
//!   "mqttBaseInfo": {
//!     "mqttHost": "192.168.1.50",
//!     "mqttPort": 1883,
//!     "username": "user",
//!     "password": "secret",
//!     "clientId": "deye-bridge",
//!     "endPoint": "deye"
//!   },
//!   "devices": [
//!     {
//!       "name": "Basement",
//!       "productId": "prod1",
//!       "deviceId": "dev1",
//!       "model": "DYD-612",
//!       "fanControl": true,
//!       "dryClothes": true,
//!       "sleepMode": false,
//!       "temperatureSensor": true
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::Capabilities;
use crate::error::ParseError;
use crate::types::DeviceId;

/// Default MQTT port.
const DEFAULT_MQTT_PORT: u16 = 1883;

/// Complete bridge configuration: one broker and its devices.
///
/// # Examples
///
/// ```
/// use deye_bridge::manager::BridgeConfig;
///
/// let config = BridgeConfig::from_json(r#"{
///     "mqttBaseInfo": { "mqttHost": "broker.local", "endPoint": "deye" },
///     "devices": [ { "name": "Cellar", "productId": "p", "deviceId": "d" } ]
/// }"#)?;
///
/// assert_eq!(config.mqtt_base_info.mqtt_port, 1883);
/// assert!(!config.devices[0].fan_control);
/// # Ok::<(), deye_bridge::error::ParseError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Broker connection settings.
    pub mqtt_base_info: BrokerSettings,
    /// Configured dehumidifiers.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl BridgeConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if the document is malformed or a required
    /// key is missing.
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// MQTT broker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerSettings {
    /// Broker host name or address.
    pub mqtt_host: String,
    /// Broker port (default 1883).
    #[serde(default = "default_mqtt_port")]
    pub mqtt_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Client identifier presented to the broker; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Topic prefix in front of `<productId>/<deviceId>`.
    pub end_point: String,
}

fn default_mqtt_port() -> u16 {
    DEFAULT_MQTT_PORT
}

impl BrokerSettings {
    /// Creates settings for `host` with the default port and no credentials.
    #[must_use]
    pub fn new(host: impl Into<String>, end_point: impl Into<String>) -> Self {
        Self {
            mqtt_host: host.into(),
            mqtt_port: DEFAULT_MQTT_PORT,
            username: None,
            password: None,
            client_id: None,
            end_point: end_point.into(),
        }
    }

    /// Returns the credentials when both username and password are set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) if !username.is_empty() => {
                Some((username.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}

/// Configuration of one dehumidifier.
///
/// # Examples
///
/// ```
/// use deye_bridge::manager::DeviceConfig;
/// use deye_bridge::state::Attribute;
///
/// let config = DeviceConfig::new("Cellar", "prod1", "dev1")
///     .with_model("DYD-612")
///     .with_fan_control()
///     .with_temperature_sensor();
///
/// let capabilities = config.capabilities();
/// assert!(capabilities.supports(Attribute::RotationSpeed));
/// assert!(!capabilities.supports(Attribute::SleepMode));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
// Each boolean is an independent optional feature of the appliance.
#[allow(clippy::struct_excessive_bools)]
pub struct DeviceConfig {
    /// Display name.
    pub name: String,
    /// Vendor product identifier (second topic segment).
    pub product_id: String,
    /// Vendor device identifier (third topic segment).
    pub device_id: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub fan_control: bool,
    #[serde(default)]
    pub dry_clothes: bool,
    #[serde(default)]
    pub sleep_mode: bool,
    #[serde(default)]
    pub temperature_sensor: bool,
}

impl DeviceConfig {
    /// Creates a configuration with no optional features.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        product_id: impl Into<String>,
        device_id: impl Into<DeviceId>,
    ) -> Self {
        Self {
            name: name.into(),
            product_id: product_id.into(),
            device_id: device_id.into(),
            model: None,
            fan_control: false,
            dry_clothes: false,
            sleep_mode: false,
            temperature_sensor: false,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_fan_control(mut self) -> Self {
        self.fan_control = true;
        self
    }

    #[must_use]
    pub fn with_dry_clothes(mut self) -> Self {
        self.dry_clothes = true;
        self
    }

    #[must_use]
    pub fn with_sleep_mode(mut self) -> Self {
        self.sleep_mode = true;
        self
    }

    #[must_use]
    pub fn with_temperature_sensor(mut self) -> Self {
        self.temperature_sensor = true;
        self
    }

    /// Sets all optional features from `capabilities`.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.fan_control = capabilities.fan_control;
        self.dry_clothes = capabilities.dry_clothes;
        self.sleep_mode = capabilities.sleep_mode;
        self.temperature_sensor = capabilities.temperature_sensor;
        self
    }

    /// Returns the capabilities implied by the feature flags.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            fan_control: self.fan_control,
            dry_clothes: self.dry_clothes,
            sleep_mode: self.sleep_mode,
            temperature_sensor: self.temperature_sensor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"{
        "mqttBaseInfo": {
            "mqttHost": "192.168.1.50",
            "mqttPort": 1884,
            "username": "user",
            "password": "secret",
            "clientId": "bridge",
            "endPoint": "deye"
        },
        "devices": [
            {
                "name": "Basement",
                "productId": "prod1",
                "deviceId": "dev1",
                "model": "DYD-612",
                "fanControl": true,
                "dryClothes": true,
                "sleepMode": true,
                "temperatureSensor": true
            },
            { "name": "Attic", "productId": "prod1", "deviceId": "dev2" }
        ]
    }"#;

    #[test]
    fn parse_full_config() {
        let config = BridgeConfig::from_json(FULL_CONFIG).unwrap();

        let broker = &config.mqtt_base_info;
        assert_eq!(broker.mqtt_host, "192.168.1.50");
        assert_eq!(broker.mqtt_port, 1884);
        assert_eq!(broker.credentials(), Some(("user", "secret")));
        assert_eq!(broker.client_id.as_deref(), Some("bridge"));
        assert_eq!(broker.end_point, "deye");

        assert_eq!(config.devices.len(), 2);
        let basement = &config.devices[0];
        assert_eq!(basement.device_id, DeviceId::new("dev1"));
        assert_eq!(basement.model.as_deref(), Some("DYD-612"));
        assert_eq!(basement.capabilities(), Capabilities::full());

        let attic = &config.devices[1];
        assert_eq!(attic.capabilities(), Capabilities::default());
        assert!(attic.model.is_none());
    }

    #[test]
    fn defaults_for_missing_keys() {
        let config = BridgeConfig::from_json(
            r#"{ "mqttBaseInfo": { "mqttHost": "h", "endPoint": "e" } }"#,
        )
        .unwrap();

        assert_eq!(config.mqtt_base_info.mqtt_port, 1883);
        assert!(config.mqtt_base_info.credentials().is_none());
        assert!(config.devices.is_empty());
    }

    #[test]
    fn missing_required_key_fails() {
        let err = BridgeConfig::from_json(r#"{ "mqttBaseInfo": { "mqttHost": "h" } }"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }

    #[test]
    fn username_without_password_has_no_credentials() {
        let mut broker = BrokerSettings::new("h", "e");
        broker.username = Some("user".to_string());
        assert!(broker.credentials().is_none());
    }

    #[test]
    fn builder_matches_parsed() {
        let built = DeviceConfig::new("Basement", "prod1", "dev1")
            .with_model("DYD-612")
            .with_capabilities(Capabilities::full());
        let parsed = BridgeConfig::from_json(FULL_CONFIG).unwrap().devices.remove(0);
        assert_eq!(built, parsed);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(DeviceConfig::new("n", "p", "d").with_sleep_mode()).unwrap();
        assert_eq!(json["deviceId"], "d");
        assert_eq!(json["sleepMode"], true);
        assert!(json.get("model").is_none());
    }
}
