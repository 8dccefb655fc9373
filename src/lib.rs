// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deye Bridge - A Rust library bridging Deye dehumidifiers to a typed accessory model.
//!
//! Deye dehumidifiers talk a compact binary protocol over MQTT: they publish
//! their status as a JSON array of hex digits at fixed offsets and accept a
//! 10-byte control frame. This library decodes the former, encodes the
//! latter, and keeps a per-device state that presentation layers can read,
//! write and subscribe to.
//!
//! # Supported Features
//!
//! - **Power and lock**: Switch the appliance and lock its physical controls
//! - **Humidity**: Target set-point (clamped to 25-80%) and ambient reading
//! - **Fan speed**: Three levels, debounced so a slider sends one frame
//! - **Modes**: Dry Clothes and Sleep, mutually exclusive
//! - **Telemetry**: Water tank level, operating state, temperature
//! - **Liveness**: Reads fail with a "not responding" error after 120 s of silence
//!
//! # Quick Start
//!
//! ```no_run
//! use deye_bridge::manager::{BridgeConfig, DeviceManager};
//! use deye_bridge::types::{DeviceId, FanSpeed};
//!
//! #[tokio::main]
//! async fn main() -> deye_bridge::Result<()> {
//!     let config = BridgeConfig::from_json(r#"{
//!         "mqttBaseInfo": { "mqttHost": "192.168.1.50", "endPoint": "deye" },
//!         "devices": [
//!             { "name": "Cellar", "productId": "prod1", "deviceId": "dev1", "fanControl": true }
//!         ]
//!     }"#)?;
//!
//!     let manager = DeviceManager::connect(&config).await?;
//!     let device = manager.require_device(&DeviceId::new("dev1")).await?;
//!
//!     device.set_target_humidity(50).await?;
//!     device.set_fan_speed(FanSpeed::MEDIUM).await?;
//!
//!     println!("Humidity: {}%", device.current_humidity().await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Callbacks
//!
//! ```no_run
//! use deye_bridge::subscription::Subscribable;
//! use deye_bridge::state::{Attribute, StateChange};
//!
//! # fn example(device: deye_bridge::Dehumidifier) {
//! device.on_state_changed(|change| {
//!     if let StateChange::WaterLevel(level) = change {
//!         println!("Water tank: {}%", level.percent());
//!     }
//! });
//!
//! device.on_attribute_changed(Attribute::CurrentRelativeHumidity, |value| {
//!     println!("Humidity: {value:?}");
//! });
//!
//! device.on_stale(|| println!("Device is not responding"));
//! device.on_recovered(|| println!("Device is back"));
//! # }
//! ```

mod capabilities;
pub mod command;
pub mod device;
pub mod error;
pub mod manager;
pub mod protocol;
pub mod state;
pub mod subscription;
pub mod telemetry;
pub mod types;

pub use capabilities::Capabilities;
pub use command::{Command, ControlFrame};
pub use device::{Dehumidifier, Liveness, Timing};
pub use error::{DeviceError, Error, ParseError, ProtocolError, Result, ValueError};
pub use manager::{BridgeConfig, DeviceConfig, DeviceManager};
#[cfg(feature = "mqtt")]
pub use protocol::{MqttBroker, MqttBrokerBuilder};
pub use protocol::{DeviceTopics, TopicRouter, Transport};
pub use state::{Attribute, AttributeValue, DeviceState, StateChange};
pub use subscription::{CallbackRegistry, Subscribable, SubscriptionId};
pub use telemetry::StatusSnapshot;
pub use types::{DeviceId, FanSpeed, HumidityTarget, OperatingState, WaterLevel};
