// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device manager for coordinating multiple dehumidifiers.
//!
//! # Overview
//!
//! The [`DeviceManager`] is the entry point for a bridge process. It provides:
//!
//! - **Configuration**: [`BridgeConfig`] mirrors the accessory host's JSON configuration
//! - **One shared transport**: every device publishes and subscribes through the same broker
//! - **Per-device workers**: each [`Dehumidifier`](crate::Dehumidifier) is isolated from the others
//!
//! # Examples
//!
//! ## From a configuration document
//!
//! ```no_run
//! use deye_bridge::manager::{BridgeConfig, DeviceManager};
//!
//! #[tokio::main]
//! async fn main() -> deye_bridge::Result<()> {
//!     let config = BridgeConfig::from_json(r#"{
//!         "mqttBaseInfo": { "mqttHost": "192.168.1.50", "endPoint": "deye" },
//!         "devices": [ { "name": "Cellar", "productId": "prod1", "deviceId": "dev1" } ]
//!     }"#)?;
//!
//!     let manager = DeviceManager::connect(&config).await?;
//!     println!("Managing {} devices", manager.device_count().await);
//!     Ok(())
//! }
//! ```
//!
//! ## Watching device state
//!
//! ```no_run
//! use deye_bridge::manager::{DeviceConfig, DeviceManager};
//! use deye_bridge::protocol::MqttBroker;
//!
//! # async fn example(broker: MqttBroker) -> deye_bridge::Result<()> {
//! let router = broker.router().clone();
//! let manager = DeviceManager::with_router(std::sync::Arc::new(broker), router, "deye");
//!
//! let device = manager
//!     .add_device(DeviceConfig::new("Cellar", "prod1", "dev1").with_fan_control())
//!     .await?;
//!
//! let mut state_rx = device.watch();
//! tokio::spawn(async move {
//!     while state_rx.changed().await.is_ok() {
//!         let state = state_rx.borrow();
//!         println!("Humidity: {}%", state.humidity_current());
//!     }
//! });
//! # Ok(())
//! # }
//! ```

mod device_config;
mod device_manager;

pub use device_config::{BridgeConfig, BrokerSettings, DeviceConfig};
pub use device_manager::DeviceManager;
