// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device manager for coordinating multiple dehumidifiers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::device::{Dehumidifier, Timing};
use crate::error::{DeviceError, Error};
use crate::protocol::{DeviceTopics, TopicRouter, Transport};
use crate::types::DeviceId;

use super::device_config::DeviceConfig;
#[cfg(feature = "mqtt")]
use super::device_config::BridgeConfig;
#[cfg(feature = "mqtt")]
use crate::protocol::MqttBroker;

/// Manager for the dehumidifiers sharing one transport.
///
/// The manager owns the transport and the [`TopicRouter`] it feeds. Every
/// device added gets its own worker; the devices share nothing else, so a
/// malformed frame or a failed publish for one never touches another.
///
/// # Examples
///
/// ```no_run
/// use deye_bridge::manager::{BridgeConfig, DeviceManager};
///
/// #[tokio::main]
/// async fn main() -> deye_bridge::Result<()> {
///     let config = BridgeConfig::from_json(r#"{
///         "mqttBaseInfo": { "mqttHost": "192.168.1.50", "endPoint": "deye" },
///         "devices": [ { "name": "Cellar", "productId": "prod1", "deviceId": "dev1" } ]
///     }"#)?;
///     let manager = DeviceManager::connect(&config).await?;
///
///     for id in manager.device_ids().await {
///         if let Some(device) = manager.device(&id).await {
///             device.set_active(true).await?;
///         }
///     }
///
///     Ok(())
/// }
/// ```
pub struct DeviceManager<T: Transport> {
    /// Transport shared by every device.
    transport: Arc<T>,
    /// Router receiving inbound status frames.
    router: Arc<TopicRouter>,
    /// Topic prefix in front of `<productId>/<deviceId>`.
    endpoint: String,
    /// Timer policy for new devices.
    timing: Timing,
    /// Managed devices, keyed by device ID.
    devices: RwLock<HashMap<DeviceId, Dehumidifier>>,
}

impl<T: Transport> DeviceManager<T> {
    /// Creates a manager with its own router.
    ///
    /// The caller is responsible for feeding inbound messages to
    /// [`route`](Self::route).
    #[must_use]
    pub fn new(transport: T, endpoint: impl Into<String>) -> Self {
        Self::with_router(
            Arc::new(transport),
            Arc::new(TopicRouter::new()),
            endpoint,
        )
    }

    /// Creates a manager around a transport that already feeds `router`.
    #[must_use]
    pub fn with_router(
        transport: Arc<T>,
        router: Arc<TopicRouter>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            router,
            endpoint: endpoint.into(),
            timing: Timing::default(),
            devices: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the timer policy used for devices added afterwards.
    #[must_use]
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    #[must_use]
    pub fn router(&self) -> &Arc<TopicRouter> {
        &self.router
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    // =========================================================================
    // Device Management
    // =========================================================================

    /// Adds a device and starts its worker.
    ///
    /// Subscribes to the device's status topic and sends the first status
    /// request. A failed subscription is logged; the device still starts and
    /// will report stale until frames arrive.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::InvalidConfiguration` if an identifier is empty
    /// or a device with the same ID is already managed.
    pub async fn add_device(&self, config: DeviceConfig) -> Result<Dehumidifier, Error> {
        if config.device_id.as_str().is_empty() || config.product_id.is_empty() {
            return Err(DeviceError::InvalidConfiguration(format!(
                "device '{}' needs both a product ID and a device ID",
                config.name
            ))
            .into());
        }

        let mut devices = self.devices.write().await;
        if devices.contains_key(&config.device_id) {
            return Err(DeviceError::InvalidConfiguration(format!(
                "device ID '{}' is configured twice",
                config.device_id
            ))
            .into());
        }

        let topics = DeviceTopics::new(&self.endpoint, &config.product_id, &config.device_id);
        if let Err(e) = self.transport.subscribe(topics.status()).await {
            tracing::warn!(
                device = %config.device_id,
                topic = %topics.status(),
                error = %e,
                "Failed to subscribe to status topic"
            );
        }

        let device = Dehumidifier::spawn(
            &config,
            topics,
            Arc::clone(&self.transport),
            &self.router,
            self.timing,
        );
        devices.insert(config.device_id, device.clone());

        Ok(device)
    }

    /// Removes a device from the manager.
    ///
    /// The worker stops once the last handle to the device is dropped.
    ///
    /// # Returns
    ///
    /// Returns `true` if the device was found and removed, `false` otherwise.
    pub async fn remove_device(&self, device_id: &DeviceId) -> bool {
        let removed = self.devices.write().await.remove(device_id).is_some();
        if removed {
            self.router.unregister(device_id);
            tracing::info!(device = %device_id, "Device removed");
        }
        removed
    }

    /// Returns a handle to a managed device.
    pub async fn device(&self, device_id: &DeviceId) -> Option<Dehumidifier> {
        self.devices.read().await.get(device_id).cloned()
    }

    /// Returns a handle to a managed device.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if no device has this ID.
    pub async fn require_device(&self, device_id: &DeviceId) -> Result<Dehumidifier, Error> {
        self.device(device_id).await.ok_or(Error::DeviceNotFound)
    }

    /// Returns a list of all device IDs, sorted.
    pub async fn device_ids(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self.devices.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Returns the number of managed devices.
    pub async fn device_count(&self) -> usize {
        self.devices.read().await.len()
    }

    /// Hands an inbound message to the router.
    ///
    /// Only needed for transports that do not feed the router themselves.
    pub fn route(&self, topic: &str, payload: &[u8]) -> bool {
        self.router.route(topic, payload)
    }
}

#[cfg(feature = "mqtt")]
impl DeviceManager<MqttBroker> {
    /// Connects to the configured broker and adds every configured device.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The broker connection fails
    /// - A device configuration is invalid
    pub async fn connect(config: &BridgeConfig) -> Result<Self, Error> {
        let settings = &config.mqtt_base_info;
        let router = Arc::new(TopicRouter::new());

        let mut builder = MqttBroker::builder()
            .host(&settings.mqtt_host)
            .port(settings.mqtt_port)
            .router(Arc::clone(&router));
        if let Some((username, password)) = settings.credentials() {
            builder = builder.credentials(username, password);
        }
        if let Some(client_id) = &settings.client_id {
            builder = builder.client_id(client_id);
        }

        let broker = builder.build().await?;
        let manager = Self::with_router(Arc::new(broker), router, &settings.end_point);

        for device in &config.devices {
            manager.add_device(device.clone()).await?;
        }

        tracing::info!(
            devices = config.devices.len(),
            endpoint = %settings.end_point,
            "Bridge started"
        );

        Ok(manager)
    }
}

impl<T: Transport> std::fmt::Debug for DeviceManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceManager")
            .field("endpoint", &self.endpoint)
            .field("timing", &self.timing)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}
