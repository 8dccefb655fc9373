// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level handle for one dehumidifier.
//!
//! Each device runs as a worker task that owns its [`DeviceState`],
//! [`LivenessTracker`] and fan-speed [`CommandDebouncer`]. Status frames,
//! reads and writes are messages on the worker's inbox, so they are applied
//! one at a time. A second task drains the worker's outbound frames into the
//! transport; a slow or failing broker never delays ticks or reads.
//!
//! ```text
//!  TopicRouter ──Status──┐
//!                        ▼
//!  Dehumidifier ──Read/Write──▶ Worker ──Command──▶ publisher ──▶ Transport
//!       ▲                         │
//!       └── watch / callbacks ◀───┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use deye_bridge::manager::{BridgeConfig, DeviceManager};
//! use deye_bridge::subscription::Subscribable;
//! use deye_bridge::types::FanSpeed;
//!
//! # async fn example(config: BridgeConfig) -> deye_bridge::Result<()> {
//! let manager = DeviceManager::connect(&config).await?;
//!
//! for id in manager.device_ids().await {
//!     let Some(device) = manager.device(&id).await else { continue };
//!
//!     device.on_stale(|| println!("Not responding"));
//!     device.set_fan_speed(FanSpeed::HIGH).await?;
//!
//!     match device.current_humidity().await {
//!         Ok(humidity) => println!("{}: {humidity}%", device.name()),
//!         Err(e) if e.is_stale() => println!("{}: not responding", device.name()),
//!         Err(e) => return Err(e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod debounce;
mod liveness;
mod timing;
mod worker;

pub use debounce::CommandDebouncer;
pub use liveness::{Liveness, LivenessTracker};
pub use timing::{MIN_PERIOD, Timing};

pub(crate) use worker::Request;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use crate::capabilities::Capabilities;
use crate::error::{DeviceError, Error};
use crate::manager::DeviceConfig;
use crate::protocol::{DeviceTopics, TopicRouter, Transport};
use crate::state::{Attribute, AttributeValue, DeviceState, StateChange};
use crate::subscription::{CallbackRegistry, Subscribable, SubscriptionId};
use crate::types::{DeviceId, FanSpeed, HumidityTarget, OperatingState, WaterLevel};

use worker::{DeviceHealth, Worker, publish_loop};

/// Capacity of a worker inbox.
const INBOX_CAPACITY: usize = 32;

/// A dehumidifier bridged over the vendor's MQTT protocol.
///
/// `Dehumidifier` is cheaply cloneable. The worker task stops once every
/// clone has been dropped.
#[derive(Clone)]
pub struct Dehumidifier {
    inner: Arc<Inner>,
}

struct Inner {
    id: DeviceId,
    name: String,
    model: Option<String>,
    capabilities: Capabilities,
    topics: DeviceTopics,
    requests: mpsc::Sender<Request>,
    callbacks: Arc<CallbackRegistry>,
    state: watch::Receiver<DeviceState>,
    health: watch::Receiver<DeviceHealth>,
}

impl Dehumidifier {
    /// Starts the worker and publisher tasks and registers with the router.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn<T: Transport>(
        config: &DeviceConfig,
        topics: DeviceTopics,
        transport: Arc<T>,
        router: &TopicRouter,
        timing: Timing,
    ) -> Self {
        let id = config.device_id.clone();
        let callbacks = Arc::new(CallbackRegistry::new());

        let (requests, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (outbox, outbound) = mpsc::channel(timing.outbox_capacity());
        let (worker, state, health) =
            Worker::new(id.clone(), Arc::clone(&callbacks), outbox, timing);

        router.register(id.clone(), &topics, &requests);

        tokio::spawn(publish_loop(
            transport,
            topics.command().to_string(),
            id.clone(),
            outbound,
        ));
        tokio::spawn(worker.run(inbox));

        tracing::info!(
            device = %id,
            name = %config.name,
            status_topic = %topics.status(),
            "Device worker started"
        );

        Self {
            inner: Arc::new(Inner {
                id,
                name: config.name.clone(),
                model: config.model.clone(),
                capabilities: config.capabilities(),
                topics,
                requests,
                callbacks,
                state,
                health,
            }),
        }
    }

    // ========== Identity ==========

    /// Returns the vendor device identifier.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.inner.id
    }

    /// Returns the configured display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the configured model, if any.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.inner.model.as_deref()
    }

    /// Returns the serial number presented to accessory hosts.
    #[must_use]
    pub fn serial_number(&self) -> String {
        self.inner.id.as_str().to_uppercase()
    }

    /// Returns the stable accessory identity derived from the device ID.
    #[must_use]
    pub fn accessory_uuid(&self) -> Uuid {
        self.inner.id.accessory_uuid()
    }

    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.inner.capabilities
    }

    #[must_use]
    pub fn topics(&self) -> &DeviceTopics {
        &self.inner.topics
    }

    // ========== Attributes ==========

    /// Reads one attribute.
    ///
    /// Every read also asks the appliance for a fresh status frame.
    ///
    /// # Errors
    ///
    /// - `Error::CapabilityNotSupported` if the attribute is not exposed
    /// - `DeviceError::Stale` for telemetry while the device is not responding
    /// - `DeviceError::Unavailable` if the worker has stopped
    pub async fn read(&self, attribute: Attribute) -> Result<AttributeValue, Error> {
        self.check_capability(attribute)?;

        let (reply, response) = oneshot::channel();
        self.request(Request::Read { attribute, reply }).await?;
        response.await.map_err(|_| DeviceError::Unavailable)?
    }

    /// Writes one attribute and sends the resulting control frame.
    ///
    /// Fan speed writes are debounced: the state updates immediately, the
    /// frame goes out once the writes have been quiet for the debounce interval.
    ///
    /// # Errors
    ///
    /// - `Error::CapabilityNotSupported` if the attribute is not exposed
    /// - `DeviceError::ReadOnly` for attributes reported by the appliance
    /// - `DeviceError::TypeMismatch` if the value kind does not fit
    /// - `ValueError::OutOfRange` for a fan speed outside [1, 3]
    /// - `DeviceError::Unavailable` if the worker has stopped
    pub async fn write(&self, attribute: Attribute, value: AttributeValue) -> Result<(), Error> {
        self.check_capability(attribute)?;

        let (reply, response) = oneshot::channel();
        self.request(Request::Write {
            attribute,
            value,
            reply,
        })
        .await?;
        response.await.map_err(|_| DeviceError::Unavailable)?
    }

    fn check_capability(&self, attribute: Attribute) -> Result<(), Error> {
        if self.inner.capabilities.supports(attribute) {
            Ok(())
        } else {
            Err(Error::CapabilityNotSupported(attribute))
        }
    }

    async fn request(&self, request: Request) -> Result<(), Error> {
        self.inner
            .requests
            .send(request)
            .await
            .map_err(|_| DeviceError::Unavailable.into())
    }

    async fn read_with<T>(
        &self,
        attribute: Attribute,
        convert: impl FnOnce(AttributeValue) -> Option<T>,
    ) -> Result<T, Error> {
        let value = self.read(attribute).await?;
        convert(value).ok_or_else(|| DeviceError::TypeMismatch { attribute }.into())
    }

    // ========== Typed Access ==========

    /// Returns whether the appliance is switched on.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    pub async fn is_active(&self) -> Result<bool, Error> {
        self.read_with(Attribute::Active, |v| v.as_bool()).await
    }

    /// Switches the appliance on or off.
    ///
    /// # Errors
    ///
    /// See [`write`](Self::write).
    pub async fn set_active(&self, active: bool) -> Result<(), Error> {
        self.write(Attribute::Active, AttributeValue::Bool(active))
            .await
    }

    /// Returns the fan level; stays readable while the device is stale.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    pub async fn fan_speed(&self) -> Result<u8, Error> {
        self.read_with(Attribute::RotationSpeed, |v| v.as_speed())
            .await
    }

    /// Requests a fan speed (debounced).
    ///
    /// # Errors
    ///
    /// See [`write`](Self::write).
    pub async fn set_fan_speed(&self, speed: FanSpeed) -> Result<(), Error> {
        self.write(Attribute::RotationSpeed, AttributeValue::Speed(speed.value()))
            .await
    }

    /// Returns the humidity set-point; stays readable while the device is stale.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    pub async fn target_humidity(&self) -> Result<u8, Error> {
        self.read_with(Attribute::TargetHumidity, |v| v.as_percent())
            .await
    }

    /// Sets the humidity set-point, clamped to [25, 80].
    ///
    /// # Errors
    ///
    /// See [`write`](Self::write).
    pub async fn set_target_humidity(&self, percent: u8) -> Result<(), Error> {
        let target = HumidityTarget::clamped(percent);
        self.write(
            Attribute::TargetHumidity,
            AttributeValue::Percent(target.value()),
        )
        .await
    }

    /// Returns whether the physical controls are locked.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    pub async fn is_locked(&self) -> Result<bool, Error> {
        self.read_with(Attribute::LockPhysicalControls, |v| v.as_bool())
            .await
    }

    /// Locks or unlocks the physical controls.
    ///
    /// # Errors
    ///
    /// See [`write`](Self::write).
    pub async fn set_locked(&self, locked: bool) -> Result<(), Error> {
        self.write(Attribute::LockPhysicalControls, AttributeValue::Bool(locked))
            .await
    }

    /// Switches Dry Clothes Mode; enabling it turns Sleep Mode off.
    ///
    /// # Errors
    ///
    /// See [`write`](Self::write).
    pub async fn set_dry_clothes_mode(&self, on: bool) -> Result<(), Error> {
        self.write(Attribute::DryClothesMode, AttributeValue::Bool(on))
            .await
    }

    /// Switches Sleep Mode; enabling it turns Dry Clothes Mode off.
    ///
    /// # Errors
    ///
    /// See [`write`](Self::write).
    pub async fn set_sleep_mode(&self, on: bool) -> Result<(), Error> {
        self.write(Attribute::SleepMode, AttributeValue::Bool(on))
            .await
    }

    /// Returns the ambient relative humidity in percent.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    pub async fn current_humidity(&self) -> Result<u8, Error> {
        self.read_with(Attribute::CurrentRelativeHumidity, |v| v.as_percent())
            .await
    }

    /// Returns the ambient temperature in degrees Celsius.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    pub async fn current_temperature(&self) -> Result<i16, Error> {
        self.read_with(Attribute::CurrentTemperature, |v| v.as_temperature())
            .await
    }

    /// Returns the water tank level.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    pub async fn water_level(&self) -> Result<WaterLevel, Error> {
        self.read_with(Attribute::WaterLevel, |v| {
            v.as_percent().map(|percent| {
                if percent >= WaterLevel::Full.percent() {
                    WaterLevel::Full
                } else {
                    WaterLevel::Empty
                }
            })
        })
        .await
    }

    /// Returns the current operating state.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    pub async fn operating_state(&self) -> Result<OperatingState, Error> {
        self.read_with(Attribute::CurrentOperatingState, |v| {
            v.as_operating_state()
        })
        .await
    }

    // ========== State ==========

    /// Returns the last known state without contacting the appliance.
    #[must_use]
    pub fn snapshot(&self) -> DeviceState {
        self.inner.state.borrow().clone()
    }

    /// Returns a receiver that yields the full state after every change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<DeviceState> {
        self.inner.state.clone()
    }

    #[must_use]
    pub fn liveness(&self) -> Liveness {
        self.inner.health.borrow().liveness
    }

    /// Returns when the last status frame was applied.
    #[must_use]
    pub fn last_status_at(&self) -> Option<DateTime<Utc>> {
        self.inner.health.borrow().last_status_at
    }

    /// Returns `true` while the worker task is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.inner.requests.is_closed()
    }
}

impl Subscribable for Dehumidifier {
    fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_state_changed(callback)
    }

    fn on_attribute_changed<F>(&self, attribute: Attribute, callback: F) -> SubscriptionId
    where
        F: Fn(AttributeValue) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_attribute_changed(attribute, callback)
    }

    fn on_stale<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.callbacks.on_stale(callback)
    }

    fn on_recovered<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.callbacks.on_recovered(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.callbacks.unsubscribe(id)
    }
}

impl std::fmt::Debug for Dehumidifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dehumidifier")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("capabilities", &self.inner.capabilities)
            .field("liveness", &self.liveness())
            .finish_non_exhaustive()
    }
}
