// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status topic routing for device workers.
//!
//! The [`TopicRouter`] hands inbound status frames to the worker of the
//! device they belong to. It holds weak senders so devices can be dropped
//! without explicit cleanup.
//!
//! # Architecture
//!
//! ```text
//! MQTT Message: deye/<productId>/<deviceId>/status/hex → {"data":[...]}
//!                     ↓
//!             TopicRouter.route()
//!                     ↓
//!     Lookup <deviceId> in subscribers, compare full topic
//!                     ↓
//!        StatusSnapshot::decode(payload)
//!                     ↓
//!     WeakSender<Request>.upgrade().try_send(Status)
//!                     ↓
//!           Device worker applies the snapshot
//! ```

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::device::Request;
use crate::protocol::DeviceTopics;
use crate::telemetry::StatusSnapshot;
use crate::types::DeviceId;

/// Routes status frames to device workers.
///
/// A frame that fails to decode is logged and dropped; it never reaches the
/// worker and has no effect on other devices.
#[derive(Debug, Default)]
pub struct TopicRouter {
    /// Map from device identifier to its status topic and worker inbox.
    subscribers: RwLock<HashMap<DeviceId, Route>>,
}

#[derive(Debug)]
struct Route {
    status_topic: String,
    inbox: mpsc::WeakSender<Request>,
}

impl TopicRouter {
    /// Creates a new empty topic router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device worker for the given device.
    ///
    /// Only frames on `topics.status()` reach the worker. If a previous
    /// registration exists for this device, it will be replaced.
    pub(crate) fn register(
        &self,
        device_id: DeviceId,
        topics: &DeviceTopics,
        inbox: &mpsc::Sender<Request>,
    ) {
        tracing::debug!(
            device = %device_id,
            topic = %topics.status(),
            "Registering device for routing"
        );
        self.subscribers.write().insert(
            device_id,
            Route {
                status_topic: topics.status().to_string(),
                inbox: inbox.downgrade(),
            },
        );
    }

    /// Unregisters a device from routing.
    ///
    /// Returns `true` if the device was previously registered.
    pub fn unregister(&self, device_id: &DeviceId) -> bool {
        tracing::debug!(device = %device_id, "Unregistering device from routing");
        self.subscribers.write().remove(device_id).is_some()
    }

    /// Routes an inbound message to the device it belongs to.
    ///
    /// The topic must have the shape `<endpoint>/<productId>/<deviceId>/status/hex`.
    ///
    /// Returns `true` if a snapshot was delivered to a device worker.
    pub fn route(&self, topic: &str, payload: &[u8]) -> bool {
        let Some(parsed) = ParsedTopic::parse(topic) else {
            tracing::trace!(topic = %topic, "Ignoring non-status topic");
            return false;
        };

        let inbox = {
            let subscribers = self.subscribers.read();
            subscribers
                .get(parsed.device_id)
                .filter(|route| route.status_topic == topic)
                .and_then(|route| route.inbox.upgrade())
        };

        let Some(inbox) = inbox else {
            tracing::trace!(
                topic = %topic,
                endpoint = %parsed.endpoint,
                product = %parsed.product_id,
                device = %parsed.device_id,
                "No registered device for topic"
            );
            return false;
        };

        let snapshot = match StatusSnapshot::decode(payload) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    endpoint = %parsed.endpoint,
                    product = %parsed.product_id,
                    device = %parsed.device_id,
                    error = %e,
                    "Discarding undecodable status frame"
                );
                return false;
            }
        };

        match inbox.try_send(Request::Status(snapshot)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(device = %parsed.device_id, "Device inbox full, dropping status frame");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(device = %parsed.device_id, "Device worker has stopped");
                false
            }
        }
    }

    /// Removes entries of devices whose worker has stopped.
    pub fn cleanup(&self) {
        self.subscribers.write().retain(|device_id, route| {
            let alive = route.inbox.strong_count() > 0;
            if !alive {
                tracing::debug!(device = %device_id, "Cleaning up dropped device");
            }
            alive
        });
    }

    /// Returns the number of registered devices.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Returns the number of devices whose worker is still running.
    #[must_use]
    pub fn active_device_count(&self) -> usize {
        self.subscribers
            .read()
            .values()
            .filter(|route| route.inbox.strong_count() > 0)
            .count()
    }
}

/// Components of a status topic.
#[derive(Debug, PartialEq, Eq)]
struct ParsedTopic<'a> {
    /// Everything before the product identifier; may contain slashes.
    endpoint: &'a str,
    product_id: &'a str,
    device_id: &'a str,
}

impl<'a> ParsedTopic<'a> {
    /// Parses `<endpoint>/<productId>/<deviceId>/status/hex` from the right.
    fn parse(topic: &'a str) -> Option<Self> {
        let mut parts = topic.rsplitn(5, '/');
        let (Some("hex"), Some("status"), Some(device_id), Some(product_id), Some(endpoint)) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return None;
        };

        Some(Self {
            endpoint,
            product_id,
            device_id,
        })
    }
}
