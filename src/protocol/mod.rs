// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport plumbing between the broker and device workers.
//!
//! # Components
//!
//! - [`Transport`]: publish/subscribe seam the device workers talk through
//! - [`DeviceTopics`]: status and command topics of one appliance
//! - [`TopicRouter`]: per-device dispatch table for inbound status frames
//! - [`MqttBroker`]: `rumqttc`-backed transport (feature `mqtt`)

#[cfg(feature = "mqtt")]
mod mqtt_broker;
mod topic_router;

#[cfg(feature = "mqtt")]
pub use mqtt_broker::{MqttBroker, MqttBrokerBuilder};
pub use topic_router::TopicRouter;

use std::future::Future;

use crate::error::ProtocolError;
use crate::types::DeviceId;

/// Publish/subscribe transport carrying device frames.
///
/// Implementations must deliver every inbound status frame to a
/// [`TopicRouter`]; how they do that is up to them. Failures are reported
/// to the caller, which logs them and carries on: the next periodic poll
/// retries the appliance.
pub trait Transport: Send + Sync + 'static {
    /// Publishes a raw payload.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the payload could not be handed to the broker.
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), ProtocolError>> + Send;

    /// Subscribes to a topic.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the subscription request fails.
    fn subscribe(&self, topic: &str) -> impl Future<Output = Result<(), ProtocolError>> + Send;
}

/// Status and command topics of one appliance.
///
/// # Examples
///
/// ```
/// use deye_bridge::protocol::DeviceTopics;
/// use deye_bridge::types::DeviceId;
///
/// let topics = DeviceTopics::new("deye", "prod1", &DeviceId::new("dev1"));
/// assert_eq!(topics.status(), "deye/prod1/dev1/status/hex");
/// assert_eq!(topics.command(), "deye/prod1/dev1/command/hex");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTopics {
    status: String,
    command: String,
}

impl DeviceTopics {
    /// Builds the topics for `<endpoint>/<product_id>/<device_id>`.
    #[must_use]
    pub fn new(endpoint: &str, product_id: &str, device_id: &DeviceId) -> Self {
        let base = format!("{endpoint}/{product_id}/{device_id}");
        Self {
            status: format!("{base}/status/hex"),
            command: format!("{base}/command/hex"),
        }
    }

    /// Returns the inbound status topic.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the outbound command topic.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_may_contain_slashes() {
        let topics = DeviceTopics::new("eu/deye", "p", &DeviceId::new("d"));
        assert_eq!(topics.status(), "eu/deye/p/d/status/hex");
        assert_eq!(topics.command(), "eu/deye/p/d/command/hex");
    }
}
