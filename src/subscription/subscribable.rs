// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for devices that push state changes.

use crate::state::{Attribute, AttributeValue, StateChange};
use crate::subscription::SubscriptionId;

/// Trait for types that support event subscriptions.
///
/// Callbacks run on the device worker; they should return quickly and must
/// not await the device they are registered on.
///
/// # Examples
///
/// ```no_run
/// use deye_bridge::subscription::Subscribable;
/// use deye_bridge::state::Attribute;
/// # fn example(device: deye_bridge::Dehumidifier) {
///
/// // Push water level changes to the presentation layer
/// let sub_id = device.on_attribute_changed(Attribute::WaterLevel, |value| {
///     println!("Water level: {value:?}");
/// });
///
/// device.on_stale(|| println!("Device is not responding"));
///
/// // Unsubscribe when no longer needed
/// device.unsubscribe(sub_id);
/// # }
/// ```
pub trait Subscribable {
    /// Subscribes to all state changes.
    ///
    /// The callback receives one change per attribute whose value moved.
    fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChange) + Send + Sync + 'static;

    /// Subscribes to changes of one attribute.
    fn on_attribute_changed<F>(&self, attribute: Attribute, callback: F) -> SubscriptionId
    where
        F: Fn(AttributeValue) + Send + Sync + 'static;

    /// Subscribes to the device going stale (no status within the liveness window).
    fn on_stale<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static;

    /// Subscribes to a stale device reporting again.
    fn on_recovered<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static;

    /// Unsubscribes a callback by its subscription ID.
    ///
    /// Returns `true` if the subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
