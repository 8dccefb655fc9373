// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for device state changes.
//!
//! Every device keeps an explicit dispatch table of typed callbacks, keyed
//! by [`SubscriptionId`]:
//!
//! - [`SubscriptionId`] - A unique identifier for a subscription, used to unsubscribe
//! - [`CallbackRegistry`] - Per-device registry that stores callbacks and dispatches events
//! - [`Subscribable`] - Trait for types that support event subscriptions
//!
//! # Usage
//!
//! ```no_run
//! use deye_bridge::subscription::Subscribable;
//! # fn example(device: deye_bridge::Dehumidifier) {
//!
//! let sub_id = device.on_state_changed(|change| {
//!     println!("{} -> {:?}", change.attribute(), change.value());
//! });
//!
//! // Later, unsubscribe
//! device.unsubscribe(sub_id);
//! # }
//! ```

mod callback;
mod subscribable;

pub use callback::{CallbackRegistry, SubscriptionId};
pub use subscribable::Subscribable;
