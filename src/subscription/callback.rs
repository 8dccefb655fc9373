// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for device state subscriptions.
//!
//! This module provides the core types for managing subscription callbacks:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Per-device registry for storing and dispatching callbacks

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::state::{Attribute, AttributeValue, StateChange};

/// Unique identifier for a subscription.
///
/// This ID is returned when creating a subscription and can be used to
/// unsubscribe later. IDs are unique within a device's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a new subscription ID with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Callback receiving every state change.
type StateChangedCallback = Arc<dyn Fn(&StateChange) + Send + Sync>;

/// Callback receiving the new value of one attribute.
type AttributeCallback = (Attribute, Arc<dyn Fn(AttributeValue) + Send + Sync>);

/// Callback for liveness transitions.
type LivenessCallback = Arc<dyn Fn() + Send + Sync>;

/// Registry for managing device subscription callbacks.
///
/// Each device owns one registry. The device worker dispatches into it after
/// every applied snapshot or intent and on liveness transitions. It uses
/// `parking_lot::RwLock` so registration from any task never blocks the
/// worker for long.
pub struct CallbackRegistry {
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
    /// Generic state change callbacks (receives all changes).
    state_changed_callbacks: RwLock<HashMap<SubscriptionId, StateChangedCallback>>,
    /// Callbacks filtered to a single attribute.
    attribute_callbacks: RwLock<HashMap<SubscriptionId, AttributeCallback>>,
    /// Called when the device stops responding.
    stale_callbacks: RwLock<HashMap<SubscriptionId, LivenessCallback>>,
    /// Called when a stale device reports again.
    recovered_callbacks: RwLock<HashMap<SubscriptionId, LivenessCallback>>,
}

impl CallbackRegistry {
    /// Creates a new empty callback registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            state_changed_callbacks: RwLock::new(HashMap::new()),
            attribute_callbacks: RwLock::new(HashMap::new()),
            stale_callbacks: RwLock::new(HashMap::new()),
            recovered_callbacks: RwLock::new(HashMap::new()),
        }
    }

    /// Generates a new unique subscription ID.
    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // =========================================================================
    // Registration methods
    // =========================================================================

    /// Registers a callback for all state changes.
    pub fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.state_changed_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for changes of a single attribute.
    ///
    /// This is the "push value" sink of a presentation layer: the callback
    /// receives the new value whenever the attribute moves.
    pub fn on_attribute_changed<F>(&self, attribute: Attribute, callback: F) -> SubscriptionId
    where
        F: Fn(AttributeValue) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.attribute_callbacks
            .write()
            .insert(id, (attribute, Arc::new(callback)));
        id
    }

    /// Registers a callback for when the device stops responding.
    pub fn on_stale<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.stale_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for when a stale device reports again.
    pub fn on_recovered<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.recovered_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    // =========================================================================
    // Unsubscription
    // =========================================================================

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state_changed_callbacks.write().remove(&id).is_some()
            || self.attribute_callbacks.write().remove(&id).is_some()
            || self.stale_callbacks.write().remove(&id).is_some()
            || self.recovered_callbacks.write().remove(&id).is_some()
    }

    /// Clears all callbacks.
    pub fn clear(&self) {
        self.state_changed_callbacks.write().clear();
        self.attribute_callbacks.write().clear();
        self.stale_callbacks.write().clear();
        self.recovered_callbacks.write().clear();
    }

    // =========================================================================
    // Dispatch methods
    // =========================================================================

    /// Dispatches a state change to relevant callbacks.
    ///
    /// Callbacks are cloned out of the maps before they run, so a callback
    /// may subscribe or unsubscribe without deadlocking.
    pub fn dispatch(&self, change: &StateChange) {
        let generic: Vec<_> = self.state_changed_callbacks.read().values().cloned().collect();
        for callback in generic {
            callback(change);
        }

        let attribute = change.attribute();
        let value = change.value();
        let filtered: Vec<_> = self
            .attribute_callbacks
            .read()
            .values()
            .filter(|(a, _)| *a == attribute)
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in filtered {
            callback(value);
        }
    }

    /// Dispatches the stale event.
    pub fn dispatch_stale(&self) {
        let callbacks: Vec<_> = self.stale_callbacks.read().values().cloned().collect();
        for callback in callbacks {
            callback();
        }
    }

    /// Dispatches the recovered event.
    pub fn dispatch_recovered(&self) {
        let callbacks: Vec<_> = self.recovered_callbacks.read().values().cloned().collect();
        for callback in callbacks {
            callback();
        }
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.state_changed_callbacks.read().len()
            + self.attribute_callbacks.read().len()
            + self.stale_callbacks.read().len()
            + self.recovered_callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}
