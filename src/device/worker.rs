// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device actor owning the state, liveness countdown and debouncer.

use std::future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant};

use crate::command::{Command, ControlFrame};
use crate::error::{DeviceError, Error};
use crate::protocol::Transport;
use crate::state::{Attribute, AttributeValue, DeviceState, StateChange};
use crate::subscription::CallbackRegistry;
use crate::telemetry::StatusSnapshot;
use crate::types::{DeviceId, FanSpeed};

use super::{CommandDebouncer, Liveness, LivenessTracker, Timing};

/// Message handled by a device worker.
#[derive(Debug)]
pub(crate) enum Request {
    /// A decoded status frame for this device.
    Status(StatusSnapshot),
    /// A presentation-layer read.
    Read {
        attribute: Attribute,
        reply: oneshot::Sender<Result<AttributeValue, Error>>,
    },
    /// A presentation-layer write.
    Write {
        attribute: Attribute,
        value: AttributeValue,
        reply: oneshot::Sender<Result<(), Error>>,
    },
}

/// Liveness as published to device handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DeviceHealth {
    pub(crate) liveness: Liveness,
    pub(crate) last_status_at: Option<DateTime<Utc>>,
}

/// The single writer of one device's state.
pub(crate) struct Worker {
    id: DeviceId,
    state: DeviceState,
    liveness: LivenessTracker,
    debouncer: CommandDebouncer<FanSpeed>,
    /// Fan level carried by control frames; trails `state` while a fan speed is pending.
    committed_fan_level: u8,
    callbacks: Arc<CallbackRegistry>,
    state_tx: watch::Sender<DeviceState>,
    health_tx: watch::Sender<DeviceHealth>,
    outbox: mpsc::Sender<Command>,
    timing: Timing,
}

impl Worker {
    pub(crate) fn new(
        id: DeviceId,
        callbacks: Arc<CallbackRegistry>,
        outbox: mpsc::Sender<Command>,
        timing: Timing,
    ) -> (Self, watch::Receiver<DeviceState>, watch::Receiver<DeviceHealth>) {
        let state = DeviceState::new();
        let liveness = LivenessTracker::new(timing.liveness_window());
        let (state_tx, state_rx) = watch::channel(state.clone());
        let (health_tx, health_rx) = watch::channel(DeviceHealth {
            liveness: liveness.liveness(),
            last_status_at: None,
        });

        let committed_fan_level = state.fan_level();
        let worker = Self {
            id,
            state,
            liveness,
            debouncer: CommandDebouncer::new(timing.debounce_quiet()),
            committed_fan_level,
            callbacks,
            state_tx,
            health_tx,
            outbox,
            timing,
        };

        (worker, state_rx, health_rx)
    }

    /// Runs until every sender of `inbox` is dropped.
    ///
    /// The poll interval fires immediately, so the first status request goes
    /// out as soon as the worker starts.
    pub(crate) async fn run(mut self, mut inbox: mpsc::Receiver<Request>) {
        let mut tick = time::interval_at(Instant::now() + self.timing.tick(), self.timing.tick());
        let mut poll = time::interval(self.timing.poll_interval());

        loop {
            let deadline = self.debouncer.deadline();

            tokio::select! {
                request = inbox.recv() => match request {
                    Some(request) => self.handle(request),
                    None => break,
                },
                _ = tick.tick() => self.on_tick(),
                _ = poll.tick() => {
                    tracing::info!(device = %self.id, "Requesting status");
                    self.send(Command::Poll);
                }
                () = sleep_until(deadline) => self.flush_fan_speed(),
            }
        }

        if self.debouncer.cancel().is_some() {
            tracing::debug!(device = %self.id, "Discarding pending fan speed on shutdown");
        }
        tracing::debug!(device = %self.id, "Device worker stopped");
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Status(snapshot) => self.on_status(&snapshot),
            Request::Read { attribute, reply } => {
                let _ = reply.send(self.read(attribute));
            }
            Request::Write {
                attribute,
                value,
                reply,
            } => {
                let _ = reply.send(self.write(attribute, value));
            }
        }
    }

    // ========== Inbound ==========

    fn on_status(&mut self, snapshot: &StatusSnapshot) {
        tracing::debug!(device = %self.id, ?snapshot, "Applying status snapshot");

        let changes = self.state.apply_snapshot(snapshot);
        self.committed_fan_level = self.state.fan_level();
        self.publish_changes(&changes);

        let recovered = self.liveness.reset();
        self.health_tx.send_replace(DeviceHealth {
            liveness: Liveness::Fresh,
            last_status_at: Some(Utc::now()),
        });

        if recovered {
            tracing::info!(device = %self.id, "Device responding again");
            self.callbacks.dispatch_recovered();
        }
    }

    fn on_tick(&mut self) {
        if self.liveness.tick() {
            tracing::info!(device = %self.id, "status poll timeout");
            self.health_tx
                .send_modify(|health| health.liveness = Liveness::Stale);
            self.callbacks.dispatch_stale();
        }
    }

    // ========== Presentation ==========

    fn read(&mut self, attribute: Attribute) -> Result<AttributeValue, Error> {
        self.send(Command::Poll);

        if attribute.is_telemetry() && self.liveness.is_stale() {
            tracing::debug!(device = %self.id, %attribute, "Rejecting read of stale device");
            return Err(DeviceError::Stale {
                device_id: self.id.clone(),
            }
            .into());
        }

        let value = self.state.value(attribute);
        tracing::debug!(device = %self.id, %attribute, ?value, "Read attribute");
        Ok(value)
    }

    fn write(&mut self, attribute: Attribute, value: AttributeValue) -> Result<(), Error> {
        let changes = StateChange::from_intent(attribute, value)?;
        tracing::debug!(device = %self.id, %attribute, ?value, "Write attribute");

        let applied: Vec<StateChange> = changes
            .into_iter()
            .filter(|change| self.state.apply(change))
            .collect();
        self.publish_changes(&applied);

        if attribute == Attribute::RotationSpeed {
            if let Some(speed) = self.state.fan_speed() {
                self.debouncer.push(speed, Instant::now());
            }
        } else {
            self.send_control();
        }

        Ok(())
    }

    fn flush_fan_speed(&mut self) {
        let Some(speed) = self.debouncer.take_due(Instant::now()) else {
            return;
        };

        // A status frame may have overwritten the level during the quiet window
        let change = StateChange::FanSpeed(speed.value());
        if self.state.apply(&change) {
            self.publish_changes(&[change]);
        }
        self.committed_fan_level = speed.value();
        self.send_control();
    }

    // ========== Outbound ==========

    fn publish_changes(&self, changes: &[StateChange]) {
        if changes.is_empty() {
            return;
        }
        for change in changes {
            self.callbacks.dispatch(change);
        }
        self.state_tx.send_replace(self.state.clone());
    }

    /// Encodes the current state with the committed fan level.
    fn send_control(&self) {
        let frame = if self.state.fan_level() == self.committed_fan_level {
            ControlFrame::from_state(&self.state)
        } else {
            let mut wire = self.state.clone();
            wire.apply(&StateChange::FanSpeed(self.committed_fan_level));
            ControlFrame::from_state(&wire)
        };
        self.send(Command::Control(frame));
    }

    fn send(&self, command: Command) {
        match self.outbox.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(device = %self.id, "Outbound queue full, dropping frame");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(device = %self.id, "Publisher has stopped");
            }
        }
    }
}

/// Sleeps until `deadline`, or forever when nothing is scheduled.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

/// Drains a device outbox into the transport.
///
/// Publish failures are logged and the frame is dropped; the periodic poll
/// retries the appliance.
pub(crate) async fn publish_loop<T: Transport>(
    transport: Arc<T>,
    topic: String,
    device_id: DeviceId,
    mut outbox: mpsc::Receiver<Command>,
) {
    while let Some(command) = outbox.recv().await {
        tracing::debug!(device = %device_id, ?command, "Publishing command");
        if let Err(e) = transport.publish(&topic, command.payload()).await {
            tracing::warn!(
                device = %device_id,
                topic = %topic,
                error = %e,
                "Failed to publish command"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::command::POLL_REQUEST;

    fn worker(timing: Timing) -> (Worker, mpsc::Receiver<Command>) {
        let (outbox, commands) = mpsc::channel(16);
        let (worker, _, _) = Worker::new(
            DeviceId::new("dev1"),
            Arc::new(CallbackRegistry::new()),
            outbox,
            timing,
        );
        (worker, commands)
    }

    fn snapshot() -> StatusSnapshot {
        let mut data = ["0"; 34];
        data[5] = "3";
        data[7] = "8";
        data[8] = "2";
        StatusSnapshot::from_digits(&data).unwrap()
    }

    #[tokio::test]
    async fn read_sends_probe_first() {
        let (mut worker, mut commands) = worker(Timing::default());

        let value = worker.read(Attribute::Active).unwrap();
        assert_eq!(value, AttributeValue::Bool(true));
        assert_eq!(commands.try_recv().unwrap().payload(), POLL_REQUEST.to_vec());
    }

    #[tokio::test]
    async fn stale_read_still_probes() {
        let (mut worker, mut commands) = worker(Timing::default().with_liveness_window(1));
        worker.on_tick();

        let err = worker.read(Attribute::CurrentRelativeHumidity).unwrap_err();
        assert!(err.is_stale());
        assert!(commands.try_recv().unwrap().is_poll());

        // Settings stay readable
        assert!(worker.read(Attribute::TargetHumidity).is_ok());
    }

    #[tokio::test]
    async fn status_refreshes_stale_device() {
        let (mut worker, _commands) = worker(Timing::default().with_liveness_window(1));
        worker.on_tick();
        assert!(worker.liveness.is_stale());

        worker.on_status(&snapshot());
        assert!(!worker.liveness.is_stale());
        assert_eq!(worker.health_tx.borrow().liveness, Liveness::Fresh);
        assert!(worker.health_tx.borrow().last_status_at.is_some());
        assert_eq!(
            worker.read(Attribute::RotationSpeed).unwrap(),
            AttributeValue::Speed(2)
        );
    }

    #[tokio::test]
    async fn write_sends_control_frame() {
        let (mut worker, mut commands) = worker(Timing::default());
        worker
            .write(Attribute::TargetHumidity, AttributeValue::Percent(90))
            .unwrap();

        assert_eq!(worker.state.humidity_target(), 80);
        let Command::Control(frame) = commands.try_recv().unwrap() else {
            panic!("expected control frame");
        };
        assert_eq!(frame.as_bytes()[4], 80);
    }

    #[tokio::test(start_paused = true)]
    async fn fan_speed_is_debounced() {
        let (mut worker, mut commands) = worker(Timing::default());
        worker
            .write(Attribute::RotationSpeed, AttributeValue::Speed(3))
            .unwrap();

        assert_eq!(worker.state.fan_level(), 3);
        assert!(commands.try_recv().is_err());

        time::advance(Duration::from_millis(500)).await;
        worker.flush_fan_speed();
        assert!(matches!(commands.try_recv(), Ok(Command::Control(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_fan_level_is_not_encoded() {
        let (mut worker, mut commands) = worker(Timing::default());
        worker
            .write(Attribute::RotationSpeed, AttributeValue::Speed(2))
            .unwrap();
        worker
            .write(Attribute::LockPhysicalControls, AttributeValue::Bool(true))
            .unwrap();

        let Command::Control(frame) = commands.try_recv().unwrap() else {
            panic!("expected control frame");
        };
        assert_eq!(frame.as_bytes()[3] & 0xF0, FanSpeed::LOW.nibble());
        assert_eq!(worker.state.fan_level(), 2);
        assert_eq!(worker.committed_fan_level, 1);
    }

    #[tokio::test]
    async fn read_only_write_is_rejected() {
        let (mut worker, mut commands) = worker(Timing::default());
        let err = worker
            .write(Attribute::WaterLevel, AttributeValue::Percent(0))
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Device(DeviceError::ReadOnly(Attribute::WaterLevel))
        ));
        assert!(commands.try_recv().is_err());
    }
}
