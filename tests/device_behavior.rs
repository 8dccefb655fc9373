// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device worker behavior tests.
//!
//! These tests drive complete devices through an in-memory transport on the
//! paused tokio clock, so timer-driven behavior runs without real sleeps.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use deye_bridge::manager::{DeviceConfig, DeviceManager};
use deye_bridge::state::{Attribute, StateChange};
use deye_bridge::subscription::Subscribable;
use deye_bridge::types::{DeviceId, FanSpeed, OperatingState, WaterLevel};
use deye_bridge::{Capabilities, Dehumidifier, Error, Liveness, ProtocolError, Timing, Transport};

const STATUS_DEV1: &str = "deye/prod1/dev1/status/hex";
const COMMAND_DEV1: &str = "deye/prod1/dev1/command/hex";
const STATUS_DEV2: &str = "deye/prod1/dev2/status/hex";

// ========== Test Transport ==========

#[derive(Default)]
struct RecordingTransport {
    published: Mutex<Vec<(String, Vec<u8>)>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    fn payloads(&self, topic: &str) -> Vec<Vec<u8>> {
        self.published
            .lock()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    fn polls(&self, topic: &str) -> usize {
        self.payloads(topic)
            .iter()
            .filter(|payload| payload.as_slice() == [0x00, 0x01])
            .count()
    }

    fn controls(&self, topic: &str) -> Vec<Vec<u8>> {
        self.payloads(topic)
            .into_iter()
            .filter(|payload| payload.len() == 10)
            .collect()
    }
}

impl Transport for RecordingTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), ProtocolError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProtocolError::ConnectionFailed(
                "broker unreachable".to_string(),
            ));
        }
        self.published.lock().push((topic.to_string(), payload));
        Ok(())
    }

    async fn subscribe(&self, _topic: &str) -> Result<(), ProtocolError> {
        Ok(())
    }
}

// ========== Helpers ==========

fn manager(timing: Timing) -> DeviceManager<RecordingTransport> {
    DeviceManager::new(RecordingTransport::default(), "deye").with_timing(timing)
}

async fn add(manager: &DeviceManager<RecordingTransport>, device_id: &str) -> Dehumidifier {
    let config = DeviceConfig::new(device_id, "prod1", device_id)
        .with_capabilities(Capabilities::full());
    manager.add_device(config).await.unwrap()
}

/// Lets spawned workers and publishers drain their queues.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Builds a status payload: powered on, dehumidifying, fan level 1, target
/// 60%, 20 degrees, 60% humidity, with the given digits replaced.
fn status_frame(overrides: &[(usize, char)]) -> Vec<u8> {
    let mut data = vec!["0".to_string(); 34];
    for (index, digit) in [
        (5, '3'),
        (7, '8'),
        (8, '1'),
        (10, '3'),
        (11, 'C'),
        (30, '3'),
        (31, 'C'),
        (32, '3'),
        (33, 'C'),
    ]
    .into_iter()
    .chain(overrides.iter().copied())
    {
        data[index] = digit.to_string();
    }
    serde_json::json!({ "data": data }).to_string().into_bytes()
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&count);
    (count, move || {
        handle.fetch_add(1, Ordering::SeqCst);
    })
}

// ========== Debounce ==========

#[tokio::test(start_paused = true)]
async fn fan_speed_burst_sends_one_frame() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;
    settle().await;

    for speed in [FanSpeed::MEDIUM, FanSpeed::LOW, FanSpeed::HIGH] {
        device.set_fan_speed(speed).await.unwrap();
        // The presentation value follows every intent
        assert_eq!(device.snapshot().fan_level(), speed.value());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(manager.transport().controls(COMMAND_DEV1).is_empty());
    }

    tokio::time::sleep(Duration::from_millis(400)).await;

    let controls = manager.transport().controls(COMMAND_DEV1);
    assert_eq!(controls.len(), 1);
    assert_eq!(controls[0][3] & 0xF0, FanSpeed::HIGH.nibble());
}

#[tokio::test(start_paused = true)]
async fn spaced_fan_speeds_each_send_a_frame() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;

    device.set_fan_speed(FanSpeed::MEDIUM).await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    device.set_fan_speed(FanSpeed::HIGH).await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    let nibbles: Vec<u8> = manager
        .transport()
        .controls(COMMAND_DEV1)
        .iter()
        .map(|frame| frame[3] & 0xF0)
        .collect();
    assert_eq!(nibbles, vec![0x20, 0x30]);
}

#[tokio::test(start_paused = true)]
async fn pending_fan_speed_stays_off_other_frames() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;

    device.set_fan_speed(FanSpeed::MEDIUM).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    device.set_locked(true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    device.set_fan_speed(FanSpeed::HIGH).await.unwrap();
    tokio::time::sleep(Duration::from_millis(700)).await;

    let controls = manager.transport().controls(COMMAND_DEV1);
    let nibbles: Vec<u8> = controls.iter().map(|frame| frame[3] & 0xF0).collect();
    assert_eq!(nibbles, vec![FanSpeed::LOW.nibble(), FanSpeed::HIGH.nibble()]);
    // The lock travels on both frames
    assert!(controls.iter().all(|frame| frame[2] == 0b0111));
    assert_eq!(device.snapshot().fan_level(), FanSpeed::HIGH.value());
}

#[tokio::test(start_paused = true)]
async fn status_during_quiet_window_sets_committed_fan_level() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;

    device.set_fan_speed(FanSpeed::HIGH).await.unwrap();
    assert!(manager.route(STATUS_DEV1, &status_frame(&[(8, '2')])));
    settle().await;
    device.set_active(true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    let nibbles: Vec<u8> = manager
        .transport()
        .controls(COMMAND_DEV1)
        .iter()
        .map(|frame| frame[3] & 0xF0)
        .collect();
    assert_eq!(nibbles, vec![FanSpeed::MEDIUM.nibble(), FanSpeed::HIGH.nibble()]);
}

#[tokio::test(start_paused = true)]
async fn other_writes_are_not_debounced() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;

    device.set_target_humidity(90).await.unwrap();
    settle().await;

    let controls = manager.transport().controls(COMMAND_DEV1);
    assert_eq!(controls.len(), 1);
    assert_eq!(controls[0][4], 80);
    assert_eq!(device.target_humidity().await.unwrap(), 80);
}

// ========== Liveness ==========

#[tokio::test(start_paused = true)]
async fn stale_device_fails_telemetry_until_next_status() {
    let manager = manager(Timing::default().with_liveness_window(5));
    let device = add(&manager, "dev1").await;
    let (stale, on_stale) = counter();
    let (recovered, on_recovered) = counter();
    device.on_stale(on_stale);
    device.on_recovered(on_recovered);

    settle().await;
    assert_eq!(device.current_humidity().await.unwrap(), 60);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(device.liveness(), Liveness::Stale);
    assert_eq!(stale.load(Ordering::SeqCst), 1);

    let err = device.current_humidity().await.unwrap_err();
    assert!(err.is_stale());
    assert!(device.is_active().await.unwrap_err().is_stale());
    assert!(device.water_level().await.unwrap_err().is_stale());

    // Settings stay readable
    assert_eq!(device.target_humidity().await.unwrap(), 60);
    assert_eq!(device.fan_speed().await.unwrap(), 1);

    // Staying silent does not fire the callback again
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(stale.load(Ordering::SeqCst), 1);
    assert!(device.last_status_at().is_none());

    assert!(manager.route(STATUS_DEV1, &status_frame(&[(32, '3'), (33, '7')])));
    settle().await;

    assert_eq!(device.liveness(), Liveness::Fresh);
    assert_eq!(recovered.load(Ordering::SeqCst), 1);
    assert_eq!(device.current_humidity().await.unwrap(), 55);
    assert!(device.last_status_at().is_some());
}

#[tokio::test(start_paused = true)]
async fn status_frames_keep_device_fresh() {
    let manager = manager(Timing::default().with_liveness_window(5));
    let device = add(&manager, "dev1").await;

    for _ in 0..4 {
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(manager.route(STATUS_DEV1, &status_frame(&[])));
        settle().await;
    }

    assert_eq!(device.liveness(), Liveness::Fresh);
    assert!(device.current_humidity().await.is_ok());
}

// ========== Status Probes ==========

#[tokio::test(start_paused = true)]
async fn every_read_requests_status() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;
    settle().await;
    assert_eq!(manager.transport().polls(COMMAND_DEV1), 1);

    device.is_active().await.unwrap();
    device.current_humidity().await.unwrap();
    settle().await;

    assert_eq!(manager.transport().polls(COMMAND_DEV1), 3);
}

#[tokio::test(start_paused = true)]
async fn poll_repeats_every_minute() {
    let manager = manager(Timing::default());
    let _device = add(&manager, "dev1").await;
    settle().await;
    assert_eq!(manager.transport().polls(COMMAND_DEV1), 1);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(manager.transport().polls(COMMAND_DEV1), 2);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(manager.transport().polls(COMMAND_DEV1), 3);
}

// ========== Status Application ==========

#[tokio::test(start_paused = true)]
async fn dehumidifier_status_overrides_fan_status() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    device.on_state_changed(move |change| sink.lock().push(*change));

    manager.route(STATUS_DEV1, &status_frame(&[(4, '4'), (7, '0')]));
    settle().await;

    assert_eq!(device.water_level().await.unwrap(), WaterLevel::Full);
    assert_eq!(device.operating_state().await.unwrap(), OperatingState::Idle);
    assert!(changes.lock().contains(&StateChange::WaterLevel(WaterLevel::Full)));

    manager.route(STATUS_DEV1, &status_frame(&[(4, '4'), (7, '8')]));
    settle().await;

    assert_eq!(
        device.operating_state().await.unwrap(),
        OperatingState::Dehumidifying
    );
}

#[tokio::test(start_paused = true)]
async fn unchanged_status_pushes_nothing() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;
    manager.route(STATUS_DEV1, &status_frame(&[(32, '3'), (33, '7')]));
    settle().await;

    let (pushed, on_change) = counter();
    device.on_state_changed(move |_| on_change());

    manager.route(STATUS_DEV1, &status_frame(&[(32, '3'), (33, '7')]));
    settle().await;
    assert_eq!(pushed.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn watch_receives_applied_state() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;
    let mut state_rx = device.watch();

    manager.route(STATUS_DEV1, &status_frame(&[(5, '7')]));
    state_rx.changed().await.unwrap();

    let state = state_rx.borrow_and_update().clone();
    assert!(state.is_active());
    assert!(state.is_locked());
}

#[tokio::test(start_paused = true)]
async fn identical_status_does_not_wake_watchers() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;
    let mut state_rx = device.watch();

    manager.route(STATUS_DEV1, &status_frame(&[(32, '3'), (33, '7')]));
    state_rx.changed().await.unwrap();
    state_rx.mark_unchanged();

    manager.route(STATUS_DEV1, &status_frame(&[(32, '3'), (33, '7')]));
    settle().await;
    assert!(!state_rx.has_changed().unwrap());
}

// ========== Intents ==========

#[tokio::test(start_paused = true)]
async fn enabling_one_mode_disables_the_other() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;

    device.set_dry_clothes_mode(true).await.unwrap();
    device.set_sleep_mode(true).await.unwrap();
    settle().await;

    let state = device.snapshot();
    assert!(state.sleep_mode());
    assert!(!state.dry_clothes_mode());

    let controls = manager.transport().controls(COMMAND_DEV1);
    assert_eq!(controls.len(), 2);
    assert_eq!(controls[0][3] & 0x0F, 0b0001);
    assert_eq!(controls[1][3] & 0x0F, 0b0110);
}

#[tokio::test(start_paused = true)]
async fn unlock_intent_clears_status_lock() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;

    manager.route(STATUS_DEV1, &status_frame(&[(5, '7')]));
    settle().await;
    assert!(device.is_locked().await.unwrap());

    // A later unlocked status frame does not clear the lock
    manager.route(STATUS_DEV1, &status_frame(&[(5, '3')]));
    settle().await;
    assert!(device.is_locked().await.unwrap());

    device.set_locked(false).await.unwrap();
    assert!(!device.is_locked().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn disabled_capability_is_rejected() {
    let manager = manager(Timing::default());
    let device = manager
        .add_device(DeviceConfig::new("Basic", "prod1", "dev1"))
        .await
        .unwrap();
    settle().await;

    let err = device.set_fan_speed(FanSpeed::HIGH).await.unwrap_err();
    assert!(matches!(
        err,
        Error::CapabilityNotSupported(Attribute::RotationSpeed)
    ));
    assert!(matches!(
        device.current_temperature().await,
        Err(Error::CapabilityNotSupported(Attribute::CurrentTemperature))
    ));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(manager.transport().controls(COMMAND_DEV1).is_empty());
    // Rejected reads do not probe
    assert_eq!(manager.transport().polls(COMMAND_DEV1), 1);
}

// ========== Isolation ==========

#[tokio::test(start_paused = true)]
async fn publish_failure_is_not_fatal() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;
    settle().await;

    manager.transport().failing.store(true, Ordering::SeqCst);
    device.set_active(false).await.unwrap();
    settle().await;
    assert!(!device.snapshot().is_active());
    assert!(manager.transport().controls(COMMAND_DEV1).is_empty());

    manager.transport().failing.store(false, Ordering::SeqCst);
    device.set_locked(true).await.unwrap();
    settle().await;

    let controls = manager.transport().controls(COMMAND_DEV1);
    assert_eq!(controls.len(), 1);
    assert_eq!(controls[0][2], 0b0110);
    assert!(device.is_running());
}

#[tokio::test(start_paused = true)]
async fn zero_periods_keep_worker_running() {
    let timing = Timing::default()
        .with_tick(Duration::ZERO)
        .with_poll_interval(Duration::ZERO);
    let manager = manager(timing);
    let device = add(&manager, "dev1").await;
    settle().await;

    assert!(device.is_running());
    assert_eq!(device.target_humidity().await.unwrap(), 60);
}

#[tokio::test(start_paused = true)]
async fn frame_from_other_product_is_ignored() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;

    assert!(!manager.route(
        "deye/prod2/dev1/status/hex",
        &status_frame(&[(32, '3'), (33, '7')])
    ));
    assert!(!manager.route(
        "other/prod1/dev1/status/hex",
        &status_frame(&[(32, '3'), (33, '7')])
    ));
    settle().await;

    assert_eq!(device.current_humidity().await.unwrap(), 60);
    assert!(device.last_status_at().is_none());
}

#[tokio::test(start_paused = true)]
async fn malformed_frame_affects_only_its_device() {
    let manager = manager(Timing::default());
    let dev1 = add(&manager, "dev1").await;
    let dev2 = add(&manager, "dev2").await;

    assert!(!manager.route(STATUS_DEV1, b"not json"));
    assert!(!manager.route(STATUS_DEV1, br#"{"data":["0","1"]}"#));
    assert!(manager.route(STATUS_DEV2, &status_frame(&[(32, '3'), (33, '7')])));
    settle().await;

    assert_eq!(dev1.snapshot().humidity_current(), 60);
    assert!(dev1.last_status_at().is_none());
    assert_eq!(dev2.current_humidity().await.unwrap(), 55);
    assert!(dev1.current_humidity().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn removed_device_stops_receiving() {
    let manager = manager(Timing::default());
    let device = add(&manager, "dev1").await;

    assert!(manager.remove_device(&DeviceId::new("dev1")).await);
    assert!(!manager.route(STATUS_DEV1, &status_frame(&[])));

    // Existing handles keep the worker alive
    assert!(device.is_running());
    assert!(device.current_humidity().await.is_ok());
}
