//! IMU and fused pipelines over a connection-oriented transport

use smart_insole::config::PipelineConfig;
use smart_insole::events::Vector3D;
use smart_insole::gatt::IMU_CHARACTERISTIC_UUID;
use smart_insole::record::{decode, RecordLayout};
use smart_insole::scheduler::{PublicationScheduler, PublishEvent, SchedulerStatus, TickReport};
use smart_insole::transport::{NotifyTransport, PeerFlag};

use crate::common::{MockAdc, MockGatt, MockImu, MockTransport, PINS};

#[test]
fn no_peer_means_no_work() {
    let peer = PeerFlag::new();
    let imu = MockImu::new();
    let transport = MockTransport::connection_oriented(peer.clone());
    let mut scheduler = PublicationScheduler::new(
        PipelineConfig::motion_notify(),
        MockAdc::new(),
        imu.clone(),
        transport.clone(),
    )
    .unwrap();

    for now in (0..250).step_by(10) {
        assert_eq!(scheduler.tick(now), TickReport::AwaitingPeer);
    }
    assert_eq!(transport.send_calls(), 0);
    assert_eq!(imu.reads(), 0);
    assert_eq!(scheduler.state().last_publish_ms, 0);
    // Boundaries at 100 and 200 passed unsent, one skip each.
    assert_eq!(scheduler.stats().publish_skips, 2);
    assert_eq!(scheduler.state().next_publish_ms, 300);

    // Reconnecting between boundaries does not publish straight away.
    peer.set_connected(true);
    match scheduler.tick(250) {
        TickReport::Ran { motion_updated, publish, .. } => {
            assert!(motion_updated);
            assert_eq!(publish, PublishEvent::NotDue);
        }
        other => panic!("unexpected {other:?}"),
    }
    for now in (260..300).step_by(10) {
        scheduler.tick(now);
    }
    assert_eq!(transport.send_calls(), 0);

    match scheduler.tick(300) {
        TickReport::Ran { publish, .. } => assert_eq!(publish, PublishEvent::Sent { len: 24 }),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(scheduler.state().last_publish_ms, 300);
    assert_eq!(scheduler.state().next_publish_ms, 400);
}

#[test]
fn missed_boundary_waits_for_the_next_one() {
    let peer = PeerFlag::new();
    let transport = MockTransport::connection_oriented(peer.clone());
    let config = PipelineConfig {
        sample_while_disconnected: true,
        ..PipelineConfig::motion_notify()
    };
    let imu = MockImu::new();
    let mut scheduler =
        PublicationScheduler::new(config, MockAdc::new(), imu.clone(), transport.clone()).unwrap();

    let mut attempts = Vec::new();
    for now in (0..=190).step_by(10) {
        if let TickReport::Ran { publish, .. } = scheduler.tick(now) {
            if publish != PublishEvent::NotDue {
                attempts.push((now, publish));
            }
        }
    }
    assert_eq!(attempts, [(100, PublishEvent::NoPeer)]);
    assert!(imu.reads() > 0);
    assert_eq!(transport.send_calls(), 0);
    assert_eq!(scheduler.stats().publish_skips, 1);
    assert_eq!(scheduler.state().last_publish_ms, 0);
    assert_eq!(scheduler.state().next_publish_ms, 200);

    peer.set_connected(true);
    scheduler.tick(200);
    assert_eq!(transport.sent().len(), 1);
    assert_eq!(scheduler.state().last_publish_ms, 200);
}

#[test]
fn late_tick_keeps_boundary_grid() {
    let transport = MockTransport::connection_oriented(PeerFlag::new());
    let config = PipelineConfig {
        sample_while_disconnected: true,
        ..PipelineConfig::motion_notify()
    };
    let mut scheduler =
        PublicationScheduler::new(config, MockAdc::new(), MockImu::new(), transport).unwrap();

    scheduler.start(0);
    // A tick 250 ms late counts one skip and the next boundary stays on the
    // 100 ms grid.
    scheduler.tick(350);
    assert_eq!(scheduler.stats().publish_skips, 1);
    assert_eq!(scheduler.state().next_publish_ms, 400);
}

#[test]
fn publish_boundary_survives_timer_wrap() {
    let peer = PeerFlag::new();
    peer.set_connected(true);
    let transport = MockTransport::connection_oriented(peer);
    let mut scheduler = PublicationScheduler::new(
        PipelineConfig::motion_notify(),
        MockAdc::new(),
        MockImu::new(),
        transport.clone(),
    )
    .unwrap();

    scheduler.start(u32::MAX - 49);
    assert_eq!(scheduler.state().next_publish_ms, 50);
    scheduler.tick(u32::MAX - 9);
    scheduler.tick(40);
    assert_eq!(transport.send_calls(), 0);
    scheduler.tick(50);
    assert_eq!(transport.send_calls(), 1);
}

#[test]
fn unsubscribed_peer_is_a_write_failure() {
    let gatt = MockGatt::new();
    gatt.unsubscribe(IMU_CHARACTERISTIC_UUID);
    let peer = PeerFlag::new();
    peer.set_connected(true);
    let transport = NotifyTransport::new(gatt.clone(), peer, IMU_CHARACTERISTIC_UUID, true);
    let mut scheduler = PublicationScheduler::new(
        PipelineConfig::motion_notify(),
        MockAdc::new(),
        MockImu::new(),
        transport,
    )
    .unwrap();

    let mut failed_at = Vec::new();
    for now in (0..=250).step_by(10) {
        if let TickReport::Ran { publish: PublishEvent::WriteFailed, .. } = scheduler.tick(now) {
            failed_at.push(now);
        }
    }
    assert_eq!(failed_at, [100, 200]);
    assert_eq!(scheduler.stats().write_failures, 2);
    assert!(gatt.notifications().is_empty());
}

#[test]
fn disconnect_stops_publishing_again() {
    let peer = PeerFlag::new();
    peer.set_connected(true);
    let transport = MockTransport::connection_oriented(peer.clone());
    let mut scheduler = PublicationScheduler::new(
        PipelineConfig::motion_notify(),
        MockAdc::new(),
        MockImu::new(),
        transport.clone(),
    )
    .unwrap();

    for now in (0..=200).step_by(10) {
        scheduler.tick(now);
    }
    assert_eq!(transport.sent().len(), 2);

    peer.set_connected(false);
    for now in (210..=500).step_by(10) {
        assert_eq!(scheduler.tick(now), TickReport::AwaitingPeer);
    }
    assert_eq!(transport.sent().len(), 2);
}

#[test]
fn latest_motion_is_published() {
    let peer = PeerFlag::new();
    peer.set_connected(true);
    let imu = MockImu::new();
    let transport = MockTransport::connection_oriented(peer);
    let mut scheduler = PublicationScheduler::new(
        PipelineConfig::motion_notify(),
        MockAdc::new(),
        imu.clone(),
        transport.clone(),
    )
    .unwrap();

    // IMU polled at 0, 30, 60 and 90; publish at 100.
    for now in (0..90).step_by(10) {
        scheduler.tick(now);
    }
    imu.set_motion(Vector3D::new(0.25, -0.5, 0.75), Vector3D::new(10.0, 20.0, 30.0));
    scheduler.tick(90);
    scheduler.tick(100);

    let sent = transport.sent();
    let motion = sent[0].reading().motion.unwrap();
    assert_eq!(motion.axes(), [0.25, -0.5, 0.75, 10.0, 20.0, 30.0]);
}

#[test]
fn stale_imu_keeps_previous_motion() {
    let peer = PeerFlag::new();
    peer.set_connected(true);
    let imu = MockImu::new();
    imu.set_available(false);
    let mut scheduler = PublicationScheduler::new(
        PipelineConfig::motion_notify(),
        MockAdc::new(),
        imu.clone(),
        MockTransport::connection_oriented(peer),
    )
    .unwrap();

    match scheduler.tick(0) {
        TickReport::Ran { motion_updated, .. } => assert!(!motion_updated),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(imu.reads(), 0);
    assert_eq!(scheduler.current_record().motion.unwrap().axes(), [0.0; 6]);
}

#[test]
fn imu_failure_halts_before_any_sampling() {
    let adc = MockAdc::new();
    for pin in PINS {
        adc.set(pin, 1000);
    }
    let imu = MockImu::failing();
    let peer = PeerFlag::new();
    peer.set_connected(true);
    let transport = MockTransport::connection_oriented(peer);
    let mut scheduler = PublicationScheduler::new(
        PipelineConfig::fused_notify(),
        adc.clone(),
        imu.clone(),
        transport.clone(),
    )
    .unwrap();

    for now in (0..2000).step_by(10) {
        assert_eq!(scheduler.tick(now), TickReport::Halted);
    }
    assert_eq!(scheduler.status(), SchedulerStatus::Halted);
    assert!(!imu.began());
    assert!(adc.reads().is_empty());
    assert_eq!(transport.send_calls(), 0);
}

#[test]
fn fused_record_over_gatt() {
    let adc = MockAdc::new();
    for pin in PINS {
        adc.set(pin, 2048);
    }
    let imu = MockImu::new();
    imu.set_motion(Vector3D::new(0.0, 0.0, 1.0), Vector3D::new(1.0, 2.0, 3.0));

    let gatt = MockGatt::new();
    let peer = PeerFlag::new();
    peer.set_connected(true);
    let config = PipelineConfig {
        record_layout: RecordLayout::Timestamped,
        ..PipelineConfig::fused_notify()
    };
    let shape = config.record_shape();
    let transport = NotifyTransport::new(gatt.clone(), peer, IMU_CHARACTERISTIC_UUID, false);
    let mut scheduler = PublicationScheduler::new(config, adc, imu, transport).unwrap();

    assert_eq!(scheduler.start(0), SchedulerStatus::Running);
    for now in (0..=1000).step_by(10) {
        scheduler.tick(now);
    }

    let sent = gatt.notifications();
    assert_eq!(sent.len(), 1);
    let (uuid, bytes) = &sent[0];
    assert_eq!(*uuid, IMU_CHARACTERISTIC_UUID);
    assert_eq!(bytes.len(), 40);

    let (timestamp, reading) = decode(bytes, shape).unwrap();
    assert_eq!(timestamp, Some(1000));
    let force = scheduler.calibration().force(2048);
    assert_eq!(reading.forces.as_slice(), &[force; 3]);
    assert_eq!(reading.motion.unwrap().axes(), [0.0, 0.0, 1.0, 1.0, 2.0, 3.0]);
}
