//! Mock collaborators for testing the pipeline
//!
//! Each mock keeps its state behind `Rc<RefCell<..>>` so a test can hand one
//! clone to the scheduler and keep another to script inputs and inspect what
//! happened.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use smart_insole::drivers::{AdcReader, ImuSource};
use smart_insole::error::{DriverError, TransportError};
use smart_insole::events::Vector3D;
use smart_insole::record::PublishRecord;
use smart_insole::scheduler::Clock;
use smart_insole::transport::{GattServer, PeerFlag, TransportPublisher};

// ---------------------------------------------------------------------------
// ADC
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct AdcState {
    /// Scripted codes per pin; the last one repeats once the queue drains.
    scripts: HashMap<u8, VecDeque<u16>>,
    failing_pins: Vec<u8>,
    reads: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct MockAdc {
    state: Rc<RefCell<AdcState>>,
}

impl MockAdc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every read of `pin` returns `raw`.
    pub fn set(&self, pin: u8, raw: u16) {
        self.script(pin, &[raw]);
    }

    pub fn script(&self, pin: u8, codes: &[u16]) {
        self.state
            .borrow_mut()
            .scripts
            .insert(pin, codes.iter().copied().collect());
    }

    pub fn fail(&self, pin: u8) {
        self.state.borrow_mut().failing_pins.push(pin);
    }

    /// Pins read so far, in order.
    pub fn reads(&self) -> Vec<u8> {
        self.state.borrow().reads.clone()
    }
}

impl AdcReader for MockAdc {
    fn read_raw(&mut self, pin: u8) -> Result<u16, DriverError> {
        let mut state = self.state.borrow_mut();
        state.reads.push(pin);
        if state.failing_pins.contains(&pin) {
            return Err(DriverError::Adc { pin, code: -1 });
        }
        let queue = state
            .scripts
            .get_mut(&pin)
            .ok_or(DriverError::UnsupportedPin(pin))?;
        let raw = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().copied()
        };
        raw.ok_or(DriverError::UnsupportedPin(pin))
    }
}

// ---------------------------------------------------------------------------
// IMU
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ImuState {
    begin_fails: bool,
    began: bool,
    available: bool,
    acceleration: Vector3D,
    gyroscope: Vector3D,
    reads: usize,
}

#[derive(Debug, Clone)]
pub struct MockImu {
    state: Rc<RefCell<ImuState>>,
}

impl MockImu {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ImuState {
                begin_fails: false,
                began: false,
                available: true,
                acceleration: Vector3D::new(0.0, 0.0, 1.0),
                gyroscope: Vector3D::ZERO,
                reads: 0,
            })),
        }
    }

    pub fn failing() -> Self {
        let imu = Self::new();
        imu.state.borrow_mut().begin_fails = true;
        imu
    }

    pub fn set_motion(&self, acceleration: Vector3D, gyroscope: Vector3D) {
        let mut state = self.state.borrow_mut();
        state.acceleration = acceleration;
        state.gyroscope = gyroscope;
    }

    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().available = available;
    }

    pub fn began(&self) -> bool {
        self.state.borrow().began
    }

    pub fn reads(&self) -> usize {
        self.state.borrow().reads
    }
}

impl ImuSource for MockImu {
    fn begin(&mut self) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        if state.begin_fails {
            return Err(DriverError::NotConnected);
        }
        state.began = true;
        Ok(())
    }

    fn acceleration_available(&mut self) -> bool {
        self.state.borrow().available
    }

    fn read_acceleration(&mut self) -> Result<Vector3D, DriverError> {
        let mut state = self.state.borrow_mut();
        state.reads += 1;
        Ok(state.acceleration)
    }

    fn gyroscope_available(&mut self) -> bool {
        self.state.borrow().available
    }

    fn read_gyroscope(&mut self) -> Result<Vector3D, DriverError> {
        Ok(self.state.borrow().gyroscope)
    }
}

// ---------------------------------------------------------------------------
// GATT server
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct GattState {
    notifications: Vec<(u16, Vec<u8>)>,
    /// Characteristics without a subscriber; all others are subscribed.
    unsubscribed: Vec<u16>,
    fail: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockGatt {
    state: Rc<RefCell<GattState>>,
}

impl MockGatt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail = fail;
    }

    pub fn unsubscribe(&self, characteristic: u16) {
        self.state.borrow_mut().unsubscribed.push(characteristic);
    }

    pub fn notifications(&self) -> Vec<(u16, Vec<u8>)> {
        self.state.borrow().notifications.clone()
    }
}

impl GattServer for MockGatt {
    fn is_subscribed(&self, characteristic: u16) -> bool {
        !self.state.borrow().unsubscribed.contains(&characteristic)
    }

    fn notify(&mut self, characteristic: u16, value: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        if state.fail {
            return Err(TransportError::Notify { characteristic });
        }
        state.notifications.push((characteristic, value.to_vec()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TransportState {
    send_calls: usize,
    sent: Vec<PublishRecord>,
    fail: bool,
}

/// Records every `send`; connection-oriented unless built with `broadcast`.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Rc<RefCell<TransportState>>,
    peer: PeerFlag,
    requires_peer: bool,
}

impl MockTransport {
    pub fn connection_oriented(peer: PeerFlag) -> Self {
        Self {
            state: Rc::default(),
            peer,
            requires_peer: true,
        }
    }

    pub fn broadcast() -> Self {
        Self {
            state: Rc::default(),
            peer: PeerFlag::new(),
            requires_peer: false,
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail = fail;
    }

    pub fn send_calls(&self) -> usize {
        self.state.borrow().send_calls
    }

    pub fn sent(&self) -> Vec<PublishRecord> {
        self.state.borrow().sent.clone()
    }
}

impl TransportPublisher for MockTransport {
    fn requires_peer(&self) -> bool {
        self.requires_peer
    }

    fn is_peer_present(&self) -> bool {
        !self.requires_peer || self.peer.is_connected()
    }

    fn send(&mut self, record: &PublishRecord) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        state.send_calls += 1;
        if state.fail {
            return Err(TransportError::Notify { characteristic: 0x2FFF });
        }
        state.sent.push(record.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Time only moves when the scheduler sleeps. Raises `stop` once `stop_at_ms`
/// is reached so `run` returns.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<u32>,
    stop_at_ms: u32,
    stop: Arc<AtomicBool>,
}

impl ManualClock {
    pub fn new(start_ms: u32, stop_at_ms: u32, stop: Arc<AtomicBool>) -> Self {
        Self {
            now: Cell::new(start_ms),
            stop_at_ms,
            stop,
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u32) {
        let now = self.now.get().wrapping_add(ms);
        self.now.set(now);
        if now >= self.stop_at_ms {
            self.stop.store(true, Ordering::Relaxed);
        }
    }
}
