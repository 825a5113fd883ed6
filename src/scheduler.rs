// Smart Insole - Publication Scheduler
//
// One cooperative loop, two periodic activities:
//
//   sample tick   every `sample_interval_ms`: read the selected FSR (once it
//                 has settled), calibrate, store; poll the IMU
//   publish tick  every `publish_interval_ms`: snapshot, encode, send
//
// Both run in program order inside `tick`, sampling first, so a record always
// carries the newest value of every slot. Nothing in here blocks. A channel
// that has not settled is looked at again next tick; a publish boundary with
// no peer, or whose write fails, is dropped and the next attempt waits for
// the following boundary (`last + k * interval`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::aggregator::ReadingAggregator;
use crate::calibration::CalibrationModel;
use crate::config::PipelineConfig;
use crate::drivers::{AdcReader, ImuSource};
use crate::error::{ConfigError, TransportError};
use crate::events::Reading;
use crate::multiplexer::{ChannelMultiplexer, SampleOutcome};
use crate::record::PublishRecord;
use crate::transport::TransportPublisher;

// ---------------------------------------------------------------------------
// Time source
// ---------------------------------------------------------------------------

pub trait Clock {
    /// Milliseconds since an arbitrary origin; wraps at ~49 days.
    fn now_ms(&self) -> u32;
    fn sleep_ms(&self, ms: u32);
}

/// Milliseconds since construction (boot, on the device).
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }

    fn sleep_ms(&self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

// ---------------------------------------------------------------------------
// State & reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleState {
    pub last_sample_ms: Option<u32>,
    /// Last successful publish (or start, before the first one).
    pub last_publish_ms: u32,
    /// Next publish boundary.
    pub next_publish_ms: u32,
    pub cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// Constructed, `start` not yet called.
    Ready,
    Running,
    /// Hardware bring-up failed; no further ticks do any work.
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Zero, near-zero or full-scale code: no usable resistance.
    Implausible,
    /// Filtered policy, at or under the noise threshold.
    BelowNoiseFloor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleEvent {
    NotDue,
    Settling,
    Stored {
        index: usize,
        pin: u8,
        raw: u16,
        force: f32,
    },
    Skipped {
        index: usize,
        pin: u8,
        raw: u16,
        reason: SkipReason,
    },
    ReadFailed {
        index: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishEvent {
    NotDue,
    Sent { len: usize },
    NoPeer,
    WriteFailed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickReport {
    Halted,
    /// Connection-oriented transport with no peer: idle until one arrives.
    AwaitingPeer,
    Ran {
        sample: SampleEvent,
        motion_updated: bool,
        publish: PublishEvent,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub samples: u32,
    pub skipped: u32,
    pub read_errors: u32,
    pub motion_updates: u32,
    pub publishes: u32,
    pub publish_skips: u32,
    pub write_failures: u32,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// `now_ms` is at or past `deadline_ms`, across timer wrap. Valid while the
/// two are less than ~24 days apart, which the boundary roll guarantees.
fn reached(now_ms: u32, deadline_ms: u32) -> bool {
    now_ms.wrapping_sub(deadline_ms) < 1 << 31
}

pub struct PublicationScheduler<A, I, T> {
    config: PipelineConfig,
    calibration: CalibrationModel,
    multiplexer: Option<ChannelMultiplexer>,
    aggregator: ReadingAggregator,
    adc: A,
    imu: I,
    transport: T,

    status: SchedulerStatus,
    last_sample_ms: Option<u32>,
    last_publish_ms: u32,
    next_publish_ms: u32,
    peer_present: bool,
    stats: PipelineStats,
}

impl<A, I, T> PublicationScheduler<A, I, T>
where
    A: AdcReader,
    I: ImuSource,
    T: TransportPublisher,
{
    pub fn new(config: PipelineConfig, adc: A, imu: I, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;

        let multiplexer =
            ChannelMultiplexer::new(&config.channels, config.policy, config.settle_delay_ms, 0);
        let aggregator = ReadingAggregator::new(config.channel_count(), config.imu_enabled);

        Ok(Self {
            calibration: CalibrationModel::from_config(&config),
            multiplexer,
            aggregator,
            adc,
            imu,
            transport,
            status: SchedulerStatus::Ready,
            last_sample_ms: None,
            last_publish_ms: 0,
            next_publish_ms: 0,
            peer_present: false,
            stats: PipelineStats::default(),
            config,
        })
    }

    /// Bring up the IMU (when fused) and arm both timers at `now_ms`.
    pub fn start(&mut self, now_ms: u32) -> SchedulerStatus {
        if self.status != SchedulerStatus::Ready {
            return self.status;
        }

        if self.config.imu_enabled {
            if let Err(e) = self.imu.begin() {
                log::error!("Failed to initialize IMU: {} - halting", e);
                self.status = SchedulerStatus::Halted;
                return self.status;
            }
            log::info!("IMU initialized");
        }

        if let Some(mux) = self.multiplexer.as_mut() {
            mux.hold(now_ms);
        }
        self.last_sample_ms = None;
        self.last_publish_ms = now_ms;
        self.next_publish_ms = now_ms.wrapping_add(self.config.publish_interval_ms);
        self.peer_present = !self.transport.requires_peer() || self.transport.is_peer_present();
        self.status = SchedulerStatus::Running;

        log::info!(
            "Pipeline running: {} FSR channel(s), IMU {}, sample {} ms, publish {} ms",
            self.config.channel_count(),
            if self.config.imu_enabled { "on" } else { "off" },
            self.config.sample_interval_ms,
            self.config.publish_interval_ms,
        );
        self.status
    }

    /// One pass of the loop. Starts the scheduler on first use.
    pub fn tick(&mut self, now_ms: u32) -> TickReport {
        if self.status == SchedulerStatus::Ready {
            self.start(now_ms);
        }
        if self.status == SchedulerStatus::Halted {
            return TickReport::Halted;
        }

        let present = self.track_peer();
        if self.transport.requires_peer() && !present && !self.config.sample_while_disconnected {
            // Boundaries keep passing while idle so a reconnect waits for the next one.
            if reached(now_ms, self.next_publish_ms) {
                self.stats.publish_skips += 1;
                self.skip_boundary(now_ms);
            }
            return TickReport::AwaitingPeer;
        }

        let (sample, motion_updated) = if self.sample_due(now_ms) {
            self.sample(now_ms)
        } else {
            (SampleEvent::NotDue, false)
        };
        let publish = self.publish(now_ms, present);

        TickReport::Ran {
            sample,
            motion_updated,
            publish,
        }
    }

    /// Tick on `clock` until `stop` is raised or the pipeline halts.
    pub fn run<C: Clock>(&mut self, clock: &C, stop: &AtomicBool) -> SchedulerStatus {
        while !stop.load(Ordering::Relaxed) {
            if self.tick(clock.now_ms()) == TickReport::Halted {
                break;
            }
            clock.sleep_ms(self.config.tick_ms);
        }
        self.status
    }

    fn track_peer(&mut self) -> bool {
        let present = self.transport.is_peer_present();
        if present != self.peer_present {
            if present {
                log::info!("Peer connected - publishing resumes");
            } else {
                log::info!("Peer disconnected - waiting for a connection");
            }
            self.peer_present = present;
        }
        present
    }

    fn sample_due(&self, now_ms: u32) -> bool {
        self.last_sample_ms
            .map_or(true, |last| now_ms.wrapping_sub(last) >= self.config.sample_interval_ms)
    }

    fn sample(&mut self, now_ms: u32) -> (SampleEvent, bool) {
        let event = match self.multiplexer.as_mut() {
            Some(mux) => {
                let index = mux.cursor();
                match mux.sample_current(&mut self.adc, now_ms) {
                    Ok(SampleOutcome::Settling) => return (SampleEvent::Settling, false),
                    Ok(SampleOutcome::Sampled { index, pin, raw }) => {
                        match self.calibration.force_checked(raw) {
                            Some(force) => {
                                self.aggregator.update(index, force);
                                mux.set_force(index, force);
                                self.stats.samples += 1;
                                log::debug!(
                                    "Millis {} sensor {} pin {} adc {} force {:.2}",
                                    now_ms, index, pin, raw, force
                                );
                                SampleEvent::Stored { index, pin, raw, force }
                            }
                            None => {
                                self.stats.skipped += 1;
                                log::debug!("Sensor {} pin {} adc {} implausible, skipped", index, pin, raw);
                                SampleEvent::Skipped {
                                    index,
                                    pin,
                                    raw,
                                    reason: SkipReason::Implausible,
                                }
                            }
                        }
                    }
                    Ok(SampleOutcome::BelowThreshold { index, pin, raw }) => {
                        self.stats.skipped += 1;
                        SampleEvent::Skipped {
                            index,
                            pin,
                            raw,
                            reason: SkipReason::BelowNoiseFloor,
                        }
                    }
                    Err(e) => {
                        self.stats.read_errors += 1;
                        log::warn!("ADC read on sensor {} failed: {}", index, e);
                        SampleEvent::ReadFailed { index }
                    }
                }
            }
            None => SampleEvent::NotDue,
        };

        self.last_sample_ms = Some(now_ms);
        let motion_updated = self.config.imu_enabled && self.poll_imu();
        (event, motion_updated)
    }

    fn poll_imu(&mut self) -> bool {
        if !(self.imu.acceleration_available() && self.imu.gyroscope_available()) {
            return false;
        }
        let read = self
            .imu
            .read_acceleration()
            .and_then(|a| self.imu.read_gyroscope().map(|g| (a, g)));
        match read {
            Ok((acceleration, gyroscope)) => {
                self.aggregator.update_motion(acceleration, gyroscope);
                self.stats.motion_updates += 1;
                true
            }
            Err(e) => {
                self.stats.read_errors += 1;
                log::warn!("IMU read failed: {}", e);
                false
            }
        }
    }

    /// Move the next boundary to the first `k * interval` step after `now_ms`.
    fn skip_boundary(&mut self, now_ms: u32) {
        let interval = self.config.publish_interval_ms;
        let late = now_ms.wrapping_sub(self.next_publish_ms);
        let steps = late / interval + 1;
        self.next_publish_ms = self
            .next_publish_ms
            .wrapping_add(interval.wrapping_mul(steps));
    }

    fn publish(&mut self, now_ms: u32, present: bool) -> PublishEvent {
        if !reached(now_ms, self.next_publish_ms) {
            return PublishEvent::NotDue;
        }
        // Every outcome below consumes this boundary: nothing is queued or
        // retried before the next one.
        self.skip_boundary(now_ms);

        if self.transport.requires_peer() && !present {
            self.stats.publish_skips += 1;
            return PublishEvent::NoPeer;
        }

        let record = PublishRecord::build(
            self.aggregator.current_record(),
            self.config.record_layout,
            now_ms,
        );
        match self.transport.send(&record) {
            Ok(()) => {
                self.last_publish_ms = now_ms;
                self.stats.publishes += 1;
                PublishEvent::Sent { len: record.len() }
            }
            Err(TransportError::NoPeer) => {
                self.stats.publish_skips += 1;
                PublishEvent::NoPeer
            }
            Err(e) => {
                self.stats.write_failures += 1;
                log::warn!("Publish of {} bytes failed: {}", record.len(), e);
                PublishEvent::WriteFailed
            }
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        self.status
    }

    pub fn state(&self) -> ScheduleState {
        ScheduleState {
            last_sample_ms: self.last_sample_ms,
            last_publish_ms: self.last_publish_ms,
            next_publish_ms: self.next_publish_ms,
            cursor: self.multiplexer.as_ref().map_or(0, |m| m.cursor()),
        }
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn calibration(&self) -> &CalibrationModel {
        &self.calibration
    }

    pub fn multiplexer(&self) -> Option<&ChannelMultiplexer> {
        self.multiplexer.as_ref()
    }

    pub fn current_record(&self) -> Reading {
        self.aggregator.current_record()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
