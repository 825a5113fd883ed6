// Smart Insole - Reading Aggregator
//
// Latest-value slots, one per FSR channel plus an optional IMU slot. Updates
// overwrite; there is no history.

use heapless::Vec;

use crate::config::MAX_CHANNELS;
use crate::events::{MotionReading, Reading, Vector3D};

#[derive(Debug, Clone)]
pub struct ReadingAggregator {
    slots: Vec<f32, MAX_CHANNELS>,
    motion: Option<MotionReading>,
}

impl ReadingAggregator {
    /// Channel counts above `MAX_CHANNELS` are clamped; config validation
    /// rejects them earlier.
    pub fn new(channel_count: usize, with_motion: bool) -> Self {
        let mut slots = Vec::new();
        for _ in 0..channel_count.min(MAX_CHANNELS) {
            let _ = slots.push(0.0);
        }
        Self {
            slots,
            motion: with_motion.then(MotionReading::default),
        }
    }

    pub fn channel_count(&self) -> usize {
        self.slots.len()
    }

    pub fn has_motion(&self) -> bool {
        self.motion.is_some()
    }

    /// Overwrite one channel's force. Out-of-range indices are ignored.
    pub fn update(&mut self, channel: usize, force: f32) {
        if let Some(slot) = self.slots.get_mut(channel) {
            *slot = force;
        }
    }

    /// Overwrite the IMU slot. No-op on an aggregator built without one, so
    /// the record size never changes at runtime.
    pub fn update_motion(&mut self, acceleration: Vector3D, gyroscope: Vector3D) {
        if let Some(motion) = self.motion.as_mut() {
            *motion = MotionReading {
                acceleration,
                gyroscope,
            };
        }
    }

    pub fn current_record(&self) -> Reading {
        Reading {
            forces: self.slots.clone(),
            motion: self.motion,
        }
    }
}
