// Smart Insole - Sensor Data Types

use heapless::Vec;

use crate::config::MAX_CHANNELS;

// ---------------------------------------------------------------------------
// 3-axis vector (acceleration in g, angular rate in °/s)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3D {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ---------------------------------------------------------------------------
// 6-axis IMU sample
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionReading {
    pub acceleration: Vector3D,
    pub gyroscope: Vector3D,
}

impl MotionReading {
    /// `[aX, aY, aZ, gX, gY, gZ]`, the order used on the wire.
    pub fn axes(&self) -> [f32; 6] {
        let [ax, ay, az] = self.acceleration.to_array();
        let [gx, gy, gz] = self.gyroscope.to_array();
        [ax, ay, az, gx, gy, gz]
    }
}

// ---------------------------------------------------------------------------
// Reading: everything published in one record
// ---------------------------------------------------------------------------

/// Snapshot of the latest per-channel forces and, when the IMU is fused in,
/// the latest motion pair. The shape is fixed for the life of the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    pub forces: Vec<f32, MAX_CHANNELS>,
    pub motion: Option<MotionReading>,
}

impl Reading {
    pub fn channel_count(&self) -> usize {
        self.forces.len()
    }
}
