// Smart Insole - Simulated Sensors
//
// Synthetic gait for running the pipeline on a workstation: each FSR sees a
// periodic load with its own phase offset (heel strike, then toes), and the
// IMU reports gravity plus a small swing.

use core::f32::consts::TAU;

use crate::config::ADC_RANGE;
use crate::drivers::{AdcReader, ImuSource};
use crate::error::{ConfigError, DriverError};
use crate::events::Vector3D;

/// Reads advance the simulated stride by one step each.
#[derive(Debug, Clone)]
pub struct SimulatedAdc {
    pins: heapless::Vec<u8, { crate::config::MAX_CHANNELS }>,
    step: u32,
    steps_per_stride: u32,
}

impl SimulatedAdc {
    pub fn new(pins: &[u8], steps_per_stride: u32) -> Result<Self, ConfigError> {
        let pins = heapless::Vec::from_slice(pins)
            .map_err(|_| ConfigError::TooManyChannels(pins.len()))?;
        Ok(Self {
            pins,
            step: 0,
            steps_per_stride: steps_per_stride.max(1),
        })
    }
}

impl AdcReader for SimulatedAdc {
    fn read_raw(&mut self, pin: u8) -> Result<u16, DriverError> {
        let slot = self
            .pins
            .iter()
            .position(|&p| p == pin)
            .ok_or(DriverError::UnsupportedPin(pin))?;

        let phase = self.step as f32 / self.steps_per_stride as f32
            + slot as f32 / self.pins.len() as f32;
        self.step = self.step.wrapping_add(1);

        // Foot off the ground for half the stride: code 0, as a real FSR reads.
        let load = (TAU * phase).sin();
        if load <= 0.0 {
            return Ok(0);
        }
        let full_scale = (ADC_RANGE - 1) as f32;
        Ok((load * full_scale * 0.9) as u16)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedImu {
    step: u32,
}

impl ImuSource for SimulatedImu {
    fn begin(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    fn acceleration_available(&mut self) -> bool {
        true
    }

    fn read_acceleration(&mut self) -> Result<Vector3D, DriverError> {
        self.step = self.step.wrapping_add(1);
        let swing = (self.step as f32 * 0.1).sin() * 0.2;
        Ok(Vector3D::new(swing, 0.0, 1.0))
    }

    fn gyroscope_available(&mut self) -> bool {
        true
    }

    fn read_gyroscope(&mut self) -> Result<Vector3D, DriverError> {
        let rate = (self.step as f32 * 0.1).cos() * 45.0;
        Ok(Vector3D::new(0.0, rate, 0.0))
    }
}
