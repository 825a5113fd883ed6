// Smart Insole - MPU6050 IMU Driver
//
// Register-level driver over a shared I2C bus. One 14-byte burst yields both
// vectors, so a data-ready poll latches the pair and the two reads drain it.

use std::sync::{Mutex, MutexGuard};

use esp_idf_hal::i2c::I2cDriver;
use esp_idf_sys::EspError;

use crate::config::*;
use crate::drivers::ImuSource;
use crate::error::DriverError;
use crate::events::Vector3D;

/// Thread-safe handle to a shared I2C bus.
pub type SharedBus = &'static Mutex<I2cDriver<'static>>;

// MPU6050 register addresses
const REG_CONFIG: u8 = 0x1A;
const REG_GYRO_CONFIG: u8 = 0x1B;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_INT_STATUS: u8 = 0x3A;
const REG_ACCEL_XOUT_H: u8 = 0x3B; // Start of 14-byte sensor burst
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_WHO_AM_I: u8 = 0x75;
const WHO_AM_I_EXPECTED: u8 = 0x68;
const DATA_RDY_INT: u8 = 0x01;

pub struct Mpu6050 {
    bus: SharedBus,
    pending_accel: Option<Vector3D>,
    pending_gyro: Option<Vector3D>,
}

fn bus_err(e: EspError) -> DriverError {
    DriverError::Bus(e.code())
}

impl Mpu6050 {
    pub fn new(bus: SharedBus) -> Self {
        Self {
            bus,
            pending_accel: None,
            pending_gyro: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, I2cDriver<'static>> {
        self.bus.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Verify the device is reachable on the I2C bus.
    pub fn is_connected(&self) -> bool {
        let mut buf = [0u8; 1];
        match self
            .lock()
            .write_read(I2C_ADDR_MPU6050, &[REG_WHO_AM_I], &mut buf, I2C_TIMEOUT_TICKS)
        {
            Ok(()) => buf[0] == WHO_AM_I_EXPECTED,
            Err(_) => false,
        }
    }

    fn data_ready(&self) -> Result<bool, DriverError> {
        let mut status = [0u8; 1];
        self.lock()
            .write_read(I2C_ADDR_MPU6050, &[REG_INT_STATUS], &mut status, I2C_TIMEOUT_TICKS)
            .map_err(bus_err)?;
        Ok(status[0] & DATA_RDY_INT != 0)
    }

    /// Burst-read all 6 axes and convert to g and °/s.
    fn latch(&mut self) -> Result<(), DriverError> {
        let mut raw = [0u8; 14];
        self.lock()
            .write_read(I2C_ADDR_MPU6050, &[REG_ACCEL_XOUT_H], &mut raw, I2C_TIMEOUT_TICKS)
            .map_err(bus_err)?;

        let axis = |i: usize, scale: f32| i16::from_be_bytes([raw[i], raw[i + 1]]) as f32 / scale;
        self.pending_accel = Some(Vector3D::new(
            axis(0, ACCEL_SCALE_4G),
            axis(2, ACCEL_SCALE_4G),
            axis(4, ACCEL_SCALE_4G),
        ));
        // raw[6..8] = temperature, skipped
        self.pending_gyro = Some(Vector3D::new(
            axis(8, GYRO_SCALE_2000),
            axis(10, GYRO_SCALE_2000),
            axis(12, GYRO_SCALE_2000),
        ));
        Ok(())
    }

    fn poll(&mut self) -> bool {
        match self.data_ready() {
            Ok(true) => self.latch().is_ok(),
            Ok(false) => false,
            Err(e) => {
                log::warn!("MPU6050 status read failed: {}", e);
                false
            }
        }
    }
}

impl ImuSource for Mpu6050 {
    /// Wake the sensor and configure accel (±4 g), gyro (±2000 °/s), DLPF 44 Hz.
    fn begin(&mut self) -> Result<(), DriverError> {
        if !self.is_connected() {
            return Err(DriverError::NotConnected);
        }

        let mut bus = self.lock();
        for (reg, value) in [
            (REG_PWR_MGMT_1, 0x00),   // clear SLEEP
            (REG_CONFIG, 0x03),       // DLPF 44 Hz
            (REG_GYRO_CONFIG, 0x18),  // ±2000 °/s
            (REG_ACCEL_CONFIG, 0x08), // ±4 g
        ] {
            bus.write(I2C_ADDR_MPU6050, &[reg, value], I2C_TIMEOUT_TICKS)
                .map_err(bus_err)?;
        }

        log::info!("MPU6050 initialised (±4g, ±2000°/s, DLPF 44Hz)");
        Ok(())
    }

    fn acceleration_available(&mut self) -> bool {
        self.pending_accel.is_some() || self.poll()
    }

    fn read_acceleration(&mut self) -> Result<Vector3D, DriverError> {
        if self.pending_accel.is_none() {
            self.latch()?;
        }
        self.pending_accel.take().ok_or(DriverError::NotConnected)
    }

    fn gyroscope_available(&mut self) -> bool {
        self.pending_gyro.is_some() || self.poll()
    }

    fn read_gyroscope(&mut self) -> Result<Vector3D, DriverError> {
        if self.pending_gyro.is_none() {
            self.latch()?;
        }
        self.pending_gyro.take().ok_or(DriverError::NotConnected)
    }
}
