// Smart Insole - Hardware & Pipeline Configuration
// Target: ESP32 DevKit (Xtensa), 3 FSRs + optional 6-axis IMU

use heapless::Vec;

use crate::calibration::CalibrationTable;
use crate::error::ConfigError;
use crate::multiplexer::SamplingPolicy;
use crate::record::{RecordLayout, RecordShape};
use crate::transport::BroadcastFormat;

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (ESP32 DevKit pinout)
// ---------------------------------------------------------------------------
pub const PIN_FSR_LARGE_TOE: u8 = 35; // A7 / ADC1_CH7
pub const PIN_FSR_SMALL_TOE: u8 = 34; // A6 / ADC1_CH6
pub const PIN_FSR_HEEL: u8 = 39;      // A3 / ADC1_CH3
pub const PIN_I2C_SDA: i32 = 21;
pub const PIN_I2C_SCL: i32 = 22;

/// Upper bound on multiplexed FSR channels (ADC1 has eight inputs).
pub const MAX_CHANNELS: usize = 8;

// ---------------------------------------------------------------------------
// Analog front-end
// ---------------------------------------------------------------------------
pub const ADC_RESOLUTION_BITS: u32 = 12;
pub const ADC_RANGE: u32 = 1 << ADC_RESOLUTION_BITS; // 4096 codes
pub const VCC: f32 = 3.3;
pub const V_DIV_RESISTANCE: f32 = 9900.0; // Ohms, low side of the divider

/// Raw codes below this are treated as "no sensor contact".
pub const MIN_PLAUSIBLE_RAW: u16 = 1;

// ---------------------------------------------------------------------------
// I2C Bus (MPU6050)
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MPU6050: u8 = 0x68;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks
pub const I2C_BAUDRATE_KHZ: u32 = 400;

// ---------------------------------------------------------------------------
// MPU6050 Sensor Scale Factors
// ---------------------------------------------------------------------------
pub const ACCEL_SCALE_4G: f32 = 8192.0; // LSB/g  at ±4 g
pub const GYRO_SCALE_2000: f32 = 16.4;  // LSB/°/s at ±2000 °/s

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_PIPELINE: usize = 8192;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const ANALOG_READ_DELAY_MS: u32 = 30;     // sample tick
pub const ANALOG_SETTLE_MS: u32 = 30;         // mux settle after a switch
pub const PUBLISH_INTERVAL_MS: u32 = 1000;    // pressure broadcast cadence
pub const MOTION_PUBLISH_INTERVAL_MS: u32 = 100;
pub const TICK_MS: u32 = 10;                  // scheduler loop granularity
pub const HOST_SIMULATION_MS: u64 = 5_000;

// ---------------------------------------------------------------------------
// Radio
// ---------------------------------------------------------------------------
pub const DEVICE_NAME: &str = "my-foot";

/// ADC1 channel behind an ESP32 GPIO. ADC2 pins (0, 2, 4, 12-15, 25-27) are
/// not listed: the radio owns ADC2 while Bluetooth or Wi-Fi is running.
pub fn adc1_channel_for_gpio(gpio: u8) -> Option<u32> {
    match gpio {
        36 => Some(0),
        37 => Some(1),
        38 => Some(2),
        39 => Some(3),
        32 => Some(4),
        33 => Some(5),
        34 => Some(6),
        35 => Some(7),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Runtime pipeline configuration
// ---------------------------------------------------------------------------

/// One physical FSR input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub pin: u8,
    pub label: &'static str,
}

/// Which publisher the scheduler drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Connection-oriented notify characteristic (BLE GATT).
    Notify,
    /// Connectionless serial-style broadcast.
    Broadcast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub channels: Vec<ChannelConfig, MAX_CHANNELS>,
    pub adc_range: u32,
    pub vcc: f32,
    pub divider_resistance: f32,
    pub calibration: CalibrationTable,
    pub min_plausible_raw: u16,
    pub policy: SamplingPolicy,

    pub sample_interval_ms: u32,
    pub settle_delay_ms: u32,
    pub publish_interval_ms: u32,
    pub tick_ms: u32,

    pub imu_enabled: bool,
    pub transport: TransportKind,
    pub broadcast_format: BroadcastFormat,
    pub record_layout: RecordLayout,
    pub composite_characteristic: u16,
    pub expose_axis_characteristics: bool,
    /// Keep sampling while a connection-oriented transport has no peer.
    pub sample_while_disconnected: bool,
    /// Bluetooth is up, so ADC2 pins cannot be sampled.
    pub radio_enabled: bool,
    pub device_name: &'static str,
}

impl PipelineConfig {
    /// Three FSRs, strict round-robin, text lines over the serial broadcast.
    pub fn pressure_broadcast() -> Self {
        let mut channels = Vec::new();
        for (pin, label) in [
            (PIN_FSR_LARGE_TOE, "large toe"),
            (PIN_FSR_SMALL_TOE, "small toe"),
            (PIN_FSR_HEEL, "heel"),
        ] {
            // Capacity is MAX_CHANNELS, three always fit.
            let _ = channels.push(ChannelConfig { pin, label });
        }

        Self {
            channels,
            adc_range: ADC_RANGE,
            vcc: VCC,
            divider_resistance: V_DIV_RESISTANCE,
            calibration: CalibrationTable::FSR_V1,
            min_plausible_raw: MIN_PLAUSIBLE_RAW,
            policy: SamplingPolicy::RoundRobin,
            sample_interval_ms: ANALOG_READ_DELAY_MS,
            settle_delay_ms: ANALOG_SETTLE_MS,
            publish_interval_ms: PUBLISH_INTERVAL_MS,
            tick_ms: TICK_MS,
            imu_enabled: false,
            transport: TransportKind::Broadcast,
            broadcast_format: BroadcastFormat::Text,
            record_layout: RecordLayout::Compact,
            composite_characteristic: crate::gatt::IMU_CHARACTERISTIC_UUID,
            expose_axis_characteristics: false,
            sample_while_disconnected: false,
            radio_enabled: true,
            device_name: DEVICE_NAME,
        }
    }

    /// IMU only, 24-byte composite blob plus per-axis characteristics.
    pub fn motion_notify() -> Self {
        Self {
            channels: Vec::new(),
            imu_enabled: true,
            transport: TransportKind::Notify,
            publish_interval_ms: MOTION_PUBLISH_INTERVAL_MS,
            expose_axis_characteristics: true,
            ..Self::pressure_broadcast()
        }
    }

    /// FSRs and IMU in one record over the notify characteristic.
    pub fn fused_notify() -> Self {
        Self {
            imu_enabled: true,
            transport: TransportKind::Notify,
            ..Self::pressure_broadcast()
        }
    }

    /// Variant selected at build time through the `motion` / `fused`
    /// features; plain pressure broadcast otherwise.
    pub fn firmware_default() -> Self {
        if cfg!(feature = "fused") {
            Self::fused_notify()
        } else if cfg!(feature = "motion") {
            Self::motion_notify()
        } else {
            Self::pressure_broadcast()
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn pins(&self) -> Vec<u8, MAX_CHANNELS> {
        self.channels.iter().map(|c| c.pin).collect()
    }

    /// Time to visit every channel once: each visit waits for the slower of
    /// the sample tick and the settle delay.
    pub fn round_duration_ms(&self) -> u32 {
        let per_visit = self.sample_interval_ms.max(self.settle_delay_ms);
        per_visit * self.channel_count().max(1) as u32
    }

    pub fn record_shape(&self) -> RecordShape {
        RecordShape {
            channel_count: self.channel_count(),
            with_motion: self.imu_enabled,
            layout: self.record_layout,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.is_empty() && !self.imu_enabled {
            return Err(ConfigError::NoSources);
        }

        for (i, ch) in self.channels.iter().enumerate() {
            if self.channels[..i].iter().any(|other| other.pin == ch.pin) {
                return Err(ConfigError::DuplicatePin(ch.pin));
            }
            if self.radio_enabled && adc1_channel_for_gpio(ch.pin).is_none() {
                return Err(ConfigError::PinNotRadioSafe(ch.pin));
            }
        }

        let positive = |v: f32| v.is_finite() && v > 0.0;
        if self.adc_range < 2 || !positive(self.vcc) || !positive(self.divider_resistance) {
            return Err(ConfigError::AnalogFrontEnd);
        }

        for (name, value) in [
            ("sample_interval_ms", self.sample_interval_ms),
            ("publish_interval_ms", self.publish_interval_ms),
            ("tick_ms", self.tick_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval(name));
            }
        }

        if self.tick_ms > self.sample_interval_ms {
            return Err(ConfigError::TickTooCoarse {
                tick_ms: self.tick_ms,
                sample_interval_ms: self.sample_interval_ms,
            });
        }

        let round_ms = self.round_duration_ms();
        if self.publish_interval_ms < round_ms {
            return Err(ConfigError::PublishIntervalTooShort {
                publish_ms: self.publish_interval_ms,
                round_ms,
            });
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::pressure_broadcast()
    }
}
