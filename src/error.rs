// Smart Insole - Error Types

use thiserror::Error;

/// Rejected `PipelineConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no FSR channels configured and IMU disabled")]
    NoSources,
    #[error("{0} FSR channels configured, at most {max} supported", max = crate::config::MAX_CHANNELS)]
    TooManyChannels(usize),
    #[error("GPIO{0} is configured for more than one channel")]
    DuplicatePin(u8),
    #[error("GPIO{0} is not an ADC1 input (ADC2 is unusable while the radio is on)")]
    PinNotRadioSafe(u8),
    #[error("ADC range, VCC and divider resistance must be positive")]
    AnalogFrontEnd,
    #[error("{0} must be non-zero")]
    ZeroInterval(&'static str),
    #[error("tick of {tick_ms} ms is coarser than the {sample_interval_ms} ms sample interval")]
    TickTooCoarse { tick_ms: u32, sample_interval_ms: u32 },
    #[error("publish interval {publish_ms} ms is shorter than one sampling round ({round_ms} ms)")]
    PublishIntervalTooShort { publish_ms: u32, round_ms: u32 },
}

/// Failure reported by a hardware collaborator (ADC, IMU bus).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("GPIO{0} has no ADC channel")]
    UnsupportedPin(u8),
    #[error("ADC read on GPIO{pin} failed (esp_err {code})")]
    Adc { pin: u8, code: i32 },
    #[error("bus transfer failed (esp_err {0})")]
    Bus(i32),
    #[error("device not responding")]
    NotConnected,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no peer connected")]
    NoPeer,
    #[error("notify on characteristic {characteristic:#06x} failed")]
    Notify { characteristic: u16 },
    #[error("peer has not subscribed to characteristic {characteristic:#06x}")]
    NotSubscribed { characteristic: u16 },
    #[error("formatted line exceeds the line buffer")]
    LineOverflow,
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Consumer-side record parsing failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("record is {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },
    #[error("record shape exceeds {0} channels")]
    TooManyChannels(usize),
    #[error("malformed reading line")]
    MalformedLine,
}
