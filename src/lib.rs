// Smart Insole - Sensor Acquisition & Transport Pipeline
//
// FSRs are sampled round-robin through the shared ADC, converted to force,
// optionally fused with a 6-axis IMU, and published on a fixed cadence over a
// BLE notify characteristic or a serial-style broadcast.
//
//   PublicationScheduler ──tick──> ChannelMultiplexer ──raw──> CalibrationModel
//          │                                                        │
//          └──publish──> TransportPublisher <──record── ReadingAggregator

pub mod aggregator;
pub mod calibration;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod gatt;
pub mod multiplexer;
pub mod record;
pub mod scheduler;
pub mod tasks;
pub mod transport;

pub use aggregator::ReadingAggregator;
pub use calibration::{CalibrationModel, CalibrationTable};
pub use config::{PipelineConfig, TransportKind};
pub use error::{ConfigError, DecodeError, DriverError, TransportError};
pub use events::{MotionReading, Reading, Vector3D};
pub use multiplexer::{ChannelMultiplexer, SamplingPolicy, SensorChannel};
pub use record::{PublishRecord, RecordLayout, RecordShape};
pub use scheduler::{Clock, MonotonicClock, PublicationScheduler, ScheduleState, TickReport};
pub use transport::{BroadcastTransport, NotifyTransport, PeerFlag, TransportPublisher};
