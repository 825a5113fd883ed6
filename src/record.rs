// Smart Insole - Wire Records
//
// Binary layout (all little-endian, no padding):
//
//   [u32 millis]          Timestamped layout only
//   [f32 force] * N       one per FSR channel, channel order
//   [f32 aX aY aZ]        IMU variants only
//   [f32 gX gY gZ]
//
// The IMU-only compact record is the 24-byte blob served on the composite
// characteristic; the timestamped one is the 28-byte form the phone app reads.
//
// Text lines (broadcast): "<pin>:<force>\n" with two decimals, and
// "aX, aY, aZ, gX, gY, gZ\n" for motion.

use core::fmt::Write as _;

use heapless::{String, Vec};

use crate::config::MAX_CHANNELS;
use crate::error::DecodeError;
use crate::events::{MotionReading, Reading, Vector3D};

const FLOAT_LEN: usize = 4;
const TIMESTAMP_LEN: usize = 4;
const MOTION_LEN: usize = 6 * FLOAT_LEN;

pub const MAX_RECORD_LEN: usize = TIMESTAMP_LEN + MAX_CHANNELS * FLOAT_LEN + MOTION_LEN;
pub const MAX_LINE_LEN: usize = 96;

pub type RecordBytes = Vec<u8, MAX_RECORD_LEN>;
pub type Line = String<MAX_LINE_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordLayout {
    #[default]
    Compact,
    Timestamped,
}

/// What a consumer must know to decode a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordShape {
    pub channel_count: usize,
    pub with_motion: bool,
    pub layout: RecordLayout,
}

impl RecordShape {
    pub fn of(reading: &Reading, layout: RecordLayout) -> Self {
        Self {
            channel_count: reading.channel_count(),
            with_motion: reading.motion.is_some(),
            layout,
        }
    }

    pub fn encoded_len(&self) -> usize {
        let header = match self.layout {
            RecordLayout::Compact => 0,
            RecordLayout::Timestamped => TIMESTAMP_LEN,
        };
        let motion = if self.with_motion { MOTION_LEN } else { 0 };
        header + self.channel_count * FLOAT_LEN + motion
    }
}

/// Serialise a reading. Infallible: a `Reading` never exceeds
/// `MAX_CHANNELS`, so the buffer always has room.
pub fn encode(reading: &Reading, layout: RecordLayout, timestamp_ms: u32) -> RecordBytes {
    let mut out = RecordBytes::new();
    let mut put = |bytes: [u8; 4]| {
        let _ = out.extend_from_slice(&bytes);
    };

    if layout == RecordLayout::Timestamped {
        put(timestamp_ms.to_le_bytes());
    }
    for force in reading.forces.iter() {
        put(force.to_le_bytes());
    }
    if let Some(motion) = reading.motion {
        for axis in motion.axes() {
            put(axis.to_le_bytes());
        }
    }
    out
}

/// Consumer side of [`encode`]. Returns the timestamp for timestamped records.
pub fn decode(bytes: &[u8], shape: RecordShape) -> Result<(Option<u32>, Reading), DecodeError> {
    if shape.channel_count > MAX_CHANNELS {
        return Err(DecodeError::TooManyChannels(MAX_CHANNELS));
    }
    let expected = shape.encoded_len();
    if bytes.len() != expected {
        return Err(DecodeError::Length {
            expected,
            actual: bytes.len(),
        });
    }

    let mut words = bytes
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]]);
    let mut next = || words.next().ok_or(DecodeError::Length {
        expected,
        actual: bytes.len(),
    });

    let timestamp = match shape.layout {
        RecordLayout::Compact => None,
        RecordLayout::Timestamped => Some(u32::from_le_bytes(next()?)),
    };

    let mut reading = Reading::default();
    for _ in 0..shape.channel_count {
        let force = f32::from_le_bytes(next()?);
        reading
            .forces
            .push(force)
            .map_err(|_| DecodeError::TooManyChannels(MAX_CHANNELS))?;
    }

    if shape.with_motion {
        let mut axis = || next().map(f32::from_le_bytes);
        let acceleration = Vector3D::new(axis()?, axis()?, axis()?);
        let gyroscope = Vector3D::new(axis()?, axis()?, axis()?);
        reading.motion = Some(MotionReading {
            acceleration,
            gyroscope,
        });
    }

    Ok((timestamp, reading))
}

/// Immutable bytes for one publish boundary, plus the reading they came from
/// so text transports can format it.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRecord {
    timestamp_ms: u32,
    layout: RecordLayout,
    reading: Reading,
    bytes: RecordBytes,
}

impl PublishRecord {
    pub fn build(reading: Reading, layout: RecordLayout, timestamp_ms: u32) -> Self {
        let bytes = encode(&reading, layout, timestamp_ms);
        Self {
            timestamp_ms,
            layout,
            reading,
            bytes,
        }
    }

    pub fn timestamp_ms(&self) -> u32 {
        self.timestamp_ms
    }

    pub fn reading(&self) -> &Reading {
        &self.reading
    }

    pub fn shape(&self) -> RecordShape {
        RecordShape::of(&self.reading, self.layout)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Text lines
// ---------------------------------------------------------------------------

pub fn pressure_line(pin: u8, force: f32) -> Result<Line, core::fmt::Error> {
    let mut line = Line::new();
    writeln!(line, "{}:{:.2}", pin, force)?;
    Ok(line)
}

pub fn motion_line(motion: &MotionReading) -> Result<Line, core::fmt::Error> {
    let [ax, ay, az, gx, gy, gz] = motion.axes();
    let mut line = Line::new();
    writeln!(
        line,
        "{:.2}, {:.2}, {:.2}, {:.2}, {:.2}, {:.2}",
        ax, ay, az, gx, gy, gz
    )?;
    Ok(line)
}

/// Parse one `<pin>:<force>` line, trailing newline optional.
pub fn parse_pressure_line(line: &str) -> Result<(u8, f32), DecodeError> {
    let (pin, force) = line
        .trim_end()
        .split_once(':')
        .ok_or(DecodeError::MalformedLine)?;
    let pin = pin.trim().parse().map_err(|_| DecodeError::MalformedLine)?;
    let force = force.trim().parse().map_err(|_| DecodeError::MalformedLine)?;
    Ok((pin, force))
}
