// Smart Insole - Broadcast Transport
//
// Fire-and-forget writes to a serial-style sink (UART console or a Bluetooth
// serial bridge). No handshake, so a peer is always "present".

use std::io::Write;

use heapless::Vec;

use crate::config::MAX_CHANNELS;
use crate::error::{ConfigError, TransportError};
use crate::record::{motion_line, pressure_line, PublishRecord};
use crate::transport::{BroadcastFormat, TransportPublisher};

pub struct BroadcastTransport<W> {
    out: W,
    pins: Vec<u8, MAX_CHANNELS>,
    format: BroadcastFormat,
}

impl<W: Write> BroadcastTransport<W> {
    /// `pins` labels text lines, in channel order.
    pub fn new(out: W, pins: &[u8], format: BroadcastFormat) -> Result<Self, ConfigError> {
        let pins = Vec::from_slice(pins).map_err(|_| ConfigError::TooManyChannels(pins.len()))?;
        Ok(Self { out, pins, format })
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_text(&mut self, record: &PublishRecord) -> Result<(), TransportError> {
        let reading = record.reading();
        for (pin, force) in self.pins.iter().zip(reading.forces.iter()) {
            let line = pressure_line(*pin, *force).map_err(|_| TransportError::LineOverflow)?;
            self.out.write_all(line.as_bytes())?;
        }
        if let Some(motion) = &reading.motion {
            let line = motion_line(motion).map_err(|_| TransportError::LineOverflow)?;
            self.out.write_all(line.as_bytes())?;
        }
        Ok(())
    }
}

impl<W: Write> TransportPublisher for BroadcastTransport<W> {
    fn requires_peer(&self) -> bool {
        false
    }

    fn is_peer_present(&self) -> bool {
        true
    }

    fn send(&mut self, record: &PublishRecord) -> Result<(), TransportError> {
        match self.format {
            BroadcastFormat::Text => self.write_text(record)?,
            BroadcastFormat::Binary => self.out.write_all(record.bytes())?,
        }
        self.out.flush()?;
        Ok(())
    }
}
