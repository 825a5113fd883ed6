// Smart Insole - Analog Channel Multiplexer
//
// The FSRs share the ADC. One channel is "selected" at a time; after a switch
// the input needs `settle_ms` before its reading can be trusted, so a sample
// request that arrives early is refused instead of waited out.

use heapless::Vec;

use crate::config::{ChannelConfig, MAX_CHANNELS};
use crate::drivers::AdcReader;
use crate::error::DriverError;

/// Whether every visit yields a sample, or only those above the noise floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingPolicy {
    RoundRobin,
    Filtered { noise_threshold: u16 },
}

impl SamplingPolicy {
    fn admits(&self, raw: u16) -> bool {
        match *self {
            Self::RoundRobin => true,
            Self::Filtered { noise_threshold } => raw > noise_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorChannel {
    pub index: usize,
    pub pin: u8,
    pub last_raw: Option<u16>,
    pub last_force: Option<f32>,
}

impl SensorChannel {
    fn new(index: usize, pin: u8) -> Self {
        Self {
            index,
            pin,
            last_raw: None,
            last_force: None,
        }
    }
}

/// Result of asking the multiplexer for the selected channel's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Selected less than `settle_ms` ago; nothing read, cursor unchanged.
    Settling,
    Sampled { index: usize, pin: u8, raw: u16 },
    /// Read, but the filtered policy dropped it.
    BelowThreshold { index: usize, pin: u8, raw: u16 },
}

#[derive(Debug)]
pub struct ChannelMultiplexer {
    channels: Vec<SensorChannel, MAX_CHANNELS>,
    cursor: usize,
    policy: SamplingPolicy,
    settle_ms: u32,
    selected_at_ms: u32,
}

impl ChannelMultiplexer {
    /// `None` for an empty channel list: a cursor must always index a channel.
    pub fn new(
        channels: &[ChannelConfig],
        policy: SamplingPolicy,
        settle_ms: u32,
        now_ms: u32,
    ) -> Option<Self> {
        if channels.is_empty() || channels.len() > MAX_CHANNELS {
            return None;
        }
        let channels = channels
            .iter()
            .enumerate()
            .map(|(index, c)| SensorChannel::new(index, c.pin))
            .collect();

        Some(Self {
            channels,
            cursor: 0,
            policy,
            settle_ms,
            selected_at_ms: now_ms,
        })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    pub fn channels(&self) -> &[SensorChannel] {
        &self.channels
    }

    pub fn current(&self) -> &SensorChannel {
        &self.channels[self.cursor]
    }

    /// Switch to the following channel and restart the settle window.
    pub fn next(&mut self, now_ms: u32) -> &SensorChannel {
        self.cursor = (self.cursor + 1) % self.channels.len();
        self.selected_at_ms = now_ms;
        &self.channels[self.cursor]
    }

    /// Restart the settle window without moving the cursor.
    pub fn hold(&mut self, now_ms: u32) {
        self.selected_at_ms = now_ms;
    }

    pub fn is_settled(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.selected_at_ms) >= self.settle_ms
    }

    /// Read the selected channel, then advance. A failed read still advances
    /// so one bad input cannot stall the others.
    pub fn sample_current<A: AdcReader + ?Sized>(
        &mut self,
        adc: &mut A,
        now_ms: u32,
    ) -> Result<SampleOutcome, DriverError> {
        if !self.is_settled(now_ms) {
            return Ok(SampleOutcome::Settling);
        }

        let channel = &mut self.channels[self.cursor];
        let (index, pin) = (channel.index, channel.pin);
        let read = adc.read_raw(pin);
        if let Ok(raw) = read {
            channel.last_raw = Some(raw);
        }
        self.next(now_ms);

        let raw = read?;
        Ok(if self.policy.admits(raw) {
            SampleOutcome::Sampled { index, pin, raw }
        } else {
            SampleOutcome::BelowThreshold { index, pin, raw }
        })
    }

    /// Record the force derived from the channel's latest raw sample.
    pub fn set_force(&mut self, index: usize, force: f32) {
        if let Some(channel) = self.channels.get_mut(index) {
            channel.last_force = Some(force);
        }
    }
}
