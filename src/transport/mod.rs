// Smart Insole - Transport Publishers
//
// Two ways out: a notify characteristic that needs a subscribed peer, and a
// connectionless broadcast that always "has" one. The scheduler only talks to
// `TransportPublisher`; which one it gets is a configuration choice.

#[cfg(target_os = "espidf")]
pub mod ble;
pub mod broadcast;
pub mod notify;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use broadcast::BroadcastTransport;
pub use notify::{GattServer, NotifyTransport};

use crate::error::TransportError;
use crate::record::PublishRecord;

/// Payload encoding for the broadcast transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastFormat {
    /// `<pin>:<force>` lines, plus an `aX, ..., gZ` line when fused.
    #[default]
    Text,
    /// The encoded record bytes.
    Binary,
}

pub trait TransportPublisher {
    /// Connection-oriented transports gate publishing (and by default
    /// sampling) on a present peer.
    fn requires_peer(&self) -> bool;

    fn is_peer_present(&self) -> bool;

    /// Best-effort delivery. Must return promptly: it runs on the sampling
    /// thread between ticks.
    fn send(&mut self, record: &PublishRecord) -> Result<(), TransportError>;
}

impl<T: TransportPublisher + ?Sized> TransportPublisher for Box<T> {
    fn requires_peer(&self) -> bool {
        (**self).requires_peer()
    }

    fn is_peer_present(&self) -> bool {
        (**self).is_peer_present()
    }

    fn send(&mut self, record: &PublishRecord) -> Result<(), TransportError> {
        (**self).send(record)
    }
}

/// Connection state shared with the radio stack. Its callbacks only flip
/// this flag; the scheduler reads it on its next tick.
#[derive(Debug, Clone, Default)]
pub struct PeerFlag(Arc<AtomicBool>);

impl PeerFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        self.0.store(connected, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
