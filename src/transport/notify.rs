// Smart Insole - Notify Characteristic Transport

use crate::error::TransportError;
use crate::gatt::AXIS_CHARACTERISTICS;
use crate::record::PublishRecord;
use crate::transport::{PeerFlag, TransportPublisher};

/// The radio stack's GATT server, reduced to "set value and notify".
pub trait GattServer {
    /// A peer has enabled notifications through the characteristic's CCCD.
    fn is_subscribed(&self, characteristic: u16) -> bool;

    fn notify(&mut self, characteristic: u16, value: &[u8]) -> Result<(), TransportError>;
}

pub struct NotifyTransport<G> {
    gatt: G,
    peer: PeerFlag,
    composite: u16,
    expose_axes: bool,
}

impl<G: GattServer> NotifyTransport<G> {
    pub fn new(gatt: G, peer: PeerFlag, composite: u16, expose_axes: bool) -> Self {
        Self {
            gatt,
            peer,
            composite,
            expose_axes,
        }
    }

    pub fn peer(&self) -> &PeerFlag {
        &self.peer
    }
}

impl<G: GattServer> TransportPublisher for NotifyTransport<G> {
    fn requires_peer(&self) -> bool {
        true
    }

    fn is_peer_present(&self) -> bool {
        self.peer.is_connected()
    }

    fn send(&mut self, record: &PublishRecord) -> Result<(), TransportError> {
        if !self.peer.is_connected() {
            return Err(TransportError::NoPeer);
        }
        if !self.gatt.is_subscribed(self.composite) {
            return Err(TransportError::NotSubscribed {
                characteristic: self.composite,
            });
        }

        self.gatt.notify(self.composite, record.bytes())?;

        // Per-axis values go only to the characteristics a consumer subscribed to.
        if self.expose_axes {
            if let Some(motion) = record.reading().motion {
                for (&uuid, value) in AXIS_CHARACTERISTICS.iter().zip(motion.axes()) {
                    if self.gatt.is_subscribed(uuid) {
                        self.gatt.notify(uuid, &value.to_le_bytes())?;
                    }
                }
            }
        }
        Ok(())
    }
}
