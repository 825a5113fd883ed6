// Smart Insole - NimBLE GATT Backend
//
// Registers the 0x1FFF service, its read/notify characteristics, and starts
// advertising. Connection and subscription callbacks run on the NimBLE host
// task and only touch atomics: the shared `PeerFlag` and, per characteristic,
// the connection handle of its subscriber.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use esp32_nimble::utilities::mutex::Mutex;
use esp32_nimble::utilities::BleUuid;
use esp32_nimble::{
    BLEAdvertisementData, BLECharacteristic, BLEDevice, NimbleProperties, NimbleSub,
};

use crate::error::TransportError;
use crate::gatt::{AXIS_CHARACTERISTICS, SERVICE_UUID};
use crate::transport::{GattServer, PeerFlag};

const NO_SUBSCRIBER: u32 = u32::MAX;

/// Connection handle that enabled notifications, or `NO_SUBSCRIBER`.
type Subscriber = Arc<AtomicU32>;

struct Notifier {
    uuid: u16,
    characteristic: Arc<Mutex<BLECharacteristic>>,
    subscriber: Subscriber,
}

pub struct NimbleGatt {
    notifiers: Vec<Notifier>,
}

// Characteristic handles are only used from the pipeline thread once setup
// has returned.
unsafe impl Send for NimbleGatt {}

impl NimbleGatt {
    pub fn start(
        device_name: &str,
        composite: u16,
        expose_axes: bool,
        peer: PeerFlag,
    ) -> anyhow::Result<Self> {
        let device = BLEDevice::take();
        let server = device.get_server();

        let service = server.create_service(BleUuid::from_uuid16(SERVICE_UUID));
        let properties = NimbleProperties::READ | NimbleProperties::NOTIFY;

        let mut uuids = vec![composite];
        if expose_axes {
            uuids.extend_from_slice(&AXIS_CHARACTERISTICS);
        }
        let notifiers: Vec<Notifier> = uuids
            .into_iter()
            .map(|uuid| {
                let characteristic = service
                    .lock()
                    .create_characteristic(BleUuid::from_uuid16(uuid), properties);
                let subscriber: Subscriber = Arc::new(AtomicU32::new(NO_SUBSCRIBER));

                let slot = Arc::clone(&subscriber);
                characteristic.lock().on_subscribe(move |_ch, desc, sub| {
                    if sub.contains(NimbleSub::NOTIFY) {
                        log::info!("Peer subscribed to {:#06x}", uuid);
                        slot.store(desc.conn_handle() as u32, Ordering::Release);
                    } else {
                        log::info!("Peer unsubscribed from {:#06x}", uuid);
                        slot.store(NO_SUBSCRIBER, Ordering::Release);
                    }
                });

                Notifier {
                    uuid,
                    characteristic,
                    subscriber,
                }
            })
            .collect();

        let connected = peer.clone();
        server.on_connect(move |_server, desc| {
            log::info!("BLE peer connected: {:?}", desc.address());
            connected.set_connected(true);
        });
        let subscribers: Vec<Subscriber> =
            notifiers.iter().map(|n| Arc::clone(&n.subscriber)).collect();
        server.on_disconnect(move |_desc, reason| {
            log::info!("BLE peer disconnected ({:?})", reason);
            for subscriber in &subscribers {
                subscriber.store(NO_SUBSCRIBER, Ordering::Release);
            }
            peer.set_connected(false);
        });
        server.advertise_on_disconnect(true);

        let advertising = device.get_advertising();
        advertising
            .lock()
            .set_data(
                BLEAdvertisementData::new()
                    .name(device_name)
                    .add_service_uuid(BleUuid::from_uuid16(SERVICE_UUID)),
            )
            .map_err(|e| anyhow::anyhow!("BLE advertising data rejected: {:?}", e))?;
        advertising
            .lock()
            .start()
            .map_err(|e| anyhow::anyhow!("BLE advertising failed to start: {:?}", e))?;

        log::info!("Advertising \"{}\" with service {:#06x}", device_name, SERVICE_UUID);
        Ok(Self { notifiers })
    }

    fn find(&self, characteristic: u16) -> Option<&Notifier> {
        self.notifiers.iter().find(|n| n.uuid == characteristic)
    }
}

impl GattServer for NimbleGatt {
    fn is_subscribed(&self, characteristic: u16) -> bool {
        self.find(characteristic)
            .map_or(false, |n| n.subscriber.load(Ordering::Acquire) != NO_SUBSCRIBER)
    }

    fn notify(&mut self, characteristic: u16, value: &[u8]) -> Result<(), TransportError> {
        let notifier = self
            .find(characteristic)
            .ok_or(TransportError::Notify { characteristic })?;
        let handle = notifier.subscriber.load(Ordering::Acquire);
        if handle == NO_SUBSCRIBER {
            return Err(TransportError::NotSubscribed { characteristic });
        }

        let mut ch = notifier.characteristic.lock();
        ch.set_value(value);
        ch.notify_with(value, handle as u16).map_err(|e| {
            log::warn!("NimBLE notify on {:#06x} failed: {:?}", characteristic, e);
            TransportError::Notify { characteristic }
        })
    }
}
