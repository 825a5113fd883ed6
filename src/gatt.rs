// Smart Insole - GATT Identifiers
//
// 16-bit ids, fixed for compatibility with existing consumers:
//
//   0x1FFF  service
//   0x2FFF  composite IMU characteristic (24-byte blob), 0x00FF on older units
//   0x01xx  acceleration, 0x02xx gyroscope; xx = 01/02/03 for x/y/z

pub const SERVICE_UUID: u16 = 0x1FFF;
pub const IMU_CHARACTERISTIC_UUID: u16 = 0x2FFF;
pub const LEGACY_IMU_CHARACTERISTIC_UUID: u16 = 0x00FF;

pub const ACCEL_X_UUID: u16 = 0x0101;
pub const ACCEL_Y_UUID: u16 = 0x0102;
pub const ACCEL_Z_UUID: u16 = 0x0103;
pub const GYRO_X_UUID: u16 = 0x0201;
pub const GYRO_Y_UUID: u16 = 0x0202;
pub const GYRO_Z_UUID: u16 = 0x0203;

/// Per-axis characteristics in wire order (aX, aY, aZ, gX, gY, gZ).
pub const AXIS_CHARACTERISTICS: [u16; 6] = [
    ACCEL_X_UUID,
    ACCEL_Y_UUID,
    ACCEL_Z_UUID,
    GYRO_X_UUID,
    GYRO_Y_UUID,
    GYRO_Z_UUID,
];

/// Client Characteristic Configuration descriptor; peers write it to subscribe.
pub const CCCD_UUID: u16 = 0x2902;

const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;

/// Expand a 16-bit id onto the Bluetooth base UUID.
pub const fn uuid128(short: u16) -> u128 {
    BLUETOOTH_BASE_UUID | ((short as u128) << 96)
}

/// Canonical lowercase text form, e.g. `00001fff-0000-1000-8000-00805f9b34fb`.
pub fn uuid128_string(short: u16) -> String {
    let v = uuid128(short);
    format!(
        "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
        (v >> 96) as u32,
        (v >> 80) as u16,
        (v >> 64) as u16,
        (v >> 48) as u16,
        v & 0xFFFF_FFFF_FFFF,
    )
}
