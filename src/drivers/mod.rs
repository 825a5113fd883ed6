// Smart Insole - Hardware Collaborators
//
// The pipeline only sees these two traits. ESP32 implementations live in
// `adc` and `imu`; `sim` provides synthetic sources for host runs.

#[cfg(target_os = "espidf")]
pub mod adc;
#[cfg(target_os = "espidf")]
pub mod imu;
pub mod sim;

use crate::error::DriverError;
use crate::events::Vector3D;

/// One-shot analog read of a GPIO. Codes are in `[0, ADC_RANGE)`.
pub trait AdcReader {
    fn read_raw(&mut self, pin: u8) -> Result<u16, DriverError>;
}

/// 6-axis inertial sensor.
pub trait ImuSource {
    /// Bring the device up. A failure here halts the pipeline.
    fn begin(&mut self) -> Result<(), DriverError>;
    fn acceleration_available(&mut self) -> bool;
    fn read_acceleration(&mut self) -> Result<Vector3D, DriverError>;
    fn gyroscope_available(&mut self) -> bool;
    fn read_gyroscope(&mut self) -> Result<Vector3D, DriverError>;
}

/// Stand-in for builds without an IMU; never has data.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImu;

impl ImuSource for NoImu {
    fn begin(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    fn acceleration_available(&mut self) -> bool {
        false
    }

    fn read_acceleration(&mut self) -> Result<Vector3D, DriverError> {
        Err(DriverError::NotConnected)
    }

    fn gyroscope_available(&mut self) -> bool {
        false
    }

    fn read_gyroscope(&mut self) -> Result<Vector3D, DriverError> {
        Err(DriverError::NotConnected)
    }
}

impl<T: ImuSource + ?Sized> ImuSource for Box<T> {
    fn begin(&mut self) -> Result<(), DriverError> {
        (**self).begin()
    }

    fn acceleration_available(&mut self) -> bool {
        (**self).acceleration_available()
    }

    fn read_acceleration(&mut self) -> Result<Vector3D, DriverError> {
        (**self).read_acceleration()
    }

    fn gyroscope_available(&mut self) -> bool {
        (**self).gyroscope_available()
    }

    fn read_gyroscope(&mut self) -> Result<Vector3D, DriverError> {
        (**self).read_gyroscope()
    }
}
