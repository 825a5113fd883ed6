// Smart Insole - ESP32 One-Shot ADC Driver
//
// Raw ESP-IDF oneshot API on ADC1 with 11 dB attenuation (0-3.3 V range).
// Only ADC1 is touched: ADC2 is shared with the radio.

use esp_idf_sys::{self as sys, esp};

use crate::config::adc1_channel_for_gpio;
use crate::drivers::AdcReader;
use crate::error::DriverError;

pub struct OneshotAdc {
    handle: sys::adc_oneshot_unit_handle_t,
}

// The handle is only used from the pipeline thread after construction.
unsafe impl Send for OneshotAdc {}

impl OneshotAdc {
    /// Create the ADC1 unit and configure a channel for each pin.
    pub fn new(pins: &[u8]) -> anyhow::Result<Self> {
        let mut handle: sys::adc_oneshot_unit_handle_t = core::ptr::null_mut();

        unsafe {
            let unit_cfg = sys::adc_oneshot_unit_init_cfg_t {
                unit_id: sys::adc_unit_t_ADC_UNIT_1,
                ulp_mode: sys::adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
                ..core::mem::zeroed()
            };
            esp!(sys::adc_oneshot_new_unit(&unit_cfg, &mut handle))?;

            let chan_cfg = sys::adc_oneshot_chan_cfg_t {
                atten: sys::adc_atten_t_ADC_ATTEN_DB_11,
                bitwidth: sys::adc_bitwidth_t_ADC_BITWIDTH_12,
            };
            for &pin in pins {
                let channel = adc1_channel_for_gpio(pin)
                    .ok_or(DriverError::UnsupportedPin(pin))?;
                esp!(sys::adc_oneshot_config_channel(handle, channel, &chan_cfg))?;
            }
        }

        log::info!("ADC1 oneshot configured for GPIO {:?}", pins);
        Ok(Self { handle })
    }
}

impl AdcReader for OneshotAdc {
    fn read_raw(&mut self, pin: u8) -> Result<u16, DriverError> {
        let channel = adc1_channel_for_gpio(pin).ok_or(DriverError::UnsupportedPin(pin))?;
        let mut raw: i32 = 0;
        let ret = unsafe { sys::adc_oneshot_read(self.handle, channel, &mut raw) };
        if ret != sys::ESP_OK {
            return Err(DriverError::Adc { pin, code: ret });
        }
        Ok(raw.clamp(0, u16::MAX as i32) as u16)
    }
}

impl Drop for OneshotAdc {
    fn drop(&mut self) {
        unsafe {
            sys::adc_oneshot_del_unit(self.handle);
        }
    }
}
