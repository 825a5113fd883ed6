// Smart Insole - Firmware Entry Point
//
// Boot sequence (ESP32):
//   1. Initialise logging and take the peripherals.
//   2. Validate the pipeline configuration for the selected variant.
//   3. Configure ADC1 for the FSR pins; bring up I2C + MPU6050 when fused.
//   4. Start the transport: NimBLE GATT service + advertising, or the UART
//      broadcast.
//   5. Spawn the pipeline task; the main thread parks.
//
// Any failure in 2-4, or an IMU that will not start, is fatal: it is logged
// and the firmware stops doing work instead of running degraded.
//
// On a workstation the same pipeline runs against simulated sensors and
// prints the broadcast stream to stdout for a few seconds.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use smart_insole::config::PipelineConfig;
use smart_insole::drivers::ImuSource;
use smart_insole::scheduler::{MonotonicClock, PublicationScheduler};
use smart_insole::tasks;
use smart_insole::transport::TransportPublisher;

type BoxedImu = Box<dyn ImuSource + Send>;
type BoxedTransport = Box<dyn TransportPublisher + Send>;

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------
#[cfg(target_os = "espidf")]
fn main() {
    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Smart insole firmware starting…");

    if let Err(e) = boot() {
        log::error!("Fatal: {:#} - halting", e);
    }

    // Either the pipeline task owns the hardware now, or boot failed.
    // Nothing left to do on this thread.
    loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
    }
}

#[cfg(target_os = "espidf")]
fn boot() -> anyhow::Result<()> {
    use std::sync::Mutex;

    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;
    use smart_insole::config::{TransportKind, I2C_BAUDRATE_KHZ};
    use smart_insole::drivers::adc::OneshotAdc;
    use smart_insole::drivers::imu::{Mpu6050, SharedBus};
    use smart_insole::drivers::NoImu;
    use smart_insole::transport::ble::NimbleGatt;
    use smart_insole::transport::{BroadcastTransport, NotifyTransport, PeerFlag};

    let config = PipelineConfig::firmware_default();
    config.validate()?;

    let peripherals = Peripherals::take()?;

    // ---- FSRs on ADC1 ------------------------------------------------------
    let adc = OneshotAdc::new(&config.pins())?;

    // ---- IMU (fused variants only) ----------------------------------------
    let imu: BoxedImu = if config.imu_enabled {
        let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
        let i2c = I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio21, // SDA
            peripherals.pins.gpio22, // SCL
            &i2c_config,
        )?;
        // The bus lives for the rest of the programme.
        let bus: SharedBus = Box::leak(Box::new(Mutex::new(i2c)));
        Box::new(Mpu6050::new(bus))
    } else {
        Box::new(NoImu)
    };

    // ---- Transport ---------------------------------------------------------
    let transport: BoxedTransport = match config.transport {
        TransportKind::Notify => {
            let peer = PeerFlag::new();
            let gatt = NimbleGatt::start(
                config.device_name,
                config.composite_characteristic,
                config.expose_axis_characteristics,
                peer.clone(),
            )?;
            Box::new(NotifyTransport::new(
                gatt,
                peer,
                config.composite_characteristic,
                config.expose_axis_characteristics,
            ))
        }
        TransportKind::Broadcast => Box::new(BroadcastTransport::new(
            std::io::stdout(),
            &config.pins(),
            config.broadcast_format,
        )?),
    };

    // ---- Pipeline task -----------------------------------------------------
    let scheduler = PublicationScheduler::new(config, adc, imu, transport)?;
    let stop = Arc::new(AtomicBool::new(false));
    tasks::pipeline::spawn(scheduler, MonotonicClock::new(), stop)?;

    log::info!("Boot complete - entering normal operation");
    Ok(())
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------
#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    use std::sync::atomic::Ordering;
    use std::thread;
    use std::time::Duration;

    use smart_insole::config::{TransportKind, HOST_SIMULATION_MS};
    use smart_insole::drivers::sim::{SimulatedAdc, SimulatedImu};
    use smart_insole::drivers::NoImu;
    use smart_insole::transport::BroadcastTransport;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Smart insole host simulation starting…");

    // No radio on a workstation: everything goes to stdout.
    let config = PipelineConfig {
        transport: TransportKind::Broadcast,
        radio_enabled: false,
        ..PipelineConfig::firmware_default()
    };

    let adc = SimulatedAdc::new(&config.pins(), 40)?;
    let imu: BoxedImu = if config.imu_enabled {
        Box::new(SimulatedImu::default())
    } else {
        Box::new(NoImu)
    };
    let transport: BoxedTransport = Box::new(BroadcastTransport::new(
        std::io::stdout(),
        &config.pins(),
        config.broadcast_format,
    )?);

    let scheduler = PublicationScheduler::new(config, adc, imu, transport)?;
    let stop = Arc::new(AtomicBool::new(false));
    let handle = tasks::pipeline::spawn(scheduler, MonotonicClock::new(), Arc::clone(&stop))?;

    thread::sleep(Duration::from_millis(HOST_SIMULATION_MS));
    stop.store(true, Ordering::Relaxed);

    let status = handle
        .join()
        .map_err(|_| anyhow::anyhow!("pipeline thread panicked"))?;
    log::info!("Simulation finished ({:?})", status);
    Ok(())
}
