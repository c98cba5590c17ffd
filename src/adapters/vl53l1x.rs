//! VL53L1X driver adapter.
//!
//! Wraps the `vl53l1x-uld` ultra-lite driver over a Linux `/dev/i2c-*`
//! character device.  The bus is opened fresh for every session and
//! released on [`close`](TofDriver::close), so nothing is held while the
//! sensor is powered down.
//!
//! One sample is fetched per [`read_distance_mm`](TofDriver::read_distance_mm):
//! poll the data-ready flag (bounded by [`DATA_READY_TIMEOUT`]), read the
//! result, then clear the interrupt so the next ranging period can start.

use core::fmt::Debug;
use std::time::{Duration, Instant};

use linux_embedded_hal::I2cdev;
use log::{debug, trace};
use vl53l1x_uld::{DistanceMode, IOVoltage, RangeStatus, VL53L1X};

use crate::app::ports::TofDriver;
use crate::error::SensorError;
use crate::sensors::RangingMode;

/// Model id reported by a genuine VL53L1X.
pub const SENSOR_ID: u16 = 0xEACC;

/// Upper bound on waiting for a ranging result.
pub const DATA_READY_TIMEOUT: Duration = Duration::from_secs(1);

/// Poll interval for the data-ready flag.
const DATA_READY_POLL: Duration = Duration::from_millis(5);

fn describe<E: Debug>(e: vl53l1x_uld::Error<E>) -> String {
    format!("{:?}", e)
}

/// [`TofDriver`] for one VL53L1X at a time.
#[derive(Default)]
pub struct Vl53l1xDriver {
    device: Option<VL53L1X<I2cdev>>,
}

impl Vl53l1xDriver {
    pub fn new() -> Self {
        Self { device: None }
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }
}

impl TofDriver for Vl53l1xDriver {
    fn open(&mut self, bus: &str, address: u8, mode: RangingMode) -> Result<(), SensorError> {
        // A stale handle means the previous session was never closed.
        if self.device.is_some() {
            self.close()?;
        }

        let i2c = I2cdev::new(bus).map_err(|e| SensorError::Init(format!("{}: {}", bus, e)))?;
        let mut vl = VL53L1X::new(i2c, address);

        let id = vl
            .get_sensor_id()
            .map_err(|e| SensorError::Init(describe(e)))?;
        if id != SENSOR_ID {
            return Err(SensorError::Init(format!(
                "unexpected sensor id 0x{:04x} at 0x{:02x}",
                id, address
            )));
        }

        vl.init(IOVoltage::Volt2_8)
            .map_err(|e| SensorError::Init(describe(e)))?;
        let distance_mode = match mode {
            RangingMode::Short => DistanceMode::Short,
            RangingMode::Long => DistanceMode::Long,
        };
        vl.set_distance_mode(distance_mode)
            .map_err(|e| SensorError::Init(describe(e)))?;
        vl.start_ranging()
            .map_err(|e| SensorError::Init(describe(e)))?;

        debug!("vl53l1x: ranging ({:?}) on {} @ 0x{:02x}", mode, bus, address);
        self.device = Some(vl);
        Ok(())
    }

    fn read_distance_mm(&mut self) -> Result<u16, SensorError> {
        let vl = self
            .device
            .as_mut()
            .ok_or_else(|| SensorError::Read("sensor not open".into()))?;

        let deadline = Instant::now() + DATA_READY_TIMEOUT;
        while !vl
            .is_data_ready()
            .map_err(|e| SensorError::Read(describe(e)))?
        {
            if Instant::now() >= deadline {
                return Err(SensorError::DataTimeout);
            }
            std::thread::sleep(DATA_READY_POLL);
        }

        let result = vl
            .get_result()
            .map_err(|e| SensorError::Read(describe(e)))?;
        vl.clear_interrupt()
            .map_err(|e| SensorError::Read(describe(e)))?;

        if result.status != RangeStatus::Valid {
            trace!("vl53l1x: range status not valid ({} mm)", result.distance_mm);
        }
        Ok(result.distance_mm)
    }

    fn close(&mut self) -> Result<(), SensorError> {
        let Some(mut vl) = self.device.take() else {
            return Ok(());
        };
        vl.stop_ranging()
            .map_err(|e| SensorError::Close(describe(e)))
    }
}
