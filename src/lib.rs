//! Driver for the Bosch BMP280 barometer.
//!
//! The device is configured once (500 ms standby, x16 IIR filter, x1 temperature and x4
//! pressure oversampling, normal mode) and then runs continuously. Every [`Bmp280::read`] pulls
//! the latest raw sample and the calibration block and compensates them with the datasheet's
//! 32-bit fixed-point formulas.
//!
//! None of this is safe to call from two places at once on the same bus. Each operation needs
//! `&mut` access to the [`Bus`] for its whole pointer-write-then-read sequence; share a bus
//! between threads by putting it behind a `Mutex` and lending the guard.

pub mod bus;
pub mod calibration;
pub mod compensation;
pub mod error;
pub mod register;
pub mod sample;
pub mod scan;

#[cfg(test)]
mod testing;

use i2cdev::linux::LinuxI2CError;
use log::{debug, info};

pub use crate::bus::{Bus, CombinedBus, Hal, HalBus, LinuxBus, Transfer};
pub use crate::calibration::CalibrationCoefficients;
pub use crate::compensation::{CompensatedSample, DegenerateCalibration};
pub use crate::error::{Error, Result};
pub use crate::sample::RawSample;
pub use crate::scan::{scan, ScanReport};

use crate::bus::{read_registers, write_register};
use crate::register::{Register, CHIP_ID, CONFIG, CONTROL, SOFT_RESET};

pub const DEFAULT_I2C_ADDRESS: u8 = register::PRIMARY_ADDRESS;
pub const DEFAULT_I2C_PATH: &str = "/dev/i2c-1";

/// A single BMP280 sensor on a bus.
///
/// Holds no calibration between calls; only the device itself keeps state (its operating mode).
pub struct Bmp280<B> {
    bus: B,
    address: u8,
}

/// A builder for Bmp280 sensors on a Linux I2C adapter.
///
/// ```ignore
/// let mut sensor = Bmp280Builder::new()
///     .address(0x77)
///     .path("/dev/i2c-1".to_string())
///     .build()
///     .expect("Failed to build device");
///
/// let sample = sensor.read()?;
///
/// // Minimal example
/// let mut sensor = Bmp280Builder::new().build().expect("Failed to build device");
/// ```
pub struct Bmp280Builder {
    i2c_address: u8,
    i2c_path: String,
    verify_chip_id: bool,
}

impl Default for Bmp280Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Bmp280Builder {
    pub fn new() -> Self {
        Bmp280Builder {
            i2c_address: DEFAULT_I2C_ADDRESS,
            i2c_path: DEFAULT_I2C_PATH.to_string(),
            verify_chip_id: true,
        }
    }

    /// Set the address of the I2C device for the sensor. Defaults to 0x76.
    pub fn address(&mut self, address: u8) -> &mut Self {
        self.i2c_address = address;
        self
    }

    /// Set the path of the I2C adapter. Defaults to `/dev/i2c-1`.
    pub fn path(&mut self, path: String) -> &mut Self {
        self.i2c_path = path;
        self
    }

    /// Whether `build()` checks for an acknowledge and a BMP280 chip id before configuring.
    pub fn verify_chip_id(&mut self, verify: bool) -> &mut Self {
        self.verify_chip_id = verify;
        self
    }

    /// Open the adapter and put the sensor into its operating mode.
    pub fn build(&self) -> Result<Bmp280<LinuxBus>, LinuxI2CError> {
        let bus = LinuxBus::open(&self.i2c_path).map_err(Error::AdapterUnavailable)?;
        let mut sensor = Bmp280::new(bus, self.i2c_address);

        if self.verify_chip_id {
            sensor.probe()?;
            sensor.verify_chip_id()?;
        }

        sensor.configure()?;
        info!(
            "bmp280 on {} at {:#04x} configured",
            self.i2c_path, self.i2c_address
        );

        Ok(sensor)
    }
}

impl<B: Bus> Bmp280<B> {
    /// Wraps a bus handle. Nothing is sent until an operation is called.
    pub fn new(bus: B, address: u8) -> Self {
        Bmp280 { bus, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Gives back the bus handle.
    pub fn release(self) -> B {
        self.bus
    }

    /// Checks that something acknowledges the sensor's address.
    pub fn probe(&mut self) -> Result<(), B::Error> {
        scan::probe(&mut self.bus, self.address)
    }

    pub fn chip_id(&mut self) -> Result<u8, B::Error> {
        let mut buf = [0u8; 1];
        read_registers(&mut self.bus, self.address, Register::ChipId, &mut buf)?;

        Ok(buf[0])
    }

    /// Fails with [`Error::UnexpectedChipId`] unless the chip id reads 0x58.
    pub fn verify_chip_id(&mut self) -> Result<(), B::Error> {
        match self.chip_id()? {
            CHIP_ID => Ok(()),
            other => Err(Error::UnexpectedChipId(other)),
        }
    }

    /// Writes the config register, then ctrl_meas, which starts normal mode. Nothing is read back.
    pub fn configure(&mut self) -> Result<(), B::Error> {
        debug!("bmp280 {:#04x}: config {:#04x}", self.address, CONFIG);
        write_register(&mut self.bus, self.address, Register::Config, CONFIG)?;

        debug!("bmp280 {:#04x}: ctrl_meas {:#04x}", self.address, CONTROL);
        write_register(&mut self.bus, self.address, Register::Control, CONTROL)?;

        Ok(())
    }

    /// Soft reset, same effect as power-on reset. The device comes back in sleep mode, so
    /// [`configure`](Self::configure) has to run again before sampling.
    pub fn reset(&mut self) -> Result<(), B::Error> {
        debug!("bmp280 {:#04x}: soft reset", self.address);
        write_register(&mut self.bus, self.address, Register::SoftReset, SOFT_RESET)
    }

    pub fn read_raw(&mut self) -> Result<RawSample, B::Error> {
        sample::read_raw(&mut self.bus, self.address)
    }

    pub fn load_calibration(&mut self) -> Result<CalibrationCoefficients, B::Error> {
        calibration::load(&mut self.bus, self.address)
    }

    /// One sampling cycle: raw sample, then calibration, then compensation.
    ///
    /// Calibration is fetched again every time rather than cached. A zero pressure denominator
    /// is reported as [`Error::DegenerateCalibration`] instead of a zero reading.
    pub fn read(&mut self) -> Result<CompensatedSample, B::Error> {
        let raw = self.read_raw()?;
        let coefficients = self.load_calibration()?;

        let sample = compensation::compensate(&raw, &coefficients)?;
        debug!(
            "bmp280 {:#04x}: raw {:?} -> {:?}",
            self.address, raw, sample
        );

        Ok(sample)
    }
}
