use byteorder::{BigEndian, ByteOrder};

use crate::bus::{read_registers, Bus};
use crate::error::Result;
use crate::register::Register;

/// Size of the press_msb..temp_xlsb block.
pub const SAMPLE_LEN: usize = 6;

/// Uncompensated ADC readings, each a 20-bit unsigned value in the low bits of an `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub pressure: i32,
    pub temperature: i32,
}

impl RawSample {
    /// Unpacks pressure from bytes 0..3 and temperature from bytes 3..6.
    ///
    /// Each value is `msb << 12 | lsb << 4 | xlsb >> 4`; the low nibble of xlsb is unused.
    pub fn from_bytes(buf: &[u8; SAMPLE_LEN]) -> Self {
        RawSample {
            pressure: (BigEndian::read_u24(&buf[0..3]) >> 4) as i32,
            temperature: (BigEndian::read_u24(&buf[3..6]) >> 4) as i32,
        }
    }
}

/// Reads one pressure/temperature pair from the device at `address`.
pub fn read_raw<B: Bus + ?Sized>(bus: &mut B, address: u8) -> Result<RawSample, B::Error> {
    let mut buf = [0u8; SAMPLE_LEN];
    read_registers(bus, address, Register::PressureData, &mut buf)?;

    Ok(RawSample::from_bytes(&buf))
}
