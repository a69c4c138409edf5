//! Factory calibration coefficients (dig_T1..dig_T3, dig_P1..dig_P9).

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use crate::bus::{read_registers, Bus};
use crate::error::Result;
use crate::register::Register;

/// Size of the calibration block, 12 little-endian words.
pub const CALIBRATION_LEN: usize = 24;

/// Calibration data for one BMP280.
///
/// Only `dig_t1` and `dig_p1` are unsigned; every other word is two's complement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalibrationCoefficients {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,

    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
}

impl CalibrationCoefficients {
    /// Decodes the block as read from 0x88..=0x9F. Each coefficient is LSB register first.
    pub fn from_bytes(buf: &[u8; CALIBRATION_LEN]) -> Self {
        CalibrationCoefficients {
            dig_t1: LittleEndian::read_u16(&buf[0..2]),
            dig_t2: LittleEndian::read_i16(&buf[2..4]),
            dig_t3: LittleEndian::read_i16(&buf[4..6]),

            dig_p1: LittleEndian::read_u16(&buf[6..8]),
            dig_p2: LittleEndian::read_i16(&buf[8..10]),
            dig_p3: LittleEndian::read_i16(&buf[10..12]),
            dig_p4: LittleEndian::read_i16(&buf[12..14]),
            dig_p5: LittleEndian::read_i16(&buf[14..16]),
            dig_p6: LittleEndian::read_i16(&buf[16..18]),
            dig_p7: LittleEndian::read_i16(&buf[18..20]),
            dig_p8: LittleEndian::read_i16(&buf[20..22]),
            dig_p9: LittleEndian::read_i16(&buf[22..24]),
        }
    }

    /// The register image these coefficients were decoded from.
    pub fn to_bytes(&self) -> [u8; CALIBRATION_LEN] {
        let mut buf = [0u8; CALIBRATION_LEN];

        LittleEndian::write_u16(&mut buf[0..2], self.dig_t1);
        LittleEndian::write_i16(&mut buf[2..4], self.dig_t2);
        LittleEndian::write_i16(&mut buf[4..6], self.dig_t3);

        LittleEndian::write_u16(&mut buf[6..8], self.dig_p1);
        LittleEndian::write_i16(&mut buf[8..10], self.dig_p2);
        LittleEndian::write_i16(&mut buf[10..12], self.dig_p3);
        LittleEndian::write_i16(&mut buf[12..14], self.dig_p4);
        LittleEndian::write_i16(&mut buf[14..16], self.dig_p5);
        LittleEndian::write_i16(&mut buf[16..18], self.dig_p6);
        LittleEndian::write_i16(&mut buf[18..20], self.dig_p7);
        LittleEndian::write_i16(&mut buf[20..22], self.dig_p8);
        LittleEndian::write_i16(&mut buf[22..24], self.dig_p9);

        buf
    }
}

/// Reads the calibration block from the device at `address`.
///
/// One pointer write and one 24-byte read. Nothing is returned if either transaction fails.
pub fn load<B: Bus + ?Sized>(
    bus: &mut B,
    address: u8,
) -> Result<CalibrationCoefficients, B::Error> {
    let mut buf = [0u8; CALIBRATION_LEN];
    read_registers(bus, address, Register::Calibration, &mut buf)?;

    let coefficients = CalibrationCoefficients::from_bytes(&buf);
    debug!("calibration {:#04x}: {:?}", address, coefficients);

    Ok(coefficients)
}
