/// The BMP280 registers this driver touches.
///
/// Multi-byte blocks auto-increment, so only the first register of each block is listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// dig_T1 LSB, first of the 24 calibration bytes (0x88..=0x9F)
    Calibration,

    ChipId,
    SoftReset,

    /// ctrl_meas: oversampling and power mode
    Control,
    /// standby time, IIR filter, 3-wire SPI
    Config,

    /// press_msb, first of the 6 data bytes (0xF7..=0xFC)
    PressureData,
}

impl From<Register> for u8 {
    fn from(frm: Register) -> u8 {
        use self::Register::*;
        match frm {
            Calibration => 0x88,

            ChipId => 0xD0,
            SoftReset => 0xE0,

            Control => 0xF4,
            Config => 0xF5,

            PressureData => 0xF7,
        }
    }
}

/// Address with SDO tied to GND.
pub const PRIMARY_ADDRESS: u8 = 0x76;
/// Address with SDO tied to VDDIO.
pub const SECONDARY_ADDRESS: u8 = 0x77;

/// Value of [`Register::ChipId`] on a BMP280.
pub const CHIP_ID: u8 = 0x58;

/// Writing this to [`Register::SoftReset`] runs the power-on-reset sequence.
pub const SOFT_RESET: u8 = 0xB6;

const STANDBY_500_MS: u8 = 0b100;
const FILTER_X16: u8 = 0b101;

const OVERSAMPLING_X1: u8 = 0b001;
const OVERSAMPLING_X4: u8 = 0b011;
const MODE_NORMAL: u8 = 0b11;

/// t_sb = 500 ms, IIR filter x16, 3-wire SPI off.
pub const CONFIG: u8 = ((STANDBY_500_MS << 5) | (FILTER_X16 << 2)) & 0xFC;

/// osrs_t = x1, osrs_p = x4, normal mode.
pub const CONTROL: u8 = (OVERSAMPLING_X1 << 5) | (OVERSAMPLING_X4 << 2) | MODE_NORMAL;
