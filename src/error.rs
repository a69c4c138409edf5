use std::fmt::Debug;

use thiserror::Error;

/// Wrapper type for results. `E` is the error of the underlying [`Bus`](crate::bus::Bus).
pub type Result<T, E> = std::result::Result<T, Error<E>>;

/// Errors that all driver functions could return.
///
/// Operations are attempted exactly once. A failed transaction is reported immediately and no
/// partially filled coefficient block or sample is ever handed back.
#[derive(Debug, Error)]
pub enum Error<E: Debug> {
    /// The bus adapter could not be opened, so no transaction was attempted.
    #[error("cannot open bus adapter: {0:?}")]
    AdapterUnavailable(E),

    /// A write or read was not acknowledged, timed out or lost arbitration.
    #[error("bus transaction failed: {0:?}")]
    BusTransactionFailed(E),

    /// The pressure polynomial's denominator evaluated to zero for the loaded coefficients.
    #[error("pressure compensation denominator is zero for these calibration coefficients")]
    DegenerateCalibration,

    /// The chip id register did not read back as a BMP280.
    #[error("unexpected chip id {0:#04x}")]
    UnexpectedChipId(u8),

    /// The address is reserved by the bus or does not fit in 7 bits, so it was not probed.
    #[error("address {0:#04x} is reserved")]
    ReservedAddress(u8),
}

impl<E: Debug> From<crate::compensation::DegenerateCalibration> for Error<E> {
    fn from(_: crate::compensation::DegenerateCalibration) -> Self {
        Error::DegenerateCalibration
    }
}
