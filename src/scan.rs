//! Locating devices on a shared bus.

use std::fmt;

use log::{debug, trace};

use crate::bus::Bus;
use crate::error::{Error, Result};

/// Size of the 7-bit address space.
pub const ADDRESS_COUNT: usize = 128;

/// True for 0x00..=0x07 and 0x78..=0x7F, which the bus reserves for general call, CBUS, high
/// speed mode and 10-bit addressing. Such addresses are never probed.
pub fn reserved(address: u8) -> bool {
    (address & 0x78) == 0x00 || (address & 0x78) == 0x78
}

/// Checks whether a device acknowledges `address` by reading one byte from it.
///
/// Reserved addresses and anything outside the 7-bit range fail with
/// [`Error::ReservedAddress`] without touching the bus. The byte read is discarded.
pub fn probe<B: Bus + ?Sized>(bus: &mut B, address: u8) -> Result<(), B::Error> {
    if usize::from(address) >= ADDRESS_COUNT || reserved(address) {
        return Err(Error::ReservedAddress(address));
    }

    let mut rx = [0xFFu8; 1];
    bus.read(address, &mut rx, true)
        .map_err(Error::BusTransactionFailed)
}

/// Probes every 7-bit address in ascending order.
///
/// Nothing is carried between scans: the same bus responses always give the same report.
pub fn scan<B: Bus + ?Sized>(bus: &mut B) -> ScanReport {
    let mut present = [false; ADDRESS_COUNT];

    for (address, slot) in (0u8..).zip(present.iter_mut()) {
        match probe(bus, address) {
            Ok(()) => {
                debug!("found device at {:#04x}", address);
                *slot = true;
            }
            Err(Error::ReservedAddress(_)) => {}
            Err(e) => trace!("no device at {:#04x}: {}", address, e),
        }
    }

    ScanReport { present }
}

/// Which addresses acknowledged during a [`scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    present: [bool; ADDRESS_COUNT],
}

impl ScanReport {
    /// Every address with its result, ascending. Reserved addresses are reported absent.
    pub fn entries(&self) -> impl Iterator<Item = (u8, bool)> + '_ {
        (0u8..).zip(self.present.iter().copied())
    }

    /// Addresses that acknowledged, ascending.
    pub fn present(&self) -> impl Iterator<Item = u8> + '_ {
        self.entries()
            .filter_map(|(address, present)| if present { Some(address) } else { None })
    }

    pub fn is_present(&self, address: u8) -> bool {
        self.present
            .get(usize::from(address))
            .copied()
            .unwrap_or(false)
    }
}

/// The usual 8x16 grid, `@` where a device answered and `.` elsewhere.
impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "  ")?;
        for column in 0..16 {
            write!(f, " {:X}", column)?;
        }
        writeln!(f)?;

        for (row, chunk) in self.present.chunks(16).enumerate() {
            write!(f, "{:02x}", row * 16)?;
            for present in chunk {
                write!(f, " {}", if *present { '@' } else { '.' })?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
