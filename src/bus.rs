//! Blocking two-wire bus transport.
//!
//! Every register access on the BMP280 is a write of the register pointer followed by a data
//! transfer. The [`Bus`] trait exposes both halves separately, with a flag saying whether the
//! bus stays claimed for the operation that follows. Nothing here serializes concurrent callers:
//! a pointer write and its read must reach the bus as one unit, so whoever shares a bus between
//! tasks has to lock it around the whole pair (taking `&mut` for the pair does exactly that).

use std::fmt::Debug;
use std::path::Path;

use embedded_hal::i2c::{I2c, Operation};
use i2cdev::core::{I2CMessage, I2CTransfer};
use i2cdev::linux::{LinuxI2CBus, LinuxI2CError, LinuxI2CMessage};
use log::trace;

use crate::error::{Error, Result};
use crate::register::Register;

/// A blocking bus primitive.
pub trait Bus {
    type Error: Debug;

    /// Writes `bytes` to the device at `address`. With `keep_bus_held` the bus is not released
    /// afterwards, so the next operation follows with a repeated start.
    fn write(
        &mut self,
        address: u8,
        bytes: &[u8],
        keep_bus_held: bool,
    ) -> std::result::Result<(), Self::Error>;

    /// Fills `buffer` from the device at `address`, releasing the bus afterwards when
    /// `release_bus` is set. On failure the buffer contents are unspecified.
    fn read(
        &mut self,
        address: u8,
        buffer: &mut [u8],
        release_bus: bool,
    ) -> std::result::Result<(), Self::Error>;
}

impl<B: Bus + ?Sized> Bus for &mut B {
    type Error = B::Error;

    fn write(
        &mut self,
        address: u8,
        bytes: &[u8],
        keep_bus_held: bool,
    ) -> std::result::Result<(), Self::Error> {
        (**self).write(address, bytes, keep_bus_held)
    }

    fn read(
        &mut self,
        address: u8,
        buffer: &mut [u8],
        release_bus: bool,
    ) -> std::result::Result<(), Self::Error> {
        (**self).read(address, buffer, release_bus)
    }
}

/// Reads `buffer.len()` consecutive registers starting at `register`.
///
/// The device auto-increments its register pointer, so one pointer write and one read cover the
/// whole block.
pub(crate) fn read_registers<B: Bus + ?Sized>(
    bus: &mut B,
    address: u8,
    register: Register,
    buffer: &mut [u8],
) -> Result<(), B::Error> {
    bus.write(address, &[register.into()], true)
        .map_err(Error::BusTransactionFailed)?;
    bus.read(address, buffer, true)
        .map_err(Error::BusTransactionFailed)?;

    Ok(())
}

/// Writes a single register as one two-byte transaction.
pub(crate) fn write_register<B: Bus + ?Sized>(
    bus: &mut B,
    address: u8,
    register: Register,
    value: u8,
) -> Result<(), B::Error> {
    bus.write(address, &[register.into(), value], false)
        .map_err(Error::BusTransactionFailed)
}

/// One leg of a combined transfer.
#[derive(Debug)]
pub enum Segment<'a> {
    Write(u8, &'a [u8]),
    Read(u8, &'a mut [u8]),
}

impl Segment<'_> {
    pub fn address(&self) -> u8 {
        match self {
            Segment::Write(address, _) | Segment::Read(address, _) => *address,
        }
    }
}

/// Runs a list of segments back to back without releasing the bus in between.
pub trait Transfer {
    type Error: Debug;

    fn combined(&mut self, segments: &mut [Segment<'_>]) -> std::result::Result<(), Self::Error>;
}

impl Transfer for LinuxI2CBus {
    type Error = LinuxI2CError;

    /// One `I2C_RDWR` ioctl, repeated start between the messages.
    fn combined(&mut self, segments: &mut [Segment<'_>]) -> std::result::Result<(), LinuxI2CError> {
        let mut messages: Vec<LinuxI2CMessage> = segments
            .iter_mut()
            .map(|segment| match segment {
                Segment::Write(address, bytes) => {
                    LinuxI2CMessage::write(*bytes).with_address(u16::from(*address))
                }
                Segment::Read(address, buffer) => {
                    LinuxI2CMessage::read(&mut **buffer).with_address(u16::from(*address))
                }
            })
            .collect();

        I2CTransfer::transfer(self, &mut messages)?;

        Ok(())
    }
}

/// Wraps an `embedded-hal` 1.0 blocking I2C peripheral as a [`Transfer`].
pub struct Hal<I>(pub I);

impl<I: I2c> Transfer for Hal<I> {
    type Error = I::Error;

    /// An `I2c` transaction targets one address, so each run of segments for the same device
    /// becomes its own transaction.
    fn combined(&mut self, segments: &mut [Segment<'_>]) -> std::result::Result<(), I::Error> {
        let mut rest = segments;

        while !rest.is_empty() {
            let address = rest[0].address();
            let run = rest.iter().take_while(|s| s.address() == address).count();
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(run);

            let mut operations: Vec<Operation> = head
                .iter_mut()
                .map(|segment| match segment {
                    Segment::Write(_, bytes) => Operation::Write(*bytes),
                    Segment::Read(_, buffer) => Operation::Read(&mut **buffer),
                })
                .collect();
            self.0.transaction(address, &mut operations)?;

            rest = tail;
        }

        Ok(())
    }
}

/// [`Bus`] on top of a [`Transfer`].
///
/// Neither the Linux kernel nor `embedded-hal` can leave the bus claimed between two calls, so a
/// write made with `keep_bus_held` waits here and goes out in the same combined transfer as the
/// next operation. Only one write waits at a time: holding a second one first sends the
/// waiting write on its own. A waiting write that is never followed by another operation is
/// never sent.
pub struct CombinedBus<T> {
    transfer: T,
    held: Option<(u8, Vec<u8>)>,
}

/// [`Bus`] over a Linux `/dev/i2c-N` character device.
pub type LinuxBus = CombinedBus<LinuxI2CBus>;

/// [`Bus`] over any `embedded-hal` 1.0 blocking I2C implementation.
pub type HalBus<I> = CombinedBus<Hal<I>>;

impl<T> CombinedBus<T> {
    pub fn new(transfer: T) -> Self {
        CombinedBus {
            transfer,
            held: None,
        }
    }

    /// Gives back the transfer handle. A waiting write is dropped.
    pub fn release(self) -> T {
        self.transfer
    }
}

impl CombinedBus<LinuxI2CBus> {
    /// Opens the adapter at `path`, for example `/dev/i2c-1`.
    pub fn open<P: AsRef<Path>>(path: P) -> std::result::Result<Self, LinuxI2CError> {
        Ok(Self::new(LinuxI2CBus::new(path)?))
    }
}

impl<T: Transfer> CombinedBus<T> {
    /// Sends the waiting write, if any, on its own.
    fn flush(&mut self) -> std::result::Result<(), T::Error> {
        if let Some((address, bytes)) = self.held.take() {
            trace!("i2c {:#04x}: flush write {:02x?}", address, bytes);
            self.transfer.combined(&mut [Segment::Write(address, &bytes)])?;
        }

        Ok(())
    }

    /// Sends the waiting write, if any, and `last` as one transfer. The waiting write is gone
    /// afterwards whether or not the transfer succeeded.
    fn send(&mut self, last: Segment<'_>) -> std::result::Result<(), T::Error> {
        let held = self.held.take();
        let mut segments = Vec::with_capacity(2);

        if let Some((address, bytes)) = &held {
            segments.push(Segment::Write(*address, &bytes[..]));
        }
        segments.push(last);

        self.transfer.combined(&mut segments)
    }
}

impl<T: Transfer> Bus for CombinedBus<T> {
    type Error = T::Error;

    fn write(
        &mut self,
        address: u8,
        bytes: &[u8],
        keep_bus_held: bool,
    ) -> std::result::Result<(), T::Error> {
        if keep_bus_held {
            self.flush()?;
            trace!("i2c {:#04x}: hold write {:02x?}", address, bytes);
            self.held = Some((address, bytes.to_vec()));
            return Ok(());
        }

        trace!("i2c {:#04x}: write {:02x?}", address, bytes);
        self.send(Segment::Write(address, bytes))
    }

    fn read(
        &mut self,
        address: u8,
        buffer: &mut [u8],
        release_bus: bool,
    ) -> std::result::Result<(), T::Error> {
        // A read always ends the combined transfer; there is no way to hold the adapter past it.
        if !release_bus {
            trace!("i2c {:#04x}: read cannot hold the bus, releasing", address);
        }

        trace!("i2c {:#04x}: read {} bytes", address, buffer.len());
        self.send(Segment::Read(address, buffer))
    }
}
