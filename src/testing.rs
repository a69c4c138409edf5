use std::collections::BTreeMap;

use crate::bus::{Bus, Segment, Transfer};

/// Calibration block from the datasheet's worked example (section 3.12).
pub const DATASHEET_CALIBRATION: [u8; 24] = [
    0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC, 0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, 0x27, 0x0B, 0x8C,
    0x00, 0xF9, 0xFF, 0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17,
];

/// Data block for the same example: adc_P = 415148, adc_T = 519888.
pub const DATASHEET_SAMPLE: [u8; 6] = [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Write {
        address: u8,
        bytes: Vec<u8>,
        keep_bus_held: bool,
    },
    Read {
        address: u8,
        len: usize,
        release_bus: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeError {
    /// Nothing at this address.
    Nack(u8),
    /// Failure requested through [`FakeBus::fail_transaction`].
    Injected,
}

struct FakeDevice {
    registers: [u8; 256],
    pointer: u8,
}

/// A bus populated with register-file devices that auto-increment their pointer like a BMP280.
///
/// Every attempted transaction is logged, including failed ones. Used as a [`Transfer`], each
/// combined transfer is also logged as a group in `transfers`.
pub struct FakeBus {
    devices: BTreeMap<u8, FakeDevice>,
    fail_at: Option<usize>,
    pub transactions: Vec<Transaction>,
    pub transfers: Vec<Vec<Transaction>>,
}

impl FakeBus {
    pub fn new() -> Self {
        FakeBus {
            devices: BTreeMap::new(),
            fail_at: None,
            transactions: Vec::new(),
            transfers: Vec::new(),
        }
    }

    pub fn with_device(mut self, address: u8) -> Self {
        self.devices.entry(address).or_insert(FakeDevice {
            registers: [0u8; 256],
            pointer: 0,
        });
        self
    }

    pub fn with_registers(self, address: u8, start: u8, bytes: &[u8]) -> Self {
        let mut bus = self.with_device(address);
        if let Some(device) = bus.devices.get_mut(&address) {
            let start = usize::from(start);
            device.registers[start..start + bytes.len()].copy_from_slice(bytes);
        }
        bus
    }

    /// Makes the `index`th transaction (counting from zero) fail.
    pub fn fail_transaction(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn register(&self, address: u8, register: u8) -> u8 {
        self.devices[&address].registers[usize::from(register)]
    }

    fn attempt(&mut self, transaction: Transaction) -> Result<(), FakeError> {
        let index = self.transactions.len();
        self.transactions.push(transaction);
        if self.fail_at == Some(index) {
            return Err(FakeError::Injected);
        }
        Ok(())
    }
}

impl Bus for FakeBus {
    type Error = FakeError;

    fn write(&mut self, address: u8, bytes: &[u8], keep_bus_held: bool) -> Result<(), FakeError> {
        self.attempt(Transaction::Write {
            address,
            bytes: bytes.to_vec(),
            keep_bus_held,
        })?;

        let device = self
            .devices
            .get_mut(&address)
            .ok_or(FakeError::Nack(address))?;

        if let Some((pointer, data)) = bytes.split_first() {
            device.pointer = *pointer;
            for byte in data {
                device.registers[usize::from(device.pointer)] = *byte;
                device.pointer = device.pointer.wrapping_add(1);
            }
        }

        Ok(())
    }

    fn read(&mut self, address: u8, buffer: &mut [u8], release_bus: bool) -> Result<(), FakeError> {
        self.attempt(Transaction::Read {
            address,
            len: buffer.len(),
            release_bus,
        })?;

        let device = self
            .devices
            .get_mut(&address)
            .ok_or(FakeError::Nack(address))?;

        for byte in buffer.iter_mut() {
            *byte = device.registers[usize::from(device.pointer)];
            device.pointer = device.pointer.wrapping_add(1);
        }

        Ok(())
    }
}

/// Plays the segments back as bus operations, holding the bus for all but the last one.
impl Transfer for FakeBus {
    type Error = FakeError;

    fn combined(&mut self, segments: &mut [Segment<'_>]) -> Result<(), FakeError> {
        let start = self.transactions.len();
        let last = segments.len().saturating_sub(1);
        let mut result = Ok(());

        for (i, segment) in segments.iter_mut().enumerate() {
            result = match segment {
                Segment::Write(address, bytes) => Bus::write(self, *address, *bytes, i < last),
                Segment::Read(address, buffer) => {
                    Bus::read(self, *address, &mut **buffer, i == last)
                }
            };
            if result.is_err() {
                break;
            }
        }

        self.transfers.push(self.transactions[start..].to_vec());
        result
    }
}
