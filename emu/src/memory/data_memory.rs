use serde::{Deserialize, Serialize};

use crate::error::MachineError;
use crate::memory::io_device::IoDevice;

/// Flat, zero-initialised, byte-addressable data memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMemory {
    bytes: Vec<u8>,
}

impl DataMemory {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Checks that `len` bytes starting at `address` are all mapped and
    /// returns the index of the first one.
    fn index_of(&self, address: u32, len: usize) -> Result<usize, MachineError> {
        let invalid = MachineError::InvalidAddress {
            address,
            size: self.bytes.len(),
        };

        let start = usize::try_from(address).map_err(|_| invalid)?;
        match start.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(start),
            _ => Err(invalid),
        }
    }
}

impl IoDevice for DataMemory {
    fn read_at(&self, address: u32) -> Result<u8, MachineError> {
        let index = self.index_of(address, 1)?;
        Ok(self.bytes[index])
    }

    fn write_at(&mut self, address: u32, value: u8) -> Result<(), MachineError> {
        let index = self.index_of(address, 1)?;
        self.bytes[index] = value;
        Ok(())
    }

    fn read_word(&self, address: u32) -> Result<u32, MachineError> {
        let index = self.index_of(address, 4)?;
        let mut bytes = [0_u8; 4];
        bytes.copy_from_slice(&self.bytes[index..index + 4]);
        Ok(u32::from_le_bytes(bytes))
    }

    fn write_word(&mut self, address: u32, value: u32) -> Result<(), MachineError> {
        let index = self.index_of(address, 4)?;
        self.bytes[index..index + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn starts_zeroed() {
        let memory = DataMemory::new(16);
        assert_eq!(memory.size(), 16);
        assert!(memory.as_slice().iter().all(|b| *b == 0));
        assert_eq!(memory.read_word(12), Ok(0));
    }

    #[test]
    fn words_are_little_endian() {
        let mut memory = DataMemory::new(8);
        memory.write_word(4, 0x1122_3344).unwrap();

        assert_eq!(memory.as_slice()[4..], [0x44, 0x33, 0x22, 0x11]);
        assert_eq!(memory.read_at(7), Ok(0x11));
        assert_eq!(memory.read_word(4), Ok(0x1122_3344));
    }

    #[test]
    fn bytes_do_not_touch_neighbours() {
        let mut memory = DataMemory::new(4);
        memory.write_word(0, 0xFFFF_FFFF).unwrap();
        memory.write_at(2, 0).unwrap();

        assert_eq!(memory.read_word(0), Ok(0xFF00_FFFF));
    }

    #[test]
    fn out_of_range_accesses_fail() {
        let mut memory = DataMemory::new(8);
        let invalid = |address| MachineError::InvalidAddress { address, size: 8 };

        assert_eq!(memory.read_at(8), Err(invalid(8)));
        assert_eq!(memory.write_at(8, 1), Err(invalid(8)));

        // The last byte of the word is unmapped.
        assert_eq!(memory.read_word(5), Err(invalid(5)));
        assert_eq!(memory.write_word(5, 1), Err(invalid(5)));
        assert_eq!(memory.read_word(u32::MAX), Err(invalid(u32::MAX)));

        // Failed writes leave memory untouched.
        assert!(memory.as_slice().iter().all(|b| *b == 0));
    }

    /// A device that only implements the byte accessors, to exercise the
    /// default word accessors of the trait.
    struct Bytes([u8; 4]);

    impl IoDevice for Bytes {
        fn read_at(&self, address: u32) -> Result<u8, MachineError> {
            self.0
                .get(address as usize)
                .copied()
                .ok_or(MachineError::InvalidAddress { address, size: 4 })
        }

        fn write_at(&mut self, address: u32, value: u8) -> Result<(), MachineError> {
            let slot = self
                .0
                .get_mut(address as usize)
                .ok_or(MachineError::InvalidAddress { address, size: 4 })?;
            *slot = value;
            Ok(())
        }
    }

    #[test]
    fn default_word_accessors() {
        let mut device = Bytes([0; 4]);
        device.write_word(0, 0xCAFE_BABE).unwrap();

        assert_eq!(device.0, [0xBE, 0xBA, 0xFE, 0xCA]);
        assert_eq!(device.read_word(0), Ok(0xCAFE_BABE));
        assert_eq!(
            device.read_word(1),
            Err(MachineError::InvalidAddress { address: 4, size: 4 })
        );
    }
}
