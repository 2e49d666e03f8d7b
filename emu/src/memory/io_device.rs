use crate::error::MachineError;

/// A byte-addressable device the CPU can load from and store to.
///
/// Words are little-endian: the byte at `address` is bits 7-0.
pub trait IoDevice {
    fn read_at(&self, address: u32) -> Result<u8, MachineError>;

    fn write_at(&mut self, address: u32, value: u8) -> Result<(), MachineError>;

    fn read_word(&self, address: u32) -> Result<u32, MachineError> {
        let mut bytes = [0_u8; 4];
        for (offset, byte) in (0_u32..).zip(bytes.iter_mut()) {
            *byte = self.read_at(address.wrapping_add(offset))?;
        }

        Ok(u32::from_le_bytes(bytes))
    }

    fn write_word(&mut self, address: u32, value: u32) -> Result<(), MachineError> {
        for (offset, byte) in (0_u32..).zip(value.to_le_bytes()) {
            self.write_at(address.wrapping_add(offset), byte)?;
        }

        Ok(())
    }
}
