//! # Register File
//!
//! The 16 general-purpose registers.
//!
//! - **R0-R12**: General purpose
//! - **R13 (SP)**: Stack pointer (by convention)
//! - **R14 (LR)**: Link register (return address of `BL` and `SWI`)
//! - **R15 (PC)**: Program counter, the byte address of the next fetch
//!
//! SP, LR and PC are accessors over the same array, never copies.

use serde::{Deserialize, Serialize};

/// Stack Pointer register index.
pub const REG_SP: usize = 0xD;

/// Link Register index (return address for subroutines).
pub const REG_LR: usize = 0xE;

/// Program Counter register index.
pub const REG_PROGRAM_COUNTER: usize = 0xF;

/// The 16 general-purpose registers visible to the CPU.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers([u32; 16]);

impl Registers {
    /// # Panics
    ///
    /// Panics if `reg` is greater than 15. Register fields are 4 bits wide,
    /// so only a programming error can get here.
    #[must_use]
    pub fn register_at(&self, reg: usize) -> u32 {
        assert!(reg <= 15, "Invalid register index: {reg} (0x{reg:X})");
        self.0[reg]
    }

    /// # Panics
    ///
    /// Panics if `reg` is greater than 15.
    pub fn set_register_at(&mut self, reg: usize, new_value: u32) {
        assert!(reg <= 15, "Invalid register index: {reg} (0x{reg:X})");
        tracing::trace!("R{reg} <- 0x{new_value:08X}");
        self.0[reg] = new_value;
    }

    #[must_use]
    pub const fn stack_pointer(&self) -> u32 {
        self.0[REG_SP]
    }

    pub fn set_stack_pointer(&mut self, new_value: u32) {
        self.set_register_at(REG_SP, new_value);
    }

    #[must_use]
    pub const fn link_register(&self) -> u32 {
        self.0[REG_LR]
    }

    pub fn set_link_register(&mut self, new_value: u32) {
        self.set_register_at(REG_LR, new_value);
    }

    #[must_use]
    pub const fn program_counter(&self) -> u32 {
        self.0[REG_PROGRAM_COUNTER]
    }

    pub fn set_program_counter(&mut self, new_value: u32) {
        self.set_register_at(REG_PROGRAM_COUNTER, new_value);
    }

    pub const fn advance_program_counter(&mut self, bytes: u32) {
        self.0[REG_PROGRAM_COUNTER] = self.0[REG_PROGRAM_COUNTER].wrapping_add(bytes);
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<u32> {
        self.0.as_slice().to_vec()
    }
}
