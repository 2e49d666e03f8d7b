//! # CPU
//!
//! A 32-bit core with 16 registers, a status register holding the NZCV
//! flags, and a saved status register for interrupt entry and return.
//!
//! - [`arm7tdmi`] - The core and its `execute_arm` entry point
//! - [`arm`] - Instruction decoding and execution
//! - [`psr`] - Status register and flag accessors
//! - [`condition`] - The 16 condition codes
//! - [`registers`] - The register file

pub mod arm;

#[allow(clippy::module_name_repetitions)]
pub mod arm7tdmi;
pub mod condition;
pub mod cpu_modes;

#[allow(clippy::cast_possible_truncation)]
pub mod flags;
pub mod psr;
pub mod registers;
