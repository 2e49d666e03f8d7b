//! # Memory
//!
//! Two independent address spaces:
//!
//! - [`instruction_store`] - the program, one 32-bit word per slot, fetched
//!   by the program counter.
//! - [`data_memory`] - a flat byte-addressable little-endian array used by
//!   `LDR`/`STR`.
//!
//! Data accesses go through the [`io_device::IoDevice`] trait so the CPU
//! can be driven against any byte-addressable device.

pub mod data_memory;
pub mod instruction_store;
pub mod io_device;
