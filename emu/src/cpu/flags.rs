//! Single-bit and two-bit instruction fields, as closed enums.
//!
//! Every enum converts from the raw field (`From<bool>` / `From<u32>`) for
//! the decoder and back (`From<Self> for bool` / `u32`) for the encoder.

use serde::{Deserialize, Serialize};

/// Barrel shifter operation, bits 6-5 of a register operand.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum ShiftKind {
    Lsl = 0b00,
    Lsr = 0b01,
    Asr = 0b10,
    Ror = 0b11,
}

impl From<u32> for ShiftKind {
    fn from(op: u32) -> Self {
        match op {
            0 => Self::Lsl,
            1 => Self::Lsr,
            2 => Self::Asr,
            3 => Self::Ror,
            _ => unreachable!("shift kind is 2 bits wide, got {op}"),
        }
    }
}

impl From<ShiftKind> for u32 {
    fn from(kind: ShiftKind) -> Self {
        kind as Self
    }
}

impl std::fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lsl => f.write_str("LSL"),
            Self::Lsr => f.write_str("LSR"),
            Self::Asr => f.write_str("ASR"),
            Self::Ror => f.write_str("ROR"),
        }
    }
}

/// L bit of a data-transfer instruction (bit 20).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum LoadStoreKind {
    Store,
    Load,
}

impl From<bool> for LoadStoreKind {
    fn from(b: bool) -> Self {
        if b { Self::Load } else { Self::Store }
    }
}

impl From<LoadStoreKind> for bool {
    fn from(kind: LoadStoreKind) -> Self {
        kind == LoadStoreKind::Load
    }
}

/// B bit of a data-transfer instruction (bit 22).
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum ReadWriteKind {
    /// A full 32-bit word.
    #[default]
    Word,

    /// A single byte, zero-extended on load.
    Byte,
}

impl From<bool> for ReadWriteKind {
    fn from(value: bool) -> Self {
        if value { Self::Byte } else { Self::Word }
    }
}

impl From<ReadWriteKind> for bool {
    fn from(kind: ReadWriteKind) -> Self {
        kind == ReadWriteKind::Byte
    }
}

/// P bit of a data-transfer instruction (bit 24).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Indexing {
    /// Add offset after transfer.
    Post,

    /// Add offset before transfer.
    Pre,
}

impl From<bool> for Indexing {
    fn from(state: bool) -> Self {
        if state { Self::Pre } else { Self::Post }
    }
}

impl From<Indexing> for bool {
    fn from(indexing: Indexing) -> Self {
        indexing == Indexing::Pre
    }
}

/// U bit of a data-transfer instruction (bit 23).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Offsetting {
    /// Subtract the offset from base.
    Down,

    /// Add the offset to base.
    Up,
}

impl From<bool> for Offsetting {
    fn from(state: bool) -> Self {
        if state { Self::Up } else { Self::Down }
    }
}

impl From<Offsetting> for bool {
    fn from(offsetting: Offsetting) -> Self {
        offsetting == Offsetting::Up
    }
}

impl Offsetting {
    #[must_use]
    pub const fn apply(self, base: u32, amount: u32) -> u32 {
        match self {
            Self::Down => base.wrapping_sub(amount),
            Self::Up => base.wrapping_add(amount),
        }
    }
}
