//! # ARM Instruction Set (32-bit)
//!
//! Fixed-width instructions, every one of them conditional.
//!
//! ## Format
//!
//! ```text
//! 31-28   27-26      25-0
//! [Cond] [Category] [Instruction-specific]
//! ```
//!
//! - **Condition (bits 31-28)**: See [`condition`](super::condition)
//! - **Category (bits 27-26)**: See [`instructions::Category`]
//!
//! ## Instruction Categories
//!
//! | Bits 27-26 | Category              | Implemented         |
//! |------------|-----------------------|---------------------|
//! | 00         | Data Processing       | AND..MVN            |
//! | 01         | Single Data Transfer  | LDR, STR, LDRB, STRB|
//! | 10         | Branch                | B, BL               |
//! | 11         | Software Interrupt    | SWI                 |
//!
//! ## Barrel Shifter
//!
//! Operand2 can be shifted at no extra cost: LSL, LSR, ASR, ROR, RRX.
//!
//! ## Submodules
//!
//! - [`instructions`] - Decoding (`From<u32>`), encoding and disassembly
//! - [`opcode`] - Raw words and decoded opcodes
//! - [`operations`] - Execution
//! - [`alu_instruction`] - ALU ops and barrel shifter

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
pub mod alu_instruction;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::similar_names)]
pub mod instructions;

#[allow(clippy::cast_possible_truncation)]
pub mod opcode;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::similar_names)]
pub mod operations;
