//! # Instruction Decoding
//!
//! Splits a 32-bit word into its fields. Decoding never fails: words that
//! fall outside the supported subset become [`ArmModeInstruction::Unsupported`]
//! and are reported by the driver instead of being silently executed.
//!
//! ## Category
//!
//! The class of an instruction lives in bits 27-26:
//!
//! ```text
//! ┌───────┬──────────────────┬──────────────────────────────────────────┐
//! │ 27-26 │ Category         │ Subset                                   │
//! ├───────┼──────────────────┼──────────────────────────────────────────┤
//! │  00   │ Data processing  │ AND..MVN (bit 7 and 4 both set: none)    │
//! │  01   │ Data transfer    │ LDR, STR, LDRB, STRB                     │
//! │  10   │ Branch           │ B, BL (bit 25 must be set)               │
//! │  11   │ Interrupt        │ SWI (bits 25-24 must be set)             │
//! └───────┴──────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! ## Layouts
//!
//! ```text
//! FMT: |_Cond__|0_0|I|_code__|S|__Rn___|__Rd___|_______operand2________|
//! FMT: |_Cond__|0_1|I|P|U|B|W|L|__Rn___|__Rd___|________Offset_________|
//! FMT: |_Cond__|1_0|1|L|______________________Offset___________________|
//! FMT: |_Cond__|1_1|1_1|_____________________Comment___________________|
//! ```
//!
//! ## Instruction Encoding Example
//!
//! ```text
//! ADD R2, R0, R1   (0xE0802001)
//!
//! 31-28  27-26  25  24-21  20  19-16  15-12  11-7   6-5  4  3-0
//! [1110] [ 00 ] [0] [0100] [0] [0000] [0010] [00000][00] [0][0001]
//!   ↑       ↑    ↑    ↑     ↑    ↑      ↑      ↑     ↑   ↑   ↑
//!   │       │    │    │     │    │      │      │     │   │   └─ Rm = R1
//!   │       │    │    │     │    │      │      │     │   └──── Shift by imm
//!   │       │    │    │     │    │      │      │     └──────── LSL
//!   │       │    │    │     │    │      │      └────────────── Shift = 0
//!   │       │    │    │     │    │      └───────────────────── Rd = R2
//!   │       │    │    │     │    └──────────────────────────── Rn = R0
//!   │       │    │    │     └───────────────────────────────── S = 0 (no flags)
//!   │       │    │    └─────────────────────────────────────── ADD opcode
//!   │       │    └──────────────────────────────────────────── Register operand
//!   │       └───────────────────────────────────────────────── Data processing
//!   └───────────────────────────────────────────────────────── Always execute
//! ```

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::{
    AluSecondOperandInfo, ArmModeAluInstruction, ShiftOperator,
};
use crate::cpu::condition::Condition;
use crate::cpu::flags::{Indexing, LoadStoreKind, Offsetting, ReadWriteKind, ShiftKind};

/// Bits 27-26 of an instruction word.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum Category {
    DataProcessing = 0b00,
    DataTransfer = 0b01,
    Branch = 0b10,
    Interrupt = 0b11,
}

impl From<u32> for Category {
    fn from(bits: u32) -> Self {
        match bits {
            0b00 => Self::DataProcessing,
            0b01 => Self::DataTransfer,
            0b10 => Self::Branch,
            0b11 => Self::Interrupt,
            _ => unreachable!("category is 2 bits wide, got {bits:#b}"),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataProcessing => f.write_str("data processing"),
            Self::DataTransfer => f.write_str("data transfer"),
            Self::Branch => f.write_str("branch"),
            Self::Interrupt => f.write_str("interrupt"),
        }
    }
}

/// Encodings that belong to a category but not to the implemented subset.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum UnsupportedKind {
    /// Data processing space with bits 7 and 4 set (MUL, SWP, LDRH...).
    MultiplyOrHalfwordTransfer,

    /// Register-offset transfer with bit 4 set.
    UndefinedTransfer,

    /// Branch space with bit 25 clear (LDM, STM).
    BlockDataTransfer,

    /// Interrupt space with bits 25-24 not both set (LDC, STC, CDP, MRC, MCR).
    Coprocessor,
}

impl std::fmt::Display for UnsupportedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultiplyOrHalfwordTransfer => f.write_str("multiply/halfword transfer"),
            Self::UndefinedTransfer => f.write_str("undefined transfer"),
            Self::BlockDataTransfer => f.write_str("block data transfer"),
            Self::Coprocessor => f.write_str("coprocessor"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SingleDataTransferOffsetInfo {
    /// 12-bit unsigned offset.
    Immediate { offset: u32 },

    /// Register shifted by an encoded immediate amount.
    RegisterImmediate {
        shift_amount: u32,
        shift_kind: ShiftKind,
        reg_offset: usize,
    },
}

impl std::fmt::Display for SingleDataTransferOffsetInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate { offset } => write!(f, "#{offset}"),
            Self::RegisterImmediate {
                shift_amount,
                shift_kind,
                reg_offset,
            } => {
                // Same rendering as a register operand 2.
                let op = AluSecondOperandInfo::Register {
                    shift_op: ShiftOperator::Immediate(*shift_amount),
                    shift_kind: *shift_kind,
                    register: *reg_offset,
                };
                write!(f, "{op}")
            }
        }
    }
}

/// A decoded instruction without its condition.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum ArmModeInstruction {
    /// ALU operations (AND, ADD, CMP, MOV, etc.)
    DataProcessing {
        alu_instruction: ArmModeAluInstruction,
        set_conditions: bool,
        rn: usize,
        destination: usize,
        op2: AluSecondOperandInfo,
    },

    /// LDR, STR and their byte variants.
    SingleDataTransfer {
        kind: LoadStoreKind,
        quantity: ReadWriteKind,
        write_back: bool,
        indexing: Indexing,
        offsetting: Offsetting,
        rd: usize,
        base_register: usize,
        offset_info: SingleDataTransferOffsetInfo,
    },

    /// B and BL. `offset` is in bytes, relative to the instruction address + 8.
    Branch { link: bool, offset: i32 },

    /// SWI with its 24-bit comment field.
    SoftwareInterrupt { comment: u32 },

    Unsupported {
        category: Category,
        kind: UnsupportedKind,
    },
}

impl ArmModeInstruction {
    #[must_use]
    pub const fn category(&self) -> Category {
        match self {
            Self::DataProcessing { .. } => Category::DataProcessing,
            Self::SingleDataTransfer { .. } => Category::DataTransfer,
            Self::Branch { .. } => Category::Branch,
            Self::SoftwareInterrupt { .. } => Category::Interrupt,
            Self::Unsupported { category, .. } => *category,
        }
    }

    /// Rebuilds the instruction word. `None` for unsupported encodings,
    /// whose fields were never extracted.
    #[must_use]
    pub fn encode(&self, condition: Condition) -> Option<u32> {
        let mut op_code = 0_u32;
        op_code.set_bits(28..=31, condition.into());
        op_code.set_bits(26..=27, self.category() as u32);

        match *self {
            Self::DataProcessing {
                alu_instruction,
                set_conditions,
                rn,
                destination,
                op2,
            } => {
                op_code.set_bits(21..=24, alu_instruction.into());
                op_code.set_bit(20, set_conditions);
                op_code.set_bits(16..=19, rn as u32);
                op_code.set_bits(12..=15, destination as u32);
                match op2 {
                    AluSecondOperandInfo::Immediate { base, shift } => {
                        op_code.set_bit(25, true);
                        op_code.set_bits(8..=11, shift / 2);
                        op_code.set_bits(0..=7, base);
                    }
                    AluSecondOperandInfo::Register {
                        shift_op,
                        shift_kind,
                        register,
                    } => {
                        match shift_op {
                            ShiftOperator::Immediate(amount) => op_code.set_bits(7..=11, amount),
                            ShiftOperator::Register(rs) => {
                                op_code.set_bits(8..=11, rs as u32);
                                op_code.set_bit(4, true);
                            }
                        }
                        op_code.set_bits(5..=6, shift_kind.into());
                        op_code.set_bits(0..=3, register as u32);
                    }
                }
            }
            Self::SingleDataTransfer {
                kind,
                quantity,
                write_back,
                indexing,
                offsetting,
                rd,
                base_register,
                offset_info,
            } => {
                op_code.set_bit(24, indexing.into());
                op_code.set_bit(23, offsetting.into());
                op_code.set_bit(22, quantity.into());
                op_code.set_bit(21, write_back);
                op_code.set_bit(20, kind.into());
                op_code.set_bits(16..=19, base_register as u32);
                op_code.set_bits(12..=15, rd as u32);
                match offset_info {
                    SingleDataTransferOffsetInfo::Immediate { offset } => {
                        op_code.set_bits(0..=11, offset);
                    }
                    SingleDataTransferOffsetInfo::RegisterImmediate {
                        shift_amount,
                        shift_kind,
                        reg_offset,
                    } => {
                        op_code.set_bit(25, true);
                        op_code.set_bits(7..=11, shift_amount);
                        op_code.set_bits(5..=6, shift_kind.into());
                        op_code.set_bits(0..=3, reg_offset as u32);
                    }
                }
            }
            Self::Branch { link, offset } => {
                op_code.set_bit(25, true);
                op_code.set_bit(24, link);
                op_code.set_bits(0..=23, (offset >> 2) as u32);
            }
            Self::SoftwareInterrupt { comment } => {
                op_code.set_bits(24..=25, 0b11);
                op_code.set_bits(0..=23, comment);
            }
            Self::Unsupported { .. } => return None,
        }

        Some(op_code)
    }

    /// Assembly-like rendering, e.g. `ADDS R2, R0, R1` or `LDRNE R0, [R1, #4]!`.
    #[must_use]
    pub fn disassembler(&self, condition: Condition) -> String {
        match self {
            Self::DataProcessing {
                alu_instruction,
                set_conditions,
                rn,
                destination,
                op2,
            } => {
                let set_string = if *set_conditions { "S" } else { "" };
                if !alu_instruction.writes_destination() {
                    // The S is implied for tests.
                    format!("{alu_instruction}{condition} R{rn}, {op2}")
                } else if alu_instruction.uses_first_operand() {
                    format!("{alu_instruction}{condition}{set_string} R{destination}, R{rn}, {op2}")
                } else {
                    format!("{alu_instruction}{condition}{set_string} R{destination}, {op2}")
                }
            }
            Self::SingleDataTransfer {
                kind,
                quantity,
                write_back,
                indexing,
                offsetting,
                rd,
                base_register,
                offset_info,
            } => {
                let op = match kind {
                    LoadStoreKind::Load => "LDR",
                    LoadStoreKind::Store => "STR",
                };
                let b = match quantity {
                    ReadWriteKind::Word => "",
                    ReadWriteKind::Byte => "B",
                };
                let sign = match offsetting {
                    Offsetting::Up => "",
                    Offsetting::Down => "-",
                };
                let offset = match offset_info {
                    SingleDataTransferOffsetInfo::Immediate { offset: 0 } => String::new(),
                    SingleDataTransferOffsetInfo::Immediate { offset } => {
                        format!(", #{sign}{offset}")
                    }
                    SingleDataTransferOffsetInfo::RegisterImmediate { .. } => {
                        format!(", {sign}{offset_info}")
                    }
                };
                let address = match indexing {
                    Indexing::Pre => {
                        let w = if *write_back { "!" } else { "" };
                        format!("[R{base_register}{offset}]{w}")
                    }
                    Indexing::Post => format!("[R{base_register}]{offset}"),
                };

                format!("{op}{condition}{b} R{rd}, {address}")
            }
            Self::Branch { link, offset } => {
                let link = if *link { "L" } else { "" };
                let target = offset + 8;
                let sign = if target < 0 { "-" } else { "+" };
                format!("B{link}{condition} PC{sign}{}", target.unsigned_abs())
            }
            Self::SoftwareInterrupt { comment } => format!("SWI{condition} 0x{comment:06X}"),
            Self::Unsupported { category, kind } => {
                format!("<unsupported {category}: {kind}>")
            }
        }
    }
}

impl From<u32> for ArmModeInstruction {
    fn from(op_code: u32) -> Self {
        match Category::from(op_code.get_bits(26..=27)) {
            Category::DataProcessing => decode_data_processing(op_code),
            Category::DataTransfer => decode_data_transfer(op_code),
            Category::Branch => {
                if !op_code.get_bit(25) {
                    return Self::Unsupported {
                        category: Category::Branch,
                        kind: UnsupportedKind::BlockDataTransfer,
                    };
                }

                // 24 bit signed word offset, turned into a byte offset.
                let offset = (op_code.get_bits(0..=23).sign_extended(24) as i32) << 2;
                Self::Branch {
                    link: op_code.get_bit(24),
                    offset,
                }
            }
            Category::Interrupt => {
                if op_code.get_bits(24..=25) != 0b11 {
                    return Self::Unsupported {
                        category: Category::Interrupt,
                        kind: UnsupportedKind::Coprocessor,
                    };
                }

                Self::SoftwareInterrupt {
                    comment: op_code.get_bits(0..=23),
                }
            }
        }
    }
}

fn decode_data_processing(op_code: u32) -> ArmModeInstruction {
    let immediate = op_code.get_bit(25);
    if !immediate && op_code.get_bit(7) && op_code.get_bit(4) {
        return ArmModeInstruction::Unsupported {
            category: Category::DataProcessing,
            kind: UnsupportedKind::MultiplyOrHalfwordTransfer,
        };
    }

    let op2 = if immediate {
        AluSecondOperandInfo::Immediate {
            base: op_code.get_bits(0..=7),
            shift: op_code.get_bits(8..=11) * 2,
        }
    } else {
        let shift_op = if op_code.get_bit(4) {
            ShiftOperator::Register(op_code.get_bits(8..=11) as usize)
        } else {
            ShiftOperator::Immediate(op_code.get_bits(7..=11))
        };
        AluSecondOperandInfo::Register {
            shift_op,
            shift_kind: op_code.get_bits(5..=6).into(),
            register: op_code.get_bits(0..=3) as usize,
        }
    };

    ArmModeInstruction::DataProcessing {
        alu_instruction: op_code.get_bits(21..=24).into(),
        set_conditions: op_code.get_bit(20),
        rn: op_code.get_bits(16..=19) as usize,
        destination: op_code.get_bits(12..=15) as usize,
        op2,
    }
}

fn decode_data_transfer(op_code: u32) -> ArmModeInstruction {
    let register_offset = op_code.get_bit(25);
    if register_offset && op_code.get_bit(4) {
        return ArmModeInstruction::Unsupported {
            category: Category::DataTransfer,
            kind: UnsupportedKind::UndefinedTransfer,
        };
    }

    let offset_info = if register_offset {
        SingleDataTransferOffsetInfo::RegisterImmediate {
            shift_amount: op_code.get_bits(7..=11),
            shift_kind: op_code.get_bits(5..=6).into(),
            reg_offset: op_code.get_bits(0..=3) as usize,
        }
    } else {
        SingleDataTransferOffsetInfo::Immediate {
            offset: op_code.get_bits(0..=11),
        }
    };

    ArmModeInstruction::SingleDataTransfer {
        indexing: op_code.get_bit(24).into(),
        offsetting: op_code.get_bit(23).into(),
        quantity: op_code.get_bit(22).into(),
        write_back: op_code.get_bit(21),
        kind: op_code.get_bit(20).into(),
        base_register: op_code.get_bits(16..=19) as usize,
        rd: op_code.get_bits(12..=15) as usize,
        offset_info,
    }
}
