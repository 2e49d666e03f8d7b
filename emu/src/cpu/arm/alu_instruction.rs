use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::flags::ShiftKind;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum ArmModeAluInstruction {
    And = 0x0,
    Eor = 0x1,
    Sub = 0x2,
    Rsb = 0x3,
    Add = 0x4,
    Adc = 0x5,
    Sbc = 0x6,
    Rsc = 0x7,
    Tst = 0x8,
    Teq = 0x9,
    Cmp = 0xA,
    Cmn = 0xB,
    Orr = 0xC,
    Mov = 0xD,
    Bic = 0xE,
    Mvn = 0xF,
}

impl Display for ArmModeAluInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => f.write_str("AND"),
            Self::Eor => f.write_str("EOR"),
            Self::Sub => f.write_str("SUB"),
            Self::Rsb => f.write_str("RSB"),
            Self::Add => f.write_str("ADD"),
            Self::Adc => f.write_str("ADC"),
            Self::Sbc => f.write_str("SBC"),
            Self::Rsc => f.write_str("RSC"),
            Self::Tst => f.write_str("TST"),
            Self::Teq => f.write_str("TEQ"),
            Self::Cmp => f.write_str("CMP"),
            Self::Cmn => f.write_str("CMN"),
            Self::Orr => f.write_str("ORR"),
            Self::Mov => f.write_str("MOV"),
            Self::Bic => f.write_str("BIC"),
            Self::Mvn => f.write_str("MVN"),
        }
    }
}

impl ArmModeAluInstruction {
    /// Test instructions only update flags; every other opcode writes Rd.
    #[must_use]
    pub const fn writes_destination(self) -> bool {
        !matches!(self, Self::Tst | Self::Teq | Self::Cmp | Self::Cmn)
    }

    /// Whether the opcode reads Rn at all (`MOV` and `MVN` only use operand 2).
    #[must_use]
    pub const fn uses_first_operand(self) -> bool {
        !matches!(self, Self::Mov | Self::Mvn)
    }
}

impl From<u32> for ArmModeAluInstruction {
    fn from(alu_op_code: u32) -> Self {
        use ArmModeAluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match alu_op_code {
            0x0 => And,
            0x1 => Eor,
            0x2 => Sub,
            0x3 => Rsb,
            0x4 => Add,
            0x5 => Adc,
            0x6 => Sbc,
            0x7 => Rsc,
            0x8 => Tst,
            0x9 => Teq,
            0xA => Cmp,
            0xB => Cmn,
            0xC => Orr,
            0xD => Mov,
            0xE => Bic,
            0xF => Mvn,
            _ => unreachable!("ALU opcode is 4 bits wide, got {alu_op_code:#X}"),
        }
    }
}

impl From<ArmModeAluInstruction> for u32 {
    fn from(alu_instruction: ArmModeAluInstruction) -> Self {
        alu_instruction as Self
    }
}

/// Where the shift amount of a register operand comes from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum ShiftOperator {
    /// Encoded amount (bits 11-7). Zero has special meanings, see [`immediate_shift`].
    Immediate(u32),

    /// Low byte of register Rs (bits 11-8).
    Register(usize),
}

/// Operand 2 of a data-processing instruction.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum AluSecondOperandInfo {
    /// `base` (8 bits) rotated right by `shift` (an even amount, 0..=30).
    Immediate { base: u32, shift: u32 },

    /// Register `register` passed through the barrel shifter.
    Register {
        shift_op: ShiftOperator,
        shift_kind: ShiftKind,
        register: usize,
    },
}

impl AluSecondOperandInfo {
    /// Value of an immediate operand, `None` for register operands.
    #[must_use]
    pub const fn immediate_value(&self) -> Option<u32> {
        match self {
            Self::Immediate { base, shift } => Some(base.rotate_right(*shift)),
            Self::Register { .. } => None,
        }
    }
}

impl Display for AluSecondOperandInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate { base, shift } => write!(f, "#{}", base.rotate_right(*shift)),
            Self::Register {
                shift_op,
                shift_kind,
                register,
            } => {
                write!(f, "R{register}")?;
                match (shift_op, shift_kind) {
                    (ShiftOperator::Immediate(0), ShiftKind::Lsl) => Ok(()),
                    (ShiftOperator::Immediate(0), ShiftKind::Ror) => f.write_str(", RRX"),
                    (ShiftOperator::Immediate(0), _) => write!(f, ", {shift_kind} #32"),
                    (ShiftOperator::Immediate(amount), _) => write!(f, ", {shift_kind} #{amount}"),
                    (ShiftOperator::Register(rs), _) => write!(f, ", {shift_kind} R{rs}"),
                }
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticOpResult {
    pub result: u32,
    pub carry: bool,
    pub overflow: bool,
    pub sign: bool,
    pub zero: bool,
}

/// `first_op + second_op + carry_in` with all four flags.
#[must_use]
pub fn add_with_carry(first_op: u32, second_op: u32, carry_in: bool) -> ArithmeticOpResult {
    // we do the sum in 64bits so that bit 32 is the carry
    let result_and_carry = u64::from(first_op) + u64::from(second_op) + u64::from(carry_in);
    let result = result_and_carry as u32;

    // overflow only occurs when operands have the same sign and result has the opposite one
    let overflow = ((first_op ^ result) & (second_op ^ result)).get_bit(31);

    ArithmeticOpResult {
        result,
        carry: result_and_carry.get_bit(32),
        overflow,
        sign: result.get_bit(31),
        zero: result == 0,
    }
}

/// `first_op + second_op`.
#[must_use]
pub fn add_inner_op(first_op: u32, second_op: u32) -> ArithmeticOpResult {
    add_with_carry(first_op, second_op, false)
}

/// `first_op - second_op - !carry_in`, computed as `first_op + !second_op + carry_in`
/// so that C ends up as NOT borrow.
#[must_use]
pub fn sub_with_carry(first_op: u32, second_op: u32, carry_in: bool) -> ArithmeticOpResult {
    add_with_carry(first_op, !second_op, carry_in)
}

/// `first_op - second_op`. C is set when `first_op >= second_op` (unsigned).
#[must_use]
pub fn sub_inner_op(first_op: u32, second_op: u32) -> ArithmeticOpResult {
    sub_with_carry(first_op, second_op, true)
}

/// Shift with an amount taken from a register (or an already decoded
/// immediate amount): 0 leaves `rm` and the carry untouched, amounts of 32
/// and above saturate the way the barrel shifter does.
#[must_use]
pub fn shift(kind: ShiftKind, shift_amount: u32, rm: u32, carry: bool) -> ArithmeticOpResult {
    if shift_amount == 0 {
        return ArithmeticOpResult {
            result: rm,
            carry,
            ..Default::default()
        };
    }

    let (result, carry) = match kind {
        ShiftKind::Lsl => match shift_amount {
            1..=31 => (rm << shift_amount, rm.get_bit((32 - shift_amount) as u8)),
            32 => (0, rm.get_bit(0)),
            _ => (0, false),
        },
        ShiftKind::Lsr => match shift_amount {
            1..=31 => (rm >> shift_amount, rm.get_bit((shift_amount - 1) as u8)),
            32 => (0, rm.get_bit(31)),
            _ => (0, false),
        },
        ShiftKind::Asr => match shift_amount {
            1..=31 => (
                ((rm as i32) >> shift_amount) as u32,
                rm.get_bit((shift_amount - 1) as u8),
            ),
            _ => (((rm as i32) >> 31) as u32, rm.get_bit(31)),
        },
        ShiftKind::Ror => match shift_amount % 32 {
            0 => (rm, rm.get_bit(31)),
            amount => (rm.rotate_right(amount), rm.get_bit((amount - 1) as u8)),
        },
    };

    ArithmeticOpResult {
        result,
        carry,
        ..Default::default()
    }
}

/// Shift by an amount encoded in the instruction (5 bits).
///
/// An encoded 0 means: `LSL #0` no shift, `LSR #0` and `ASR #0` shift by 32,
/// `ROR #0` rotate right extended (RRX) through the carry.
#[must_use]
pub fn immediate_shift(kind: ShiftKind, encoded_amount: u32, rm: u32, carry: bool) -> ArithmeticOpResult {
    match (kind, encoded_amount) {
        (ShiftKind::Lsr | ShiftKind::Asr, 0) => shift(kind, 32, rm, carry),
        (ShiftKind::Ror, 0) => ArithmeticOpResult {
            result: (u32::from(carry) << 31) | (rm >> 1),
            carry: rm.get_bit(0),
            ..Default::default()
        },
        _ => shift(kind, encoded_amount, rm, carry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::Rng;

    #[test]
    fn only_tests_skip_destination() {
        for code in 0..16 {
            let alu = ArmModeAluInstruction::from(code);
            assert_eq!(alu.writes_destination(), !(0x8..=0xB).contains(&code), "{alu}");
            assert_eq!(u32::from(alu), code);
        }
    }

    #[test]
    fn add_boundaries() {
        assert_eq!(
            add_inner_op(0, 0),
            ArithmeticOpResult {
                result: 0,
                carry: false,
                overflow: false,
                sign: false,
                zero: true,
            }
        );
        assert_eq!(
            add_inner_op(0xFFFF_FFFF, 1),
            ArithmeticOpResult {
                result: 0,
                carry: true,
                overflow: false,
                sign: false,
                zero: true,
            }
        );
        assert_eq!(
            add_inner_op(0x7FFF_FFFF, 1),
            ArithmeticOpResult {
                result: 0x8000_0000,
                carry: false,
                overflow: true,
                sign: true,
                zero: false,
            }
        );
    }

    #[test]
    fn sub_boundaries() {
        assert_eq!(
            sub_inner_op(0, 0x8000_0000),
            ArithmeticOpResult {
                result: 0x8000_0000,
                carry: false,
                overflow: true,
                sign: true,
                zero: false,
            }
        );

        // Equal operands: no borrow, so C is set.
        let r = sub_inner_op(5, 5);
        assert!(r.zero);
        assert!(r.carry);

        let r = sub_inner_op(3, 5);
        assert_eq!(r.result, -2_i32 as u32);
        assert!(!r.carry);
        assert!(r.sign);
        assert!(!r.overflow);
    }

    #[test]
    fn carry_in_variants() {
        // ADC: 0xFFFFFFFF + 0 + 1 wraps to zero with carry.
        let r = add_with_carry(0xFFFF_FFFF, 0, true);
        assert_eq!(r.result, 0);
        assert!(r.carry);
        assert!(r.zero);

        // SBC with C clear subtracts one more.
        let r = sub_with_carry(10, 3, false);
        assert_eq!(r.result, 6);
        assert!(r.carry);

        // 0 - 0 - 1 borrows.
        let r = sub_with_carry(0, 0, false);
        assert_eq!(r.result, u32::MAX);
        assert!(!r.carry);
        assert!(!r.overflow);
    }

    #[test]
    fn add_and_sub_match_wide_arithmetic() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let a: u32 = rng.gen_range(0..=u32::MAX);
            let b: u32 = rng.gen_range(0..=u32::MAX);
            let carry_in = rng.gen_range(0..=1_u32) == 1;

            let add = add_with_carry(a, b, carry_in);
            let wide = u64::from(a) + u64::from(b) + u64::from(carry_in);
            let signed = i64::from(a as i32) + i64::from(b as i32) + i64::from(carry_in);
            assert_eq!(add.result, wide as u32);
            assert_eq!(add.carry, wide > u64::from(u32::MAX));
            assert_eq!(add.overflow, i32::try_from(signed).is_err());

            let sub = sub_with_carry(a, b, carry_in);
            let borrow = i64::from(!carry_in);
            let wide = i64::from(a) - i64::from(b) - borrow;
            let signed = i64::from(a as i32) - i64::from(b as i32) - borrow;
            assert_eq!(sub.result, wide as u32);
            assert_eq!(sub.carry, wide >= 0);
            assert_eq!(sub.overflow, i32::try_from(signed).is_err());
        }
    }

    #[test]
    fn register_shifts() {
        let r = shift(ShiftKind::Lsl, 4, 0xF000_000F, false);
        assert_eq!(r.result, 0x0000_00F0);
        assert!(r.carry);

        let r = shift(ShiftKind::Lsl, 32, 0x0000_0001, false);
        assert_eq!(r.result, 0);
        assert!(r.carry);

        let r = shift(ShiftKind::Lsr, 33, u32::MAX, true);
        assert_eq!(r.result, 0);
        assert!(!r.carry);

        let r = shift(ShiftKind::Asr, 4, 0x8000_0000, false);
        assert_eq!(r.result, 0xF800_0000);

        let r = shift(ShiftKind::Asr, 40, 0x8000_0000, false);
        assert_eq!(r.result, u32::MAX);
        assert!(r.carry);

        let r = shift(ShiftKind::Ror, 8, 0x0000_00AB, false);
        assert_eq!(r.result, 0xAB00_0000);
        assert!(r.carry);

        let r = shift(ShiftKind::Ror, 0, 0x1234, true);
        assert_eq!(r.result, 0x1234);
        assert!(r.carry);
    }

    #[test]
    fn encoded_zero_shifts() {
        let r = immediate_shift(ShiftKind::Lsl, 0, 0x8000_0001, true);
        assert_eq!(r.result, 0x8000_0001);
        assert!(r.carry);

        let r = immediate_shift(ShiftKind::Lsr, 0, 0x8000_0001, false);
        assert_eq!(r.result, 0);
        assert!(r.carry);

        let r = immediate_shift(ShiftKind::Asr, 0, 0x8000_0000, false);
        assert_eq!(r.result, u32::MAX);

        let r = immediate_shift(ShiftKind::Ror, 0, 0b11, true);
        assert_eq!(r.result, 0x8000_0001);
        assert!(r.carry);
    }

    #[test]
    fn display_second_operand() {
        let imm = AluSecondOperandInfo::Immediate { base: 0xFF, shift: 8 };
        assert_eq!(imm.to_string(), format!("#{}", 0xFF00_0000_u32));
        assert_eq!(imm.immediate_value(), Some(0xFF00_0000));

        let reg = AluSecondOperandInfo::Register {
            shift_op: ShiftOperator::Immediate(0),
            shift_kind: ShiftKind::Lsl,
            register: 1,
        };
        assert_eq!(reg.to_string(), "R1");

        let reg = AluSecondOperandInfo::Register {
            shift_op: ShiftOperator::Register(3),
            shift_kind: ShiftKind::Ror,
            register: 2,
        };
        assert_eq!(reg.to_string(), "R2, ROR R3");

        let reg = AluSecondOperandInfo::Register {
            shift_op: ShiftOperator::Immediate(0),
            shift_kind: ShiftKind::Asr,
            register: 4,
        };
        assert_eq!(reg.to_string(), "R4, ASR #32");
    }
}
