//! # Program Status Register
//!
//! One byte holding the condition flags and the control bits.
//!
//! ```text
//!  7   6   5   4   3   2   1   0
//! ┌───┬───┬───┬───┬───┬───┬───────┐
//! │ N │ Z │ C │ V │ I │ F │ Mode  │
//! └───┴───┴───┴───┴───┴───┴───────┘
//! ```
//!
//! - **Flags (7-4)**: tested by [`condition`](super::condition), written only
//!   by data-processing instructions with the S bit set.
//! - **I/F (3-2)**: IRQ/FIQ disable. `SWI` sets I on entry.
//! - **Mode (1-0)**: see [`Mode`].
//!
//! The CPU keeps a second `Psr`, the saved status register, filled on
//! interrupt entry and copied back by an exception return.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::ArithmeticOpResult;
use crate::cpu::{condition::Condition, cpu_modes::Mode};

/// Single-bit fields of the status register.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Flag {
    /// N, bit 7
    Negative,
    /// Z, bit 6
    Zero,
    /// C, bit 5
    Carry,
    /// V, bit 4
    Overflow,
    /// I, bit 3
    IrqDisable,
    /// F, bit 2
    FiqDisable,
}

impl Flag {
    const fn bit(self) -> u8 {
        match self {
            Self::Negative => 7,
            Self::Zero => 6,
            Self::Carry => 5,
            Self::Overflow => 4,
            Self::IrqDisable => 3,
            Self::FiqDisable => 2,
        }
    }
}

/// Program Status Register (current or saved).
///
/// # Example
///
/// ```
/// use emu::cpu::psr::{Flag, Psr};
///
/// let mut cpsr = Psr::default();
///
/// cpsr.set_flag(Flag::Zero);
/// assert!(cpsr.zero_flag());
///
/// cpsr.clear_flag(Flag::Zero);
/// assert!(!cpsr.is_set(Flag::Zero));
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Psr(u8);

impl Psr {
    #[must_use]
    pub fn can_execute(self, cond: Condition) -> bool {
        use Condition::{AL, CC, CS, EQ, GE, GT, HI, LE, LS, LT, MI, NE, NV, PL, VC, VS};
        match cond {
            EQ => self.zero_flag(),
            NE => !self.zero_flag(),
            CS => self.carry_flag(),
            CC => !self.carry_flag(),
            MI => self.sign_flag(),
            PL => !self.sign_flag(),
            VS => self.overflow_flag(),
            VC => !self.overflow_flag(),
            HI => self.carry_flag() && !self.zero_flag(),
            LS => !self.carry_flag() || self.zero_flag(),
            GE => self.sign_flag() == self.overflow_flag(),
            LT => self.sign_flag() != self.overflow_flag(),
            GT => !self.zero_flag() && (self.sign_flag() == self.overflow_flag()),
            LE => self.zero_flag() || (self.sign_flag() != self.overflow_flag()),
            AL => true,
            NV => false,
        }
    }

    #[must_use]
    pub fn is_set(self, flag: Flag) -> bool {
        self.0.get_bit(flag.bit())
    }

    pub fn set_flag(&mut self, flag: Flag) {
        self.0.set_bit(flag.bit(), true);
    }

    pub fn clear_flag(&mut self, flag: Flag) {
        self.0.set_bit(flag.bit(), false);
    }

    /// The N, Z, C and V flags as a nibble (N in bit 3).
    #[must_use]
    pub fn flags(self) -> u8 {
        self.0.get_bits(4..=7)
    }

    /// N => Bit 7, (0=Not Signed, 1=Signed)
    #[must_use]
    pub fn sign_flag(self) -> bool {
        self.is_set(Flag::Negative)
    }

    /// Z => Bit 6, (0=Not Zero, 1=Zero)
    #[must_use]
    pub fn zero_flag(self) -> bool {
        self.is_set(Flag::Zero)
    }

    /// C => Bit 5, (0=Borrow/No Carry, 1=Carry/No Borrow)
    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.is_set(Flag::Carry)
    }

    /// V => Bit 4, (0=No Overflow, 1=Overflow)
    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.is_set(Flag::Overflow)
    }

    /// I => Bit 3, (0=Enable, 1=Disable)
    #[must_use]
    pub fn irq_disable(self) -> bool {
        self.is_set(Flag::IrqDisable)
    }

    /// F => Bit 2, (0=Enable, 1=Disable)
    #[must_use]
    pub fn fiq_disable(self) -> bool {
        self.is_set(Flag::FiqDisable)
    }

    /// M1-M0 => Bits 1-0
    #[must_use]
    pub fn mode(self) -> Mode {
        self.0.get_bits(0..=1).into()
    }

    pub fn set_sign_flag(&mut self, value: bool) {
        self.0.set_bit(Flag::Negative.bit(), value);
    }

    pub fn set_zero_flag(&mut self, value: bool) {
        self.0.set_bit(Flag::Zero.bit(), value);
    }

    pub fn set_carry_flag(&mut self, value: bool) {
        self.0.set_bit(Flag::Carry.bit(), value);
    }

    pub fn set_overflow_flag(&mut self, value: bool) {
        self.0.set_bit(Flag::Overflow.bit(), value);
    }

    pub fn set_irq_disable(&mut self, value: bool) {
        self.0.set_bit(Flag::IrqDisable.bit(), value);
    }

    pub fn set_fiq_disable(&mut self, value: bool) {
        self.0.set_bit(Flag::FiqDisable.bit(), value);
    }

    pub fn set_mode(&mut self, m: Mode) {
        self.0.set_bits(0..=1, m.into());
    }

    /// Writes all four condition flags from an arithmetic result.
    pub fn set_flags(&mut self, op_result: &ArithmeticOpResult) {
        self.set_carry_flag(op_result.carry);
        self.set_zero_flag(op_result.zero);
        self.set_sign_flag(op_result.sign);
        self.set_overflow_flag(op_result.overflow);
    }

    /// Writes N and Z from a logical result. C and V keep their value.
    pub fn set_logical_flags(&mut self, result: u32) {
        self.set_zero_flag(result == 0);
        self.set_sign_flag(result.get_bit(31));
    }
}

impl From<Mode> for Psr {
    fn from(m: Mode) -> Self {
        let mut s = Self(0);

        s.set_mode(m);

        s
    }
}

impl From<u8> for Psr {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Psr> for u8 {
    fn from(p: Psr) -> Self {
        p.0
    }
}

impl std::fmt::Display for Psr {
    /// Set flags are upper case, clear flags lower case: `nZCv if usr`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = |set: bool, c: char| if set { c.to_ascii_uppercase() } else { c };
        write!(
            f,
            "{}{}{}{} {}{} {}",
            letter(self.sign_flag(), 'n'),
            letter(self.zero_flag(), 'z'),
            letter(self.carry_flag(), 'c'),
            letter(self.overflow_flag(), 'v'),
            letter(self.irq_disable(), 'i'),
            letter(self.fiq_disable(), 'f'),
            self.mode()
        )
    }
}
