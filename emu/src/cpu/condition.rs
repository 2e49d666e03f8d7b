//! # Conditional Execution
//!
//! Every instruction word carries a condition in bits 31-28. The driver
//! checks it against the N, Z, C and V flags before dispatching; a failed
//! condition turns the instruction into a no-op that still advances the PC.
//!
//! ```text
//! ┌───────┬────────┬──────────────────────┬────────────────┐
//! │ Code  │ Suffix │ Meaning              │ Flags tested   │
//! ├───────┼────────┼──────────────────────┼────────────────┤
//! │ 0000  │   EQ   │ Equal                │ Z=1            │
//! │ 0001  │   NE   │ Not equal            │ Z=0            │
//! │ 0010  │   CS   │ Unsigned ≥           │ C=1            │
//! │ 0011  │   CC   │ Unsigned <           │ C=0            │
//! │ 0100  │   MI   │ Negative             │ N=1            │
//! │ 0101  │   PL   │ Positive or zero     │ N=0            │
//! │ 0110  │   VS   │ Overflow             │ V=1            │
//! │ 0111  │   VC   │ No overflow          │ V=0            │
//! │ 1000  │   HI   │ Unsigned >           │ C=1 AND Z=0    │
//! │ 1001  │   LS   │ Unsigned ≤           │ C=0 OR Z=1     │
//! │ 1010  │   GE   │ Signed ≥             │ N=V            │
//! │ 1011  │   LT   │ Signed <             │ N≠V            │
//! │ 1100  │   GT   │ Signed >             │ Z=0 AND N=V    │
//! │ 1101  │   LE   │ Signed ≤             │ Z=1 OR N≠V     │
//! │ 1110  │   AL   │ Always               │ -              │
//! │ 1111  │   NV   │ Never                │ -              │
//! └───────┴────────┴──────────────────────┴────────────────┘
//! ```
//!
//! The evaluation itself lives on [`Psr::can_execute`](super::psr::Psr::can_execute).

use serde::{Deserialize, Serialize};

/// Condition field of an instruction word (bits 31-28).
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum Condition {
    /// Equal (Z=1)
    EQ = 0x0,

    /// Not equal (Z=0)
    NE = 0x1,

    /// Carry set / unsigned higher or same (C=1)
    CS = 0x2,

    /// Carry clear / unsigned lower (C=0)
    CC = 0x3,

    /// Minus / negative (N=1)
    MI = 0x4,

    /// Plus / positive or zero (N=0)
    PL = 0x5,

    /// Overflow set (V=1)
    VS = 0x6,

    /// Overflow clear (V=0)
    VC = 0x7,

    /// Unsigned higher (C=1 AND Z=0)
    HI = 0x8,

    /// Unsigned lower or same (C=0 OR Z=1)
    LS = 0x9,

    /// Signed greater or equal (N=V)
    GE = 0xA,

    /// Signed less than (N≠V)
    LT = 0xB,

    /// Signed greater than (Z=0 AND N=V)
    GT = 0xC,

    /// Signed less than or equal (Z=1 OR N≠V)
    LE = 0xD,

    /// Always. Assembly omits the suffix (`MOV` = `MOVAL`).
    AL = 0xE,

    /// Never. The instruction is decoded but never dispatched.
    NV = 0xF,
}

impl Condition {
    /// All conditions in encoding order.
    pub const ALL: [Self; 16] = [
        Self::EQ,
        Self::NE,
        Self::CS,
        Self::CC,
        Self::MI,
        Self::PL,
        Self::VS,
        Self::VC,
        Self::HI,
        Self::LS,
        Self::GE,
        Self::LT,
        Self::GT,
        Self::LE,
        Self::AL,
        Self::NV,
    ];
}

impl From<u8> for Condition {
    /// Only the low nibble is meaningful; the decoder never passes more.
    fn from(item: u8) -> Self {
        match item {
            0x0 => Self::EQ,
            0x1 => Self::NE,
            0x2 => Self::CS,
            0x3 => Self::CC,
            0x4 => Self::MI,
            0x5 => Self::PL,
            0x6 => Self::VS,
            0x7 => Self::VC,
            0x8 => Self::HI,
            0x9 => Self::LS,
            0xA => Self::GE,
            0xB => Self::LT,
            0xC => Self::GT,
            0xD => Self::LE,
            0xE => Self::AL,
            0xF => Self::NV,
            _ => unreachable!("condition field is 4 bits wide, got {item:#X}"),
        }
    }
}

impl From<Condition> for u32 {
    fn from(condition: Condition) -> Self {
        condition as Self
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EQ => f.write_str("EQ"),
            Self::NE => f.write_str("NE"),
            Self::CS => f.write_str("CS"),
            Self::CC => f.write_str("CC"),
            Self::MI => f.write_str("MI"),
            Self::PL => f.write_str("PL"),
            Self::VS => f.write_str("VS"),
            Self::VC => f.write_str("VC"),
            Self::HI => f.write_str("HI"),
            Self::LS => f.write_str("LS"),
            Self::GE => f.write_str("GE"),
            Self::LT => f.write_str("LT"),
            Self::GT => f.write_str("GT"),
            Self::LE => f.write_str("LE"),
            Self::AL => Ok(()),
            Self::NV => f.write_str("NV"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_nibble_matches_discriminant() {
        for (code, condition) in Condition::ALL.iter().enumerate() {
            let code = u8::try_from(code).unwrap();
            assert_eq!(Condition::from(code), *condition);
            assert_eq!(u32::from(*condition), u32::from(code));
        }
    }

    #[test]
    #[should_panic]
    fn from_out_of_range_nibble() {
        let _ = Condition::from(0x10);
    }

    #[test]
    fn always_has_no_suffix() {
        assert_eq!(Condition::AL.to_string(), "");
        assert_eq!(Condition::LE.to_string(), "LE");
    }
}
