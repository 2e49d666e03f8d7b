use serde::{Deserialize, Serialize};

/// Operating mode stored in bits 1-0 of the status register.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Mode {
    /// The normal program execution state. Programs start here.
    User = 0b00,

    /// Fast interrupt handling.
    Fiq = 0b01,

    /// General-purpose interrupt handling.
    Irq = 0b10,

    /// Entered by a software interrupt (`SWI`).
    Supervisor = 0b11,
}

impl From<Mode> for u8 {
    fn from(m: Mode) -> Self {
        m as Self
    }
}

impl From<u8> for Mode {
    /// Only the two low bits are read, so every value maps to a mode.
    fn from(n: u8) -> Self {
        match n & 0b11 {
            0b00 => Self::User,
            0b01 => Self::Fiq,
            0b10 => Self::Irq,
            _ => Self::Supervisor,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("usr"),
            Self::Fiq => f.write_str("fiq"),
            Self::Irq => f.write_str("irq"),
            Self::Supervisor => f.write_str("svc"),
        }
    }
}
