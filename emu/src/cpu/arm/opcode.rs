use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::arm::instructions::ArmModeInstruction;
use crate::cpu::condition::Condition;

/// A raw 32-bit instruction word.
///
/// The byte view is little-endian: byte 0 holds bits 7-0 and byte 3 holds
/// bits 31-24 (the condition nibble lives in the high half of byte 3).
///
/// ```
/// use emu::cpu::arm::opcode::InstructionWord;
///
/// let word = InstructionWord::new(0xE3A0_0001);
/// assert_eq!(word.to_bytes(), [0x01, 0x00, 0xA0, 0xE3]);
/// assert_eq!(InstructionWord::from_bytes([0x01, 0x00, 0xA0, 0xE3]), word);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstructionWord(u32);

impl InstructionWord {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }

    /// # Panics
    ///
    /// Panics if `byte_nth` is greater than 3.
    #[must_use]
    pub fn byte(self, byte_nth: u8) -> u8 {
        assert!(byte_nth < 4, "an instruction word has 4 bytes, asked for byte {byte_nth}");
        self.0.get_bits(byte_nth * 8..=byte_nth * 8 + 7) as u8
    }
}

impl From<u32> for InstructionWord {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<InstructionWord> for u32 {
    fn from(word: InstructionWord) -> Self {
        word.0
    }
}

impl std::fmt::Display for InstructionWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// A decoded instruction word: the condition, the instruction fields and
/// the word they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmModeOpcode {
    pub instruction: ArmModeInstruction,
    pub condition: Condition,
    pub raw: InstructionWord,
}

impl ArmModeOpcode {
    /// Decodes a word. Total: every word decodes, independently of the
    /// machine state.
    #[must_use]
    pub fn decode(word: InstructionWord) -> Self {
        let op_code = word.raw();
        Self {
            instruction: ArmModeInstruction::from(op_code),
            condition: Condition::from(op_code.get_bits(28..=31) as u8),
            raw: word,
        }
    }

    /// Re-encodes the decoded fields. `None` for unsupported encodings.
    #[must_use]
    pub fn encode(&self) -> Option<InstructionWord> {
        self.instruction
            .encode(self.condition)
            .map(InstructionWord::new)
    }

    /// Raw bits under the field layout of the instruction, for tracing.
    #[must_use]
    pub fn bit_layout(&self) -> String {
        let bytes_pos1 = "POS: |..3 ..................2 ..................1 ..................0|\n";
        let bytes_pos2 = "     |1_0_9_8_7_6_5_4_3_2_1_0_9_8_7_6_5_4_3_2_1_0_9_8_7_6_5_4_3_2_1_0|\n";

        let op_code_format = match &self.instruction {
            ArmModeInstruction::DataProcessing { .. } => {
                "FMT: |_Cond__|0_0|I|_code__|S|__Rn___|__Rd___|_______operand2________|"
            }
            ArmModeInstruction::SingleDataTransfer { .. } => {
                "FMT: |_Cond__|0_1|I|P|U|B|W|L|__Rn___|__Rd___|________Offset_________|"
            }
            ArmModeInstruction::Branch { .. } => {
                "FMT: |_Cond__|1_0|1|L|______________________Offset___________________|"
            }
            ArmModeInstruction::SoftwareInterrupt { .. } => {
                "FMT: |_Cond__|1_1|1_1|_____________________Comment___________________|"
            }
            ArmModeInstruction::Unsupported { .. } => "FMT: |_Cond__|Cat|",
        };

        let mut raw_bits = String::new();
        for i in format!("{:032b}", self.raw.raw()).chars() {
            raw_bits.push(i);
            raw_bits.push('_');
        }
        raw_bits.pop();

        format!("{bytes_pos1}{bytes_pos2}RAW: |{raw_bits}|\n{op_code_format}")
    }
}

impl From<u32> for ArmModeOpcode {
    fn from(op_code: u32) -> Self {
        Self::decode(InstructionWord::new(op_code))
    }
}

impl std::ops::Deref for ArmModeOpcode {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.raw.0
    }
}

impl std::fmt::Display for ArmModeOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.instruction.disassembler(self.condition))
    }
}
