use serde::{Deserialize, Serialize};

use crate::cpu::arm::opcode::InstructionWord;
use crate::error::MachineError;

/// Fixed-capacity program storage.
///
/// Words are appended in load order; the word loaded `n`-th lives at byte
/// address `4 * n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionStore {
    words: Vec<InstructionWord>,
    capacity: usize,
}

impl InstructionStore {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            words: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, word: InstructionWord) -> Result<(), MachineError> {
        if self.words.len() >= self.capacity {
            return Err(MachineError::StoreFull {
                capacity: self.capacity,
            });
        }

        self.words.push(word);
        Ok(())
    }

    /// The word at byte `address`, ignoring the two low bits. `None` past
    /// the last loaded word.
    #[must_use]
    pub fn fetch(&self, address: u32) -> Option<InstructionWord> {
        let index = usize::try_from(address >> 2).ok()?;
        self.words.get(index).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstructionWord> {
        self.words.iter()
    }
}
