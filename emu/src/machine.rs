//! # Machine
//!
//! Owns a core, the instruction store and data memory, and drives the
//! fetch-decode-execute loop.
//!
//! ```text
//!   load()* ──► Loading ──run()/step()──► Running ──► Halted(reason)
//! ```
//!
//! Instructions are loaded one word at a time while the machine is
//! `Loading`. The first `run` or `step` starts execution with every register
//! and the status register cleared, and the program counter on the first
//! loaded word. There is no way back to `Loading`.
//!
//! ```
//! use emu::machine::{HaltReason, Machine};
//!
//! let mut machine = Machine::default();
//! // MOV R0, #1; MOV R1, #2; ADD R2, R0, R1
//! machine.load_program([0xE3A0_0001_u32, 0xE3A0_1002, 0xE080_2001]).unwrap();
//!
//! let summary = machine.run().unwrap();
//! assert_eq!(summary.halt_reason, HaltReason::EndOfProgram);
//! assert_eq!(machine.cpu().registers.register_at(2), 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::cpu::arm::instructions::ArmModeInstruction;
use crate::cpu::arm::opcode::{ArmModeOpcode, InstructionWord};
use crate::cpu::arm7tdmi::{Arm7tdmi, Execution};
use crate::error::MachineError;
use crate::memory::data_memory::DataMemory;
use crate::memory::instruction_store::InstructionStore;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// The program counter moved past the last loaded word.
    EndOfProgram,

    /// A taken branch targeted its own address.
    SelfBranch,

    /// The configured step limit was reached.
    StepLimit,

    /// A data access failed; the error was returned to the caller.
    Fault,
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndOfProgram => f.write_str("end of program"),
            Self::SelfBranch => f.write_str("branch to self"),
            Self::StepLimit => f.write_str("step limit reached"),
            Self::Fault => f.write_str("memory fault"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    Loading,
    Running,
    Halted(HaltReason),
}

impl std::fmt::Display for MachineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => f.write_str("loading"),
            Self::Running => f.write_str("running"),
            Self::Halted(reason) => write!(f, "halted: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Number of instruction words the store accepts.
    pub instruction_capacity: usize,

    /// Size of data memory in bytes.
    pub data_memory_size: usize,

    /// Stop after this many fetched instructions. `None` runs until the
    /// program ends or branches to itself.
    pub max_steps: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            instruction_capacity: 1024,
            data_memory_size: 0x1_0000,
            max_steps: None,
        }
    }
}

/// Result of a single [`Machine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed(ArmModeOpcode),
    Skipped(ArmModeOpcode),
    Unsupported(ArmModeOpcode),

    /// Nothing was fetched; the machine is halted.
    Halted(HaltReason),
}

/// Counters kept across the whole run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Fetched instructions, whatever their outcome.
    pub steps: u64,
    pub executed: u64,
    pub skipped: u64,
    pub unsupported: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub halt_reason: HaltReason,
    pub stats: ExecutionStats,
}

#[derive(Debug, Clone)]
pub struct Machine {
    cpu: Arm7tdmi,
    instructions: InstructionStore,
    data_memory: DataMemory,
    state: MachineState,
    max_steps: Option<u64>,
    stats: ExecutionStats,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(&MachineConfig::default())
    }
}

impl Machine {
    #[must_use]
    pub fn new(config: &MachineConfig) -> Self {
        Self {
            cpu: Arm7tdmi::default(),
            instructions: InstructionStore::new(config.instruction_capacity),
            data_memory: DataMemory::new(config.data_memory_size),
            state: MachineState::Loading,
            max_steps: config.max_steps,
            stats: ExecutionStats::default(),
        }
    }

    /// Appends one word to the program.
    pub fn load(&mut self, word: impl Into<InstructionWord>) -> Result<(), MachineError> {
        if self.state != MachineState::Loading {
            return Err(MachineError::NotLoading { state: self.state });
        }

        let word = word.into();
        self.instructions.push(word)?;
        tracing::trace!("loaded {word} at 0x{:08X}", (self.instructions.len() - 1) * 4);

        Ok(())
    }

    /// Loads every word in order, stopping at the first failure.
    pub fn load_program<I>(&mut self, words: I) -> Result<(), MachineError>
    where
        I: IntoIterator,
        I::Item: Into<InstructionWord>,
    {
        words.into_iter().try_for_each(|word| self.load(word))
    }

    /// Runs the loaded program until the machine halts.
    ///
    /// Only valid while `Loading`: a program is run once. Use
    /// [`step`](Self::step) to drive the machine by hand instead.
    pub fn run(&mut self) -> Result<RunSummary, MachineError> {
        if self.state != MachineState::Loading {
            return Err(MachineError::NotLoading { state: self.state });
        }

        loop {
            if let StepOutcome::Halted(halt_reason) = self.step()? {
                return Ok(RunSummary {
                    halt_reason,
                    stats: self.stats,
                });
            }
        }
    }

    /// Fetches, decodes and executes one instruction.
    pub fn step(&mut self) -> Result<StepOutcome, MachineError> {
        match self.state {
            MachineState::Loading => self.start(),
            MachineState::Running => {}
            MachineState::Halted(reason) => return Ok(StepOutcome::Halted(reason)),
        }

        // We set pc lowest bits to 0: instructions are word aligned.
        let mut address = self.cpu.registers.program_counter();
        if address & 0b11 != 0 {
            address &= !0b11;
            self.cpu.registers.set_program_counter(address);
        }

        let Some(word) = self.instructions.fetch(address) else {
            return Ok(self.halt(HaltReason::EndOfProgram));
        };

        if self.max_steps.is_some_and(|max| self.stats.steps >= max) {
            return Ok(self.halt(HaltReason::StepLimit));
        }

        let op_code = ArmModeOpcode::decode(word);
        tracing::debug!("0x{address:08X}: {word} {op_code}");
        tracing::trace!("\n{}", op_code.bit_layout());

        self.stats.steps += 1;
        let execution = match self.cpu.execute_arm(op_code, &mut self.data_memory) {
            Ok(execution) => execution,
            Err(error) => {
                tracing::error!("0x{address:08X}: {op_code}: {error}");
                self.halt(HaltReason::Fault);
                return Err(error);
            }
        };

        let outcome = match execution {
            Execution::Executed => {
                self.stats.executed += 1;
                StepOutcome::Executed(op_code)
            }
            Execution::Skipped => {
                self.stats.skipped += 1;
                StepOutcome::Skipped(op_code)
            }
            Execution::Unsupported(kind) => {
                self.stats.unsupported += 1;
                tracing::warn!("0x{address:08X}: unsupported {kind} instruction {word}");
                StepOutcome::Unsupported(op_code)
            }
        };

        if execution == Execution::Executed
            && matches!(op_code.instruction, ArmModeInstruction::Branch { .. })
            && self.cpu.registers.program_counter() == address
        {
            self.halt(HaltReason::SelfBranch);
        }

        Ok(outcome)
    }

    fn start(&mut self) {
        tracing::info!("starting run of {} instructions", self.instructions.len());
        self.cpu = Arm7tdmi::default();
        self.state = MachineState::Running;
    }

    fn halt(&mut self, reason: HaltReason) -> StepOutcome {
        tracing::info!(
            "halted ({reason}) after {} steps at PC 0x{:08X}",
            self.stats.steps,
            self.cpu.registers.program_counter()
        );
        self.state = MachineState::Halted(reason);
        StepOutcome::Halted(reason)
    }

    #[must_use]
    pub const fn state(&self) -> MachineState {
        self.state
    }

    #[must_use]
    pub const fn cpu(&self) -> &Arm7tdmi {
        &self.cpu
    }

    /// Mutable access to the core, to seed registers before a run.
    ///
    /// Changes made while `Loading` are discarded when the run starts, so
    /// seed after a first `step`.
    pub const fn cpu_mut(&mut self) -> &mut Arm7tdmi {
        &mut self.cpu
    }

    #[must_use]
    pub const fn data_memory(&self) -> &DataMemory {
        &self.data_memory
    }

    pub const fn data_memory_mut(&mut self) -> &mut DataMemory {
        &mut self.data_memory
    }

    #[must_use]
    pub const fn instructions(&self) -> &InstructionStore {
        &self.instructions
    }

    #[must_use]
    pub const fn stats(&self) -> ExecutionStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::cpu_modes::Mode;
    use crate::cpu::registers::REG_LR;
    use crate::memory::io_device::IoDevice;
    use pretty_assertions::assert_eq;

    fn machine_with(program: &[u32]) -> Machine {
        let mut machine = Machine::default();
        machine.load_program(program.iter().copied()).unwrap();
        machine
    }

    #[test]
    fn add_program() {
        let mut machine = machine_with(&[0xE3A0_0001, 0xE3A0_1002, 0xE080_2001]);
        assert_eq!(machine.state(), MachineState::Loading);

        let summary = machine.run().unwrap();

        assert_eq!(
            summary,
            RunSummary {
                halt_reason: HaltReason::EndOfProgram,
                stats: ExecutionStats {
                    steps: 3,
                    executed: 3,
                    skipped: 0,
                    unsupported: 0,
                },
            }
        );
        let registers = &machine.cpu().registers;
        assert_eq!(registers.register_at(0), 1);
        assert_eq!(registers.register_at(1), 2);
        assert_eq!(registers.register_at(2), 3);
        assert_eq!(registers.program_counter(), 12);
        assert!(!machine.cpu().cpsr.zero_flag());
        assert_eq!(
            machine.state(),
            MachineState::Halted(HaltReason::EndOfProgram)
        );
    }

    #[test]
    fn never_condition_has_no_effect() {
        let mut machine = machine_with(&[0xF3A0_0001]);

        let summary = machine.run().unwrap();

        assert_eq!(summary.stats.skipped, 1);
        assert_eq!(machine.cpu().registers.register_at(0), 0);
        assert_eq!(u8::from(machine.cpu().cpsr), 0);
    }

    #[test]
    fn empty_program_ends_immediately() {
        let mut machine = Machine::default();

        let summary = machine.run().unwrap();

        assert_eq!(summary.halt_reason, HaltReason::EndOfProgram);
        assert_eq!(summary.stats, ExecutionStats::default());
    }

    #[test]
    fn store_capacity() {
        let mut machine = Machine::new(&MachineConfig {
            instruction_capacity: 2,
            ..Default::default()
        });

        machine.load(0xE3A0_0001_u32).unwrap();
        machine.load(0xE3A0_0002_u32).unwrap();
        assert_eq!(
            machine.load(0xE3A0_0003_u32),
            Err(MachineError::StoreFull { capacity: 2 })
        );

        machine.run().unwrap();
        assert_eq!(machine.cpu().registers.register_at(0), 2);
    }

    #[test]
    fn load_after_start_is_rejected() {
        let mut machine = machine_with(&[0xE3A0_0001, 0xE3A0_0002]);

        machine.step().unwrap();
        assert_eq!(
            machine.load(0xE3A0_0003_u32),
            Err(MachineError::NotLoading {
                state: MachineState::Running
            })
        );

        assert_eq!(
            machine.run(),
            Err(MachineError::NotLoading {
                state: MachineState::Running
            })
        );

        while !matches!(machine.step(), Ok(StepOutcome::Halted(_))) {}
        assert_eq!(
            machine.load(0xE3A0_0003_u32),
            Err(MachineError::NotLoading {
                state: MachineState::Halted(HaltReason::EndOfProgram)
            })
        );
        assert_eq!(machine.instructions().len(), 2);
        assert_eq!(machine.cpu().registers.register_at(0), 2);
    }

    #[test]
    fn run_twice_is_rejected() {
        let mut machine = machine_with(&[0xE3A0_0001]);
        machine.run().unwrap();

        assert_eq!(
            machine.run(),
            Err(MachineError::NotLoading {
                state: MachineState::Halted(HaltReason::EndOfProgram)
            })
        );
        assert_eq!(machine.stats().steps, 1);
    }

    #[test]
    fn step_reports_each_outcome() {
        // MOVEQ R0, #1; MUL R0, R1, R2; MOV R0, #3
        let mut machine = machine_with(&[0x03A0_0001, 0xE000_0291, 0xE3A0_0003]);

        assert!(matches!(machine.step(), Ok(StepOutcome::Skipped(_))));
        assert!(matches!(machine.step(), Ok(StepOutcome::Unsupported(_))));
        assert!(matches!(machine.step(), Ok(StepOutcome::Executed(_))));
        assert_eq!(
            machine.step(),
            Ok(StepOutcome::Halted(HaltReason::EndOfProgram))
        );
        assert_eq!(
            machine.step(),
            Ok(StepOutcome::Halted(HaltReason::EndOfProgram))
        );

        assert_eq!(
            machine.stats(),
            ExecutionStats {
                steps: 3,
                executed: 1,
                skipped: 1,
                unsupported: 1,
            }
        );
        assert_eq!(machine.cpu().registers.register_at(0), 3);
    }

    #[test]
    fn countdown_loop() {
        // MOV R0, #3
        // loop: SUBS R0, R0, #1
        //       ADD R1, R1, #2
        //       BNE loop
        let mut machine = machine_with(&[0xE3A0_0003, 0xE250_0001, 0xE281_1002, 0x1AFF_FFFC]);

        let summary = machine.run().unwrap();

        assert_eq!(summary.halt_reason, HaltReason::EndOfProgram);
        assert_eq!(machine.cpu().registers.register_at(0), 0);
        assert_eq!(machine.cpu().registers.register_at(1), 6);
        assert!(machine.cpu().cpsr.zero_flag());
        assert_eq!(summary.stats.steps, 1 + 3 * 3);

        // The last BNE falls through.
        assert_eq!(summary.stats.skipped, 1);
    }

    #[test]
    fn branch_to_self_halts() {
        // MOV R0, #1; B .
        let mut machine = machine_with(&[0xE3A0_0001, 0xEAFF_FFFE]);

        let summary = machine.run().unwrap();

        assert_eq!(summary.halt_reason, HaltReason::SelfBranch);
        assert_eq!(summary.stats.steps, 2);
        assert_eq!(machine.cpu().registers.program_counter(), 4);
    }

    #[test]
    fn step_limit() {
        // loop: ADD R0, R0, #1; B loop
        let mut machine = Machine::new(&MachineConfig {
            max_steps: Some(9),
            ..Default::default()
        });
        machine.load_program([0xE280_0001_u32, 0xEAFF_FFFD]).unwrap();

        let summary = machine.run().unwrap();

        assert_eq!(summary.halt_reason, HaltReason::StepLimit);
        assert_eq!(summary.stats.steps, 9);
        assert_eq!(machine.cpu().registers.register_at(0), 5);
    }

    #[test]
    fn program_ending_on_the_step_limit_ends_normally() {
        let mut machine = Machine::new(&MachineConfig {
            max_steps: Some(3),
            ..Default::default()
        });
        machine
            .load_program([0xE3A0_0001_u32, 0xE3A0_1002, 0xE080_2001])
            .unwrap();

        let summary = machine.run().unwrap();

        assert_eq!(summary.halt_reason, HaltReason::EndOfProgram);
        assert_eq!(summary.stats.steps, 3);
        assert_eq!(machine.cpu().registers.register_at(2), 3);
    }

    #[test]
    fn step_limit_below_program_length() {
        let mut machine = Machine::new(&MachineConfig {
            max_steps: Some(2),
            ..Default::default()
        });
        machine
            .load_program([0xE3A0_0001_u32, 0xE3A0_1002, 0xE080_2001])
            .unwrap();

        let summary = machine.run().unwrap();

        assert_eq!(summary.halt_reason, HaltReason::StepLimit);
        assert_eq!(summary.stats.steps, 2);
        assert_eq!(machine.cpu().registers.register_at(2), 0);
    }

    #[test]
    fn invalid_address_aborts_the_run() {
        // MOV R1, #0x10000; LDR R0, [R1]; MOV R2, #1
        let mut machine = machine_with(&[0xE3A0_1801, 0xE591_0000, 0xE3A0_2001]);

        assert_eq!(
            machine.run(),
            Err(MachineError::InvalidAddress {
                address: 0x1_0000,
                size: 0x1_0000
            })
        );
        assert_eq!(machine.state(), MachineState::Halted(HaltReason::Fault));
        assert_eq!(machine.cpu().registers.register_at(2), 0);
        assert_eq!(machine.cpu().registers.program_counter(), 4);
    }

    #[test]
    fn store_then_load() {
        // MOV R0, #0xFF; MOV R1, #0x40; STR R0, [R1, #4]!; LDRB R2, [R1]
        let mut machine = machine_with(&[0xE3A0_00FF, 0xE3A0_1040, 0xE5A1_0004, 0xE5D1_2000]);

        machine.run().unwrap();

        assert_eq!(machine.data_memory().read_word(0x44), Ok(0xFF));
        assert_eq!(machine.cpu().registers.register_at(1), 0x44);
        assert_eq!(machine.cpu().registers.register_at(2), 0xFF);
    }

    #[test]
    fn software_interrupt_round_trip() {
        // 0x00: B start
        // 0x04: MOV R0, R0
        // 0x08: MOV R3, #7      (interrupt handler)
        // 0x0C: MOVS PC, LR
        // 0x10: start: MOV R1, #1
        // 0x14: SWI 0x11
        // 0x18: ADD R2, R1, R3
        let mut machine = machine_with(&[
            0xEA00_0002,
            0xE1A0_0000,
            0xE3A0_3007,
            0xE1B0_F00E,
            0xE3A0_1001,
            0xEF00_0011,
            0xE081_2003,
        ]);

        let summary = machine.run().unwrap();

        let cpu = machine.cpu();
        assert_eq!(summary.halt_reason, HaltReason::EndOfProgram);
        assert_eq!(cpu.registers.register_at(2), 8);
        assert_eq!(cpu.registers.register_at(REG_LR), 0x18);
        assert_eq!(cpu.cpsr.mode(), Mode::User);
        assert!(!cpu.cpsr.irq_disable());
        assert_eq!(cpu.spsr.mode(), Mode::User);
        assert_eq!(summary.stats.executed, 6);
    }

    #[test]
    fn start_resets_the_core() {
        let mut machine = machine_with(&[0xE3A0_0001]);
        machine.cpu_mut().registers.set_register_at(5, 9);

        machine.run().unwrap();

        assert_eq!(machine.cpu().registers.register_at(5), 0);
    }

    #[test]
    fn messages() {
        assert_eq!(MachineState::Loading.to_string(), "loading");
        assert_eq!(
            MachineState::Halted(HaltReason::SelfBranch).to_string(),
            "halted: branch to self"
        );
    }
}
