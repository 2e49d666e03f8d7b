use serde::{Deserialize, Serialize};

use crate::cpu::arm::instructions::{ArmModeInstruction, UnsupportedKind};
use crate::cpu::arm::opcode::ArmModeOpcode;
use crate::cpu::psr::Psr;
use crate::cpu::registers::Registers;
use crate::error::MachineError;
use crate::memory::io_device::IoDevice;

pub const SIZE_OF_ARM_INSTRUCTION: u32 = 4;

/// Where `SWI` jumps to.
pub const SOFTWARE_INTERRUPT_VECTOR: u32 = 0x08;

/// What happened to a decoded instruction handed to [`Arm7tdmi::execute_arm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    Executed,

    /// The condition did not hold against the current flags.
    Skipped,

    /// The word is outside the implemented subset. It is stepped over.
    Unsupported(UnsupportedKind),
}

/// Processor state: registers, current and saved status registers.
///
/// Memory is not owned by the core; every `execute_arm` call borrows the
/// device data transfers go to.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arm7tdmi {
    pub cpsr: Psr,

    /// Saved status register, written on interrupt entry.
    pub spsr: Psr,

    pub registers: Registers,
}

impl Arm7tdmi {
    /// Executes the instruction sitting at the current program counter.
    ///
    /// The program counter ends up on the next instruction to fetch. When a
    /// memory access fails the error is returned before any register is
    /// modified.
    pub fn execute_arm<M: IoDevice>(
        &mut self,
        op_code: ArmModeOpcode,
        memory: &mut M,
    ) -> Result<Execution, MachineError> {
        use ArmModeInstruction::{
            Branch, DataProcessing, SingleDataTransfer, SoftwareInterrupt, Unsupported,
        };

        if !self.cpsr.can_execute(op_code.condition) {
            self.registers
                .advance_program_counter(SIZE_OF_ARM_INSTRUCTION);
            return Ok(Execution::Skipped);
        }

        // Instruction functions return whether PC has to be advanced
        // after the instruction executed.
        let bytes_to_advance = match op_code.instruction {
            DataProcessing {
                alu_instruction,
                set_conditions,
                rn,
                destination,
                op2,
            } => self.data_processing(alu_instruction, set_conditions, rn, destination, op2),
            SingleDataTransfer {
                kind,
                quantity,
                write_back,
                indexing,
                offsetting,
                rd,
                base_register,
                offset_info,
            } => self.single_data_transfer(
                kind,
                quantity,
                write_back,
                indexing,
                offsetting,
                rd,
                base_register,
                offset_info,
                memory,
            )?,
            Branch { link, offset } => self.branch(link, offset),
            SoftwareInterrupt { comment } => self.software_interrupt(comment),
            Unsupported { kind, .. } => {
                self.registers
                    .advance_program_counter(SIZE_OF_ARM_INSTRUCTION);
                return Ok(Execution::Unsupported(kind));
            }
        };

        self.registers
            .advance_program_counter(bytes_to_advance.unwrap_or(0));

        Ok(Execution::Executed)
    }
}
