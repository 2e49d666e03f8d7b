use crate::cpu::arm::alu_instruction::{
    AluSecondOperandInfo, ArmModeAluInstruction, ShiftOperator, add_inner_op, add_with_carry,
    immediate_shift, shift, sub_inner_op, sub_with_carry,
};
use crate::cpu::arm::instructions::SingleDataTransferOffsetInfo;
use crate::cpu::arm7tdmi::{Arm7tdmi, SIZE_OF_ARM_INSTRUCTION, SOFTWARE_INTERRUPT_VECTOR};
use crate::cpu::cpu_modes::Mode;
use crate::cpu::flags::{Indexing, LoadStoreKind, Offsetting, ReadWriteKind};
use crate::cpu::registers::REG_PROGRAM_COUNTER;
use crate::error::MachineError;
use crate::memory::io_device::IoDevice;

/// How far ahead of the executing instruction R15 reads as an operand.
const PC_READ_OFFSET: u32 = 8;

/// R15 as an operand when the shift amount comes from a register.
const PC_READ_OFFSET_REGISTER_SHIFT: u32 = 12;

/// R15 as the source of a store.
const PC_STORE_OFFSET: u32 = 12;

impl Arm7tdmi {
    pub fn data_processing(
        &mut self,
        alu_instruction: ArmModeAluInstruction,
        set_conditions: bool,
        rn: usize,
        destination: usize,
        op2: AluSecondOperandInfo,
    ) -> Option<u32> {
        let pc_offset = Self::get_pc_offset_alu(op2);
        let op1 = self.read_operand_register(rn, pc_offset);
        let op2 = self.get_operand(op2, pc_offset);

        // S = 1 and Rd = R15 outside User mode restores the saved status
        // register instead of computing flags.
        let exception_return = set_conditions
            && destination == REG_PROGRAM_COUNTER
            && alu_instruction.writes_destination()
            && self.cpsr.mode() != Mode::User;
        let s = set_conditions && !exception_return;

        use ArmModeAluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match alu_instruction {
            And => self.and(destination, op1, op2, s),
            Eor => self.eor(destination, op1, op2, s),
            Sub => self.sub(destination, op1, op2, s),
            Rsb => self.rsb(destination, op1, op2, s),
            Add => self.add(destination, op1, op2, s),
            Adc => self.adc(destination, op1, op2, s),
            Sbc => self.sbc(destination, op1, op2, s),
            Rsc => self.rsc(destination, op1, op2, s),
            Tst => self.tst(op1, op2, s),
            Teq => self.teq(op1, op2, s),
            Cmp => self.cmp(op1, op2, s),
            Cmn => self.cmn(op1, op2, s),
            Orr => self.orr(destination, op1, op2, s),
            Mov => self.mov(destination, op2, s),
            Bic => self.bic(destination, op1, op2, s),
            Mvn => self.mvn(destination, op2, s),
        }

        if exception_return {
            tracing::debug!("exception return to {}", self.spsr.mode());
            self.cpsr = self.spsr;
        }

        // Test instructions do not modify destination so we don't jump even
        // if destination == R15
        if alu_instruction.writes_destination() && destination == REG_PROGRAM_COUNTER {
            self.align_program_counter();
            None
        } else {
            Some(SIZE_OF_ARM_INSTRUCTION)
        }
    }

    /// Value of operand 2 after the barrel shifter.
    ///
    /// The carry out of the shifter is discarded: only arithmetic results
    /// write C.
    pub fn get_operand(&self, op2: AluSecondOperandInfo, pc_offset: u32) -> u32 {
        match op2 {
            AluSecondOperandInfo::Immediate { base, shift } => base.rotate_right(shift),
            AluSecondOperandInfo::Register {
                shift_op,
                shift_kind,
                register,
            } => {
                let rm = self.read_operand_register(register, pc_offset);
                let carry = self.cpsr.carry_flag();

                match shift_op {
                    ShiftOperator::Immediate(amount) => {
                        immediate_shift(shift_kind, amount, rm, carry).result
                    }
                    ShiftOperator::Register(rs) => {
                        // Only the bottom byte of Rs is used.
                        let amount = self.read_operand_register(rs, pc_offset) & 0xFF;
                        shift(shift_kind, amount, rm, carry).result
                    }
                }
            }
        }
    }

    pub(crate) const fn get_pc_offset_alu(op2: AluSecondOperandInfo) -> u32 {
        match op2 {
            AluSecondOperandInfo::Register {
                shift_op: ShiftOperator::Register(_),
                ..
            } => PC_READ_OFFSET_REGISTER_SHIFT,
            _ => PC_READ_OFFSET,
        }
    }

    /// Register value as seen by an operand: R15 reads ahead of the
    /// executing instruction.
    fn read_operand_register(&self, reg: usize, pc_offset: u32) -> u32 {
        let value = self.registers.register_at(reg);
        if reg == REG_PROGRAM_COUNTER {
            value.wrapping_add(pc_offset)
        } else {
            value
        }
    }

    fn align_program_counter(&mut self) {
        let pc = self.registers.program_counter();
        self.registers.set_program_counter(pc & !0b11);
    }

    pub fn and(&mut self, rd: usize, rn: u32, op2: u32, s: bool) {
        let result = rn & op2;

        self.registers.set_register_at(rd, result);

        if s {
            self.cpsr.set_logical_flags(result);
        }
    }

    pub fn eor(&mut self, rd: usize, rn: u32, op2: u32, s: bool) {
        let result = rn ^ op2;

        self.registers.set_register_at(rd, result);

        if s {
            self.cpsr.set_logical_flags(result);
        }
    }

    fn sub(&mut self, rd: usize, rn: u32, op2: u32, s: bool) {
        let sub_result = sub_inner_op(rn, op2);

        self.registers.set_register_at(rd, sub_result.result);

        if s {
            self.cpsr.set_flags(&sub_result);
        }
    }

    fn rsb(&mut self, rd: usize, rn: u32, op2: u32, s: bool) {
        self.sub(rd, op2, rn, s);
    }

    fn add(&mut self, rd: usize, rn: u32, op2: u32, s: bool) {
        let add_result = add_inner_op(rn, op2);

        self.registers.set_register_at(rd, add_result.result);

        if s {
            self.cpsr.set_flags(&add_result);
        }
    }

    fn adc(&mut self, rd: usize, rn: u32, op2: u32, s: bool) {
        let result = add_with_carry(rn, op2, self.cpsr.carry_flag());

        self.registers.set_register_at(rd, result.result);

        if s {
            self.cpsr.set_flags(&result);
        }
    }

    fn sbc(&mut self, rd: usize, rn: u32, op2: u32, s: bool) {
        let result = sub_with_carry(rn, op2, self.cpsr.carry_flag());

        self.registers.set_register_at(rd, result.result);

        if s {
            self.cpsr.set_flags(&result);
        }
    }

    fn rsc(&mut self, rd: usize, rn: u32, op2: u32, s: bool) {
        self.sbc(rd, op2, rn, s);
    }

    pub fn tst(&mut self, rn: u32, op2: u32, s: bool) {
        if s {
            self.cpsr.set_logical_flags(rn & op2);
        }
    }

    fn teq(&mut self, rn: u32, op2: u32, s: bool) {
        if s {
            self.cpsr.set_logical_flags(rn ^ op2);
        }
    }

    pub fn cmp(&mut self, rn: u32, op2: u32, s: bool) {
        if s {
            self.cpsr.set_flags(&sub_inner_op(rn, op2));
        }
    }

    fn cmn(&mut self, rn: u32, op2: u32, s: bool) {
        if s {
            self.cpsr.set_flags(&add_inner_op(rn, op2));
        }
    }

    pub fn orr(&mut self, rd: usize, rn: u32, op2: u32, s: bool) {
        let result = rn | op2;

        self.registers.set_register_at(rd, result);

        if s {
            self.cpsr.set_logical_flags(result);
        }
    }

    fn mov(&mut self, rd: usize, op2: u32, s: bool) {
        self.registers.set_register_at(rd, op2);

        if s {
            self.cpsr.set_logical_flags(op2);
        }
    }

    fn bic(&mut self, rd: usize, rn: u32, op2: u32, s: bool) {
        let result = rn & !op2;

        self.registers.set_register_at(rd, result);

        if s {
            self.cpsr.set_logical_flags(result);
        }
    }

    pub fn mvn(&mut self, rd: usize, op2: u32, s: bool) {
        let result = !op2;

        self.registers.set_register_at(rd, result);

        if s {
            self.cpsr.set_logical_flags(result);
        }
    }

    /// `offset` is in bytes, relative to the instruction address plus 8.
    pub fn branch(&mut self, link: bool, offset: i32) -> Option<u32> {
        let address = self.registers.program_counter();
        if link {
            self.registers
                .set_link_register(address.wrapping_add(SIZE_OF_ARM_INSTRUCTION));
        }

        let new_pc = address
            .wrapping_add(PC_READ_OFFSET)
            .wrapping_add_signed(offset);
        self.registers.set_program_counter(new_pc);

        None
    }

    pub fn software_interrupt(&mut self, comment: u32) -> Option<u32> {
        let address = self.registers.program_counter();
        tracing::debug!("SWI 0x{comment:06X} at 0x{address:08X}");

        self.spsr = self.cpsr;
        self.registers
            .set_link_register(address.wrapping_add(SIZE_OF_ARM_INSTRUCTION));
        self.cpsr.set_mode(Mode::Supervisor);
        self.cpsr.set_irq_disable(true);
        self.registers
            .set_program_counter(SOFTWARE_INTERRUPT_VECTOR);

        None
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn single_data_transfer<M: IoDevice>(
        &mut self,
        kind: LoadStoreKind,
        quantity: ReadWriteKind,
        write_back: bool,
        indexing: Indexing,
        offsetting: Offsetting,
        rd: usize,
        base_register: usize,
        offset_info: SingleDataTransferOffsetInfo,
        memory: &mut M,
    ) -> Result<Option<u32>, MachineError> {
        let base = self.read_operand_register(base_register, PC_READ_OFFSET);

        let amount = match offset_info {
            SingleDataTransferOffsetInfo::Immediate { offset } => offset,
            SingleDataTransferOffsetInfo::RegisterImmediate {
                shift_amount,
                shift_kind,
                reg_offset,
            } => {
                let rm = self.read_operand_register(reg_offset, PC_READ_OFFSET);
                immediate_shift(shift_kind, shift_amount, rm, self.cpsr.carry_flag()).result
            }
        };

        let offset_address = offsetting.apply(base, amount);
        let address = match indexing {
            Indexing::Pre => offset_address,
            Indexing::Post => base,
        };

        // Memory is touched before any register so a failing access leaves
        // the core untouched.
        let loaded = match kind {
            LoadStoreKind::Load => Some(match quantity {
                ReadWriteKind::Byte => u32::from(memory.read_at(address)?),
                ReadWriteKind::Word => {
                    // Unaligned words are read from the aligned address and
                    // rotated so that the addressed byte ends up in bits 7-0.
                    let rotation = 8 * (address & 0b11);
                    memory.read_word(address & !0b11)?.rotate_right(rotation)
                }
            }),
            LoadStoreKind::Store => {
                let value = if rd == REG_PROGRAM_COUNTER {
                    self.registers
                        .program_counter()
                        .wrapping_add(PC_STORE_OFFSET)
                } else {
                    self.registers.register_at(rd)
                };

                match quantity {
                    ReadWriteKind::Byte => memory.write_at(address, value as u8)?,
                    ReadWriteKind::Word => memory.write_word(address & !0b11, value)?,
                }
                None
            }
        };

        // write back is always true when using post indexing
        if write_back || indexing == Indexing::Post {
            if base_register == REG_PROGRAM_COUNTER {
                tracing::warn!("write-back to R15 ignored");
            } else {
                self.registers
                    .set_register_at(base_register, offset_address);
            }
        }

        // A load into the base register wins over write-back.
        if let Some(value) = loaded {
            self.registers.set_register_at(rd, value);

            if rd == REG_PROGRAM_COUNTER {
                self.align_program_counter();
                return Ok(None);
            }
        }

        Ok(Some(SIZE_OF_ARM_INSTRUCTION))
    }
}
