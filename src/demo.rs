//! Program run when no file is given.

/// Sums 5 + 4 + 3 + 2 + 1 in a loop, stores the sum to data memory, loads it
/// back, flags the result and parks on a branch to itself.
pub const PROGRAM: [u32; 11] = [
    0xE3A0_0000, // 0x00  MOV R0, #0
    0xE3A0_1005, // 0x04  MOV R1, #5
    0xE080_0001, // 0x08  ADD R0, R0, R1
    0xE251_1001, // 0x0C  SUBS R1, R1, #1
    0x1AFF_FFFC, // 0x10  BNE 0x08
    0xE3A0_2C01, // 0x14  MOV R2, #0x100
    0xE482_0004, // 0x18  STR R0, [R2], #4
    0xE512_3004, // 0x1C  LDR R3, [R2, #-4]
    0xE353_000F, // 0x20  CMP R3, #15
    0x03A0_4001, // 0x24  MOVEQ R4, #1
    0xEAFF_FFFE, // 0x28  B 0x28
];

#[cfg(test)]
mod tests {
    use super::*;
    use emu::machine::{HaltReason, Machine};
    use emu::memory::io_device::IoDevice;
    use pretty_assertions::assert_eq;

    #[test]
    fn demo_runs_to_the_final_branch() {
        let mut machine = Machine::default();
        machine.load_program(PROGRAM).unwrap();

        let summary = machine.run().unwrap();

        assert_eq!(summary.halt_reason, HaltReason::SelfBranch);
        assert_eq!(summary.stats.steps, 23);
        assert_eq!(summary.stats.skipped, 1);

        let registers = &machine.cpu().registers;
        assert_eq!(registers.register_at(0), 15);
        assert_eq!(registers.register_at(1), 0);
        assert_eq!(registers.register_at(2), 0x104);
        assert_eq!(registers.register_at(3), 15);
        assert_eq!(registers.register_at(4), 1);
        assert_eq!(registers.program_counter(), 0x28);
        assert!(machine.cpu().cpsr.zero_flag());
        assert_eq!(machine.data_memory().read_word(0x100), Ok(15));
    }

    #[test]
    fn comments_match_disassembly() {
        use emu::cpu::arm::opcode::ArmModeOpcode;

        let listing: Vec<String> = PROGRAM
            .iter()
            .map(|word| ArmModeOpcode::from(*word).to_string())
            .collect();

        assert_eq!(listing[5], "MOV R2, #256");
        assert_eq!(listing[6], "STR R0, [R2], #4");
        assert_eq!(listing[7], "LDR R3, [R2, #-4]");
        assert_eq!(listing[9], "MOVEQ R4, #1");
    }
}
