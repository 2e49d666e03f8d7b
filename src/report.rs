use std::fmt::Write;

use emu::cpu::arm7tdmi::Arm7tdmi;
use emu::machine::RunSummary;
use serde::Serialize;

/// Final machine state, printed once the run is over.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub summary: RunSummary,
    pub cpu: &'a Arm7tdmi,
}

impl Report<'_> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    #[must_use]
    pub fn to_text(&self) -> String {
        let stats = self.summary.stats;
        let mut text = format!(
            "halted: {} after {} steps ({} executed, {} skipped, {} unsupported)\n",
            self.summary.halt_reason,
            stats.steps,
            stats.executed,
            stats.skipped,
            stats.unsupported
        );

        for (index, value) in self.cpu.registers.to_vec().iter().enumerate() {
            let separator = if index % 4 == 3 { "\n" } else { "  " };
            let _ = write!(text, "{:<4}0x{value:08X}{separator}", format!("R{index}"));
        }

        let _ = writeln!(text, "CPSR 0x{:02X} [{}]", u8::from(self.cpu.cpsr), self.cpu.cpsr);
        let _ = write!(text, "SPSR 0x{:02X} [{}]", u8::from(self.cpu.spsr), self.cpu.spsr);

        text
    }
}
