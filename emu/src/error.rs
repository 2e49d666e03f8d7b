use crate::machine::MachineState;

/// Everything that can go wrong while loading or running a program.
///
/// Condition failures and unsupported encodings are not errors: they are
/// reported through [`StepOutcome`](crate::machine::StepOutcome).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    #[error("instruction store is full ({capacity} words)")]
    StoreFull { capacity: usize },

    #[error("program already started (machine is {state})")]
    NotLoading { state: MachineState },

    #[error("data memory access at 0x{address:08X} is outside the {size} bytes available")]
    InvalidAddress { address: u32, size: usize },
}
