#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
pub mod bitwise;

pub mod cpu;
pub mod error;

#[allow(clippy::missing_errors_doc)]
pub mod machine;

#[allow(clippy::missing_errors_doc)]
pub mod memory;
