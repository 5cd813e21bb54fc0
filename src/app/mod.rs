pub mod filter_use_case;
pub mod ports;

pub use filter_use_case::{FilterUseCase, RunOutcome};
