//! System prompt assembly.

mod prompt;

pub use prompt::{assemble, PromptAssembler};
