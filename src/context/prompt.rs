use std::sync::Arc;

/// Appends a context block to the base instruction. An empty block leaves the
/// instruction untouched.
pub fn assemble(base_instruction: &str, context: &str) -> String {
    if context.is_empty() {
        base_instruction.to_string()
    } else {
        format!("{}\n{}", base_instruction, context)
    }
}

/// Holds the persona chosen at startup and builds per-request system prompts
/// from it.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    base_instruction: Arc<str>,
}

impl PromptAssembler {
    pub fn new(base_instruction: impl Into<Arc<str>>) -> Self {
        Self {
            base_instruction: base_instruction.into(),
        }
    }

    pub fn assemble(&self, context: &str) -> String {
        assemble(&self.base_instruction, context)
    }
}
