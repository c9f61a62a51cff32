//! Named strategy definition.

use crate::domain::backtest::CompiledStrategy;
use crate::domain::error::EngineError;

/// Entry and exit equations as written by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub entry: String,
    pub exit: String,
}

impl Strategy {
    pub fn new(name: impl Into<String>, entry: impl Into<String>, exit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry: entry.into(),
            exit: exit.into(),
        }
    }

    pub fn compile(&self) -> Result<CompiledStrategy, EngineError> {
        CompiledStrategy::compile(&self.entry, &self.exit)
    }
}
