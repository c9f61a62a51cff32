//! Domain error types.

use chrono::NaiveDate;
use std::fmt;

/// Lexical rejection: the equation contains something outside the closed
/// token alphabet.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TokenizeError {
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("malformed number '{text}' at position {position}")]
    MalformedNumber { text: String, position: usize },

    #[error("unknown identifier '{name}' at position {position}")]
    UnknownIdentifier { name: String, position: usize },
}

impl TokenizeError {
    pub fn position(&self) -> usize {
        match self {
            TokenizeError::UnexpectedCharacter { position, .. }
            | TokenizeError::MalformedNumber { position, .. }
            | TokenizeError::UnknownIdentifier { position, .. } => *position,
        }
    }
}

/// A parse error with position information for equation parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

/// Any reason an equation is rejected before simulation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GrammarError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl GrammarError {
    pub fn position(&self) -> usize {
        match self {
            GrammarError::Tokenize(e) => e.position(),
            GrammarError::Parse(e) => e.position,
        }
    }

    /// Format the error with a caret pointing at the error position in the input.
    ///
    /// Positions are byte offsets; the caret column counts characters.
    pub fn display_with_context(&self, input: &str) -> String {
        let column = input
            .get(..self.position())
            .unwrap_or(input)
            .chars()
            .count();
        let caret = " ".repeat(column) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationSide {
    Entry,
    Exit,
}

impl fmt::Display for EquationSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquationSide::Entry => write!(f, "entry"),
            EquationSide::Exit => write!(f, "exit"),
        }
    }
}

/// Top-level error type for quantsim.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid {side} equation: {source}")]
    Grammar {
        side: EquationSide,
        source: GrammarError,
    },

    #[error("invalid parameter {key}: {reason}")]
    InvalidParam { key: String, reason: String },

    #[error("candles must be in strictly ascending date order (bar {index}, {date})")]
    UnorderedCandles { index: usize, date: NaiveDate },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_) => 1,
            EngineError::ConfigParse { .. }
            | EngineError::ConfigMissing { .. }
            | EngineError::ConfigInvalid { .. }
            | EngineError::InvalidParam { .. } => 2,
            EngineError::Data { .. } | EngineError::UnorderedCandles { .. } => 3,
            EngineError::Grammar { .. } => 4,
            EngineError::Report { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
