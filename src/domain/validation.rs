//! Standalone equation validation.
//!
//! Produces a report for editors and the `validate` command: grammar errors,
//! advisory warnings, and the indicators and price fields an equation uses.

use serde::Serialize;

use crate::domain::equation::{Equation, Variable};
use crate::domain::error::{GrammarError, TokenizeError};
use crate::domain::tokenizer::Keyword;

const RSI_WITHOUT_COMPARISON: &str =
    "RSI is typically used with comparison operators (< 30 for oversold, > 70 for overbought)";
const NOTHING_REFERENCED: &str = "No indicators or price variables detected in the equation";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub indicators: Vec<String>,
    pub variables: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ValidationReport {
    fn invalid(error: String) -> Self {
        Self {
            is_valid: false,
            errors: vec![error],
            warnings: Vec::new(),
            indicators: Vec::new(),
            variables: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

pub fn validate_equation(text: &str) -> ValidationReport {
    if text.trim().is_empty() {
        return ValidationReport::invalid("equation cannot be empty".to_string());
    }

    let equation = match Equation::parse(text) {
        Ok(eq) => eq,
        Err(err) => {
            let mut report = ValidationReport::invalid(err.to_string());
            if let GrammarError::Tokenize(TokenizeError::UnknownIdentifier { name, .. }) = &err {
                report.suggestions = suggest(name);
            }
            return report;
        }
    };

    let used = equation.variables();
    let (prices, indicators): (Vec<Variable>, Vec<Variable>) =
        used.iter().copied().partition(|v| v.is_price_field());

    let mut warnings = Vec::new();
    let uses_rsi = indicators.iter().any(|v| matches!(v, Variable::Rsi(_)));
    if uses_rsi && !equation.expr().contains_comparison() {
        warnings.push(RSI_WITHOUT_COMPARISON.to_string());
    }
    if used.is_empty() {
        warnings.push(NOTHING_REFERENCED.to_string());
    }

    ValidationReport {
        is_valid: true,
        errors: Vec::new(),
        warnings,
        indicators: indicators.iter().map(Variable::to_string).collect(),
        variables: prices.iter().map(Variable::to_string).collect(),
        suggestions: Vec::new(),
    }
}

/// Vocabulary names sharing a three-letter fragment with `word`.
fn suggest(word: &str) -> Vec<String> {
    let fragment: String = word.chars().take(3).collect();
    if fragment.len() < 3 {
        return Vec::new();
    }
    Keyword::ALL
        .iter()
        .map(Keyword::name)
        .filter(|name| {
            let head: String = name.chars().take(3).collect();
            name.contains(fragment.as_str()) || word.contains(head.as_str())
        })
        .take(3)
        .map(|name| format!("unknown \"{}\", did you mean {}?", word, name))
        .collect()
}
