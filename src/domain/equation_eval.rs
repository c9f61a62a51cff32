//! Equation evaluation.
//!
//! # Evaluation Semantics
//!
//! - Comparisons coerce both sides to numbers and yield a boolean
//! - Booleans used as numbers are `1.0` / `0.0`
//! - Both operands of every binary node are evaluated (no short-circuit)
//! - `==` / `!=` compare exactly
//! - An unresolved variable or a zero divisor is an `EvalError`
//! - [`condition_holds`] treats every `EvalError` as `false`

use std::collections::HashMap;

use crate::domain::equation::{BinaryOp, Expr, Variable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
}

impl Value {
    pub fn as_number(self) -> f64 {
        match self {
            Value::Number(n) => n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
        }
    }

    /// `0` and `NaN` are false.
    pub fn is_truthy(self) -> bool {
        match self {
            Value::Number(n) => n != 0.0 && !n.is_nan(),
            Value::Bool(b) => b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("{0} is undefined at this bar")]
    Undefined(Variable),

    #[error("division by zero")]
    DivisionByZero,
}

/// Source of variable values for one evaluation.
pub trait Bindings {
    fn lookup(&self, variable: Variable) -> Option<f64>;
}

impl Bindings for HashMap<Variable, f64> {
    fn lookup(&self, variable: Variable) -> Option<f64> {
        self.get(&variable).copied()
    }
}

pub fn evaluate<B: Bindings + ?Sized>(expr: &Expr, bindings: &B) -> Result<Value, EvalError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Variable(v) => bindings
            .lookup(*v)
            .map(Value::Number)
            .ok_or(EvalError::Undefined(*v)),
        Expr::Not(inner) => Ok(Value::Bool(!evaluate(inner, bindings)?.is_truthy())),
        Expr::Binary { op, left, right } => {
            let l = evaluate(left, bindings)?;
            let r = evaluate(right, bindings)?;
            apply(*op, l, r)
        }
    }
}

fn apply(op: BinaryOp, l: Value, r: Value) -> Result<Value, EvalError> {
    let (a, b) = (l.as_number(), r.as_number());
    let value = match op {
        BinaryOp::Or => Value::Bool(l.is_truthy() || r.is_truthy()),
        BinaryOp::And => Value::Bool(l.is_truthy() && r.is_truthy()),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Ge => Value::Bool(a >= b),
        BinaryOp::Le => Value::Bool(a <= b),
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::Ne => Value::Bool(a != b),
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Sub => Value::Number(a - b),
        BinaryOp::Mul => Value::Number(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Value::Number(a / b)
        }
    };
    Ok(value)
}

/// Evaluate `expr` as a trading condition.
pub fn evaluate_condition<B: Bindings + ?Sized>(
    expr: &Expr,
    bindings: &B,
) -> Result<bool, EvalError> {
    evaluate(expr, bindings).map(Value::is_truthy)
}

/// Like [`evaluate_condition`], but an evaluation error means "no signal".
pub fn condition_holds<B: Bindings + ?Sized>(expr: &Expr, bindings: &B) -> bool {
    evaluate_condition(expr, bindings).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::equation_parser::parse;

    fn bindings(pairs: &[(Variable, f64)]) -> HashMap<Variable, f64> {
        pairs.iter().copied().collect()
    }

    fn eval(input: &str, vars: &HashMap<Variable, f64>) -> Result<Value, EvalError> {
        evaluate(&parse(input).unwrap(), vars)
    }

    #[test]
    fn comparison_yields_bool() {
        let vars = bindings(&[(Variable::Close, 105.0), (Variable::Sma(20), 100.0)]);
        assert_eq!(eval("CLOSE > SMA(20)", &vars), Ok(Value::Bool(true)));
        assert_eq!(eval("CLOSE <= SMA(20)", &vars), Ok(Value::Bool(false)));
    }

    #[test]
    fn arithmetic() {
        let vars = bindings(&[(Variable::High, 12.0), (Variable::Low, 8.0)]);
        assert_eq!(eval("(HIGH - LOW) / 2", &vars), Ok(Value::Number(2.0)));
        assert_eq!(eval("HIGH + LOW * 2", &vars), Ok(Value::Number(28.0)));
    }

    #[test]
    fn booleans_coerce_to_numbers() {
        let vars = bindings(&[(Variable::Close, 5.0)]);
        assert_eq!(
            eval("(CLOSE > 1) + (CLOSE > 2) + (CLOSE > 10)", &vars),
            Ok(Value::Number(2.0))
        );
    }

    #[test]
    fn logical_operators() {
        let vars = bindings(&[(Variable::Close, 5.0)]);
        assert_eq!(eval("CLOSE > 1 AND CLOSE < 3", &vars), Ok(Value::Bool(false)));
        assert_eq!(eval("CLOSE > 1 OR CLOSE < 3", &vars), Ok(Value::Bool(true)));
        assert_eq!(eval("NOT (CLOSE > 10)", &vars), Ok(Value::Bool(true)));
        // unary NOT binds tighter than comparison: (!5) > 10
        assert_eq!(eval("NOT CLOSE > 10", &vars), Ok(Value::Bool(false)));
        assert_eq!(eval("!0", &vars), Ok(Value::Bool(true)));
    }

    #[test]
    fn equality_is_exact() {
        let vars = bindings(&[(Variable::Close, 0.1 + 0.2)]);
        assert_eq!(eval("CLOSE == 0.3", &vars), Ok(Value::Bool(false)));
        assert_eq!(eval("CLOSE != 0.3", &vars), Ok(Value::Bool(true)));
    }

    #[test]
    fn undefined_variable_is_error() {
        let vars = bindings(&[(Variable::Close, 5.0)]);
        assert_eq!(
            eval("CLOSE > SMA(20)", &vars),
            Err(EvalError::Undefined(Variable::Sma(20)))
        );
    }

    #[test]
    fn no_short_circuit_on_or() {
        // the left side is true but the right side is still resolved
        let vars = bindings(&[(Variable::Close, 5.0)]);
        assert!(eval("CLOSE > 1 OR RSI(14) < 30", &vars).is_err());
    }

    #[test]
    fn division_by_zero() {
        let vars = bindings(&[(Variable::Close, 5.0), (Variable::Open, 0.0)]);
        assert_eq!(eval("CLOSE / OPEN > 1", &vars), Err(EvalError::DivisionByZero));
        assert!(!condition_holds(&parse("CLOSE / OPEN > 1").unwrap(), &vars));
    }

    #[test]
    fn condition_fails_closed() {
        let vars: HashMap<Variable, f64> = HashMap::new();
        let expr = parse("NOT (CLOSE > 10)").unwrap();
        assert!(!condition_holds(&expr, &vars));
    }

    #[test]
    fn numeric_truthiness() {
        assert!(Value::Number(-1.0).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        let vars = bindings(&[(Variable::Close, 3.0)]);
        assert!(condition_holds(&parse("CLOSE - 3 + 1").unwrap(), &vars));
        assert!(!condition_holds(&parse("CLOSE - 3").unwrap(), &vars));
    }
}
