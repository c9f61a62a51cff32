//! Equation AST.
//!
//! - `Variable`: the closed vocabulary an equation may reference
//! - `BinaryOp`: arithmetic, comparison and logical operators
//! - `Expr`: the expression tree built once per equation
//! - `Equation`: source text plus its parsed tree

use std::fmt;

use crate::domain::error::GrammarError;
use crate::domain::indicator::{IndicatorKey, IndicatorSettings};

/// Period used by a bare `ADX` reference.
pub const DEFAULT_ADX_PERIOD: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    Open,
    High,
    Low,
    Close,
    Volume,
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    MacdLine,
    MacdSignal,
    MacdHistogram,
    BbUpper,
    BbMiddle,
    BbLower,
    StochK,
    StochD,
}

impl Variable {
    pub fn is_price_field(&self) -> bool {
        matches!(
            self,
            Variable::Open | Variable::High | Variable::Low | Variable::Close | Variable::Volume
        )
    }

    /// The indicator that must be precomputed to resolve this variable.
    pub fn indicator_key(&self, settings: &IndicatorSettings) -> Option<IndicatorKey> {
        match *self {
            Variable::Open
            | Variable::High
            | Variable::Low
            | Variable::Close
            | Variable::Volume => None,
            Variable::Sma(n) => Some(IndicatorKey::Sma(n)),
            Variable::Ema(n) => Some(IndicatorKey::Ema(n)),
            Variable::Rsi(n) => Some(IndicatorKey::Rsi(n)),
            Variable::Atr(n) => Some(IndicatorKey::Atr(n)),
            Variable::Adx(n) => Some(IndicatorKey::Adx(n)),
            Variable::MacdLine | Variable::MacdSignal | Variable::MacdHistogram => {
                Some(settings.macd_key())
            }
            Variable::BbUpper | Variable::BbMiddle | Variable::BbLower => {
                Some(settings.bollinger_key())
            }
            Variable::StochK | Variable::StochD => Some(settings.stochastic_key()),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Open => write!(f, "OPEN"),
            Variable::High => write!(f, "HIGH"),
            Variable::Low => write!(f, "LOW"),
            Variable::Close => write!(f, "CLOSE"),
            Variable::Volume => write!(f, "VOLUME"),
            Variable::Sma(n) => write!(f, "SMA({})", n),
            Variable::Ema(n) => write!(f, "EMA({})", n),
            Variable::Rsi(n) => write!(f, "RSI({})", n),
            Variable::Atr(n) => write!(f, "ATR({})", n),
            Variable::Adx(n) => write!(f, "ADX({})", n),
            Variable::MacdLine => write!(f, "MACD_LINE"),
            Variable::MacdSignal => write!(f, "MACD_SIGNAL"),
            Variable::MacdHistogram => write!(f, "MACD_HISTOGRAM"),
            Variable::BbUpper => write!(f, "BB_UPPER"),
            Variable::BbMiddle => write!(f, "BB_MIDDLE"),
            Variable::BbLower => write!(f, "BB_LOWER"),
            Variable::StochK => write!(f, "STOCH_K"),
            Variable::StochD => write!(f, "STOCH_D"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Gt | BinaryOp::Lt | BinaryOp::Ge | BinaryOp::Le | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Gt => ">",
            BinaryOp::Lt => "<",
            BinaryOp::Ge => ">=",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(Variable),
    Not(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Visit every variable reference, left to right.
    pub fn for_each_variable<F: FnMut(Variable)>(&self, f: &mut F) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(v) => f(*v),
            Expr::Not(inner) => inner.for_each_variable(f),
            Expr::Binary { left, right, .. } => {
                left.for_each_variable(f);
                right.for_each_variable(f);
            }
        }
    }

    pub fn contains_comparison(&self) -> bool {
        match self {
            Expr::Number(_) | Expr::Variable(_) => false,
            Expr::Not(inner) => inner.contains_comparison(),
            Expr::Binary { op, left, right } => {
                op.is_comparison() || left.contains_comparison() || right.contains_comparison()
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Variable(v) => write!(f, "{}", v),
            Expr::Not(inner) => write!(f, "!{}", inner),
            Expr::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
        }
    }
}

/// A parsed strategy equation.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    source: String,
    expr: Expr,
}

impl Equation {
    pub fn parse(source: &str) -> Result<Self, GrammarError> {
        let expr = crate::domain::equation_parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Distinct variables in order of first appearance.
    pub fn variables(&self) -> Vec<Variable> {
        let mut out = Vec::new();
        self.expr.for_each_variable(&mut |v| {
            if !out.contains(&v) {
                out.push(v);
            }
        });
        out
    }

    /// Distinct indicators this equation needs, in order of first appearance.
    pub fn indicator_keys(&self, settings: &IndicatorSettings) -> Vec<IndicatorKey> {
        let mut out = Vec::new();
        for key in self.variables().iter().filter_map(|v| v.indicator_key(settings)) {
            if !out.contains(&key) {
                out.push(key);
            }
        }
        out
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}
