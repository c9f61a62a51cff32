//! Equation parser.
//!
//! Recursive descent over the token stream produced by the tokenizer.
//! Precedence, loosest first: `||`, `&&`, comparisons, `+ -`, `* /`,
//! unary `!`, primary. All binary levels are left-associative.

use crate::domain::equation::{BinaryOp, DEFAULT_ADX_PERIOD, Expr, Variable};
use crate::domain::error::{GrammarError, ParseError};
use crate::domain::tokenizer::{normalize, tokenize, Keyword, Token, TokenKind};

/// Largest period accepted for `SMA(n)` and friends.
pub const MAX_PERIOD: usize = 100_000;

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    input_len: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], input_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            input_len,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Offset of the next token, or the end of input.
    fn position(&self) -> usize {
        self.peek().map(|t| t.position).unwrap_or(self.input_len)
    }

    fn found(&self) -> String {
        self.peek()
            .map(|t| format!("'{}'", t.kind.describe()))
            .unwrap_or_else(|| "end of input".to_string())
    }

    fn error(&self, message: String) -> ParseError {
        ParseError {
            message,
            position: self.position(),
        }
    }

    fn consume_op(&mut self, ops: &[BinaryOp]) -> Option<BinaryOp> {
        match self.peek().map(|t| t.kind) {
            Some(TokenKind::Op(op)) if ops.contains(&op) => {
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ParseError> {
        match self.peek() {
            Some(t) if t.kind == kind => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.error(format!("expected {}, found {}", what, self.found()))),
        }
    }

    fn parse_binary_level(
        &mut self,
        ops: &[BinaryOp],
        next: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut left = next(self)?;
        while let Some(op) = self.consume_op(ops) {
            let right = next(self)?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[BinaryOp::Or], Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[BinaryOp::And], Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[
                BinaryOp::Gt,
                BinaryOp::Lt,
                BinaryOp::Ge,
                BinaryOp::Le,
                BinaryOp::Eq,
                BinaryOp::Ne,
            ],
            Self::parse_add_sub,
        )
    }

    fn parse_add_sub(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[BinaryOp::Add, BinaryOp::Sub], Self::parse_mul_div)
    }

    fn parse_mul_div(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[BinaryOp::Mul, BinaryOp::Div], Self::parse_unary)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek().map(|t| t.kind), Some(TokenKind::Not)) {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.error("expected operand, found end of input".to_string()));
        };
        match token.kind {
            TokenKind::Number(n) => {
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            TokenKind::Keyword(keyword) => {
                self.pos += 1;
                self.parse_variable(keyword).map(Expr::Variable)
            }
            TokenKind::LParen => {
                self.pos += 1;
                if matches!(self.peek().map(|t| t.kind), Some(TokenKind::RParen)) {
                    return Err(self.error("empty parentheses".to_string()));
                }
                let inner = self.parse_or()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(self.error(format!("expected operand, found {}", self.found()))),
        }
    }

    fn parse_variable(&mut self, keyword: Keyword) -> Result<Variable, ParseError> {
        let variable = match keyword {
            Keyword::Open => Variable::Open,
            Keyword::High => Variable::High,
            Keyword::Low => Variable::Low,
            Keyword::Close => Variable::Close,
            Keyword::Volume => Variable::Volume,
            Keyword::Sma => Variable::Sma(self.parse_period(keyword)?),
            Keyword::Ema => Variable::Ema(self.parse_period(keyword)?),
            Keyword::Rsi => Variable::Rsi(self.parse_period(keyword)?),
            Keyword::Atr => Variable::Atr(self.parse_period(keyword)?),
            Keyword::Adx => {
                if matches!(self.peek().map(|t| t.kind), Some(TokenKind::LParen)) {
                    Variable::Adx(self.parse_period(keyword)?)
                } else {
                    Variable::Adx(DEFAULT_ADX_PERIOD)
                }
            }
            Keyword::MacdLine => Variable::MacdLine,
            Keyword::MacdSignal => Variable::MacdSignal,
            Keyword::MacdHistogram => Variable::MacdHistogram,
            Keyword::BbUpper => Variable::BbUpper,
            Keyword::BbMiddle => Variable::BbMiddle,
            Keyword::BbLower => Variable::BbLower,
            Keyword::StochK => Variable::StochK,
            Keyword::StochD => Variable::StochD,
            Keyword::Stochastic => {
                self.skip_stochastic_periods()?;
                Variable::StochK
            }
        };
        Ok(variable)
    }

    /// `( <positive integer> )` following an indicator keyword.
    fn parse_period(&mut self, keyword: Keyword) -> Result<usize, ParseError> {
        if !matches!(self.peek().map(|t| t.kind), Some(TokenKind::LParen)) {
            return Err(self.error(format!(
                "{} requires a period, e.g. {}(14)",
                keyword.name(),
                keyword.name()
            )));
        }
        self.pos += 1;
        let period = self.period_value(keyword)?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(period)
    }

    /// `STOCHASTIC` may carry up to two comma-separated periods. They are
    /// checked like any other period, but `[indicators]` still decides the
    /// %K and %D windows.
    fn skip_stochastic_periods(&mut self) -> Result<(), ParseError> {
        if !matches!(self.peek().map(|t| t.kind), Some(TokenKind::LParen)) {
            return Ok(());
        }
        self.pos += 1;
        self.period_value(Keyword::Stochastic)?;
        if matches!(self.peek().map(|t| t.kind), Some(TokenKind::Comma)) {
            self.pos += 1;
            self.period_value(Keyword::Stochastic)?;
        }
        self.expect(TokenKind::RParen, "')'")
    }

    fn period_value(&mut self, keyword: Keyword) -> Result<usize, ParseError> {
        let position = self.position();
        let period = match self.advance().map(|t| t.kind) {
            Some(TokenKind::Number(n))
                if n.fract() == 0.0 && n >= 1.0 && n <= MAX_PERIOD as f64 =>
            {
                n as usize
            }
            Some(other) => {
                return Err(ParseError {
                    message: format!(
                        "{} period must be an integer between 1 and {}, found '{}'",
                        keyword.name(),
                        MAX_PERIOD,
                        other.describe()
                    ),
                    position,
                });
            }
            None => {
                return Err(ParseError {
                    message: format!("expected {} period, found end of input", keyword.name()),
                    position,
                });
            }
        };
        Ok(period)
    }

    fn parse(&mut self) -> Result<Expr, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError {
                message: "equation cannot be empty".to_string(),
                position: 0,
            });
        }
        let expr = self.parse_or()?;
        if self.pos < self.tokens.len() {
            return Err(self.error(format!("unexpected {} after expression", self.found())));
        }
        Ok(expr)
    }
}

fn check_balanced(tokens: &[Token]) -> Result<(), ParseError> {
    let mut open: Vec<usize> = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::LParen => open.push(token.position),
            TokenKind::RParen => {
                if open.pop().is_none() {
                    return Err(ParseError {
                        message: "unbalanced parentheses: unexpected ')'".to_string(),
                        position: token.position,
                    });
                }
            }
            _ => {}
        }
    }
    match open.last() {
        Some(&position) => Err(ParseError {
            message: "unbalanced parentheses: missing ')'".to_string(),
            position,
        }),
        None => Ok(()),
    }
}

/// Normalize, tokenize and parse an equation.
pub fn parse(input: &str) -> Result<Expr, GrammarError> {
    let normalized = normalize(input);
    let tokens = tokenize(&normalized)?;
    check_balanced(&tokens)?;
    let mut parser = Parser::new(&tokens, normalized.len());
    Ok(parser.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::TokenizeError;

    fn parse_err(input: &str) -> ParseError {
        match parse(input) {
            Err(GrammarError::Parse(e)) => e,
            other => panic!("expected parse error for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn parse_simple_comparison() {
        let expr = parse("CLOSE > SMA(20)").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Gt,
                Expr::Variable(Variable::Close),
                Expr::Variable(Variable::Sma(20))
            )
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse("CLOSE > 1 OR CLOSE > 2 AND CLOSE > 3").unwrap();
        assert_eq!(expr.to_string(), "((CLOSE > 1) || ((CLOSE > 2) && (CLOSE > 3)))");
    }

    #[test]
    fn arithmetic_precedence() {
        let expr = parse("CLOSE - OPEN * 2 > HIGH / 4 + 1").unwrap();
        assert_eq!(
            expr.to_string(),
            "((CLOSE - (OPEN * 2)) > ((HIGH / 4) + 1))"
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        let expr = parse("10 - 4 - 3").unwrap();
        assert_eq!(expr.to_string(), "((10 - 4) - 3)");
    }

    #[test]
    fn parenthesized_minus_is_subtraction() {
        let expr = parse("(CLOSE)-5 > 0").unwrap();
        assert_eq!(expr.to_string(), "((CLOSE - 5) > 0)");
    }

    #[test]
    fn not_applies_to_primary() {
        let expr = parse("NOT (RSI(14) > 70) and close > open").unwrap();
        assert_eq!(
            expr.to_string(),
            "(!(RSI(14) > 70) && (CLOSE > OPEN))"
        );
        assert!(parse("!!(CLOSE > 1)").is_ok());
    }

    #[test]
    fn bare_adx_defaults_period() {
        assert_eq!(parse("ADX").unwrap(), Expr::Variable(Variable::Adx(14)));
        assert_eq!(parse("ADX(7) > 25").unwrap().to_string(), "(ADX(7) > 25)");
    }

    #[test]
    fn stochastic_is_percent_k() {
        let k = Expr::Variable(Variable::StochK);
        assert_eq!(parse("STOCHASTIC").unwrap(), k);
        assert_eq!(parse("stochastic(14)").unwrap(), k);
        assert_eq!(parse("STOCHASTIC(14, 3)").unwrap(), k);
        assert_eq!(parse("STOCHASTIC(14,3) > 80").unwrap().to_string(), "(STOCH_K > 80)");

        let err = parse_err("STOCHASTIC(14, 0)");
        assert_eq!(err.position, 15);
        assert!(parse("STOCHASTIC(14, 3, 3)").is_err());
        assert!(parse("SMA(14, 3)").is_err());
        assert!(parse("CLOSE, 1").is_err());
    }

    #[test]
    fn all_vocabulary_parses() {
        let input = "OPEN + HIGH + LOW + CLOSE + VOLUME + SMA(1) + EMA(2) + RSI(3) \
                     + ATR(4) + ADX + MACD_LINE + MACD_SIGNAL + MACD_HISTOGRAM \
                     + BB_UPPER + BB_MIDDLE + BB_LOWER + STOCH_K + STOCH_D > 0";
        assert!(parse(input).is_ok());
    }

    #[test]
    fn doubled_operator_rejected() {
        let err = parse_err("CLOSE >> 5");
        assert_eq!(err.position, 7);
        assert!(err.message.contains("expected operand"), "{}", err.message);
    }

    #[test]
    fn unbalanced_parentheses() {
        let err = parse_err("(CLOSE > 5");
        assert_eq!(err.message, "unbalanced parentheses: missing ')'");
        assert_eq!(err.position, 0);

        let err = parse_err("CLOSE > 5)");
        assert_eq!(err.message, "unbalanced parentheses: unexpected ')'");
        assert_eq!(err.position, 9);
    }

    #[test]
    fn empty_equation_rejected() {
        assert_eq!(parse_err("").message, "equation cannot be empty");
        assert_eq!(parse_err("   ").message, "equation cannot be empty");
        assert_eq!(parse_err("()").message, "empty parentheses");
    }

    #[test]
    fn missing_operand_rejected() {
        let err = parse_err("CLOSE >");
        assert_eq!(err.message, "expected operand, found end of input");
        assert_eq!(err.position, 7);
        assert!(parse("AND CLOSE > 1").is_err());
    }

    #[test]
    fn trailing_tokens_rejected() {
        let err = parse_err("CLOSE > 5 5");
        assert!(err.message.starts_with("unexpected '5'"));
        assert_eq!(err.position, 10);
    }

    #[test]
    fn period_required_and_validated() {
        assert!(parse_err("SMA > 5").message.contains("requires a period"));
        assert!(parse_err("SMA(0) > 5").message.contains("period must be"));
        assert!(parse_err("SMA(2.5) > 5").message.contains("period must be"));
        assert!(parse_err("SMA(-3) > 5").message.contains("period must be"));
        assert!(parse_err("SMA(CLOSE) > 5").message.contains("period must be"));
        assert!(parse_err("SMA(1000000) > 5").message.contains("period must be"));
        assert!(parse_err("SMA(5 > 1").message.contains("unbalanced"));
    }

    #[test]
    fn tokenize_errors_surface() {
        assert!(matches!(
            parse("CLOSE > PRICE"),
            Err(GrammarError::Tokenize(TokenizeError::UnknownIdentifier { .. }))
        ));
        assert!(matches!(
            parse("process.exit()"),
            Err(GrammarError::Tokenize(_))
        ));
    }

    #[test]
    fn positions_point_into_original_text() {
        // "and" folds to "&& " so the offset of the bad token is preserved
        let err = parse("close > 1 and high $ 2").unwrap_err();
        assert_eq!(err.position(), 19);
    }
}
