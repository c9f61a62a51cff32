//! Equation tokenizer.
//!
//! Works over a closed alphabet: numbers, the operators
//! `>= <= == != && || > < + - * / !`, parentheses, the comma and the fixed
//! vocabulary keywords. Anything else rejects the whole equation.
//!
//! Input is expected to have passed through [`normalize`] first.

use crate::domain::equation::BinaryOp;
use crate::domain::error::TokenizeError;

/// Names an equation may use. There is no general identifier token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Open,
    High,
    Low,
    Close,
    Volume,
    Sma,
    Ema,
    Rsi,
    Atr,
    Adx,
    MacdLine,
    MacdSignal,
    MacdHistogram,
    BbUpper,
    BbMiddle,
    BbLower,
    StochK,
    StochD,
    /// Legacy spelling of `STOCH_K`, followed by optional ignored periods.
    Stochastic,
}

impl Keyword {
    pub const ALL: [Keyword; 19] = [
        Keyword::Open,
        Keyword::High,
        Keyword::Low,
        Keyword::Close,
        Keyword::Volume,
        Keyword::Sma,
        Keyword::Ema,
        Keyword::Rsi,
        Keyword::Atr,
        Keyword::Adx,
        Keyword::MacdLine,
        Keyword::MacdSignal,
        Keyword::MacdHistogram,
        Keyword::BbUpper,
        Keyword::BbMiddle,
        Keyword::BbLower,
        Keyword::StochK,
        Keyword::StochD,
        Keyword::Stochastic,
    ];

    pub fn from_word(word: &str) -> Option<Self> {
        let kw = match word {
            "OPEN" => Keyword::Open,
            "HIGH" => Keyword::High,
            "LOW" => Keyword::Low,
            "CLOSE" => Keyword::Close,
            "VOLUME" => Keyword::Volume,
            "SMA" => Keyword::Sma,
            "EMA" => Keyword::Ema,
            "RSI" => Keyword::Rsi,
            "ATR" => Keyword::Atr,
            "ADX" => Keyword::Adx,
            "MACD_LINE" => Keyword::MacdLine,
            "MACD_SIGNAL" => Keyword::MacdSignal,
            "MACD_HISTOGRAM" => Keyword::MacdHistogram,
            "BB_UPPER" => Keyword::BbUpper,
            "BB_MIDDLE" => Keyword::BbMiddle,
            "BB_LOWER" => Keyword::BbLower,
            "STOCH_K" => Keyword::StochK,
            "STOCH_D" => Keyword::StochD,
            "STOCHASTIC" => Keyword::Stochastic,
            _ => return None,
        };
        Some(kw)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Keyword::Open => "OPEN",
            Keyword::High => "HIGH",
            Keyword::Low => "LOW",
            Keyword::Close => "CLOSE",
            Keyword::Volume => "VOLUME",
            Keyword::Sma => "SMA",
            Keyword::Ema => "EMA",
            Keyword::Rsi => "RSI",
            Keyword::Atr => "ATR",
            Keyword::Adx => "ADX",
            Keyword::MacdLine => "MACD_LINE",
            Keyword::MacdSignal => "MACD_SIGNAL",
            Keyword::MacdHistogram => "MACD_HISTOGRAM",
            Keyword::BbUpper => "BB_UPPER",
            Keyword::BbMiddle => "BB_MIDDLE",
            Keyword::BbLower => "BB_LOWER",
            Keyword::StochK => "STOCH_K",
            Keyword::StochD => "STOCH_D",
            Keyword::Stochastic => "STOCHASTIC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Keyword(Keyword),
    Op(BinaryOp),
    Not,
    LParen,
    RParen,
    Comma,
}

impl TokenKind {
    /// True when a following `-` must be read as subtraction.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Number(_) | TokenKind::Keyword(_) | TokenKind::RParen
        )
    }

    pub fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => n.to_string(),
            TokenKind::Keyword(k) => k.name().to_string(),
            TokenKind::Op(op) => op.symbol().to_string(),
            TokenKind::Not => "!".to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
            TokenKind::Comma => ",".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Upper-case the equation and fold the word operators `AND`, `OR`, `NOT`
/// into `&&`, `||`, `!`.
///
/// Replacements are padded to the keyword's width so byte offsets in the
/// output still point at the same characters of the input.
pub fn normalize(input: &str) -> String {
    let upper = input.to_ascii_uppercase();
    let mut out = String::with_capacity(upper.len());
    let mut word = String::new();

    let flush = |word: &mut String, out: &mut String| {
        match word.as_str() {
            "AND" => out.push_str("&& "),
            "OR" => out.push_str("||"),
            "NOT" => out.push_str("!  "),
            _ => out.push_str(word),
        }
        word.clear();
    };

    for ch in upper.chars() {
        if is_word_char(ch) {
            word.push(ch);
        } else {
            flush(&mut word, &mut out);
            out.push(ch);
        }
    }
    flush(&mut word, &mut out);
    out
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, TokenizeError> {
    let bytes = input.as_bytes();
    let mut tokens: Vec<Token> = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let Some(ch) = input[pos..].chars().next() else {
            break;
        };

        if ch.is_whitespace() {
            pos += ch.len_utf8();
            continue;
        }

        let next_is_numeric = bytes
            .get(pos + 1)
            .is_some_and(|b| b.is_ascii_digit() || *b == b'.');
        let signed = ch == '-'
            && next_is_numeric
            && !tokens.last().is_some_and(|t| t.kind.ends_operand());

        if ch.is_ascii_digit() || ch == '.' || signed {
            let start = pos;
            pos += 1;
            while pos < input.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
                pos += 1;
            }
            let text = &input[start..pos];
            let dots = text.bytes().filter(|b| *b == b'.').count();
            let value = match text.parse::<f64>() {
                Ok(v) if dots <= 1 => v,
                _ => {
                    return Err(TokenizeError::MalformedNumber {
                        text: text.to_string(),
                        position: start,
                    });
                }
            };
            tokens.push(Token {
                kind: TokenKind::Number(value),
                position: start,
            });
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let start = pos;
            while pos < input.len() && is_word_char(bytes[pos] as char) {
                pos += 1;
            }
            let word = &input[start..pos];
            let keyword =
                Keyword::from_word(word).ok_or_else(|| TokenizeError::UnknownIdentifier {
                    name: word.to_string(),
                    position: start,
                })?;
            tokens.push(Token {
                kind: TokenKind::Keyword(keyword),
                position: start,
            });
            continue;
        }

        let two_char = match input.get(pos..pos + 2) {
            Some(">=") => Some(BinaryOp::Ge),
            Some("<=") => Some(BinaryOp::Le),
            Some("==") => Some(BinaryOp::Eq),
            Some("!=") => Some(BinaryOp::Ne),
            Some("&&") => Some(BinaryOp::And),
            Some("||") => Some(BinaryOp::Or),
            _ => None,
        };
        if let Some(op) = two_char {
            tokens.push(Token {
                kind: TokenKind::Op(op),
                position: pos,
            });
            pos += 2;
            continue;
        }

        let kind = match ch {
            '>' => TokenKind::Op(BinaryOp::Gt),
            '<' => TokenKind::Op(BinaryOp::Lt),
            '+' => TokenKind::Op(BinaryOp::Add),
            '-' => TokenKind::Op(BinaryOp::Sub),
            '*' => TokenKind::Op(BinaryOp::Mul),
            '/' => TokenKind::Op(BinaryOp::Div),
            '!' => TokenKind::Not,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            _ => {
                return Err(TokenizeError::UnexpectedCharacter { ch, position: pos });
            }
        };
        tokens.push(Token {
            kind,
            position: pos,
        });
        pos += 1;
    }

    Ok(tokens)
}
