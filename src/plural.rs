//! Plural form selection from the `Plural-Forms` catalog header.
//!
//! The header carries a count of forms and a small C expression over `n`:
//!
//! ```text
//! nplurals=3; plural=(n==1 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);
//! ```
//!
//! [`PluralExpression::compile`] parses the expression once into an [`Expr`]
//! tree; [`PluralRule`] pairs it with the form count and clamps results.

use tracing::warn;

use crate::ast::{BinaryOp, Expr};
use crate::error::{ExpressionError, ExpressionResult};

/// The two-form rule used when a catalog has no usable header.
pub const DEFAULT_PLURAL_FORMS: &str = "nplurals=2; plural=(n != 1);";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Number(u64),
    Variable,
    LeftParen,
    RightParen,
    Question,
    Colon,
    Not,
    Op(BinaryOp),
    End,
}

fn tokenize(source: &str) -> ExpressionResult<Vec<(Token, usize)>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let next = bytes.get(pos + 1).copied();
        let (token, width) = match bytes[pos] {
            b' ' | b'\t' | b'\n' | b'\r' => {
                pos += 1;
                continue;
            }
            b'0'..=b'9' => {
                let mut end = pos;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                let value = source[pos..end]
                    .parse::<u64>()
                    .map_err(|_| ExpressionError::Syntax {
                        offset: start,
                        message: "integer literal out of range".to_string(),
                    })?;
                (Token::Number(value), end - pos)
            }
            b'n' => (Token::Variable, 1),
            b'(' => (Token::LeftParen, 1),
            b')' => (Token::RightParen, 1),
            b'?' => (Token::Question, 1),
            b':' => (Token::Colon, 1),
            b'|' if next == Some(b'|') => (Token::Op(BinaryOp::Or), 2),
            b'&' if next == Some(b'&') => (Token::Op(BinaryOp::And), 2),
            b'=' if next == Some(b'=') => (Token::Op(BinaryOp::Equal), 2),
            b'!' if next == Some(b'=') => (Token::Op(BinaryOp::NotEqual), 2),
            b'!' => (Token::Not, 1),
            b'<' if next == Some(b'=') => (Token::Op(BinaryOp::LessEqual), 2),
            b'<' => (Token::Op(BinaryOp::Less), 1),
            b'>' if next == Some(b'=') => (Token::Op(BinaryOp::GreaterEqual), 2),
            b'>' => (Token::Op(BinaryOp::Greater), 1),
            b'+' => (Token::Op(BinaryOp::Add), 1),
            b'-' => (Token::Op(BinaryOp::Subtract), 1),
            b'*' => (Token::Op(BinaryOp::Multiply), 1),
            b'/' => (Token::Op(BinaryOp::Divide), 1),
            b'%' => (Token::Op(BinaryOp::Remainder), 1),
            _ => {
                let found = source[pos..].chars().next().unwrap_or('?');
                return Err(ExpressionError::Syntax {
                    offset: start,
                    message: format!("unexpected character '{}'", found),
                });
            }
        };
        tokens.push((token, start));
        pos += width;
    }

    tokens.push((Token::End, source.len()));
    Ok(tokens)
}

/// Deepest parenthesis or conditional nesting accepted.
const MAX_DEPTH: usize = 64;
/// Largest tree accepted; also bounds the recursion of evaluation and drop.
const MAX_NODES: usize = 1024;

/// Recursive descent over the token stream, one function per C precedence level.
struct ExpressionParser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
    nodes: usize,
}

impl ExpressionParser {
    fn new(tokens: Vec<(Token, usize)>) -> Self {
        ExpressionParser {
            tokens,
            pos: 0,
            depth: 0,
            nodes: 0,
        }
    }

    fn peek(&self) -> Token {
        self.tokens[self.pos].0
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos].1
    }

    fn advance(&mut self) -> (Token, usize) {
        let current = self.tokens[self.pos];
        if current.0 != Token::End {
            self.pos += 1;
        }
        current
    }

    fn syntax_error<T>(&self, message: &str) -> ExpressionResult<T> {
        Err(ExpressionError::Syntax {
            offset: self.offset(),
            message: message.to_string(),
        })
    }

    fn parse(mut self) -> ExpressionResult<Expr> {
        let expr = self.conditional()?;
        if self.peek() != Token::End {
            return self.syntax_error("unexpected trailing input");
        }
        Ok(expr)
    }

    /// Count one more tree node against [`MAX_NODES`].
    fn node(&mut self, expr: Expr) -> ExpressionResult<Expr> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return self.syntax_error("expression too large");
        }
        Ok(expr)
    }

    fn conditional(&mut self) -> ExpressionResult<Expr> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return self.syntax_error("expression nested too deeply");
        }
        let expr = self.conditional_branches();
        self.depth -= 1;
        expr
    }

    fn conditional_branches(&mut self) -> ExpressionResult<Expr> {
        let condition = self.binary_level(0)?;
        if self.peek() != Token::Question {
            return Ok(condition);
        }
        self.advance();
        let then = self.conditional()?;
        if self.peek() != Token::Colon {
            return self.syntax_error("expected ':'");
        }
        self.advance();
        let otherwise = self.conditional()?;
        self.node(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// Left-associative binary operators, loosest binding first.
    const LEVELS: [&'static [BinaryOp]; 6] = [
        &[BinaryOp::Or],
        &[BinaryOp::And],
        &[BinaryOp::Equal, BinaryOp::NotEqual],
        &[
            BinaryOp::Less,
            BinaryOp::LessEqual,
            BinaryOp::Greater,
            BinaryOp::GreaterEqual,
        ],
        &[BinaryOp::Add, BinaryOp::Subtract],
        &[BinaryOp::Multiply, BinaryOp::Divide, BinaryOp::Remainder],
    ];

    fn binary_level(&mut self, level: usize) -> ExpressionResult<Expr> {
        if level == Self::LEVELS.len() {
            return self.unary();
        }
        let mut left = self.binary_level(level + 1)?;
        loop {
            let op = match self.peek() {
                Token::Op(op) if Self::LEVELS[level].contains(&op) => op,
                _ => return Ok(left),
            };
            self.advance();
            let right_offset = self.offset();
            let right = self.binary_level(level + 1)?;
            if matches!(op, BinaryOp::Divide | BinaryOp::Remainder) && right == Expr::Literal(0) {
                return Err(ExpressionError::DivisionByZero {
                    offset: right_offset,
                });
            }
            left = self.node(Expr::Binary(op, Box::new(left), Box::new(right)))?;
        }
    }

    fn unary(&mut self) -> ExpressionResult<Expr> {
        let mut negations = 0;
        while self.peek() == Token::Not {
            self.advance();
            negations += 1;
            if negations > MAX_DEPTH {
                return self.syntax_error("expression nested too deeply");
            }
        }
        let mut expr = self.primary()?;
        for _ in 0..negations {
            expr = self.node(Expr::Not(Box::new(expr)))?;
        }
        Ok(expr)
    }

    fn primary(&mut self) -> ExpressionResult<Expr> {
        match self.peek() {
            Token::Number(value) => {
                self.advance();
                self.node(Expr::Literal(value))
            }
            Token::Variable => {
                self.advance();
                self.node(Expr::Variable)
            }
            Token::LeftParen => {
                self.advance();
                let inner = self.conditional()?;
                if self.peek() != Token::RightParen {
                    return self.syntax_error("expected ')'");
                }
                self.advance();
                Ok(inner)
            }
            Token::End => self.syntax_error("unexpected end of expression"),
            _ => self.syntax_error("expected a number, 'n' or '('"),
        }
    }
}

/// A compiled plural expression.
#[derive(Debug, Clone, PartialEq)]
pub struct PluralExpression {
    expr: Expr,
}

impl PluralExpression {
    /// Parse `source` (the part after `plural=`) into an evaluatable tree.
    pub fn compile(source: &str) -> ExpressionResult<Self> {
        let tokens = tokenize(source)?;
        let expr = ExpressionParser::new(tokens).parse()?;
        Ok(PluralExpression { expr })
    }

    pub fn evaluate(&self, n: u64) -> u64 {
        self.expr.evaluate(n)
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

/// A complete `Plural-Forms` rule: the form count plus its selector.
#[derive(Debug, Clone, PartialEq)]
pub struct PluralRule {
    count: usize,
    expression: PluralExpression,
}

impl PluralRule {
    /// Compile a full header value such as `nplurals=2; plural=(n != 1);`.
    pub fn compile(header: &str) -> ExpressionResult<Self> {
        let mut count = None;
        let mut expression = None;

        for part in header.split(';') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim() {
                "nplurals" => {
                    let value = value.trim();
                    let parsed = value
                        .parse::<usize>()
                        .ok()
                        .filter(|count| *count >= 1)
                        .ok_or_else(|| ExpressionError::InvalidPluralCount(value.to_string()))?;
                    count = Some(parsed);
                }
                "plural" => expression = Some(PluralExpression::compile(value.trim())?),
                _ => {}
            }
        }

        Ok(PluralRule {
            count: count.ok_or(ExpressionError::MissingPluralCount)?,
            expression: expression.ok_or(ExpressionError::MissingExpression)?,
        })
    }

    /// Compile `header`, falling back to [`DEFAULT_PLURAL_FORMS`] when it is malformed.
    pub fn compile_or_default(header: &str) -> Self {
        match PluralRule::compile(header) {
            Ok(rule) => rule,
            Err(e) => {
                warn!(header = %header, error = %e, "malformed plural forms header, using default rule");
                PluralRule::default()
            }
        }
    }

    /// Number of plural forms.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn expression(&self) -> &PluralExpression {
        &self.expression
    }

    /// Plural form index for `n`, clamped into `0..count`.
    pub fn evaluate(&self, n: u64) -> usize {
        let raw = self.expression.evaluate(n);
        let last = (self.count - 1) as u64;
        if raw > last {
            warn!(n, index = raw, plural_count = self.count, "plural index out of range, clamping");
            return last as usize;
        }
        raw as usize
    }
}

impl Default for PluralRule {
    fn default() -> Self {
        PluralRule {
            count: 2,
            expression: PluralExpression {
                expr: Expr::Binary(
                    BinaryOp::NotEqual,
                    Box::new(Expr::Variable),
                    Box::new(Expr::Literal(1)),
                ),
            },
        }
    }
}
