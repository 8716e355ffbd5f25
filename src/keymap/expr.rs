//! Context expressions: `drawerFocused && !pickerOpen`
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or      := and ( "||" and )*
//! and     := unary ( "&&" unary )*
//! unary   := "!" unary | primary
//! primary := identifier | "(" or ")"
//! ```
//!
//! Identifiers are `[a-zA-Z_][a-zA-Z0-9_]*`; whitespace is ignored.
//! Expressions are compiled once into a [`CompiledContext`] and evaluated
//! many times.

use std::fmt;

use super::context::ContextLookup;

/// Syntax errors from the tokenizer and parser
///
/// Positions are zero-based character offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextExprError {
    #[error("empty context expression")]
    Empty,
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("unexpected '{token}' at position {pos}")]
    UnexpectedToken { token: String, pos: usize },
    #[error("unexpected end of expression, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("unclosed '(' at position {pos}")]
    UnclosedParen { pos: usize },
    #[error("expression nested deeper than {MAX_EXPR_DEPTH} levels at position {pos}")]
    TooDeep { pos: usize },
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContextExpr {
    Ident(String),
    Not(Box<ContextExpr>),
    And(Box<ContextExpr>, Box<ContextExpr>),
    Or(Box<ContextExpr>, Box<ContextExpr>),
}

impl ContextExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        ContextExpr::Ident(name.into())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: ContextExpr) -> Self {
        ContextExpr::Not(Box::new(inner))
    }

    pub fn and(lhs: ContextExpr, rhs: ContextExpr) -> Self {
        ContextExpr::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: ContextExpr, rhs: ContextExpr) -> Self {
        ContextExpr::Or(Box::new(lhs), Box::new(rhs))
    }

    /// Evaluate against the active contexts, left to right
    pub fn evaluate<C: ContextLookup + ?Sized>(&self, contexts: &C) -> bool {
        match self {
            ContextExpr::Ident(name) => contexts.is_active(name),
            ContextExpr::Not(inner) => !inner.evaluate(contexts),
            ContextExpr::And(lhs, rhs) => lhs.evaluate(contexts) && rhs.evaluate(contexts),
            ContextExpr::Or(lhs, rhs) => lhs.evaluate(contexts) || rhs.evaluate(contexts),
        }
    }

    /// Identifier names referenced, de-duplicated, in first-seen order
    pub fn identifiers(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_identifiers(&mut names);
        names
    }

    fn collect_identifiers<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            ContextExpr::Ident(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            ContextExpr::Not(inner) => inner.collect_identifiers(names),
            ContextExpr::And(lhs, rhs) | ContextExpr::Or(lhs, rhs) => {
                lhs.collect_identifiers(names);
                rhs.collect_identifiers(names);
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            ContextExpr::Or(..) => 1,
            ContextExpr::And(..) => 2,
            ContextExpr::Not(_) | ContextExpr::Ident(_) => 3,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Minimal-parenthesis rendering; parsing the output yields the same tree
impl fmt::Display for ContextExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextExpr::Ident(name) => f.write_str(name),
            ContextExpr::Not(inner) => {
                f.write_str("!")?;
                inner.fmt_operand(f, 3)
            }
            ContextExpr::And(lhs, rhs) => {
                lhs.fmt_operand(f, 2)?;
                f.write_str(" && ")?;
                rhs.fmt_operand(f, 3)
            }
            ContextExpr::Or(lhs, rhs) => {
                lhs.fmt_operand(f, 1)?;
                f.write_str(" || ")?;
                rhs.fmt_operand(f, 2)
            }
        }
    }
}

/// An expression compiled once, kept alongside its source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledContext {
    source: String,
    ast: ContextExpr,
}

impl CompiledContext {
    pub fn compile(source: &str) -> Result<Self, ContextExprError> {
        let ast = parse_context_expr(source)?;
        Ok(Self {
            source: source.to_string(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &ContextExpr {
        &self.ast
    }

    pub fn evaluate<C: ContextLookup + ?Sized>(&self, contexts: &C) -> bool {
        self.ast.evaluate(contexts)
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.ast.identifiers()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Ident(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => f.write_str(name),
            TokenKind::And => f.write_str("&&"),
            TokenKind::Or => f.write_str("||"),
            TokenKind::Not => f.write_str("!"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn tokenize(source: &str) -> Result<Vec<Token>, ContextExprError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let pos = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '!' => TokenKind::Not,
            '&' | '|' => {
                // Only the doubled forms exist
                if chars.get(i + 1) != Some(&c) {
                    return Err(ContextExprError::UnexpectedChar { ch: c, pos });
                }
                i += 1;
                if c == '&' {
                    TokenKind::And
                } else {
                    TokenKind::Or
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while chars
                    .get(i + 1)
                    .is_some_and(|n| n.is_ascii_alphanumeric() || *n == '_')
                {
                    i += 1;
                }
                TokenKind::Ident(chars[start..=i].iter().collect())
            }
            other => return Err(ContextExprError::UnexpectedChar { ch: other, pos }),
        };

        tokens.push(Token { kind, pos });
        i += 1;
    }

    Ok(tokens)
}

/// Deepest nesting of `(` and `!`, and tallest tree, a parse accepts
///
/// Evaluation, rendering and drop all recurse over the tree, so the bound
/// keeps them within a small fixed stack budget.
pub const MAX_EXPR_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    nesting: usize,
}

/// A parsed subtree and its height
type Parsed = (ContextExpr, usize);

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// Consume a token of `kind`, returning its position
    fn eat(&mut self, kind: &TokenKind) -> Option<usize> {
        let pos = self.peek().filter(|t| &t.kind == kind).map(|t| t.pos)?;
        self.index += 1;
        Some(pos)
    }

    fn enter(&mut self, pos: usize) -> Result<(), ContextExprError> {
        self.nesting += 1;
        if self.nesting > MAX_EXPR_DEPTH {
            return Err(ContextExprError::TooDeep { pos });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    fn grow(height: usize, pos: usize) -> Result<usize, ContextExprError> {
        let height = height + 1;
        if height > MAX_EXPR_DEPTH {
            return Err(ContextExprError::TooDeep { pos });
        }
        Ok(height)
    }

    fn parse_or(&mut self) -> Result<Parsed, ContextExprError> {
        let (mut expr, mut height) = self.parse_and()?;
        while let Some(pos) = self.eat(&TokenKind::Or) {
            let (rhs, rhs_height) = self.parse_and()?;
            height = Self::grow(height.max(rhs_height), pos)?;
            expr = ContextExpr::or(expr, rhs);
        }
        Ok((expr, height))
    }

    fn parse_and(&mut self) -> Result<Parsed, ContextExprError> {
        let (mut expr, mut height) = self.parse_unary()?;
        while let Some(pos) = self.eat(&TokenKind::And) {
            let (rhs, rhs_height) = self.parse_unary()?;
            height = Self::grow(height.max(rhs_height), pos)?;
            expr = ContextExpr::and(expr, rhs);
        }
        Ok((expr, height))
    }

    fn parse_unary(&mut self) -> Result<Parsed, ContextExprError> {
        if let Some(pos) = self.eat(&TokenKind::Not) {
            self.enter(pos)?;
            let (inner, height) = self.parse_unary()?;
            self.leave();
            return Ok((ContextExpr::not(inner), Self::grow(height, pos)?));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Parsed, ContextExprError> {
        let Some(token) = self.next() else {
            return Err(ContextExprError::UnexpectedEnd {
                expected: "an identifier, '!' or '('",
            });
        };

        match token.kind {
            TokenKind::Ident(name) => Ok((ContextExpr::Ident(name), 1)),
            TokenKind::LParen => {
                self.enter(token.pos)?;
                let inner = self.parse_or()?;
                if self.eat(&TokenKind::RParen).is_some() {
                    self.leave();
                    return Ok(inner);
                }
                match self.peek() {
                    None => Err(ContextExprError::UnclosedParen { pos: token.pos }),
                    Some(t) => Err(ContextExprError::UnexpectedToken {
                        token: t.kind.to_string(),
                        pos: t.pos,
                    }),
                }
            }
            other => Err(ContextExprError::UnexpectedToken {
                token: other.to_string(),
                pos: token.pos,
            }),
        }
    }
}

/// Parse a context expression into its tree
pub fn parse_context_expr(source: &str) -> Result<ContextExpr, ContextExprError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ContextExprError::Empty);
    }

    let mut parser = Parser {
        tokens,
        index: 0,
        nesting: 0,
    };
    let (expr, _) = parser.parse_or()?;

    if let Some(extra) = parser.peek() {
        return Err(ContextExprError::UnexpectedToken {
            token: extra.kind.to_string(),
            pos: extra.pos,
        });
    }

    Ok(expr)
}

/// Parse and evaluate in one step
pub fn evaluate_context_expr<C: ContextLookup + ?Sized>(
    source: &str,
    contexts: &C,
) -> Result<bool, ContextExprError> {
    Ok(parse_context_expr(source)?.evaluate(contexts))
}

/// De-duplicated identifiers referenced by an expression
pub fn context_identifiers(source: &str) -> Result<Vec<String>, ContextExprError> {
    let expr = parse_context_expr(source)?;
    Ok(expr.identifiers().into_iter().map(str::to_string).collect())
}
