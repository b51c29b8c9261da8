//! Arithmetic tokenizer, parser and tree evaluator.
//!
//! Grammar (after all references have been substituted):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('+' | '-') unary | atom
//! atom   := number | '(' expr ')'
//! ```
//!
//! Binary operator runs are stored flat and folded left to right, so only
//! parentheses and unary signs add tree depth, and that depth is bounded.

use crate::error::{EvalError, Result};

const MAX_NESTING: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinOp::Add => lhs + rhs,
            BinOp::Sub => lhs - rhs,
            BinOp::Mul => lhs * rhs,
            BinOp::Div => lhs / rhs,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Neg(Box<Expr>),
    /// `first op1 e1 op2 e2 ...`, all operators of the same precedence level.
    Chain {
        first: Box<Expr>,
        rest: Vec<(BinOp, Expr)>,
    },
}

impl Expr {
    pub fn eval(&self) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::Neg(inner) => -inner.eval(),
            Expr::Chain { first, rest } => rest
                .iter()
                .fold(first.eval(), |acc, (op, rhs)| op.apply(acc, rhs.eval())),
        }
    }
}

/// Split a sanitized arithmetic string into tokens.
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &text[start..end];
                let n = literal
                    .parse::<f64>()
                    .map_err(|_| EvalError::Syntax(format!("bad number {:?}", literal)))?;
                tokens.push(Token::Number(n));
            }
            _ => {
                let token = match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    other => return Err(EvalError::InvalidFormulaCharacters(other.to_string())),
                };
                tokens.push(token);
                chars.next();
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    nesting: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn descend(&mut self) -> Result<()> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(EvalError::Syntax("expression nested too deeply".into()));
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr> {
        self.chain(
            |t| match t {
                Token::Plus => Some(BinOp::Add),
                Token::Minus => Some(BinOp::Sub),
                _ => None,
            },
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.chain(
            |t| match t {
                Token::Star => Some(BinOp::Mul),
                Token::Slash => Some(BinOp::Div),
                _ => None,
            },
            Self::unary,
        )
    }

    fn chain(
        &mut self,
        op_of: fn(Token) -> Option<BinOp>,
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let first = operand(self)?;
        let mut rest = Vec::new();
        while let Some(op) = self.peek().and_then(op_of) {
            self.pos += 1;
            rest.push((op, operand(self)?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Chain {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Plus) | Some(Token::Minus) => {
                let negate = self.advance() == Some(Token::Minus);
                self.descend()?;
                let inner = self.unary()?;
                self.nesting -= 1;
                Ok(if negate { Expr::Neg(Box::new(inner)) } else { inner })
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.expr()?;
                self.nesting -= 1;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(EvalError::Syntax("missing closing parenthesis".into())),
                }
            }
            Some(other) => Err(EvalError::Syntax(format!("unexpected {:?}", other))),
            None => Err(EvalError::Syntax("unexpected end of expression".into())),
        }
    }
}

/// Parse a token stream into an expression tree. All tokens must be consumed.
pub fn parse(tokens: &[Token]) -> Result<Expr> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        nesting: 0,
    };
    let expr = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(extra) => Err(EvalError::Syntax(format!("unexpected {:?}", extra))),
    }
}

/// Tokenize, parse and evaluate an arithmetic string.
pub fn eval_arithmetic(text: &str) -> Result<f64> {
    let tokens = tokenize(text)?;
    Ok(parse(&tokens)?.eval())
}
