//! Lexical analysis for temporal algebra expressions.
//!
//! Tokenization uses logos. The grammar is small: identifiers (map and
//! dataset names, optionally mapset-qualified), numbers, arithmetic
//! operators, neighbor brackets (`A[-1]`, `A[1,0,-1]`), relation-block
//! braces (`{+,equal|during,r}`) and assignment.
//!
//! `tokenize` is a pure function of the input string; the lexer holds
//! no state across calls.

use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use logos::Logos;

/// Expression token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // === Operators ===
    /// Operator `+`
    #[token("+")]
    Plus,
    /// Operator `-`
    #[token("-")]
    Minus,
    /// Operator `*`
    #[token("*")]
    Star,
    /// Operator `/`
    #[token("/")]
    Slash,
    /// Operator `%`
    #[token("%")]
    Percent,
    /// Assignment `=`
    #[token("=")]
    Eq,
    /// Relation separator `|`
    #[token("|")]
    Pipe,
    /// Operator `,`
    #[token(",")]
    Comma,

    // === Delimiters ===
    /// Delimiter `(`
    #[token("(")]
    LParen,
    /// Delimiter `)`
    #[token(")")]
    RParen,
    /// Neighbor bracket `[`
    #[token("[")]
    LBracket,
    /// Neighbor bracket `]`
    #[token("]")]
    RBracket,
    /// Relation block `{`
    #[token("{")]
    LBrace,
    /// Relation block `}`
    #[token("}")]
    RBrace,

    // === Literals ===
    /// Integer literal. Overflowing literals surface as lex errors.
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    /// Float literal.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    /// Identifier: map or dataset name, optionally `name@mapset`.
    ///
    /// Uses `Rc<str>` for cheap cloning throughout the parser pipeline.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_.]*(@[a-zA-Z_][a-zA-Z0-9_]*)?", |lex| Rc::from(lex.slice()))]
    Ident(Rc<str>),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Eq => write!(f, "="),
            Token::Pipe => write!(f, "|"),
            Token::Comma => write!(f, ","),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Integer(n) => write!(f, "{n}"),
            Token::Float(v) => write!(f, "{v}"),
            Token::Ident(s) => write!(f, "{s}"),
        }
    }
}

/// Lex error: the byte range of the offending input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub span: Range<usize>,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal character at {}..{}", self.span.start, self.span.end)
    }
}

impl std::error::Error for LexError {}

/// Tokenize an expression string into spanned tokens.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Range<usize>)>, LexError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => return Err(LexError { span }),
        }
    }
    Ok(tokens)
}
