//! Parse error types.

use std::fmt;
use std::ops::Range;

use chronal_lexer::{LexError, Token};

/// Parse error with source location and context.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Kind of parse error
    pub kind: ParseErrorKind,
    /// Byte range of the failing token
    pub span: Range<usize>,
    /// Human-readable error message
    pub message: String,
}

/// Category of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Illegal character rejected by the lexer.
    IllegalCharacter,
    /// A specific token was expected, something else was found.
    UnexpectedToken,
    /// Input ended while a construct was still open (unterminated
    /// bracket or relation block).
    UnexpectedEof,
    /// Tokens present but structurally invalid (empty relation block,
    /// too many neighbor offsets).
    InvalidSyntax,
    /// A relation block names an unknown temporal relation.
    RelationConfig,
}

impl ParseError {
    /// Create an "expected token" error.
    pub fn expected_token(expected: &Token, found: Option<&Token>, span: Range<usize>) -> Self {
        let message = match found {
            Some(token) => format!("expected '{expected}', found '{token}'"),
            None => format!("expected '{expected}', found end of input"),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(found: Option<&Token>, context: &str, span: Range<usize>) -> Self {
        let message = match found {
            Some(token) => format!("unexpected '{token}' {context}"),
            None => format!("unexpected end of input {context}"),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    /// Create an "invalid syntax" error.
    pub fn invalid_syntax(message: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            kind: ParseErrorKind::InvalidSyntax,
            span,
            message: message.into(),
        }
    }

    /// Create a relation-configuration error (unknown relation name).
    pub fn relation_config(message: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            kind: ParseErrorKind::RelationConfig,
            span,
            message: message.into(),
        }
    }

    /// Render the error with a caret line pointing at the failing
    /// token in the original source.
    pub fn with_pointer(&self, source: &str) -> String {
        let start = self.span.start.min(source.len());
        let end = self.span.end.clamp(start, source.len());
        let caret_len = (end - start).max(1);
        format!(
            "{}\n  {}\n  {}{}",
            self.message,
            source,
            " ".repeat(start),
            "^".repeat(caret_len)
        )
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self {
            kind: ParseErrorKind::IllegalCharacter,
            message: format!("illegal character at offset {}", err.span.start),
            span: err.span,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

impl std::error::Error for ParseError {}
