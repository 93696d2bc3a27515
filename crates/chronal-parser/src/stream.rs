//! Token stream wrapper for the hand-written parser.

use std::ops::Range;

use chronal_lexer::Token;

use crate::error::ParseError;

/// Token stream with lookahead and span tracking.
///
/// Each token is paired with its byte span from the source, so errors
/// can point at the exact failing position.
pub struct TokenStream<'src> {
    tokens: &'src [(Token, Range<usize>)],
    pos: usize,
}

impl<'src> TokenStream<'src> {
    pub fn new(tokens: &'src [(Token, Range<usize>)]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Advance to the next token and return the current one.
    pub fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|(tok, _)| tok);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token kind.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Expect a specific token and advance past it.
    pub fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if self.check(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::expected_token(
                &expected,
                self.peek(),
                self.current_span(),
            ))
        }
    }

    /// Check if we've reached the end of the token stream.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Byte span of the current token, or an empty span at the end of
    /// the last token when the stream is exhausted.
    pub fn current_span(&self) -> Range<usize> {
        if let Some((_, span)) = self.tokens.get(self.pos) {
            span.clone()
        } else if let Some((_, span)) = self.tokens.last() {
            span.end..span.end
        } else {
            0..0
        }
    }
}
