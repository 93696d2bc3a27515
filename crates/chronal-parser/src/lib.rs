//! Hand-written recursive descent parser for the chronal algebra
//! grammar.
//!
//! The grammar is small enough that a generated-table parser would be
//! pure overhead; the parser here is a token stream plus a precedence
//! climbing loop.
//!
//! ```
//! use chronal_parser::parse_expression;
//!
//! let assignment = parse_expression("D = A[-1] + A[1]").unwrap();
//! assert_eq!(assignment.target, "D");
//! ```

pub mod ast;
mod error;
mod expr;
mod stream;

pub use error::{ParseError, ParseErrorKind};
use stream::TokenStream;

/// Parse a full `target = expr` statement.
pub fn parse_expression(source: &str) -> Result<ast::Assignment, ParseError> {
    let tokens = chronal_lexer::tokenize(source)?;
    let mut stream = TokenStream::new(&tokens);
    expr::parse_assignment(&mut stream)
}

/// Parse a bare expression (no assignment target).
pub fn parse_expr(source: &str) -> Result<ast::Expr, ParseError> {
    let tokens = chronal_lexer::tokenize(source)?;
    let mut stream = TokenStream::new(&tokens);
    let expr = expr::parse_expr(&mut stream)?;
    if !stream.at_end() {
        return Err(ParseError::unexpected_token(
            stream.peek(),
            "after expression",
            stream.current_span(),
        ));
    }
    Ok(expr)
}
