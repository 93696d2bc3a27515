//! Expression parser - precedence climbing over the algebra grammar.
//!
//! Binding order, tightest first: neighbor brackets, `*` `/` `%`,
//! `+` `-`, relation-qualified temporal operators, assignment.

use std::ops::Range;

use chronal_core::TemporalRelation;
use chronal_lexer::Token;

use crate::ast::{ArithOp, Assignment, Expr, ExtentPolicy, NeighborOffsets, RelationSpec};
use crate::error::ParseError;
use crate::stream::TokenStream;

/// Precedence of a relation-qualified temporal operator. Loosest of
/// the binary operators, tighter only than assignment.
const RELOP_PREC: u8 = 10;

/// Get binary operator metadata for plain arithmetic tokens.
fn binary_op_info(token: &Token) -> Option<(u8, ArithOp)> {
    match token {
        Token::Plus => Some((20, ArithOp::Add)),
        Token::Minus => Some((20, ArithOp::Sub)),
        Token::Star => Some((30, ArithOp::Mul)),
        Token::Slash => Some((30, ArithOp::Div)),
        Token::Percent => Some((30, ArithOp::Mod)),
        _ => None,
    }
}

/// Parse a full `target = expr` statement.
pub(crate) fn parse_assignment(stream: &mut TokenStream) -> Result<Assignment, ParseError> {
    let span = stream.current_span();
    let target = match stream.advance().cloned() {
        Some(Token::Ident(name)) => name.to_string(),
        other => {
            return Err(ParseError::unexpected_token(
                other.as_ref(),
                "at start of statement; expected an output name",
                span,
            ));
        }
    };
    stream.expect(Token::Eq)?;
    let expr = parse_expr(stream)?;
    if !stream.at_end() {
        return Err(ParseError::unexpected_token(
            stream.peek(),
            "after expression",
            stream.current_span(),
        ));
    }
    Ok(Assignment { target, expr })
}

/// Parse an expression without the assignment wrapper.
pub(crate) fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    parse_binary(stream, 0)
}

fn parse_binary(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let mut left = parse_atom(stream)?;

    loop {
        match stream.peek() {
            Some(Token::LBrace) => {
                if RELOP_PREC < min_prec {
                    break;
                }
                let (op, spec) = parse_relation_block(stream)?;
                let right = parse_binary(stream, RELOP_PREC + 1)?;
                left = Expr::Binary {
                    op,
                    relation: Some(spec),
                    left: Box::new(left),
                    right: Box::new(right),
                };
            }
            Some(token) => {
                let Some((prec, op)) = binary_op_info(token) else {
                    break;
                };
                if prec < min_prec {
                    break;
                }
                stream.advance();
                let right = parse_binary(stream, prec + 1)?;
                left = Expr::Binary {
                    op,
                    relation: None,
                    left: Box::new(left),
                    right: Box::new(right),
                };
            }
            None => break,
        }
    }

    Ok(left)
}

/// Parse atomic expressions: identifiers (with optional neighbor
/// bracket), numbers, parenthesized expressions.
fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let span = stream.current_span();
    match stream.peek().cloned() {
        Some(Token::Ident(name)) => {
            stream.advance();
            if matches!(stream.peek(), Some(Token::LBracket)) {
                let offsets = parse_neighbor_offsets(stream)?;
                Ok(Expr::Neighbor {
                    base: name.to_string(),
                    offsets,
                })
            } else {
                Ok(Expr::Identifier(name.to_string()))
            }
        }
        Some(Token::Integer(n)) => {
            stream.advance();
            Ok(Expr::Number(n as f64))
        }
        Some(Token::Float(v)) => {
            stream.advance();
            Ok(Expr::Number(v))
        }
        Some(Token::Minus) => {
            // Negative number literal.
            stream.advance();
            let span = stream.current_span();
            match stream.advance().cloned() {
                Some(Token::Integer(n)) => Ok(Expr::Number(-(n as f64))),
                Some(Token::Float(v)) => Ok(Expr::Number(-v)),
                other => Err(ParseError::unexpected_token(
                    other.as_ref(),
                    "after '-'; expected a number",
                    span,
                )),
            }
        }
        Some(Token::LParen) => {
            stream.advance();
            let expr = parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            Ok(expr)
        }
        other => Err(ParseError::unexpected_token(
            other.as_ref(),
            "in expression",
            span,
        )),
    }
}

/// Parse `[n]`, `[r,c]`, `[r,c,d]` or `[r,c,d,t]` after an identifier.
fn parse_neighbor_offsets(stream: &mut TokenStream) -> Result<NeighborOffsets, ParseError> {
    let open_span = stream.current_span();
    stream.expect(Token::LBracket)?;

    let mut offsets = Vec::new();
    loop {
        offsets.push(parse_signed_int(stream)?);
        if stream.check(&Token::Comma) {
            stream.advance();
        } else {
            break;
        }
    }
    stream.expect(Token::RBracket)?;

    match offsets.as_slice() {
        [t] => Ok(NeighborOffsets::Time(*t)),
        [row, col] => Ok(NeighborOffsets::Space {
            row: *row,
            col: *col,
            depth: None,
            time: None,
        }),
        [row, col, depth] => Ok(NeighborOffsets::Space {
            row: *row,
            col: *col,
            depth: Some(*depth),
            time: None,
        }),
        [row, col, depth, time] => Ok(NeighborOffsets::Space {
            row: *row,
            col: *col,
            depth: Some(*depth),
            time: Some(*time),
        }),
        _ => Err(ParseError::invalid_syntax(
            format!("neighbor index takes 1 to 4 offsets, found {}", offsets.len()),
            open_span,
        )),
    }
}

fn parse_signed_int(stream: &mut TokenStream) -> Result<i64, ParseError> {
    let negative = if stream.check(&Token::Minus) {
        stream.advance();
        true
    } else {
        false
    };
    let span = stream.current_span();
    match stream.advance().cloned() {
        Some(Token::Integer(n)) => Ok(if negative { -n } else { n }),
        other => Err(ParseError::unexpected_token(
            other.as_ref(),
            "in neighbor index; expected an integer offset",
            span,
        )),
    }
}

/// Parse a relation block `{op,rel|rel,side}`.
///
/// The operator is mandatory. The relation list defaults to `equal`
/// when omitted, so `{+}` means `{+,equal}`. The trailing side marker
/// (`l`, `r`, `u`, `i`, `d`) overrides the topology-derived extent
/// rule and may appear with or without an explicit relation list.
fn parse_relation_block(stream: &mut TokenStream) -> Result<(ArithOp, RelationSpec), ParseError> {
    let open_span = stream.current_span();
    stream.expect(Token::LBrace)?;

    if stream.check(&Token::RBrace) {
        return Err(ParseError::invalid_syntax(
            "empty relation block",
            open_span,
        ));
    }

    let op_span = stream.current_span();
    let op = match stream.advance().cloned() {
        Some(Token::Plus) => ArithOp::Add,
        Some(Token::Minus) => ArithOp::Sub,
        Some(Token::Star) => ArithOp::Mul,
        Some(Token::Slash) => ArithOp::Div,
        Some(Token::Percent) => ArithOp::Mod,
        other => {
            return Err(ParseError::unexpected_token(
                other.as_ref(),
                "in relation block; expected an arithmetic operator",
                op_span,
            ));
        }
    };

    // Collect comma-separated fields of pipe-separated words.
    let mut fields: Vec<Vec<(String, Range<usize>)>> = Vec::new();
    while stream.check(&Token::Comma) {
        stream.advance();
        let mut words = Vec::new();
        loop {
            let span = stream.current_span();
            match stream.advance().cloned() {
                Some(Token::Ident(word)) => words.push((word.to_string(), span)),
                other => {
                    return Err(ParseError::unexpected_token(
                        other.as_ref(),
                        "in relation block",
                        span,
                    ));
                }
            }
            if stream.check(&Token::Pipe) {
                stream.advance();
            } else {
                break;
            }
        }
        fields.push(words);
    }
    stream.expect(Token::RBrace)?;

    let spec = match fields.len() {
        0 => RelationSpec::default_equal(),
        1 => {
            let words = &fields[0];
            // A lone side marker gets the default relation list.
            if words.len() == 1 {
                if let Some(policy) = extent_policy(&words[0].0) {
                    RelationSpec {
                        relations: vec![TemporalRelation::Equal],
                        extent: Some(policy),
                    }
                } else {
                    RelationSpec {
                        relations: parse_relations(words)?,
                        extent: None,
                    }
                }
            } else {
                RelationSpec {
                    relations: parse_relations(words)?,
                    extent: None,
                }
            }
        }
        2 => {
            let relations = parse_relations(&fields[0])?;
            let (side, side_span) = match fields[1].as_slice() {
                [(word, span)] => (word.as_str(), span.clone()),
                _ => {
                    return Err(ParseError::invalid_syntax(
                        "extent marker must be a single word",
                        open_span,
                    ));
                }
            };
            let policy = extent_policy(side).ok_or_else(|| {
                ParseError::invalid_syntax(
                    format!("unknown extent marker '{side}'; expected l, r, u, i or d"),
                    side_span,
                )
            })?;
            RelationSpec {
                relations,
                extent: Some(policy),
            }
        }
        n => {
            return Err(ParseError::invalid_syntax(
                format!("relation block takes at most 3 sections, found {}", n + 1),
                open_span,
            ));
        }
    };

    Ok((op, spec))
}

fn extent_policy(word: &str) -> Option<ExtentPolicy> {
    match word {
        "l" => Some(ExtentPolicy::Left),
        "r" => Some(ExtentPolicy::Right),
        "u" | "d" => Some(ExtentPolicy::Union),
        "i" => Some(ExtentPolicy::Intersection),
        _ => None,
    }
}

/// Parse and deduplicate relation words, preserving user order.
fn parse_relations(
    words: &[(String, Range<usize>)],
) -> Result<Vec<TemporalRelation>, ParseError> {
    let mut relations = Vec::new();
    for (word, span) in words {
        let relation: TemporalRelation = word.parse().map_err(|_| {
            ParseError::relation_config(
                format!("unknown temporal relation '{word}'"),
                span.clone(),
            )
        })?;
        if !relations.contains(&relation) {
            relations.push(relation);
        }
    }
    Ok(relations)
}
