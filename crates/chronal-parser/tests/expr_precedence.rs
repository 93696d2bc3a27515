//! Expression precedence and shape tests.
//!
//! Binding order under test, tightest first: neighbor brackets,
//! `*` `/` `%`, `+` `-`, relation-qualified temporal operators,
//! assignment.

use chronal_parser::ast::{ArithOp, Expr, ExtentPolicy, NeighborOffsets};
use chronal_parser::{parse_expr, parse_expression};

fn binary(expr: &Expr) -> (&ArithOp, &Expr, &Expr) {
    match expr {
        Expr::Binary {
            op, left, right, ..
        } => (op, left.as_ref(), right.as_ref()),
        other => panic!("expected binary node, got {other:?}"),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    // a + b * c parses as a + (b * c)
    let expr = parse_expr("a + b * c").unwrap();
    let (op, left, right) = binary(&expr);
    assert_eq!(*op, ArithOp::Add);
    assert_eq!(*left, Expr::Identifier("a".to_string()));
    let (op, _, _) = binary(right);
    assert_eq!(*op, ArithOp::Mul);
}

#[test]
fn addition_is_left_associative() {
    // a - b + c parses as (a - b) + c
    let expr = parse_expr("a - b + c").unwrap();
    let (op, left, _) = binary(&expr);
    assert_eq!(*op, ArithOp::Add);
    let (op, _, _) = binary(left);
    assert_eq!(*op, ArithOp::Sub);
}

#[test]
fn relation_operator_binds_loosest() {
    // a + b {*,during} c * d parses as (a + b) {*,during} (c * d)
    let expr = parse_expr("a + b {*,during} c * d").unwrap();
    match &expr {
        Expr::Binary {
            op,
            relation: Some(spec),
            left,
            right,
        } => {
            assert_eq!(*op, ArithOp::Mul);
            assert_eq!(spec.relations.len(), 1);
            let (op, _, _) = binary(left);
            assert_eq!(*op, ArithOp::Add);
            let (op, _, _) = binary(right);
            assert_eq!(*op, ArithOp::Mul);
        }
        other => panic!("expected relation-qualified binary, got {other:?}"),
    }
}

#[test]
fn parentheses_override_precedence() {
    let expr = parse_expr("(a + b) * c").unwrap();
    let (op, left, _) = binary(&expr);
    assert_eq!(*op, ArithOp::Mul);
    let (op, _, _) = binary(left);
    assert_eq!(*op, ArithOp::Add);
}

#[test]
fn neighbor_offsets_forms() {
    let expr = parse_expr("A[-1]").unwrap();
    assert_eq!(
        expr,
        Expr::Neighbor {
            base: "A".to_string(),
            offsets: NeighborOffsets::Time(-1),
        }
    );

    let expr = parse_expr("A[1,0]").unwrap();
    assert_eq!(
        expr,
        Expr::Neighbor {
            base: "A".to_string(),
            offsets: NeighborOffsets::Space {
                row: 1,
                col: 0,
                depth: None,
                time: None,
            },
        }
    );

    let expr = parse_expr("A[1,0,-1,2]").unwrap();
    assert_eq!(
        expr,
        Expr::Neighbor {
            base: "A".to_string(),
            offsets: NeighborOffsets::Space {
                row: 1,
                col: 0,
                depth: Some(-1),
                time: Some(2),
            },
        }
    );
}

#[test]
fn relation_block_with_side_marker() {
    let expr = parse_expr("a {+,equal|during,r} b").unwrap();
    match expr {
        Expr::Binary {
            op,
            relation: Some(spec),
            ..
        } => {
            assert_eq!(op, ArithOp::Add);
            assert_eq!(spec.relations.len(), 2);
            assert_eq!(spec.extent, Some(ExtentPolicy::Right));
        }
        other => panic!("expected relation-qualified binary, got {other:?}"),
    }
}

#[test]
fn bare_operator_block_defaults_to_equal() {
    let expr = parse_expr("a {+} b").unwrap();
    match expr {
        Expr::Binary {
            relation: Some(spec),
            ..
        } => {
            assert_eq!(
                spec.relations,
                vec![chronal_core::TemporalRelation::Equal]
            );
            assert_eq!(spec.extent, None);
        }
        other => panic!("expected relation-qualified binary, got {other:?}"),
    }
}

#[test]
fn assignment_parses_target_and_body() {
    let assignment = parse_expression("D = A[-1] + A[1]").unwrap();
    assert_eq!(assignment.target, "D");
    let (op, left, right) = binary(&assignment.expr);
    assert_eq!(*op, ArithOp::Add);
    assert!(matches!(left, Expr::Neighbor { .. }));
    assert!(matches!(right, Expr::Neighbor { .. }));
}

#[test]
fn referenced_datasets_deduplicate() {
    let assignment = parse_expression("D = A[-1] + A[1] * B").unwrap();
    assert_eq!(assignment.expr.referenced_datasets(), vec!["A", "B"]);
}
