//! Abstract syntax tree for algebra expressions.

use serde::{Deserialize, Serialize};

use chronal_core::TemporalRelation;

/// Arithmetic operator of a binary node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    /// Spelling used in synthesized calc expressions.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
        }
    }
}

/// Which operand's extent the output inherits, when the relation block
/// overrides the topology-derived rule.
///
/// `l`/`r` pick a side, `u` takes the union, `i` the intersection. The
/// disjoint-union marker `d` collapses to `u` for extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtentPolicy {
    Left,
    Right,
    Union,
    Intersection,
}

/// Contents of a relation block `{op,rel|rel,side}`.
///
/// Invariant: `relations` is non-empty and free of duplicates; the
/// parser rejects blocks that would violate this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSpec {
    pub relations: Vec<TemporalRelation>,
    pub extent: Option<ExtentPolicy>,
}

impl RelationSpec {
    /// The implicit spec of a bare arithmetic operator: sample by
    /// `equal`, inherit by topology.
    pub fn default_equal() -> Self {
        Self {
            relations: vec![TemporalRelation::Equal],
            extent: None,
        }
    }
}

/// Neighbor-bracket offsets.
///
/// One offset is a pure temporal shift. Two to four offsets shift in
/// space (row, column, optional depth) with an optional trailing
/// temporal shift; depth and the four-offset form only apply to 3D
/// datasets, which the planner enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborOffsets {
    Time(i64),
    Space {
        row: i64,
        col: i64,
        depth: Option<i64>,
        time: Option<i64>,
    },
}

impl NeighborOffsets {
    /// True when the offsets index into a third spatial dimension.
    pub fn needs_depth(&self) -> bool {
        matches!(self, NeighborOffsets::Space { depth: Some(_), .. })
    }
}

/// Expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Identifier(String),
    Number(f64),
    Neighbor {
        base: String,
        offsets: NeighborOffsets,
    },
    Binary {
        op: ArithOp,
        relation: Option<RelationSpec>,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Dataset names referenced anywhere in this subtree, in first
    /// appearance order.
    pub fn referenced_datasets(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_datasets(&mut names);
        names
    }

    fn collect_datasets<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Identifier(name) | Expr::Neighbor { base: name, .. } => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expr::Number(_) => {}
            Expr::Binary { left, right, .. } => {
                left.collect_datasets(names);
                right.collect_datasets(names);
            }
        }
    }
}

/// Top-level statement: `target = expr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub target: String,
    pub expr: Expr,
}
