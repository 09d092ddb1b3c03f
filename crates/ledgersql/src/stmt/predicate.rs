//! Typed predicates that lower into WHERE-clause nodes.

use pg_query::protobuf::{AExprKind, BoolExprType, Node, NullTestType};

use super::nodes;
use crate::ident::Ident;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

/// Pattern-match operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOp {
    Like,
    ILike,
}

/// A single WHERE-clause term.
///
/// Value-carrying terms hold the ordinal of an argument the caller has already
/// bound; the predicate itself never sees the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `column <op> $n`
    Compare {
        column: Ident,
        op: CompareOp,
        ordinal: i32,
    },
    /// `column LIKE $n` / `column ILIKE $n`
    Like {
        column: Ident,
        op: LikeOp,
        ordinal: i32,
    },
    /// `column IS NULL` / `column IS NOT NULL`
    NullTest { column: Ident, is_null: bool },
}

impl Predicate {
    pub fn compare(column: Ident, op: CompareOp, ordinal: i32) -> Self {
        Predicate::Compare {
            column,
            op,
            ordinal,
        }
    }

    pub fn like(column: Ident, op: LikeOp, ordinal: i32) -> Self {
        Predicate::Like {
            column,
            op,
            ordinal,
        }
    }

    pub fn is_null(column: Ident) -> Self {
        Predicate::NullTest {
            column,
            is_null: true,
        }
    }

    pub fn is_not_null(column: Ident) -> Self {
        Predicate::NullTest {
            column,
            is_null: false,
        }
    }

    pub(crate) fn into_node(self) -> Node {
        match self {
            Predicate::Compare {
                column,
                op,
                ordinal,
            } => nodes::a_expr(
                AExprKind::AexprOp,
                op.as_str(),
                nodes::column_ref(&column),
                nodes::param_ref(ordinal),
            ),
            Predicate::Like {
                column,
                op,
                ordinal,
            } => {
                let (kind, name) = match op {
                    LikeOp::Like => (AExprKind::AexprLike, "~~"),
                    LikeOp::ILike => (AExprKind::AexprIlike, "~~*"),
                };
                nodes::a_expr(
                    kind,
                    name,
                    nodes::column_ref(&column),
                    nodes::param_ref(ordinal),
                )
            }
            Predicate::NullTest { column, is_null } => nodes::null_test(
                nodes::column_ref(&column),
                if is_null {
                    NullTestType::IsNull
                } else {
                    NullTestType::IsNotNull
                },
            ),
        }
    }
}

/// `(a OR b)`, the one disjunction the builders are allowed to emit.
pub(crate) fn either_node(a: Predicate, b: Predicate) -> Node {
    nodes::bool_expr(BoolExprType::OrExpr, vec![a.into_node(), b.into_node()])
}

/// Escape `%`, `_` and `\` so user text matches literally inside a LIKE pattern.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `%text%` with `text` escaped.
pub fn contains_pattern(text: &str) -> String {
    format!("%{}%", escape_like(text))
}
