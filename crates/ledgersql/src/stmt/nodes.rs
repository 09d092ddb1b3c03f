//! Constructors for the parse-tree nodes the mutators splice in.
//!
//! Every synthesized node carries `location = -1` (no source position), the
//! same convention libpg_query uses for nodes it creates itself.

use pg_query::NodeEnum;
use pg_query::protobuf::{
    self, AExprKind, BoolExprType, CoercionForm, JoinType, Node, NullTestType, SortByDir,
    SortByNulls, a_const,
};

use crate::ident::Ident;

pub(crate) fn node(inner: NodeEnum) -> Node {
    Node { node: Some(inner) }
}

pub(crate) fn string(s: impl Into<String>) -> Node {
    node(NodeEnum::String(protobuf::String { sval: s.into() }))
}

pub(crate) fn column_ref(ident: &Ident) -> Node {
    node(NodeEnum::ColumnRef(protobuf::ColumnRef {
        fields: ident.names().map(string).collect(),
        location: -1,
    }))
}

pub(crate) fn param_ref(ordinal: i32) -> Node {
    node(NodeEnum::ParamRef(protobuf::ParamRef {
        number: ordinal,
        location: -1,
    }))
}

pub(crate) fn int_const(value: i32) -> Node {
    node(NodeEnum::AConst(protobuf::AConst {
        isnull: false,
        location: -1,
        val: Some(a_const::Val::Ival(protobuf::Integer { ival: value })),
    }))
}

pub(crate) fn a_expr(kind: AExprKind, operator: &str, lexpr: Node, rexpr: Node) -> Node {
    node(NodeEnum::AExpr(Box::new(protobuf::AExpr {
        kind: kind as i32,
        name: vec![string(operator)],
        lexpr: Some(Box::new(lexpr)),
        rexpr: Some(Box::new(rexpr)),
        location: -1,
    })))
}

pub(crate) fn bool_expr(op: BoolExprType, args: Vec<Node>) -> Node {
    node(NodeEnum::BoolExpr(Box::new(protobuf::BoolExpr {
        xpr: None,
        boolop: op as i32,
        args,
        location: -1,
    })))
}

pub(crate) fn null_test(arg: Node, test: NullTestType) -> Node {
    node(NodeEnum::NullTest(Box::new(protobuf::NullTest {
        xpr: None,
        arg: Some(Box::new(arg)),
        nulltesttype: test as i32,
        argisrow: false,
        location: -1,
    })))
}

pub(crate) fn range_var(table: &Ident, alias: &str) -> Node {
    let mut names: Vec<String> = table.names().collect();
    let relname = names.pop().unwrap_or_default();
    let schemaname = names.pop().unwrap_or_default();

    node(NodeEnum::RangeVar(protobuf::RangeVar {
        schemaname,
        relname,
        inh: true,
        relpersistence: "p".to_string(),
        alias: Some(protobuf::Alias {
            aliasname: alias.to_string(),
            colnames: Vec::new(),
        }),
        location: -1,
        ..Default::default()
    }))
}

pub(crate) fn join_expr(jointype: JoinType, larg: Node, rarg: Node, quals: Node) -> Node {
    node(NodeEnum::JoinExpr(Box::new(protobuf::JoinExpr {
        jointype: jointype as i32,
        larg: Some(Box::new(larg)),
        rarg: Some(Box::new(rarg)),
        quals: Some(Box::new(quals)),
        ..Default::default()
    })))
}

pub(crate) fn sort_by(target: Node, dir: SortByDir, nulls: SortByNulls) -> Node {
    node(NodeEnum::SortBy(Box::new(protobuf::SortBy {
        node: Some(Box::new(target)),
        sortby_dir: dir as i32,
        sortby_nulls: nulls as i32,
        use_op: Vec::new(),
        location: -1,
    })))
}

pub(crate) fn res_target(name: &str, val: Node) -> Node {
    node(NodeEnum::ResTarget(Box::new(protobuf::ResTarget {
        name: name.to_string(),
        indirection: Vec::new(),
        val: Some(Box::new(val)),
        location: -1,
    })))
}

/// `count(*)` as an unnamed target.
pub(crate) fn count_star_target() -> Node {
    let call = node(NodeEnum::FuncCall(Box::new(protobuf::FuncCall {
        funcname: vec![string("count")],
        agg_star: true,
        funcformat: CoercionForm::CoerceExplicitCall as i32,
        location: -1,
        ..Default::default()
    })));
    res_target("", call)
}
