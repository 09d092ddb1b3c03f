//! Tree mutations: predicates, joins, sorting, paging, SET targets and
//! count derivation.
//!
//! Mutators are pure edits on a [`Statement`]; none of them binds values.
//! Callers bind the argument first and pass the resulting ordinal in.

use pg_query::NodeEnum;
use pg_query::protobuf::{AExprKind, BoolExprType, JoinType, LimitOption, Node};

use super::predicate::{Predicate, either_node};
use super::sort::SortKey;
use super::{Statement, nodes, root};
use crate::error::{LedgerError, LedgerResult};
use crate::ident::Ident;

/// Join flavours a resource may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    fn join_type(self) -> JoinType {
        match self {
            JoinKind::Inner => JoinType::JoinInner,
            JoinKind::Left => JoinType::JoinLeft,
        }
    }
}

impl Statement {
    /// AND a predicate into the WHERE clause.
    ///
    /// An empty WHERE becomes the predicate, an existing AND gets the
    /// predicate appended to its argument list, and anything else is wrapped
    /// as `AND(existing, predicate)`. Predicates therefore compose
    /// conjunctively in the order they are added, and the tree stays one
    /// level deep.
    pub fn add_predicate(&mut self, predicate: Predicate) -> LedgerResult<()> {
        self.and_where(predicate.into_node())
    }

    /// AND `(a OR b)` into the WHERE clause.
    ///
    /// This is the only disjunction the builders emit: "matches either of two
    /// columns". The OR node is always added as a single conjunct and is never
    /// flattened into neighbouring predicates.
    pub fn add_any_predicate(&mut self, a: Predicate, b: Predicate) -> LedgerResult<()> {
        self.and_where(either_node(a, b))
    }

    fn and_where(&mut self, term: Node) -> LedgerResult<()> {
        let slot = self.where_clause_mut()?;
        let combined = match slot.take() {
            None => term,
            Some(mut existing) => {
                if let Some(NodeEnum::BoolExpr(expr)) = existing.node.as_mut() {
                    if expr.boolop == BoolExprType::AndExpr as i32 {
                        expr.args.push(term);
                        *slot = Some(existing);
                        return Ok(());
                    }
                }
                nodes::bool_expr(BoolExprType::AndExpr, vec![*existing, term])
            }
        };
        *slot = Some(Box::new(combined));
        Ok(())
    }

    /// Number of top-level conjuncts in the WHERE clause.
    pub fn conjunct_count(&self) -> usize {
        match self.where_clause().and_then(|n| n.node.as_ref()) {
            None => 0,
            Some(NodeEnum::BoolExpr(expr)) if expr.boolop == BoolExprType::AndExpr as i32 => {
                expr.args.len()
            }
            Some(_) => 1,
        }
    }

    /// Join `table AS alias` onto the single FROM entry.
    ///
    /// The ON condition is the equality `left = right`. The FROM clause must
    /// hold exactly one entry (a plain table or an earlier join) and `alias`
    /// must not already be in use; anything else is a
    /// [`LedgerError::Structural`] since it can only come from a broken
    /// template or descriptor.
    pub fn add_join(
        &mut self,
        kind: JoinKind,
        table: &Ident,
        alias: &str,
        on: (&Ident, &Ident),
    ) -> LedgerResult<()> {
        let select = self.select_mut()?;
        if select.from_clause.len() != 1 {
            return Err(LedgerError::structural(format!(
                "join on '{table}' requires exactly one FROM entry, found {}",
                select.from_clause.len()
            )));
        }

        let mut aliases = Vec::new();
        collect_aliases(&select.from_clause[0], &mut aliases);
        if aliases.iter().any(|a| a == alias) {
            return Err(LedgerError::structural(format!(
                "alias '{alias}' is already present in the FROM clause"
            )));
        }

        let quals = nodes::a_expr(
            AExprKind::AexprOp,
            "=",
            nodes::column_ref(on.0),
            nodes::column_ref(on.1),
        );
        let existing = select.from_clause.remove(0);
        select.from_clause.push(nodes::join_expr(
            kind.join_type(),
            existing,
            nodes::range_var(table, alias),
            quals,
        ));
        Ok(())
    }

    /// Aliases (or table names, when unaliased) bound in the FROM clause.
    pub fn from_aliases(&self) -> LedgerResult<Vec<String>> {
        let mut aliases = Vec::new();
        for item in &self.select()?.from_clause {
            collect_aliases(item, &mut aliases);
        }
        Ok(aliases)
    }

    /// Replace the ORDER BY clause with `keys`.
    ///
    /// Sorting is never additive: whatever ordering the tree had is dropped.
    pub fn set_sort(&mut self, keys: &[SortKey]) -> LedgerResult<()> {
        let select = self.select_mut()?;
        select.sort_clause = keys.iter().map(SortKey::to_node).collect();
        Ok(())
    }

    /// Set `LIMIT n` as a literal constant.
    ///
    /// Limits come from validated request fields, so they are embedded rather
    /// than bound; this keeps placeholder numbering identical between a list
    /// statement and its count derivative.
    pub fn set_limit(&mut self, n: i32) -> LedgerResult<()> {
        if n < 0 {
            return Err(LedgerError::structural(format!(
                "LIMIT must be non-negative, got {n}"
            )));
        }
        let select = self.select_mut()?;
        select.limit_count = Some(Box::new(nodes::int_const(n)));
        select.limit_option = LimitOption::Count as i32;
        Ok(())
    }

    /// Set `OFFSET n` as a literal constant.
    pub fn set_offset(&mut self, n: i32) -> LedgerResult<()> {
        if n < 0 {
            return Err(LedgerError::structural(format!(
                "OFFSET must be non-negative, got {n}"
            )));
        }
        let select = self.select_mut()?;
        select.limit_offset = Some(Box::new(nodes::int_const(n)));
        Ok(())
    }

    /// Turn a list statement into its row-count statement.
    ///
    /// Keeps FROM, joins and WHERE untouched, drops ORDER BY, LIMIT and
    /// OFFSET, and replaces the target list with `count(*)`.
    pub fn into_count(mut self) -> LedgerResult<Statement> {
        let select = self.select_mut()?;
        select.sort_clause.clear();
        select.limit_count = None;
        select.limit_offset = None;
        select.limit_option = LimitOption::Default as i32;
        select.target_list = vec![nodes::count_star_target()];
        Ok(self)
    }

    /// Append `column = $ordinal` to an UPDATE's SET list.
    pub fn set_column(&mut self, column: &Ident, ordinal: i32) -> LedgerResult<()> {
        if column.is_qualified() {
            return Err(LedgerError::structural(format!(
                "SET target '{column}' must be a bare column name"
            )));
        }
        let update = self.update_mut()?;
        update
            .target_list
            .push(nodes::res_target(&column.column(), nodes::param_ref(ordinal)));
        Ok(())
    }

    /// Column names in the SET list, for UPDATE statements.
    pub fn set_targets(&self) -> Vec<String> {
        match root(&self.tree) {
            Some(NodeEnum::UpdateStmt(update)) => update
                .target_list
                .iter()
                .filter_map(|n| match n.node.as_ref() {
                    Some(NodeEnum::ResTarget(rt)) => Some(rt.name.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn collect_aliases(item: &Node, out: &mut Vec<String>) {
    match item.node.as_ref() {
        Some(NodeEnum::RangeVar(rv)) => match &rv.alias {
            Some(alias) => out.push(alias.aliasname.clone()),
            None => out.push(rv.relname.clone()),
        },
        Some(NodeEnum::JoinExpr(join)) => {
            if let Some(larg) = join.larg.as_deref() {
                collect_aliases(larg, out);
            }
            if let Some(rarg) = join.rarg.as_deref() {
                collect_aliases(rarg, out);
            }
        }
        _ => {}
    }
}
