//! Statement trees: parse a template, mutate it, render it back.
//!
//! Parsing and rendering go through libpg_query (`pg_query::parse` /
//! `pg_query::deparse`), so the tree is the Postgres parser's own
//! representation and rendering is deterministic. Rendering normalizes the
//! text, which makes `render(parse(render(t))) == render(t)` hold for every
//! tree the mutators produce.
//!
//! # Example
//!
//! ```ignore
//! use ledgersql::stmt::{Statement, Predicate, CompareOp, LikeOp};
//! use ledgersql::{ArgumentList, Ident};
//!
//! let mut stmt = Statement::parse("SELECT a.id FROM accounts a WHERE a.tenant_id = $1")?;
//! let mut args = ArgumentList::new();
//! args.push(tenant_id);
//! let ord = args.push("%Root%".to_string());
//! stmt.add_predicate(Predicate::like(Ident::parse("a.display_name")?, LikeOp::ILike, ord))?;
//! stmt.set_limit(3)?;
//! let built = stmt.render_with(args)?;
//! // SELECT a.id FROM accounts a WHERE a.tenant_id = $1 AND a.display_name ILIKE $2 LIMIT 3
//! ```

mod cache;
mod mutate;
pub(crate) mod nodes;
mod predicate;
mod sort;

#[cfg(test)]
mod tests;

pub use cache::{TemplateCache, TemplateCacheStats};
pub use mutate::JoinKind;
pub use predicate::{CompareOp, LikeOp, Predicate, contains_pattern, escape_like};
pub use sort::{NullsOrder, SortDir, SortKey, SortToken};

use pg_query::protobuf::{Node, ParseResult, SelectStmt, UpdateStmt};
use pg_query::{NodeEnum, NodeRef};

use crate::error::{LedgerError, LedgerResult};
use crate::param::ArgumentList;

/// Statement shapes the builders work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Update,
}

/// A parsed single-statement SELECT or UPDATE.
#[derive(Debug, Clone)]
pub struct Statement {
    kind: StatementKind,
    tree: ParseResult,
}

impl Statement {
    /// Parse SQL text into a tree.
    ///
    /// Anything other than exactly one SELECT or UPDATE statement is a
    /// [`LedgerError::Syntax`].
    pub fn parse(sql: &str) -> LedgerResult<Self> {
        let parsed = pg_query::parse(sql)
            .map_err(|e| LedgerError::syntax(format!("pg_query parse failed: {e}")))?;
        Self::from_tree(parsed.protobuf)
    }

    pub(crate) fn from_tree(tree: ParseResult) -> LedgerResult<Self> {
        if tree.stmts.len() != 1 {
            return Err(LedgerError::syntax(format!(
                "expected exactly one statement, got {}",
                tree.stmts.len()
            )));
        }

        let kind = match root(&tree) {
            Some(NodeEnum::SelectStmt(select)) => {
                if select.larg.is_some() || select.rarg.is_some() || !select.values_lists.is_empty()
                {
                    return Err(LedgerError::syntax(
                        "set operations and VALUES lists are not supported",
                    ));
                }
                StatementKind::Select
            }
            Some(NodeEnum::UpdateStmt(_)) => StatementKind::Update,
            Some(_) => {
                return Err(LedgerError::syntax(
                    "only SELECT and UPDATE statements are supported",
                ));
            }
            None => return Err(LedgerError::syntax("empty statement")),
        };

        Ok(Self { kind, tree })
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Render the tree back to SQL text.
    pub fn render(&self) -> LedgerResult<String> {
        pg_query::deparse(&self.tree)
            .map_err(|e| LedgerError::syntax(format!("pg_query deparse failed: {e}")))
    }

    /// Placeholder numbers in tree order (duplicates included).
    pub fn param_ordinals(&self) -> Vec<i32> {
        let mut ordinals = Vec::new();
        for (node, _depth, _context, _has_filter_columns) in self.tree.nodes() {
            if let NodeRef::ParamRef(p) = node {
                ordinals.push(p.number);
            }
        }
        ordinals
    }

    /// The ordinal the next bound argument should use.
    pub fn next_ordinal(&self) -> i32 {
        self.param_ordinals().into_iter().max().unwrap_or(0) + 1
    }

    /// Check that placeholders are exactly `$1..$n`, each used once.
    pub fn check_ordinals(&self) -> LedgerResult<usize> {
        let mut ordinals = self.param_ordinals();
        ordinals.sort_unstable();
        for (i, ordinal) in ordinals.iter().enumerate() {
            let expected = i as i32 + 1;
            if *ordinal != expected {
                return Err(LedgerError::structural(format!(
                    "placeholder ordinals must be contiguous from $1, found ${ordinal} where ${expected} was expected"
                )));
            }
        }
        Ok(ordinals.len())
    }

    /// Render the tree and pair it with its arguments.
    ///
    /// Fails with [`LedgerError::Structural`] unless the argument count equals
    /// the number of placeholders and placeholders run `$1..$n` without gaps.
    pub fn render_with(&self, args: ArgumentList) -> LedgerResult<BuiltStatement> {
        let placeholders = self.check_ordinals()?;
        if placeholders != args.len() {
            return Err(LedgerError::structural(format!(
                "statement has {placeholders} placeholders but {} arguments were bound",
                args.len()
            )));
        }
        Ok(BuiltStatement {
            sql: self.render()?,
            args,
        })
    }

    pub(crate) fn select(&self) -> LedgerResult<&SelectStmt> {
        match root(&self.tree) {
            Some(NodeEnum::SelectStmt(select)) => Ok(&**select),
            _ => Err(LedgerError::structural("operation requires a SELECT statement")),
        }
    }

    pub(crate) fn select_mut(&mut self) -> LedgerResult<&mut SelectStmt> {
        match root_mut(&mut self.tree) {
            Some(NodeEnum::SelectStmt(select)) => Ok(&mut **select),
            _ => Err(LedgerError::structural("operation requires a SELECT statement")),
        }
    }

    pub(crate) fn update_mut(&mut self) -> LedgerResult<&mut UpdateStmt> {
        match root_mut(&mut self.tree) {
            Some(NodeEnum::UpdateStmt(update)) => Ok(&mut **update),
            _ => Err(LedgerError::structural("operation requires an UPDATE statement")),
        }
    }

    pub(crate) fn where_clause_mut(&mut self) -> LedgerResult<&mut Option<Box<Node>>> {
        match root_mut(&mut self.tree) {
            Some(NodeEnum::SelectStmt(select)) => Ok(&mut select.where_clause),
            Some(NodeEnum::UpdateStmt(update)) => Ok(&mut update.where_clause),
            _ => Err(LedgerError::structural("statement has no WHERE clause slot")),
        }
    }

    pub(crate) fn where_clause(&self) -> Option<&Node> {
        match root(&self.tree) {
            Some(NodeEnum::SelectStmt(select)) => select.where_clause.as_deref(),
            Some(NodeEnum::UpdateStmt(update)) => update.where_clause.as_deref(),
            _ => None,
        }
    }
}

fn root(tree: &ParseResult) -> Option<&NodeEnum> {
    tree.stmts
        .first()
        .and_then(|s| s.stmt.as_deref())
        .and_then(|s| s.node.as_ref())
}

fn root_mut(tree: &mut ParseResult) -> Option<&mut NodeEnum> {
    tree.stmts
        .first_mut()
        .and_then(|s| s.stmt.as_deref_mut())
        .and_then(|s| s.node.as_mut())
}

/// Rendered SQL text plus its positional arguments.
#[derive(Debug, Clone)]
pub struct BuiltStatement {
    sql: String,
    args: ArgumentList,
}

impl BuiltStatement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &ArgumentList {
        &self.args
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn tokio_postgres::types::ToSql + Sync)> {
        self.args.as_refs()
    }

    pub fn into_parts(self) -> (String, ArgumentList) {
        (self.sql, self.args)
    }
}
