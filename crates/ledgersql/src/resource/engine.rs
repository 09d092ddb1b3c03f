//! The builder engine shared by every resource.

use std::marker::PhantomData;

use crate::config::BuilderConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::ident::Ident;
use crate::param::ArgumentList;
use crate::presence::Presence;
use crate::stmt::{
    BuiltStatement, CompareOp, LikeOp, Predicate, SortKey, SortToken, Statement, TemplateCache,
    contains_pattern,
};

use super::{Filter, ListOptions, Resource};

/// Builds List, Count and Patch statements for one resource.
///
/// Stateless apart from its configuration; every call works on its own tree,
/// so one builder can be shared across request handlers.
#[derive(Debug, Clone)]
pub struct QueryBuilder<R: Resource> {
    config: BuilderConfig,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Default for QueryBuilder<R> {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}

impl<R: Resource> QueryBuilder<R> {
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            _resource: PhantomData,
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// The paged, filtered and sorted list statement for `req`.
    pub fn build_list(
        &self,
        scope: &R::Scope,
        req: &R::ListRequest,
    ) -> LedgerResult<BuiltStatement> {
        let built = self
            .list_statement(scope, req)
            .inspect_err(|e| self.log_fatal("list", e))?;
        self.log_built("list", &built);
        Ok(built)
    }

    /// The row count matching exactly the rows `build_list` would select,
    /// ignoring paging.
    pub fn build_count(
        &self,
        scope: &R::Scope,
        req: &R::ListRequest,
    ) -> LedgerResult<BuiltStatement> {
        let list = self
            .list_statement(scope, req)
            .inspect_err(|e| self.log_fatal("count", e))?;
        self.derive_count(&list)
    }

    /// Derive the count statement from an already built list statement.
    ///
    /// The list text is re-parsed and stripped rather than rebuilt, so both
    /// statements share their FROM, joins, WHERE and arguments.
    pub fn derive_count(&self, list: &BuiltStatement) -> LedgerResult<BuiltStatement> {
        let built = Statement::parse(list.sql())
            .and_then(Statement::into_count)
            .and_then(|count| count.render_with(list.args().clone()))
            .inspect_err(|e| self.log_fatal("count", e))?;
        self.log_built("count", &built);
        Ok(built)
    }

    /// The UPDATE for the fields present in `patch`, in declared order.
    pub fn build_patch(
        &self,
        key: &R::Key,
        patch: &Presence<R::Patch>,
    ) -> LedgerResult<PatchStatement> {
        let statement = self
            .patch_statement(key, patch)
            .inspect_err(|e| self.log_fatal("patch", e))?;
        if let Some(built) = &statement.built {
            self.log_built("patch", built);
        }
        Ok(statement)
    }

    fn template(&self, template: &'static str) -> LedgerResult<Statement> {
        if self.config.cache_templates {
            TemplateCache::global().statement(template)
        } else {
            Statement::parse(template)
        }
    }

    fn list_statement(
        &self,
        scope: &R::Scope,
        req: &R::ListRequest,
    ) -> LedgerResult<BuiltStatement> {
        let mut stmt = self.template(R::LIST_TEMPLATE)?;
        let mut args = ArgumentList::new();
        R::scope_params(scope, &mut args);
        check_template_params(&stmt, &args, R::NAME)?;

        let mut joined: Vec<&'static str> = Vec::new();
        for filter in R::filters(req)? {
            for column in filter.columns() {
                self.ensure_joined(&mut stmt, column, &mut joined)?;
            }
            apply_filter(&mut stmt, &mut args, filter)?;
        }

        stmt.set_sort(&sort_keys::<R>(req.sort())?)?;

        let (limit, offset) = self.paging(req.count(), req.offset())?;
        if let Some(limit) = limit {
            stmt.set_limit(limit)?;
        }
        if let Some(offset) = offset {
            stmt.set_offset(offset)?;
        }

        stmt.render_with(args)
    }

    fn ensure_joined(
        &self,
        stmt: &mut Statement,
        column: &'static str,
        joined: &mut Vec<&'static str>,
    ) -> LedgerResult<()> {
        let ident = descriptor_ident(column)?;
        let Some(alias) = ident.parts().first().filter(|_| ident.is_qualified()) else {
            return Err(LedgerError::structural(format!(
                "{} filter column '{column}' is not alias-qualified",
                R::NAME
            )));
        };
        let alias = alias.name();
        if alias == R::ALIAS || joined.iter().any(|j| *j == alias) {
            return Ok(());
        }

        let spec = R::JOINS.iter().find(|j| j.alias == alias).ok_or_else(|| {
            LedgerError::structural(format!(
                "{} has no join declared for alias '{alias}'",
                R::NAME
            ))
        })?;
        stmt.add_join(
            spec.kind,
            &descriptor_ident(spec.table)?,
            spec.alias,
            (&descriptor_ident(spec.on.0)?, &descriptor_ident(spec.on.1)?),
        )?;
        joined.push(spec.alias);
        Ok(())
    }

    fn paging(
        &self,
        count: Option<i64>,
        offset: Option<i64>,
    ) -> LedgerResult<(Option<i32>, Option<i32>)> {
        let limit = match count {
            Some(n) if n < 0 => {
                return Err(LedgerError::validation(format!(
                    "count must be non-negative, got {n}"
                )));
            }
            Some(n) if n > self.config.max_count => {
                return Err(LedgerError::validation(format!(
                    "count must be at most {}, got {n}",
                    self.config.max_count
                )));
            }
            Some(n) => Some(n),
            None => self.config.default_count,
        };

        let offset = match offset {
            Some(n) if n < 0 => {
                return Err(LedgerError::validation(format!(
                    "offset must be non-negative, got {n}"
                )));
            }
            Some(0) | None => None,
            Some(n) => Some(n),
        };

        Ok((
            limit.map(|n| paging_literal("count", n)).transpose()?,
            offset.map(|n| paging_literal("offset", n)).transpose()?,
        ))
    }

    fn patch_statement(
        &self,
        key: &R::Key,
        patch: &Presence<R::Patch>,
    ) -> LedgerResult<PatchStatement> {
        let mut stmt = self.template(R::PATCH_TEMPLATE)?;
        let mut args = ArgumentList::new();
        R::key_params(key, &mut args);
        check_template_params(&stmt, &args, R::NAME)?;

        let mut assignments = Vec::new();
        for field in R::PATCH_FIELDS {
            if !patch.has_field(field.name) {
                continue;
            }
            let value = R::assignment(patch.value(), field.name)?;
            let ordinal = args.push_param(value);
            stmt.set_column(&descriptor_ident(field.column)?, ordinal)?;
            assignments.push(field.column);
        }

        if assignments.is_empty() {
            return Ok(PatchStatement {
                assignments,
                built: None,
            });
        }

        Ok(PatchStatement {
            assignments,
            built: Some(stmt.render_with(args)?),
        })
    }

    fn log_built(&self, statement: &'static str, built: &BuiltStatement) {
        tracing::debug!(
            target: "ledgersql.sql",
            resource = R::NAME,
            statement,
            params = built.args().len(),
            sql = %self.config.truncate_for_log(built.sql()),
        );
    }

    fn log_fatal(&self, statement: &'static str, err: &LedgerError) {
        if err.is_fatal() {
            tracing::error!(
                target: "ledgersql.sql",
                resource = R::NAME,
                statement,
                error = %err,
                "template or descriptor defect",
            );
        }
    }
}

/// A built PATCH, or the knowledge that nothing was requested.
#[derive(Debug, Clone)]
pub struct PatchStatement {
    assignments: Vec<&'static str>,
    built: Option<BuiltStatement>,
}

impl PatchStatement {
    /// Columns assigned from present fields, in SET order.
    pub fn assignments(&self) -> &[&'static str] {
        &self.assignments
    }

    /// No field was present; the statement must not be executed.
    pub fn is_noop(&self) -> bool {
        self.built.is_none()
    }

    pub fn sql(&self) -> Option<&str> {
        self.built.as_ref().map(BuiltStatement::sql)
    }

    pub fn args(&self) -> Option<&ArgumentList> {
        self.built.as_ref().map(BuiltStatement::args)
    }

    pub fn built(&self) -> Option<&BuiltStatement> {
        self.built.as_ref()
    }

    pub fn into_built(self) -> Option<BuiltStatement> {
        self.built
    }
}

fn check_template_params(
    stmt: &Statement,
    args: &ArgumentList,
    resource: &str,
) -> LedgerResult<()> {
    let placeholders = stmt.check_ordinals()?;
    if placeholders != args.len() {
        return Err(LedgerError::structural(format!(
            "{resource} template has {placeholders} placeholders but {} template arguments",
            args.len()
        )));
    }
    Ok(())
}

fn apply_filter(stmt: &mut Statement, args: &mut ArgumentList, filter: Filter) -> LedgerResult<()> {
    match filter {
        Filter::Compare { column, op, value } => {
            let ordinal = args.push_param(value);
            stmt.add_predicate(Predicate::compare(descriptor_ident(column)?, op, ordinal))
        }
        Filter::Contains { column, text } => {
            let ordinal = args.push(contains_pattern(&text));
            stmt.add_predicate(Predicate::like(
                descriptor_ident(column)?,
                LikeOp::ILike,
                ordinal,
            ))
        }
        Filter::Null { column, is_null } => {
            let column = descriptor_ident(column)?;
            stmt.add_predicate(if is_null {
                Predicate::is_null(column)
            } else {
                Predicate::is_not_null(column)
            })
        }
        Filter::EitherEq { left, right, value } => {
            let left_ordinal = args.push_param(value.clone());
            let right_ordinal = args.push_param(value);
            stmt.add_any_predicate(
                Predicate::compare(descriptor_ident(left)?, CompareOp::Eq, left_ordinal),
                Predicate::compare(descriptor_ident(right)?, CompareOp::Eq, right_ordinal),
            )
        }
    }
}

/// Resolve request sort tokens against the resource's sortable columns.
///
/// No tokens means the resource's default order.
pub(crate) fn sort_keys<R: Resource>(tokens: &[String]) -> LedgerResult<Vec<SortKey>> {
    let tokens = SortToken::parse_all(tokens)?;
    if tokens.is_empty() {
        return R::DEFAULT_SORT
            .iter()
            .map(|d| Ok(SortKey::new(descriptor_ident(d.column)?, d.dir)))
            .collect();
    }

    let mut seen: Vec<&'static str> = Vec::with_capacity(tokens.len());
    let mut keys = Vec::with_capacity(tokens.len());
    for token in tokens {
        let column = R::SORT_COLUMNS
            .iter()
            .find(|c| c.name == token.column)
            .ok_or_else(|| {
                let allowed: Vec<&str> = R::SORT_COLUMNS.iter().map(|c| c.name).collect();
                LedgerError::validation(format!(
                    "cannot sort {} by '{}', expected one of: {}",
                    R::NAME,
                    token.column,
                    allowed.join(", ")
                ))
            })?;
        if seen.contains(&column.name) {
            return Err(LedgerError::validation(format!(
                "sort column '{}' given more than once",
                column.name
            )));
        }
        seen.push(column.name);
        keys.push(
            SortKey::new(descriptor_ident(column.column)?, token.dir).with_nulls(token.nulls),
        );
    }
    Ok(keys)
}

fn paging_literal(field: &str, n: i64) -> LedgerResult<i32> {
    i32::try_from(n).map_err(|_| LedgerError::validation(format!("{field} {n} is out of range")))
}

/// Descriptor identifiers are constants, so a bad one is a Structural error.
fn descriptor_ident(s: &str) -> LedgerResult<Ident> {
    Ident::parse(s)
        .map_err(|e| LedgerError::structural(format!("invalid descriptor identifier '{s}': {e}")))
}
