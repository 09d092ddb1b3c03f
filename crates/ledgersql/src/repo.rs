//! Executes built statements through a caller-provided client.
//!
//! Nothing here opens or ends a transaction: pass a `tokio_postgres::Transaction`
//! as the client to run inside one.

use crate::client::GenericClient;
use crate::error::{LedgerError, LedgerResult};
use crate::presence::Presence;
use crate::resource::{QueryBuilder, Resource};
use crate::row::FromRow;
use crate::stmt::BuiltStatement;

/// One page of a list plus the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
}

/// Run the list statement for `req` and its count derivative.
pub async fn list<R, C>(
    client: &C,
    builder: &QueryBuilder<R>,
    scope: &R::Scope,
    req: &R::ListRequest,
) -> LedgerResult<Page<R::Row>>
where
    R: Resource,
    C: GenericClient,
{
    let list = builder.build_list(scope, req)?;
    let count = builder.derive_count(&list)?;

    let rows = client.query(list.sql(), &list.params_ref()).await?;
    let items = rows
        .iter()
        .map(<R::Row as FromRow>::from_row)
        .collect::<LedgerResult<Vec<_>>>()?;
    let total_count = fetch_count(client, &count).await?;

    tracing::trace!(
        target: "ledgersql.sql",
        resource = R::NAME,
        rows = items.len(),
        total_count,
    );
    Ok(Page { items, total_count })
}

/// Run only the count statement for `req`.
pub async fn count<R, C>(
    client: &C,
    builder: &QueryBuilder<R>,
    scope: &R::Scope,
    req: &R::ListRequest,
) -> LedgerResult<i64>
where
    R: Resource,
    C: GenericClient,
{
    let count = builder.build_count(scope, req)?;
    fetch_count(client, &count).await
}

/// Apply a patch; returns the number of updated rows.
///
/// A patch without present fields is never sent and reports `0`.
pub async fn patch<R, C>(
    client: &C,
    builder: &QueryBuilder<R>,
    key: &R::Key,
    patch: &Presence<R::Patch>,
) -> LedgerResult<u64>
where
    R: Resource,
    C: GenericClient,
{
    let statement = builder.build_patch(key, patch)?;
    let Some(built) = statement.built() else {
        tracing::debug!(
            target: "ledgersql.sql",
            resource = R::NAME,
            "patch has no fields, skipping execution"
        );
        return Ok(0);
    };

    let affected = client.execute(built.sql(), &built.params_ref()).await?;
    tracing::trace!(target: "ledgersql.sql", resource = R::NAME, affected);
    Ok(affected)
}

async fn fetch_count<C: GenericClient>(client: &C, count: &BuiltStatement) -> LedgerResult<i64> {
    let row = client.query_one(count.sql(), &count.params_ref()).await?;
    row.try_get(0)
        .map_err(|e| LedgerError::decode("count", e.to_string()))
}
