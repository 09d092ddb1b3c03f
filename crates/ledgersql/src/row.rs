//! Row mapping traits.

use crate::error::{LedgerError, LedgerResult};
use tokio_postgres::Row;

/// Trait for types that can be built from a database row.
///
/// ```ignore
/// impl FromRow for Tenant {
///     fn from_row(row: &Row) -> LedgerResult<Self> {
///         Ok(Self {
///             id: row.try_get_column("id")?,
///             display_name: row.try_get_column("display_name")?,
///             // ...
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> LedgerResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning LedgerError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> LedgerResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> LedgerResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| LedgerError::decode(column, e.to_string()))
    }
}
