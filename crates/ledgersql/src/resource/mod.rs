//! Per-resource descriptors and the generic builder engine.
//!
//! A [`Resource`] is pure data plus three small mapping functions: template
//! text, alias, join targets, sortable columns, and how a request turns into
//! filters and a patch into assignments. [`QueryBuilder`] does all the tree
//! work for every resource.
//!
//! ```ignore
//! use ledgersql::resource::{Accounts, AccountListRequest, QueryBuilder};
//!
//! let builder = QueryBuilder::<Accounts>::new(BuilderConfig::default());
//! let req = AccountListRequest {
//!     display_name: Some("Root".into()),
//!     sort: vec!["displayName:ASC".into()],
//!     count: Some(3),
//!     ..Default::default()
//! };
//! let list = builder.build_list(&tenant_id, &req)?;
//! let count = builder.derive_count(&list)?;
//! ```

/// Implements [`ListOptions`] for a request struct with `sort`, `count` and
/// `offset` fields.
macro_rules! impl_list_options {
    ($ty:ty) => {
        impl $crate::resource::ListOptions for $ty {
            fn sort(&self) -> &[String] {
                &self.sort
            }

            fn count(&self) -> Option<i64> {
                self.count
            }

            fn offset(&self) -> Option<i64> {
                self.offset
            }
        }
    };
}

mod account;
mod engine;
mod tenant;
mod transaction;


pub use account::{Account, AccountKey, AccountListRequest, AccountPatch, Accounts};
pub use engine::{PatchStatement, QueryBuilder};
pub use tenant::{Tenant, TenantListRequest, TenantPatch, Tenants};
pub use transaction::{
    Transaction, TransactionKey, TransactionListRequest, TransactionPatch, Transactions,
};

use serde::de::DeserializeOwned;
use tokio_postgres::types::ToSql;

use crate::error::LedgerResult;
use crate::param::{ArgumentList, Param};
use crate::presence::FieldSet;
use crate::row::FromRow;
use crate::stmt::{CompareOp, JoinKind, SortDir};

/// A related table a filter may pull in, joined at most once.
#[derive(Debug, Clone, Copy)]
pub struct JoinSpec {
    pub alias: &'static str,
    pub table: &'static str,
    pub kind: JoinKind,
    /// Equality ON condition, both sides alias-qualified.
    pub on: (&'static str, &'static str),
}

/// Wire sort name mapped to an alias-qualified column.
#[derive(Debug, Clone, Copy)]
pub struct SortColumn {
    pub name: &'static str,
    pub column: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct DefaultSort {
    pub column: &'static str,
    pub dir: SortDir,
}

/// A patchable wire field and the column it writes.
#[derive(Debug, Clone, Copy)]
pub struct PatchField {
    pub name: &'static str,
    pub column: &'static str,
}

/// A present filter, lowered by the engine into one WHERE conjunct.
///
/// Columns are alias-qualified. A column under an alias other than the
/// resource's own makes the engine add the matching [`JoinSpec`].
#[derive(Debug, Clone)]
pub enum Filter {
    /// `column <op> $n`
    Compare {
        column: &'static str,
        op: CompareOp,
        value: Param,
    },
    /// `column ILIKE '%text%'`, with `text` escaped
    Contains { column: &'static str, text: String },
    /// `column IS NULL` / `column IS NOT NULL`
    Null { column: &'static str, is_null: bool },
    /// `(left = $n OR right = $n+1)`, both bound to the same value
    EitherEq {
        left: &'static str,
        right: &'static str,
        value: Param,
    },
}

impl Filter {
    pub fn compare<T: ToSql + Send + Sync + 'static>(
        column: &'static str,
        op: CompareOp,
        value: T,
    ) -> Self {
        Filter::Compare {
            column,
            op,
            value: Param::new(value),
        }
    }

    pub fn eq<T: ToSql + Send + Sync + 'static>(column: &'static str, value: T) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn contains(column: &'static str, text: impl Into<String>) -> Self {
        Filter::Contains {
            column,
            text: text.into(),
        }
    }

    pub fn null(column: &'static str, is_null: bool) -> Self {
        Filter::Null { column, is_null }
    }

    pub fn either_eq<T: ToSql + Send + Sync + 'static>(
        left: &'static str,
        right: &'static str,
        value: T,
    ) -> Self {
        Filter::EitherEq {
            left,
            right,
            value: Param::new(value),
        }
    }

    pub fn columns(&self) -> Vec<&'static str> {
        match self {
            Filter::Compare { column, .. }
            | Filter::Contains { column, .. }
            | Filter::Null { column, .. } => vec![*column],
            Filter::EitherEq { left, right, .. } => vec![*left, *right],
        }
    }
}

/// Sort and paging fields shared by every list request.
pub trait ListOptions {
    fn sort(&self) -> &[String];
    fn count(&self) -> Option<i64>;
    fn offset(&self) -> Option<i64>;
}

/// Declarative description of one resource.
pub trait Resource: Sized + 'static {
    const NAME: &'static str;
    const ALIAS: &'static str;
    const LIST_TEMPLATE: &'static str;
    const PATCH_TEMPLATE: &'static str;
    const JOINS: &'static [JoinSpec];
    const SORT_COLUMNS: &'static [SortColumn];
    const DEFAULT_SORT: &'static [DefaultSort];
    /// Patchable fields, in the order their SET targets are emitted.
    const PATCH_FIELDS: &'static [PatchField];

    /// What a list is scoped to, bound to the list template's own placeholders.
    type Scope;
    type ListRequest: ListOptions + DeserializeOwned + Default;
    type Patch: FieldSet + DeserializeOwned;
    /// Row identity, bound to the patch template's own placeholders.
    type Key;
    type Row: FromRow;

    fn scope_params(scope: &Self::Scope, args: &mut ArgumentList);

    /// Present filters in priority order. Rejects incompatible combinations.
    fn filters(req: &Self::ListRequest) -> LedgerResult<Vec<Filter>>;

    fn key_params(key: &Self::Key, args: &mut ArgumentList);

    /// The value to write for a present patch field.
    fn assignment(patch: &Self::Patch, field: &'static str) -> LedgerResult<Param>;
}
