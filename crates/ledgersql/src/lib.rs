//! # ledgersql
//!
//! Template-driven statement construction for a multi-tenant ledger
//! (tenants, accounts, transactions).
//!
//! ## Features
//!
//! - **Templates, not string building**: every statement starts from a constant
//!   SQL template parsed by libpg_query; filters, joins, sorting and paging are
//!   tree edits, and the text is rendered back by the Postgres deparser
//! - **Positional arguments only**: request values are always bound as `$n`
//!   placeholders; ordinals are checked to run `$1..$n` without gaps
//! - **Count mirrors List**: the count statement is derived from the rendered
//!   list statement, so both select exactly the same rows
//! - **PATCH presence tracking**: `{"icon": null}` clears a column, `{}` leaves
//!   it alone, and an empty patch is never executed
//! - **Transaction-friendly**: pass a transaction anywhere a `GenericClient` is expected
//!
//! ## Example
//!
//! ```ignore
//! use ledgersql::{Accounts, AccountListRequest, AccountKey, AccountPatch, QueryBuilder};
//!
//! let builder = QueryBuilder::<Accounts>::default();
//!
//! // SELECT ... FROM accounts a WHERE a.tenant_id = $1 AND a.display_name ILIKE $2
//! //   ORDER BY a.display_name ASC LIMIT 3
//! let page = ledgersql::repo::list(&client, &builder, &tenant_id, &AccountListRequest {
//!     display_name: Some("Root".into()),
//!     sort: vec!["displayName:ASC".into()],
//!     count: Some(3),
//!     ..Default::default()
//! }).await?;
//!
//! // UPDATE accounts SET updated_at = now(), icon = $3 WHERE id = $1 AND tenant_id = $2
//! let patch = ledgersql::decode::<AccountPatch>(body)?;
//! ledgersql::repo::patch(&client, &builder, &AccountKey { tenant_id, id }, &patch).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod ident;
pub mod param;
pub mod presence;
pub mod repo;
pub mod resource;
pub mod row;
pub mod stmt;

pub use client::GenericClient;
pub use config::BuilderConfig;
pub use error::{LedgerError, LedgerResult};
pub use ident::{Ident, IdentPart};
pub use param::{ArgumentList, Param};
pub use presence::{FieldSet, Presence, PresenceSet, decode, decode_str};
pub use repo::Page;
pub use resource::{
    Account, AccountKey, AccountListRequest, AccountPatch, Accounts, PatchStatement, QueryBuilder,
    Resource, Tenant, TenantListRequest, TenantPatch, Tenants, Transaction, TransactionKey,
    TransactionListRequest, TransactionPatch, Transactions,
};
pub use row::{FromRow, RowExt};
pub use stmt::{BuiltStatement, Statement, StatementKind};

#[cfg(feature = "pool")]
pub mod pool;
