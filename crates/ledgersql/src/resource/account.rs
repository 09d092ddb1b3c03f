use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio_postgres::Row;
use uuid::Uuid;

use super::{DefaultSort, Filter, JoinSpec, PatchField, Resource, SortColumn};
use crate::error::{LedgerError, LedgerResult};
use crate::param::{ArgumentList, Param};
use crate::presence::FieldSet;
use crate::row::{FromRow, RowExt};
use crate::stmt::{JoinKind, SortDir};

/// Accounts form a per-tenant tree through `parent_id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accounts;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub display_name: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Account {
    fn from_row(row: &Row) -> LedgerResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            tenant_id: row.try_get_column("tenant_id")?,
            parent_id: row.try_get_column("parent_id")?,
            display_name: row.try_get_column("display_name")?,
            icon: row.try_get_column("icon")?,
            created_at: row.try_get_column("created_at")?,
            updated_at: row.try_get_column("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountKey {
    pub tenant_id: Uuid,
    pub id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct AccountListRequest {
    pub parent_id: Option<Uuid>,
    /// Only accounts without a parent.
    pub root_only: Option<bool>,
    pub display_name: Option<String>,
    pub tenant_display_name: Option<String>,
    pub sort: Vec<String>,
    pub count: Option<i64>,
    pub offset: Option<i64>,
}

impl_list_options!(AccountListRequest);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountPatch {
    pub display_name: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<Uuid>,
}

impl FieldSet for AccountPatch {
    const FIELDS: &'static [&'static str] = &["displayName", "icon", "parentId"];
}

impl Resource for Accounts {
    const NAME: &'static str = "account";
    const ALIAS: &'static str = "a";
    const LIST_TEMPLATE: &'static str = "SELECT a.id, a.tenant_id, a.parent_id, a.display_name, \
         a.icon, a.created_at, a.updated_at FROM accounts a WHERE a.tenant_id = $1";
    const PATCH_TEMPLATE: &'static str =
        "UPDATE accounts SET updated_at = now() WHERE id = $1 AND tenant_id = $2";
    const JOINS: &'static [JoinSpec] = &[JoinSpec {
        alias: "tn",
        table: "tenants",
        kind: JoinKind::Inner,
        on: ("tn.id", "a.tenant_id"),
    }];
    const SORT_COLUMNS: &'static [SortColumn] = &[
        SortColumn {
            name: "displayName",
            column: "a.display_name",
        },
        SortColumn {
            name: "createdAt",
            column: "a.created_at",
        },
        SortColumn {
            name: "updatedAt",
            column: "a.updated_at",
        },
    ];
    const DEFAULT_SORT: &'static [DefaultSort] = &[
        DefaultSort {
            column: "a.display_name",
            dir: SortDir::Asc,
        },
        DefaultSort {
            column: "a.id",
            dir: SortDir::Asc,
        },
    ];
    const PATCH_FIELDS: &'static [PatchField] = &[
        PatchField {
            name: "displayName",
            column: "display_name",
        },
        PatchField {
            name: "icon",
            column: "icon",
        },
        PatchField {
            name: "parentId",
            column: "parent_id",
        },
    ];

    /// Owning tenant id.
    type Scope = Uuid;
    type ListRequest = AccountListRequest;
    type Patch = AccountPatch;
    type Key = AccountKey;
    type Row = Account;

    fn scope_params(tenant_id: &Uuid, args: &mut ArgumentList) {
        args.push(*tenant_id);
    }

    fn filters(req: &AccountListRequest) -> LedgerResult<Vec<Filter>> {
        if req.parent_id.is_some() && req.root_only == Some(true) {
            return Err(LedgerError::validation(
                "parentId cannot be combined with rootOnly: true",
            ));
        }

        let mut filters = Vec::new();
        if let Some(parent_id) = req.parent_id {
            filters.push(Filter::eq("a.parent_id", parent_id));
        }
        if req.root_only == Some(true) {
            filters.push(Filter::null("a.parent_id", true));
        }
        if let Some(name) = &req.display_name {
            filters.push(Filter::contains("a.display_name", name.as_str()));
        }
        if let Some(name) = &req.tenant_display_name {
            filters.push(Filter::contains("tn.display_name", name.as_str()));
        }
        Ok(filters)
    }

    fn key_params(key: &AccountKey, args: &mut ArgumentList) {
        args.push(key.id);
        args.push(key.tenant_id);
    }

    fn assignment(patch: &AccountPatch, field: &'static str) -> LedgerResult<Param> {
        match field {
            "displayName" => patch
                .display_name
                .clone()
                .map(Param::new)
                .ok_or_else(|| LedgerError::validation("displayName cannot be null")),
            "icon" => Ok(Param::new(patch.icon.clone())),
            // null moves the account to the root
            "parentId" => Ok(Param::new(patch.parent_id)),
            other => Err(LedgerError::structural(format!(
                "account has no patch field '{other}'"
            ))),
        }
    }
}
