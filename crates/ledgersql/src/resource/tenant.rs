use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio_postgres::Row;
use uuid::Uuid;

use super::{DefaultSort, Filter, JoinSpec, PatchField, Resource, SortColumn};
use crate::error::{LedgerError, LedgerResult};
use crate::param::{ArgumentList, Param};
use crate::presence::FieldSet;
use crate::row::{FromRow, RowExt};
use crate::stmt::SortDir;

/// Tenants are the top-level scope; listing them is not tenant-scoped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tenants;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    pub id: Uuid,
    pub display_name: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Tenant {
    fn from_row(row: &Row) -> LedgerResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            display_name: row.try_get_column("display_name")?,
            icon: row.try_get_column("icon")?,
            created_at: row.try_get_column("created_at")?,
            updated_at: row.try_get_column("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TenantListRequest {
    /// Case-insensitive substring match.
    pub display_name: Option<String>,
    pub has_icon: Option<bool>,
    pub sort: Vec<String>,
    pub count: Option<i64>,
    pub offset: Option<i64>,
}

impl_list_options!(TenantListRequest);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantPatch {
    pub display_name: Option<String>,
    pub icon: Option<String>,
}

impl FieldSet for TenantPatch {
    const FIELDS: &'static [&'static str] = &["displayName", "icon"];
}

impl Resource for Tenants {
    const NAME: &'static str = "tenant";
    const ALIAS: &'static str = "t";
    const LIST_TEMPLATE: &'static str =
        "SELECT t.id, t.display_name, t.icon, t.created_at, t.updated_at FROM tenants t";
    const PATCH_TEMPLATE: &'static str = "UPDATE tenants SET updated_at = now() WHERE id = $1";
    const JOINS: &'static [JoinSpec] = &[];
    const SORT_COLUMNS: &'static [SortColumn] = &[
        SortColumn {
            name: "displayName",
            column: "t.display_name",
        },
        SortColumn {
            name: "createdAt",
            column: "t.created_at",
        },
        SortColumn {
            name: "updatedAt",
            column: "t.updated_at",
        },
    ];
    const DEFAULT_SORT: &'static [DefaultSort] = &[
        DefaultSort {
            column: "t.display_name",
            dir: SortDir::Asc,
        },
        DefaultSort {
            column: "t.id",
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
    ];

    type Scope = ();
    type ListRequest = TenantListRequest;
    type Patch = TenantPatch;
    type Key = Uuid;
    type Row = Tenant;

    fn scope_params(_scope: &(), _args: &mut ArgumentList) {}

    fn filters(req: &TenantListRequest) -> LedgerResult<Vec<Filter>> {
        let mut filters = Vec::new();
        if let Some(name) = &req.display_name {
            filters.push(Filter::contains("t.display_name", name.as_str()));
        }
        if let Some(has_icon) = req.has_icon {
            filters.push(Filter::null("t.icon", !has_icon));
        }
        Ok(filters)
    }

    fn key_params(id: &Uuid, args: &mut ArgumentList) {
        args.push(*id);
    }

    fn assignment(patch: &TenantPatch, field: &'static str) -> LedgerResult<Param> {
        match field {
            "displayName" => patch
                .display_name
                .clone()
                .map(Param::new)
                .ok_or_else(|| LedgerError::validation("displayName cannot be null")),
            "icon" => Ok(Param::new(patch.icon.clone())),
            other => Err(LedgerError::structural(format!(
                "tenant has no patch field '{other}'"
            ))),
        }
    }
}
