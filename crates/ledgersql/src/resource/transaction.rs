use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tokio_postgres::Row;
use uuid::Uuid;

use super::{DefaultSort, Filter, JoinSpec, PatchField, Resource, SortColumn};
use crate::error::{LedgerError, LedgerResult};
use crate::param::{ArgumentList, Param};
use crate::presence::FieldSet;
use crate::row::{FromRow, RowExt};
use crate::stmt::{CompareOp, JoinKind, SortDir};

/// Transfers between two accounts of the same tenant.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transactions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub source_account_id: Uuid,
    pub target_account_id: Uuid,
    /// Minor currency units.
    pub amount: i64,
    pub booked_on: NaiveDate,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Transaction {
    fn from_row(row: &Row) -> LedgerResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            tenant_id: row.try_get_column("tenant_id")?,
            source_account_id: row.try_get_column("source_account_id")?,
            target_account_id: row.try_get_column("target_account_id")?,
            amount: row.try_get_column("amount")?,
            booked_on: row.try_get_column("booked_on")?,
            description: row.try_get_column("description")?,
            created_at: row.try_get_column("created_at")?,
            updated_at: row.try_get_column("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionKey {
    pub tenant_id: Uuid,
    pub id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TransactionListRequest {
    /// Either side of the transfer.
    pub account_id: Option<Uuid>,
    pub source_account_id: Option<Uuid>,
    pub target_account_id: Option<Uuid>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
    pub description: Option<String>,
    pub source_account_name: Option<String>,
    pub target_account_name: Option<String>,
    pub sort: Vec<String>,
    pub count: Option<i64>,
    pub offset: Option<i64>,
}

impl_list_options!(TransactionListRequest);

impl TransactionListRequest {
    fn validate(&self) -> LedgerResult<()> {
        if self.account_id.is_some()
            && (self.source_account_id.is_some() || self.target_account_id.is_some())
        {
            return Err(LedgerError::validation(
                "accountId cannot be combined with sourceAccountId or targetAccountId",
            ));
        }
        if let (Some(min), Some(max)) = (self.min_date, self.max_date) {
            if min > max {
                return Err(LedgerError::validation(format!(
                    "minDate {min} is after maxDate {max}"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min_amount, self.max_amount) {
            if min > max {
                return Err(LedgerError::validation(format!(
                    "minAmount {min} is greater than maxAmount {max}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionPatch {
    pub description: Option<String>,
    pub amount: Option<i64>,
    pub booked_on: Option<NaiveDate>,
}

impl FieldSet for TransactionPatch {
    const FIELDS: &'static [&'static str] = &["description", "amount", "bookedOn"];
}

impl Resource for Transactions {
    const NAME: &'static str = "transaction";
    const ALIAS: &'static str = "tx";
    const LIST_TEMPLATE: &'static str = "SELECT tx.id, tx.tenant_id, tx.source_account_id, \
         tx.target_account_id, tx.amount, tx.booked_on, tx.description, tx.created_at, \
         tx.updated_at FROM transactions tx WHERE tx.tenant_id = $1";
    const PATCH_TEMPLATE: &'static str =
        "UPDATE transactions SET updated_at = now() WHERE id = $1 AND tenant_id = $2";
    const JOINS: &'static [JoinSpec] = &[
        JoinSpec {
            alias: "sa",
            table: "accounts",
            kind: JoinKind::Inner,
            on: ("sa.id", "tx.source_account_id"),
        },
        JoinSpec {
            alias: "ta",
            table: "accounts",
            kind: JoinKind::Inner,
            on: ("ta.id", "tx.target_account_id"),
        },
    ];
    const SORT_COLUMNS: &'static [SortColumn] = &[
        SortColumn {
            name: "bookedOn",
            column: "tx.booked_on",
        },
        SortColumn {
            name: "amount",
            column: "tx.amount",
        },
        SortColumn {
            name: "description",
            column: "tx.description",
        },
        SortColumn {
            name: "createdAt",
            column: "tx.created_at",
        },
    ];
    const DEFAULT_SORT: &'static [DefaultSort] = &[
        DefaultSort {
            column: "tx.booked_on",
            dir: SortDir::Desc,
        },
        DefaultSort {
            column: "tx.id",
            dir: SortDir::Desc,
        },
    ];
    const PATCH_FIELDS: &'static [PatchField] = &[
        PatchField {
            name: "description",
            column: "description",
        },
        PatchField {
            name: "amount",
            column: "amount",
        },
        PatchField {
            name: "bookedOn",
            column: "booked_on",
        },
    ];

    type Scope = Uuid;
    type ListRequest = TransactionListRequest;
    type Patch = TransactionPatch;
    type Key = TransactionKey;
    type Row = Transaction;

    fn scope_params(tenant_id: &Uuid, args: &mut ArgumentList) {
        args.push(*tenant_id);
    }

    fn filters(req: &TransactionListRequest) -> LedgerResult<Vec<Filter>> {
        req.validate()?;

        let mut filters = Vec::new();
        if let Some(id) = req.account_id {
            filters.push(Filter::either_eq(
                "tx.source_account_id",
                "tx.target_account_id",
                id,
            ));
        }
        if let Some(id) = req.source_account_id {
            filters.push(Filter::eq("tx.source_account_id", id));
        }
        if let Some(id) = req.target_account_id {
            filters.push(Filter::eq("tx.target_account_id", id));
        }
        if let Some(date) = req.min_date {
            filters.push(Filter::compare("tx.booked_on", CompareOp::Gte, date));
        }
        if let Some(date) = req.max_date {
            filters.push(Filter::compare("tx.booked_on", CompareOp::Lte, date));
        }
        if let Some(amount) = req.min_amount {
            filters.push(Filter::compare("tx.amount", CompareOp::Gte, amount));
        }
        if let Some(amount) = req.max_amount {
            filters.push(Filter::compare("tx.amount", CompareOp::Lte, amount));
        }
        if let Some(text) = &req.description {
            filters.push(Filter::contains("tx.description", text.as_str()));
        }
        if let Some(name) = &req.source_account_name {
            filters.push(Filter::contains("sa.display_name", name.as_str()));
        }
        if let Some(name) = &req.target_account_name {
            filters.push(Filter::contains("ta.display_name", name.as_str()));
        }
        Ok(filters)
    }

    fn key_params(key: &TransactionKey, args: &mut ArgumentList) {
        args.push(key.id);
        args.push(key.tenant_id);
    }

    fn assignment(patch: &TransactionPatch, field: &'static str) -> LedgerResult<Param> {
        match field {
            "description" => Ok(Param::new(patch.description.clone())),
            "amount" => patch
                .amount
                .map(Param::new)
                .ok_or_else(|| LedgerError::validation("amount cannot be null")),
            "bookedOn" => patch
                .booked_on
                .map(Param::new)
                .ok_or_else(|| LedgerError::validation("bookedOn cannot be null")),
            other => Err(LedgerError::structural(format!(
                "transaction has no patch field '{other}'"
            ))),
        }
    }
}
