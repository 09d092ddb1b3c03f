//! List/Count/Patch against a live Postgres.
//!
//! Runs only when `DATABASE_URL` is set (a `.env` file works too). Every test
//! creates its tables as temporary tables inside a transaction that is rolled
//! back, so nothing is left behind.

use ledgersql::{
    AccountKey, AccountListRequest, AccountPatch, Accounts, GenericClient, LedgerError,
    LedgerResult, QueryBuilder, TransactionListRequest, Transactions, decode_str, repo,
};
use tokio_postgres::NoTls;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TEMP TABLE tenants (
        id uuid PRIMARY KEY,
        display_name text NOT NULL,
        icon text,
        created_at timestamptz NOT NULL DEFAULT now(),
        updated_at timestamptz NOT NULL DEFAULT now()
    )",
    "CREATE TEMP TABLE accounts (
        id uuid PRIMARY KEY,
        tenant_id uuid NOT NULL REFERENCES tenants (id),
        parent_id uuid REFERENCES accounts (id),
        display_name text NOT NULL,
        icon text,
        created_at timestamptz NOT NULL DEFAULT now(),
        updated_at timestamptz NOT NULL DEFAULT now()
    )",
    "CREATE TEMP TABLE transactions (
        id uuid PRIMARY KEY,
        tenant_id uuid NOT NULL REFERENCES tenants (id),
        source_account_id uuid NOT NULL REFERENCES accounts (id),
        target_account_id uuid NOT NULL REFERENCES accounts (id),
        amount bigint NOT NULL,
        booked_on date NOT NULL,
        description text,
        created_at timestamptz NOT NULL DEFAULT now(),
        updated_at timestamptz NOT NULL DEFAULT now()
    )",
];

fn database_url(test: &str) -> Option<String> {
    dotenvy::dotenv().ok();
    match std::env::var("DATABASE_URL") {
        Ok(v) => Some(v),
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            None
        }
    }
}

async fn connect(url: &str) -> LedgerResult<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(url, NoTls)
        .await
        .map_err(LedgerError::from_db_error)?;
    tokio::spawn(async move {
        let _ = connection.await;
    });
    Ok(client)
}

async fn create_schema(client: &impl GenericClient) -> LedgerResult<()> {
    for ddl in SCHEMA {
        client.execute(ddl, &[]).await?;
    }
    Ok(())
}

async fn insert_tenant(client: &impl GenericClient, name: &str) -> LedgerResult<Uuid> {
    let id = Uuid::new_v4();
    client
        .execute(
            "INSERT INTO tenants (id, display_name) VALUES ($1, $2)",
            &[&id, &name],
        )
        .await?;
    Ok(id)
}

async fn insert_account(
    client: &impl GenericClient,
    tenant_id: Uuid,
    name: &str,
    icon: Option<&str>,
) -> LedgerResult<Uuid> {
    let id = Uuid::new_v4();
    client
        .execute(
            "INSERT INTO accounts (id, tenant_id, display_name, icon) VALUES ($1, $2, $3, $4)",
            &[&id, &tenant_id, &name, &icon],
        )
        .await?;
    Ok(id)
}

#[tokio::test]
async fn list_pages_and_counts_matching_rows() -> LedgerResult<()> {
    let Some(url) = database_url("list_pages_and_counts_matching_rows") else {
        return Ok(());
    };
    let mut client = connect(&url).await?;
    let tx = client
        .transaction()
        .await
        .map_err(LedgerError::from_db_error)?;
    create_schema(&tx).await?;

    let tenant = insert_tenant(&tx, "Acme").await?;
    let other_tenant = insert_tenant(&tx, "Globex").await?;
    for name in ["Root E", "Root C", "Root A", "Root D", "Root B"] {
        insert_account(&tx, tenant, name, None).await?;
    }
    insert_account(&tx, tenant, "Savings", None).await?;
    insert_account(&tx, other_tenant, "Root X", None).await?;

    let builder = QueryBuilder::<Accounts>::default();
    let req = AccountListRequest {
        display_name: Some("Root".into()),
        sort: vec!["displayName:ASC".into()],
        count: Some(3),
        offset: Some(0),
        ..Default::default()
    };
    let page = repo::list(&tx, &builder, &tenant, &req).await?;

    let names: Vec<&str> = page.items.iter().map(|a| a.display_name.as_str()).collect();
    assert_eq!(names, ["Root A", "Root B", "Root C"]);
    assert_eq!(page.total_count, 5);
    assert_eq!(repo::count(&tx, &builder, &tenant, &req).await?, 5);

    let second = AccountListRequest {
        offset: Some(3),
        ..req.clone()
    };
    let page = repo::list(&tx, &builder, &tenant, &second).await?;
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_count, 5);

    let by_tenant_name = AccountListRequest {
        tenant_display_name: Some("glob".into()),
        ..Default::default()
    };
    let page = repo::list(&tx, &builder, &tenant, &by_tenant_name).await?;
    assert!(page.items.is_empty());
    assert_eq!(page.total_count, 0);

    tx.rollback().await.map_err(LedgerError::from_db_error)?;
    Ok(())
}

#[tokio::test]
async fn patch_applies_present_fields_only() -> LedgerResult<()> {
    let Some(url) = database_url("patch_applies_present_fields_only") else {
        return Ok(());
    };
    let mut client = connect(&url).await?;
    let tx = client
        .transaction()
        .await
        .map_err(LedgerError::from_db_error)?;
    create_schema(&tx).await?;

    let tenant = insert_tenant(&tx, "Acme").await?;
    let id = insert_account(&tx, tenant, "Wallet", Some("wallet")).await?;
    let key = AccountKey {
        tenant_id: tenant,
        id,
    };
    let builder = QueryBuilder::<Accounts>::default();

    let patch = decode_str::<AccountPatch>(r#"{"icon": null}"#)?;
    assert_eq!(repo::patch(&tx, &builder, &key, &patch).await?, 1);

    let row = tx
        .query_one(
            "SELECT display_name, icon FROM accounts WHERE id = $1",
            &[&id],
        )
        .await?;
    let name: String = row.get(0);
    let icon: Option<String> = row.get(1);
    assert_eq!(name, "Wallet");
    assert_eq!(icon, None);

    let empty = decode_str::<AccountPatch>("{}")?;
    assert_eq!(repo::patch(&tx, &builder, &key, &empty).await?, 0);

    // wrong tenant matches nothing
    let foreign = AccountKey {
        tenant_id: Uuid::new_v4(),
        id,
    };
    let rename = decode_str::<AccountPatch>(r#"{"displayName": "Pocket"}"#)?;
    assert_eq!(repo::patch(&tx, &builder, &foreign, &rename).await?, 0);

    tx.rollback().await.map_err(LedgerError::from_db_error)?;
    Ok(())
}

#[tokio::test]
async fn transaction_account_filter_matches_either_side() -> LedgerResult<()> {
    let Some(url) = database_url("transaction_account_filter_matches_either_side") else {
        return Ok(());
    };
    let mut client = connect(&url).await?;
    let tx = client
        .transaction()
        .await
        .map_err(LedgerError::from_db_error)?;
    create_schema(&tx).await?;

    let tenant = insert_tenant(&tx, "Acme").await?;
    let checking = insert_account(&tx, tenant, "Checking", None).await?;
    let savings = insert_account(&tx, tenant, "Savings", None).await?;
    let rent = insert_account(&tx, tenant, "Rent", None).await?;

    let booked_on = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    for (source, target, amount) in [
        (checking, savings, 500_i64),
        (savings, checking, 200),
        (checking, rent, 1200),
        (savings, rent, 50),
    ] {
        tx.execute(
            "INSERT INTO transactions (id, tenant_id, source_account_id, target_account_id, amount, booked_on) \
             VALUES ($1, $2, $3, $4, $5, $6)",
            &[&Uuid::new_v4(), &tenant, &source, &target, &amount, &booked_on],
        )
        .await?;
    }

    let builder = QueryBuilder::<Transactions>::default();
    let req = TransactionListRequest {
        account_id: Some(checking),
        sort: vec!["amount:ASC".into()],
        ..Default::default()
    };
    let page = repo::list(&tx, &builder, &tenant, &req).await?;
    let amounts: Vec<i64> = page.items.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, [200, 500, 1200]);
    assert_eq!(page.total_count, 3);

    let req = TransactionListRequest {
        target_account_name: Some("rent".into()),
        min_amount: Some(100),
        ..Default::default()
    };
    let page = repo::list(&tx, &builder, &tenant, &req).await?;
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].amount, 1200);

    tx.rollback().await.map_err(LedgerError::from_db_error)?;
    Ok(())
}

#[cfg(feature = "pool")]
#[tokio::test]
async fn pooled_client_runs_built_statements() -> LedgerResult<()> {
    let Some(url) = database_url("pooled_client_runs_built_statements") else {
        return Ok(());
    };
    let pool = ledgersql::pool::create_pool(&url, 2)?;
    let client = pool.get().await?;

    // Temp tables live for the session, so everything below stays on one connection.
    create_schema(&client).await?;
    let tenant = insert_tenant(&client, "Acme").await?;
    insert_account(&client, tenant, "Root", None).await?;

    let builder = QueryBuilder::<Accounts>::default();
    let total = repo::count(&client, &builder, &tenant, &AccountListRequest::default()).await?;
    assert_eq!(total, 1);

    for table in ["transactions", "accounts", "tenants"] {
        client
            .execute(&format!("DROP TABLE pg_temp.{table}"), &[])
            .await?;
    }
    Ok(())
}
