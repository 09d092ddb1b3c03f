use std::fmt::Write as _;
use std::io::Read as _;
use std::path::Path;

use ledgersql::{
    AccountKey, Accounts, BuiltStatement, QueryBuilder, Resource, Tenants, TransactionKey,
    Transactions, decode_str,
};
use uuid::Uuid;

use crate::cli::{RenderArgs, ResourceKind, StatementArg};
use crate::config::ConfigFile;

/// Resolves a resource's scope and key from command-line flags.
pub trait Target: Resource {
    fn scope(args: &RenderArgs) -> anyhow::Result<Self::Scope>;
    fn key(args: &RenderArgs) -> anyhow::Result<Self::Key>;
    /// Scope used when no request is at hand, e.g. by `check`.
    fn sample_scope() -> Self::Scope;
}

impl Target for Tenants {
    fn scope(_: &RenderArgs) -> anyhow::Result<()> {
        Ok(())
    }

    fn key(args: &RenderArgs) -> anyhow::Result<Uuid> {
        require(args.id, "--id")
    }

    fn sample_scope() {}
}

impl Target for Accounts {
    fn scope(args: &RenderArgs) -> anyhow::Result<Uuid> {
        require(args.tenant, "--tenant")
    }

    fn key(args: &RenderArgs) -> anyhow::Result<AccountKey> {
        Ok(AccountKey {
            tenant_id: require(args.tenant, "--tenant")?,
            id: require(args.id, "--id")?,
        })
    }

    fn sample_scope() -> Uuid {
        Uuid::nil()
    }
}

impl Target for Transactions {
    fn scope(args: &RenderArgs) -> anyhow::Result<Uuid> {
        require(args.tenant, "--tenant")
    }

    fn key(args: &RenderArgs) -> anyhow::Result<TransactionKey> {
        Ok(TransactionKey {
            tenant_id: require(args.tenant, "--tenant")?,
            id: require(args.id, "--id")?,
        })
    }

    fn sample_scope() -> Uuid {
        Uuid::nil()
    }
}

fn require(value: Option<Uuid>, flag: &str) -> anyhow::Result<Uuid> {
    value.ok_or_else(|| anyhow::anyhow!("{flag} is required for this statement"))
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let config = ConfigFile::load(args.config.as_deref())?;
    let raw = read_input(args.input.as_deref())?;

    let out = match args.resource {
        ResourceKind::Tenant => render::<Tenants>(&args, config, &raw)?,
        ResourceKind::Account => render::<Accounts>(&args, config, &raw)?,
        ResourceKind::Transaction => render::<Transactions>(&args, config, &raw)?,
    };
    print!("{out}");
    Ok(())
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        None => Ok(String::new()),
        Some(p) if p == Path::new("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| anyhow::anyhow!("failed to read request from stdin: {e}"))?;
            Ok(buf)
        }
        Some(p) => std::fs::read_to_string(p)
            .map_err(|e| anyhow::anyhow!("failed to read request file {}: {e}", p.display())),
    }
}

/// Build the requested statement for `R` and format it for output.
pub fn render<R: Target>(
    args: &RenderArgs,
    config: ConfigFile,
    raw: &str,
) -> anyhow::Result<String> {
    let builder = QueryBuilder::<R>::new(config.builder);
    let body = if raw.trim().is_empty() { "{}" } else { raw };

    match args.statement {
        StatementArg::List | StatementArg::Count => {
            let req: R::ListRequest = serde_json::from_str(body)
                .map_err(|e| anyhow::anyhow!("invalid {} list request: {e}", R::NAME))?;
            let scope = R::scope(args)?;
            let built = if args.statement == StatementArg::List {
                builder.build_list(&scope, &req)?
            } else {
                builder.build_count(&scope, &req)?
            };
            Ok(format_built(&built))
        }
        StatementArg::Patch => {
            let key = R::key(args)?;
            let patch = decode_str::<R::Patch>(body)?;
            let statement = builder.build_patch(&key, &patch)?;
            match statement.built() {
                Some(built) => Ok(format_built(built)),
                None => Ok(format!(
                    "-- {} patch has no fields; nothing to execute\n",
                    R::NAME
                )),
            }
        }
    }
}

/// SQL on the first line, then one `-- $n: value` line per argument.
pub fn format_built(built: &BuiltStatement) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", built.sql());
    for (i, arg) in built.args().iter().enumerate() {
        let _ = writeln!(out, "-- ${}: {arg:?}", i + 1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(resource: ResourceKind, statement: StatementArg) -> RenderArgs {
        RenderArgs {
            resource,
            statement,
            config: None,
            input: None,
            tenant: Some(Uuid::from_u128(1)),
            id: Some(Uuid::from_u128(2)),
        }
    }

    #[test]
    fn renders_list_with_numbered_arguments() {
        let out = render::<Accounts>(
            &args(ResourceKind::Account, StatementArg::List),
            ConfigFile::default(),
            r#"{"displayName": "Root", "count": 3}"#,
        )
        .unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert!(lines[0].starts_with("SELECT"));
        assert!(lines[0].contains("LIMIT 3"));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], format!("-- $1: {:?}", Uuid::from_u128(1)));
        assert_eq!(lines[2], r#"-- $2: "%Root%""#);
    }

    #[test]
    fn empty_input_is_default_request() {
        let out = render::<Tenants>(
            &args(ResourceKind::Tenant, StatementArg::Count),
            ConfigFile::default(),
            "",
        )
        .unwrap();
        assert!(out.starts_with("SELECT count(*) FROM tenants t"));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn empty_patch_is_reported_not_rendered() {
        let out = render::<Transactions>(
            &args(ResourceKind::Transaction, StatementArg::Patch),
            ConfigFile::default(),
            "{}",
        )
        .unwrap();
        assert_eq!(out, "-- transaction patch has no fields; nothing to execute\n");
    }

    #[test]
    fn missing_scope_and_bad_request_fail() {
        let mut no_tenant = args(ResourceKind::Account, StatementArg::List);
        no_tenant.tenant = None;
        let err = render::<Accounts>(&no_tenant, ConfigFile::default(), "{}").unwrap_err();
        assert!(err.to_string().contains("--tenant"));

        let err = render::<Accounts>(
            &args(ResourceKind::Account, StatementArg::List),
            ConfigFile::default(),
            r#"{"dispayName": "x"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid account list request"));

        assert!(
            render::<Accounts>(
                &args(ResourceKind::Account, StatementArg::Patch),
                ConfigFile::default(),
                r#"{"colour": "red"}"#,
            )
            .is_err()
        );
    }
}
