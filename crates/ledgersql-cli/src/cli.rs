use std::path::PathBuf;

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Render,
    Check,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Render(RenderArgs),
    Check(CheckArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Tenant,
    Account,
    Transaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementArg {
    List,
    Count,
    Patch,
}

#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub resource: ResourceKind,
    pub statement: StatementArg,
    pub config: Option<PathBuf>,
    /// Request body; `-` reads stdin, `None` means an empty object.
    pub input: Option<PathBuf>,
    pub tenant: Option<Uuid>,
    pub id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CheckArgs {
    pub config: Option<PathBuf>,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "render" => parse_render(it.map(|s| s.as_str())),
        "check" => parse_check(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn parse_render<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut resource: Option<ResourceKind> = None;
    let mut statement: Option<StatementArg> = None;
    let mut config: Option<PathBuf> = None;
    let mut input: Option<PathBuf> = None;
    let mut tenant: Option<Uuid> = None;
    let mut id: Option<Uuid> = None;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Render)),
            "tenant" | "account" | "transaction" if resource.is_none() => {
                resource = Some(match token {
                    "tenant" => ResourceKind::Tenant,
                    "account" => ResourceKind::Account,
                    _ => ResourceKind::Transaction,
                });
            }
            "list" | "count" | "patch" if resource.is_some() && statement.is_none() => {
                statement = Some(match token {
                    "list" => StatementArg::List,
                    "count" => StatementArg::Count,
                    _ => StatementArg::Patch,
                });
            }
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--config=") => {
                config = Some(PathBuf::from(token.trim_start_matches("--config=")));
            }
            "--input" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--input requires a value");
                };
                input = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--input=") => {
                input = Some(PathBuf::from(token.trim_start_matches("--input=")));
            }
            "--tenant" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--tenant requires a value");
                };
                tenant = Some(parse_uuid("--tenant", v)?);
            }
            _ if token.starts_with("--tenant=") => {
                tenant = Some(parse_uuid(
                    "--tenant",
                    token.trim_start_matches("--tenant="),
                )?);
            }
            "--id" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--id requires a value");
                };
                id = Some(parse_uuid("--id", v)?);
            }
            _ if token.starts_with("--id=") => {
                id = Some(parse_uuid("--id", token.trim_start_matches("--id="))?);
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    let Some(resource) = resource else {
        anyhow::bail!("render requires a resource: tenant, account or transaction");
    };
    let Some(statement) = statement else {
        anyhow::bail!("render requires a statement: list, count or patch");
    };

    Ok(Command::Render(RenderArgs {
        resource,
        statement,
        config,
        input,
        tenant,
        id,
    }))
}

fn parse_check<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config: Option<PathBuf> = None;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Check)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--config=") => {
                config = Some(PathBuf::from(token.trim_start_matches("--config=")));
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Check(CheckArgs { config }))
}

fn parse_uuid(flag: &str, v: &str) -> anyhow::Result<Uuid> {
    v.parse()
        .map_err(|e| anyhow::anyhow!("{flag} expects a UUID, got {v:?}: {e}"))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
ledgersql - render ledger statements from JSON requests

USAGE:
  ledgersql <COMMAND> [OPTIONS]

COMMANDS:
  render        Render a list, count or patch statement for a resource
  check         Parse every built-in template and build a default statement

Run `ledgersql <command> --help` for more."
            );
        }
        HelpTopic::Render => {
            println!(
                "\
USAGE:
  ledgersql render <tenant|account|transaction> <list|count|patch> [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: ledgersql.toml if present)
  --input <FILE|->      JSON request body; `-` reads stdin (default: {{}})
  --tenant <UUID>       Owning tenant for account/transaction statements
  --id <UUID>           Row to patch
  -h, --help            Print help"
            );
        }
        HelpTopic::Check => {
            println!(
                "\
USAGE:
  ledgersql check [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: ledgersql.toml if present)
  -h, --help            Print help"
            );
        }
    }
}
