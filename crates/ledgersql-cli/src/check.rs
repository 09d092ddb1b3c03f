use ledgersql::{Accounts, BuilderConfig, QueryBuilder, Statement, Tenants, Transactions};

use crate::cli::CheckArgs;
use crate::config::ConfigFile;
use crate::render::Target;

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let config = ConfigFile::load(args.config.as_deref())?;
    for line in check_all(&config.builder)? {
        println!("{line}");
    }
    Ok(())
}

/// Check every resource, stopping at the first failure.
pub fn check_all(config: &BuilderConfig) -> anyhow::Result<Vec<String>> {
    Ok(vec![
        check::<Tenants>(config)?,
        check::<Accounts>(config)?,
        check::<Transactions>(config)?,
    ])
}

fn check<R: Target>(config: &BuilderConfig) -> anyhow::Result<String> {
    let list_params = Statement::parse(R::LIST_TEMPLATE)
        .and_then(|s| s.check_ordinals())
        .map_err(|e| anyhow::anyhow!("{} list template: {e}", R::NAME))?;
    let patch_params = Statement::parse(R::PATCH_TEMPLATE)
        .and_then(|s| s.check_ordinals())
        .map_err(|e| anyhow::anyhow!("{} patch template: {e}", R::NAME))?;

    let builder = QueryBuilder::<R>::new(config.clone());
    let list = builder
        .build_list(&R::sample_scope(), &R::ListRequest::default())
        .map_err(|e| anyhow::anyhow!("{} default list: {e}", R::NAME))?;
    builder
        .derive_count(&list)
        .map_err(|e| anyhow::anyhow!("{} default count: {e}", R::NAME))?;

    Ok(format!(
        "ok {}: list template ({list_params} params), patch template ({patch_params} params), default list and count",
        R::NAME
    ))
}
