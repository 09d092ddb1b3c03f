use ledgersql::BuilderConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "ledgersql.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub builder: BuilderConfig,
}

impl ConfigFile {
    /// Load `path`, or `ledgersql.toml` when no path is given.
    ///
    /// Only the implicit default may be missing; it then yields defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !explicit && !config_path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;
        Self::parse(&raw).map_err(|e| {
            anyhow::anyhow!(
                "failed to parse config file {}: {e:#}",
                config_path.display()
            )
        })
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = toml::from_str(raw)?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let b = &self.builder;
        if b.max_count < 0 {
            anyhow::bail!("builder.max_count must be non-negative, got {}", b.max_count);
        }
        if let Some(count) = b.default_count {
            if count < 0 {
                anyhow::bail!("builder.default_count must be non-negative, got {count}");
            }
            if count > b.max_count {
                anyhow::bail!(
                    "builder.default_count ({count}) exceeds builder.max_count ({})",
                    b.max_count
                );
            }
        }
        Ok(())
    }
}
