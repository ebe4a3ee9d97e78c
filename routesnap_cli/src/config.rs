use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use config::Config;
use routesnap_ingest::Vendor;

const EMPTY_CONFIG: &str = r#"### route-diff configuration file

### sqlite database holding route snapshots
# database = "~/.local/share/routesnap/routes.sqlite3"

### default capture format for `load` and `diff-files`
### one of: timos, timos-bgp, vrp, auto
# vendor = "auto"

### match records on the prefix only when comparing
# route_only = false
"#;

/// Effective settings after layering defaults, the config file and `ROUTESNAP_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: PathBuf,
    pub vendor: Vendor,
    pub route_only: bool,
}

impl Settings {
    /// Load settings. An explicit `path` that does not exist yet receives a commented template.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let mut builder = Config::builder();

        match path {
            Some(path) if path.exists() => {
                builder = builder.add_source(config::File::from(path));
            }
            Some(path) => {
                std::fs::write(path, EMPTY_CONFIG)
                    .with_context(|| format!("unable to create config file {}", path.display()))?;
            }
            None => {
                if let Some(default) = default_config_path() {
                    builder = builder.add_source(config::File::from(default).required(false));
                }
            }
        }

        builder = builder.add_source(config::Environment::with_prefix("ROUTESNAP"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("failed to build configuration: {e}"))?;
        let values = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("failed to deserialize configuration: {e}"))?;

        let database = match values.get("database") {
            Some(path) => expand_home(path),
            None => default_database_path(),
        };
        let vendor = match values.get("vendor") {
            Some(name) => name
                .parse()
                .with_context(|| format!("invalid vendor '{name}' in configuration"))?,
            None => Vendor::Auto,
        };
        let route_only = match values.get("route_only") {
            Some(flag) => flag
                .parse()
                .with_context(|| format!("invalid route_only '{flag}' in configuration"))?,
            None => false,
        };

        Ok(Settings {
            database,
            vendor,
            route_only,
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("routesnap").join("routesnap.toml"))
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("routesnap"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("routes.sqlite3")
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
