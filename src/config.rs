//! Optional TOML configuration
//!
//! ```toml
//! db_path = "/srv/quotes/data.db"
//!
//! [import]
//! mode = "header-at-row2"
//! shop_no = "S1"
//! contact_name = "Li Wei"
//! contact_phone = "+86 20 5555 0100"
//! segment = "kitchen"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::db::get_default_db_path;
use crate::importers::ImportMode;

pub const CONFIG_ENV: &str = "QUOTEDESK_CONFIG";
pub const DB_ENV: &str = "QUOTEDESK_DB";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub db_path: Option<PathBuf>,
    pub import: ImportDefaults,
}

/// Defaults for `import` options not given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportDefaults {
    pub mode: Option<ImportMode>,
    pub shop_no: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub segment: Option<String>,
}

impl Config {
    /// Load the config from the resolved path; a missing file gives defaults
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match resolve_config_path(cli_path, env_path) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        info!("Loading config from: {:?}", path);
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Database path: `--db` > `QUOTEDESK_DB` > `db_path` > `~/.quotedesk/data.db`
    pub fn db_path(&self, cli_db: Option<&Path>) -> Result<PathBuf> {
        let env_db = std::env::var_os(DB_ENV).map(PathBuf::from);
        resolve_db_path(cli_db, env_db, self)
    }
}

/// Config file location: explicit path > env var > `<config_home>/quotedesk/config.toml`
pub fn resolve_config_path(cli: Option<&Path>, env: Option<PathBuf>) -> Option<PathBuf> {
    cli.map(Path::to_path_buf)
        .or(env)
        .or_else(|| dir_spec::config_home().map(|dir| dir.join("quotedesk").join("config.toml")))
}

pub fn resolve_db_path(cli: Option<&Path>, env: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    if let Some(path) = cli.map(Path::to_path_buf).or(env).or_else(|| config.db_path.clone()) {
        return Ok(path);
    }
    get_default_db_path()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
db_path = "/tmp/q.db"

[import]
mode = "header-at-row2"
shop_no = "S9"
segment = "toys"
"#,
        )
        .unwrap();

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/q.db")));
        assert_eq!(config.import.mode, Some(ImportMode::HeaderAtRow2));
        assert_eq!(config.import.shop_no.as_deref(), Some("S9"));
        assert_eq!(config.import.segment.as_deref(), Some("toys"));
        assert!(config.import.contact_name.is_none());
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_malformed_config_is_error() {
        assert!(Config::parse("db_path = [").is_err());
        assert!(Config::parse("unknown_key = 1").is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_path_precedence() {
        let cli = PathBuf::from("/cli.toml");
        let env = PathBuf::from("/env.toml");
        assert_eq!(
            resolve_config_path(Some(&cli), Some(env.clone())),
            Some(cli)
        );
        assert_eq!(resolve_config_path(None, Some(env.clone())), Some(env));
    }

    #[test]
    fn test_db_path_precedence() {
        let config = Config {
            db_path: Some(PathBuf::from("/config.db")),
            ..Default::default()
        };
        let cli = PathBuf::from("/cli.db");

        assert_eq!(
            resolve_db_path(Some(&cli), Some(PathBuf::from("/env.db")), &config).unwrap(),
            cli
        );
        assert_eq!(
            resolve_db_path(None, Some(PathBuf::from("/env.db")), &config).unwrap(),
            PathBuf::from("/env.db")
        );
        assert_eq!(
            resolve_db_path(None, None, &config).unwrap(),
            PathBuf::from("/config.db")
        );
    }
}
