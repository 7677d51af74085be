// ⚙️ Configuration - where the snapshot lives, how the table is ordered
// JSON file (optional) → environment overrides → defaults

use crate::sort::SortAttribute;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "PERMIT_LEDGER_DB";
pub const ENV_SERVER_ADDR: &str = "PERMIT_LEDGER_ADDR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// SQLite file holding the reconciled snapshot
    pub database_path: PathBuf,

    /// Bind address of the API server
    pub server_addr: String,

    /// First block to scan for permit events
    pub from_block: u64,

    /// Column the permits table is ordered by
    pub sort_by: SortAttribute,

    pub ascending: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from("permits.db"),
            server_addr: "127.0.0.1:3000".to_string(),
            from_block: 0,
            sort_by: SortAttribute::Timestamp,
            ascending: false,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse config")
    }

    /// Load from `path` if given, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let json = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file {:?}", p))?;
                Self::from_json(&json)?
            }
            None => AppConfig::default(),
        };

        Ok(config.with_overrides(
            std::env::var(ENV_DB_PATH).ok(),
            std::env::var(ENV_SERVER_ADDR).ok(),
        ))
    }

    fn with_overrides(self, database_path: Option<String>, server_addr: Option<String>) -> Self {
        AppConfig {
            database_path: database_path.map(PathBuf::from).unwrap_or(self.database_path),
            server_addr: server_addr.unwrap_or(self.server_addr),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.sort_by, SortAttribute::Timestamp);
        assert!(!config.ascending);
        assert_eq!(config.from_block, 0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AppConfig::from_json(r#"{ "from_block": 1200, "sort_by": "permitHash" }"#).unwrap();

        assert_eq!(config.from_block, 1200);
        assert_eq!(config.sort_by, SortAttribute::PermitHash);
        assert_eq!(config.database_path, PathBuf::from("permits.db"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(AppConfig::from_json(r#"{ "sortBy": "status" }"#).is_err());
        assert!(AppConfig::from_json(r#"{ "sort_by": "nonce" }"#).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let config = AppConfig::default().with_overrides(Some("/tmp/x.db".to_string()), None);
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.server_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "ascending": true }}"#).unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert!(config.ascending);

        assert!(AppConfig::load(Some(Path::new("/definitely/not/here.json"))).is_err());
    }
}
