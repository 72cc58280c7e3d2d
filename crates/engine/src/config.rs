//! Engine configuration: TOML file layered under environment overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sitedeck_core::token::TokenSigner;
use sitedeck_storage::SqliteStorage;

use crate::error::EngineError;

pub const ENV_DATABASE: &str = "SITEDECK_DATABASE";
pub const ENV_PUBLIC_URL: &str = "SITEDECK_PUBLIC_URL";
pub const ENV_TOKEN_TTL_SECS: &str = "SITEDECK_TOKEN_TTL_SECS";
pub const ENV_LOG: &str = "SITEDECK_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite file. `None` keeps everything in memory.
    pub database_path: Option<PathBuf>,
    pub public_base_url: String,
    pub token_ttl_secs: u64,
    pub token_secret_hex: Option<String>,
    pub notice_duration_ms: u64,
    pub max_upload_bytes: u64,
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            public_base_url: "http://localhost:8080".to_string(),
            token_ttl_secs: 60 * 60 * 12,
            token_secret_hex: None,
            notice_duration_ms: 3_000,
            max_upload_bytes: 10 * 1024 * 1024,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        toml::from_str(contents).map_err(|e| EngineError::Config(format!("failed to parse config: {e}")))
    }

    /// Read `path` if it exists (defaults otherwise), then apply env overrides.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .map_err(|e| EngineError::Config(format!("failed to read {}: {e}", path.display())))?;
            Self::from_toml_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), EngineError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), EngineError> {
        if let Some(path) = lookup(ENV_DATABASE) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(url) = lookup(ENV_PUBLIC_URL) {
            self.public_base_url = url;
        }
        if let Some(ttl) = lookup(ENV_TOKEN_TTL_SECS) {
            self.token_ttl_secs = ttl
                .parse()
                .map_err(|e| EngineError::Config(format!("{ENV_TOKEN_TTL_SECS}={ttl:?}: {e}")))?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }
        Ok(())
    }

    pub fn write(&self, path: &Path) -> Result<(), EngineError> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("failed to serialize config: {e}")))?;
        fs::write(path, contents)
            .map_err(|e| EngineError::Config(format!("failed to write {}: {e}", path.display())))
    }

    pub fn open_storage(&self) -> Result<SqliteStorage, EngineError> {
        match &self.database_path {
            Some(path) => {
                let path = path
                    .to_str()
                    .ok_or_else(|| EngineError::Config(format!("non-UTF-8 database path {}", path.display())))?;
                Ok(SqliteStorage::open(path)?)
            }
            None => Ok(SqliteStorage::open_in_memory()?),
        }
    }

    /// Signer from the configured secret, or a fresh one (tokens then die with the process).
    pub fn token_signer(&self) -> Result<TokenSigner, EngineError> {
        let Some(secret) = &self.token_secret_hex else {
            return Ok(TokenSigner::generate());
        };
        let bytes: [u8; 32] = hex::decode(secret)
            .ok()
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| EngineError::Config("token_secret_hex must be 64 hex characters".into()))?;
        Ok(TokenSigner::from_secret_bytes(&bytes))
    }

    /// Install the global subscriber with `log_filter`. False if one was already set.
    pub fn init_tracing(&self) -> bool {
        crate::telemetry::init_tracing(&self.log_filter)
    }

    pub fn token_ttl_ms(&self) -> u64 {
        self.token_ttl_secs.saturating_mul(1_000)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = EngineConfig::from_toml_str("public_base_url = \"https://cdn.example.com\"\n").unwrap();
        assert_eq!(config.public_base_url, "https://cdn.example.com");
        assert_eq!(config.token_ttl_secs, EngineConfig::default().token_ttl_secs);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn overrides_win_over_file() {
        let mut config = EngineConfig::from_toml_str("log_filter = \"warn\"\ntoken_ttl_secs = 60\n").unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_LOG, "debug"),
            (ENV_TOKEN_TTL_SECS, "120"),
            (ENV_DATABASE, "/tmp/site.db"),
        ]);
        config
            .apply_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.token_ttl_secs, 120);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/site.db")));
    }

    #[test]
    fn bad_ttl_override_is_config_error() {
        let mut config = EngineConfig::default();
        let result = config.apply_overrides(|name| (name == ENV_TOKEN_TTL_SECS).then(|| "soon".to_string()));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn write_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitedeck.toml");
        let config = EngineConfig {
            max_upload_bytes: 1024,
            ..EngineConfig::default()
        };
        config.write(&path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(EngineConfig::from_toml_str(&contents).unwrap(), config);
    }

    #[test]
    fn log_override_reaches_subscriber_setup() {
        let mut config = EngineConfig::default();
        config
            .apply_overrides(|name| (name == ENV_LOG).then(|| "sitedeck_engine=debug".to_string()))
            .unwrap();
        assert_eq!(config.log_filter, "sitedeck_engine=debug");
        let _ = config.init_tracing();
        // The global subscriber is set once per process.
        assert!(!config.init_tracing());
    }

    #[test]
    fn token_secret_must_be_32_bytes() {
        let config = EngineConfig {
            token_secret_hex: Some("abcd".into()),
            ..EngineConfig::default()
        };
        assert!(config.token_signer().is_err());
        let config = EngineConfig {
            token_secret_hex: Some("07".repeat(32)),
            ..EngineConfig::default()
        };
        assert!(config.token_signer().is_ok());
    }
}
