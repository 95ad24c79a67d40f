//! Client configuration loaded from environment variables.
//!
//! Every setting has a default, so the client runs with no configuration.

use std::path::PathBuf;

use famlink_store::Database;
use uuid::Uuid;

/// Number of sealed backups kept in the backup directory.
pub const DEFAULT_BACKUP_KEEP: usize = 10;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// SQLite database file.
    /// Env: `FAMLINK_DB_PATH`
    /// Default: `<platform data dir>/famlink.db`
    pub db_path: PathBuf,

    /// Identifier recorded on the member each time they sign in here.
    /// Env: `FAMLINK_DEVICE_ID`
    /// Default: a random UUID
    pub device_id: String,

    /// Where sealed backup files are written.
    /// Env: `FAMLINK_BACKUP_DIR`
    /// Default: `<platform data dir>/backups`
    pub backup_dir: PathBuf,

    /// Env: `FAMLINK_BACKUP_KEEP`
    pub backup_keep: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let data_dir = Database::default_data_dir().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "no platform data directory, using working directory");
            PathBuf::from(".")
        });

        Self {
            db_path: data_dir.join("famlink.db"),
            device_id: Uuid::new_v4().to_string(),
            backup_dir: data_dir.join("backups"),
            backup_keep: DEFAULT_BACKUP_KEEP,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = var("FAMLINK_DB_PATH").filter(|v| !v.is_empty()) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(device) = var("FAMLINK_DEVICE_ID") {
            let device = device.trim();
            if !device.is_empty() {
                config.device_id = device.to_string();
            }
        }

        if let Some(dir) = var("FAMLINK_BACKUP_DIR").filter(|v| !v.is_empty()) {
            config.backup_dir = PathBuf::from(dir);
        }

        if let Some(val) = var("FAMLINK_BACKUP_KEEP") {
            match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.backup_keep = n,
                _ => tracing::warn!(value = %val, "Invalid FAMLINK_BACKUP_KEEP, using default"),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_vars(vars(&[]));
        assert_eq!(config.backup_keep, DEFAULT_BACKUP_KEEP);
        assert!(config.db_path.ends_with("famlink.db"));
        assert!(config.backup_dir.ends_with("backups"));
        assert!(Uuid::parse_str(&config.device_id).is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_vars(vars(&[
            ("FAMLINK_DB_PATH", "/tmp/fam/test.db"),
            ("FAMLINK_DEVICE_ID", " kitchen-tablet "),
            ("FAMLINK_BACKUP_DIR", "/tmp/fam/backups"),
            ("FAMLINK_BACKUP_KEEP", "3"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/tmp/fam/test.db"));
        assert_eq!(config.device_id, "kitchen-tablet");
        assert_eq!(config.backup_dir, PathBuf::from("/tmp/fam/backups"));
        assert_eq!(config.backup_keep, 3);
    }

    #[test]
    fn test_invalid_keep_falls_back() {
        for bad in ["zero", "0", "-2"] {
            let config = ClientConfig::from_vars(vars(&[("FAMLINK_BACKUP_KEEP", bad)]));
            assert_eq!(config.backup_keep, DEFAULT_BACKUP_KEEP);
        }
    }
}
