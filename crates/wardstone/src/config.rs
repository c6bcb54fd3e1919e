//! Startup configuration.
//!
//! The configuration document is JSON with a `database` section whose keys
//! match the external contract (`driver`, `hostname`, `database`,
//! `databasePath`, `prefix`, `username`, `password`). It is read once at
//! startup and resolved into a [`StorageDescriptor`]; nothing re-reads it.

use serde::{Deserialize, Serialize};

use wardstone_store::StorageDescriptor;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    pub database: DatabaseConfig,
}

impl Config {
    /// Parse a configuration document.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// The `database.*` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    pub driver: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub database: String,
    #[serde(default, rename = "databasePath")]
    pub database_path: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl DatabaseConfig {
    /// Resolve into the immutable storage descriptor.
    pub fn to_descriptor(&self) -> StorageDescriptor {
        StorageDescriptor {
            driver: self.driver.clone(),
            hostname: self.hostname.clone(),
            database: self.database.clone(),
            path: self.database_path.clone(),
            prefix: self.prefix.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_database_section() {
        let config = Config::from_json(
            r#"{
                "database": {
                    "driver": "sqlite",
                    "hostname": "",
                    "database": "",
                    "databasePath": "plugins/wardstone/wardstone.db",
                    "prefix": "ws_",
                    "username": "",
                    "password": ""
                }
            }"#,
        )
        .unwrap();

        let descriptor = config.database.to_descriptor();
        assert_eq!(descriptor.driver, "sqlite");
        assert_eq!(descriptor.path, "plugins/wardstone/wardstone.db");
        assert_eq!(descriptor.prefix, "ws_");
    }

    #[test]
    fn optional_keys_default_to_empty() {
        let config = Config::from_json(r#"{"database": {"driver": "memory"}}"#).unwrap();
        let descriptor = config.database.to_descriptor();
        assert_eq!(descriptor.driver, "memory");
        assert_eq!(descriptor.hostname, "");
        assert_eq!(descriptor.prefix, "");
    }

    #[test]
    fn missing_database_section_is_an_error() {
        assert!(Config::from_json("{}").is_err());
    }
}
