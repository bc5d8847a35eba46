use std::{collections::HashMap, env};

use mcphub::config::{AppConfig, ConfigError};
use serial_test::serial;

const KEYS: [&str; 6] = [
    "DATABASE_URL",
    "BIND_ADDR",
    "DB_MAX_CONNECTIONS",
    "ADMIN_TOKEN",
    "SEED_SAMPLE_SERVERS",
    "ENVIRONMENT",
];

#[derive(Default)]
struct EnvGuard {
    original: HashMap<String, Option<String>>,
}

impl EnvGuard {
    fn clean() -> Self {
        let mut guard = EnvGuard::default();
        for key in KEYS {
            guard.remove(key);
        }
        guard
    }

    fn set(&mut self, key: &str, value: impl Into<String>) {
        self.original
            .entry(key.to_string())
            .or_insert_with(|| env::var(key).ok());
        env::set_var(key, value.into());
    }

    fn remove(&mut self, key: &str) {
        self.original
            .entry(key.to_string())
            .or_insert_with(|| env::var(key).ok());
        env::remove_var(key);
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.original.drain() {
            match value {
                Some(v) => env::set_var(&key, v),
                None => env::remove_var(&key),
            }
        }
    }
}

#[test]
#[serial]
fn defaults_apply_when_environment_is_empty() {
    let _guard = EnvGuard::clean();

    let config = AppConfig::from_env().unwrap();
    assert_eq!(config.database_url, "sqlite://data/mcphub.db?mode=rwc");
    assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8000");
    assert_eq!(config.max_connections, 5);
    assert!(config.admin_token.is_none());
    assert!(config.seed_sample_servers);
    assert!(!config.is_production());
}

#[test]
#[serial]
fn environment_overrides_are_read() {
    let mut guard = EnvGuard::clean();
    guard.set("DATABASE_URL", "sqlite::memory:");
    guard.set("BIND_ADDR", "127.0.0.1:9100");
    guard.set("DB_MAX_CONNECTIONS", "12");
    guard.set("ADMIN_TOKEN", "s3cret");
    guard.set("SEED_SAMPLE_SERVERS", "false");

    let config = AppConfig::from_env().unwrap();
    assert_eq!(config.database_url, "sqlite::memory:");
    assert_eq!(config.bind_addr.port(), 9100);
    assert_eq!(config.max_connections, 12);
    assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
    assert!(!config.seed_sample_servers);
}

#[test]
#[serial]
fn invalid_bind_addr_is_rejected() {
    let mut guard = EnvGuard::clean();
    guard.set("BIND_ADDR", "not-an-address");

    let err = AppConfig::from_env().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            key: "BIND_ADDR",
            ..
        }
    ));
}

#[test]
#[serial]
fn invalid_pool_size_is_rejected() {
    let mut guard = EnvGuard::clean();
    guard.set("DB_MAX_CONNECTIONS", "many");

    assert!(matches!(
        AppConfig::from_env(),
        Err(ConfigError::InvalidValue {
            key: "DB_MAX_CONNECTIONS",
            ..
        })
    ));
}

#[test]
#[serial]
fn production_requires_admin_token() {
    let mut guard = EnvGuard::clean();
    guard.set("ENVIRONMENT", "production");

    assert!(matches!(
        AppConfig::from_env(),
        Err(ConfigError::MissingAdminToken)
    ));

    guard.set("ADMIN_TOKEN", "s3cret");
    let config = AppConfig::from_env().unwrap();
    assert!(config.is_production());
}

#[test]
#[serial]
fn empty_admin_token_counts_as_unset() {
    let mut guard = EnvGuard::clean();
    guard.set("ADMIN_TOKEN", "");

    let config = AppConfig::from_env().unwrap();
    assert!(config.admin_token.is_none());
}
