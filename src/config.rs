use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "TB Intake";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default PBKDF2 rounds for newly stored password hashes.
pub const DEFAULT_HASH_ITERATIONS: u32 = 600_000;

const ENV_PREFIX: &str = "TB_INTAKE_";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,tb_intake_lib=debug,tower_http=info"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Secret key must be at least {min} bytes, got {len}")]
    SecretTooShort { min: usize, len: usize },
}

/// What to do when an insert trips a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Discard the write and carry on as if it succeeded.
    #[default]
    Ignore,
    /// Report the conflict back to the submitting form.
    Reject,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Reject => "reject",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ignore" => Some(Self::Ignore),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Runtime configuration, normally read from `TB_INTAKE_*` variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub model_path: PathBuf,
    /// Session signing key. `None` means a random key is generated at startup,
    /// so every restart logs everyone out.
    pub secret_key: Option<Vec<u8>>,
    pub require_login: bool,
    pub duplicate_policy: DuplicatePolicy,
    pub hash_iterations: u32,
}

pub const MIN_SECRET_LEN: usize = 16;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            database_path: PathBuf::from("tb-hospital-data.db"),
            upload_dir: PathBuf::from("static/img"),
            model_path: PathBuf::from("model.json"),
            secret_key: None,
            require_login: false,
            duplicate_policy: DuplicatePolicy::Ignore,
            hash_iterations: DEFAULT_HASH_ITERATIONS,
        }
    }
}

impl AppConfig {
    /// Build the config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|v| (key, v))
        };
        let mut config = Self::default();

        if let Some((key, value)) = get("BIND") {
            config.bind_addr = value
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value })?;
        }
        if let Some((_, value)) = get("DATABASE") {
            config.database_path = PathBuf::from(value);
        }
        if let Some((_, value)) = get("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(value);
        }
        if let Some((_, value)) = get("MODEL") {
            config.model_path = PathBuf::from(value);
        }
        if let Some((_, value)) = get("SECRET_KEY") {
            if value.len() < MIN_SECRET_LEN {
                return Err(ConfigError::SecretTooShort {
                    min: MIN_SECRET_LEN,
                    len: value.len(),
                });
            }
            config.secret_key = Some(value.into_bytes());
        }
        if let Some((key, value)) = get("REQUIRE_LOGIN") {
            config.require_login = parse_bool(&value)
                .ok_or(ConfigError::InvalidValue { key, value })?;
        }
        if let Some((key, value)) = get("DUPLICATES") {
            config.duplicate_policy = DuplicatePolicy::parse(&value)
                .ok_or(ConfigError::InvalidValue { key, value })?;
        }
        if let Some((key, value)) = get("HASH_ITERATIONS") {
            config.hash_iterations = match value.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidValue { key, value }),
            };
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_path, PathBuf::from("tb-hospital-data.db"));
        assert_eq!(config.upload_dir, PathBuf::from("static/img"));
        assert_eq!(config.bind_addr.port(), 5000);
        assert!(config.secret_key.is_none());
        assert!(!config.require_login);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Ignore);
        assert_eq!(config.hash_iterations, DEFAULT_HASH_ITERATIONS);
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TB_INTAKE_BIND", "127.0.0.1:8080"),
            ("TB_INTAKE_DATABASE", "/tmp/x.db"),
            ("TB_INTAKE_SECRET_KEY", "0123456789abcdef0123"),
            ("TB_INTAKE_REQUIRE_LOGIN", "yes"),
            ("TB_INTAKE_DUPLICATES", "Reject"),
            ("TB_INTAKE_HASH_ITERATIONS", "1000"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.secret_key.as_deref(), Some(&b"0123456789abcdef0123"[..]));
        assert!(config.require_login);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.hash_iterations, 1000);
    }

    #[test]
    fn invalid_bool_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("TB_INTAKE_REQUIRE_LOGIN", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("TB_INTAKE_SECRET_KEY", "short")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::SecretTooShort { len: 5, .. }));
    }

    #[test]
    fn zero_iterations_is_rejected() {
        let result = AppConfig::from_lookup(lookup(&[("TB_INTAKE_HASH_ITERATIONS", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
