use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::ledger::{HashAlgorithm, PrivacyPolicy};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scoring: ScoringSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let weights_path = env::var("MINDSCORE_WEIGHTS")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let privacy = env::var("MINDSCORE_LEDGER_PRIVACY").unwrap_or_else(|_| "full".to_string());
        let privacy_policy = match privacy.trim().to_ascii_lowercase().as_str() {
            "full" | "full_payload" => PrivacyPolicy::FullPayload,
            "hash_only" | "hash-only" | "retain_hash_only" => PrivacyPolicy::RetainHashOnly,
            _ => return Err(ConfigError::InvalidPrivacyPolicy(privacy)),
        };

        let hash = env::var("MINDSCORE_LEDGER_HASH").unwrap_or_else(|_| "sha256".to_string());
        let hash_algorithm = match hash.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => HashAlgorithm::Sha256,
            "checksum" | "checksum32" | "fnv" => HashAlgorithm::Checksum32,
            _ => return Err(ConfigError::InvalidHashAlgorithm(hash)),
        };

        let actor = env::var("MINDSCORE_ACTOR").unwrap_or_else(|_| "mindscore".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scoring: ScoringSettings {
                weights_path,
                privacy_policy,
                hash_algorithm,
                actor,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where scoring configuration comes from and how ledger entries are sealed.
#[derive(Debug, Clone)]
pub struct ScoringSettings {
    /// Optional WeightSet document; the built-in default weights apply when unset.
    pub weights_path: Option<PathBuf>,
    pub privacy_policy: PrivacyPolicy,
    pub hash_algorithm: HashAlgorithm,
    pub actor: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPrivacyPolicy(String),
    InvalidHashAlgorithm(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPrivacyPolicy(value) => write!(
                f,
                "MINDSCORE_LEDGER_PRIVACY must be 'full' or 'hash_only', got '{value}'"
            ),
            ConfigError::InvalidHashAlgorithm(value) => write!(
                f,
                "MINDSCORE_LEDGER_HASH must be 'sha256' or 'checksum', got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidPrivacyPolicy(_)
            | ConfigError::InvalidHashAlgorithm(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "MINDSCORE_WEIGHTS",
            "MINDSCORE_LEDGER_PRIVACY",
            "MINDSCORE_LEDGER_HASH",
            "MINDSCORE_ACTOR",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.scoring.weights_path.is_none());
        assert_eq!(config.scoring.privacy_policy, PrivacyPolicy::FullPayload);
        assert_eq!(config.scoring.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.scoring.actor, "mindscore");
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_ledger_policy_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MINDSCORE_LEDGER_PRIVACY", "hash_only");
        env::set_var("MINDSCORE_LEDGER_HASH", "checksum");
        env::set_var("MINDSCORE_WEIGHTS", "/etc/mindscore/weights.json");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.scoring.privacy_policy, PrivacyPolicy::RetainHashOnly);
        assert_eq!(config.scoring.hash_algorithm, HashAlgorithm::Checksum32);
        assert_eq!(
            config.scoring.weights_path,
            Some(PathBuf::from("/etc/mindscore/weights.json"))
        );
        reset_env();
    }

    #[test]
    fn rejects_unknown_privacy_policy() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MINDSCORE_LEDGER_PRIVACY", "forget-everything");
        let err = AppConfig::load().expect_err("unknown policy rejected");
        assert!(matches!(err, ConfigError::InvalidPrivacyPolicy(_)));
        reset_env();
    }
}
