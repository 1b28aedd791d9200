use crate::scoring::composite::{QualityLevelTable, QualityTableError, ScoreScale};
use crate::scoring::domain::{ApprovalPolicy, StatusScheme};
use crate::scoring::service::ScoringRules;
use std::env;
use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub scoring: ScoringConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scoring: ScoringConfig::from_env()?,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Scoring rules plus where the served records come from.
#[derive(Debug, Clone, Default)]
pub struct ScoringConfig {
    pub rules: ScoringRules,
    pub snapshot_dir: Option<PathBuf>,
    pub default_fiscal_year: Option<i32>,
}

impl ScoringConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let approval = match non_empty("CTAM_APPROVED_STATUSES") {
            Some(raw) => ApprovalPolicy::new(raw.split(',')),
            None => ApprovalPolicy::standard(),
        };

        let partial_weight = match non_empty("CTAM_PARTIAL_WEIGHT") {
            Some(raw) => parse_partial_weight(&raw)?,
            None => StatusScheme::STANDARD_PARTIAL_WEIGHT,
        };

        let scheme = match non_empty("CTAM_STATUS_SCHEME") {
            Some(raw) => parse_scheme(&raw, partial_weight)?,
            None => StatusScheme::PassPartialFail { partial_weight },
        };

        let quality_table = match non_empty("CTAM_QUALITY_TABLE") {
            Some(path) => load_quality_table(PathBuf::from(path))?,
            None => QualityLevelTable::standard(),
        };

        let default_fiscal_year = non_empty("CTAM_FISCAL_YEAR")
            .map(|raw| {
                raw.trim()
                    .parse::<i32>()
                    .map_err(|_| ConfigError::InvalidFiscalYear(raw.clone()))
            })
            .transpose()?;

        Ok(Self {
            rules: ScoringRules {
                approval,
                scheme,
                quality_table,
            },
            snapshot_dir: non_empty("CTAM_SNAPSHOT_DIR").map(PathBuf::from),
            default_fiscal_year,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_scheme(raw: &str, partial_weight: f64) -> Result<StatusScheme, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pass_fail" | "binary" => Ok(StatusScheme::PassFail),
        "pass_partial_fail" | "ternary" => Ok(StatusScheme::PassPartialFail { partial_weight }),
        _ => Err(ConfigError::InvalidStatusScheme(raw.to_string())),
    }
}

fn parse_partial_weight(raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(weight) if (0.0..=1.0).contains(&weight) => Ok(weight),
        _ => Err(ConfigError::InvalidPartialWeight(raw.to_string())),
    }
}

fn load_quality_table(path: PathBuf) -> Result<QualityLevelTable, ConfigError> {
    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::QualityTableRead {
        path: path.clone(),
        source,
    })?;
    // Composite totals are banded on the 0-10 scale.
    QualityLevelTable::from_json(&raw)
        .and_then(|table| table.require_scale(ScoreScale::Composite).map(|()| table))
        .map_err(|source| ConfigError::QualityTable { path, source })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidStatusScheme(String),
    InvalidPartialWeight(String),
    InvalidFiscalYear(String),
    QualityTableRead { path: PathBuf, source: std::io::Error },
    QualityTable { path: PathBuf, source: QualityTableError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidStatusScheme(value) => write!(
                f,
                "CTAM_STATUS_SCHEME must be pass_fail or pass_partial_fail, got '{value}'"
            ),
            ConfigError::InvalidPartialWeight(value) => write!(
                f,
                "CTAM_PARTIAL_WEIGHT must be a number between 0 and 1, got '{value}'"
            ),
            ConfigError::InvalidFiscalYear(value) => {
                write!(f, "CTAM_FISCAL_YEAR must be a year, got '{value}'")
            }
            ConfigError::QualityTableRead { path, .. } => {
                write!(f, "unable to read CTAM_QUALITY_TABLE {}", path.display())
            }
            ConfigError::QualityTable { path, source } => {
                write!(f, "CTAM_QUALITY_TABLE {} is invalid: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::QualityTableRead { source, .. } => Some(source),
            ConfigError::QualityTable { source, .. } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidStatusScheme(_)
            | ConfigError::InvalidPartialWeight(_)
            | ConfigError::InvalidFiscalYear(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::composite::QualityLevel;
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
            "CTAM_APPROVED_STATUSES",
            "CTAM_STATUS_SCHEME",
            "CTAM_PARTIAL_WEIGHT",
            "CTAM_QUALITY_TABLE",
            "CTAM_SNAPSHOT_DIR",
            "CTAM_FISCAL_YEAR",
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
        assert_eq!(config.scoring.rules.scheme, StatusScheme::pass_partial_fail());
        assert!(config.scoring.rules.approval.is_approved("approved"));
        assert!(config.scoring.snapshot_dir.is_none());
        assert!(config.scoring.default_fiscal_year.is_none());
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
    fn reads_scoring_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CTAM_APPROVED_STATUSES", "approved, Verified");
        env::set_var("CTAM_STATUS_SCHEME", "pass_fail");
        env::set_var("CTAM_FISCAL_YEAR", "2568");
        env::set_var("CTAM_SNAPSHOT_DIR", "/var/lib/ctam/snapshot");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.scoring.rules.scheme, StatusScheme::PassFail);
        assert!(config.scoring.rules.approval.is_approved("verified"));
        assert!(!config.scoring.rules.approval.is_approved("submitted"));
        assert_eq!(config.scoring.default_fiscal_year, Some(2568));
        assert_eq!(
            config.scoring.snapshot_dir,
            Some(PathBuf::from("/var/lib/ctam/snapshot"))
        );
        reset_env();
    }

    #[test]
    fn rejects_invalid_scoring_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();

        env::set_var("CTAM_STATUS_SCHEME", "stars");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidStatusScheme(_))
        ));
        env::remove_var("CTAM_STATUS_SCHEME");

        env::set_var("CTAM_PARTIAL_WEIGHT", "1.5");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidPartialWeight(_))
        ));
        env::remove_var("CTAM_PARTIAL_WEIGHT");

        env::set_var("CTAM_FISCAL_YEAR", "next");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFiscalYear(_))
        ));
        reset_env();
    }

    #[test]
    fn loads_quality_table_from_json_file() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();

        let table = QualityLevelTable::standard();
        let path = env::temp_dir().join(format!("ctam-quality-table-{}.json", std::process::id()));
        fs::write(&path, serde_json::to_string(&table).expect("table serializes"))
            .expect("write table");
        env::set_var("CTAM_QUALITY_TABLE", &path);

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.scoring.rules.quality_table.level(6.44), QualityLevel::Fair);

        let percentage = QualityLevelTable::percentage();
        fs::write(&path, serde_json::to_string(&percentage).expect("table serializes"))
            .expect("write percentage table");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::QualityTable {
                source: QualityTableError::Scale {
                    expected: ScoreScale::Composite,
                    found: ScoreScale::Percentage,
                },
                ..
            })
        ));

        fs::write(&path, "{\"bands\": []}").expect("write broken table");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::QualityTable { .. })
        ));

        let _ = fs::remove_file(&path);
        reset_env();
    }
}
