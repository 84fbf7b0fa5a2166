use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::patient::PhoneNumber;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub practice: PracticeConfig,
    pub booking: BookingConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PracticeConfig {
    pub name: String,
    pub phone: String,
    /// Pins "today" for slot searches and seeding. Unset means the system date.
    pub reference_date: Option<NaiveDate>,
}

pub const MAX_EMERGENCY_DEDUP_WINDOW_SECS: u64 = 86_400;
pub const MAX_IDLE_TIMEOUT_SECS: u64 = 604_800;

#[derive(Clone, Debug)]
pub struct BookingConfig {
    /// Year that out-of-range years in slot searches are replaced with. Unset
    /// means the reference date's year.
    pub deployment_year: Option<i32>,
    pub default_window_days: u32,
    pub emergency_dedup_window_secs: u64,
}

impl BookingConfig {
    pub fn emergency_dedup_window(&self) -> Duration {
        bounded_seconds(self.emergency_dedup_window_secs, MAX_EMERGENCY_DEDUP_WINDOW_SECS)
    }
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        bounded_seconds(self.idle_timeout_secs, MAX_IDLE_TIMEOUT_SECS)
    }
}

/// Converts without overflow; `validate` rejects values above `max`.
fn bounded_seconds(secs: u64, max: u64) -> Duration {
    Duration::seconds(i64::try_from(secs.min(max)).unwrap_or(0))
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub reference_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://frontdesk.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            practice: PracticeConfig {
                name: "Frontdesk Dental".to_string(),
                phone: "5550100200".to_string(),
                reference_date: None,
            },
            booking: BookingConfig {
                deployment_year: None,
                default_window_days: 14,
                emergency_dedup_window_secs: 600,
            },
            session: SessionConfig { idle_timeout_secs: 1800 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("frontdesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Config file that `load` would read for these options, if any.
    pub fn source_path(options: &LoadOptions) -> Option<PathBuf> {
        resolve_config_path(options.config_path.as_deref())
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(practice) = patch.practice {
            if let Some(name) = practice.name {
                self.practice.name = name;
            }
            if let Some(phone) = practice.phone {
                self.practice.phone = phone;
            }
            if let Some(reference_date) = practice.reference_date {
                self.practice.reference_date = Some(reference_date);
            }
        }

        if let Some(booking) = patch.booking {
            if let Some(deployment_year) = booking.deployment_year {
                self.booking.deployment_year = Some(deployment_year);
            }
            if let Some(default_window_days) = booking.default_window_days {
                self.booking.default_window_days = default_window_days;
            }
            if let Some(dedup_window) = booking.emergency_dedup_window_secs {
                self.booking.emergency_dedup_window_secs = dedup_window;
            }
        }

        if let Some(session) = patch.session {
            if let Some(idle_timeout_secs) = session.idle_timeout_secs {
                self.session.idle_timeout_secs = idle_timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FRONTDESK_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("FRONTDESK_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("FRONTDESK_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("FRONTDESK_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("FRONTDESK_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FRONTDESK_PRACTICE_NAME") {
            self.practice.name = value;
        }
        if let Some(value) = read_env("FRONTDESK_PRACTICE_PHONE") {
            self.practice.phone = value;
        }
        if let Some(value) = read_env("FRONTDESK_PRACTICE_REFERENCE_DATE") {
            self.practice.reference_date =
                Some(parse_date("FRONTDESK_PRACTICE_REFERENCE_DATE", &value)?);
        }

        if let Some(value) = read_env("FRONTDESK_BOOKING_DEPLOYMENT_YEAR") {
            self.booking.deployment_year =
                Some(parse_i32("FRONTDESK_BOOKING_DEPLOYMENT_YEAR", &value)?);
        }
        if let Some(value) = read_env("FRONTDESK_BOOKING_DEFAULT_WINDOW_DAYS") {
            self.booking.default_window_days =
                parse_u32("FRONTDESK_BOOKING_DEFAULT_WINDOW_DAYS", &value)?;
        }
        if let Some(value) = read_env("FRONTDESK_BOOKING_EMERGENCY_DEDUP_WINDOW_SECS") {
            self.booking.emergency_dedup_window_secs =
                parse_u64("FRONTDESK_BOOKING_EMERGENCY_DEDUP_WINDOW_SECS", &value)?;
        }

        if let Some(value) = read_env("FRONTDESK_SESSION_IDLE_TIMEOUT_SECS") {
            self.session.idle_timeout_secs =
                parse_u64("FRONTDESK_SESSION_IDLE_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("FRONTDESK_LOGGING_LEVEL").or_else(|| read_env("FRONTDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FRONTDESK_LOGGING_FORMAT").or_else(|| read_env("FRONTDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(reference_date) = overrides.reference_date {
            self.practice.reference_date = Some(reference_date);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_practice(&self.practice)?;
        validate_booking(&self.booking)?;
        validate_session(&self.session)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("frontdesk.toml"), PathBuf::from("config/frontdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_practice(practice: &PracticeConfig) -> Result<(), ConfigError> {
    if practice.name.trim().is_empty() {
        return Err(ConfigError::Validation("practice.name must not be empty".to_string()));
    }

    if PhoneNumber::parse(&practice.phone).is_none() {
        return Err(ConfigError::Validation(format!(
            "practice.phone `{}` must be a 10-digit phone number; callers are pointed to it when the system is down",
            practice.phone
        )));
    }

    Ok(())
}

fn validate_booking(booking: &BookingConfig) -> Result<(), ConfigError> {
    if let Some(year) = booking.deployment_year {
        if !(2000..=2100).contains(&year) {
            return Err(ConfigError::Validation(
                "booking.deployment_year must be in range 2000..=2100".to_string(),
            ));
        }
    }

    if booking.default_window_days == 0 || booking.default_window_days > 90 {
        return Err(ConfigError::Validation(
            "booking.default_window_days must be in range 1..=90".to_string(),
        ));
    }

    if booking.emergency_dedup_window_secs == 0
        || booking.emergency_dedup_window_secs > MAX_EMERGENCY_DEDUP_WINDOW_SECS
    {
        return Err(ConfigError::Validation(format!(
            "booking.emergency_dedup_window_secs must be in range 1..={MAX_EMERGENCY_DEDUP_WINDOW_SECS}"
        )));
    }

    Ok(())
}

fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
    if session.idle_timeout_secs == 0 || session.idle_timeout_secs > MAX_IDLE_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "session.idle_timeout_secs must be in range 1..={MAX_IDLE_TIMEOUT_SECS}"
        )));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_i32(key: &str, value: &str) -> Result<i32, ConfigError> {
    value.trim().parse::<i32>().map_err(|_| invalid_override(key, value))
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    practice: Option<PracticePatch>,
    booking: Option<BookingPatch>,
    session: Option<SessionPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PracticePatch {
    name: Option<String>,
    phone: Option<String>,
    reference_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
struct BookingPatch {
    deployment_year: Option<i32>,
    default_window_days: Option<u32>,
    emergency_dedup_window_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.database.url == "sqlite://frontdesk.db", "default database url")?;
        ensure(config.booking.emergency_dedup_window_secs == 600, "ten minute dedup window")?;
        ensure(config.session.idle_timeout_secs == 1800, "thirty minute idle timeout")?;
        ensure(config.practice.reference_date.is_none(), "reference date follows the clock")?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "compact logs by default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_FRONTDESK_PHONE", "(555) 777-8888");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("frontdesk.toml");
            fs::write(
                &path,
                r#"
[practice]
name = "Maple Street Dental"
phone = "${TEST_FRONTDESK_PHONE}"
reference_date = "2025-10-20"

[booking]
deployment_year = 2025
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.practice.phone == "(555) 777-8888", "phone should come from env")?;
            ensure(config.practice.name == "Maple Street Dental", "name should come from file")?;
            ensure(
                config.practice.reference_date == NaiveDate::from_ymd_opt(2025, 10, 20),
                "reference date should parse from the file",
            )?;
            ensure(config.booking.deployment_year == Some(2025), "deployment year from file")?;
            Ok(())
        })();

        clear_vars(&["TEST_FRONTDESK_PHONE"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_FRONTDESK_UNSET"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("frontdesk.toml");
        fs::write(&path, "[database]\nurl = \"${TEST_FRONTDESK_UNSET}\"\n")
            .map_err(|err| err.to_string())?;

        let error = AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            .err()
            .ok_or_else(|| "expected interpolation failure".to_string())?;
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "TEST_FRONTDESK_UNSET"),
            "error should name the missing variable",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FRONTDESK_LOG_LEVEL", "warn");
        env::set_var("FRONTDESK_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["FRONTDESK_LOG_LEVEL", "FRONTDESK_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FRONTDESK_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("FRONTDESK_SESSION_IDLE_TIMEOUT_SECS", "900");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("frontdesk.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[session]
idle_timeout_secs = 60

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.session.idle_timeout_secs == 900,
                "env idle timeout should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(&["FRONTDESK_DATABASE_URL", "FRONTDESK_SESSION_IDLE_TIMEOUT_SECS"]);
        result
    }

    #[test]
    fn invalid_env_values_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FRONTDESK_PRACTICE_REFERENCE_DATE", "10/20/2025");

        let result = (|| -> Result<(), String> {
            let error = AppConfig::load(LoadOptions::default())
                .err()
                .ok_or_else(|| "expected env override failure".to_string())?;
            ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. }
                        if key == "FRONTDESK_PRACTICE_REFERENCE_DATE"
                ),
                "error should name the offending variable",
            )
        })();

        clear_vars(&["FRONTDESK_PRACTICE_REFERENCE_DATE"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FRONTDESK_PRACTICE_PHONE", "call us");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("practice.phone")
            );
            ensure(has_message, "validation failure should mention practice.phone")
        })();

        clear_vars(&["FRONTDESK_PRACTICE_PHONE"]);
        result
    }

    #[test]
    fn oversized_durations_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FRONTDESK_BOOKING_EMERGENCY_DEDUP_WINDOW_SECS", "10000000000000000");

        let result = (|| -> Result<(), String> {
            let error = AppConfig::load(LoadOptions::default())
                .err()
                .ok_or_else(|| "expected an out-of-range dedup window to fail".to_string())?;
            ensure(
                matches!(
                    error,
                    ConfigError::Validation(ref message)
                        if message.contains("booking.emergency_dedup_window_secs")
                ),
                "validation failure should name the dedup window",
            )?;

            let mut config = AppConfig::default();
            config.booking.emergency_dedup_window_secs = u64::MAX;
            config.session.idle_timeout_secs = u64::MAX;
            ensure(config.validate().is_err(), "unbounded values should not validate")?;
            ensure(
                config.booking.emergency_dedup_window() == chrono::Duration::seconds(86_400),
                "conversion saturates at the dedup bound",
            )?;
            ensure(
                config.session.idle_timeout() == chrono::Duration::seconds(604_800),
                "conversion saturates at the idle bound",
            )
        })();

        clear_vars(&["FRONTDESK_BOOKING_EMERGENCY_DEDUP_WINDOW_SECS"]);
        result
    }
}
