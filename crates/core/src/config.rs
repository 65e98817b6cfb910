use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rating::engine::EngineOptions;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["ratebook.toml", "config/ratebook.toml"];

const MIN_REFERENCE_YEAR: i32 = 1900;
const MAX_REFERENCE_YEAR: i32 = 2200;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub rates: RatesConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RatesConfig {
    pub directory: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub variance_enabled: bool,
    /// Seeds the variance generator for reproducible runs.
    pub variance_seed: Option<u64>,
    /// Pins the year used for vehicle age; the current year when unset.
    pub reference_year: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
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
    pub rates_directory: Option<PathBuf>,
    pub variance_enabled: Option<bool>,
    pub variance_seed: Option<u64>,
    pub reference_year: Option<i32>,
    pub log_level: Option<String>,
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
            rates: RatesConfig { directory: PathBuf::from("rates") },
            engine: EngineConfig { variance_enabled: true, variance_seed: None, reference_year: None },
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
            let expected = options
                .config_path
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Engine settings with the reference year resolved against the clock.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            variance_enabled: self.engine.variance_enabled,
            reference_year: self.engine.reference_year.unwrap_or_else(|| Utc::now().year()),
            include_breakdown: false,
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(rates) = patch.rates {
            if let Some(directory) = rates.directory {
                self.rates.directory = directory;
            }
        }

        if let Some(engine) = patch.engine {
            if let Some(variance_enabled) = engine.variance_enabled {
                self.engine.variance_enabled = variance_enabled;
            }
            if let Some(variance_seed) = engine.variance_seed {
                self.engine.variance_seed = Some(variance_seed);
            }
            if let Some(reference_year) = engine.reference_year {
                self.engine.reference_year = Some(reference_year);
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
        if let Some(value) = read_env("RATEBOOK_RATES_DIRECTORY") {
            self.rates.directory = PathBuf::from(value);
        }

        if let Some(value) = read_env("RATEBOOK_ENGINE_VARIANCE_ENABLED") {
            self.engine.variance_enabled = parse_bool("RATEBOOK_ENGINE_VARIANCE_ENABLED", &value)?;
        }
        if let Some(value) = read_env("RATEBOOK_ENGINE_VARIANCE_SEED") {
            self.engine.variance_seed = Some(parse_u64("RATEBOOK_ENGINE_VARIANCE_SEED", &value)?);
        }
        if let Some(value) = read_env("RATEBOOK_ENGINE_REFERENCE_YEAR") {
            self.engine.reference_year =
                Some(parse_i32("RATEBOOK_ENGINE_REFERENCE_YEAR", &value)?);
        }

        let log_level =
            read_env("RATEBOOK_LOGGING_LEVEL").or_else(|| read_env("RATEBOOK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("RATEBOOK_LOGGING_FORMAT").or_else(|| read_env("RATEBOOK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(directory) = overrides.rates_directory {
            self.rates.directory = directory;
        }
        if let Some(variance_enabled) = overrides.variance_enabled {
            self.engine.variance_enabled = variance_enabled;
        }
        if let Some(variance_seed) = overrides.variance_seed {
            self.engine.variance_seed = Some(variance_seed);
        }
        if let Some(reference_year) = overrides.reference_year {
            self.engine.reference_year = Some(reference_year);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_rates(&self.rates)?;
        validate_engine(&self.engine)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
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

fn validate_rates(rates: &RatesConfig) -> Result<(), ConfigError> {
    if rates.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "rates.directory must point at a directory of rate documents".to_string(),
        ));
    }

    Ok(())
}

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if let Some(year) = engine.reference_year {
        if !(MIN_REFERENCE_YEAR..=MAX_REFERENCE_YEAR).contains(&year) {
            return Err(ConfigError::Validation(format!(
                "engine.reference_year must be in range {MIN_REFERENCE_YEAR}..={MAX_REFERENCE_YEAR}"
            )));
        }
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

fn parse_i32(key: &str, value: &str) -> Result<i32, ConfigError> {
    value.trim().parse::<i32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    rates: Option<RatesPatch>,
    engine: Option<EnginePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RatesPatch {
    directory: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    variance_enabled: Option<bool>,
    variance_seed: Option<u64>,
    reference_year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
