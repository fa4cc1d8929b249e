use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::profile::Hemisphere;

/// Effective engine configuration: defaults, patched by an optional
/// `wattwise.toml`, then `WATTWISE_*` environment variables, then
/// programmatic overrides, validated last.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub profiler: ProfilerConfig,
    pub costing: CostingConfig,
    pub engine: RankingConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ProfilerConfig {
    /// Mean monthly kWh above which a consumer classifies as a high user.
    pub high_usage_threshold_kwh: f64,
    /// Coefficient-of-variation threshold for the VARIABLE classification.
    pub variability_cv_threshold: f64,
    /// summer/winter ratio at or above which usage counts as seasonal.
    pub seasonal_ratio_threshold: f64,
    pub hemisphere: Hemisphere,
}

#[derive(Clone, Debug)]
pub struct CostingConfig {
    /// Share of a day's usage assumed to fall in the peak window when a
    /// time-of-use plan does not supply its own load shape.
    pub default_peak_share: f64,
    /// Uncertainty buffer for variable-rate plans, applied in proportion to
    /// (1 - overall_confidence).
    pub variable_rate_buffer: f64,
}

#[derive(Clone, Debug)]
pub struct RankingConfig {
    pub default_top_n: usize,
    /// Annual savings below this percentage of current annual cost are not
    /// worth switching for.
    pub switch_threshold_pct: f64,
}

#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub recommendation_ttl_hours: u64,
    pub profile_ttl_days: u64,
    /// Hard deadline for one single-flight computation.
    pub computation_timeout_ms: u64,
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
    pub high_usage_threshold_kwh: Option<f64>,
    pub hemisphere: Option<Hemisphere>,
    pub default_top_n: Option<usize>,
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

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profiler: ProfilerConfig {
                high_usage_threshold_kwh: 1000.0,
                variability_cv_threshold: 0.35,
                seasonal_ratio_threshold: 1.35,
                hemisphere: Hemisphere::Northern,
            },
            costing: CostingConfig { default_peak_share: 0.45, variable_rate_buffer: 0.15 },
            engine: RankingConfig { default_top_n: 3, switch_threshold_pct: 5.0 },
            cache: CacheConfig {
                recommendation_ttl_hours: 24,
                profile_ttl_days: 7,
                computation_timeout_ms: 1500,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for Hemisphere {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "northern" | "north" => Ok(Self::Northern),
            "southern" | "south" => Ok(Self::Southern),
            other => Err(ConfigError::Validation(format!(
                "unsupported hemisphere `{other}` (expected northern|southern)"
            ))),
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

impl EngineConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("wattwise.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(profiler) = patch.profiler {
            if let Some(value) = profiler.high_usage_threshold_kwh {
                self.profiler.high_usage_threshold_kwh = value;
            }
            if let Some(value) = profiler.variability_cv_threshold {
                self.profiler.variability_cv_threshold = value;
            }
            if let Some(value) = profiler.seasonal_ratio_threshold {
                self.profiler.seasonal_ratio_threshold = value;
            }
            if let Some(value) = profiler.hemisphere {
                self.profiler.hemisphere = value;
            }
        }

        if let Some(costing) = patch.costing {
            if let Some(value) = costing.default_peak_share {
                self.costing.default_peak_share = value;
            }
            if let Some(value) = costing.variable_rate_buffer {
                self.costing.variable_rate_buffer = value;
            }
        }

        if let Some(engine) = patch.engine {
            if let Some(value) = engine.default_top_n {
                self.engine.default_top_n = value;
            }
            if let Some(value) = engine.switch_threshold_pct {
                self.engine.switch_threshold_pct = value;
            }
        }

        if let Some(cache) = patch.cache {
            if let Some(value) = cache.recommendation_ttl_hours {
                self.cache.recommendation_ttl_hours = value;
            }
            if let Some(value) = cache.profile_ttl_days {
                self.cache.profile_ttl_days = value;
            }
            if let Some(value) = cache.computation_timeout_ms {
                self.cache.computation_timeout_ms = value;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(value) = logging.level {
                self.logging.level = value;
            }
            if let Some(value) = logging.format {
                self.logging.format = value;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("WATTWISE_HIGH_USAGE_THRESHOLD_KWH") {
            self.profiler.high_usage_threshold_kwh =
                parse_f64("WATTWISE_HIGH_USAGE_THRESHOLD_KWH", &value)?;
        }
        if let Some(value) = read_env("WATTWISE_VARIABILITY_CV_THRESHOLD") {
            self.profiler.variability_cv_threshold =
                parse_f64("WATTWISE_VARIABILITY_CV_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("WATTWISE_SEASONAL_RATIO_THRESHOLD") {
            self.profiler.seasonal_ratio_threshold =
                parse_f64("WATTWISE_SEASONAL_RATIO_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("WATTWISE_HEMISPHERE") {
            self.profiler.hemisphere = value.parse()?;
        }

        if let Some(value) = read_env("WATTWISE_DEFAULT_PEAK_SHARE") {
            self.costing.default_peak_share = parse_f64("WATTWISE_DEFAULT_PEAK_SHARE", &value)?;
        }
        if let Some(value) = read_env("WATTWISE_VARIABLE_RATE_BUFFER") {
            self.costing.variable_rate_buffer =
                parse_f64("WATTWISE_VARIABLE_RATE_BUFFER", &value)?;
        }

        if let Some(value) = read_env("WATTWISE_DEFAULT_TOP_N") {
            self.engine.default_top_n = parse_usize("WATTWISE_DEFAULT_TOP_N", &value)?;
        }
        if let Some(value) = read_env("WATTWISE_SWITCH_THRESHOLD_PCT") {
            self.engine.switch_threshold_pct =
                parse_f64("WATTWISE_SWITCH_THRESHOLD_PCT", &value)?;
        }

        if let Some(value) = read_env("WATTWISE_RECOMMENDATION_TTL_HOURS") {
            self.cache.recommendation_ttl_hours =
                parse_u64("WATTWISE_RECOMMENDATION_TTL_HOURS", &value)?;
        }
        if let Some(value) = read_env("WATTWISE_PROFILE_TTL_DAYS") {
            self.cache.profile_ttl_days = parse_u64("WATTWISE_PROFILE_TTL_DAYS", &value)?;
        }
        if let Some(value) = read_env("WATTWISE_COMPUTATION_TIMEOUT_MS") {
            self.cache.computation_timeout_ms =
                parse_u64("WATTWISE_COMPUTATION_TIMEOUT_MS", &value)?;
        }

        let log_level =
            read_env("WATTWISE_LOGGING_LEVEL").or_else(|| read_env("WATTWISE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("WATTWISE_LOGGING_FORMAT").or_else(|| read_env("WATTWISE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(value) = overrides.high_usage_threshold_kwh {
            self.profiler.high_usage_threshold_kwh = value;
        }
        if let Some(value) = overrides.hemisphere {
            self.profiler.hemisphere = value;
        }
        if let Some(value) = overrides.default_top_n {
            self.engine.default_top_n = value;
        }
        if let Some(value) = overrides.log_level {
            self.logging.level = value;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_profiler(&self.profiler)?;
        validate_costing(&self.costing)?;
        validate_engine(&self.engine)?;
        validate_cache(&self.cache)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("wattwise.toml"), PathBuf::from("config/wattwise.toml")]
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

fn validate_profiler(profiler: &ProfilerConfig) -> Result<(), ConfigError> {
    if profiler.high_usage_threshold_kwh <= 0.0 {
        return Err(ConfigError::Validation(
            "profiler.high_usage_threshold_kwh must be greater than zero".to_string(),
        ));
    }

    if profiler.variability_cv_threshold <= 0.0 {
        return Err(ConfigError::Validation(
            "profiler.variability_cv_threshold must be greater than zero".to_string(),
        ));
    }

    if profiler.seasonal_ratio_threshold <= 1.0 {
        return Err(ConfigError::Validation(
            "profiler.seasonal_ratio_threshold must exceed 1.0".to_string(),
        ));
    }

    Ok(())
}

fn validate_costing(costing: &CostingConfig) -> Result<(), ConfigError> {
    if !(0.0..1.0).contains(&costing.default_peak_share) || costing.default_peak_share == 0.0 {
        return Err(ConfigError::Validation(
            "costing.default_peak_share must be strictly between 0 and 1".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&costing.variable_rate_buffer) {
        return Err(ConfigError::Validation(
            "costing.variable_rate_buffer must be in range 0..=1".to_string(),
        ));
    }

    Ok(())
}

fn validate_engine(engine: &RankingConfig) -> Result<(), ConfigError> {
    if engine.default_top_n == 0 {
        return Err(ConfigError::Validation(
            "engine.default_top_n must be greater than zero".to_string(),
        ));
    }

    if !(0.0..=100.0).contains(&engine.switch_threshold_pct) {
        return Err(ConfigError::Validation(
            "engine.switch_threshold_pct must be in range 0..=100".to_string(),
        ));
    }

    Ok(())
}

fn validate_cache(cache: &CacheConfig) -> Result<(), ConfigError> {
    if cache.recommendation_ttl_hours == 0 || cache.profile_ttl_days == 0 {
        return Err(ConfigError::Validation(
            "cache TTLs must be greater than zero".to_string(),
        ));
    }

    if cache.computation_timeout_ms < 50 || cache.computation_timeout_ms > 30_000 {
        return Err(ConfigError::Validation(
            "cache.computation_timeout_ms must be in range 50..=30000".to_string(),
        ));
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

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    profiler: Option<ProfilerPatch>,
    costing: Option<CostingPatch>,
    engine: Option<EnginePatch>,
    cache: Option<CachePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfilerPatch {
    high_usage_threshold_kwh: Option<f64>,
    variability_cv_threshold: Option<f64>,
    seasonal_ratio_threshold: Option<f64>,
    hemisphere: Option<Hemisphere>,
}

#[derive(Debug, Default, Deserialize)]
struct CostingPatch {
    default_peak_share: Option<f64>,
    variable_rate_buffer: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    default_top_n: Option<usize>,
    switch_threshold_pct: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    recommendation_ttl_hours: Option<u64>,
    profile_ttl_days: Option<u64>,
    computation_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
