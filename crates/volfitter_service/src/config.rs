//! Service configuration management
//!
//! Loads configuration from a TOML file, applies `VOLFITTER_*` environment
//! variable overrides, then CLI overrides, and validates the result.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use volfitter_models::{FinalIvValidationConfig, FitterConfig, RawIvFilteringConfig};

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration error types
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(String),

    /// Config file is not valid TOML for this schema
    #[error("Parse error: {0}")]
    Parse(String),

    /// An override could not be parsed
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue {
        /// Variable or flag name
        key: String,
        /// Offending value
        value: String,
    },

    /// One or more semantic problems
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Where market data comes from and where fits go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolfitterMode {
    /// Replay OptionMetrics-style CSV files from disk
    #[default]
    SampleData,
    /// Historical replay against a market data store
    Backtest,
    /// Live market data
    Live,
}

impl FromStr for VolfitterMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sample_data" => Ok(VolfitterMode::SampleData),
            "backtest" => Ok(VolfitterMode::Backtest),
            "live" => Ok(VolfitterMode::Live),
            _ => Err(ConfigError::InvalidValue {
                key: "mode".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for VolfitterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolfitterMode::SampleData => write!(f, "sample_data"),
            VolfitterMode::Backtest => write!(f, "backtest"),
            VolfitterMode::Live => write!(f, "live"),
        }
    }
}

/// Locations of the sample input files and the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleDataConfig {
    /// Root of the input tree; files live under `<input_data_path>/<symbol>/`
    pub input_data_path: PathBuf,
    /// Option data is read from every input file whose name contains this
    pub option_data_file_substring: String,
    /// Forward prices are read from every input file whose name contains this
    pub forward_data_file_substring: String,
    /// Root of the output tree
    pub output_data_path: PathBuf,
    /// Output file name under `<output_data_path>/<symbol>/`
    pub output_filename: String,
}

impl Default for SampleDataConfig {
    fn default() -> Self {
        Self {
            input_data_path: PathBuf::from("data/input"),
            option_data_file_substring: "option_data".to_string(),
            forward_data_file_substring: "forward_prices".to_string(),
            output_data_path: PathBuf::from("data/output"),
            output_filename: "final_iv_surface.json".to_string(),
        }
    }
}

impl SampleDataConfig {
    /// Directory holding the input files for `symbol`.
    pub fn input_dir(&self, symbol: &str) -> PathBuf {
        self.input_data_path.join(symbol)
    }

    /// Full path of the output file for `symbol`.
    pub fn output_file(&self, symbol: &str) -> PathBuf {
        self.output_data_path.join(symbol).join(&self.output_filename)
    }
}

/// Top-level service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolfitterConfig {
    /// Underlying symbol
    pub symbol: String,
    /// Data source mode
    pub mode: VolfitterMode,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Seconds between fit cycles
    pub fit_interval_secs: u64,
    /// Threads in the expiry-fitting pool
    pub worker_threads: usize,
    /// Sample data locations
    pub sample_data: SampleDataConfig,
    /// Filtering thresholds
    pub raw_iv_filtering: RawIvFilteringConfig,
    /// Fitter selection
    pub fitter: FitterConfig,
    /// Validation thresholds
    pub final_iv_validation: FinalIvValidationConfig,
}

impl Default for VolfitterConfig {
    fn default() -> Self {
        Self {
            symbol: "AMZN".to_string(),
            mode: VolfitterMode::default(),
            log_level: "info".to_string(),
            fit_interval_secs: 10,
            worker_threads: num_cpus::get(),
            sample_data: SampleDataConfig::default(),
            raw_iv_filtering: RawIvFilteringConfig::default(),
            fitter: FitterConfig::default(),
            final_iv_validation: FinalIvValidationConfig::default(),
        }
    }
}

fn parse_var<T: FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        })
}

impl VolfitterConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `VOLFITTER_*` environment variable overrides
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// Unset variables leave the current value in place; a set variable that
    /// does not parse is an error.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(symbol) = lookup("VOLFITTER_SYMBOL") {
            self.symbol = symbol;
        }
        if let Some(mode) = lookup("VOLFITTER_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(level) = lookup("VOLFITTER_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(v) = lookup("VOLFITTER_FIT_INTERVAL_SECS") {
            self.fit_interval_secs = parse_var("VOLFITTER_FIT_INTERVAL_SECS", v)?;
        }
        if let Some(v) = lookup("VOLFITTER_WORKER_THREADS") {
            self.worker_threads = parse_var("VOLFITTER_WORKER_THREADS", v)?;
        }

        // Sample data
        if let Some(path) = lookup("VOLFITTER_INPUT_DATA_PATH") {
            self.sample_data.input_data_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("VOLFITTER_OUTPUT_DATA_PATH") {
            self.sample_data.output_data_path = PathBuf::from(path);
        }
        if let Some(name) = lookup("VOLFITTER_OUTPUT_FILENAME") {
            self.sample_data.output_filename = name;
        }

        // Filtering
        if let Some(v) = lookup("VOLFITTER_MIN_VALID_STRIKES_FRACTION") {
            self.raw_iv_filtering.min_valid_strikes_fraction =
                parse_var("VOLFITTER_MIN_VALID_STRIKES_FRACTION", v)?;
        }
        if let Some(v) = lookup("VOLFITTER_MAX_LAST_TRADE_AGE_DAYS") {
            self.raw_iv_filtering.max_last_trade_age_days =
                parse_var("VOLFITTER_MAX_LAST_TRADE_AGE_DAYS", v)?;
        }
        if let Some(v) = lookup("VOLFITTER_WIDE_MARKET_OUTLIER_MAD_THRESHOLD") {
            self.raw_iv_filtering.wide_market_outlier_mad_threshold =
                parse_var("VOLFITTER_WIDE_MARKET_OUTLIER_MAD_THRESHOLD", v)?;
        }

        // Validation
        if let Some(v) = lookup("VOLFITTER_CROSSED_PNL_WARN_THRESHOLD") {
            self.final_iv_validation.crossed_pnl_warn_threshold =
                parse_var("VOLFITTER_CROSSED_PNL_WARN_THRESHOLD", v)?;
        }
        if let Some(v) = lookup("VOLFITTER_CROSSED_PNL_FAIL_THRESHOLD") {
            self.final_iv_validation.crossed_pnl_fail_threshold =
                parse_var("VOLFITTER_CROSSED_PNL_FAIL_THRESHOLD", v)?;
        }

        Ok(self)
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) {
        if let Some(symbol) = &cli.symbol {
            self.symbol = symbol.clone();
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
        if let Some(secs) = cli.fit_interval_secs {
            self.fit_interval_secs = secs;
        }
    }

    /// Validate the configuration, reporting every problem at once
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.symbol.trim().is_empty() {
            errors.push("symbol cannot be empty".to_string());
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!(
                "Invalid log_level '{}'. Valid values: {:?}",
                self.log_level, VALID_LOG_LEVELS
            ));
        }

        if self.fit_interval_secs == 0 {
            errors.push("fit_interval_secs must be greater than 0".to_string());
        }

        if self.worker_threads == 0 {
            errors.push("worker_threads must be greater than 0".to_string());
        }

        if self.mode == VolfitterMode::SampleData {
            let sample = &self.sample_data;
            if sample.input_data_path.as_os_str().is_empty() {
                errors.push("sample_data.input_data_path cannot be empty".to_string());
            }
            if sample.option_data_file_substring.is_empty() {
                errors.push("sample_data.option_data_file_substring cannot be empty".to_string());
            }
            if sample.forward_data_file_substring.is_empty() {
                errors.push("sample_data.forward_data_file_substring cannot be empty".to_string());
            }
            if sample.output_filename.is_empty() {
                errors.push("sample_data.output_filename cannot be empty".to_string());
            }
        }

        self.raw_iv_filtering.collect_errors(&mut errors);
        self.fitter.collect_errors(&mut errors);
        self.final_iv_validation.collect_errors(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// CLI arguments structure
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Symbol override
    pub symbol: Option<String>,
    /// Log level override
    pub log_level: Option<String>,
    /// Fit interval override
    pub fit_interval_secs: Option<u64>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<VolfitterConfig, ConfigError> {
    build_config_with(cli, |key| std::env::var(key).ok())
}

/// [`build_config`] with an explicit variable source.
pub fn build_config_with<F>(cli: &CliArgs, lookup: F) -> Result<VolfitterConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match &cli.config_file {
        Some(path) => VolfitterConfig::load(path)?,
        None => VolfitterConfig::default(),
    };

    let mut config = config.with_overrides(lookup)?;
    config.merge_with_cli(cli);
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use volfitter_models::{FitterKind, SviCalibratorKind};

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn no_vars(_: &str) -> Option<String> {
        None
    }

    fn validation_errors(config: &VolfitterConfig) -> Vec<String> {
        match config.validate() {
            Err(ConfigError::Validation(errors)) => errors,
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config() {
        let config = VolfitterConfig::default();
        assert_eq!(config.symbol, "AMZN");
        assert_eq!(config.mode, VolfitterMode::SampleData);
        assert_eq!(config.fit_interval_secs, 10);
        assert!(config.worker_threads > 0);
        assert_eq!(config.sample_data.option_data_file_substring, "option_data");
        assert_eq!(config.raw_iv_filtering.max_last_trade_age_days, 3);
        assert_eq!(config.final_iv_validation.crossed_pnl_fail_threshold, 1000.0);
    }

    #[test]
    fn test_default_config_validates() {
        assert!(VolfitterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("sample_data".parse::<VolfitterMode>().unwrap(), VolfitterMode::SampleData);
        assert_eq!("SAMPLE_DATA".parse::<VolfitterMode>().unwrap(), VolfitterMode::SampleData);
        assert_eq!("Live".parse::<VolfitterMode>().unwrap(), VolfitterMode::Live);
        assert!("paper".parse::<VolfitterMode>().is_err());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(VolfitterMode::SampleData.to_string(), "sample_data");
        assert_eq!(VolfitterMode::Backtest.to_string(), "backtest");
    }

    #[test]
    fn test_sample_data_paths() {
        let sample = SampleDataConfig::default();
        assert_eq!(sample.input_dir("AMZN"), PathBuf::from("data/input/AMZN"));
        assert_eq!(
            sample.output_file("AMZN"),
            PathBuf::from("data/output/AMZN/final_iv_surface.json")
        );
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            symbol = "SPY"
            mode = "sample_data"
            log_level = "debug"
            fit_interval_secs = 30
            worker_threads = 2

            [sample_data]
            input_data_path = "/tmp/in"

            [raw_iv_filtering]
            min_valid_strikes_fraction = 0.25

            [fitter]
            kind = "mid_market"

            [final_iv_validation]
            crossed_pnl_warn_threshold = 50.0
        "#;

        let config: VolfitterConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.symbol, "SPY");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.fit_interval_secs, 30);
        assert_eq!(config.worker_threads, 2);
        assert_eq!(config.sample_data.input_data_path, PathBuf::from("/tmp/in"));
        assert_eq!(config.sample_data.output_filename, "final_iv_surface.json");
        assert_eq!(config.raw_iv_filtering.min_valid_strikes_fraction, 0.25);
        assert_eq!(config.raw_iv_filtering.max_last_trade_age_days, 3);
        assert_eq!(config.fitter.kind, FitterKind::MidMarket);
        assert_eq!(config.final_iv_validation.crossed_pnl_warn_threshold, 50.0);
        assert_eq!(config.final_iv_validation.crossed_pnl_fail_threshold, 1000.0);
    }

    #[test]
    fn test_partial_toml_deserialization() {
        let config: VolfitterConfig = toml::from_str("symbol = \"TSLA\"").unwrap();
        assert_eq!(config.symbol, "TSLA");
        assert_eq!(config.fit_interval_secs, 10);
        assert_eq!(config.fitter, FitterConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "symbol = \"QQQ\"\nfit_interval_secs = 5").unwrap();

        let config = VolfitterConfig::load(file.path()).unwrap();
        assert_eq!(config.symbol, "QQQ");
        assert_eq!(config.fit_interval_secs, 5);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/volfitter.toml");
        let config = VolfitterConfig::load(&path).unwrap();
        assert!(config.validate().is_ok());

        let expected = VolfitterConfig {
            worker_threads: 4,
            ..Default::default()
        };
        assert_eq!(config, expected);
    }

    #[test]
    fn test_load_missing_file() {
        let result = VolfitterConfig::load(Path::new("/nonexistent/volfitter.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fit_interval_secs = \"often\"").unwrap();

        let result = VolfitterConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_override() {
        let config = VolfitterConfig::default()
            .with_overrides(vars(&[
                ("VOLFITTER_SYMBOL", "MSFT"),
                ("VOLFITTER_MODE", "live"),
                ("VOLFITTER_FIT_INTERVAL_SECS", "60"),
                ("VOLFITTER_MIN_VALID_STRIKES_FRACTION", "0.5"),
                ("VOLFITTER_CROSSED_PNL_FAIL_THRESHOLD", "250"),
            ]))
            .unwrap();

        assert_eq!(config.symbol, "MSFT");
        assert_eq!(config.mode, VolfitterMode::Live);
        assert_eq!(config.fit_interval_secs, 60);
        assert_eq!(config.raw_iv_filtering.min_valid_strikes_fraction, 0.5);
        assert_eq!(config.final_iv_validation.crossed_pnl_fail_threshold, 250.0);
    }

    #[test]
    fn test_env_override_invalid_number() {
        let result = VolfitterConfig::default()
            .with_overrides(vars(&[("VOLFITTER_MAX_LAST_TRADE_AGE_DAYS", "three")]));

        match result {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, "VOLFITTER_MAX_LAST_TRADE_AGE_DAYS");
                assert_eq!(value, "three");
            }
            other => panic!("Expected invalid value, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_args_merge() {
        let mut config = VolfitterConfig::default();
        let cli = CliArgs {
            config_file: None,
            symbol: Some("NVDA".to_string()),
            log_level: Some("trace".to_string()),
            fit_interval_secs: Some(1),
        };

        config.merge_with_cli(&cli);

        assert_eq!(config.symbol, "NVDA");
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.fit_interval_secs, 1);
    }

    #[test]
    fn test_build_config_priority() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "symbol = \"FILE\"\nlog_level = \"warn\"\nfit_interval_secs = 7").unwrap();

        let cli = CliArgs {
            config_file: Some(file.path().to_path_buf()),
            symbol: Some("CLI".to_string()),
            ..Default::default()
        };
        let config = build_config_with(
            &cli,
            vars(&[("VOLFITTER_SYMBOL", "ENV"), ("VOLFITTER_LOG_LEVEL", "debug")]),
        )
        .unwrap();

        assert_eq!(config.symbol, "CLI");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.fit_interval_secs, 7);
    }

    #[test]
    fn test_build_config_with_defaults() {
        let config = build_config_with(&CliArgs::default(), no_vars).unwrap();
        assert_eq!(config, VolfitterConfig::default());
    }

    #[test]
    fn test_build_config_rejects_invalid() {
        let cli = CliArgs {
            fit_interval_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            build_config_with(&cli, no_vars),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = VolfitterConfig {
            log_level: "verbose".to_string(),
            ..Default::default()
        };
        let errors = validation_errors(&config);
        assert!(errors.iter().any(|e| e.contains("log_level")));
    }

    #[test]
    fn test_validate_valid_log_levels() {
        for level in &["trace", "debug", "info", "warn", "error", "INFO", "DEBUG"] {
            let config = VolfitterConfig {
                log_level: level.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "Log level '{}' should be valid", level);
        }
    }

    #[test]
    fn test_validate_empty_symbol() {
        let config = VolfitterConfig {
            symbol: "  ".to_string(),
            ..Default::default()
        };
        let errors = validation_errors(&config);
        assert!(errors.iter().any(|e| e.contains("symbol")));
    }

    #[test]
    fn test_validate_zero_worker_threads() {
        let config = VolfitterConfig {
            worker_threads: 0,
            ..Default::default()
        };
        let errors = validation_errors(&config);
        assert!(errors.iter().any(|e| e.contains("worker_threads")));
    }

    #[test]
    fn test_validate_empty_output_filename() {
        let mut config = VolfitterConfig::default();
        config.sample_data.output_filename.clear();
        let errors = validation_errors(&config);
        assert!(errors.iter().any(|e| e.contains("output_filename")));
    }

    #[test]
    fn test_validate_constrained_calibrator() {
        let mut config = VolfitterConfig::default();
        config.fitter.calibrator = SviCalibratorKind::Constrained;
        let errors = validation_errors(&config);
        assert!(errors.iter().any(|e| e.contains("constrained")));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = VolfitterConfig {
            symbol: String::new(),
            fit_interval_secs: 0,
            ..Default::default()
        };
        config.raw_iv_filtering.min_valid_strikes_fraction = 2.0;

        let errors = validation_errors(&config);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Validation errors: a; b");

        let err = ConfigError::InvalidValue {
            key: "mode".to_string(),
            value: "paper".to_string(),
        };
        assert!(err.to_string().contains("paper"));
    }
}
