// crates/spec-check-config/src/config.rs
// ============================================================================
// Module: Spec Check Configuration
// Description: Configuration loading and validation for spec-check.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: spec-check-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Invalid configuration fails closed. The validated model converts into the
//! runtime option structs and the audit sink used by instrumentation and
//! generative checking.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use spec_check_core::CheckOptions;
use spec_check_core::EngineOptions;
use spec_check_core::FileEventSink;
use spec_check_core::InstrumentOptions;
use spec_check_core::NoopEventSink;
use spec_check_core::Seed;
use spec_check_core::SharedEventSink;
use spec_check_core::StderrEventSink;
use spec_check_core::UnitName;
use spec_check_core::runtime::DEFAULT_MAX_SHRINK_ITERS;
use spec_check_core::runtime::DEFAULT_NUM_TESTS;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "spec-check.toml";
/// Environment variable holding the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "SPEC_CHECK_CONFIG";
/// Maximum config file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum trials per unit.
pub(crate) const MAX_NUM_TESTS: u64 = 1_000_000;
/// Maximum shrink steps per failure.
pub(crate) const MAX_SHRINK_ITERS: u32 = 1_000_000;
/// Maximum checker worker threads.
pub(crate) const MAX_PARALLELISM: usize = 256;
/// Maximum stubbed units.
pub(crate) const MAX_STUB_UNITS: usize = 1024;
/// Maximum unit name length.
pub(crate) const MAX_UNIT_NAME_LENGTH: usize = 512;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level spec-check configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecCheckConfig {
    /// Generative check settings.
    #[serde(default)]
    pub check: CheckConfig,
    /// Instrumentation settings.
    #[serde(default)]
    pub instrument: InstrumentConfig,
    /// Audit event settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl SpecCheckConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit path, then `SPEC_CHECK_CONFIG`, then
    /// `spec-check.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check.validate()?;
        self.instrument.validate()?;
        self.audit.validate()
    }

    /// Builds generative check options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the seed is malformed.
    pub fn check_options(&self) -> Result<CheckOptions, ConfigError> {
        let mut options = CheckOptions {
            num_tests: self.check.num_tests,
            engine: EngineOptions {
                seed: self.check.parsed_seed()?,
                max_shrink_iters: self.check.max_shrink_iters,
            },
            ..CheckOptions::default()
        };
        if let Some(parallelism) = self.check.parallelism {
            options.parallelism = parallelism;
        }
        Ok(options)
    }

    /// Builds instrumentation options carrying the configured stub set.
    #[must_use]
    pub fn instrument_options(&self) -> InstrumentOptions {
        InstrumentOptions {
            stub: self.instrument.stub.iter().map(UnitName::new).collect(),
            ..InstrumentOptions::default()
        }
    }

    /// Opens the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the sink path is missing or cannot be opened.
    pub fn event_sink(&self) -> Result<SharedEventSink, ConfigError> {
        match self.audit.sink {
            AuditSinkKind::None => Ok(Arc::new(NoopEventSink)),
            AuditSinkKind::Stderr => Ok(Arc::new(StderrEventSink)),
            AuditSinkKind::File => {
                let path = self.audit.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("audit.path is required for file sink".to_string())
                })?;
                let sink = FileEventSink::new(Path::new(path))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
        }
    }
}

/// Generative check configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    /// Trials per unit.
    #[serde(default = "default_num_tests")]
    pub num_tests: u64,
    /// Shrink steps per failure.
    #[serde(default = "default_max_shrink_iters")]
    pub max_shrink_iters: u32,
    /// Fixed 64-character hex seed; random per run when absent.
    #[serde(default)]
    pub seed: Option<String>,
    /// Worker threads; defaults to available parallelism.
    #[serde(default)]
    pub parallelism: Option<usize>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            num_tests: default_num_tests(),
            max_shrink_iters: default_max_shrink_iters(),
            seed: None,
            parallelism: None,
        }
    }
}

impl CheckConfig {
    /// Validates check limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.num_tests == 0 || self.num_tests > MAX_NUM_TESTS {
            return Err(ConfigError::Invalid(format!(
                "check.num_tests must be between 1 and {MAX_NUM_TESTS}"
            )));
        }
        if self.max_shrink_iters > MAX_SHRINK_ITERS {
            return Err(ConfigError::Invalid(format!(
                "check.max_shrink_iters must be at most {MAX_SHRINK_ITERS}"
            )));
        }
        if self.parallelism.is_some_and(|parallelism| parallelism > MAX_PARALLELISM) {
            return Err(ConfigError::Invalid(format!(
                "check.parallelism must be at most {MAX_PARALLELISM}"
            )));
        }
        self.parsed_seed()?;
        Ok(())
    }

    /// Parses the configured seed.
    fn parsed_seed(&self) -> Result<Option<Seed>, ConfigError> {
        self.seed
            .as_deref()
            .map(Seed::from_hex)
            .transpose()
            .map_err(|err| ConfigError::Invalid(format!("check.seed invalid: {err}")))
    }
}

/// Instrumentation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstrumentConfig {
    /// Units whose delegate is replaced by a generated constant.
    #[serde(default)]
    pub stub: Vec<String>,
}

impl InstrumentConfig {
    /// Validates stub unit names.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.stub.len() > MAX_STUB_UNITS {
            return Err(ConfigError::Invalid(format!(
                "instrument.stub exceeds {MAX_STUB_UNITS} entries"
            )));
        }
        for unit in &self.stub {
            validate_unit_name("instrument.stub", unit)?;
        }
        Ok(())
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to `audit.path`.
    File,
}

/// Audit event configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates sink settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for file sink".to_string()))
            }
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit.path is only valid for file sink".to_string()))
            }
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a `namespace/name` unit identifier.
fn validate_unit_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.len() > MAX_UNIT_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} entry exceeds max length")));
    }
    let valid = value
        .split_once('/')
        .is_some_and(|(namespace, name)| !namespace.is_empty() && !name.is_empty());
    if !valid || value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid(format!(
            "{field} entry must be a namespace/name unit: {value}"
        )));
    }
    Ok(())
}

/// Default trials per unit.
const fn default_num_tests() -> u64 {
    DEFAULT_NUM_TESTS
}

/// Default shrink steps per failure.
const fn default_max_shrink_iters() -> u32 {
    DEFAULT_MAX_SHRINK_ITERS
}
