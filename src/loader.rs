//! Config loading pipeline.
//!
//! `ConfigLoader` sequences path resolution, YAML parsing, key
//! normalization, logger acquisition, rule validation, the optional
//! authentication file, and the final secret-redacted completion log. Any
//! step failing aborts the whole construction; no partially-initialized
//! loader is ever returned.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::{ConfigError, Result};
use crate::logging::{LoggerHandle, LoggerRegistry};
use crate::rules::RuleSet;
use crate::sensitive::SensitiveDict;
use crate::validator::ConfigValidator;
use crate::value::{normalize_key, yaml_key_to_string, ConfigMap, ConfigValue};

/// Log directory used when the config names none, or names a plain file.
pub const DEFAULT_LOG_DIR: &str = "logs";

const LOG_DIR_KEY: &str = "log_output_path";
const LOG_PREFIX_KEY: &str = "log_name_prefix";
const AUTH_PATH_KEY: &str = "authentication_path";
const AUTH_KEY: &str = "auth";
const LOGGER_KEY: &str = "logger";

/// Loads, validates, and holds one YAML configuration.
#[derive(Debug)]
pub struct ConfigLoader {
    path: PathBuf,
    config: ConfigMap,
    logger: LoggerHandle,
}

impl ConfigLoader {
    /// Load a config file with no validation rules.
    ///
    /// Path, parse, and normalization checks still apply; rule validation
    /// trivially succeeds.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_rules(path, RuleSet::new(), RuleSet::new())
    }

    /// Load a config file and validate it against `config_rules`; if the
    /// config names an `authentication_path`, load that file too and
    /// validate it against `auth_rules`.
    pub fn load_with_rules(
        path: impl AsRef<Path>,
        config_rules: RuleSet,
        auth_rules: RuleSet,
    ) -> Result<Self> {
        let path = resolve_yaml_path(path.as_ref())?;
        let raw = parse_yaml(&path)?;
        let mut config = mapping_from_yaml(raw, &path, true)?;

        let log_dir = decide_log_dir(&config);
        let prefix = log_name_prefix(&config);
        let logger = LoggerRegistry::global().acquire(&log_dir, &prefix)?;
        info!(
            "Logger initialized with log output directory: '{}'",
            log_dir.display()
        );
        config.insert(LOGGER_KEY.to_string(), ConfigValue::Logger(logger.clone()));

        if let Err(e) = ConfigValidator::new(&config, &config_rules).validate() {
            error!("Config validation error: {e}");
            return Err(e.into());
        }
        info!("Config validated successfully");

        if let Some(value) = config.get(AUTH_PATH_KEY) {
            let auth_path = match value {
                ConfigValue::String(s) => s.clone(),
                other => return Err(ConfigError::AuthPath(other.type_name().to_string())),
            };
            let auth = load_auth(&auth_path, &auth_rules)?;
            config.insert(AUTH_KEY.to_string(), ConfigValue::Sensitive(auth));
            info!("Authentication config loaded from '{auth_path}'");
        }

        let loader = Self {
            path,
            config,
            logger,
        };
        let rendered = loader.render_for_log()?;
        info!("Config loaded successfully. Loaded config:\n{rendered}");
        Ok(loader)
    }

    /// The loaded config, including the injected `logger` and `auth` keys.
    pub fn config(&self) -> &ConfigMap {
        &self.config
    }

    /// Look up a single config value.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.config.get(key)
    }

    /// Canonical path of the loaded config file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Handle to the process logger attached to this config.
    pub fn logger(&self) -> &LoggerHandle {
        &self.logger
    }

    /// Serialize the config for logging: pretty JSON with the logger handle
    /// and sensitive sub-trees rendered as placeholders and dates rendered
    /// as `YYYY-MM-DD` strings.
    pub fn render_for_log(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.config)?)
    }
}

/// Resolve a YAML path: it must exist, be a regular file, and end in
/// `.yaml`. Returns the canonical absolute path.
fn resolve_yaml_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        return Err(ConfigError::IsADirectory(path.to_path_buf()));
    }
    if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
        return Err(ConfigError::WrongExtension(path.to_path_buf()));
    }
    Ok(fs::canonicalize(path)?)
}

fn parse_yaml(path: &Path) -> Result<serde_yaml::Value> {
    let text = fs::read_to_string(path)?;
    serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert a parsed document into a [`ConfigMap`], rejecting non-mapping
/// top levels. With `normalize` set, top-level keys are trimmed and spaces
/// become underscores; two raw keys landing on the same normalized key is
/// an error rather than a silent overwrite.
fn mapping_from_yaml(
    value: serde_yaml::Value,
    path: &Path,
    normalize: bool,
) -> Result<ConfigMap> {
    let serde_yaml::Value::Mapping(mapping) = value else {
        return Err(ConfigError::TopLevelNotMapping(path.to_path_buf()));
    };
    let mut out = ConfigMap::new();
    for (k, v) in mapping {
        let raw = yaml_key_to_string(&k);
        let key = if normalize { normalize_key(&raw) } else { raw.clone() };
        if out.contains_key(&key) {
            return Err(ConfigError::DuplicateKey {
                raw,
                normalized: key,
            });
        }
        out.insert(key, ConfigValue::from_yaml(v));
    }
    Ok(out)
}

/// Pick the log directory: the configured `log_output_path` when usable,
/// falling back silently to [`DEFAULT_LOG_DIR`] when the configured path
/// is absent from the config, is not a string, or names an existing plain
/// file. This is the only swallowed failure in the pipeline.
fn decide_log_dir(config: &ConfigMap) -> PathBuf {
    let configured = match config.get(LOG_DIR_KEY).and_then(ConfigValue::as_str) {
        Some(s) => PathBuf::from(s),
        None => return PathBuf::from(DEFAULT_LOG_DIR),
    };
    if configured.is_file() {
        return PathBuf::from(DEFAULT_LOG_DIR);
    }
    configured
}

fn log_name_prefix(config: &ConfigMap) -> String {
    config
        .get(LOG_PREFIX_KEY)
        .and_then(ConfigValue::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Load and validate the secondary authentication file.
///
/// Keys are taken as-is here; normalization applies to the primary config
/// only. The rules run against the unwrapped data before it is sealed in a
/// [`SensitiveDict`].
fn load_auth(auth_path: &str, rules: &RuleSet) -> Result<SensitiveDict> {
    let path = Path::new(auth_path);
    if !path.exists() || !path.is_file() {
        return Err(ConfigError::AuthPath(auth_path.to_string()));
    }
    let data = mapping_from_yaml(parse_yaml(path)?, path, false)?;
    info!("Authentication data loaded into config");
    ConfigValidator::new(&data, rules).validate()?;
    info!("Authentication data validated successfully");
    Ok(SensitiveDict::new(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_rejects_missing_path() {
        let err = resolve_yaml_path(Path::new("does_not_exist.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_resolve_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let err = resolve_yaml_path(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::IsADirectory(_)));
    }

    #[test]
    fn test_resolve_rejects_wrong_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "a: 1").unwrap();
        let err = resolve_yaml_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::WrongExtension(_)));
    }

    #[test]
    fn test_resolve_canonicalizes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "a: 1").unwrap();
        let resolved = resolve_yaml_path(&path).unwrap();
        assert!(resolved.is_absolute());
    }

    #[test]
    fn test_mapping_normalizes_top_level_keys() {
        let value: serde_yaml::Value =
            serde_yaml::from_str("log name prefix: run_\n' padded key ': 1").unwrap();
        let map = mapping_from_yaml(value, Path::new("x.yaml"), true).unwrap();
        assert!(map.contains_key("log_name_prefix"));
        assert!(map.contains_key("padded_key"));
    }

    #[test]
    fn test_mapping_rejects_normalization_collisions() {
        let value: serde_yaml::Value =
            serde_yaml::from_str("log name prefix: a_\nlog_name_prefix: b_").unwrap();
        let err = mapping_from_yaml(value, Path::new("x.yaml"), true).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey { .. }));
    }

    #[test]
    fn test_mapping_rejects_scalar_top_level() {
        let value: serde_yaml::Value = serde_yaml::from_str("just a string").unwrap();
        let err = mapping_from_yaml(value, Path::new("x.yaml"), true).unwrap_err();
        assert!(matches!(err, ConfigError::TopLevelNotMapping(_)));
    }

    #[test]
    fn test_auth_keys_are_not_normalized() {
        let value: serde_yaml::Value = serde_yaml::from_str("bearer token: x").unwrap();
        let map = mapping_from_yaml(value, Path::new("auth.yaml"), false).unwrap();
        assert!(map.contains_key("bearer token"));
        assert!(!map.contains_key("bearer_token"));
    }

    #[test]
    fn test_decide_log_dir_defaults() {
        assert_eq!(
            decide_log_dir(&ConfigMap::new()),
            PathBuf::from(DEFAULT_LOG_DIR)
        );
    }

    #[test]
    fn test_decide_log_dir_uses_configured_directory() {
        let mut config = ConfigMap::new();
        config.insert(
            LOG_DIR_KEY.to_string(),
            ConfigValue::String("custom/logs".to_string()),
        );
        assert_eq!(decide_log_dir(&config), PathBuf::from("custom/logs"));
    }

    #[test]
    fn test_decide_log_dir_falls_back_when_path_is_a_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not_a_dir");
        fs::write(&file, "occupied").unwrap();

        let mut config = ConfigMap::new();
        config.insert(
            LOG_DIR_KEY.to_string(),
            ConfigValue::String(file.to_string_lossy().into_owned()),
        );
        assert_eq!(decide_log_dir(&config), PathBuf::from(DEFAULT_LOG_DIR));
    }

    #[test]
    fn test_log_name_prefix_defaults_to_empty() {
        assert_eq!(log_name_prefix(&ConfigMap::new()), "");
        let mut config = ConfigMap::new();
        config.insert(
            LOG_PREFIX_KEY.to_string(),
            ConfigValue::String("run_".to_string()),
        );
        assert_eq!(log_name_prefix(&config), "run_");
    }

    #[test]
    fn test_load_auth_rejects_missing_file() {
        let err = load_auth("no/such/auth.yaml", &RuleSet::new()).unwrap_err();
        assert!(matches!(err, ConfigError::AuthPath(_)));
    }
}
