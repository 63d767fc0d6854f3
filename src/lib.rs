//! Config Tools - YAML configuration loading and validation
//!
//! Config Tools loads a YAML configuration file, validates it against a
//! declarative rule set, optionally loads a secondary authentication file
//! with its own rules, and wires up a rotating-file logger. Sensitive
//! sub-trees and the logger handle always serialize as opaque placeholders.
//!
//! # Pipeline
//!
//! Loading is a linear sequence of fallible steps; any failure aborts the
//! whole construction:
//!
//! 1. Path resolution (`.yaml` file, not a directory)
//! 2. YAML parse (top level must be a mapping)
//! 3. Key normalization (trim, spaces to underscores)
//! 4. Logger acquisition (stdout + size-rotated file)
//! 5. Rule validation of the primary config
//! 6. Optional authentication file, redacted and validated
//! 7. One secret-redacted completion log line
//!
//! # Example
//!
//! ```no_run
//! use config_tools::{rules, ConfigLoader, RuleSet};
//!
//! fn main() -> Result<(), config_tools::ConfigError> {
//!     let config_rules = RuleSet::new()
//!         .required("qTest_domain", rules::https_url)
//!         .required("retry_attempts", rules::int_range(Some(0), None));
//!     let loader = ConfigLoader::load_with_rules(
//!         "config.yaml",
//!         config_rules,
//!         rules::default_auth_rules(),
//!     )?;
//!     println!("{}", loader.render_for_log()?);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod loader;
pub mod logging;
pub mod rules;
pub mod sensitive;
pub mod validator;
pub mod value;

// Re-export commonly used types for convenience
pub use error::{ConfigError, ValidationError};
pub use loader::{ConfigLoader, DEFAULT_LOG_DIR};
pub use logging::{LoggerHandle, LoggerRegistry};
pub use rules::{default_auth_rules, default_config_rules, Rule, RuleSet};
pub use sensitive::SensitiveDict;
pub use validator::ConfigValidator;
pub use value::{ConfigMap, ConfigValue};
