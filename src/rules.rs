//! Declarative validation rules.
//!
//! A [`RuleSet`] maps config keys to a required flag plus an optional rule
//! function. Rule functions are plain predicates over `(key, value)`; the
//! parameterized ones (`int_range`, `date_range`, `string_in_list`) are
//! closure constructors so a rule set can capture its bounds and allow-lists.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{Duration, Local, NaiveDate};
use regex::Regex;

use crate::error::ValidationError;
use crate::value::ConfigValue;

/// Default look-back window for [`date_range`] when no minimum is supplied.
pub const DEFAULT_DATE_WINDOW_DAYS: i64 = 365;

/// Stored rule function.
pub type ValidatorFn = Box<dyn Fn(&str, &ConfigValue) -> Result<(), ValidationError> + Send + Sync>;

/// A single key's rule: required-ness plus an optional value check.
pub struct Rule {
    /// Whether the key must be present in the config.
    pub required: bool,
    /// Value check invoked when the key is present.
    pub validator: Option<ValidatorFn>,
}

/// Mapping from config key to [`Rule`].
#[derive(Default)]
pub struct RuleSet {
    rules: BTreeMap<String, Rule>,
}

impl RuleSet {
    /// Empty rule set; validation against it trivially succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required key with a value check.
    pub fn required<F>(mut self, key: &str, validator: F) -> Self
    where
        F: Fn(&str, &ConfigValue) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.rules.insert(
            key.to_string(),
            Rule {
                required: true,
                validator: Some(Box::new(validator)),
            },
        );
        self
    }

    /// Add a required key with no value check (presence only).
    pub fn required_key(mut self, key: &str) -> Self {
        self.rules.insert(
            key.to_string(),
            Rule {
                required: true,
                validator: None,
            },
        );
        self
    }

    /// Add an optional key with a value check.
    pub fn optional<F>(mut self, key: &str, validator: F) -> Self
    where
        F: Fn(&str, &ConfigValue) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.rules.insert(
            key.to_string(),
            Rule {
                required: false,
                validator: Some(Box::new(validator)),
            },
        );
        self
    }

    /// Iterate rules by key.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Rule)> {
        self.rules.iter()
    }

    /// Look up the rule for a key.
    pub fn get(&self, key: &str) -> Option<&Rule> {
        self.rules.get(key)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the rule set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn expect_string<'v>(key: &str, value: &'v ConfigValue) -> Result<&'v str, ValidationError> {
    value.as_str().ok_or_else(|| ValidationError::NotAString {
        key: key.to_string(),
        found: value.type_name().to_string(),
    })
}

/// The value must be an https URL: case-insensitive `https://` scheme and a
/// trailing `/`. The first failing check is reported.
pub fn https_url(key: &str, value: &ConfigValue) -> Result<(), ValidationError> {
    let url = expect_string(key, value)?;
    if !url.to_lowercase().starts_with("https://") {
        return Err(ValidationError::BadUrlScheme {
            key: key.to_string(),
            value: url.to_string(),
        });
    }
    if !url.ends_with('/') {
        return Err(ValidationError::MissingTrailingSlash {
            key: key.to_string(),
            value: url.to_string(),
        });
    }
    Ok(())
}

/// The value must end with `_` (checked case-insensitively on the whole
/// string, mirroring how log file prefixes are matched downstream).
pub fn log_prefix(key: &str, value: &ConfigValue) -> Result<(), ValidationError> {
    let prefix = expect_string(key, value)?;
    if !prefix.to_lowercase().ends_with('_') {
        return Err(ValidationError::BadLogPrefix {
            key: key.to_string(),
            value: prefix.to_string(),
        });
    }
    Ok(())
}

/// The value must be a string that is non-empty after trimming.
pub fn non_empty_string(key: &str, value: &ConfigValue) -> Result<(), ValidationError> {
    let s = expect_string(key, value)?;
    if s.trim().is_empty() {
        return Err(ValidationError::EmptyString {
            key: key.to_string(),
            value: s.to_string(),
        });
    }
    Ok(())
}

fn bearer_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^Bearer [0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
        )
        .expect("bearer token pattern is valid")
    })
}

/// The value must be a non-empty string of the exact form
/// `Bearer <canonical UUID>` (8-4-4-4-12 hex groups, any case).
pub fn bearer_token(key: &str, value: &ConfigValue) -> Result<(), ValidationError> {
    let token = expect_string(key, value)?;
    if token.trim().is_empty() {
        return Err(ValidationError::EmptyString {
            key: key.to_string(),
            value: token.to_string(),
        });
    }
    if !bearer_token_re().is_match(token) {
        return Err(ValidationError::BadBearerToken {
            key: key.to_string(),
            value: token.to_string(),
        });
    }
    Ok(())
}

/// The value must be an integer within the given bounds. A `None` bound is
/// unbounded on that side.
pub fn int_range(
    min: Option<i64>,
    max: Option<i64>,
) -> impl Fn(&str, &ConfigValue) -> Result<(), ValidationError> + Send + Sync + 'static {
    move |key, value| {
        let Some(n) = value.as_int() else {
            return Err(ValidationError::NotAnInteger {
                key: key.to_string(),
                found: value.type_name().to_string(),
            });
        };
        if let Some(min) = min {
            if n < min {
                return Err(ValidationError::BelowMinimum {
                    key: key.to_string(),
                    value: n,
                    min,
                });
            }
        }
        if let Some(max) = max {
            if n > max {
                return Err(ValidationError::AboveMaximum {
                    key: key.to_string(),
                    value: n,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// The value must be a date (a bare `YYYY-MM-DD` scalar in the YAML source;
/// quoted or malformed date strings are rejected) no earlier than `min`.
/// When `min` is `None` it defaults to [`DEFAULT_DATE_WINDOW_DAYS`] days
/// before today.
pub fn date_range(
    min: Option<NaiveDate>,
) -> impl Fn(&str, &ConfigValue) -> Result<(), ValidationError> + Send + Sync + 'static {
    move |key, value| {
        let Some(date) = value.as_date() else {
            return Err(ValidationError::NotADate {
                key: key.to_string(),
                found: value.type_name().to_string(),
            });
        };
        let floor = min.unwrap_or_else(|| {
            Local::now().date_naive() - Duration::days(DEFAULT_DATE_WINDOW_DAYS)
        });
        if date < floor {
            return Err(ValidationError::DateBeforeMinimum {
                key: key.to_string(),
                value: date,
                min: floor,
            });
        }
        Ok(())
    }
}

/// The value must be a string, or a list of strings, drawn from `allowed`.
/// A single string is promoted to a one-element list before checking; the
/// first disallowed element is reported together with the full allow-list.
pub fn string_in_list<I, S>(
    allowed: I,
) -> impl Fn(&str, &ConfigValue) -> Result<(), ValidationError> + Send + Sync + 'static
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let allowed: Vec<String> = allowed.into_iter().map(Into::into).collect();
    move |key, value| {
        let candidates: Vec<&str> = match value {
            ConfigValue::String(s) => vec![s.as_str()],
            ConfigValue::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(expect_string(key, item)?);
                }
                out
            }
            other => {
                return Err(ValidationError::NotAString {
                    key: key.to_string(),
                    found: other.type_name().to_string(),
                })
            }
        };
        for candidate in candidates {
            if !allowed.iter().any(|a| a == candidate) {
                return Err(ValidationError::NotInAllowList {
                    key: key.to_string(),
                    value: candidate.to_string(),
                    allowed: allowed.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Stock rule set for the primary config file.
pub fn default_config_rules() -> RuleSet {
    RuleSet::new()
        .required("qTest_domain", https_url)
        .required("retry_attempts", int_range(Some(0), None))
        .required("max_concurrent_requests", int_range(Some(1), None))
        .optional("log_name_prefix", log_prefix)
        .optional("target_date", date_range(None))
        .optional("output_filetype", string_in_list(["Excel", "CSV", "SQLite"]))
}

/// Stock rule set for the authentication file.
pub fn default_auth_rules() -> RuleSet {
    RuleSet::new().required("bearer_token", bearer_token)
}
