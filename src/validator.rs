//! Rule application over a parsed config mapping.

use crate::error::ValidationError;
use crate::rules::RuleSet;
use crate::value::{ConfigMap, ConfigValue};

/// Applies a [`RuleSet`] to a [`ConfigMap`].
///
/// Validation is allow-list by omission: config keys without a rule are
/// ignored. Failures are fail-fast; the first violation encountered in rule
/// iteration order aborts the pass.
pub struct ConfigValidator<'a> {
    config: &'a ConfigMap,
    rules: &'a RuleSet,
}

impl<'a> ConfigValidator<'a> {
    /// Borrow a config and the rules to check it against.
    pub fn new(config: &'a ConfigMap, rules: &'a RuleSet) -> Self {
        Self { config, rules }
    }

    /// Run the rules.
    ///
    /// For each rule: a required key that is absent (or explicitly null)
    /// fails immediately; a present value is handed to the rule's validator
    /// function, whose failure propagates unchanged. Succeeds with no other
    /// effect.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (key, rule) in self.rules.iter() {
            match self.config.get(key) {
                None | Some(ConfigValue::Null) => {
                    if rule.required {
                        return Err(ValidationError::MissingRequiredKey(key.clone()));
                    }
                }
                Some(value) => {
                    if let Some(validator) = &rule.validator {
                        validator(key, value)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{self, RuleSet};

    fn config(pairs: &[(&str, ConfigValue)]) -> ConfigMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_valid_config_passes() {
        let cfg = config(&[
            (
                "qTest_domain",
                ConfigValue::String("https://example.com/".to_string()),
            ),
            ("timeout", ConfigValue::Int(60)),
            ("retry_attempts", ConfigValue::Int(3)),
        ]);
        let rules = RuleSet::new()
            .required("qTest_domain", rules::https_url)
            .required("timeout", rules::int_range(Some(1), Some(60)))
            .required("retry_attempts", rules::int_range(Some(0), None));
        assert!(ConfigValidator::new(&cfg, &rules).validate().is_ok());
    }

    #[test]
    fn test_missing_required_key_fails() {
        let cfg = config(&[("timeout", ConfigValue::Int(30))]);
        let rules = RuleSet::new().required("api_url", rules::https_url);
        let err = ConfigValidator::new(&cfg, &rules).validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required config key: 'api_url'");
    }

    #[test]
    fn test_explicit_null_counts_as_absent() {
        let cfg = config(&[("api_url", ConfigValue::Null)]);
        let required = RuleSet::new().required("api_url", rules::https_url);
        assert!(matches!(
            ConfigValidator::new(&cfg, &required).validate().unwrap_err(),
            ValidationError::MissingRequiredKey(_)
        ));

        // An optional null is fine and its validator is never invoked.
        let optional = RuleSet::new().optional("api_url", rules::https_url);
        assert!(ConfigValidator::new(&cfg, &optional).validate().is_ok());
    }

    #[test]
    fn test_rule_violation_propagates() {
        let cfg = config(&[(
            "api_url",
            ConfigValue::String("http://example.com/".to_string()),
        )]);
        let rules = RuleSet::new().required("api_url", rules::https_url);
        let err = ConfigValidator::new(&cfg, &rules).validate().unwrap_err();
        assert!(err.to_string().contains("must start with 'https://'"));
    }

    #[test]
    fn test_missing_optional_key_is_ignored() {
        let cfg = config(&[]);
        let rules = RuleSet::new().optional("log_name_prefix", rules::log_prefix);
        assert!(ConfigValidator::new(&cfg, &rules).validate().is_ok());
    }

    #[test]
    fn test_unknown_config_keys_are_ignored() {
        let cfg = config(&[
            ("mystery", ConfigValue::Int(99)),
            ("another", ConfigValue::Bool(false)),
        ]);
        let rules = RuleSet::new();
        assert!(ConfigValidator::new(&cfg, &rules).validate().is_ok());
    }

    #[test]
    fn test_required_key_without_validator_checks_presence_only() {
        let cfg = config(&[("marker", ConfigValue::Bool(true))]);
        let rules = RuleSet::new().required_key("marker");
        assert!(ConfigValidator::new(&cfg, &rules).validate().is_ok());

        let empty = config(&[]);
        assert!(ConfigValidator::new(&empty, &rules).validate().is_err());
    }
}
