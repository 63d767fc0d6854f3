//! Redaction wrapper for sensitive configuration sub-trees.

use std::fmt;

use serde::ser::{Serialize, Serializer};

use crate::value::{ConfigMap, SENSITIVE_PLACEHOLDER};

/// Owns the auth mapping and hides it from every generic rendering path.
///
/// `Debug`, `Display`, and `Serialize` all produce the fixed
/// `<SensitiveDict>` placeholder; the wrapped data is reachable only through
/// [`SensitiveDict::data`].
#[derive(Clone, PartialEq)]
pub struct SensitiveDict {
    data: ConfigMap,
}

impl SensitiveDict {
    /// Wrap a mapping.
    pub fn new(data: ConfigMap) -> Self {
        Self { data }
    }

    /// Explicit accessor for the wrapped mapping.
    pub fn data(&self) -> &ConfigMap {
        &self.data
    }
}

impl fmt::Debug for SensitiveDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(SENSITIVE_PLACEHOLDER)
    }
}

impl fmt::Display for SensitiveDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(SENSITIVE_PLACEHOLDER)
    }
}

impl Serialize for SensitiveDict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(SENSITIVE_PLACEHOLDER)
    }
}
