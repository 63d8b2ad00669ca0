//! Type-safe identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::errors::{EmberError, Result};

/// A validated, case-folded configuration name.
///
/// Names must be non-empty and contain only ASCII letters, digits, `.` and
/// `_`. They are lowered at construction, so `System.Port` and `system.port`
/// name the same variable.
///
/// # Example
///
/// ```
/// use ember_types::ConfigName;
///
/// let name = ConfigName::new("System.Port").unwrap();
/// assert_eq!(name.as_str(), "system.port");
///
/// // Invalid names are rejected
/// assert!(ConfigName::new("bad name!").is_err());
/// assert!(ConfigName::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigName(String);

impl ConfigName {
    /// Create a new validated configuration name.
    ///
    /// # Errors
    ///
    /// Returns `EmberError::InvalidName` if the name is empty or contains a
    /// character outside the allowed set.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        if !Self::is_valid(name) {
            return Err(EmberError::InvalidName(name.to_string()));
        }
        Ok(Self(name.to_ascii_lowercase()))
    }

    /// Check if a name is valid without allocating.
    pub fn is_valid(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dotted path segments, e.g. `["system", "port"]`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for ConfigName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConfigName {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ConfigName {
    type Error = EmberError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ConfigName> for String {
    fn from(name: ConfigName) -> Self {
        name.0
    }
}

impl AsRef<str> for ConfigName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_config_name_validation() {
        assert!(ConfigName::new("system.port").is_ok());
        assert!(ConfigName::new("System.Port").is_ok());
        assert!(ConfigName::new("log_level.v2").is_ok());

        assert!(ConfigName::new("bad name!").is_err());
        assert!(ConfigName::new("").is_err());
        assert!(ConfigName::new("dash-name").is_err());
        assert!(ConfigName::new("tags[0]").is_err());
    }

    #[test]
    fn test_config_name_case_folding() {
        let name = ConfigName::new("System.Port").unwrap();
        assert_eq!(name.as_str(), "system.port");
        assert_eq!(name, "SYSTEM.PORT".parse().unwrap());
    }

    #[test]
    fn test_config_name_segments() {
        let name = ConfigName::new("a.b.c").unwrap();
        assert_eq!(name.segments().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_config_name_serde() {
        let name: ConfigName = serde_json::from_str("\"Logs.Root\"").unwrap();
        assert_eq!(name.as_str(), "logs.root");
        assert!(serde_json::from_str::<ConfigName>("\"bad name\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_valid_names_fold_and_survive_serde(raw in "[A-Za-z0-9._]{1,40}") {
            let name = ConfigName::new(&raw).unwrap();
            prop_assert_eq!(name.as_str(), raw.to_ascii_lowercase());

            let json = serde_json::to_string(&name).unwrap();
            let back: ConfigName = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, name);
        }

        #[test]
        fn prop_foreign_characters_are_rejected(
            head in "[A-Za-z0-9._]{0,10}",
            bad in "[^A-Za-z0-9._]",
            tail in "[A-Za-z0-9._]{0,10}",
        ) {
            let raw = format!("{}{}{}", head, bad, tail);
            prop_assert!(ConfigName::new(&raw).is_err());
            prop_assert!(!ConfigName::is_valid(&raw));
        }
    }
}
