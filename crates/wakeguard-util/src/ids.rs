//! Strongly-typed identifiers for wakeguard

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of an OS-wide instance lock
///
/// There is one name per suppression kind, so a declarative instance and a
/// synthetic-input instance may run side by side, but never two of the same
/// kind. Names double as file stems under the runtime directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceName(String);

impl InstanceName {
    pub const DECLARATIVE: &'static str = "wakeguard.declarative";
    pub const SYNTHETIC_INPUT: &'static str = "wakeguard.synthetic";

    /// Create an instance name, replacing characters that are unsafe in a
    /// file name with `_`
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name
            .into()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self(name)
    }

    pub fn declarative() -> Self {
        Self::new(Self::DECLARATIVE)
    }

    pub fn synthetic_input() -> Self {
        Self::new(Self::SYNTHETIC_INPUT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstanceName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
