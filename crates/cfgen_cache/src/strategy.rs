//! Cache strategies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// When a cache may reuse artifacts it generated earlier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStrategy {
    /// Regenerate on every request; the registry is never trusted.
    Never,
    /// Reuse only while the subject's fingerprint matches the one the
    /// artifact was stamped with.
    #[default]
    Validate,
    /// Reuse whatever is registered, even if the schema changed.
    Always,
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheStrategy::Never => "never",
            CacheStrategy::Validate => "validate",
            CacheStrategy::Always => "always",
        })
    }
}

impl FromStr for CacheStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "never" => Ok(CacheStrategy::Never),
            "validate" => Ok(CacheStrategy::Validate),
            "always" => Ok(CacheStrategy::Always),
            other => Err(format!(
                "unknown cache strategy '{other}', expected never, validate or always"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_validate() {
        assert_eq!(CacheStrategy::default(), CacheStrategy::Validate);
    }

    #[test]
    fn parse_and_display() {
        for s in [CacheStrategy::Never, CacheStrategy::Validate, CacheStrategy::Always] {
            assert_eq!(s.to_string().parse::<CacheStrategy>().unwrap(), s);
        }
        assert_eq!("ALWAYS".parse::<CacheStrategy>().unwrap(), CacheStrategy::Always);
        assert!("sometimes".parse::<CacheStrategy>().is_err());
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&CacheStrategy::Never).unwrap();
        assert_eq!(json, "\"never\"");
        let back: CacheStrategy = serde_json::from_str("\"always\"").unwrap();
        assert_eq!(back, CacheStrategy::Always);
    }
}
