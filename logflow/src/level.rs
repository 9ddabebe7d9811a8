//! Log level boundary type.
//!
//! The full option/flag level system of the host application is an
//! external collaborator; the engine only needs an ordered severity.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered log severity.
///
/// Ordering follows declaration order: `Trace` is the lowest severity
/// and `Critical` the highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Fine-grained tracing.
    Trace,
    /// Debug diagnostics.
    Debug,
    /// Routine information.
    #[default]
    Info,
    /// Something unexpected but recoverable.
    Warning,
    /// An operation failed.
    Error,
    /// The process is in trouble.
    Critical,
}

impl Level {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" | "fatal" => Ok(Self::Critical),
            other => Err(ConfigError::new(format!("unknown log level '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Info < Level::Warning);
        assert!(Level::Error < Level::Critical);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("warning".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warning);
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_display() {
        assert_eq!(Level::Error.to_string(), "error");
    }

    #[test]
    fn test_level_serde() {
        let json = serde_json::to_string(&Level::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let back: Level = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Level::Critical);
    }
}
