//! Declarative chain configuration.
//!
//! A chain specification is plain data: a list of stage configurations
//! resolved once per logger name by the builder. Stage-local settings
//! (capacities, mappings, thresholds) live here, not in reflection at
//! call time.

use crate::level::Level;
use serde::{Deserialize, Serialize};

/// Precision of the elapsed-time stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ElapsedPrecision {
    /// Whole seconds.
    Seconds,
    /// Milliseconds.
    #[default]
    Millis,
    /// Microseconds.
    Micros,
}

/// A single rename/recase rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenameRule {
    /// Removes every match of a regex pattern from property names.
    RemovePattern {
        /// The pattern to remove.
        pattern: String,
    },
    /// Replaces one exact property name with another.
    Replace {
        /// The name to replace.
        from: String,
        /// The replacement name.
        to: String,
    },
    /// Recases the named properties to camelCase. An empty list applies
    /// to every deliverable property.
    CamelCase {
        /// The property names to recase.
        #[serde(default)]
        names: Vec<String>,
    },
}

/// Configuration of one main-chain stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageConfig {
    /// Forward only records at or above a level.
    Filter {
        /// The minimum level forwarded.
        min_level: Level,
    },
    /// Flatten and serialize non-primitive property values.
    Destructure,
    /// Apply rename and recase rules to property names.
    Rename {
        /// The rules, applied in order. Must not be empty.
        rules: Vec<RenameRule>,
    },
}

/// Configuration of one scope-branch stage.
///
/// Listing a stage here opts it in for every scope opened on the
/// logger; each scope gets fresh instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScopeStageConfig {
    /// Stamp correlation ids, including the ancestor chain.
    Correlation,
    /// Stamp elapsed time since the scope opened.
    Elapsed {
        /// The stamp precision.
        #[serde(default)]
        precision: ElapsedPrecision,
    },
    /// Buffer records until flushed. Opt-in; starts enabled when listed.
    Buffer {
        /// Records at or above this level bypass the buffer.
        #[serde(default = "default_bypass_level")]
        bypass_level: Level,
    },
    /// Keep the last N records for diagnostics. Opt-in.
    BoundedCache {
        /// The ring capacity.
        capacity: usize,
    },
}

fn default_bypass_level() -> Level {
    Level::Error
}

/// The declarative specification of a logger's chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChainSpec {
    /// Main-chain stages, between the logger-name head and the echo
    /// terminal, in execution order.
    #[serde(default)]
    pub stages: Vec<StageConfig>,
    /// Stage factories instantiated for each opened scope.
    #[serde(default)]
    pub scope_stages: Vec<ScopeStageConfig>,
}

impl ChainSpec {
    /// Creates an empty specification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_spec_round_trips_through_json() {
        let spec = ChainSpec {
            stages: vec![
                StageConfig::Filter {
                    min_level: Level::Warning,
                },
                StageConfig::Rename {
                    rules: vec![RenameRule::Replace {
                        from: "msg".to_string(),
                        to: "message".to_string(),
                    }],
                },
            ],
            scope_stages: vec![
                ScopeStageConfig::Correlation,
                ScopeStageConfig::Elapsed {
                    precision: ElapsedPrecision::Millis,
                },
            ],
        };

        let json = serde_json::to_string(&spec).unwrap();
        let back: ChainSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_spec_from_declarative_json() {
        let spec: ChainSpec = serde_json::from_str(
            r#"{
                "stages": [
                    {"type": "filter", "min_level": "info"},
                    {"type": "destructure"}
                ],
                "scope_stages": [
                    {"type": "buffer"},
                    {"type": "bounded_cache", "capacity": 16}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(spec.stages.len(), 2);
        assert!(matches!(
            spec.scope_stages[0],
            ScopeStageConfig::Buffer {
                bypass_level: Level::Error
            }
        ));
        assert!(matches!(
            spec.scope_stages[1],
            ScopeStageConfig::BoundedCache { capacity: 16 }
        ));
    }
}
