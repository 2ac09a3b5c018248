//! Graph configuration.
//!
//! `GraphConfig` carries the tunables shared by every property in a
//! graph. Every field has a default, so a partial JSON document is
//! enough to override one setting.

use serde::{Deserialize, Serialize};

/// Tolerance used for every float comparison in the engine.
pub const DEFAULT_EPSILON: f64 = 1e-4;

/// Longest allowed chain of dependencies below a property.
pub const DEFAULT_MAX_DEPENDENCY_DEPTH: usize = 100;

/// What `add_dependency` does with an edge that would form a cycle or
/// exceed the depth limit.
///
/// In both modes the graph is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleHandling {
    /// Log a warning and return success.
    #[default]
    Reject,
    /// Return `PropertyError::Cycle` or `PropertyError::DepthExceeded`.
    Error,
}

/// Configuration for a [`PropertyGraph`](crate::PropertyGraph).
///
/// # Examples
///
/// ```rust
/// use zzprop::config::{CycleHandling, GraphConfig};
///
/// let config = GraphConfig::from_json(r#"{ "cycle_handling": "error" }"#).unwrap();
/// assert_eq!(config.cycle_handling, CycleHandling::Error);
/// assert_eq!(config.max_dependency_depth, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Changes at or below this magnitude are treated as no change.
    pub epsilon: f64,
    /// A dependency whose own depth has reached this value is refused.
    pub max_dependency_depth: usize,
    pub cycle_handling: CycleHandling,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            max_dependency_depth: DEFAULT_MAX_DEPENDENCY_DEPTH,
            cycle_handling: CycleHandling::default(),
        }
    }
}

impl GraphConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether `a` and `b` are equal within `epsilon`.
    pub fn approx_eq(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.epsilon, DEFAULT_EPSILON);
        assert_eq!(config.max_dependency_depth, DEFAULT_MAX_DEPENDENCY_DEPTH);
        assert_eq!(config.cycle_handling, CycleHandling::Reject);
    }

    #[test]
    fn test_partial_json() {
        let config = GraphConfig::from_json(r#"{ "max_dependency_depth": 3 }"#).unwrap();
        assert_eq!(config.max_dependency_depth, 3);
        assert_eq!(config.epsilon, DEFAULT_EPSILON);
    }

    #[test]
    fn test_approx_eq() {
        let config = GraphConfig::default();
        assert!(config.approx_eq(1.0, 1.00005));
        assert!(!config.approx_eq(1.0, 1.001));
    }
}
