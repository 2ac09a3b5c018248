//! Error types for property operations.
//!
//! Argument validation failures and (when configured) rejected
//! dependency edges are represented by the `PropertyError` enum.

use crate::graph::PropertyKey;
use crate::modifier::ModifierKind;
use crate::property_id::PropertyId;
use thiserror::Error;

/// Format a cycle path as a readable string.
pub(crate) fn format_cycle_path(path: &[PropertyId]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors that can occur while mutating or reading properties.
///
/// # Examples
///
/// ```rust
/// use zzprop::{ModifierKind, PropertyError};
///
/// let err = PropertyError::InvalidModifier {
///     kind: ModifierKind::Add,
///     reason: "value is NaN".into(),
/// };
/// assert!(err.to_string().contains("Add"));
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropertyError {
    /// The handle does not refer to a live property.
    ///
    /// Either it was never issued by this graph or the property
    /// has since been removed.
    #[error("Unknown property: {0:?}")]
    UnknownProperty(PropertyKey),

    /// A modifier was rejected before touching the collection.
    #[error("Invalid {kind:?} modifier: {reason}")]
    InvalidModifier { kind: ModifierKind, reason: String },

    /// Linking the dependency would close a cycle.
    ///
    /// The path reads as "depends on" edges and starts and ends with the
    /// same property, e.g. `[A, B, A]`. Only returned when the graph is
    /// configured with `CycleHandling::Error`.
    #[error("Cycle detected: {}", format_cycle_path(.path))]
    Cycle { path: Vec<PropertyId> },

    /// Linking would push some property past the maximum depth.
    ///
    /// `depth` is the deepest chain the new edge would create, counted
    /// from `dependency` through the dependent and everything below it.
    /// Only returned when the graph is configured with `CycleHandling::Error`.
    #[error("Linking {dependency} would reach depth {depth}, maximum is {max}")]
    DepthExceeded {
        dependency: PropertyId,
        depth: usize,
        max: usize,
    },
}
