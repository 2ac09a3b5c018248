//! Property names.
//!
//! A `PropertyId` is the caller-assigned name of a property. The graph
//! never looks properties up by name, so two properties may share one;
//! names only show up in cycle paths, snapshots and log records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared, immutable property name.
///
/// Serialized as a plain string.
///
/// # Examples
///
/// ```rust
/// use zzprop::PropertyId;
///
/// let satiety = PropertyId::new("Satiety");
/// let owned: PropertyId = format!("Sati{}", "ety").into();
///
/// assert_eq!(satiety, owned);
/// assert_eq!(satiety.to_string(), "Satiety");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PropertyId(Arc<str>);

impl PropertyId {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PropertyId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PropertyId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<PropertyId> for String {
    fn from(id: PropertyId) -> Self {
        id.0.as_ref().to_owned()
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
