//! Persistable property state.
//!
//! A snapshot holds the id, base value and modifiers of one property.
//! Dependency edges and calculators are behavior, not data, and must be
//! linked again by whoever restores the snapshot.

use crate::error::PropertyError;
use crate::graph::{PropertyGraph, PropertyKey};
use crate::modifier::Modifier;
use crate::property_id::PropertyId;
use serde::{Deserialize, Serialize};

/// Serializable state of a single property.
///
/// # Examples
///
/// ```rust
/// use zzprop::{Modifier, PropertyGraph};
///
/// let mut graph = PropertyGraph::new();
/// let hp = graph.insert("Health", 100.0);
/// graph.add_modifier(hp, Modifier::add(1, 10.0)).unwrap();
///
/// let json = serde_json::to_string(&graph.snapshot(hp).unwrap()).unwrap();
///
/// let mut other = PropertyGraph::new();
/// let restored = other.restore(&serde_json::from_str(&json).unwrap()).unwrap();
/// assert_eq!(other.value(restored).unwrap(), 110.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub id: PropertyId,
    pub base_value: f64,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl PropertyGraph {
    /// Capture a property's id, base value and modifiers.
    pub fn snapshot(&self, key: PropertyKey) -> Result<PropertySnapshot, PropertyError> {
        let property = self.node(key)?;
        Ok(PropertySnapshot {
            id: property.id.clone(),
            base_value: property.base_value,
            modifiers: property.modifiers.iter().copied().collect(),
        })
    }

    /// Insert a new property from a snapshot.
    ///
    /// # Errors
    ///
    /// `PropertyError::InvalidModifier` if any modifier is malformed, in
    /// which case nothing is inserted.
    pub fn restore(&mut self, snapshot: &PropertySnapshot) -> Result<PropertyKey, PropertyError> {
        for modifier in &snapshot.modifiers {
            modifier.validate()?;
        }
        let key = self.insert(snapshot.id.clone(), snapshot.base_value);
        self.add_modifiers(key, &snapshot.modifiers)?;
        Ok(key)
    }
}
