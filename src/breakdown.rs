//! Pipeline breakdowns.
//!
//! A `Breakdown` records how a property's final value was reached: the
//! base value, then the running value after each modifier group. Useful
//! for debugging and tooltips.

use crate::error::PropertyError;
use crate::graph::{PropertyGraph, PropertyKey};
use crate::modifier::ModifierKind;
use crate::property_id::PropertyId;
use crate::strategy::{apply_modifiers_traced, strategy_for};
use serde::{Deserialize, Serialize};

/// Running value after one modifier group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownStep {
    pub kind: ModifierKind,
    /// Number of modifiers folded in this step.
    pub count: usize,
    pub description: String,
    /// Value after the group was applied.
    pub value: f64,
}

/// Step-by-step evaluation of one property.
///
/// # Examples
///
/// ```rust
/// use zzprop::{Modifier, PropertyGraph};
///
/// let mut graph = PropertyGraph::new();
/// let hp = graph.insert("Health", 100.0);
/// graph.add_modifier(hp, Modifier::add(0, 10.0)).unwrap();
/// graph.add_modifier(hp, Modifier::multiply(0, 2.0)).unwrap();
///
/// let breakdown = graph.explain(hp).unwrap();
/// assert_eq!(breakdown.base_value, 100.0);
/// assert_eq!(breakdown.steps.len(), 2);
/// assert_eq!(breakdown.value, 220.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub property: PropertyId,
    pub base_value: f64,
    pub steps: Vec<BreakdownStep>,
    pub value: f64,
}

impl PropertyGraph {
    /// Recompute a property and record every pipeline step.
    ///
    /// Dependencies are refreshed first. For volatile properties the
    /// breakdown reflects a fresh sample and may differ from the cached
    /// value.
    pub fn explain(&mut self, key: PropertyKey) -> Result<Breakdown, PropertyError> {
        self.value(key)?;
        let property = &self.graph[key.0];
        let (value, steps) =
            apply_modifiers_traced(property.base_value, &property.modifiers, &mut self.rng);

        Ok(Breakdown {
            property: property.id.clone(),
            base_value: property.base_value,
            steps: steps
                .into_iter()
                .map(|(kind, count, value)| BreakdownStep {
                    kind,
                    count,
                    description: strategy_for(kind).description().to_string(),
                    value,
                })
                .collect(),
            value,
        })
    }
}
