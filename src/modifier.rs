//! Modifier descriptors and their grouped collection.
//!
//! A `Modifier` is an immutable value transform: a kind, a priority and
//! either a scalar or a `[min, max]` range. Properties keep their
//! modifiers in a `ModifierSet`, grouped by kind so the pipeline can fold
//! each group with one strategy.

use crate::error::PropertyError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of value transform a modifier performs.
///
/// The declaration order is the global application order (see
/// [`MODIFIER_ORDER`]); `Ord` is derived so that sorted containers keyed
/// by kind iterate in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// Replaces the running value.
    Override,
    /// Flat bonus applied before the priority multipliers.
    PriorityAdd,
    /// Multiplier applied before the regular additive bonuses.
    PriorityMultiply,
    /// Flat bonus.
    Add,
    /// Random flat bonus resampled from `[min, max]` on every evaluation.
    Range,
    /// Multiplier.
    Multiply,
    /// Flat bonus applied after all multipliers.
    AfterAdd,
    /// Clamps the running value into `[min, max]`.
    RangeClamp,
}

/// The fixed order in which modifier kinds are folded into a value.
///
/// Every property applies its groups in this order regardless of which
/// kinds it actually holds.
pub const MODIFIER_ORDER: [ModifierKind; 8] = [
    ModifierKind::Override,
    ModifierKind::PriorityAdd,
    ModifierKind::PriorityMultiply,
    ModifierKind::Add,
    ModifierKind::Range,
    ModifierKind::Multiply,
    ModifierKind::AfterAdd,
    ModifierKind::RangeClamp,
];

impl ModifierKind {
    /// Whether modifiers of this kind carry a `[min, max]` range instead
    /// of a scalar.
    pub fn uses_range(self) -> bool {
        matches!(self, ModifierKind::Range | ModifierKind::RangeClamp)
    }

    /// Whether modifiers of this kind produce a different result on each
    /// evaluation.
    pub fn is_volatile(self) -> bool {
        self == ModifierKind::Range
    }
}

/// Payload of a modifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModifierValue {
    /// A single number (addend, factor or override target).
    Scalar(f64),
    /// Inclusive bounds for range and clamp kinds.
    Range { min: f64, max: f64 },
}

/// An immutable, prioritized value transform.
///
/// Lower priorities apply earlier within their kind; equal priorities
/// apply in the order they were added.
///
/// # Examples
///
/// ```rust
/// use zzprop::{Modifier, ModifierKind};
///
/// let bonus = Modifier::add(1, 10.0);
/// assert_eq!(bonus.kind(), ModifierKind::Add);
/// assert_eq!(bonus.scalar(), Some(10.0));
///
/// let clamp = Modifier::range_clamp(0, 0.0, 100.0);
/// assert_eq!(clamp.bounds(), Some((0.0, 100.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    kind: ModifierKind,
    priority: i32,
    value: ModifierValue,
}

impl Modifier {
    /// Create a modifier from its raw parts.
    ///
    /// The combination is not checked here; graphs validate modifiers
    /// when they are added.
    pub fn new(kind: ModifierKind, priority: i32, value: ModifierValue) -> Self {
        Self {
            kind,
            priority,
            value,
        }
    }

    pub fn r#override(priority: i32, value: f64) -> Self {
        Self::new(ModifierKind::Override, priority, ModifierValue::Scalar(value))
    }

    pub fn priority_add(priority: i32, value: f64) -> Self {
        Self::new(
            ModifierKind::PriorityAdd,
            priority,
            ModifierValue::Scalar(value),
        )
    }

    pub fn priority_multiply(priority: i32, factor: f64) -> Self {
        Self::new(
            ModifierKind::PriorityMultiply,
            priority,
            ModifierValue::Scalar(factor),
        )
    }

    pub fn add(priority: i32, value: f64) -> Self {
        Self::new(ModifierKind::Add, priority, ModifierValue::Scalar(value))
    }

    pub fn multiply(priority: i32, factor: f64) -> Self {
        Self::new(ModifierKind::Multiply, priority, ModifierValue::Scalar(factor))
    }

    pub fn after_add(priority: i32, value: f64) -> Self {
        Self::new(ModifierKind::AfterAdd, priority, ModifierValue::Scalar(value))
    }

    /// A random bonus drawn uniformly from `[min, max]` on every evaluation.
    pub fn range(priority: i32, min: f64, max: f64) -> Self {
        Self::new(ModifierKind::Range, priority, ModifierValue::Range { min, max })
    }

    pub fn range_clamp(priority: i32, min: f64, max: f64) -> Self {
        Self::new(
            ModifierKind::RangeClamp,
            priority,
            ModifierValue::Range { min, max },
        )
    }

    pub fn kind(&self) -> ModifierKind {
        self.kind
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn value(&self) -> ModifierValue {
        self.value
    }

    /// The scalar payload, or `None` for range-shaped modifiers.
    pub fn scalar(&self) -> Option<f64> {
        match self.value {
            ModifierValue::Scalar(v) => Some(v),
            ModifierValue::Range { .. } => None,
        }
    }

    /// The `(min, max)` payload, or `None` for scalar modifiers.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self.value {
            ModifierValue::Range { min, max } => Some((min, max)),
            ModifierValue::Scalar(_) => None,
        }
    }

    pub fn is_volatile(&self) -> bool {
        self.kind.is_volatile()
    }

    /// Check that the payload is finite and shaped for the kind.
    ///
    /// # Errors
    ///
    /// Returns `PropertyError::InvalidModifier` describing the first
    /// problem found.
    pub fn validate(&self) -> Result<(), PropertyError> {
        let invalid = |reason: &str| PropertyError::InvalidModifier {
            kind: self.kind,
            reason: reason.to_string(),
        };

        match (self.kind.uses_range(), self.value) {
            (false, ModifierValue::Scalar(v)) => {
                if !v.is_finite() {
                    return Err(invalid("value must be finite"));
                }
            }
            (true, ModifierValue::Range { min, max }) => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(invalid("range bounds must be finite"));
                }
                if min > max {
                    return Err(invalid("range minimum exceeds maximum"));
                }
            }
            (true, ModifierValue::Scalar(_)) => {
                return Err(invalid("expected a [min, max] range"));
            }
            (false, ModifierValue::Range { .. }) => {
                return Err(invalid("expected a scalar value"));
            }
        }
        Ok(())
    }
}

/// Modifiers of one property, grouped by kind.
///
/// Groups iterate in [`MODIFIER_ORDER`]. Inside a group modifiers are kept
/// sorted by ascending priority, ties in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifierSet {
    groups: BTreeMap<ModifierKind, Vec<Modifier>>,
    len: usize,
}

impl ModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert after every existing modifier of the same kind whose
    /// priority is lower or equal.
    pub(crate) fn insert(&mut self, modifier: Modifier) {
        let group = self.groups.entry(modifier.kind).or_default();
        let at = group.partition_point(|m| m.priority <= modifier.priority);
        group.insert(at, modifier);
        self.len += 1;
    }

    /// Remove the first modifier equal to `modifier`.
    ///
    /// Returns `false` if none was present.
    pub(crate) fn remove(&mut self, modifier: &Modifier) -> bool {
        let Some(group) = self.groups.get_mut(&modifier.kind) else {
            return false;
        };
        let Some(pos) = group.iter().position(|m| m == modifier) else {
            return false;
        };
        group.remove(pos);
        if group.is_empty() {
            self.groups.remove(&modifier.kind);
        }
        self.len -= 1;
        true
    }

    pub(crate) fn clear(&mut self) {
        self.groups.clear();
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains_kind(&self, kind: ModifierKind) -> bool {
        self.groups.contains_key(&kind)
    }

    pub fn count_of_kind(&self, kind: ModifierKind) -> usize {
        self.groups.get(&kind).map_or(0, Vec::len)
    }

    /// Whether any held modifier is volatile. Scans the range group only.
    pub fn has_volatile(&self) -> bool {
        self.groups
            .get(&ModifierKind::Range)
            .is_some_and(|g| g.iter().any(Modifier::is_volatile))
    }

    /// Non-empty groups in application order.
    pub fn groups(&self) -> impl Iterator<Item = (ModifierKind, &[Modifier])> {
        self.groups.iter().map(|(k, g)| (*k, g.as_slice()))
    }

    /// All modifiers, in application order.
    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.groups.values().flatten()
    }
}
