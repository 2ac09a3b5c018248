//! The property entity.
//!
//! A `Property` holds a base value, the cached final value and the
//! bookkeeping that decides whether that cache can be trusted. Edges to
//! other properties live in the owning [`PropertyGraph`](crate::PropertyGraph);
//! the property only records the derived facts (depth, volatility).

use crate::events::{DirtyCallback, Subscribers, ValueChangedCallback};
use crate::modifier::{Modifier, ModifierKind, ModifierSet};
use crate::property_id::PropertyId;

/// A named floating-point attribute with modifiers.
///
/// Read it through [`PropertyGraph::property`](crate::PropertyGraph::property);
/// every mutation goes through the graph so that dependents are kept in
/// sync.
#[derive(Debug)]
pub struct Property {
    pub(crate) id: PropertyId,
    /// Matches the generation of the handle that was issued for it.
    pub(crate) generation: u64,
    pub(crate) base_value: f64,
    pub(crate) cached_value: f64,
    pub(crate) dirty: bool,
    pub(crate) has_volatile_modifier: bool,
    pub(crate) has_volatile_dependency: bool,
    pub(crate) depth: usize,
    pub(crate) modifiers: ModifierSet,
    /// Set while this property is on the evaluation stack.
    pub(crate) resolving: bool,
    pub(crate) on_dirty: Subscribers<DirtyCallback>,
    pub(crate) on_value_changed: Subscribers<ValueChangedCallback>,
}

impl Property {
    /// A fresh, dirty property whose cache starts at its base value.
    pub(crate) fn new(id: PropertyId, base_value: f64) -> Self {
        Self {
            id,
            generation: 0,
            base_value,
            cached_value: base_value,
            dirty: true,
            has_volatile_modifier: false,
            has_volatile_dependency: false,
            depth: 0,
            modifiers: ModifierSet::new(),
            resolving: false,
            on_dirty: Subscribers::default(),
            on_value_changed: Subscribers::default(),
        }
    }

    pub fn id(&self) -> &PropertyId {
        &self.id
    }

    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    /// The last computed final value. May be stale; see [`is_cache_clean`](Self::is_cache_clean).
    pub fn cached_value(&self) -> f64 {
        self.cached_value
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn has_volatile_modifier(&self) -> bool {
        self.has_volatile_modifier
    }

    pub fn has_volatile_dependency(&self) -> bool {
        self.has_volatile_dependency
    }

    /// Whether reads of this property can ever be served from cache.
    pub fn is_volatile(&self) -> bool {
        self.has_volatile_modifier || self.has_volatile_dependency
    }

    /// Whether the cached value can be returned without recomputation.
    pub fn is_cache_clean(&self) -> bool {
        !self.dirty && !self.is_volatile()
    }

    /// Longest path to a property with no dependencies (0 for leaves).
    pub fn dependency_depth(&self) -> usize {
        self.depth
    }

    pub fn modifiers(&self) -> &ModifierSet {
        &self.modifiers
    }

    pub fn has_modifiers(&self) -> bool {
        !self.modifiers.is_empty()
    }

    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    pub fn contains_modifier_of_kind(&self, kind: ModifierKind) -> bool {
        self.modifiers.contains_kind(kind)
    }

    pub fn modifier_count_of_kind(&self, kind: ModifierKind) -> usize {
        self.modifiers.count_of_kind(kind)
    }

    /// Number of active dirty and value-changed subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.on_dirty.len() + self.on_value_changed.len()
    }

    /// Insert a validated modifier. Returns whether volatility changed.
    pub(crate) fn insert_modifier(&mut self, modifier: Modifier) -> bool {
        self.modifiers.insert(modifier);
        if modifier.is_volatile() && !self.has_volatile_modifier {
            self.has_volatile_modifier = true;
            return true;
        }
        false
    }

    /// Remove one equal modifier. Returns `(removed, volatility_changed)`.
    ///
    /// The volatile flag is only rescanned when a volatile modifier leaves.
    pub(crate) fn remove_modifier(&mut self, modifier: &Modifier) -> (bool, bool) {
        if !self.modifiers.remove(modifier) {
            return (false, false);
        }
        if modifier.is_volatile() {
            let was = self.has_volatile_modifier;
            self.has_volatile_modifier = self.modifiers.has_volatile();
            return (true, was != self.has_volatile_modifier);
        }
        (true, false)
    }

    /// Drop every modifier. Returns whether volatility changed.
    pub(crate) fn clear_modifiers(&mut self) -> bool {
        self.modifiers.clear();
        let was = self.has_volatile_modifier;
        self.has_volatile_modifier = false;
        was
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_property_is_dirty() {
        let p = Property::new(PropertyId::new("Health"), 100.0);
        assert!(p.is_dirty());
        assert!(!p.is_cache_clean());
        assert_eq!(p.cached_value(), 100.0);
        assert_eq!(p.dependency_depth(), 0);
        assert!(!p.has_modifiers());
    }

    #[test]
    fn test_volatile_flag_tracks_range_modifiers() {
        let mut p = Property::new(PropertyId::new("Damage"), 10.0);
        let range = Modifier::range(0, 1.0, 2.0);

        assert!(p.insert_modifier(range));
        assert!(!p.insert_modifier(range));
        assert!(p.has_volatile_modifier());

        assert_eq!(p.remove_modifier(&range), (true, false));
        assert!(p.has_volatile_modifier());
        assert_eq!(p.remove_modifier(&range), (true, true));
        assert!(!p.has_volatile_modifier());
        assert_eq!(p.remove_modifier(&range), (false, false));
    }

    #[test]
    fn test_clamp_is_not_volatile() {
        let mut p = Property::new(PropertyId::new("Health"), 10.0);
        assert!(!p.insert_modifier(Modifier::range_clamp(0, 0.0, 5.0)));
        assert!(!p.is_volatile());
    }

    #[test]
    fn test_queries() {
        let mut p = Property::new(PropertyId::new("Health"), 10.0);
        p.insert_modifier(Modifier::add(0, 1.0));
        p.insert_modifier(Modifier::add(1, 2.0));
        p.insert_modifier(Modifier::multiply(0, 2.0));

        assert_eq!(p.modifier_count(), 3);
        assert!(p.contains_modifier_of_kind(ModifierKind::Add));
        assert!(!p.contains_modifier_of_kind(ModifierKind::Override));
        assert_eq!(p.modifier_count_of_kind(ModifierKind::Add), 2);

        assert!(!p.clear_modifiers());
        assert_eq!(p.modifier_count(), 0);
    }
}
