//! Value resolution and propagation.
//!
//! Reads pull: a dirty property first refreshes its dependencies, then
//! runs its modifier pipeline. Writes push: every mutation recomputes the
//! property at once and, if its final value moved beyond epsilon, walks
//! its dependents depth-first in link order.

use crate::error::PropertyError;
use crate::events::{DirtyCallback, SubscriptionId, ValueChanged, ValueChangedCallback};
use crate::graph::{DependencyUpdate, PropertyGraph, PropertyKey};
use crate::modifier::Modifier;
use crate::strategy::apply_modifiers;
use std::sync::Arc;

impl PropertyGraph {
    pub fn base_value(&self, key: PropertyKey) -> Result<f64, PropertyError> {
        Ok(self.node(key)?.base_value)
    }

    /// Final value of a property.
    ///
    /// Served from cache when the property is clean and not volatile;
    /// otherwise recomputed, which may fire change notifications and
    /// update dependents.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use zzprop::{Modifier, PropertyGraph};
    ///
    /// let mut graph = PropertyGraph::new();
    /// let hp = graph.insert("Health", 100.0);
    /// graph.add_modifier(hp, Modifier::add(1, 10.0)).unwrap();
    /// graph.add_modifier(hp, Modifier::multiply(1, 1.5)).unwrap();
    ///
    /// assert_eq!(graph.value(hp).unwrap(), 165.0);
    /// ```
    pub fn value(&mut self, key: PropertyKey) -> Result<f64, PropertyError> {
        self.node(key)?;
        Ok(self.evaluate(key))
    }

    /// Assign a new base value and recompute immediately.
    ///
    /// Writes within epsilon of the current base are ignored.
    pub fn set_base_value(
        &mut self,
        key: PropertyKey,
        value: f64,
    ) -> Result<&mut Self, PropertyError> {
        let current = self.node(key)?.base_value;
        if self.config.approx_eq(current, value) {
            return Ok(self);
        }
        self.graph[key.0].base_value = value;
        self.make_dirty_inner(key);
        self.evaluate(key);
        Ok(self)
    }

    /// Mark a property stale and notify its dirty subscribers.
    ///
    /// Nothing is recomputed until the next read or write.
    pub fn make_dirty(&mut self, key: PropertyKey) -> Result<&mut Self, PropertyError> {
        self.node(key)?;
        self.make_dirty_inner(key);
        Ok(self)
    }

    /// Add one modifier.
    ///
    /// # Errors
    ///
    /// `PropertyError::InvalidModifier` if the modifier fails validation;
    /// the property is left untouched.
    pub fn add_modifier(
        &mut self,
        key: PropertyKey,
        modifier: Modifier,
    ) -> Result<&mut Self, PropertyError> {
        self.node(key)?;
        modifier.validate()?;
        let volatility_changed = self.graph[key.0].insert_modifier(modifier);
        self.modifiers_changed(key, volatility_changed);
        Ok(self)
    }

    /// Add modifiers in order, stopping at the first invalid one.
    ///
    /// Modifiers before the failing one stay applied.
    pub fn add_modifiers(
        &mut self,
        key: PropertyKey,
        modifiers: &[Modifier],
    ) -> Result<&mut Self, PropertyError> {
        self.node(key)?;
        let mut applied = false;
        let mut volatility_changed = false;
        let mut failure = None;

        for modifier in modifiers {
            if let Err(err) = modifier.validate() {
                failure = Some(err);
                break;
            }
            volatility_changed |= self.graph[key.0].insert_modifier(*modifier);
            applied = true;
        }

        if applied {
            self.modifiers_changed(key, volatility_changed);
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    /// Remove one modifier equal to `modifier`. Absent modifiers are ignored.
    pub fn remove_modifier(
        &mut self,
        key: PropertyKey,
        modifier: Modifier,
    ) -> Result<&mut Self, PropertyError> {
        self.node(key)?;
        let (removed, volatility_changed) = self.graph[key.0].remove_modifier(&modifier);
        if removed {
            self.modifiers_changed(key, volatility_changed);
        }
        Ok(self)
    }

    pub fn remove_modifiers(
        &mut self,
        key: PropertyKey,
        modifiers: &[Modifier],
    ) -> Result<&mut Self, PropertyError> {
        self.node(key)?;
        let mut any_removed = false;
        let mut volatility_changed = false;
        for modifier in modifiers {
            let (removed, changed) = self.graph[key.0].remove_modifier(modifier);
            any_removed |= removed;
            volatility_changed |= changed;
        }
        if any_removed {
            self.modifiers_changed(key, volatility_changed);
        }
        Ok(self)
    }

    pub fn clear_modifiers(&mut self, key: PropertyKey) -> Result<&mut Self, PropertyError> {
        self.node(key)?;
        let volatility_changed = self.graph[key.0].clear_modifiers();
        self.modifiers_changed(key, volatility_changed);
        Ok(self)
    }

    /// Subscribe to dirty notifications.
    ///
    /// Registering the same `Arc` again returns the existing id.
    pub fn on_dirty(
        &mut self,
        key: PropertyKey,
        callback: Arc<DirtyCallback>,
    ) -> Result<SubscriptionId, PropertyError> {
        let next = &mut self.next_subscription;
        let node = self
            .graph
            .node_weight_mut(key.0)
            .filter(|p| p.generation == key.1)
            .ok_or(PropertyError::UnknownProperty(key))?;
        Ok(node.on_dirty.subscribe(next, callback))
    }

    /// Returns whether a subscription was removed.
    pub fn remove_on_dirty(
        &mut self,
        key: PropertyKey,
        id: SubscriptionId,
    ) -> Result<bool, PropertyError> {
        Ok(self.node_mut(key)?.on_dirty.unsubscribe(id))
    }

    /// Subscribe to value-changed notifications.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::{Arc, Mutex};
    /// use zzprop::PropertyGraph;
    ///
    /// let mut graph = PropertyGraph::new();
    /// let hp = graph.insert("Health", 100.0);
    ///
    /// let seen = Arc::new(Mutex::new(Vec::new()));
    /// let sink = seen.clone();
    /// graph
    ///     .on_value_changed(hp, Arc::new(move |e: &zzprop::ValueChanged| {
    ///         sink.lock().unwrap().push((e.old, e.new));
    ///     }))
    ///     .unwrap();
    ///
    /// graph.set_base_value(hp, 80.0).unwrap();
    /// assert_eq!(*seen.lock().unwrap(), vec![(100.0, 80.0)]);
    /// ```
    pub fn on_value_changed(
        &mut self,
        key: PropertyKey,
        callback: Arc<ValueChangedCallback>,
    ) -> Result<SubscriptionId, PropertyError> {
        let next = &mut self.next_subscription;
        let node = self
            .graph
            .node_weight_mut(key.0)
            .filter(|p| p.generation == key.1)
            .ok_or(PropertyError::UnknownProperty(key))?;
        Ok(node.on_value_changed.subscribe(next, callback))
    }

    pub fn remove_on_value_changed(
        &mut self,
        key: PropertyKey,
        id: SubscriptionId,
    ) -> Result<bool, PropertyError> {
        Ok(self.node_mut(key)?.on_value_changed.unsubscribe(id))
    }

    pub(crate) fn make_dirty_inner(&mut self, key: PropertyKey) {
        let property = &mut self.graph[key.0];
        property.dirty = true;
        for callback in property.on_dirty.iter() {
            callback(key);
        }
    }

    fn modifiers_changed(&mut self, key: PropertyKey, volatility_changed: bool) {
        if volatility_changed {
            self.refresh_links(key);
        }
        self.make_dirty_inner(key);
        self.evaluate(key);
    }

    /// Recompute `key` if its cache cannot be trusted. `key` must be live.
    ///
    /// A property already on the evaluation stack answers from its cache.
    pub(crate) fn evaluate(&mut self, key: PropertyKey) -> f64 {
        let property = &self.graph[key.0];
        if property.resolving || property.is_cache_clean() {
            return property.cached_value;
        }
        let pull_dependencies = property.dirty;
        self.graph[key.0].resolving = true;

        if pull_dependencies {
            for dependency in self.dependency_keys(key.0) {
                self.evaluate(dependency);
            }
        }

        let property = &self.graph[key.0];
        let result = apply_modifiers(property.base_value, &property.modifiers, &mut self.rng);
        let old = property.cached_value;

        let property = &mut self.graph[key.0];
        property.cached_value = result;
        property.dirty = property.is_volatile();
        tracing::trace!(property = %property.id, old, new = result, "recomputed");

        if !self.config.approx_eq(old, result) {
            self.notify_changed(key, old, result);
            self.propagate(key);
        }

        self.graph[key.0].resolving = false;
        result
    }

    fn notify_changed(&self, key: PropertyKey, old: f64, new: f64) {
        let event = ValueChanged { key, old, new };
        for callback in self.graph[key.0].on_value_changed.iter() {
            callback(&event);
        }
    }

    /// Push `key`'s new value into each dependent, in link order.
    fn propagate(&mut self, key: PropertyKey) {
        let dependency_value = self.graph[key.0].cached_value;

        for (edge, dependent) in self.dependent_edges(key.0) {
            let dependent = self.key_of(dependent);
            let base_value = self.graph[dependent.0].base_value;
            let update = DependencyUpdate {
                dependency: key,
                dependency_value,
                base_value,
            };
            let derived = self.graph[edge].calculator.as_ref().map(|calc| calc(&update));

            if let Some(next) = derived {
                if self.config.approx_eq(base_value, next) {
                    continue;
                }
                self.graph[dependent.0].base_value = next;
            }
            self.make_dirty_inner(dependent);
            self.evaluate(dependent);
        }
    }
}
