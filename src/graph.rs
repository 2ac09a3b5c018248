//! Property graph module.
//!
//! `PropertyGraph` owns every property in an arena and stores the
//! dependency edges between them. An edge runs from a dependency to its
//! dependent, so a property's dependencies are its incoming neighbors and
//! its dependents are its outgoing neighbors. Each edge carries the
//! optional calculator that derives the dependent's base value.
//!
//! Edges are only added after a reachability check, so the graph stays
//! acyclic and push-based propagation always terminates.

use crate::config::{CycleHandling, GraphConfig};
use crate::error::PropertyError;
use crate::property::Property;
use crate::property_id::PropertyId;
use petgraph::algo::has_path_connecting;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet, VecDeque};

/// Stable handle to a property inside a [`PropertyGraph`].
///
/// Handles stay valid until the property is removed. The arena slot may
/// be reused afterwards, but the generation tag keeps the old handle from
/// resolving to the newcomer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyKey(pub(crate) NodeIndex, pub(crate) u64);

impl PropertyKey {
    /// Raw arena slot, mainly useful for logging.
    pub fn index(self) -> usize {
        self.0.index()
    }
}

/// Input handed to a dependency calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DependencyUpdate {
    /// The dependency whose final value changed.
    pub dependency: PropertyKey,
    /// The dependency's new final value.
    pub dependency_value: f64,
    /// The dependent's current base value.
    pub base_value: f64,
}

/// Derives a dependent's new base value from a dependency update.
pub type Calculator = dyn Fn(&DependencyUpdate) -> f64 + Send + Sync;

pub(crate) struct DependencyEdge {
    pub(crate) calculator: Option<Box<Calculator>>,
    /// Registration sequence, used to keep propagation in link order.
    order: u64,
}

impl std::fmt::Debug for DependencyEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyEdge")
            .field("calculator", &self.calculator.as_ref().map(|_| "<fn>"))
            .field("order", &self.order)
            .finish()
    }
}

/// Arena of properties plus the dependency edges between them.
///
/// # Examples
///
/// ```rust
/// use zzprop::{Modifier, PropertyGraph};
///
/// let mut graph = PropertyGraph::new();
/// let strength = graph.insert("Strength", 10.0);
/// let attack = graph.insert("Attack", 0.0);
///
/// // Attack's base is twice Strength's final value.
/// graph
///     .add_dependency_with(attack, strength, |u| u.dependency_value * 2.0)
///     .unwrap();
/// assert_eq!(graph.value(attack).unwrap(), 20.0);
///
/// graph.add_modifier(strength, Modifier::add(0, 5.0)).unwrap();
/// assert_eq!(graph.base_value(attack).unwrap(), 30.0);
/// ```
#[derive(Debug)]
pub struct PropertyGraph {
    pub(crate) graph: StableDiGraph<Property, DependencyEdge>,
    pub(crate) config: GraphConfig,
    pub(crate) rng: StdRng,
    pub(crate) next_subscription: u64,
    next_edge_order: u64,
    next_generation: u64,
}

impl Default for PropertyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyGraph {
    /// Create an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Create an empty graph with the given configuration.
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            graph: StableDiGraph::new(),
            config,
            rng: StdRng::from_entropy(),
            next_subscription: 0,
            next_edge_order: 0,
            next_generation: 0,
        }
    }

    /// Reseed the generator used by range modifiers.
    ///
    /// Two graphs built the same way with the same seed produce the same
    /// sequence of values.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Add a new property. It starts dirty, with no modifiers or edges.
    pub fn insert(&mut self, id: impl Into<PropertyId>, base_value: f64) -> PropertyKey {
        let id = id.into();
        tracing::debug!(property = %id, base_value, "inserted property");
        let generation = self.next_generation;
        self.next_generation += 1;
        let mut property = Property::new(id, base_value);
        property.generation = generation;
        PropertyKey(self.graph.add_node(property), generation)
    }

    /// Remove a property, unlinking it from both sides first.
    ///
    /// Former dependents are re-linked (depth, volatility) and recomputed.
    ///
    /// # Errors
    ///
    /// `PropertyError::UnknownProperty` if `key` is not live.
    pub fn remove(&mut self, key: PropertyKey) -> Result<Property, PropertyError> {
        self.node(key)?;
        let dependents: Vec<PropertyKey> = self
            .dependent_edges(key.0)
            .into_iter()
            .map(|(_, n)| self.key_of(n))
            .collect();
        let property = self
            .graph
            .remove_node(key.0)
            .ok_or(PropertyError::UnknownProperty(key))?;
        tracing::debug!(property = %property.id, dependents = dependents.len(), "removed property");

        for dependent in dependents {
            self.refresh_links(dependent);
            self.make_dirty_inner(dependent);
            self.evaluate(dependent);
        }
        Ok(property)
    }

    pub fn contains(&self, key: PropertyKey) -> bool {
        self.node(key).is_ok()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Handles of every live property.
    pub fn keys(&self) -> impl Iterator<Item = PropertyKey> + '_ {
        self.graph.node_indices().map(|n| self.key_of(n))
    }

    /// Read-only view of a property.
    pub fn property(&self, key: PropertyKey) -> Result<&Property, PropertyError> {
        self.node(key)
    }

    /// Properties `key` reads from, in the order they were linked.
    pub fn dependencies(&self, key: PropertyKey) -> Result<Vec<PropertyKey>, PropertyError> {
        self.node(key)?;
        Ok(self.dependency_keys(key.0))
    }

    /// Properties reading from `key`, in the order they were linked.
    pub fn dependents(&self, key: PropertyKey) -> Result<Vec<PropertyKey>, PropertyError> {
        self.node(key)?;
        Ok(self
            .dependent_edges(key.0)
            .into_iter()
            .map(|(_, n)| self.key_of(n))
            .collect())
    }

    /// Make `key` read from `dependency` without a calculator.
    ///
    /// `key` is recomputed whenever `dependency`'s final value changes.
    /// Edges that would create a cycle or exceed the depth limit are
    /// handled per [`CycleHandling`].
    ///
    /// # Errors
    ///
    /// `PropertyError::UnknownProperty` for a dead handle; cycle and depth
    /// errors only under `CycleHandling::Error`.
    pub fn add_dependency(
        &mut self,
        key: PropertyKey,
        dependency: PropertyKey,
    ) -> Result<&mut Self, PropertyError> {
        self.link(key, dependency, None)
    }

    /// Make `key` read from `dependency`, deriving its base value with
    /// `calculator`.
    ///
    /// The calculator runs immediately to seed the base value, then again
    /// every time `dependency`'s final value changes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use zzprop::PropertyGraph;
    ///
    /// let mut graph = PropertyGraph::new();
    /// let satiety = graph.insert("Satiety", 50.0);
    /// let per_day = graph.insert("SatietyChangePerDay", -1.0);
    ///
    /// graph
    ///     .add_dependency_with(per_day, satiety, |u| {
    ///         if u.dependency_value < 20.0 { -6.0 } else { -1.0 }
    ///     })
    ///     .unwrap();
    ///
    /// graph.set_base_value(satiety, 10.0).unwrap();
    /// assert_eq!(graph.base_value(per_day).unwrap(), -6.0);
    /// ```
    pub fn add_dependency_with<F>(
        &mut self,
        key: PropertyKey,
        dependency: PropertyKey,
        calculator: F,
    ) -> Result<&mut Self, PropertyError>
    where
        F: Fn(&DependencyUpdate) -> f64 + Send + Sync + 'static,
    {
        self.link(key, dependency, Some(Box::new(calculator)))
    }

    /// Unlink `dependency` from `key`, dropping the edge's calculator.
    ///
    /// Missing edges are ignored.
    pub fn remove_dependency(
        &mut self,
        key: PropertyKey,
        dependency: PropertyKey,
    ) -> Result<&mut Self, PropertyError> {
        self.node(key)?;
        self.node(dependency)?;
        let Some(edge) = self.graph.find_edge(dependency.0, key.0) else {
            return Ok(self);
        };
        self.graph.remove_edge(edge);
        tracing::debug!(
            property = %self.graph[key.0].id,
            dependency = %self.graph[dependency.0].id,
            "unlinked dependency"
        );

        self.refresh_links(key);
        self.make_dirty_inner(key);
        self.evaluate(key);
        Ok(self)
    }

    fn link(
        &mut self,
        key: PropertyKey,
        dependency: PropertyKey,
        calculator: Option<Box<Calculator>>,
    ) -> Result<&mut Self, PropertyError> {
        self.node(key)?;
        self.node(dependency)?;
        if self.graph.find_edge(dependency.0, key.0).is_some() {
            return Ok(self);
        }

        // `key` must not already be upstream of `dependency`.
        if has_path_connecting(&self.graph, key.0, dependency.0, None) {
            let path = self.cycle_path(key, dependency);
            return self.reject(PropertyError::Cycle { path });
        }
        // Every property below `key` moves down with it.
        let depth = self.graph[dependency.0].depth + 1 + self.dependent_height(key.0);
        if depth > self.config.max_dependency_depth {
            return self.reject(PropertyError::DepthExceeded {
                dependency: self.graph[dependency.0].id.clone(),
                depth,
                max: self.config.max_dependency_depth,
            });
        }

        // Settle the dependency before the edge exists, so a volatile
        // resample cannot reach the new calculator.
        let dependency_value = self.evaluate(dependency);

        let order = self.next_edge_order;
        self.next_edge_order += 1;
        let edge = self
            .graph
            .add_edge(dependency.0, key.0, DependencyEdge { calculator, order });
        tracing::debug!(
            property = %self.graph[key.0].id,
            dependency = %self.graph[dependency.0].id,
            "linked dependency"
        );
        self.refresh_links(key);

        let base_value = self.graph[key.0].base_value;
        let update = DependencyUpdate {
            dependency,
            dependency_value,
            base_value,
        };
        let seeded = self
            .graph
            .edge_weight(edge)
            .and_then(|e| e.calculator.as_ref())
            .map(|calc| calc(&update));
        if let Some(next) = seeded {
            if !self.config.approx_eq(base_value, next) {
                self.graph[key.0].base_value = next;
            }
        }

        self.make_dirty_inner(key);
        // Hold the dependency at the value the calculator was seeded with.
        let held = std::mem::replace(&mut self.graph[dependency.0].resolving, true);
        self.evaluate(key);
        self.graph[dependency.0].resolving = held;
        Ok(self)
    }

    fn reject(&mut self, err: PropertyError) -> Result<&mut Self, PropertyError> {
        match self.config.cycle_handling {
            CycleHandling::Reject => {
                tracing::warn!("Rejected dependency: {}", err);
                Ok(self)
            }
            CycleHandling::Error => Err(err),
        }
    }

    /// The cycle `key -> dependency -> ... -> key` that linking would close,
    /// written as "depends on" steps.
    fn cycle_path(&self, key: PropertyKey, dependency: PropertyKey) -> Vec<PropertyId> {
        let mut parents: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut seen = HashSet::from([key.0]);
        let mut queue = VecDeque::from([key.0]);

        while let Some(node) = queue.pop_front() {
            if node == dependency.0 {
                break;
            }
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if seen.insert(next) {
                    parents.insert(next, node);
                    queue.push_back(next);
                }
            }
        }

        let mut path = vec![self.graph[key.0].id.clone()];
        let mut current = dependency.0;
        path.push(self.graph[current].id.clone());
        while let Some(&parent) = parents.get(&current) {
            path.push(self.graph[parent].id.clone());
            current = parent;
        }
        path
    }

    /// Recompute depth and inherited volatility for `key`, then walk down
    /// through dependents whose values moved.
    pub(crate) fn refresh_links(&mut self, key: PropertyKey) {
        let mut stack = vec![key.0];
        let mut root = true;

        while let Some(node) = stack.pop() {
            let (depth, volatile_dependency) = self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .fold((0usize, false), |(depth, volatile), dep| {
                    let dep = &self.graph[dep];
                    (depth.max(dep.depth + 1), volatile || dep.is_volatile())
                });

            let property = &mut self.graph[node];
            let was_volatile = property.is_volatile();
            let old_depth = property.depth;
            property.depth = depth;
            property.has_volatile_dependency = volatile_dependency;
            let changed = old_depth != depth || was_volatile != property.is_volatile();

            if changed || root {
                stack.extend(self.graph.neighbors_directed(node, Direction::Outgoing));
            }
            root = false;
        }
    }

    /// Longest chain of dependents hanging below `node` (0 for sinks).
    fn dependent_height(&self, node: NodeIndex) -> usize {
        fn walk(
            graph: &StableDiGraph<Property, DependencyEdge>,
            node: NodeIndex,
            memo: &mut HashMap<NodeIndex, usize>,
        ) -> usize {
            if let Some(&height) = memo.get(&node) {
                return height;
            }
            let height = graph
                .neighbors_directed(node, Direction::Outgoing)
                .map(|next| walk(graph, next, memo) + 1)
                .max()
                .unwrap_or(0);
            memo.insert(node, height);
            height
        }
        walk(&self.graph, node, &mut HashMap::new())
    }

    pub(crate) fn key_of(&self, node: NodeIndex) -> PropertyKey {
        PropertyKey(node, self.graph[node].generation)
    }

    pub(crate) fn node(&self, key: PropertyKey) -> Result<&Property, PropertyError> {
        self.graph
            .node_weight(key.0)
            .filter(|p| p.generation == key.1)
            .ok_or(PropertyError::UnknownProperty(key))
    }

    pub(crate) fn node_mut(&mut self, key: PropertyKey) -> Result<&mut Property, PropertyError> {
        self.graph
            .node_weight_mut(key.0)
            .filter(|p| p.generation == key.1)
            .ok_or(PropertyError::UnknownProperty(key))
    }

    pub(crate) fn dependency_keys(&self, node: NodeIndex) -> Vec<PropertyKey> {
        let mut edges: Vec<(u64, NodeIndex)> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.weight().order, e.source()))
            .collect();
        edges.sort_by_key(|(order, _)| *order);
        edges.into_iter().map(|(_, n)| self.key_of(n)).collect()
    }

    pub(crate) fn dependent_edges(&self, node: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        let mut edges: Vec<(u64, EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.weight().order, e.id(), e.target()))
            .collect();
        edges.sort_by_key(|(order, ..)| *order);
        edges.into_iter().map(|(_, e, n)| (e, n)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::Modifier;

    fn strict() -> PropertyGraph {
        PropertyGraph::with_config(GraphConfig {
            cycle_handling: CycleHandling::Error,
            ..GraphConfig::default()
        })
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut graph = PropertyGraph::new();
        let hp = graph.insert("Health", 100.0);
        assert!(graph.contains(hp));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.property(hp).unwrap().id().as_str(), "Health");
    }

    #[test]
    fn test_edges_are_two_sided() {
        let mut graph = PropertyGraph::new();
        let a = graph.insert("A", 1.0);
        let b = graph.insert("B", 2.0);
        graph.add_dependency(a, b).unwrap();

        assert_eq!(graph.dependencies(a).unwrap(), vec![b]);
        assert_eq!(graph.dependents(b).unwrap(), vec![a]);
        assert!(graph.dependents(a).unwrap().is_empty());

        graph.remove_dependency(a, b).unwrap();
        assert!(graph.dependencies(a).unwrap().is_empty());
        assert!(graph.dependents(b).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_link_is_noop() {
        let mut graph = PropertyGraph::new();
        let a = graph.insert("A", 1.0);
        let b = graph.insert("B", 2.0);
        graph.add_dependency(a, b).unwrap();
        graph.add_dependency(a, b).unwrap();
        assert_eq!(graph.dependencies(a).unwrap().len(), 1);
    }

    #[test]
    fn test_self_dependency_rejected() {
        let mut graph = strict();
        let a = graph.insert("A", 1.0);
        let err = graph.add_dependency(a, a).unwrap_err();
        assert_eq!(
            err,
            PropertyError::Cycle {
                path: vec![PropertyId::new("A"), PropertyId::new("A")]
            }
        );
        assert!(graph.dependencies(a).unwrap().is_empty());
    }

    #[test]
    fn test_cycle_path_reads_as_depends_on() {
        let mut graph = strict();
        let a = graph.insert("A", 1.0);
        let b = graph.insert("B", 1.0);
        let c = graph.insert("C", 1.0);
        graph.add_dependency(a, b).unwrap();
        graph.add_dependency(b, c).unwrap();

        let err = graph.add_dependency(c, a).unwrap_err();
        let expected: Vec<PropertyId> = ["C", "A", "B", "C"].into_iter().map(Into::into).collect();
        assert_eq!(err, PropertyError::Cycle { path: expected });
    }

    #[test]
    fn test_cycle_silently_rejected_by_default() {
        let mut graph = PropertyGraph::new();
        let a = graph.insert("A", 1.0);
        let b = graph.insert("B", 1.0);
        graph.add_dependency(a, b).unwrap();
        graph.add_dependency(b, a).unwrap();
        assert!(graph.dependencies(b).unwrap().is_empty());
    }

    #[test]
    fn test_depth_tracking() {
        let mut graph = PropertyGraph::new();
        let a = graph.insert("A", 1.0);
        let b = graph.insert("B", 1.0);
        let c = graph.insert("C", 1.0);

        graph.add_dependency(b, a).unwrap();
        graph.add_dependency(c, b).unwrap();
        assert_eq!(graph.property(c).unwrap().dependency_depth(), 2);

        // Depth grows outward when an upstream link is added.
        let root = graph.insert("Root", 1.0);
        graph.add_dependency(a, root).unwrap();
        assert_eq!(graph.property(a).unwrap().dependency_depth(), 1);
        assert_eq!(graph.property(c).unwrap().dependency_depth(), 3);

        // And shrinks again on unlink.
        graph.remove_dependency(a, root).unwrap();
        assert_eq!(graph.property(c).unwrap().dependency_depth(), 2);
    }

    #[test]
    fn test_depth_limit() {
        let mut graph = PropertyGraph::with_config(GraphConfig {
            max_dependency_depth: 2,
            cycle_handling: CycleHandling::Error,
            ..GraphConfig::default()
        });
        let a = graph.insert("A", 1.0);
        let b = graph.insert("B", 1.0);
        let c = graph.insert("C", 1.0);
        let d = graph.insert("D", 1.0);
        graph.add_dependency(b, a).unwrap();
        graph.add_dependency(c, b).unwrap();

        let err = graph.add_dependency(d, c).unwrap_err();
        assert!(matches!(err, PropertyError::DepthExceeded { depth: 3, max: 2, .. }));
        assert!(graph.dependencies(d).unwrap().is_empty());
    }

    #[test]
    fn test_depth_limit_counts_dependents_below() {
        let mut graph = PropertyGraph::with_config(GraphConfig {
            max_dependency_depth: 2,
            cycle_handling: CycleHandling::Error,
            ..GraphConfig::default()
        });
        let tail = graph.insert("Tail", 1.0);
        let mid = graph.insert("Mid", 1.0);
        let head = graph.insert("Head", 1.0);
        graph.add_dependency(tail, mid).unwrap();
        graph.add_dependency(mid, head).unwrap();

        // Head itself is a leaf, but Tail would end up at depth 3.
        let root = graph.insert("Root", 1.0);
        let err = graph.add_dependency(head, root).unwrap_err();
        assert_eq!(
            err,
            PropertyError::DepthExceeded {
                dependency: PropertyId::new("Root"),
                depth: 3,
                max: 2,
            }
        );
        assert_eq!(graph.property(tail).unwrap().dependency_depth(), 2);
        assert!(graph.dependencies(head).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_handles() {
        let mut graph = PropertyGraph::new();
        let a = graph.insert("A", 1.0);
        let b = graph.insert("B", 1.0);
        graph.remove(b).unwrap();

        assert_eq!(
            graph.add_dependency(a, b).unwrap_err(),
            PropertyError::UnknownProperty(b)
        );
        assert!(graph.property(b).is_err());

        // The freed slot goes to a newcomer; the old handle stays dead.
        let c = graph.insert("C", 1.0);
        assert_ne!(b, c);
        assert!(!graph.contains(b));
        assert_eq!(graph.property(b).unwrap_err(), PropertyError::UnknownProperty(b));
        assert_eq!(graph.property(c).unwrap().id().as_str(), "C");
        assert!(graph.keys().all(|k| k != b));
    }

    #[test]
    fn test_remove_unlinks_both_sides() {
        let mut graph = PropertyGraph::new();
        let a = graph.insert("A", 1.0);
        let b = graph.insert("B", 1.0);
        let c = graph.insert("C", 1.0);
        graph.add_dependency(b, a).unwrap();
        graph.add_dependency(c, b).unwrap();

        graph.remove(b).unwrap();
        assert!(graph.dependents(a).unwrap().is_empty());
        assert!(graph.dependencies(c).unwrap().is_empty());
        assert_eq!(graph.property(c).unwrap().dependency_depth(), 0);
    }

    #[test]
    fn test_volatility_inherited_transitively() {
        let mut graph = PropertyGraph::new().with_seed(1);
        let a = graph.insert("A", 1.0);
        let b = graph.insert("B", 1.0);
        let c = graph.insert("C", 1.0);
        graph.add_dependency(b, a).unwrap();
        graph.add_dependency(c, b).unwrap();

        let range = Modifier::range(0, 0.0, 1.0);
        graph.add_modifier(a, range).unwrap();
        assert!(graph.property(c).unwrap().has_volatile_dependency());

        graph.remove_modifier(a, range).unwrap();
        assert!(!graph.property(b).unwrap().has_volatile_dependency());
        assert!(!graph.property(c).unwrap().has_volatile_dependency());
    }

    #[test]
    fn test_dependents_in_link_order() {
        let mut graph = PropertyGraph::new();
        let src = graph.insert("Source", 1.0);
        let first = graph.insert("First", 1.0);
        let second = graph.insert("Second", 1.0);
        let third = graph.insert("Third", 1.0);
        graph.add_dependency(second, src).unwrap();
        graph.add_dependency(first, src).unwrap();
        graph.add_dependency(third, src).unwrap();

        assert_eq!(graph.dependents(src).unwrap(), vec![second, first, third]);
    }
}
