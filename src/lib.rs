//! # zzprop - Reactive, Hardcode-Free Property Engine
//!
//! A property engine for game attributes (character stats, buffs,
//! food effects, aggregate attributes) that provides:
//! - **Modifier pipeline** with a single fixed order across all properties
//! - **Dependency graph** with cycle rejection and depth tracking
//! - **Lazy caching** with dirty flags, combined with eager push propagation
//! - **Volatile values**: random range modifiers defeat caching, transitively
//!
//! ## Core Concepts
//!
//! ```text
//! [base value] → [modifier pipeline] → [final value] → dependents
//! ```
//!
//! 1. Every **property** holds a base value and a set of **modifiers**
//! 2. Modifiers are folded group by group in [`MODIFIER_ORDER`]:
//!    `Override → PriorityAdd → PriorityMultiply → Add → Range → Multiply → AfterAdd → RangeClamp`
//! 3. A property may **depend** on others; an optional calculator derives
//!    its base value from the dependency's final value
//! 4. Writes recompute immediately and push changes to dependents
//!
//! ## Example
//!
//! ```rust
//! use zzprop::*;
//!
//! let mut graph = PropertyGraph::new();
//! let hp = graph.insert("Health", 100.0);
//!
//! graph.add_modifier(hp, Modifier::add(1, 10.0)).unwrap();
//! let buff = Modifier::multiply(1, 1.5);
//! graph.add_modifier(hp, buff).unwrap();
//! assert_eq!(graph.value(hp).unwrap(), 165.0); // (100 + 10) * 1.5
//!
//! graph.remove_modifier(hp, buff).unwrap();
//! assert_eq!(graph.value(hp).unwrap(), 110.0);
//! ```
//!
//! ## Modules
//!
//! - [`property_id`] - Property identifier type
//! - [`modifier`] - Modifiers and their grouped collection
//! - [`strategy`] - Per-kind folding strategies and the pipeline
//! - [`property`] - The property entity
//! - [`graph`] - Arena, dependency edges, cycle and depth checks
//! - [`resolver`] - Value reads, writes and propagation
//! - [`events`] - Dirty and value-changed subscriptions
//! - [`breakdown`] - Step-by-step evaluation traces
//! - [`snapshot`] - Persistable property state
//! - [`config`] - Graph configuration
//! - [`error`] - Error types

pub mod breakdown;
pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod modifier;
pub mod property;
pub mod property_id;
pub mod resolver;
pub mod snapshot;
pub mod strategy;

// Re-export main types for convenience
pub use breakdown::{Breakdown, BreakdownStep};
pub use config::{CycleHandling, GraphConfig};
pub use error::PropertyError;
pub use events::{DirtyCallback, SubscriptionId, ValueChanged, ValueChangedCallback};
pub use graph::{Calculator, DependencyUpdate, PropertyGraph, PropertyKey};
pub use modifier::{Modifier, ModifierKind, ModifierSet, ModifierValue, MODIFIER_ORDER};
pub use property::Property;
pub use property_id::PropertyId;
pub use snapshot::PropertySnapshot;
pub use strategy::{apply_modifiers, strategy_for, ModifierStrategy};
