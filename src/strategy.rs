//! Modifier strategies module.
//!
//! One strategy per [`ModifierKind`] folds the modifiers of that kind into
//! a running value. The pipeline applies strategies group by group in
//! [`MODIFIER_ORDER`](crate::modifier::MODIFIER_ORDER).

use crate::modifier::{Modifier, ModifierKind, ModifierSet};
use rand::distributions::{Distribution, Uniform};
use rand::RngCore;

/// Trait for the per-kind folding algorithm.
///
/// Strategies hold no per-property state, so a single static instance per
/// kind is shared by every property (see [`strategy_for`]).
///
/// # Examples
///
/// ```rust
/// use zzprop::strategy::strategy_for;
/// use zzprop::{Modifier, ModifierKind};
///
/// let mut rng = rand::thread_rng();
/// let add = strategy_for(ModifierKind::Add);
/// let group = [Modifier::add(0, 10.0), Modifier::add(1, 5.0)];
///
/// assert_eq!(add.apply(100.0, &group, &mut rng), 115.0);
/// ```
pub trait ModifierStrategy: Send + Sync {
    /// The kind this strategy folds.
    fn kind(&self) -> ModifierKind;

    /// Fold `modifiers` (all of this strategy's kind, priority-ordered)
    /// into `current`.
    ///
    /// Modifiers whose payload does not match the kind are skipped.
    fn apply(&self, current: f64, modifiers: &[Modifier], rng: &mut dyn RngCore) -> f64;

    /// Short human-readable label, used in breakdowns.
    fn description(&self) -> &'static str;
}

/// Replaces the running value; the last override in priority order wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideStrategy;

impl ModifierStrategy for OverrideStrategy {
    fn kind(&self) -> ModifierKind {
        ModifierKind::Override
    }

    fn apply(&self, current: f64, modifiers: &[Modifier], _rng: &mut dyn RngCore) -> f64 {
        modifiers
            .iter()
            .filter_map(Modifier::scalar)
            .last()
            .unwrap_or(current)
    }

    fn description(&self) -> &'static str {
        "override"
    }
}

/// Sums scalar values onto the running value.
///
/// Shared by `PriorityAdd`, `Add` and `AfterAdd`, which differ only in
/// where they sit in the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct AdditiveStrategy {
    kind: ModifierKind,
}

impl ModifierStrategy for AdditiveStrategy {
    fn kind(&self) -> ModifierKind {
        self.kind
    }

    fn apply(&self, current: f64, modifiers: &[Modifier], _rng: &mut dyn RngCore) -> f64 {
        current + modifiers.iter().filter_map(Modifier::scalar).sum::<f64>()
    }

    fn description(&self) -> &'static str {
        match self.kind {
            ModifierKind::PriorityAdd => "priority add",
            ModifierKind::AfterAdd => "after add",
            _ => "add",
        }
    }
}

/// Multiplies the running value by each factor.
#[derive(Debug, Clone, Copy)]
pub struct MultiplicativeStrategy {
    kind: ModifierKind,
}

impl ModifierStrategy for MultiplicativeStrategy {
    fn kind(&self) -> ModifierKind {
        self.kind
    }

    fn apply(&self, current: f64, modifiers: &[Modifier], _rng: &mut dyn RngCore) -> f64 {
        modifiers
            .iter()
            .filter_map(Modifier::scalar)
            .fold(current, |acc, factor| acc * factor)
    }

    fn description(&self) -> &'static str {
        match self.kind {
            ModifierKind::PriorityMultiply => "priority multiply",
            _ => "multiply",
        }
    }
}

/// Adds an amount drawn uniformly from each modifier's `[min, max]`.
///
/// Resampled on every application, so two evaluations of the same
/// property may differ.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRangeStrategy;

impl ModifierStrategy for RandomRangeStrategy {
    fn kind(&self) -> ModifierKind {
        ModifierKind::Range
    }

    fn apply(&self, current: f64, modifiers: &[Modifier], rng: &mut dyn RngCore) -> f64 {
        modifiers
            .iter()
            .filter_map(Modifier::bounds)
            .fold(current, |acc, (min, max)| {
                if min >= max {
                    acc + min
                } else {
                    acc + Uniform::new_inclusive(min, max).sample(&mut *rng)
                }
            })
    }

    fn description(&self) -> &'static str {
        "random range"
    }
}

/// Clamps the running value into each modifier's `[min, max]` in turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClampStrategy;

impl ModifierStrategy for ClampStrategy {
    fn kind(&self) -> ModifierKind {
        ModifierKind::RangeClamp
    }

    fn apply(&self, current: f64, modifiers: &[Modifier], _rng: &mut dyn RngCore) -> f64 {
        modifiers
            .iter()
            .filter_map(Modifier::bounds)
            .fold(current, |acc, (min, max)| acc.max(min).min(max))
    }

    fn description(&self) -> &'static str {
        "clamp"
    }
}

static OVERRIDE: OverrideStrategy = OverrideStrategy;
static PRIORITY_ADD: AdditiveStrategy = AdditiveStrategy {
    kind: ModifierKind::PriorityAdd,
};
static PRIORITY_MULTIPLY: MultiplicativeStrategy = MultiplicativeStrategy {
    kind: ModifierKind::PriorityMultiply,
};
static ADD: AdditiveStrategy = AdditiveStrategy {
    kind: ModifierKind::Add,
};
static RANGE: RandomRangeStrategy = RandomRangeStrategy;
static MULTIPLY: MultiplicativeStrategy = MultiplicativeStrategy {
    kind: ModifierKind::Multiply,
};
static AFTER_ADD: AdditiveStrategy = AdditiveStrategy {
    kind: ModifierKind::AfterAdd,
};
static CLAMP: ClampStrategy = ClampStrategy;

/// Look up the shared strategy instance for a kind.
pub fn strategy_for(kind: ModifierKind) -> &'static dyn ModifierStrategy {
    match kind {
        ModifierKind::Override => &OVERRIDE,
        ModifierKind::PriorityAdd => &PRIORITY_ADD,
        ModifierKind::PriorityMultiply => &PRIORITY_MULTIPLY,
        ModifierKind::Add => &ADD,
        ModifierKind::Range => &RANGE,
        ModifierKind::Multiply => &MULTIPLY,
        ModifierKind::AfterAdd => &AFTER_ADD,
        ModifierKind::RangeClamp => &CLAMP,
    }
}

/// Run the full modifier pipeline over `base`.
///
/// # Examples
///
/// ```rust
/// use zzprop::modifier::ModifierSet;
/// use zzprop::strategy::apply_modifiers;
///
/// let set = ModifierSet::new();
/// let mut rng = rand::thread_rng();
/// assert_eq!(apply_modifiers(42.0, &set, &mut rng), 42.0);
/// ```
pub fn apply_modifiers(base: f64, modifiers: &ModifierSet, rng: &mut dyn RngCore) -> f64 {
    modifiers.groups().fold(base, |value, (kind, group)| {
        strategy_for(kind).apply(value, group, &mut *rng)
    })
}

/// Run the pipeline and record the value after each non-empty group.
pub(crate) fn apply_modifiers_traced(
    base: f64,
    modifiers: &ModifierSet,
    rng: &mut dyn RngCore,
) -> (f64, Vec<(ModifierKind, usize, f64)>) {
    let mut steps = Vec::new();
    let mut value = base;
    for (kind, group) in modifiers.groups() {
        value = strategy_for(kind).apply(value, group, &mut *rng);
        steps.push((kind, group.len(), value));
    }
    (value, steps)
}
