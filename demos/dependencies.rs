//! Dependencies example: derived properties and push propagation
//!
//! This example shows:
//! - Deriving a base value from another property with a calculator
//! - Change notifications firing without an explicit recompute
//! - Random range modifiers making dependents volatile

use std::sync::Arc;
use zzprop::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut graph = PropertyGraph::new();
    let satiety = graph.insert("Satiety", 80.0);
    let per_day = graph.insert("SatietyChangePerDay", -2.0);

    // Hungry characters burn satiety faster.
    graph
        .add_dependency_with(per_day, satiety, |u| {
            if u.dependency_value < 20.0 {
                -7.0
            } else {
                -2.0
            }
        })
        .unwrap();

    graph
        .on_value_changed(
            per_day,
            Arc::new(|e: &ValueChanged| {
                println!("  SatietyChangePerDay: {:.2} -> {:.2}", e.old, e.new)
            }),
        )
        .unwrap();

    println!("=== Eating less ===\n");
    for level in [60.0, 30.0, 10.0, 50.0] {
        println!("Satiety = {level:.2}");
        graph.set_base_value(satiety, level).unwrap();
    }

    println!("\n=== Random damage ===\n");
    let roll = graph.insert("Roll", 0.0);
    graph.add_modifier(roll, Modifier::range(0, 1.0, 6.0)).unwrap();
    let damage = graph.insert("Damage", 0.0);
    graph
        .add_dependency_with(damage, roll, |u| u.dependency_value * 3.0)
        .unwrap();

    for _ in 0..3 {
        println!("Damage: {:.2}", graph.value(damage).unwrap());
    }
    let damage_state = graph.property(damage).unwrap();
    println!(
        "Damage cache clean: {} (volatile dependency: {})",
        damage_state.is_cache_clean(),
        damage_state.has_volatile_dependency()
    );
}
