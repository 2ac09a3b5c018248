//! Basic example: a single property with modifiers
//!
//! This example shows:
//! - Creating a property
//! - Stacking modifiers of different kinds
//! - Reading the step-by-step breakdown

use zzprop::*;

fn main() {
    let mut graph = PropertyGraph::new();
    let hp = graph.insert("Health", 100.0);

    println!("=== Health ===\n");
    println!("Base: {:.2}", graph.value(hp).unwrap());

    graph.add_modifier(hp, Modifier::add(1, 10.0)).unwrap();
    println!("+10 flat: {:.2}", graph.value(hp).unwrap());

    let buff = Modifier::multiply(1, 1.5);
    graph.add_modifier(hp, buff).unwrap();
    println!("x1.5 buff: {:.2}", graph.value(hp).unwrap());

    graph
        .add_modifier(hp, Modifier::range_clamp(0, 0.0, 150.0))
        .unwrap();
    println!("clamped to 150: {:.2}", graph.value(hp).unwrap());

    println!("\n=== Breakdown ===\n");
    let breakdown = graph.explain(hp).unwrap();
    println!("{}: base {:.2}", breakdown.property, breakdown.base_value);
    for step in &breakdown.steps {
        println!(
            "  {:<18} ({} modifier(s)) -> {:.2}",
            step.description, step.count, step.value
        );
    }

    graph.remove_modifier(hp, buff).unwrap();
    println!("\nBuff expired: {:.2}", graph.value(hp).unwrap());
}
