//! Cycle detection example: what happens with circular dependencies
//!
//! This example shows:
//! - Cycles being rejected with a warning by default
//! - The same edge reported as an error under `CycleHandling::Error`
//!
//! Run with `RUST_LOG=warn` to see the rejection warnings.

use zzprop::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Default policy: reject and warn ===\n");

    let mut graph = PropertyGraph::new();
    let a = graph.insert("A", 10.0);
    let b = graph.insert("B", 20.0);
    let c = graph.insert("C", 30.0);

    graph.add_dependency(a, b).unwrap();
    println!("A depends on B");
    graph.add_dependency(b, c).unwrap();
    println!("B depends on C");

    // C -> A would close A -> B -> C -> A
    graph.add_dependency(c, a).unwrap();
    println!(
        "C depends on A? {}",
        if graph.dependencies(c).unwrap().is_empty() {
            "no, rejected"
        } else {
            "yes"
        }
    );

    println!("\n=== Strict policy: report the cycle ===\n");

    let mut strict = PropertyGraph::with_config(GraphConfig {
        cycle_handling: CycleHandling::Error,
        ..GraphConfig::default()
    });
    let x = strict.insert("X", 1.0);
    let y = strict.insert("Y", 1.0);
    let z = strict.insert("Z", 1.0);
    strict.add_dependency(x, y).unwrap();
    strict.add_dependency(y, z).unwrap();

    match strict.add_dependency(z, x) {
        Err(PropertyError::Cycle { path }) => {
            println!("✓ Cycle detected successfully!");
            let names: Vec<&str> = path.iter().map(PropertyId::as_str).collect();
            println!("\nCycle path: {}", names.join(" -> "));
        }
        Err(e) => println!("✗ Unexpected error: {}", e),
        Ok(_) => println!("✗ ERROR: Cycle was not detected!"),
    }

    println!(
        "\nDepths: X={} Y={} Z={}",
        strict.property(x).unwrap().dependency_depth(),
        strict.property(y).unwrap().dependency_depth(),
        strict.property(z).unwrap().dependency_depth(),
    );
}
