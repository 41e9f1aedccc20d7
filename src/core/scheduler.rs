//! Topological scheduling.
//!
//! Kahn's algorithm over the coarse (stack-level) graph, then independently
//! over each stack's fine (resource-level) graph. Ties are broken by
//! original declaration order, so repeated runs over identical input produce
//! byte-identical plans. On cycle detection the full cycle is reported and
//! no partial order is returned.

use super::error::PlanError;
use super::graph::{Dag, DependencyGraph};
use indexmap::IndexMap;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use tracing::debug;

/// A total deployment order: stacks, and resources within each stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// Stack deployment order
    pub stack_order: Vec<String>,

    /// Resource order per stack, keyed in declaration order
    pub resource_orders: IndexMap<String, Vec<String>>,
}

/// Compute the deployment order for a built graph.
pub fn order(graph: &DependencyGraph) -> Result<Schedule, PlanError> {
    let stack_order = toposort(&graph.coarse)?;

    let mut resource_orders = IndexMap::with_capacity(graph.fine.len());
    for (stack_id, dag) in &graph.fine {
        resource_orders.insert(stack_id.clone(), toposort(dag)?);
    }

    debug!(stacks = stack_order.len(), "deployment order computed");

    Ok(Schedule {
        stack_order,
        resource_orders,
    })
}

/// Kahn's algorithm with a min-heap on declaration index: whenever several
/// nodes have no remaining unresolved dependencies, the one declared first
/// is emitted first.
fn toposort(dag: &Dag) -> Result<Vec<String>, PlanError> {
    let n = dag.nodes.len();
    let mut in_degree: Vec<usize> = dag.producers.iter().map(|p| p.len()).collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut emitted = vec![false; n];
    let mut order = Vec::with_capacity(n);

    while let Some(Reverse(current)) = ready.pop() {
        emitted[current] = true;
        order.push(dag.nodes[current].clone());

        for &consumer in &dag.dependents[current] {
            in_degree[consumer] -= 1;
            if in_degree[consumer] == 0 {
                ready.push(Reverse(consumer));
            }
        }
    }

    if order.len() != n {
        return Err(PlanError::CycleDetected {
            cycle: find_cycle(dag, &emitted),
        });
    }

    Ok(order)
}

/// Extract one concrete cycle from the unordered remainder.
///
/// Every node left after Kahn's exhausts still waits on at least one other
/// leftover node, so walking consumer -> producer edges inside the remainder
/// must revisit a node. The first remaining producer is taken at each step,
/// keeping the report deterministic.
fn find_cycle(dag: &Dag, emitted: &[bool]) -> Vec<String> {
    let mut seen_at: HashMap<usize, usize> = HashMap::new();
    let mut path: Vec<usize> = Vec::new();
    let mut current = emitted
        .iter()
        .position(|&e| !e)
        .expect("cycle reported with no remaining nodes");

    loop {
        if let Some(&at) = seen_at.get(&current) {
            return path[at..].iter().map(|&i| dag.nodes[i].clone()).collect();
        }
        seen_at.insert(current, path.len());
        path.push(current);
        current = dag.producers[current]
            .iter()
            .copied()
            .find(|&p| !emitted[p])
            .expect("remaining node has no remaining producer");
    }
}
