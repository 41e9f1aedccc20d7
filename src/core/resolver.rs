//! Reference resolution.
//!
//! Walks the ordered stacks and turns every reference into a plan entry:
//! cross-stack `Reference`s become `DeferredBinding`s (the concrete value
//! only exists once the producing stack deploys), same-stack `LocalRef`s
//! resolve immediately to identity tokens, and suppressions pass through
//! unchanged. Structural validity was already established by the graph
//! builder; a producer appearing at or after its consumer in the stack
//! order is an internal invariant failure and asserts.

use super::graph::DependencyGraph;
use super::scheduler::Schedule;
use super::types::{
    identity_token, DeferredBinding, LocalBinding, PlannedExport, PlannedStack, PropertyValue,
    ResolvedPlan, ResolvedValue, ScopedSuppression, Stack,
};
use std::collections::HashMap;
use tracing::debug;

/// Assemble the resolved plan for stacks already ordered by the scheduler.
///
/// The fingerprint is left empty here; the planner stamps it once the plan
/// is fully assembled.
pub fn resolve(
    name: &str,
    stacks: &[Stack],
    graph: &DependencyGraph,
    schedule: &Schedule,
) -> ResolvedPlan {
    let position: HashMap<&str, usize> = schedule
        .stack_order
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let by_id: HashMap<&str, &Stack> = stacks.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut planned = Vec::with_capacity(schedule.stack_order.len());
    let mut bindings = Vec::new();

    for stack_id in &schedule.stack_order {
        let stack = by_id
            .get(stack_id.as_str())
            .expect("scheduled stack missing from input");
        let consumer_pos = position[stack_id.as_str()];

        let mut locals = Vec::new();
        for resource in &stack.resources {
            for (property, value) in &resource.properties {
                match value {
                    PropertyValue::Literal(_) => {}
                    PropertyValue::LocalRef { local } => {
                        locals.push(LocalBinding {
                            resource_id: resource.id.clone(),
                            property: property.clone(),
                            target: identity_token(&stack.id, local),
                        });
                    }
                    PropertyValue::Reference { stack: producer, export } => {
                        let producer_pos = position[producer.as_str()];
                        assert!(
                            producer_pos < consumer_pos,
                            "producer '{}' scheduled at or after consumer '{}'",
                            producer,
                            stack_id
                        );
                        bindings.push(DeferredBinding {
                            consumer_stack_id: stack.id.clone(),
                            consumer_resource_id: resource.id.clone(),
                            property: property.clone(),
                            producer_stack_id: producer.clone(),
                            export_name: export.clone(),
                        });
                    }
                }
            }
        }

        let exports = stack
            .exports
            .iter()
            .map(|export| PlannedExport {
                name: export.name.clone(),
                value: match &export.value {
                    PropertyValue::Literal(s) => ResolvedValue::Literal(s.clone()),
                    PropertyValue::LocalRef { local } => {
                        ResolvedValue::Identity(identity_token(&stack.id, local))
                    }
                    PropertyValue::Reference { .. } => {
                        unreachable!("foreign export survived graph construction")
                    }
                },
            })
            .collect();

        let mut suppressions: Vec<ScopedSuppression> = stack
            .suppressions
            .iter()
            .map(|s| ScopedSuppression {
                scope: stack.id.clone(),
                id: s.id.clone(),
                reason: s.reason.clone(),
            })
            .collect();
        for resource in &stack.resources {
            suppressions.extend(resource.suppressions.iter().map(|s| ScopedSuppression {
                scope: identity_token(&stack.id, &resource.id),
                id: s.id.clone(),
                reason: s.reason.clone(),
            }));
        }

        planned.push(PlannedStack {
            stack_id: stack.id.clone(),
            resource_order: schedule.resource_orders[stack_id.as_str()].clone(),
            exports,
            locals,
            suppressions,
        });
    }

    debug!(
        stacks = planned.len(),
        deferred = bindings.len(),
        imports = graph
            .stack_ids()
            .iter()
            .filter_map(|id| graph.imports_of(id))
            .map(|s| s.len())
            .sum::<usize>(),
        "references resolved"
    );

    ResolvedPlan {
        name: name.to_string(),
        stack_order: schedule.stack_order.clone(),
        stacks: planned,
        bindings,
        fingerprint: String::new(),
    }
}
