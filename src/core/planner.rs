//! Single-shot plan synthesis: build -> order -> resolve -> fingerprint.
//!
//! All derived structures are recomputed fully on every invocation; there is
//! no incremental path. The fingerprint is a BLAKE3 digest over the plan's
//! canonical components, so identical input always yields an identical,
//! verifiable plan.

use super::error::PlanError;
use super::types::{ResolvedPlan, Stack};
use super::{graph, resolver, scheduler};
use tracing::debug;

/// Synthesize a complete deployment plan from fully constructed stacks.
///
/// This is the core's single entry point: it validates all references,
/// computes the stack and resource deployment orders, resolves every
/// reference, and stamps the plan fingerprint. Either a complete plan is
/// returned or the first fatal configuration error.
pub fn synthesize(name: &str, stacks: &[Stack]) -> Result<ResolvedPlan, PlanError> {
    let graph = graph::build(stacks)?;
    let schedule = scheduler::order(&graph)?;
    let mut plan = resolver::resolve(name, stacks, &graph, &schedule);
    plan.fingerprint = fingerprint(&plan);

    debug!(name, fingerprint = %plan.fingerprint, "plan synthesized");
    Ok(plan)
}

/// Compute the plan fingerprint. Returns `"blake3:{hex}"`.
pub fn fingerprint(plan: &ResolvedPlan) -> String {
    let mut components: Vec<String> = Vec::new();
    components.push(plan.name.clone());
    components.extend(plan.stack_order.iter().cloned());

    for stack in &plan.stacks {
        components.push(stack.stack_id.clone());
        components.extend(stack.resource_order.iter().cloned());
        for export in &stack.exports {
            components.push(format!("{}={}", export.name, export.value));
        }
        for local in &stack.locals {
            components.push(format!(
                "{}.{}->{}",
                local.resource_id, local.property, local.target
            ));
        }
        for sup in &stack.suppressions {
            components.push(format!("{}:{}:{}", sup.scope, sup.id, sup.reason));
        }
    }

    for b in &plan.bindings {
        components.push(format!(
            "{}.{}.{}<-{}.{}",
            b.consumer_stack_id,
            b.consumer_resource_id,
            b.property,
            b.producer_stack_id,
            b.export_name
        ));
    }

    let joined = components.join("\0");
    format!("blake3:{}", blake3::hash(joined.as_bytes()).to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Export, PropertyValue, ResourceNode};
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn stacks(yaml: &str) -> Vec<Stack> {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    const FAN_OUT: &str = r#"
- id: infra
  resources:
    - { id: vpc, kind: network }
    - id: cluster
      kind: compute-cluster
      properties:
        network: { local: vpc }
    - id: service
      kind: service
      properties:
        cluster: { local: cluster }
    - { id: repo, kind: code-repository }
  exports:
    - { name: serviceName, value: { local: service } }
    - { name: repoName, value: { local: repo } }
- id: pipeline
  resources:
    - id: deploy
      kind: pipeline
      properties:
        service: { stack: infra, export: serviceName }
        repo: { stack: infra, export: repoName }
"#;

    #[test]
    fn test_synthesize_two_stack_fan_out() {
        let plan = synthesize("ecs-fargate", &stacks(FAN_OUT)).unwrap();
        assert_eq!(plan.stack_order, ["infra", "pipeline"]);
        assert_eq!(plan.bindings.len(), 2);
        assert!(plan.bindings.iter().all(|b| b.producer_stack_id == "infra"));
        assert!(plan.fingerprint.starts_with("blake3:"));
    }

    #[test]
    fn test_synthesize_dangling_local_ref() {
        let err = synthesize(
            "t",
            &stacks(
                r#"
- id: S
  resources:
    - id: X
      kind: service
      properties:
        net: { local: "Y" }
"#,
            ),
        )
        .unwrap_err();
        assert_eq!(
            err,
            PlanError::DanglingLocalRef {
                stack: "S".into(),
                resource: "X".into(),
                target: "Y".into(),
            }
        );
    }

    #[test]
    fn test_synthesize_self_import() {
        let err = synthesize(
            "t",
            &stacks(
                r#"
- id: S
  resources:
    - id: x
      kind: service
      properties:
        v: { stack: S, export: foo }
  exports:
    - { name: foo, value: { local: x } }
"#,
            ),
        )
        .unwrap_err();
        assert_eq!(
            err,
            PlanError::SelfImport {
                stack: "S".into(),
                export: "foo".into(),
            }
        );
    }

    #[test]
    fn test_synthesize_cycle_carries_both_members() {
        let err = synthesize(
            "t",
            &stacks(
                r#"
- id: A
  resources:
    - id: a
      kind: service
      properties:
        v: { stack: B, export: out }
  exports:
    - { name: out, value: { local: a } }
- id: B
  resources:
    - id: b
      kind: service
      properties:
        v: { stack: A, export: out }
  exports:
    - { name: out, value: { local: b } }
"#,
            ),
        )
        .unwrap_err();
        match err {
            PlanError::CycleDetected { mut cycle } => {
                cycle.sort();
                assert_eq!(cycle, ["A", "B"]);
            }
            other => panic!("expected CycleDetected, got {:?}", other),
        }
    }

    #[test]
    fn test_synthesize_unknown_stack_vs_unknown_export() {
        let base = r#"
- id: a
  resources:
    - { id: x, kind: service }
  exports:
    - { name: out, value: { local: x } }
- id: b
  resources:
    - id: y
      kind: pipeline
      properties:
        v: { stack: %TARGET%, export: %EXPORT% }
"#;
        let unknown_stack = base.replace("%TARGET%", "ghost").replace("%EXPORT%", "out");
        assert!(matches!(
            synthesize("t", &stacks(&unknown_stack)).unwrap_err(),
            PlanError::UnknownStack { .. }
        ));

        let unknown_export = base.replace("%TARGET%", "a").replace("%EXPORT%", "missing");
        assert!(matches!(
            synthesize("t", &stacks(&unknown_export)).unwrap_err(),
            PlanError::UnknownExport { .. }
        ));
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        let input = stacks(FAN_OUT);
        let a = synthesize("ecs-fargate", &input).unwrap();
        let b = synthesize("ecs-fargate", &input).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_changes_with_input() {
        let a = synthesize("ecs-fargate", &stacks(FAN_OUT)).unwrap();
        let renamed = FAN_OUT.replace("id: vpc", "id: vpc2").replace("local: vpc", "local: vpc2");
        let b = synthesize("ecs-fargate", &stacks(&renamed)).unwrap();
        assert_ne!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_fingerprint_changes_with_name() {
        let input = stacks(FAN_OUT);
        let a = synthesize("one", &input).unwrap();
        let b = synthesize("two", &input).unwrap();
        assert_ne!(a.fingerprint, b.fingerprint);
    }

    // Random layered inputs: stack i may only reference stacks declared
    // before it, so every generated configuration is a DAG.
    fn layered_stacks(matrix: &[Vec<bool>]) -> Vec<Stack> {
        (0..matrix.len())
            .map(|i| {
                let mut app = ResourceNode::new("app", "service");
                for j in 0..i {
                    if matrix[i][j] {
                        app.properties.insert(
                            format!("dep{}", j),
                            PropertyValue::reference(&format!("s{}", j), "out"),
                        );
                    }
                }
                let mut stack = Stack::new(&format!("s{}", i));
                stack.resources.push(app);
                stack.exports.push(Export {
                    name: "out".into(),
                    value: PropertyValue::local("app"),
                });
                stack
            })
            .collect()
    }

    proptest! {
        #[test]
        fn prop_synthesis_is_deterministic(
            matrix in prop::collection::vec(prop::collection::vec(any::<bool>(), 8), 2..8)
        ) {
            let input = layered_stacks(&matrix);
            let a = synthesize("prop", &input).unwrap();
            let b = synthesize("prop", &input).unwrap();
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(
                serde_json::to_string(&a).unwrap(),
                serde_json::to_string(&b).unwrap()
            );
        }

        #[test]
        fn prop_producers_precede_consumers(
            matrix in prop::collection::vec(prop::collection::vec(any::<bool>(), 8), 2..8)
        ) {
            let input = layered_stacks(&matrix);
            let plan = synthesize("prop", &input).unwrap();
            let pos: HashMap<&str, usize> = plan
                .stack_order
                .iter()
                .enumerate()
                .map(|(i, id)| (id.as_str(), i))
                .collect();
            for b in &plan.bindings {
                prop_assert!(
                    pos[b.producer_stack_id.as_str()] < pos[b.consumer_stack_id.as_str()]
                );
            }
        }
    }
}
