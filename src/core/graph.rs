//! Dependency graph construction.
//!
//! Scans all stacks and resources and materializes directed edges:
//! intra-stack (resource -> resource, from `LocalRef` properties and
//! `depends_on`) and inter-stack (stack -> stack, from `Reference`
//! properties). All structural reference errors are caught here, before any
//! scheduling is attempted. Inputs are never mutated.

use super::error::PlanError;
use super::types::{PropertyValue, Stack};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// A cross-stack import actually consumed by a stack's resources.
/// Derived from `Reference` properties, never separately declared.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImportRef {
    pub stack: String,
    pub export: String,
}

/// A directed graph over string ids, edges pointing consumer -> producer.
///
/// Node indices follow declaration order; edge sets are `BTreeSet`-backed so
/// iteration is deterministic. Acyclicity is verified by the scheduler, not
/// here.
#[derive(Debug, Clone, Default)]
pub struct Dag {
    pub(crate) nodes: Vec<String>,
    pub(crate) index: HashMap<String, usize>,
    /// producer -> consumers that wait on it
    pub(crate) dependents: Vec<BTreeSet<usize>>,
    /// consumer -> producers it waits on
    pub(crate) producers: Vec<BTreeSet<usize>>,
}

impl Dag {
    fn add_node(&mut self, id: &str) -> usize {
        let i = self.nodes.len();
        self.nodes.push(id.to_string());
        self.index.insert(id.to_string(), i);
        self.dependents.push(BTreeSet::new());
        self.producers.push(BTreeSet::new());
        i
    }

    fn add_edge(&mut self, consumer: usize, producer: usize) {
        self.dependents[producer].insert(consumer);
        self.producers[consumer].insert(producer);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.producers.iter().map(|p| p.len()).sum()
    }
}

/// The coarse (stack-level) graph plus one fine (resource-level) graph per
/// stack, with the per-stack import cache.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    pub(crate) coarse: Dag,
    pub(crate) fine: IndexMap<String, Dag>,
    imports: IndexMap<String, BTreeSet<ImportRef>>,
}

impl DependencyGraph {
    /// Stack ids in declaration order.
    pub fn stack_ids(&self) -> &[String] {
        &self.coarse.nodes
    }

    /// The imports a stack's resources actually consume.
    pub fn imports_of(&self, stack_id: &str) -> Option<&BTreeSet<ImportRef>> {
        self.imports.get(stack_id)
    }

    /// The resource-level graph of one stack.
    pub fn fine_graph(&self, stack_id: &str) -> Option<&Dag> {
        self.fine.get(stack_id)
    }
}

/// Per-stack declaration index used during edge construction.
struct StackEntry<'a> {
    stack: &'a Stack,
    coarse_idx: usize,
    resource_idx: HashMap<&'a str, usize>,
    export_names: HashSet<&'a str>,
}

/// Build the dependency graph for an ordered sequence of stacks.
///
/// Fails on the first structural error: duplicate ids, dangling or foreign
/// references, self-imports. See [`PlanError`] for the full taxonomy.
pub fn build(stacks: &[Stack]) -> Result<DependencyGraph, PlanError> {
    let mut coarse = Dag::default();
    let mut entries: Vec<StackEntry<'_>> = Vec::with_capacity(stacks.len());
    let mut stack_idx: HashMap<&str, usize> = HashMap::new();

    // Pass 1: register stacks, resources, and exports; validate uniqueness
    // and export ownership.
    for stack in stacks {
        if stack_idx.contains_key(stack.id.as_str()) {
            return Err(PlanError::DuplicateStackId {
                stack: stack.id.clone(),
            });
        }
        let coarse_idx = coarse.add_node(&stack.id);
        stack_idx.insert(&stack.id, coarse_idx);

        let mut resource_idx: HashMap<&str, usize> = HashMap::new();
        for (i, resource) in stack.resources.iter().enumerate() {
            if resource_idx.insert(&resource.id, i).is_some() {
                return Err(PlanError::DuplicateResourceId {
                    stack: stack.id.clone(),
                    resource: resource.id.clone(),
                });
            }
        }

        let mut export_names: HashSet<&str> = HashSet::new();
        for export in &stack.exports {
            if !export_names.insert(&export.name) {
                return Err(PlanError::DuplicateExportName {
                    stack: stack.id.clone(),
                    export: export.name.clone(),
                });
            }
            match &export.value {
                PropertyValue::Literal(_) => {}
                PropertyValue::LocalRef { local } => {
                    if !resource_idx.contains_key(local.as_str()) {
                        return Err(PlanError::DanglingExport {
                            stack: stack.id.clone(),
                            export: export.name.clone(),
                            target: local.clone(),
                        });
                    }
                }
                PropertyValue::Reference { .. } => {
                    return Err(PlanError::ForeignExport {
                        stack: stack.id.clone(),
                        export: export.name.clone(),
                    });
                }
            }
        }

        entries.push(StackEntry {
            stack,
            coarse_idx,
            resource_idx,
            export_names,
        });
    }

    // Pass 2: materialize edges and the import cache.
    let mut fine: IndexMap<String, Dag> = IndexMap::with_capacity(stacks.len());
    let mut imports: IndexMap<String, BTreeSet<ImportRef>> =
        IndexMap::with_capacity(stacks.len());

    for entry in &entries {
        let stack = entry.stack;
        let mut dag = Dag::default();
        for resource in &stack.resources {
            dag.add_node(&resource.id);
        }

        let mut stack_imports: BTreeSet<ImportRef> = BTreeSet::new();
        for (consumer, resource) in stack.resources.iter().enumerate() {
            for dep in &resource.depends_on {
                let producer = entry.resource_idx.get(dep.as_str()).copied().ok_or_else(|| {
                    PlanError::DanglingLocalRef {
                        stack: stack.id.clone(),
                        resource: resource.id.clone(),
                        target: dep.clone(),
                    }
                })?;
                dag.add_edge(consumer, producer);
            }

            for value in resource.properties.values() {
                match value {
                    PropertyValue::Literal(_) => {}
                    PropertyValue::LocalRef { local } => {
                        let producer =
                            entry.resource_idx.get(local.as_str()).copied().ok_or_else(|| {
                                PlanError::DanglingLocalRef {
                                    stack: stack.id.clone(),
                                    resource: resource.id.clone(),
                                    target: local.clone(),
                                }
                            })?;
                        dag.add_edge(consumer, producer);
                    }
                    PropertyValue::Reference { stack: target, export } => {
                        if *target == stack.id {
                            return Err(PlanError::SelfImport {
                                stack: stack.id.clone(),
                                export: export.clone(),
                            });
                        }
                        let producer_idx =
                            stack_idx.get(target.as_str()).copied().ok_or_else(|| {
                                PlanError::UnknownStack {
                                    stack: stack.id.clone(),
                                    resource: resource.id.clone(),
                                    target_stack: target.clone(),
                                }
                            })?;
                        if !entries[producer_idx].export_names.contains(export.as_str()) {
                            return Err(PlanError::UnknownExport {
                                stack: stack.id.clone(),
                                resource: resource.id.clone(),
                                target_stack: target.clone(),
                                export: export.clone(),
                            });
                        }
                        coarse.add_edge(entry.coarse_idx, producer_idx);
                        stack_imports.insert(ImportRef {
                            stack: target.clone(),
                            export: export.clone(),
                        });
                    }
                }
            }
        }

        fine.insert(stack.id.clone(), dag);
        imports.insert(stack.id.clone(), stack_imports);
    }

    debug!(
        stacks = coarse.len(),
        inter_stack_edges = coarse.edge_count(),
        intra_stack_edges = fine.values().map(Dag::edge_count).sum::<usize>(),
        "dependency graph built"
    );

    Ok(DependencyGraph {
        coarse,
        fine,
        imports,
    })
}
