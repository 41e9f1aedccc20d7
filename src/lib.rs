//! Stackplan — declarative multi-stack deployment planning.
//!
//! Stacks declare resources, exports, and cross-stack references; stackplan
//! builds the dependency graph, computes a deterministic deployment order,
//! and resolves every reference into an explicit deferred binding for the
//! deployment executor to fill in at runtime.

pub mod core;

pub use crate::core::error::PlanError;
pub use crate::core::planner::synthesize;
pub use crate::core::types::{
    DeferredBinding, PropertyValue, ResolvedPlan, ResourceNode, Stack,
};
