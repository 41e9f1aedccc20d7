//! Data model for stacks, resources, property values, and resolved plans.
//!
//! Declarations are immutable once handed to the graph builder; every pass
//! only reads them and produces derived structures. All types derive
//! Serialize/Deserialize so surrounding tooling can round-trip them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Property values
// ============================================================================

/// A scalar literal carried by a resource property or export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A property value on a resource or export.
///
/// `LocalRef` points at a sibling resource in the same stack. `Reference`
/// points at another stack's export and is only resolvable after that stack
/// deploys. Everything else is a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    LocalRef { local: String },
    Reference { stack: String, export: String },
    Literal(ScalarValue),
}

impl PropertyValue {
    /// Literal scalar value.
    pub fn literal(value: impl Into<ScalarValue>) -> Self {
        Self::Literal(value.into())
    }

    /// Reference to a sibling resource in the same stack.
    pub fn local(resource_id: &str) -> Self {
        Self::LocalRef {
            local: resource_id.to_string(),
        }
    }

    /// Reference to another stack's export.
    pub fn reference(stack_id: &str, export_name: &str) -> Self {
        Self::Reference {
            stack: stack_id.to_string(),
            export: export_name.to_string(),
        }
    }
}

// ============================================================================
// Suppressions
// ============================================================================

/// Opaque waiver metadata attached to a stack or resource.
///
/// The planner is a dumb carrier for these: they pass through into the plan
/// unchanged and are never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Rule or finding identifier being waived
    pub id: String,

    /// Human justification
    pub reason: String,
}

// ============================================================================
// Resources
// ============================================================================

/// A single declared infrastructural unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Resource ID, unique within its owning stack
    pub id: String,

    /// Opaque type tag (e.g. "network", "compute-role", "service")
    pub kind: String,

    /// Property values, declaration order preserved
    #[serde(default)]
    pub properties: IndexMap<String, PropertyValue>,

    /// Explicit ordering dependencies on sibling resources
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Waiver metadata, passed through to the plan
    #[serde(default)]
    pub suppressions: Vec<Suppression>,
}

impl ResourceNode {
    /// Create a resource with no properties.
    pub fn new(id: &str, kind: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            properties: IndexMap::new(),
            depends_on: Vec::new(),
            suppressions: Vec::new(),
        }
    }
}

// ============================================================================
// Stacks
// ============================================================================

/// A named output value a stack makes available to other stacks.
///
/// An export can only surface a value the stack itself owns: a literal, or a
/// `LocalRef` to one of its own resources. Exports are an ordered list, not
/// a map, so the builder can reject duplicate names instead of a map
/// silently collapsing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Export {
    pub name: String,
    pub value: PropertyValue,
}

/// A deployable unit grouping resources and exposing named output values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    /// Stack ID, globally unique
    pub id: String,

    /// Resource declarations, declaration order preserved
    #[serde(default)]
    pub resources: Vec<ResourceNode>,

    /// Exported output values
    #[serde(default)]
    pub exports: Vec<Export>,

    /// Stack-level waiver metadata
    #[serde(default)]
    pub suppressions: Vec<Suppression>,
}

impl Stack {
    /// Create an empty stack.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            resources: Vec::new(),
            exports: Vec::new(),
            suppressions: Vec::new(),
        }
    }
}

/// Synthesized identity token for a resource: `"{stack_id}/{resource_id}"`.
pub fn identity_token(stack_id: &str, resource_id: &str) -> String {
    format!("{}/{}", stack_id, resource_id)
}

// ============================================================================
// Resolved plan
// ============================================================================

/// A cross-stack value binding that can only be filled in after the
/// producing stack deploys. The deployment executor substitutes the concrete
/// exported value at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredBinding {
    pub consumer_stack_id: String,
    pub consumer_resource_id: String,
    pub property: String,
    pub producer_stack_id: String,
    pub export_name: String,
}

/// A same-stack reference resolved statically to an identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalBinding {
    pub resource_id: String,
    pub property: String,
    pub target: String,
}

/// A value fully determined at synthesis time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResolvedValue {
    Literal(ScalarValue),
    Identity(String),
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => write!(f, "{}", s),
            Self::Identity(t) => write!(f, "{}", t),
        }
    }
}

/// An export entry in the plan — tells the executor which value to publish
/// once the stack is deployed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedExport {
    pub name: String,
    pub value: ResolvedValue,
}

/// A suppression carried into the plan, scoped to the stack id or to a
/// resource identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedSuppression {
    pub scope: String,
    pub id: String,
    pub reason: String,
}

/// One stack's slice of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStack {
    /// Stack ID
    pub stack_id: String,

    /// Resource deployment order within the stack
    pub resource_order: Vec<String>,

    /// Exports the executor publishes after this stack deploys
    pub exports: Vec<PlannedExport>,

    /// Statically resolved same-stack references
    pub locals: Vec<LocalBinding>,

    /// Waiver metadata, verbatim from the declarations
    pub suppressions: Vec<ScopedSuppression>,
}

/// The complete, internally consistent deployment plan.
///
/// Either the whole plan is produced, or synthesis fails; there is no
/// partial plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlan {
    /// Configuration name
    pub name: String,

    /// Stack deployment order
    pub stack_order: Vec<String>,

    /// Per-stack orders, bindings, and passthrough metadata
    pub stacks: Vec<PlannedStack>,

    /// Cross-stack bindings to be filled by the executor at runtime
    pub bindings: Vec<DeferredBinding>,

    /// BLAKE3 digest of the plan's canonical components
    pub fingerprint: String,
}

// ============================================================================
// Tests
// ============================================================================
