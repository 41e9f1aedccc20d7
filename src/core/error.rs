//! Planning error taxonomy.
//!
//! Every error is fatal and detected during graph construction or
//! scheduling, never after plan execution begins. Each variant carries the
//! ids involved so the caller can present the failure without re-deriving
//! context.

use thiserror::Error;

/// A fatal configuration error found while building or ordering the
/// dependency graph. None of these are recoverable; no partial plan is
/// produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Two stacks share an id.
    #[error("stack '{stack}' is declared more than once")]
    DuplicateStackId { stack: String },

    /// Two resources within one stack share an id.
    #[error("stack '{stack}' declares resource '{resource}' more than once")]
    DuplicateResourceId { stack: String, resource: String },

    /// A stack declares two exports with the same name.
    #[error("stack '{stack}' declares export '{export}' more than once")]
    DuplicateExportName { stack: String, export: String },

    /// A resource references a nonexistent sibling resource id.
    #[error("resource '{resource}' in stack '{stack}' references unknown sibling '{target}'")]
    DanglingLocalRef {
        stack: String,
        resource: String,
        target: String,
    },

    /// An export surfaces a resource the stack does not declare.
    #[error("export '{export}' of stack '{stack}' references unknown resource '{target}'")]
    DanglingExport {
        stack: String,
        export: String,
        target: String,
    },

    /// An export tries to surface another stack's value.
    #[error("export '{export}' of stack '{stack}' surfaces a value the stack does not own")]
    ForeignExport { stack: String, export: String },

    /// A reference names a stack that does not exist.
    #[error("resource '{resource}' in stack '{stack}' references unknown stack '{target_stack}'")]
    UnknownStack {
        stack: String,
        resource: String,
        target_stack: String,
    },

    /// A reference names an export the producer stack does not declare.
    #[error(
        "resource '{resource}' in stack '{stack}' references unknown export '{export}' of stack '{target_stack}'"
    )]
    UnknownExport {
        stack: String,
        resource: String,
        target_stack: String,
        export: String,
    },

    /// A stack references its own export as an import.
    #[error("stack '{stack}' imports its own export '{export}'")]
    SelfImport { stack: String, export: String },

    /// The dependency graph contains a cycle; no deployment order exists.
    /// Carries the offending cycle, in dependency order.
    #[error("dependency cycle detected: {}", .cycle.join(" -> "))]
    CycleDetected { cycle: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_ids() {
        let e = PlanError::DanglingLocalRef {
            stack: "S".into(),
            resource: "X".into(),
            target: "Y".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("'X'"));
        assert!(msg.contains("'Y'"));
        assert!(msg.contains("'S'"));
    }

    #[test]
    fn test_cycle_message_lists_members() {
        let e = PlanError::CycleDetected {
            cycle: vec!["A".into(), "B".into()],
        };
        assert_eq!(e.to_string(), "dependency cycle detected: A -> B");
    }

    #[test]
    fn test_unknown_export_message() {
        let e = PlanError::UnknownExport {
            stack: "pipeline".into(),
            resource: "deploy".into(),
            target_stack: "infra".into(),
            export: "missing".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("'missing'"));
        assert!(msg.contains("'infra'"));
    }
}
