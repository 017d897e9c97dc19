//! Task identifier validation.
//!
//! Every ingested report or snapshot is keyed by a task identifier that must
//! start with one of a fixed set of allowed prefixes. Validation is pure:
//! rejecting an identifier never touches any store.

// ============================================================================
// Constants
// ============================================================================

/// Prefixes accepted when no explicit allow-list is configured.
pub const DEFAULT_PREFIXES: [&str; 5] = ["scan-", "build-", "snapshot-", "test-", "recovery-"];

// ============================================================================
// TaskIdPolicy
// ============================================================================

/// Allow-list of required task identifier prefixes.
#[derive(Debug, Clone)]
pub struct TaskIdPolicy {
    prefixes: Vec<String>,
}

impl TaskIdPolicy {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    /// True iff `task_id` starts with one of the allowed prefixes.
    pub fn is_allowed(&self, task_id: &str) -> bool {
        self.prefixes.iter().any(|p| task_id.starts_with(p.as_str()))
    }

    /// The configured prefixes, as reported by the health endpoint.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl Default for TaskIdPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
