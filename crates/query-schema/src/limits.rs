//! Structural budgets applied to untrusted input.

use serde::{Deserialize, Serialize};

/// Default maximum nesting depth of a validated document.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default maximum number of nodes visited in one validation.
pub const DEFAULT_MAX_NODES: usize = 4096;

/// Bounds on the size of a single input document.
///
/// Depth counts the keys and array positions between the root and a node;
/// nodes count every key and array element visited. Exceeding either bound
/// fails validation with a structural overflow instead of recursing further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationLimits {
    /// Maximum nesting depth.
    pub max_depth: usize,
    /// Maximum number of visited nodes.
    pub max_nodes: usize,
}

impl ValidationLimits {
    /// Creates limits with explicit bounds.
    #[must_use]
    pub const fn new(max_depth: usize, max_nodes: usize) -> Self {
        Self {
            max_depth,
            max_nodes,
        }
    }
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES)
    }
}
