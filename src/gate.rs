//! Invocation gating.
//!
//! Publishing under the canonical namespace must never happen from a fork or
//! a feature branch: forks would burn registry credentials they should not
//! hold, and feature branches would overwrite community tags. The gate is
//! evaluated before registry login and before any compute-consuming step,
//! and it is all-or-nothing: either the whole run proceeds or the whole run
//! is skipped.

use crate::invocation::Invocation;

/// Repository allowed to publish community images
pub const AUTHORIZED_REPOSITORY: &str = "lodestone-db/lodestone";

/// Branch allowed to publish community images
pub const AUTHORIZED_BRANCH: &str = "main";

/// Outcome of evaluating the invocation context.
///
/// A skip is not a failure: the run exits cleanly having done nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Context is authorized, the run may consume credentials and compute
    Proceed,
    /// Context is unauthorized, the entire run is skipped
    Skip {
        /// Human-readable reason, shown to the operator
        reason: String,
    },
}

impl GateDecision {
    /// Whether the run is authorized to proceed
    pub fn proceed(&self) -> bool {
        matches!(self, GateDecision::Proceed)
    }
}

/// Authorize or skip an entire run based on project identity and branch.
pub fn authorize(invocation: &Invocation) -> GateDecision {
    let repository = invocation.repository.as_deref().unwrap_or("");
    if repository != AUTHORIZED_REPOSITORY {
        return GateDecision::Skip {
            reason: format!(
                "repository '{repository}' is not '{AUTHORIZED_REPOSITORY}' (fork or local checkout)"
            ),
        };
    }

    let branch = invocation.branch.as_deref().unwrap_or("");
    if branch != AUTHORIZED_BRANCH {
        return GateDecision::Skip {
            reason: format!("branch '{branch}' is not '{AUTHORIZED_BRANCH}'"),
        };
    }

    GateDecision::Proceed
}
