//! The triggering request for one release run.

use crate::error::ConfigurationError;

/// Immutable description of the context a release run was invoked from.
///
/// Built once per run from CLI arguments and the CI environment, then shared
/// read-only by the gate, the compile stage, and the publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Manually supplied release tag, interpolated into image references
    pub tag: String,
    /// Commit hash of the source tree being built, embedded as provenance
    pub source_commit: String,
    /// Repository identity (`owner/name`) of the triggering checkout
    pub repository: Option<String>,
    /// Branch the run was triggered from
    pub branch: Option<String>,
}

impl Invocation {
    /// Assemble an invocation, enforcing the only validation this layer
    /// performs: the tag must be non-empty and a source commit must exist
    /// for provenance. Tag formatting downstream simply interpolates it.
    pub fn new(
        tag: String,
        source_commit: Option<String>,
        repository: Option<String>,
        branch: Option<String>,
    ) -> Result<Self, ConfigurationError> {
        if tag.trim().is_empty() {
            return Err(ConfigurationError::EmptyTag);
        }
        let source_commit = source_commit
            .filter(|commit| !commit.trim().is_empty())
            .ok_or(ConfigurationError::MissingSourceCommit)?;
        Ok(Self {
            tag,
            source_commit,
            repository,
            branch,
        })
    }
}
