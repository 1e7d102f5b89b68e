//! Per-variant state tracking and the machine-readable run report.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Phase of one variant's pipeline.
///
/// Phases advance strictly in order; nothing skips a stage and `Failed` is
/// terminal with no automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariantPhase {
    /// Queued, no work started
    Pending,
    /// Cross-compiling for every target architecture
    Compiling,
    /// All binaries relocated into the staging layout
    Staged,
    /// Multi-arch image build and push in flight
    Publishing,
    /// Image published
    Done,
    /// Pipeline aborted; remaining stages never ran
    Failed,
}

impl VariantPhase {
    /// Whether `next` is a legal successor of this phase
    pub fn can_transition_to(self, next: VariantPhase) -> bool {
        use VariantPhase::*;
        matches!(
            (self, next),
            (Pending, Compiling)
                | (Compiling, Staged)
                | (Staged, Publishing)
                | (Publishing, Done)
                | (Pending | Compiling | Staged | Publishing, Failed)
        )
    }

    /// Whether this phase ends the variant's pipeline
    pub fn is_terminal(self) -> bool {
        matches!(self, VariantPhase::Done | VariantPhase::Failed)
    }
}

impl std::fmt::Display for VariantPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            VariantPhase::Pending => "pending",
            VariantPhase::Compiling => "compiling",
            VariantPhase::Staged => "staged",
            VariantPhase::Publishing => "publishing",
            VariantPhase::Done => "done",
            VariantPhase::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Live phase tracker for one variant.
#[derive(Debug)]
pub struct VariantProgress {
    variant: &'static str,
    phase: VariantPhase,
}

impl VariantProgress {
    /// Start tracking a variant at `Pending`
    pub fn new(variant: &'static str) -> Self {
        Self {
            variant,
            phase: VariantPhase::Pending,
        }
    }

    /// Current phase
    pub fn phase(&self) -> VariantPhase {
        self.phase
    }

    /// Advance to the next phase. The pipeline drives phases in order;
    /// skipping a stage is a programming error.
    pub fn advance(&mut self, next: VariantPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal transition {} -> {} for variant {}",
            self.phase,
            next,
            self.variant
        );
        log::debug!("{}: {} -> {}", self.variant, self.phase, next);
        self.phase = next;
    }
}

/// Terminal outcome of one variant's pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantOutcome {
    /// Variant name
    pub variant: String,
    /// Terminal phase, `Done` or `Failed`
    pub phase: VariantPhase,
    /// Published image reference, present only on success
    pub image: Option<String>,
    /// Platform labels covered by the published manifest
    pub platforms: Vec<String>,
    /// Failure description, present only on failure
    pub error: Option<String>,
}

impl VariantOutcome {
    /// Whether this variant completed its whole pipeline
    pub fn succeeded(&self) -> bool {
        self.phase == VariantPhase::Done
    }
}

/// Machine-readable summary of a whole release run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Release tag the run was invoked with
    pub tag: String,
    /// Source commit embedded as provenance
    pub commit: String,
    /// When the matrix started
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// When the last variant finished
    pub finished_at: chrono::DateTime<chrono::Utc>,
    /// One outcome per catalog variant, in catalog order
    pub variants: Vec<VariantOutcome>,
}

impl RunReport {
    /// Overall result: the conjunction of per-variant results
    pub fn all_succeeded(&self) -> bool {
        self.variants.iter().all(VariantOutcome::succeeded)
    }

    /// Serialize the report to pretty JSON at `path`
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}
