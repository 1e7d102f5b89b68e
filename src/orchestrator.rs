//! Matrix orchestration across image variants.
//!
//! Every catalog variant runs as an independent task with its own strictly
//! ordered pipeline: compile both architectures, stage, publish. Variants
//! share nothing mutable beyond the compiler cache namespace, which is
//! conflict-free by construction, so no synchronization exists between them.
//! A failed variant is recorded and its siblings run to completion; the
//! run's overall result is the conjunction of per-variant results.

use crate::catalog::{ImageVariant, CATALOG};
use crate::compile::{self, CompileOptions};
use crate::docker;
use crate::invocation::Invocation;
use crate::report::{RunReport, VariantOutcome, VariantPhase, VariantProgress};
use crate::runner::CommandRunner;
use crate::stage;
use std::path::PathBuf;
use std::sync::Arc;

/// Run-wide settings shared read-only by every variant task.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Product checkout the toolchain builds from
    pub checkout: PathBuf,
    /// Registry namespace images are tagged under
    pub registry: String,
    /// Whether built manifests are pushed to the registry
    pub push: bool,
    /// Advisory compile configuration
    pub compile: CompileOptions,
}

/// Drive the full build matrix and collect one outcome per variant.
///
/// Callers have already authorized the invocation and established registry
/// credentials; this function only consumes compute.
pub async fn run(
    runner: Arc<dyn CommandRunner>,
    invocation: Arc<Invocation>,
    options: Arc<RunOptions>,
) -> RunReport {
    let started_at = chrono::Utc::now();

    let mut handles = Vec::with_capacity(CATALOG.len());
    for variant in &CATALOG {
        let runner = Arc::clone(&runner);
        let invocation = Arc::clone(&invocation);
        let options = Arc::clone(&options);
        let handle = tokio::spawn(async move {
            run_variant(runner.as_ref(), &invocation, &options, variant).await
        });
        handles.push((variant.name, handle));
    }

    let mut variants = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            // A panicked variant task still must not suppress sibling
            // outcomes; record it as a failure of that variant alone.
            Err(e) => VariantOutcome {
                variant: name.to_string(),
                phase: VariantPhase::Failed,
                image: None,
                platforms: Vec::new(),
                error: Some(format!("variant task aborted: {e}")),
            },
        };
        variants.push(outcome);
    }

    RunReport {
        tag: invocation.tag.clone(),
        commit: invocation.source_commit.clone(),
        started_at,
        finished_at: chrono::Utc::now(),
        variants,
    }
}

/// Execute one variant's pipeline and fold any error into its outcome.
async fn run_variant(
    runner: &dyn CommandRunner,
    invocation: &Invocation,
    options: &RunOptions,
    variant: &'static ImageVariant,
) -> VariantOutcome {
    let mut progress = VariantProgress::new(variant.name);

    match variant_pipeline(runner, invocation, options, variant, &mut progress).await {
        Ok(image) => VariantOutcome {
            variant: variant.name.to_string(),
            phase: progress.phase(),
            image: Some(image.tag),
            platforms: image.platforms,
            error: None,
        },
        Err(e) => {
            progress.advance(VariantPhase::Failed);
            log::error!("variant {} failed: {e}", variant.name);
            VariantOutcome {
                variant: variant.name.to_string(),
                phase: VariantPhase::Failed,
                image: None,
                platforms: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}

/// The strictly ordered pipeline for one variant.
///
/// Each stage starts only after its predecessor reported success; an error
/// anywhere aborts the remaining stages for this variant only.
async fn variant_pipeline(
    runner: &dyn CommandRunner,
    invocation: &Invocation,
    options: &RunOptions,
    variant: &'static ImageVariant,
    progress: &mut VariantProgress,
) -> crate::error::Result<docker::PublishedImage> {
    variant.validate(&options.checkout)?;

    progress.advance(VariantPhase::Compiling);
    let artifacts =
        compile::build_variant(runner, &options.checkout, variant, &options.compile).await?;
    compile::report_cache_stats(runner, &options.compile).await;

    let staging_root = stage::prepare_staging_root(&options.checkout, variant)?;
    let staged = stage::stage_artifacts(&staging_root, &artifacts)?;
    progress.advance(VariantPhase::Staged);
    log::info!("staged {} binaries for {}", staged.len(), variant.name);

    progress.advance(VariantPhase::Publishing);
    let image = docker::publish_variant(
        runner,
        &options.checkout,
        variant,
        invocation,
        &options.registry,
        &staging_root,
        options.push,
    )
    .await?;
    progress.advance(VariantPhase::Done);

    Ok(image)
}
