//! Top-level release command execution.
//!
//! Order matters here: the gate runs before anything that consumes
//! credentials or compute, registry login runs once before any variant, and
//! only then does the matrix fan out.

use crate::catalog::{platform_set, CATALOG};
use crate::cli::{Args, RuntimeConfig};
use crate::compile;
use crate::docker::{self, RegistryCredentials};
use crate::error::Result;
use crate::gate::{self, GateDecision};
use crate::orchestrator;
use crate::runner::{CommandRunner, ProcessRunner};
use std::sync::Arc;

/// Execute a release run and return the process exit code.
pub async fn execute(args: Args) -> Result<i32> {
    let config = RuntimeConfig::new(args.quiet);
    let invocation = args.invocation()?;

    // Identity gating comes first: forks and feature branches must not
    // consume credentials or compute, and must not reach the registry.
    match gate::authorize(&invocation) {
        GateDecision::Skip { reason } => {
            config.warning_println(&format!("Release skipped: {reason}"));
            config.println("No compile, stage, or publish actions were taken.");
            return Ok(0);
        }
        GateDecision::Proceed => {}
    }

    let commit = invocation
        .source_commit
        .get(..8)
        .unwrap_or(&invocation.source_commit);
    config.section(&format!("Release community-{} (commit {commit})", invocation.tag));

    compile::preflight()?;

    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
    docker::check_docker_available(runner.as_ref()).await?;
    docker::check_buildx_available(runner.as_ref()).await?;

    if args.skip_push {
        config.warning_println("Push disabled; images will stay in the builder cache");
    } else {
        let credentials = RegistryCredentials::from_env()?;
        credentials.login(runner.as_ref()).await?;
        config.success_println(&format!(
            "Registry login succeeded for '{}'",
            credentials.username()
        ));
    }

    let options = Arc::new(args.run_options());
    let invocation = Arc::new(invocation);

    config.progress(&format!(
        "Building {} variant(s) for {}",
        CATALOG.len(),
        platform_set()
    ));

    let report = orchestrator::run(runner, Arc::clone(&invocation), Arc::clone(&options)).await;

    config.section("Results");
    for outcome in &report.variants {
        if outcome.succeeded() {
            let image = outcome.image.as_deref().unwrap_or("<unknown>");
            if options.push {
                config.success_println(&format!("{}: published {image}", outcome.variant));
            } else {
                config.success_println(&format!("{}: built {image} (not pushed)", outcome.variant));
            }
        } else {
            config.error_println(&format!(
                "{}: {} ({})",
                outcome.variant,
                outcome.phase,
                outcome.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    let report_path = options
        .checkout
        .join("target")
        .join("image-staging")
        .join("run-report.json");
    report.write(&report_path)?;
    config.indent(&format!("Run report: {}", report_path.display()));

    Ok(if report.all_succeeded() { 0 } else { 1 })
}
