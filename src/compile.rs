//! Cross-compilation stage.
//!
//! Each variant is compiled once per target architecture: two independent
//! toolchain invocations, never a combined one, because the foreign target
//! needs its own linker configuration. The two builds have no mutual
//! ordering and run concurrently; staging only starts after both finish.

use crate::catalog::{ImageVariant, TargetArch, TARGETS};
use crate::error::{ConfigurationError, Result, ToolchainError};
use crate::runner::{CommandRequest, CommandRunner};
use std::path::{Path, PathBuf};

/// Advisory compile configuration taken from the environment.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Compiler wrapper exported as `RUSTC_WRAPPER`, typically a shared
    /// compilation cache. `None` disables the wrapper entirely.
    pub wrapper: Option<String>,
}

/// One produced binary, not yet staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    /// Binary file name
    pub binary: String,
    /// Architecture the binary was compiled for
    pub target: &'static TargetArch,
    /// Toolchain output location
    pub source_path: PathBuf,
}

/// Verify the toolchain exists before any variant consumes compute.
///
/// A missing foreign linker is only logged: the wrapper and linker settings
/// are advisory and the toolchain produces the authoritative failure.
pub fn preflight() -> Result<()> {
    which::which("cargo").map_err(|e| ConfigurationError::ToolNotFound {
        tool: "cargo".to_string(),
        reason: e.to_string(),
    })?;

    for target in &TARGETS {
        if !target.is_native()
            && let Some(linker) = target.linker
            && which::which(linker).is_err()
        {
            log::warn!("foreign linker '{linker}' for {} not found on PATH", target.triple);
        }
    }
    Ok(())
}

/// Build the toolchain command line for one (variant, target) pair.
pub fn build_request(
    checkout: &Path,
    variant: &ImageVariant,
    target: &TargetArch,
    options: &CompileOptions,
) -> CommandRequest {
    let mut request = CommandRequest::new("cargo")
        .args(["build", "--release", "--target"])
        .arg(target.triple)
        .current_dir(checkout);

    for package in variant.packages {
        request = request.arg("--package").arg(*package);
    }
    for binary in variant.binaries {
        request = request.arg("--bin").arg(*binary);
    }

    if let Some(wrapper) = &options.wrapper {
        request = request.env("RUSTC_WRAPPER", wrapper);
    }
    if !target.is_native()
        && let Some(linker) = target.linker
    {
        request = request.env(target.linker_env_var(), linker);
    }

    request
}

/// Compile one variant for one architecture.
///
/// Returns the expected toolchain output paths for every declared binary.
/// Whether those paths actually exist is the stager's concern.
pub async fn build_target(
    runner: &dyn CommandRunner,
    checkout: &Path,
    variant: &ImageVariant,
    target: &'static TargetArch,
    options: &CompileOptions,
) -> Result<Vec<BuildArtifact>> {
    let request = build_request(checkout, variant, target, options);
    log::info!("building {} for {}", variant.name, target.triple);

    let output = runner.run(request).await.map_err(|e| ToolchainError::Spawn {
        triple: target.triple.to_string(),
        reason: e.to_string(),
    })?;

    if !output.success {
        return Err(ToolchainError::BuildFailed {
            triple: target.triple.to_string(),
            code: output.code,
            stderr: output.stderr,
        }
        .into());
    }

    let release_dir = checkout.join("target").join(target.triple).join("release");
    Ok(variant
        .binaries
        .iter()
        .map(|binary| BuildArtifact {
            binary: (*binary).to_string(),
            target,
            source_path: release_dir.join(binary),
        })
        .collect())
}

/// Compile one variant for every catalog target, concurrently.
///
/// Both builds are driven to completion before either result is inspected,
/// so a failing architecture never leaves its sibling half-killed. The first
/// error (in catalog order) aborts the variant.
pub async fn build_variant(
    runner: &dyn CommandRunner,
    checkout: &Path,
    variant: &ImageVariant,
    options: &CompileOptions,
) -> Result<Vec<BuildArtifact>> {
    let (first, second) = tokio::join!(
        build_target(runner, checkout, variant, &TARGETS[0], options),
        build_target(runner, checkout, variant, &TARGETS[1], options),
    );

    let mut artifacts = first?;
    artifacts.extend(second?);
    Ok(artifacts)
}

/// Print shared-cache statistics after a variant's builds.
///
/// Cache misses are not errors, and neither is a wrapper that cannot report
/// stats; the outcome is logged and discarded.
pub async fn report_cache_stats(runner: &dyn CommandRunner, options: &CompileOptions) {
    let Some(wrapper) = &options.wrapper else {
        return;
    };
    if !wrapper.ends_with("sccache") {
        return;
    }

    match runner.run(CommandRequest::new(wrapper).arg("--show-stats")).await {
        Ok(output) if output.success => {
            for line in output.stdout.lines() {
                log::info!(target: "lodestone_release::cache", "{line}");
            }
        }
        Ok(output) => log::debug!("cache stats unavailable (exit code {:?})", output.code),
        Err(e) => log::debug!("cache stats unavailable: {e}"),
    }
}
