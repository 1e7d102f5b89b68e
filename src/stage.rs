//! Artifact staging.
//!
//! Relocates toolchain output into the `linux/<platform>/<binary>` layout
//! the image descriptors consume. The layout is a fixed contract: the
//! descriptors COPY binaries from these exact relative paths, so a staged
//! tree that deviates produces a broken image, not a build error.

use crate::catalog::ImageVariant;
use crate::compile::BuildArtifact;
use crate::error::{ArtifactError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// One binary relocated into the staging layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    /// Binary file name
    pub binary: String,
    /// Architecture label the binary is staged under
    pub platform: &'static str,
    /// Absolute staged location
    pub path: PathBuf,
}

/// Staging root for one variant, disjoint from every sibling's.
///
/// Lives under the checkout's `target/` so a repository clean removes it.
pub fn staging_root(checkout: &Path, variant: &ImageVariant) -> PathBuf {
    checkout.join("target").join("image-staging").join(variant.name)
}

/// Reset a variant's staging root to an empty directory.
///
/// Stale binaries from an earlier run must never leak into a fresh image.
pub fn prepare_staging_root(checkout: &Path, variant: &ImageVariant) -> Result<PathBuf> {
    let root = staging_root(checkout, variant);
    match fs::remove_dir_all(&root) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::create_dir_all(&root)?;
    Ok(root)
}

/// Move every produced binary into `linux/<platform>/<binary>` under the
/// staging root.
///
/// The toolchain claimed success by the time this runs, so an absent or
/// empty source binary is fatal to the variant.
pub fn stage_artifacts(
    staging_root: &Path,
    artifacts: &[BuildArtifact],
) -> Result<Vec<StagedArtifact>> {
    let mut staged = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        verify_source(artifact)?;

        let arch_dir = staging_root.join(artifact.target.output_dir());
        fs::create_dir_all(&arch_dir).map_err(|e| ArtifactError::Relocate {
            binary: artifact.binary.clone(),
            dest: arch_dir.clone(),
            reason: e.to_string(),
        })?;

        let dest = arch_dir.join(&artifact.binary);
        relocate(&artifact.source_path, &dest).map_err(|e| ArtifactError::Relocate {
            binary: artifact.binary.clone(),
            dest: dest.clone(),
            reason: e.to_string(),
        })?;

        log::debug!("staged {} -> {}", artifact.source_path.display(), dest.display());
        staged.push(StagedArtifact {
            binary: artifact.binary.clone(),
            platform: artifact.target.platform,
            path: dest,
        });
    }

    Ok(staged)
}

/// Check a toolchain output exists and is non-empty before relocating it.
fn verify_source(artifact: &BuildArtifact) -> Result<()> {
    let metadata = fs::metadata(&artifact.source_path).map_err(|_| ArtifactError::Missing {
        binary: artifact.binary.clone(),
        path: artifact.source_path.clone(),
    })?;

    if metadata.len() == 0 {
        return Err(ArtifactError::Empty {
            binary: artifact.binary.clone(),
            path: artifact.source_path.clone(),
        }
        .into());
    }
    Ok(())
}

/// Move a file, falling back to copy-and-remove across filesystems.
fn relocate(source: &Path, dest: &Path) -> std::io::Result<()> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }
    fs::copy(source, dest)?;
    fs::remove_file(source)
}
