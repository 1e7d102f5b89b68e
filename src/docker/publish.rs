//! Multi-arch image build and push.
//!
//! One backend invocation per variant covers the full platform set, so the
//! registry only ever sees a complete manifest list. Two single-platform
//! pushes would leave a window where a pull resolves for one architecture
//! and 404s for the other; a single `--push` build keeps publication atomic.

use crate::catalog::{platform_set, ImageVariant, TARGETS};
use crate::error::{PublishError, Result};
use crate::invocation::Invocation;
use crate::runner::{CommandRequest, CommandRunner};
use std::path::Path;

/// A published (or, with push disabled, fully assembled) variant image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedImage {
    /// Variant the image was built from
    pub variant: String,
    /// Full image reference, `<registry>/<variant>:community-<tag>`
    pub tag: String,
    /// Platform labels covered by the manifest list
    pub platforms: Vec<String>,
    /// Source commit embedded as build provenance
    pub git_hash: String,
    /// Whether the manifest was pushed to the registry
    pub pushed: bool,
}

/// Build the backend command line for one variant.
///
/// The build context is the variant's staging root: the descriptor packages
/// the already-staged binaries and compiles nothing itself.
pub fn publish_request(
    checkout: &Path,
    variant: &ImageVariant,
    invocation: &Invocation,
    registry: &str,
    staging_root: &Path,
    push: bool,
) -> CommandRequest {
    let mut request = CommandRequest::new("docker")
        .args(["buildx", "build", "-f"])
        .arg(checkout.join(variant.descriptor).to_string_lossy().into_owned())
        .arg("--platform")
        .arg(platform_set())
        .arg("--build-arg")
        .arg(format!("git_hash={}", invocation.source_commit))
        .arg("-t")
        .arg(variant.image_tag(registry, &invocation.tag));

    if push {
        request = request.arg("--push");
    }

    request
        .arg(staging_root.to_string_lossy().into_owned())
        .streamed()
}

/// Build and push one variant's multi-arch image.
///
/// On success the manifest list for every platform is live under the
/// community tag; on failure nothing partial was published.
pub async fn publish_variant(
    runner: &dyn CommandRunner,
    checkout: &Path,
    variant: &ImageVariant,
    invocation: &Invocation,
    registry: &str,
    staging_root: &Path,
    push: bool,
) -> Result<PublishedImage> {
    let tag = variant.image_tag(registry, &invocation.tag);
    log::info!(
        "building image {tag} for platforms {}{}",
        platform_set(),
        if push { " (push)" } else { " (no push)" }
    );

    let request = publish_request(checkout, variant, invocation, registry, staging_root, push);
    let output = runner.run(request).await.map_err(|e| PublishError::Spawn {
        variant: variant.name.to_string(),
        reason: e.to_string(),
    })?;

    if !output.success {
        return Err(PublishError::Backend {
            variant: variant.name.to_string(),
            code: output.code,
            stderr: output.stderr,
        }
        .into());
    }

    Ok(PublishedImage {
        variant: variant.name.to_string(),
        tag,
        platforms: TARGETS.iter().map(|t| t.platform.to_string()).collect(),
        git_hash: invocation.source_commit.clone(),
        pushed: push,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CATALOG;

    fn invocation() -> Invocation {
        Invocation::new(
            "v1.2.3".to_string(),
            Some("abc123".to_string()),
            Some("lodestone-db/lodestone".to_string()),
            Some("main".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn single_invocation_covers_the_full_platform_set() {
        let request = publish_request(
            Path::new("/checkout"),
            &CATALOG[0],
            &invocation(),
            "lodestonedb",
            Path::new("/staging/lodestone"),
            true,
        );

        assert_eq!(request.program, "docker");
        assert_eq!(request.args[0], "buildx");
        let platform_args: Vec<_> = request
            .args
            .iter()
            .zip(request.args.iter().skip(1))
            .filter(|(flag, _)| *flag == "--platform")
            .map(|(_, value)| value.clone())
            .collect();
        // One --platform flag naming both architectures, never one per arch.
        assert_eq!(platform_args, vec!["linux/amd64,linux/arm64".to_string()]);
    }

    #[test]
    fn request_carries_tag_provenance_and_context() {
        let request = publish_request(
            Path::new("/checkout"),
            &CATALOG[1],
            &invocation(),
            "lodestonedb",
            Path::new("/staging/lodestone-meta"),
            true,
        );
        let args = request.args.join(" ");
        assert!(args.contains("-t lodestonedb/lodestone-meta:community-v1.2.3"));
        assert!(args.contains("--build-arg git_hash=abc123"));
        assert!(args.contains("--push"));
        assert_eq!(request.args.last().unwrap(), "/staging/lodestone-meta");
    }

    #[test]
    fn push_flag_is_omitted_when_disabled() {
        let request = publish_request(
            Path::new("/checkout"),
            &CATALOG[0],
            &invocation(),
            "lodestonedb",
            Path::new("/staging/lodestone"),
            false,
        );
        assert!(!request.args.iter().any(|arg| arg == "--push"));
    }

    #[test]
    fn descriptor_is_resolved_against_the_checkout() {
        let request = publish_request(
            Path::new("/checkout"),
            &CATALOG[1],
            &invocation(),
            "lodestonedb",
            Path::new("/staging/lodestone-meta"),
            true,
        );
        let f_index = request.args.iter().position(|arg| arg == "-f").unwrap();
        assert_eq!(request.args[f_index + 1], "/checkout/docker/Dockerfile_meta");
    }
}
