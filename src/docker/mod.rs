//! Image build backend integration.
//!
//! The backend is `docker buildx`: one multi-arch build per variant,
//! assembling a single manifest list that covers every catalog platform.
//! This module only drives the backend through the command runner; image
//! assembly, emulation, and registry transport are the backend's business.
//!
//! # Module Structure
//!
//! - `login` - Scoped registry credentials and the once-per-run login
//! - `publish` - Multi-arch image build and push, one invocation per variant

mod login;
mod publish;

pub use login::{RegistryCredentials, PASSWORD_VAR, USERNAME_VAR};
pub use publish::{publish_request, publish_variant, PublishedImage};

use crate::error::{PublishError, Result};
use crate::runner::{CommandRequest, CommandRunner};
use std::time::Duration;

/// Timeout for the daemon availability check. A healthy daemon answers
/// `docker info` immediately; anything slower means it is not responding.
pub const DOCKER_INFO_TIMEOUT: Duration = Duration::from_secs(5);

/// Checks that Docker is installed and the daemon is responding.
pub async fn check_docker_available(runner: &dyn CommandRunner) -> Result<()> {
    let request = CommandRequest::new("docker").arg("info");

    let outcome = tokio::time::timeout(DOCKER_INFO_TIMEOUT, runner.run(request)).await;
    match outcome {
        Err(_) => Err(PublishError::DaemonUnavailable {
            reason: format!(
                "daemon check timed out after {} seconds; if Docker is running, check `docker ps`",
                DOCKER_INFO_TIMEOUT.as_secs()
            ),
        }
        .into()),
        Ok(Err(e)) => Err(PublishError::DaemonUnavailable {
            reason: format!("docker command not found: {e}"),
        }
        .into()),
        Ok(Ok(output)) if output.success => Ok(()),
        Ok(Ok(output)) => Err(PublishError::DaemonUnavailable {
            reason: format!(
                "daemon is not responding (exit code {:?}): {}",
                output.code,
                output.stderr.trim()
            ),
        }
        .into()),
    }
}

/// Checks that the buildx plugin is installed.
///
/// Multi-arch assembly is impossible without it, so this runs before any
/// variant consumes compute.
pub async fn check_buildx_available(runner: &dyn CommandRunner) -> Result<()> {
    let request = CommandRequest::new("docker").args(["buildx", "version"]);

    let output = runner.run(request).await.map_err(|e| PublishError::BuildxUnavailable {
        reason: e.to_string(),
    })?;

    if output.success {
        Ok(())
    } else {
        Err(PublishError::BuildxUnavailable {
            reason: format!(
                "`docker buildx version` exited with code {:?}: {}",
                output.code,
                output.stderr.trim()
            ),
        }
        .into())
    }
}
