//! Error types for lodestone_release operations.
//!
//! Every failure is variant-local unless stated otherwise: the matrix
//! orchestrator collects one outcome per image variant and a failed variant
//! never cancels its siblings. Registry authentication failure is the
//! exception and aborts the run before any variant starts.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for lodestone_release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all lodestone_release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Catalog or invocation configuration errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Cross-compilation errors
    #[error("Toolchain error: {0}")]
    Toolchain(#[from] ToolchainError),

    /// Artifact staging errors
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Image build or push errors
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Registry authentication failed. Aborts the whole run.
    #[error("Registry authentication failed: {reason}")]
    Auth {
        /// Reason for the error
        reason: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Catalog and invocation configuration errors
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Release tag was empty
    #[error("Release tag must be a non-empty string")]
    EmptyTag,

    /// No source commit available for provenance
    #[error(
        "No source commit available for image provenance. \
         Pass --commit or set GITHUB_SHA."
    )]
    MissingSourceCommit,

    /// Registry credential environment variable missing
    #[error("Registry credential environment variable '{variable}' is not set")]
    MissingCredential {
        /// Environment variable name
        variable: String,
    },

    /// Variant declares no buildable packages
    #[error("Variant '{variant}' declares no build packages")]
    EmptyPackageSet {
        /// Variant name
        variant: String,
    },

    /// Variant declares no binaries
    #[error("Variant '{variant}' declares no binaries")]
    EmptyBinarySet {
        /// Variant name
        variant: String,
    },

    /// Variant's image descriptor does not exist in the checkout
    #[error("Image descriptor for variant '{variant}' not found at {path}")]
    DescriptorMissing {
        /// Variant name
        variant: String,
        /// Expected descriptor path
        path: PathBuf,
    },

    /// Required tool is not installed
    #[error("Required tool '{tool}' not found on PATH: {reason}")]
    ToolNotFound {
        /// Tool binary name
        tool: String,
        /// Lookup failure detail
        reason: String,
    },
}

/// Cross-compilation errors
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// Compiler could not be spawned
    #[error("Failed to invoke the toolchain for target '{triple}': {reason}")]
    Spawn {
        /// Target triple being built
        triple: String,
        /// Spawn failure detail
        reason: String,
    },

    /// Compiler exited non-zero
    #[error("Toolchain build for target '{triple}' failed (exit code {code:?})")]
    BuildFailed {
        /// Target triple being built
        triple: String,
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Captured compiler diagnostics
        stderr: String,
    },
}

/// Artifact staging errors
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Toolchain reported success but the binary is absent
    #[error("Binary '{binary}' missing after a successful build, expected at {path}")]
    Missing {
        /// Binary name
        binary: String,
        /// Expected toolchain output path
        path: PathBuf,
    },

    /// Produced binary is zero bytes
    #[error("Binary '{binary}' at {path} is empty (0 bytes), indicating an incomplete build")]
    Empty {
        /// Binary name
        binary: String,
        /// Toolchain output path
        path: PathBuf,
    },

    /// Relocation into the staging layout failed
    #[error("Failed to stage '{binary}' to {dest}: {reason}")]
    Relocate {
        /// Binary name
        binary: String,
        /// Staging destination
        dest: PathBuf,
        /// Filesystem failure detail
        reason: String,
    },
}

/// Image build or push errors
#[derive(Error, Debug)]
pub enum PublishError {
    /// Docker daemon is not installed or not responding
    #[error("Docker is unavailable: {reason}")]
    DaemonUnavailable {
        /// Availability check detail
        reason: String,
    },

    /// buildx plugin is missing
    #[error("docker buildx is unavailable: {reason}")]
    BuildxUnavailable {
        /// Availability check detail
        reason: String,
    },

    /// Image build backend could not be spawned
    #[error("Failed to invoke the image build backend for variant '{variant}': {reason}")]
    Spawn {
        /// Variant name
        variant: String,
        /// Spawn failure detail
        reason: String,
    },

    /// Multi-arch build or push exited non-zero
    #[error("Image build for variant '{variant}' failed (exit code {code:?})")]
    Backend {
        /// Variant name
        variant: String,
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Captured backend diagnostics
        stderr: String,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Auth { .. } => vec![
                "Verify REGISTRY_USERNAME and REGISTRY_PASSWORD are set".to_string(),
                "Confirm the token has push access to the registry namespace".to_string(),
            ],
            ReleaseError::Publish(PublishError::DaemonUnavailable { .. }) => vec![
                "Start the Docker daemon: sudo systemctl start docker".to_string(),
                "Check daemon health: docker info".to_string(),
            ],
            ReleaseError::Publish(PublishError::BuildxUnavailable { .. }) => vec![
                "Install the buildx plugin: https://docs.docker.com/build/install-buildx/"
                    .to_string(),
                "Register emulation for foreign platforms: docker run --privileged --rm tonistiigi/binfmt --install all"
                    .to_string(),
            ],
            ReleaseError::Configuration(ConfigurationError::MissingSourceCommit) => vec![
                "Pass --commit <sha> explicitly".to_string(),
                "Under CI, GITHUB_SHA is exported automatically".to_string(),
            ],
            ReleaseError::Toolchain(ToolchainError::BuildFailed { triple, .. }) => vec![
                format!("Confirm the target is installed: rustup target add {triple}"),
                "Cross builds need the foreign linker from the catalog on PATH".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error aborts the whole run rather than a single variant
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, ReleaseError::Auth { .. })
    }
}
