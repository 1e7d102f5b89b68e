//! Command line argument parsing.
//!
//! The trigger surface is deliberately small: one required tag, everything
//! else defaulted from the CI environment. Registry credentials are not
//! arguments; they are read from the environment by the login step so they
//! can never leak through argv or shell history.

use crate::compile::CompileOptions;
use crate::error::ConfigurationError;
use crate::invocation::Invocation;
use crate::orchestrator::RunOptions;
use clap::Parser;
use std::path::PathBuf;

/// Build and publish Lodestone community container images
#[derive(Parser, Debug)]
#[command(
    name = "lodestone_release",
    version,
    about = "Build and publish Lodestone community container images",
    long_about = "Cross-compile every catalog variant for the full platform set, stage the
binaries into the image build layout, and push one multi-arch community
image per variant.

Usage:
  lodestone_release v1.2.3
  lodestone_release nightly --skip-push
  GITHUB_REPOSITORY=lodestone-db/lodestone GITHUB_REF_NAME=main lodestone_release v1.2.3"
)]
pub struct Args {
    /// Release tag, interpolated into every published image reference
    #[arg(index = 1, value_name = "TAG")]
    pub tag: String,

    /// Repository identity (owner/name) of the triggering checkout
    #[arg(long, env = "GITHUB_REPOSITORY", value_name = "OWNER/NAME")]
    pub repository: Option<String>,

    /// Branch the run was triggered from
    #[arg(long, env = "GITHUB_REF_NAME", value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Source commit embedded into images as provenance
    #[arg(long, env = "GITHUB_SHA", value_name = "SHA")]
    pub commit: Option<String>,

    /// Product checkout the toolchain builds from
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub checkout: PathBuf,

    /// Registry namespace images are tagged under
    #[arg(long, default_value = "lodestonedb", value_name = "NAMESPACE")]
    pub registry: String,

    /// Build multi-arch images without pushing them (skips registry login)
    #[arg(long)]
    pub skip_push: bool,

    /// Enable the shared compiler cache wrapper
    #[arg(long, env = "LODESTONE_BUILD_CACHE")]
    pub build_cache: bool,

    /// Compiler wrapper exported as RUSTC_WRAPPER while the cache is enabled
    #[arg(long, env = "RUSTC_WRAPPER", default_value = "sccache", value_name = "BIN")]
    pub rustc_wrapper: String,

    /// Suppress progress output
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Assemble the immutable invocation for this run
    pub fn invocation(&self) -> Result<Invocation, ConfigurationError> {
        Invocation::new(
            self.tag.clone(),
            self.commit.clone(),
            self.repository.clone(),
            self.branch.clone(),
        )
    }

    /// Advisory compile configuration from flags and environment
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            wrapper: self.build_cache.then(|| self.rustc_wrapper.clone()),
        }
    }

    /// Run-wide settings handed to the orchestrator
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            checkout: self.checkout.clone(),
            registry: self.registry.clone(),
            push: !self.skip_push,
            compile: self.compile_options(),
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(quiet),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print message
    pub fn println(&self, message: &str) {
        self.output.println(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        self.output.success(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        self.output.warn(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print a progress message
    pub fn progress(&self, message: &str) {
        self.output.progress(message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        self.output.section(title);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        self.output.indent(message);
    }
}
