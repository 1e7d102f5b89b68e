//! # Lodestone Release
//!
//! Build-and-publish orchestrator for Lodestone community container images.
//!
//! Given a release tag, this crate cross-compiles every catalog variant for
//! the full platform set, relocates the binaries into the layout the image
//! descriptors consume, and pushes one multi-arch community image per
//! variant. Runs invoked outside the canonical repository and branch are
//! skipped before any work happens.
//!
//! ## Pipeline
//!
//! 1. The gate authorizes the invocation context or skips the whole run.
//! 2. Registry login runs once, before any variant consumes compute.
//! 3. Each variant runs an independent pipeline: compile both
//!    architectures, stage into `linux/<platform>/<binary>`, publish a
//!    single manifest list covering both platforms.
//! 4. Outcomes are collected for every variant; one failure never cancels
//!    or hides the others.
//!
//! ## Usage
//!
//! ```bash
//! lodestone_release v1.2.3            # build and push community-v1.2.3
//! lodestone_release nightly --skip-push
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod catalog;
pub mod cli;
pub mod compile;
pub mod docker;
pub mod error;
pub mod gate;
pub mod invocation;
pub mod orchestrator;
pub mod report;
pub mod runner;
pub mod stage;

// Re-export main types for public API
pub use catalog::{ImageVariant, TargetArch, CATALOG, TARGETS};
pub use compile::{BuildArtifact, CompileOptions};
pub use docker::{PublishedImage, RegistryCredentials};
pub use error::{ReleaseError, Result};
pub use gate::GateDecision;
pub use invocation::Invocation;
pub use orchestrator::RunOptions;
pub use report::{RunReport, VariantOutcome, VariantPhase};
pub use runner::{CommandOutput, CommandRequest, CommandRunner, ProcessRunner};
pub use stage::StagedArtifact;
