//! End-to-end matrix tests against a recording command runner.
//!
//! The fake runner stands in for the toolchain and the image backend: it
//! records every invocation, materializes the binaries a successful cargo
//! build would leave behind, and fails on demand so variant isolation can
//! be observed without real toolchains or registries.

use async_trait::async_trait;
use lodestone_release::{
    orchestrator, CommandOutput, CommandRequest, CommandRunner, CompileOptions, Invocation,
    RunOptions, VariantPhase, CATALOG, TARGETS,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

type FailurePredicate = Box<dyn Fn(&CommandRequest) -> bool + Send + Sync>;

/// Records every request; simulates cargo by writing the requested binaries.
struct RecordingRunner {
    checkout: PathBuf,
    calls: Mutex<Vec<CommandRequest>>,
    fail_when: Option<FailurePredicate>,
    /// Binaries the fake toolchain "forgets" to produce despite exit 0
    withhold: Vec<String>,
}

impl RecordingRunner {
    fn new(checkout: &Path) -> Self {
        Self {
            checkout: checkout.to_path_buf(),
            calls: Mutex::new(Vec::new()),
            fail_when: None,
            withhold: Vec::new(),
        }
    }

    fn failing_when(mut self, predicate: impl Fn(&CommandRequest) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    fn withholding(mut self, binary: &str) -> Self {
        self.withhold.push(binary.to_string());
        self
    }

    fn calls(&self) -> Vec<CommandRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn buildx_calls(&self) -> Vec<CommandRequest> {
        self.calls()
            .into_iter()
            .filter(|call| call.program == "docker" && call.args.first().map(String::as_str) == Some("buildx"))
            .collect()
    }

    fn materialize_binaries(&self, request: &CommandRequest) -> std::io::Result<()> {
        let triple = value_after(&request.args, "--target").expect("cargo build without --target");
        let release_dir = self.checkout.join("target").join(triple).join("release");
        std::fs::create_dir_all(&release_dir)?;
        for binary in values_after(&request.args, "--bin") {
            if self.withhold.contains(&binary) {
                continue;
            }
            std::fs::write(release_dir.join(&binary), b"\x7fELF")?;
        }
        Ok(())
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, request: CommandRequest) -> std::io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(request.clone());

        if let Some(fail) = &self.fail_when
            && fail(&request)
        {
            return Ok(CommandOutput {
                success: false,
                code: Some(101),
                stdout: String::new(),
                stderr: "simulated failure".to_string(),
            });
        }

        if request.program == "cargo" && request.args.first().map(String::as_str) == Some("build") {
            self.materialize_binaries(&request)?;
        }

        Ok(CommandOutput {
            success: true,
            code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

fn value_after(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
        .cloned()
}

fn values_after(args: &[String], flag: &str) -> Vec<String> {
    args.iter()
        .zip(args.iter().skip(1))
        .filter(|(first, _)| *first == flag)
        .map(|(_, value)| value.clone())
        .collect()
}

/// Product checkout with every catalog descriptor present.
fn checkout_fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("docker")).unwrap();
    for variant in &CATALOG {
        std::fs::write(
            dir.path().join(variant.descriptor),
            "FROM scratch\nARG git_hash\nCOPY linux/ /\n",
        )
        .unwrap();
    }
    dir
}

fn invocation(tag: &str) -> Arc<Invocation> {
    Arc::new(
        Invocation::new(
            tag.to_string(),
            Some("0a1b2c3d4e5f".to_string()),
            Some("lodestone-db/lodestone".to_string()),
            Some("main".to_string()),
        )
        .unwrap(),
    )
}

fn options(checkout: &Path, push: bool) -> Arc<RunOptions> {
    Arc::new(RunOptions {
        checkout: checkout.to_path_buf(),
        registry: "lodestonedb".to_string(),
        push,
        compile: CompileOptions::default(),
    })
}

#[tokio::test]
async fn full_run_publishes_every_variant() {
    let checkout = checkout_fixture();
    let runner = Arc::new(RecordingRunner::new(checkout.path()));
    let dyn_runner: Arc<dyn CommandRunner> = runner.clone();

    let report = orchestrator::run(dyn_runner, invocation("v1.2.3"), options(checkout.path(), true)).await;

    assert!(report.all_succeeded());
    assert_eq!(report.variants.len(), CATALOG.len());
    for (outcome, variant) in report.variants.iter().zip(CATALOG.iter()) {
        assert_eq!(outcome.variant, variant.name);
        assert_eq!(outcome.phase, VariantPhase::Done);
        assert_eq!(
            outcome.image.as_deref(),
            Some(format!("lodestonedb/{}:community-v1.2.3", variant.name).as_str())
        );
    }

    // Exactly one staged binary per (variant, architecture) pair, at the
    // layout the descriptors consume.
    for variant in &CATALOG {
        for target in &TARGETS {
            for binary in variant.binaries {
                let staged = checkout
                    .path()
                    .join("target")
                    .join("image-staging")
                    .join(variant.name)
                    .join("linux")
                    .join(target.platform)
                    .join(binary);
                assert!(staged.is_file(), "missing staged artifact {}", staged.display());
            }
        }
    }

    // Two toolchain invocations per variant, one per architecture.
    let cargo_calls: Vec<_> = runner
        .calls()
        .into_iter()
        .filter(|call| call.program == "cargo")
        .collect();
    assert_eq!(cargo_calls.len(), CATALOG.len() * TARGETS.len());

    // One multi-arch image build per variant, never one per architecture.
    let buildx_calls = runner.buildx_calls();
    assert_eq!(buildx_calls.len(), CATALOG.len());
    for call in &buildx_calls {
        assert_eq!(
            values_after(&call.args, "--platform"),
            vec!["linux/amd64,linux/arm64".to_string()]
        );
        assert!(call.args.iter().any(|arg| arg == "--push"));
        assert!(call
            .args
            .iter()
            .any(|arg| arg == "git_hash=0a1b2c3d4e5f"));
    }

    // Disjoint image tags across variants.
    let mut tags: Vec<_> = buildx_calls
        .iter()
        .filter_map(|call| value_after(&call.args, "-t"))
        .collect();
    tags.sort();
    tags.dedup();
    assert_eq!(tags.len(), CATALOG.len());
}

#[tokio::test]
async fn toolchain_failure_stays_local_to_the_variant() {
    let checkout = checkout_fixture();
    let runner = Arc::new(
        RecordingRunner::new(checkout.path()).failing_when(|request| {
            request.program == "cargo" && request.args.iter().any(|arg| arg == "meta")
        }),
    );
    let dyn_runner: Arc<dyn CommandRunner> = runner.clone();

    let report = orchestrator::run(dyn_runner, invocation("v1.2.3"), options(checkout.path(), true)).await;

    assert!(!report.all_succeeded());
    let lodestone = &report.variants[0];
    let meta = &report.variants[1];

    assert_eq!(lodestone.phase, VariantPhase::Done);
    assert_eq!(meta.phase, VariantPhase::Failed);
    assert!(meta.error.as_deref().unwrap().contains("aarch64") || meta.error.as_deref().unwrap().contains("x86_64"));

    // The failed variant staged nothing and published nothing.
    assert!(!checkout
        .path()
        .join("target")
        .join("image-staging")
        .join("lodestone-meta")
        .exists());
    let buildx_tags: Vec<_> = runner
        .buildx_calls()
        .iter()
        .filter_map(|call| value_after(&call.args, "-t"))
        .collect();
    assert_eq!(buildx_tags, vec!["lodestonedb/lodestone:community-v1.2.3".to_string()]);
}

#[tokio::test]
async fn missing_binary_aborts_before_publish() {
    let checkout = checkout_fixture();
    let runner = Arc::new(RecordingRunner::new(checkout.path()).withholding("lodestone-cli"));
    let dyn_runner: Arc<dyn CommandRunner> = runner.clone();

    let report = orchestrator::run(dyn_runner, invocation("v1.2.3"), options(checkout.path(), true)).await;

    let lodestone = &report.variants[0];
    assert_eq!(lodestone.phase, VariantPhase::Failed);
    assert!(lodestone.error.as_deref().unwrap().contains("lodestone-cli"));

    // Sibling variant is unaffected.
    assert_eq!(report.variants[1].phase, VariantPhase::Done);

    // The toolchain lied about success; no image build may run for the
    // broken variant.
    assert!(!runner
        .buildx_calls()
        .iter()
        .any(|call| value_after(&call.args, "-t")
            .is_some_and(|tag| tag.contains("/lodestone:"))));
}

#[tokio::test]
async fn publish_failure_is_variant_local() {
    let checkout = checkout_fixture();
    let runner = Arc::new(
        RecordingRunner::new(checkout.path()).failing_when(|request| {
            request.program == "docker"
                && request
                    .args
                    .iter()
                    .any(|arg| arg.contains("lodestone-meta:community-"))
        }),
    );
    let dyn_runner: Arc<dyn CommandRunner> = runner.clone();

    let report = orchestrator::run(dyn_runner, invocation("nightly"), options(checkout.path(), true)).await;

    assert_eq!(report.variants[0].phase, VariantPhase::Done);
    assert_eq!(report.variants[1].phase, VariantPhase::Failed);
    assert!(report.variants[1]
        .error
        .as_deref()
        .unwrap()
        .contains("lodestone-meta"));
}

#[tokio::test]
async fn skip_push_builds_without_pushing() {
    let checkout = checkout_fixture();
    let runner = Arc::new(RecordingRunner::new(checkout.path()));
    let dyn_runner: Arc<dyn CommandRunner> = runner.clone();

    let report = orchestrator::run(dyn_runner, invocation("rc1"), options(checkout.path(), false)).await;

    assert!(report.all_succeeded());
    let buildx_calls = runner.buildx_calls();
    assert_eq!(buildx_calls.len(), CATALOG.len());
    for call in &buildx_calls {
        assert!(!call.args.iter().any(|arg| arg == "--push"));
    }
}

#[tokio::test]
async fn missing_descriptor_fails_only_that_variant() {
    let checkout = checkout_fixture();
    std::fs::remove_file(checkout.path().join(CATALOG[1].descriptor)).unwrap();
    let runner = Arc::new(RecordingRunner::new(checkout.path()));
    let dyn_runner: Arc<dyn CommandRunner> = runner.clone();

    let report = orchestrator::run(dyn_runner, invocation("v1.2.3"), options(checkout.path(), true)).await;

    assert_eq!(report.variants[0].phase, VariantPhase::Done);
    assert_eq!(report.variants[1].phase, VariantPhase::Failed);
    assert!(report.variants[1]
        .error
        .as_deref()
        .unwrap()
        .contains("descriptor"));

    // The misconfigured variant never reached the toolchain.
    assert!(!runner
        .calls()
        .iter()
        .any(|call| call.program == "cargo" && call.args.iter().any(|arg| arg == "meta")));
}
