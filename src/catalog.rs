//! Static catalog of image variants and cross-compilation targets.
//!
//! The variant table is the single source of truth for what a release run
//! produces: which packages are compiled, which binaries are staged, and
//! which descriptor the image build backend consumes. Adding a variant means
//! adding a row, not a branch.

use crate::error::ConfigurationError;
use std::path::Path;

/// A CPU architecture the release is cross-compiled for.
///
/// Exactly two targets exist: one native to the release host and one foreign
/// built through the catalog's linker. Both feed a single multi-arch image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetArch {
    /// Toolchain target triple
    pub triple: &'static str,
    /// Architecture label used by the image backend ("amd64", "arm64")
    pub platform: &'static str,
    /// Linker binary for cross builds, when the host cannot link natively
    pub linker: Option<&'static str>,
}

impl TargetArch {
    /// Whether this target matches the execution host's architecture.
    ///
    /// Runtime detection, so the same catalog works when the release host
    /// itself is arm64.
    pub fn is_native(&self) -> bool {
        self.triple.starts_with(std::env::consts::ARCH)
    }

    /// Cargo environment variable selecting the linker for this triple,
    /// e.g. `CARGO_TARGET_AARCH64_UNKNOWN_LINUX_GNU_LINKER`.
    pub fn linker_env_var(&self) -> String {
        format!(
            "CARGO_TARGET_{}_LINKER",
            self.triple.to_uppercase().replace('-', "_")
        )
    }

    /// Image backend platform reference, e.g. `linux/arm64`
    pub fn platform_ref(&self) -> String {
        format!("linux/{}", self.platform)
    }

    /// Staging subdirectory for this architecture, relative to the variant's
    /// staging root. The image descriptors expect binaries at exactly
    /// `linux/<platform>/<binary>`.
    pub fn output_dir(&self) -> String {
        format!("linux/{}", self.platform)
    }
}

/// One buildable image variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageVariant {
    /// Variant name, also the image repository name under the registry
    pub name: &'static str,
    /// Workspace packages compiled for this variant, in order
    pub packages: &'static [&'static str],
    /// Binaries produced and staged for this variant, in order
    pub binaries: &'static [&'static str],
    /// Image descriptor path, relative to the product checkout
    pub descriptor: &'static str,
}

impl ImageVariant {
    /// Destination image reference: `<registry>/<name>:community-<tag>`
    pub fn image_tag(&self, registry: &str, tag: &str) -> String {
        format!("{registry}/{}:community-{tag}", self.name)
    }

    /// Validate this catalog row against a product checkout.
    ///
    /// The variant-to-command mapping must be total: a row with nothing to
    /// build or without its descriptor is a configuration error, fatal to
    /// this variant only.
    pub fn validate(&self, checkout: &Path) -> Result<(), ConfigurationError> {
        if self.packages.is_empty() {
            return Err(ConfigurationError::EmptyPackageSet {
                variant: self.name.to_string(),
            });
        }
        if self.binaries.is_empty() {
            return Err(ConfigurationError::EmptyBinarySet {
                variant: self.name.to_string(),
            });
        }
        let descriptor = checkout.join(self.descriptor);
        if !descriptor.is_file() {
            return Err(ConfigurationError::DescriptorMissing {
                variant: self.name.to_string(),
                path: descriptor,
            });
        }
        Ok(())
    }
}

/// Both cross-compilation targets, native first.
pub static TARGETS: [TargetArch; 2] = [
    TargetArch {
        triple: "x86_64-unknown-linux-gnu",
        platform: "amd64",
        linker: None,
    },
    TargetArch {
        triple: "aarch64-unknown-linux-gnu",
        platform: "arm64",
        linker: Some("aarch64-linux-gnu-gcc"),
    },
];

/// Every image variant a release run produces.
pub static CATALOG: [ImageVariant; 2] = [
    ImageVariant {
        name: "lodestone",
        packages: &["server", "client"],
        binaries: &["lodestone", "lodestone-cli"],
        descriptor: "docker/Dockerfile",
    },
    ImageVariant {
        name: "lodestone-meta",
        packages: &["meta"],
        binaries: &["lodestone-meta"],
        descriptor: "docker/Dockerfile_meta",
    },
];

/// Comma-joined platform set for a single multi-arch image build,
/// e.g. `linux/amd64,linux/arm64`.
pub fn platform_set() -> String {
    TARGETS
        .iter()
        .map(TargetArch::platform_ref)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_mapping_is_total() {
        for variant in &CATALOG {
            assert!(!variant.packages.is_empty(), "{} has no packages", variant.name);
            assert!(!variant.binaries.is_empty(), "{} has no binaries", variant.name);
            assert!(!variant.descriptor.is_empty(), "{} has no descriptor", variant.name);
        }
    }

    #[test]
    fn variant_names_are_unique() {
        let mut names: Vec<_> = CATALOG.iter().map(|v| v.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn exactly_one_foreign_target() {
        let foreign = TARGETS.iter().filter(|t| t.linker.is_some()).count();
        assert_eq!(foreign, 1);
    }

    #[test]
    fn image_tag_interpolates_community_prefix() {
        let variant = &CATALOG[0];
        assert_eq!(
            variant.image_tag("lodestonedb", "v1.2.3"),
            "lodestonedb/lodestone:community-v1.2.3"
        );
        assert_eq!(
            variant.image_tag("lodestonedb", "nightly"),
            "lodestonedb/lodestone:community-nightly"
        );
    }

    #[test]
    fn linker_env_var_uppercases_triple() {
        assert_eq!(
            TARGETS[1].linker_env_var(),
            "CARGO_TARGET_AARCH64_UNKNOWN_LINUX_GNU_LINKER"
        );
    }

    #[test]
    fn platform_set_covers_both_targets_in_one_reference() {
        assert_eq!(platform_set(), "linux/amd64,linux/arm64");
    }

    #[test]
    fn validate_rejects_missing_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let err = CATALOG[0].validate(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::DescriptorMissing { .. }
        ));
    }

    #[test]
    fn validate_accepts_complete_checkout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("docker")).unwrap();
        for variant in &CATALOG {
            std::fs::write(dir.path().join(variant.descriptor), "FROM scratch\n").unwrap();
        }
        for variant in &CATALOG {
            variant.validate(dir.path()).unwrap();
        }
    }
}
