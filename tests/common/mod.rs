//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_config(manifests::TWO_COOKBOOKS)
//!         .with_file("extra.json", r#"{"a": 1}"#);
//!     fixture.command().arg("check").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::TestFixture;
}

/// Manifest snippets shared between test files.
#[allow(dead_code)]
pub mod manifests {
    /// Two cookbooks filling disjoint keys of one parent.
    pub const TWO_COOKBOOKS: &str = r#"
run_list:
  - recipe[nginx::default]
  - recipe[app]
cookbooks:
  nginx:
    attributes:
      web:
        port: 80
  app:
    attributes:
      web:
        root: /srv/app
"#;

    /// Two cookbooks setting the same leaf to different values.
    pub const CONFLICTING: &str = r#"
cookbooks:
  nginx:
    attributes:
      web: { port: 80 }
  proxy:
    attributes:
      web: { port: 8080 }
"#;

    /// Misspelled top-level and cookbook options.
    pub const INVALID: &str = r#"
run_lst:
  - recipe[nginx]
cookbooks:
  nginx:
    atributes:
      web: { port: 80 }
"#;

    /// Broken YAML for syntax error testing.
    pub const INVALID_YAML: &str = "cookbooks:\n  nginx: [unclosed\n";
}

/// A temporary directory with an optional `.attr-merge.yaml` manifest and
/// attribute files.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `.attr-merge.yaml` manifest with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file(".attr-merge.yaml", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    #[allow(dead_code)]
    pub fn config_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join(".attr-merge.yaml")
    }

    /// Create a command running in this fixture's directory.
    ///
    /// `ATTR_MERGE_CONFIG` and `RUST_LOG` are cleared so the caller's
    /// environment cannot leak into the run.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("attr-merge");
        cmd.current_dir(self.path())
            .env_remove("ATTR_MERGE_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_config() {
        let fixture = TestFixture::new().with_config("cookbooks: {}");
        assert!(fixture.config_path().exists());
    }

    #[test]
    fn test_fixture_with_nested_file() {
        let fixture = TestFixture::new().with_file("attrs/web.json", "{}");
        assert!(fixture.path().join("attrs/web.json").exists());
    }

    #[test]
    fn test_manifests_are_valid_yaml() {
        for manifest in [
            manifests::TWO_COOKBOOKS,
            manifests::CONFLICTING,
            manifests::INVALID,
        ] {
            serde_yaml::from_str::<serde_yaml::Value>(manifest).expect("Manifest should be valid YAML");
        }
        assert!(serde_yaml::from_str::<serde_yaml::Value>(manifests::INVALID_YAML).is_err());
    }
}
