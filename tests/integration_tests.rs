//! Integration tests for brt
//!
//! These tests drive the binary end to end against temporary firmware
//! trees.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a brt Command
fn brt() -> Command {
    cargo_bin_cmd!("brt")
}

/// Helper to create a temporary tree directory
fn create_temp_tree() -> TempDir {
    TempDir::new().unwrap()
}

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Seed a package directory with an empty makefile.
fn seed_package(root: &Path, name: &str) {
    write_file(
        root,
        &format!("package/{name}/{name}.mk"),
        &format!("{}_VERSION = 1\n", name.to_uppercase()),
    );
}

/// Install a fake `make` that prints a canned database, plus a brt.toml
/// pointing at it and at a cache directory inside the tree.
fn install_fake_make(root: &Path, db: &str) {
    write_file(root, "fake_make.sh", &format!("#!/bin/sh\ncat <<'DB'\n{db}\nDB\n"));
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(
            root.join("fake_make.sh"),
            fs::Permissions::from_mode(0o755),
        )
        .unwrap();
    }
    fs::create_dir_all(root.join("build_tmp")).unwrap();
    write_file(
        root,
        "brt.toml",
        &format!(
            "[tree]\nmake_program = \"{}\"\n\n[cache]\ndir = \"{}\"\n",
            root.join("fake_make.sh").display(),
            root.join("build_tmp").display()
        ),
    );
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_brt_help() {
        brt().arg("--help").assert().success();
    }

    #[test]
    fn test_brt_version() {
        brt().arg("--version").assert().success();
    }

    #[test]
    fn test_changed_targets_help_mentions_since() {
        brt()
            .args(["changed-targets", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--since"));
    }
}

// =============================================================================
// Changed-targets Tests
// =============================================================================

mod changed_targets {
    use super::*;

    #[test]
    fn test_all_prints_topological_rebuild_targets() {
        let dir = create_temp_tree();
        seed_package(dir.path(), "app");
        seed_package(dir.path(), "libsbp");
        install_fake_make(dir.path(), "APP_DEPENDENCIES = libsbp");

        brt()
            .current_dir(dir.path())
            .args(["changed-targets", "--all"])
            .assert()
            .success()
            .stdout("libsbp-rebuild\napp-rebuild\n");
    }

    #[test]
    fn test_scrape_failure_is_reported() {
        let dir = create_temp_tree();
        seed_package(dir.path(), "libsbp");
        // A make program that always fails.
        write_file(dir.path(), "fake_make.sh", "#!/bin/sh\necho boom >&2\nexit 2\n");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(
                dir.path().join("fake_make.sh"),
                fs::Permissions::from_mode(0o755),
            )
            .unwrap();
        }
        fs::create_dir_all(dir.path().join("build_tmp")).unwrap();
        write_file(
            dir.path(),
            "brt.toml",
            &format!(
                "[tree]\nmake_program = \"{}\"\n\n[cache]\ndir = \"{}\"\n",
                dir.path().join("fake_make.sh").display(),
                dir.path().join("build_tmp").display()
            ),
        );

        brt()
            .current_dir(dir.path())
            .args(["changed-targets", "--all"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("boom"));
    }

    #[test]
    fn test_missing_cache_dir_config_is_reported() {
        let dir = create_temp_tree();
        seed_package(dir.path(), "libsbp");

        brt()
            .current_dir(dir.path())
            .env_remove("BUILD_TEMP")
            .args(["changed-targets", "--all"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("BUILD_TEMP"));
    }
}

// =============================================================================
// Cache Tests
// =============================================================================

mod cache {
    use super::*;

    #[test]
    fn test_cache_status_absent_then_present() {
        let dir = create_temp_tree();
        seed_package(dir.path(), "libsbp");
        install_fake_make(dir.path(), "");

        brt()
            .current_dir(dir.path())
            .args(["cache", "status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("absent"));

        brt()
            .current_dir(dir.path())
            .args(["changed-targets", "--all"])
            .assert()
            .success();

        brt()
            .current_dir(dir.path())
            .args(["cache", "status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("present"));
    }

    #[test]
    fn test_cache_clear_removes_files() {
        let dir = create_temp_tree();
        seed_package(dir.path(), "libsbp");
        install_fake_make(dir.path(), "");

        brt()
            .current_dir(dir.path())
            .args(["changed-targets", "--all"])
            .assert()
            .success();

        brt()
            .current_dir(dir.path())
            .args(["cache", "clear"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 1 cache file(s)"));

        brt()
            .current_dir(dir.path())
            .args(["cache", "status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("absent"));
    }
}

// =============================================================================
// Manifest Tests
// =============================================================================

mod manifests {
    use super::*;

    const ARTIFACTS: &str = r#"
artifact_sets:
  - artifact_set:
      name: firmware
      artifacts:
        - name: rtos-image
          s3_bucket: fw-releases
          s3_repository: rtos
          version: v2.3.1
          s3_object: "{name}-{version}.bin"
"#;

    const VARIANTS: &str = r#"
variants:
  - variant:
      variant_name: release
      image: "firmware-{variant_name}.img"
  - variant:
      variant_name: debug
      image: "firmware-{variant_name}.img"
"#;

    #[test]
    fn test_artifacts_list_sets_and_contents() {
        let dir = create_temp_tree();
        write_file(dir.path(), "external-artifacts.yaml", ARTIFACTS);

        brt()
            .current_dir(dir.path())
            .args(["artifacts", "list"])
            .assert()
            .success()
            .stdout("firmware\n");

        brt()
            .current_dir(dir.path())
            .args(["artifacts", "list", "firmware"])
            .assert()
            .success()
            .stdout("rtos-image\n");
    }

    #[test]
    fn test_artifacts_url() {
        let dir = create_temp_tree();
        write_file(dir.path(), "external-artifacts.yaml", ARTIFACTS);

        brt()
            .current_dir(dir.path())
            .args(["artifacts", "url", "firmware", "rtos-image"])
            .assert()
            .success()
            .stdout("s3://fw-releases/rtos/v2.3.1/rtos-image-v2.3.1.bin\n");
    }

    #[test]
    fn test_artifacts_unknown_set_fails() {
        let dir = create_temp_tree();
        write_file(dir.path(), "external-artifacts.yaml", ARTIFACTS);

        brt()
            .current_dir(dir.path())
            .args(["artifacts", "list", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Artifact set not found"));
    }

    #[test]
    fn test_variants_list_one_name_per_line() {
        let dir = create_temp_tree();
        write_file(dir.path(), "build-variants.yaml", VARIANTS);

        brt()
            .current_dir(dir.path())
            .args(["variants", "list"])
            .assert()
            .success()
            .stdout("release\ndebug\n");
    }

    #[test]
    fn test_variants_show_resolves_placeholders() {
        let dir = create_temp_tree();
        write_file(dir.path(), "build-variants.yaml", VARIANTS);

        brt()
            .current_dir(dir.path())
            .args(["variants", "show", "release"])
            .assert()
            .success()
            .stdout(predicate::str::contains("image = firmware-release.img"));
    }
}

// =============================================================================
// Hash Tests
// =============================================================================

mod hash {
    use super::*;

    #[test]
    fn test_hash_prints_digest() {
        let dir = create_temp_tree();
        write_file(dir.path(), "image.cfg", "");

        brt()
            .args(["hash", dir.path().join("image.cfg").to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            ));
    }

    #[test]
    fn test_hash_store_then_verify() {
        let dir = create_temp_tree();
        write_file(dir.path(), "image.cfg", "configured");
        let file = dir.path().join("image.cfg");

        brt()
            .args(["hash", file.to_str().unwrap(), "--store"])
            .assert()
            .success();

        brt()
            .args(["hash", file.to_str().unwrap(), "--verify"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ok"));
    }

    #[test]
    fn test_hash_verify_detects_edit() {
        let dir = create_temp_tree();
        write_file(dir.path(), "image.cfg", "v1");
        let file = dir.path().join("image.cfg");

        brt()
            .args(["hash", file.to_str().unwrap(), "--store"])
            .assert()
            .success();

        write_file(dir.path(), "image.cfg", "v2");

        brt()
            .args(["hash", file.to_str().unwrap(), "--verify"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Hash mismatch"));
    }

    #[test]
    fn test_hash_verify_without_sidecar_fails() {
        let dir = create_temp_tree();
        write_file(dir.path(), "image.cfg", "x");

        brt()
            .args([
                "hash",
                dir.path().join("image.cfg").to_str().unwrap(),
                "--verify",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No recorded hash"));
    }
}
