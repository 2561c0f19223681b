//! Integration tests for tgo

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn tgo() -> Command {
        cargo_bin_cmd!("tgo")
    }

    #[test]
    fn help_displays() {
        tgo()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Go build cache"));
    }

    #[test]
    fn version_displays() {
        tgo()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("tgo"));
    }

    #[test]
    fn failed_initialization_reports_error() {
        // No `go` on PATH, so the toolchain query fails
        let dir = TempDir::new().unwrap();
        tgo()
            .args(["-C"])
            .arg(dir.path())
            .arg("vet")
            .env("PATH", dir.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));

        assert!(!dir.path().join(".tgo").join("config.toml").exists());
    }
}
