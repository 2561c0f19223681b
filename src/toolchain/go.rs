//! Go toolchain
//!
//! Uses `go env` for the toolchain directories and
//! `go list -f {{.Dir}} all ./...` as the dependency enumerator.

use crate::error::{TgoError, TgoResult};
use crate::toolchain::{Toolchain, ToolchainEnv};
use async_trait::async_trait;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const LIST_ARGS: [&str; 5] = ["list", "-f", "{{.Dir}}", "all", "./..."];

/// Toolchain backed by the `go` binary on PATH
pub struct GoToolchain {
    program: String,
}

impl GoToolchain {
    pub fn new() -> Self {
        Self {
            program: "go".to_string(),
        }
    }

    /// Use a specific `go` binary
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Execute a go command and return its stdout.
    ///
    /// With a directory, the child also gets `PWD` set to it: go reports
    /// paths under `$PWD` when it names the working directory, so an
    /// inherited value would spell the workspace differently.
    async fn output(&self, args: &[&str], dir: Option<&Path>) -> TgoResult<String> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!("Executing: {}", command);

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = dir {
            cmd.current_dir(dir).env("PWD", dir);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| TgoError::command_failed(&command, e))?;

        if !output.status.success() {
            return Err(TgoError::Enumeration(format!(
                "`{}` exited with {}",
                command, output.status
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| TgoError::Enumeration(format!("`{}` printed invalid UTF-8", command)))
    }
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Toolchain for GoToolchain {
    async fn env(&self, workspace: &Path) -> TgoResult<ToolchainEnv> {
        let output = self.output(&["env"], Some(workspace)).await?;
        Ok(parse_go_env(&output))
    }

    async fn list_dirs(&self, workspace: &Path) -> TgoResult<Vec<PathBuf>> {
        let output = self.output(&LIST_ARGS, Some(workspace)).await?;
        parse_dir_list(&output)
    }

    fn name(&self) -> &'static str {
        "go"
    }
}

/// Parse `go env` output (`KEY="value"`, `KEY='value'` or `KEY=value` lines)
pub fn parse_go_env(output: &str) -> ToolchainEnv {
    let vars: HashMap<&str, &str> = output
        .lines()
        .filter_map(|line| line.trim().split_once('='))
        .map(|(key, value)| (key.trim(), value.trim().trim_matches(|c: char| c == '"' || c == '\'')))
        .collect();

    let path = |key: &str| PathBuf::from(vars.get(key).copied().unwrap_or_default());
    let dep_root = vars
        .get("GOPATH")
        .and_then(|value| env::split_paths(value).next())
        .unwrap_or_default();

    ToolchainEnv {
        root: path("GOROOT"),
        dep_root,
        mod_cache: path("GOMODCACHE"),
        build_cache: path("GOCACHE"),
    }
}

/// Parse the enumerator output: one absolute directory per line
pub fn parse_dir_list(output: &str) -> TgoResult<Vec<PathBuf>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let dir = PathBuf::from(line);
            if dir.is_absolute() {
                Ok(dir)
            } else {
                Err(TgoError::Enumeration(format!(
                    "expected an absolute directory, got {:?}",
                    line
                )))
            }
        })
        .collect()
}
