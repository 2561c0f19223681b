//! Child process launching
//!
//! Children inherit stdin, stdout and stderr so interactive or long-running
//! tools behave as if started directly. Nothing is captured.

use crate::error::{TgoError, TgoResult};
use std::ffi::{OsStr, OsString};
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Launches commands with a fixed environment
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    env: Vec<(OsString, OsString)>,
    dir: Option<PathBuf>,
}

impl ProcessRunner {
    /// Runner whose children see exactly `env`
    pub fn new(env: Vec<(OsString, OsString)>) -> Self {
        Self { env, dir: None }
    }

    /// Start children in `dir`
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Append entries after the base environment; on duplicate keys the
    /// later entry wins
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        self.env
            .extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Run a shell-style command line (split into words, no shell involved)
    pub async fn run(&self, command_line: &str) -> TgoResult<()> {
        let words = shell_words::split(command_line)
            .map_err(|e| TgoError::CommandLine(format!("{}: {}", command_line, e)))?;
        let (program, args) = words
            .split_first()
            .ok_or_else(|| TgoError::CommandLine("empty command".to_string()))?;
        self.run_args(program, args).await
    }

    /// Run `program` with explicit arguments
    pub async fn run_args<S: AsRef<OsStr>>(&self, program: &str, args: &[S]) -> TgoResult<()> {
        let command = display_command(program, args);
        debug!("Executing: {}", command);

        let mut cmd = Command::new(program);
        cmd.args(args)
            .env_clear()
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }

        let status = cmd
            .status()
            .await
            .map_err(|e| TgoError::command_failed(&command, e))?;

        check_status(command, status)
    }
}

fn display_command<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    std::iter::once(program.to_string())
        .chain(args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn check_status(command: String, status: ExitStatus) -> TgoResult<()> {
    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(TgoError::ProcessExit { command, code }),
        None => Err(TgoError::ProcessSignaled(format!(
            "{} (signal {})",
            command,
            status.signal().unwrap_or_default()
        ))),
    }
}
