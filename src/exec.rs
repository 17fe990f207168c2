//! External command execution.
//!
//! Every external call is a typed descriptor (program, argument list, working
//! directory, environment overrides) rather than a shell string, so quoting
//! hazards cannot arise and tests can exercise failure paths with nonexistent
//! programs. Two severities are expressed through the method pairs: `run` /
//! `capture` fail the calling stage on a nonzero exit, while `run_ok` /
//! `capture_ok` degrade to a sentinel for advisory callers.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    quiet: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
            quiet: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Suppress the per-invocation log line (used by high-frequency probes).
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Shell-quoted rendering for logs and error messages.
    pub fn rendered(&self) -> String {
        let words = std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        command
    }

    fn log_invocation(&self) {
        if !self.quiet {
            info!("running: {}", self.rendered());
        }
    }

    /// Run to completion with inherited stdio; nonzero exit is an error.
    pub fn run(&self) -> Result<()> {
        self.log_invocation();
        let status = self
            .command()
            .status()
            .with_context(|| format!("spawn {}", self.program))?;
        if !status.success() {
            bail!("command failed ({status}): {}", self.rendered());
        }
        Ok(())
    }

    /// Run with check disabled: any failure (including a missing program)
    /// yields `false` instead of an error.
    pub fn run_ok(&self) -> bool {
        match self.run() {
            Ok(()) => true,
            Err(err) => {
                debug!("{err:#}");
                false
            }
        }
    }

    /// Run and return trimmed stdout; nonzero exit is an error carrying the
    /// command's stderr.
    pub fn capture(&self) -> Result<String> {
        self.log_invocation();
        let output = self
            .command()
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawn {}", self.program))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "command failed ({}): {}: {}",
                output.status,
                self.rendered(),
                stderr.trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Capture with check disabled: `None` on any failure.
    pub fn capture_ok(&self) -> Option<String> {
        match self.capture() {
            Ok(stdout) => Some(stdout),
            Err(err) => {
                debug!("{err:#}");
                None
            }
        }
    }

    /// Spawn without waiting. The child keeps running after this process
    /// exits; its output is discarded.
    #[allow(clippy::zombie_processes)]
    pub fn spawn_detached(&self) -> Result<()> {
        self.log_invocation();
        self.command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("spawn {}", self.program))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ok_returns_false_for_missing_program() {
        let spec = CommandSpec::new("cw-setup-no-such-program").quiet();
        assert!(!spec.run_ok());
    }

    #[test]
    fn capture_ok_returns_none_for_missing_program() {
        let spec = CommandSpec::new("cw-setup-no-such-program").quiet();
        assert_eq!(spec.capture_ok(), None);
    }

    #[cfg(unix)]
    #[test]
    fn capture_trims_stdout() {
        let spec = CommandSpec::new("echo").arg("  hello  ").quiet();
        let out = spec.capture().expect("echo runs");
        assert_eq!(out, "hello");
    }

    #[cfg(unix)]
    #[test]
    fn run_ok_reports_nonzero_exit() {
        let spec = CommandSpec::new("false").quiet();
        assert!(!spec.run_ok());
    }

    #[test]
    fn rendered_quotes_arguments() {
        let spec = CommandSpec::new("psql")
            .arg("-c")
            .arg("CREATE DATABASE clinicwave;");
        assert_eq!(spec.rendered(), "psql -c 'CREATE DATABASE clinicwave;'");
    }
}
