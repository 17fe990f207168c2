//! Repository acquisition and the best-effort publish step.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{SetupConfig, REPO_URL};
use crate::exec::CommandSpec;
use crate::prompt::Prompter;

const REPO_DIR_NAME: &str = "ClinicWave";
const COMMIT_MESSAGE: &str = "Update setup files and documentation";

/// Ensure a checkout exists and return its root directory.
pub fn acquire(config: &SetupConfig, prompter: &mut dyn Prompter) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("resolve working directory")?;
    if config.skip_clone {
        info!("Skipping repository cloning as requested");
        return Ok(cwd);
    }

    info!("Cloning ClinicWave repository...");
    if cwd.join(".git").exists() && cwd.join("packages").exists() {
        info!("Already in ClinicWave repository, skipping clone");
        return Ok(cwd);
    }

    let repo_dir = cwd.join(REPO_DIR_NAME);
    if repo_dir.exists() {
        warn!("Directory {} already exists", repo_dir.display());
        if prompter.confirm("Do you want to remove and re-clone?", false) {
            fs::remove_dir_all(&repo_dir)
                .with_context(|| format!("remove {}", repo_dir.display()))?;
        } else {
            info!("Using existing repository");
            return Ok(repo_dir);
        }
    }

    CommandSpec::new("git")
        .args(["clone", REPO_URL])
        .cwd(cwd)
        .run()
        .context("clone repository")?;
    info!("Repository cloned successfully");
    Ok(repo_dir)
}

/// Stage, commit, and push local changes. Best-effort: the first failing
/// sub-step ends the attempt and the caller ignores the outcome.
pub fn publish(project_root: &Path) -> bool {
    info!("Checking for changes to push...");
    if !project_root.join(".git").exists() {
        warn!("Not in a git repository");
        return false;
    }

    let Some(status) = CommandSpec::new("git")
        .args(["status", "--porcelain"])
        .cwd(project_root)
        .capture_ok()
    else {
        warn!("git status failed");
        return false;
    };
    if status.is_empty() {
        info!("No changes to commit");
        return true;
    }

    info!("Adding changes...");
    if !CommandSpec::new("git").args(["add", "."]).cwd(project_root).run_ok() {
        warn!("Failed to add changes");
        return false;
    }

    info!("Committing changes...");
    if !CommandSpec::new("git")
        .args(["commit", "-m", COMMIT_MESSAGE])
        .cwd(project_root)
        .run_ok()
    {
        warn!("Failed to commit changes");
        return false;
    }

    info!("Pushing changes...");
    if !CommandSpec::new("git").arg("push").cwd(project_root).run_ok() {
        warn!("Failed to push changes");
        return false;
    }

    info!("Changes pushed successfully");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn publish_declines_outside_a_repository() {
        let dir = TempDir::new().expect("tempdir");
        assert!(!publish(dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn publish_succeeds_trivially_on_a_clean_tree() {
        let dir = TempDir::new().expect("tempdir");
        let git = |args: &[&str]| {
            CommandSpec::new("git")
                .args(args.iter().copied())
                .cwd(dir.path())
                .quiet()
                .run_ok()
        };
        if !git(&["init", "-q"]) {
            return; // git unavailable in this environment
        }
        assert!(publish(dir.path()));
    }
}
