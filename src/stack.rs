//! Stack startup: Docker Compose or local development servers, followed by
//! the readiness wait.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::config::{SetupConfig, API_HEALTH_URL, WEB_URL};
use crate::exec::CommandSpec;
use crate::net;
use crate::readiness::{
    wait_for_targets, PollBudget, SystemClock, Target, COMPOSE_BUDGET, LOCAL_BUDGET,
};

const TARGETS: [Target; 2] = [
    Target {
        name: "API server",
        url: API_HEALTH_URL,
    },
    Target {
        name: "Web application",
        url: WEB_URL,
    },
];

pub fn launch(config: &SetupConfig, project_root: &Path) -> Result<()> {
    info!("Starting ClinicWave application...");
    if config.no_docker {
        launch_local(project_root)
    } else {
        launch_compose(project_root)
    }
}

fn launch_local(project_root: &Path) -> Result<()> {
    info!("Starting development servers...");
    CommandSpec::new("pnpm")
        .arg("dev")
        .cwd(project_root)
        .spawn_detached()
        .context("start development servers")?;
    info!("Development servers started in background");
    wait_until_ready(&LOCAL_BUDGET, None)
}

fn launch_compose(project_root: &Path) -> Result<()> {
    info!("Starting Docker containers...");
    compose_spec(project_root)
        .args(["up", "-d", "--build"])
        .run()
        .context("start Docker containers")?;
    info!("Docker containers started successfully");
    wait_until_ready(&COMPOSE_BUDGET, Some("check container logs with: docker compose logs -f"))
}

/// Prefer the standalone `docker-compose` binary; fall back to the
/// `docker compose` plugin form.
fn compose_spec(project_root: &Path) -> CommandSpec {
    if which::which("docker-compose").is_ok() {
        CommandSpec::new("docker-compose").cwd(project_root)
    } else {
        CommandSpec::new("docker").arg("compose").cwd(project_root)
    }
}

fn wait_until_ready(budget: &PollBudget, hint: Option<&str>) -> Result<()> {
    info!("Waiting for services to be ready...");
    let agent = net::probe_agent();
    let outcome = wait_for_targets(
        &TARGETS,
        budget,
        |target| net::url_reachable(&agent, target.url),
        &mut SystemClock,
    );
    if !outcome.all_ready() {
        warn!(
            "Services did not start within {}s: {}",
            budget.max_wait.as_secs(),
            outcome.pending.join(", ")
        );
        if let Some(hint) = hint {
            info!("{hint}");
        }
        bail!("services not ready: {}", outcome.pending.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_spec_uses_one_of_the_two_invocation_forms() {
        let rendered = compose_spec(Path::new(".")).rendered();
        assert!(rendered == "docker-compose" || rendered == "docker compose");
    }
}
