//! Prerequisite detection and installation.
//!
//! Detection never fails: a missing tool or a broken version probe degrades
//! to `installed: false` / `version: None`. Installation dispatches on the
//! platform strategy and re-detects afterwards; partial failure of optional
//! tools does not fail the stage.

use colored::Colorize;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{SetupConfig, NODE_VERSION, PNPM_VERSION, POSTGRES_VERSION};
use crate::exec::CommandSpec;
use crate::platform::Platform;
use crate::prompt::Prompter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Git,
    Node,
    Pnpm,
    Docker,
    DockerCompose,
    Psql,
    RedisCli,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::Git,
        Tool::Node,
        Tool::Pnpm,
        Tool::Docker,
        Tool::DockerCompose,
        Tool::Psql,
        Tool::RedisCli,
    ];

    pub fn binary_name(&self) -> &'static str {
        match self {
            Tool::Git => "git",
            Tool::Node => "node",
            Tool::Pnpm => "pnpm",
            Tool::Docker => "docker",
            Tool::DockerCompose => "docker-compose",
            Tool::Psql => "psql",
            Tool::RedisCli => "redis-cli",
        }
    }

    fn required(&self, config: &SetupConfig) -> bool {
        match self {
            Tool::Git | Tool::Node | Tool::Pnpm => true,
            Tool::Docker | Tool::DockerCompose => !config.no_docker,
            Tool::Psql | Tool::RedisCli => config.no_docker,
        }
    }

    fn installed(&self) -> bool {
        match self {
            // Either the standalone binary or the `docker compose` plugin.
            Tool::DockerCompose => {
                tool_on_path("docker-compose")
                    || (tool_on_path("docker")
                        && CommandSpec::new("docker")
                            .args(["compose", "version"])
                            .quiet()
                            .capture_ok()
                            .is_some())
            }
            other => tool_on_path(other.binary_name()),
        }
    }

    fn version(&self) -> Option<String> {
        match self {
            Tool::Node => node_version(),
            Tool::Psql => postgres_version(),
            Tool::RedisCli => redis_version(),
            _ => None,
        }
    }
}

fn tool_on_path(name: &str) -> bool {
    which::which(name).is_ok()
}

fn node_version() -> Option<String> {
    let raw = CommandSpec::new("node").arg("--version").quiet().capture_ok()?;
    let trimmed = raw.trim_start_matches('v').trim().to_string();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn postgres_version() -> Option<String> {
    let raw = CommandSpec::new("psql").arg("--version").quiet().capture_ok()?;
    extract_version(&raw, r"\d+\.\d+")
}

fn redis_version() -> Option<String> {
    let raw = CommandSpec::new("redis-cli")
        .arg("--version")
        .quiet()
        .capture_ok()?;
    extract_version(&raw, r"\d+\.\d+\.\d+")
}

fn extract_version(raw: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).expect("version regex");
    Some(re.find(raw)?.as_str().to_string())
}

#[derive(Debug, Serialize)]
pub struct ToolStatus {
    pub tool: &'static str,
    pub installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub required: bool,
}

#[derive(Debug, Serialize)]
pub struct PrereqReport {
    pub tools: Vec<ToolStatus>,
}

impl PrereqReport {
    pub fn all_required_installed(&self) -> bool {
        self.tools
            .iter()
            .filter(|status| status.required)
            .all(|status| status.installed)
    }

    fn installed(&self, tool: Tool) -> bool {
        self.tools
            .iter()
            .any(|status| status.tool == tool.binary_name() && status.installed)
    }
}

/// Recompute the status of every tool. Never fails.
pub fn detect(config: &SetupConfig) -> PrereqReport {
    info!("Checking prerequisites...");
    let tools = Tool::ALL
        .iter()
        .map(|tool| {
            let installed = tool.installed();
            ToolStatus {
                tool: tool.binary_name(),
                installed,
                version: installed.then(|| tool.version()).flatten(),
                required: tool.required(config),
            }
        })
        .collect();
    let report = PrereqReport { tools };
    if let Ok(json) = serde_json::to_string(&report) {
        debug!("prerequisite report: {json}");
    }
    report
}

/// Print the detection checklist for required tools.
pub fn print_checklist(report: &PrereqReport) {
    for status in report.tools.iter().filter(|status| status.required) {
        if status.installed {
            let version = status
                .version
                .as_deref()
                .map(|version| format!(" (v{version})"))
                .unwrap_or_default();
            println!("{} {} is installed{version}", "✓".green(), status.tool);
        } else {
            println!("{} {} is not installed", "✗".red(), status.tool);
        }
    }
}

/// Install missing tools for this run mode, then re-detect.
pub fn install_missing(
    config: &SetupConfig,
    report: &PrereqReport,
    prompter: &mut dyn Prompter,
) -> PrereqReport {
    info!("Installing missing prerequisites...");

    if !report.installed(Tool::Node) {
        install_node(config, prompter);
    }
    if !report.installed(Tool::Pnpm) {
        install_pnpm();
    }
    if !config.no_docker && !report.installed(Tool::Docker) {
        warn!("Docker is required but not installed");
        info!("Install Docker Desktop from https://www.docker.com/products/docker-desktop/");
        prompter.pause("Install Docker, then return here.");
    }
    if config.local_services() {
        if !report.installed(Tool::Psql) {
            install_postgres(config, prompter);
        }
        if !report.installed(Tool::RedisCli) {
            install_redis(config, prompter);
        }
    }

    detect(config)
}

fn install_node(config: &SetupConfig, prompter: &mut dyn Prompter) {
    info!("Installing Node.js...");
    match config.platform {
        Platform::Windows => {
            info!("Download Node.js from https://nodejs.org/");
            prompter.pause("Install Node.js, then return here.");
        }
        Platform::MacOs => {
            advisory(CommandSpec::new("brew").arg("install").arg(format!("node@{NODE_VERSION}")));
            advisory(
                CommandSpec::new("brew")
                    .args(["link", "--overwrite"])
                    .arg(format!("node@{NODE_VERSION}")),
            );
        }
        Platform::Linux => {
            advisory(config.platform.elevated("apt").arg("update"));
            advisory(config.platform.elevated("apt").args(["install", "-y", "curl"]));
            // The NodeSource bootstrap is a genuine pipeline, so it runs
            // under a shell.
            let bash = if config.platform.needs_sudo() {
                "sudo bash -"
            } else {
                "bash -"
            };
            advisory(CommandSpec::new("sh").args([
                "-c".to_string(),
                format!("curl -fsSL https://deb.nodesource.com/setup_{NODE_VERSION}.x | {bash}"),
            ]));
            advisory(config.platform.elevated("apt").args(["install", "-y", "nodejs"]));
        }
    }
}

fn install_pnpm() {
    info!("Installing pnpm...");
    advisory(CommandSpec::new("corepack").arg("enable"));
    advisory(
        CommandSpec::new("corepack")
            .arg("prepare")
            .arg(format!("pnpm@{PNPM_VERSION}"))
            .arg("--activate"),
    );
}

fn install_postgres(config: &SetupConfig, prompter: &mut dyn Prompter) {
    info!("Installing PostgreSQL...");
    match config.platform {
        Platform::Windows => {
            info!("Download PostgreSQL from https://www.postgresql.org/download/windows/");
            prompter.pause("Install PostgreSQL, then return here.");
        }
        Platform::MacOs => {
            let formula = format!("postgresql@{POSTGRES_VERSION}");
            advisory(CommandSpec::new("brew").arg("install").arg(formula.clone()));
            advisory(CommandSpec::new("brew").args(["services", "start"]).arg(formula));
        }
        Platform::Linux => {
            advisory(config.platform.elevated("apt").arg("update"));
            advisory(config.platform.elevated("apt").args([
                "install",
                "-y",
                "postgresql",
                "postgresql-contrib",
            ]));
            advisory(config.platform.elevated("systemctl").args(["start", "postgresql"]));
            advisory(config.platform.elevated("systemctl").args(["enable", "postgresql"]));
        }
    }
}

fn install_redis(config: &SetupConfig, prompter: &mut dyn Prompter) {
    info!("Installing Redis...");
    match config.platform {
        Platform::Windows => {
            info!("Download Redis from https://github.com/microsoftarchive/redis/releases");
            prompter.pause("Install Redis, then return here.");
        }
        Platform::MacOs => {
            advisory(CommandSpec::new("brew").args(["install", "redis"]));
            advisory(CommandSpec::new("brew").args(["services", "start", "redis"]));
        }
        Platform::Linux => {
            advisory(config.platform.elevated("apt").arg("update"));
            advisory(config.platform.elevated("apt").args(["install", "-y", "redis-server"]));
            advisory(config.platform.elevated("systemctl").args(["start", "redis-server"]));
            advisory(config.platform.elevated("systemctl").args(["enable", "redis-server"]));
        }
    }
}

fn advisory(spec: CommandSpec) {
    if !spec.run_ok() {
        warn!("command failed (continuing): {}", spec.rendered());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::RootArgs;
    use clap::Parser;

    fn config(args: &[&str]) -> SetupConfig {
        let args = RootArgs::parse_from(
            std::iter::once("cw-setup").chain(args.iter().copied()),
        );
        SetupConfig::from_args(&args).expect("config")
    }

    #[test]
    fn detect_never_fails_and_marks_missing_tools() {
        let config = config(&[]);
        let report = detect(&config);
        assert_eq!(report.tools.len(), Tool::ALL.len());
        for status in &report.tools {
            if !status.installed {
                assert_eq!(status.version, None);
            }
        }
    }

    #[test]
    fn required_set_follows_run_mode() {
        let docker = config(&[]);
        let local = config(&["--no-docker"]);
        assert!(Tool::Docker.required(&docker));
        assert!(!Tool::Psql.required(&docker));
        assert!(!Tool::Docker.required(&local));
        assert!(Tool::Psql.required(&local));
        assert!(Tool::Git.required(&docker) && Tool::Git.required(&local));
    }

    #[test]
    fn version_probe_failure_degrades_to_none() {
        assert_eq!(extract_version("no digits here", r"\d+\.\d+"), None);
        assert_eq!(
            extract_version("psql (PostgreSQL) 15.4", r"\d+\.\d+"),
            Some("15.4".to_string())
        );
        assert_eq!(
            extract_version("redis-cli 7.2.1 (git:...)", r"\d+\.\d+\.\d+"),
            Some("7.2.1".to_string())
        );
    }
}
