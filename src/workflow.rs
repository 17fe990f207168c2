//! The linear setup pipeline.
//!
//! Stages run front-to-back; a fatal stage failure propagates as an error
//! and aborts the run, while advisory stages log and continue. The
//! environment-only mode short-circuits everything after the environment
//! stage.

use anyhow::{bail, Result};
use colored::Colorize;
use tracing::{info, warn};

use crate::config::{SetupConfig, REQUIRED_PORTS, WEB_URL};
use crate::envfile;
use crate::net;
use crate::prereq;
use crate::project;
use crate::prompt::Prompter;
use crate::repo;
use crate::services;
use crate::stack;

pub fn run(config: &SetupConfig, prompter: &mut dyn Prompter) -> Result<()> {
    print_banner();
    check_ports(prompter)?;

    if config.env_only {
        info!("Running in environment-only mode");
        let root = std::env::current_dir()?;
        envfile::materialize(&root, config, prompter)?;
        info!("Environment setup completed successfully");
        return Ok(());
    }

    let detected = prereq::detect(config);
    prereq::print_checklist(&detected);

    let report = if config.skip_prereqs {
        info!("Skipping prerequisites installation as requested");
        detected
    } else if detected.all_required_installed() {
        detected
    } else {
        prereq::install_missing(config, &detected, prompter)
    };
    if !report.all_required_installed() {
        bail!("required tools are missing; install them and re-run");
    }

    let project_root = repo::acquire(config, prompter)?;
    envfile::materialize(&project_root, config, prompter)?;

    if config.skip_services {
        info!("Skipping services setup as requested");
    } else if config.local_services() {
        services::provision_database(config, prompter)?;
        services::verify_redis(config)?;
    }

    project::install_dependencies(&project_root)?;
    project::setup_schema(&project_root, prompter)?;
    stack::launch(config, &project_root)?;

    // Advisory only: a failed publish never fails the run.
    let _ = repo::publish(&project_root);

    open_browser(config);
    print_summary(config);
    Ok(())
}

fn check_ports(prompter: &mut dyn Prompter) -> Result<()> {
    info!("Checking if required ports are available...");
    let busy: Vec<String> = REQUIRED_PORTS
        .iter()
        .filter(|port| net::port_in_use(**port))
        .map(|port| port.to_string())
        .collect();
    if busy.is_empty() {
        return Ok(());
    }
    warn!("The following ports are already in use: {}", busy.join(", "));
    if !prompter.confirm("Do you want to continue anyway?", false) {
        bail!("setup aborted: ports in use");
    }
    Ok(())
}

fn open_browser(config: &SetupConfig) {
    info!("Opening {WEB_URL} in browser...");
    if !config.platform.browser_spec(WEB_URL).quiet().run_ok() {
        warn!("could not open a browser; visit {WEB_URL} manually");
    }
}

fn print_banner() {
    println!();
    println!("{}", "======================================".blue().bold());
    println!("{}", "  ClinicWave Automated Setup          ".blue().bold());
    println!("{}", "======================================".blue().bold());
    println!();
}

fn print_summary(config: &SetupConfig) {
    println!();
    println!("{}", "======================================".green().bold());
    println!("{}", "  ClinicWave Setup Completed!         ".green().bold());
    println!("{}", "======================================".green().bold());
    println!();
    println!("{} {}", "Web Application:".cyan(), WEB_URL.bold());
    println!("{} {}", "API Server:".cyan(), "http://localhost:4000".bold());
    println!();
    if config.no_docker {
        println!("{}", "Development servers are running in the background.".yellow());
        println!("{}", "Press Ctrl+C to stop the servers when done.".yellow());
    } else {
        println!("{}", "Docker services are running in the background.".yellow());
        println!("{}", "Use 'docker compose logs -f' to view logs.".yellow());
        println!("{}", "Use 'docker compose down' to stop all services.".yellow());
    }
    println!();
    println!("{}", "Default login credentials:".green());
    println!("{}", "Email: admin@clinicwave.com".green());
    println!("{}", "Password: admin123".green());
    println!();
    println!(
        "{}",
        format!("Setup log saved to: {}", config.log_path.display()).blue()
    );
    println!();
}
