use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing::error;

mod cli;
mod config;
mod envfile;
mod exec;
mod logging;
mod net;
mod platform;
mod prereq;
mod project;
mod prompt;
mod readiness;
mod repo;
mod services;
mod stack;
mod workflow;

fn main() -> ExitCode {
    let args = cli::RootArgs::parse();

    let config = match config::SetupConfig::from_args(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", format!("Error: {err:#}").red());
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = logging::init(&config.log_path, config.platform.name()) {
        eprintln!("{}", format!("Error: {err:#}").red());
        return ExitCode::FAILURE;
    }

    install_interrupt_notice();

    let mut prompter = prompt::for_session();
    match workflow::run(&config, prompter.as_mut()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!(
                "{}",
                format!("Check the log file for details: {}", config.log_path.display()).red()
            );
            ExitCode::FAILURE
        }
    }
}

#[cfg(unix)]
fn install_interrupt_notice() {
    extern "C" fn on_interrupt(_signal: libc::c_int) {
        const MSG: &[u8] = b"\nSetup interrupted by user.\n";
        // Only async-signal-safe calls are allowed here.
        unsafe {
            libc::write(libc::STDERR_FILENO, MSG.as_ptr().cast(), MSG.len());
            libc::_exit(1);
        }
    }
    unsafe {
        libc::signal(libc::SIGINT, on_interrupt as libc::sighandler_t);
    }
}

#[cfg(not(unix))]
fn install_interrupt_notice() {}
