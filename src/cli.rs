//! CLI argument parsing for the setup pipeline.
//!
//! The CLI is intentionally thin: flags only, no values, so the whole run
//! configuration can be captured once and handed to the pipeline by reference.
use clap::Parser;

/// Root CLI entrypoint for the setup run.
#[derive(Parser, Debug)]
#[command(
    name = "cw-setup",
    version,
    about = "Automated setup for the ClinicWave development stack",
    after_help = "Examples:\n  cw-setup                      Full setup with Docker\n  cw-setup --no-docker          Use locally installed PostgreSQL/Redis\n  cw-setup --skip-clone         Run inside an existing checkout\n  cw-setup --env-only           Only materialize the .env file"
)]
pub struct RootArgs {
    /// Set up without Docker (use locally installed services)
    #[arg(long)]
    pub no_docker: bool,

    /// Skip prerequisites installation
    #[arg(long)]
    pub skip_prereqs: bool,

    /// Skip repository cloning (use the current directory)
    #[arg(long)]
    pub skip_clone: bool,

    /// Skip services setup (PostgreSQL, Redis)
    #[arg(long)]
    pub skip_services: bool,

    /// Only set up environment variables, then exit
    #[arg(long)]
    pub env_only: bool,
}
