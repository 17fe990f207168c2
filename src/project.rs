//! Project dependency installation and database schema setup.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::exec::CommandSpec;
use crate::prompt::Prompter;

pub fn install_dependencies(project_root: &Path) -> Result<()> {
    info!("Installing project dependencies...");
    CommandSpec::new("pnpm")
        .arg("install")
        .cwd(project_root)
        .run()
        .context("install dependencies")?;
    info!("Dependencies installed successfully");
    Ok(())
}

/// Generate the Prisma client, run migrations (with a deploy fallback), and
/// seed demo data. Runs inside the API package.
pub fn setup_schema(project_root: &Path, prompter: &mut dyn Prompter) -> Result<()> {
    info!("Setting up database schema...");
    let api_dir = project_root.join("packages").join("api");

    info!("Generating Prisma client...");
    CommandSpec::new("npx")
        .args(["prisma", "generate"])
        .cwd(&api_dir)
        .run()
        .context("generate Prisma client")?;

    info!("Running database migrations...");
    let migrated = CommandSpec::new("npx")
        .args(["prisma", "migrate", "dev", "--name", "init"])
        .cwd(&api_dir)
        .run_ok();
    if !migrated {
        warn!("migrate dev failed, trying deploy...");
        if !CommandSpec::new("npx")
            .args(["prisma", "migrate", "deploy"])
            .cwd(&api_dir)
            .run_ok()
        {
            bail!("database migrations failed");
        }
    }

    info!("Seeding database with demo data...");
    if !CommandSpec::new("npx")
        .args(["prisma", "db", "seed"])
        .cwd(&api_dir)
        .run_ok()
    {
        warn!("Failed to seed database");
        if !prompter.confirm("Continue anyway?", true) {
            bail!("schema setup aborted by operator");
        }
    }

    info!("Database schema setup completed");
    Ok(())
}
