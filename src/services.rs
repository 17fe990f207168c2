//! Host-service provisioning: PostgreSQL database creation and Redis
//! verification. Both stages only run in local-services mode.

use anyhow::{bail, Context, Result};
use std::io::Write;
use tracing::{info, warn};

use crate::config::{SetupConfig, DB_NAME, DB_PASSWORD, DB_USER};
use crate::exec::CommandSpec;
use crate::platform::Platform;
use crate::prompt::Prompter;

/// Create the application database. Failure is advisory: the database may
/// already exist, so the operator decides whether to continue.
pub fn provision_database(config: &SetupConfig, prompter: &mut dyn Prompter) -> Result<()> {
    info!("Creating PostgreSQL database '{DB_NAME}'...");
    let created = match config.platform {
        Platform::Linux => create_database_linux(),
        Platform::MacOs => create_database_macos(),
        Platform::Windows => create_database_windows()?,
    };

    if !created {
        warn!("Failed to create database; it may already exist or the server may be unreachable");
        if !prompter.confirm("Continue anyway?", true) {
            bail!("database provisioning aborted by operator");
        }
    }
    Ok(())
}

fn create_database_linux() -> bool {
    // Runs as the postgres system user; sudo handles the identity switch
    // whether or not the operator is root.
    CommandSpec::new("sudo")
        .args(["-u", DB_USER, "psql", "-c"])
        .arg(create_sql())
        .run_ok()
}

fn create_database_macos() -> bool {
    if CommandSpec::new("createdb").arg(DB_NAME).run_ok() {
        return true;
    }
    warn!("createdb failed, retrying with psql...");
    CommandSpec::new("psql").arg("-c").arg(create_sql()).run_ok()
}

/// Windows has no passwordless local role, so the password travels through a
/// transient PGPASSFILE that exists only for this call.
fn create_database_windows() -> Result<bool> {
    let mut pgpass = tempfile::NamedTempFile::new().context("create pgpass file")?;
    write!(pgpass, "localhost:5432:*:{DB_USER}:{DB_PASSWORD}").context("write pgpass file")?;
    let created = CommandSpec::new("psql")
        .args(["-U", DB_USER, "-c"])
        .arg(create_sql())
        .env("PGPASSFILE", pgpass.path().display().to_string())
        .run_ok();
    Ok(created)
}

fn create_sql() -> String {
    format!("CREATE DATABASE {DB_NAME};")
}

/// Ensure the Redis service is running and answering pings.
pub fn verify_redis(config: &SetupConfig) -> Result<()> {
    info!("Checking Redis service...");

    if redis_running(config.platform) {
        info!("Redis service is running");
    } else {
        warn!("Redis service is not running");
        info!("Starting Redis service...");
        start_redis(config);
    }

    info!("Testing Redis connection...");
    let pong = CommandSpec::new("redis-cli").arg("ping").capture_ok();
    match pong {
        Some(reply) if reply.contains("PONG") => {
            info!("Redis connection successful");
            Ok(())
        }
        _ => bail!("Redis liveness probe did not return PONG"),
    }
}

fn redis_running(platform: Platform) -> bool {
    match platform {
        Platform::Windows => CommandSpec::new("sc")
            .args(["query", "redis"])
            .quiet()
            .capture_ok()
            .is_some_and(|out| out.contains("RUNNING")),
        Platform::MacOs => CommandSpec::new("brew")
            .args(["services", "list"])
            .quiet()
            .capture_ok()
            .is_some_and(|out| service_listed_as_started(&out, "redis")),
        Platform::Linux => CommandSpec::new("systemctl")
            .args(["is-active", "redis-server"])
            .quiet()
            .capture_ok()
            .is_some_and(|out| out.trim() == "active"),
    }
}

fn start_redis(config: &SetupConfig) {
    let started = match config.platform {
        Platform::Windows => CommandSpec::new("sc").args(["start", "redis"]).run_ok(),
        Platform::MacOs => CommandSpec::new("brew")
            .args(["services", "start", "redis"])
            .run_ok(),
        Platform::Linux => config
            .platform
            .elevated("systemctl")
            .args(["start", "redis-server"])
            .run_ok(),
    };
    if !started {
        warn!("could not start the Redis service");
    }
}

fn service_listed_as_started(listing: &str, service: &str) -> bool {
    listing
        .lines()
        .any(|line| line.contains(service) && line.contains("started"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_sql_names_the_app_database() {
        assert_eq!(create_sql(), "CREATE DATABASE clinicwave;");
    }

    #[test]
    fn brew_listing_detects_started_service() {
        let listing = "Name    Status  User\nredis   started dev\npostgresql@15 none\n";
        assert!(service_listed_as_started(listing, "redis"));
        assert!(!service_listed_as_started(listing, "postgresql@15"));
    }
}
