//! Platform strategies.
//!
//! The supported platforms form a closed set selected once at startup; stage
//! code dispatches on this enum instead of re-branching on an OS string. An
//! unrecognized target is rejected before any stage runs.

use anyhow::{bail, Result};
use std::path::Path;

use crate::exec::CommandSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    pub fn detect() -> Result<Self> {
        if cfg!(target_os = "linux") {
            Ok(Self::Linux)
        } else if cfg!(target_os = "macos") {
            Ok(Self::MacOs)
        } else if cfg!(windows) {
            Ok(Self::Windows)
        } else {
            bail!("unsupported platform: {}", std::env::consts::OS);
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::MacOs => "macOS",
            Self::Windows => "Windows",
        }
    }

    /// Whether privileged commands need a sudo prefix on this platform.
    pub fn needs_sudo(&self) -> bool {
        *self == Self::Linux && !is_root()
    }

    /// Command for a program that may require privilege elevation.
    pub fn elevated(&self, program: &str) -> CommandSpec {
        if self.needs_sudo() {
            CommandSpec::new("sudo").arg(program)
        } else {
            CommandSpec::new(program)
        }
    }

    /// Blocking editor invocation for the given file. `EDITOR` may carry
    /// arguments and is split with shell rules; the fallback is the platform
    /// default editor.
    pub fn editor_spec(&self, file: &Path) -> Result<CommandSpec> {
        let path = file.display().to_string();
        if let Ok(raw) = std::env::var("EDITOR") {
            if !raw.trim().is_empty() {
                let mut words = shell_words::split(&raw)
                    .map_err(|err| anyhow::anyhow!("parse EDITOR value: {err}"))?;
                if !words.is_empty() {
                    let program = words.remove(0);
                    return Ok(CommandSpec::new(program).args(words).arg(path));
                }
            }
        }
        Ok(match self {
            Self::Windows => CommandSpec::new("notepad").arg(path),
            Self::MacOs => CommandSpec::new("open")
                .args(["-W", "-a", "TextEdit"])
                .arg(path),
            Self::Linux => CommandSpec::new("nano").arg(path),
        })
    }

    /// Command that opens a URL in the default browser.
    pub fn browser_spec(&self, url: &str) -> CommandSpec {
        match self {
            Self::Linux => CommandSpec::new("xdg-open").arg(url),
            Self::MacOs => CommandSpec::new("open").arg(url),
            Self::Windows => CommandSpec::new("cmd").args(["/C", "start", ""]).arg(url),
        }
    }
}

#[cfg(unix)]
fn is_root() -> bool {
    // Safety: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_succeeds_on_supported_targets() {
        let platform = Platform::detect().expect("supported platform");
        assert!(!platform.name().is_empty());
    }

    #[test]
    fn elevated_prefixes_sudo_only_when_needed() {
        let spec = Platform::MacOs.elevated("brew");
        assert!(spec.rendered().starts_with("brew"));
    }
}
