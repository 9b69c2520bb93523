//! Installed platform validation.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use super::ValidatePlatform;
use crate::error::BuildError;
use crate::types::Platform;

/// Validates platforms against `<native_dir>/platforms/`.
///
/// The native tool creates one directory per added platform there, so the
/// directory names are the installed platforms.
#[derive(Debug, Clone)]
pub struct InstalledPlatforms {
    native_dir: PathBuf,
}

impl InstalledPlatforms {
    pub fn new(native_dir: impl Into<PathBuf>) -> Self {
        Self {
            native_dir: native_dir.into(),
        }
    }

    /// Lists installed platform names, sorted.
    ///
    /// A missing `platforms/` directory means nothing is installed.
    pub fn installed(&self) -> Result<Vec<String>, BuildError> {
        let dir = self.native_dir.join("platforms");
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(dir = ?dir, "no platforms directory");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

impl ValidatePlatform for InstalledPlatforms {
    fn run(&self, platform: Platform) -> Result<(), BuildError> {
        let installed = self.installed()?;
        if installed.iter().any(|name| name == platform.as_str()) {
            debug!(%platform, "platform is installed");
            Ok(())
        } else {
            Err(BuildError::PlatformNotInstalled {
                platform: platform.to_string(),
                installed,
            })
        }
    }
}
