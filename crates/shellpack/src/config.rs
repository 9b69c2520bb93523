//! Configuration file support for shellpack.
//!
//! Project settings live in `shellpack.toml` so they do not have to be passed
//! as CLI flags on every build.
//!
//! ## Configuration File Location
//!
//! The configuration file is searched for in the following order:
//! 1. Current working directory (`./shellpack.toml`)
//! 2. Parent directories (up to the repository root or filesystem root)
//!
//! ## Example Configuration
//!
//! ```toml
//! [project]
//! location_type = "hash"
//! native_dir = "cordova"
//! hooks_dir = "shellpack/hooks"
//!
//! [web]
//! command = "ember"
//! args = ["build"]
//! environment = "development"
//!
//! [native]
//! command = "cordova"
//!
//! [build]
//! default_platform = "ios"
//!
//! [hooks]
//! beforeBuild = ["scripts/prepare.sh"]
//!
//! [platforms.ios]
//! codeSignIdentity = "iPhone Developer"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use shellpack_core::{AppConfig, BuildError, OptionValue, Platform, PlatformOptions, ProjectConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The default configuration file name.
pub const CONFIG_FILE_NAME: &str = "shellpack.toml";

/// Root configuration structure for `shellpack.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShellpackConfig {
    pub project: ProjectSection,
    pub web: WebSection,
    pub native: NativeSection,
    pub build: BuildSection,

    /// Hook scripts by hook name (`beforeBuild`, `afterBuild`).
    pub hooks: BTreeMap<String, Vec<PathBuf>>,

    /// Pass-through native tool options, keyed by platform name.
    pub platforms: BTreeMap<String, BTreeMap<String, toml::Value>>,
}

/// Project layout and web app settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    /// Routing mode of the bundled web app. Must be `hash` to build.
    ///
    /// Has no default: a build without it fails before any tool runs.
    pub location_type: Option<String>,

    /// Native project directory, relative to the project root.
    ///
    /// Defaults to `cordova`.
    pub native_dir: PathBuf,

    /// Directory searched for hook scripts when none are configured.
    pub hooks_dir: Option<PathBuf>,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            location_type: None,
            native_dir: PathBuf::from("cordova"),
            hooks_dir: None,
        }
    }
}

impl ProjectConfig for ProjectSection {
    fn config(&self) -> Result<AppConfig, BuildError> {
        match &self.location_type {
            Some(location_type) => Ok(AppConfig::new(location_type.clone())),
            None => Err(BuildError::Config(format!(
                "project.location_type is not set in {}. \
                 Set it to the web app's routing mode (only \"hash\" can be packaged).",
                CONFIG_FILE_NAME
            ))),
        }
    }
}

/// Web bundler invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSection {
    /// Bundler program. Defaults to `ember`.
    pub command: String,

    /// Leading arguments. Defaults to `["build"]`.
    pub args: Vec<String>,

    /// Build environment passed as `--environment`.
    ///
    /// Defaults to `development`.
    pub environment: String,
}

impl Default for WebSection {
    fn default() -> Self {
        Self {
            command: "ember".to_string(),
            args: vec!["build".to_string()],
            environment: "development".to_string(),
        }
    }
}

/// Native build tool invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NativeSection {
    /// Native tool program. Defaults to `cordova`.
    pub command: String,
}

impl Default for NativeSection {
    fn default() -> Self {
        Self {
            command: "cordova".to_string(),
        }
    }
}

/// Build defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Platform used when `--platform` is not given. Defaults to `ios`.
    pub default_platform: Option<String>,

    /// Build config file passed to the native tool when `--build-config` is not given.
    pub build_config: Option<PathBuf>,

    /// JSON-lines file that receives one event per build.
    pub analytics_log: Option<PathBuf>,
}

impl ShellpackConfig {
    /// Loads configuration from the specified file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: ShellpackConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Finds and loads `shellpack.toml` from the current directory or a parent.
    ///
    /// # Returns
    ///
    /// * `Ok(Some((config, path)))` - Found and loaded configuration with its path
    /// * `Ok(None)` - No configuration file found
    /// * `Err` - If a config file was found but couldn't be parsed
    pub fn discover() -> Result<Option<(Self, PathBuf)>> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&cwd)
    }

    /// Same as [`Self::discover`], starting from `start_dir`.
    pub fn discover_from(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.is_file() {
                let config = Self::load_from_file(&config_path)?;
                return Ok(Some((config, config_path)));
            }

            // Stop at repository root or filesystem root
            if current.join(".git").exists() || !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// The configured default platform, if any.
    pub fn default_platform(&self) -> Result<Option<Platform>, BuildError> {
        self.build
            .default_platform
            .as_deref()
            .map(str::parse::<Platform>)
            .transpose()
    }

    /// Platform options from the `[platforms.*]` tables.
    pub fn platform_options(&self) -> Result<BTreeMap<Platform, PlatformOptions>, BuildError> {
        let mut out = BTreeMap::new();
        for (name, table) in &self.platforms {
            let platform: Platform = name.parse()?;
            let options: PlatformOptions = table
                .iter()
                .map(|(key, value)| Ok((key.clone(), toml_to_option(value)?)))
                .collect::<Result<_, BuildError>>()?;
            out.insert(platform, options);
        }
        Ok(out)
    }

    /// Generates a commented starter configuration.
    pub fn generate_starter_toml() -> String {
        r#"# shellpack configuration file
# CLI flags override these settings when provided.

[project]
# Routing mode of the web app. Only "hash" works inside a native shell.
location_type = "hash"

# Native project directory (contains platforms/ and www/)
native_dir = "cordova"

# Directory with before-build/ and after-build/ hook scripts (optional)
# hooks_dir = "shellpack/hooks"

[web]
# Web bundler command and leading arguments
command = "ember"
args = ["build"]

# Build environment passed as --environment
environment = "development"

[native]
# Native build tool
command = "cordova"

[build]
# Platform used when --platform is not given
default_platform = "ios"

# Signing/build config passed as --buildConfig (optional)
# build_config = "build.json"

# Append one JSON line per build to this file (optional)
# analytics_log = "tmp/shellpack-events.jsonl"

[hooks]
# Scripts run in order; the first failure aborts the build
# beforeBuild = ["scripts/prepare.sh"]
# afterBuild = []

# Platform-specific options passed through to the native tool
# [platforms.ios]
# codeSignIdentity = "iPhone Developer"
#
# [platforms.android]
# keystore = "release.keystore"
"#
        .to_string()
    }
}

fn toml_to_option(value: &toml::Value) -> Result<OptionValue, BuildError> {
    serde_json::to_value(value)
        .map_err(|e| BuildError::Config(format!("unsupported platform option value: {}", e)))
}

/// Merges config file values with CLI arguments.
///
/// CLI arguments always take precedence over config file values.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    /// Loaded configuration, if any.
    pub config: ShellpackConfig,

    /// Path to the loaded config file, if any.
    pub config_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Loads `explicit` when given, otherwise discovers `shellpack.toml`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self {
                config: ShellpackConfig::load_from_file(path)?,
                config_path: Some(path.to_path_buf()),
            });
        }
        match ShellpackConfig::discover()? {
            Some((config, path)) => Ok(Self {
                config,
                config_path: Some(path),
            }),
            None => Ok(Self::default()),
        }
    }

    /// Directory relative paths in the config resolve against.
    ///
    /// The config file's directory, or `fallback` when no file was loaded.
    pub fn project_root(&self, fallback: &Path) -> PathBuf {
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| fallback.to_path_buf())
    }

    /// Resolves a CLI value, using config as fallback.
    pub fn resolve<T, F>(&self, cli_value: Option<T>, config_getter: F, default: T) -> T
    where
        F: FnOnce(&ShellpackConfig) -> Option<T>,
    {
        cli_value
            .or_else(|| config_getter(&self.config))
            .unwrap_or(default)
    }

    /// Config file platform options overlaid with CLI ones (CLI wins per key).
    pub fn platform_options(
        &self,
        cli: BTreeMap<Platform, PlatformOptions>,
    ) -> Result<BTreeMap<Platform, PlatformOptions>, BuildError> {
        let mut merged = self.config.platform_options()?;
        for (platform, options) in cli {
            merged.entry(platform).or_default().extend(options);
        }
        Ok(merged)
    }
}
