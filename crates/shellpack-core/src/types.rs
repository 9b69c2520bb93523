//! Core types for shellpack-core.
//!
//! - [`Platform`] - Native platform selection (iOS or Android)
//! - [`Hook`] - Named lifecycle hook points
//! - [`BuildRequest`] - Raw options for a single `build` invocation
//! - [`ResolvedBuildOptions`] - Options derived from a request, as handed to the native tool
//! - [`Stage`] - Pipeline stages, in execution order

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::BuildError;

/// Opaque option value passed through to the native build tool.
pub type OptionValue = Value;

/// Option namespace for a single platform.
pub type PlatformOptions = BTreeMap<String, OptionValue>;

/// Keys owned by the orchestrator in the flat option map.
///
/// Platform options may not override these.
pub const RESERVED_OPTION_KEYS: [&str; 5] = ["release", "debug", "emulator", "device", "buildConfig"];

/// Target native platform.
///
/// # Example
///
/// ```
/// use shellpack_core::Platform;
///
/// let platform: Platform = "android".parse().unwrap();
/// assert_eq!(platform, Platform::Android);
/// assert_eq!(Platform::Ios.as_str(), "ios");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Apple iOS (Xcode project under the native directory).
    Ios,
    /// Google Android (Gradle project under the native directory).
    Android,
}

impl Platform {
    /// Every supported platform, in a stable order.
    pub const ALL: [Platform; 2] = [Platform::Ios, Platform::Android];

    /// Returns the name the native tool uses for this platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            _ => Err(BuildError::UnknownPlatform(s.to_string())),
        }
    }
}

/// Lifecycle hook points run around the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    BeforeBuild,
    AfterBuild,
}

impl Hook {
    /// Hook name as users register it (`beforeBuild`, `afterBuild`).
    pub fn name(&self) -> &'static str {
        match self {
            Hook::BeforeBuild => "beforeBuild",
            Hook::AfterBuild => "afterBuild",
        }
    }

    /// Directory name used for on-disk hook discovery.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Hook::BeforeBuild => "before-build",
            Hook::AfterBuild => "after-build",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw options for one `build` invocation.
///
/// Every field is optional; [`crate::BuildCommand::derive`] turns a request
/// into [`ResolvedBuildOptions`].
///
/// # Example
///
/// ```
/// use shellpack_core::{BuildRequest, Platform};
///
/// let request = BuildRequest::default()
///     .platform(Platform::Android)
///     .release(true)
///     .build_config("build.json")
///     .platform_option(Platform::Android, "keystore", "release.keystore");
/// assert_eq!(request.platform, Some(Platform::Android));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildRequest {
    /// Explicit platform; `None` defers to the default platform policy.
    pub platform: Option<Platform>,
    /// Build a release package.
    pub release: Option<bool>,
    /// Target a physical device instead of an emulator.
    pub device: Option<bool>,
    /// Path to an external signing/build config file.
    pub build_config: Option<PathBuf>,
    /// Per-platform pass-through options for the native tool.
    pub platform_options: BTreeMap<Platform, PlatformOptions>,
}

impl BuildRequest {
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn release(mut self, release: bool) -> Self {
        self.release = Some(release);
        self
    }

    pub fn device(mut self, device: bool) -> Self {
        self.device = Some(device);
        self
    }

    pub fn build_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_config = Some(path.into());
        self
    }

    /// Adds a single pass-through option in `platform`'s namespace.
    pub fn platform_option(
        mut self,
        platform: Platform,
        key: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Self {
        self.platform_options
            .entry(platform)
            .or_default()
            .insert(key.into(), value.into());
        self
    }
}

/// Options derived from a [`BuildRequest`], fixed for the rest of the build.
///
/// Only the resolved platform's option namespace is retained, so options
/// meant for another platform never reach the native tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBuildOptions {
    pub platform: Platform,
    pub is_release: bool,
    pub is_emulator: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_config: Option<PathBuf>,
    pub platform_options: PlatformOptions,
}

impl ResolvedBuildOptions {
    /// Flattens the options into the mapping handed to the native tool.
    ///
    /// `buildConfig` is present only when a build config was supplied.
    /// Platform options that collide with a reserved key are dropped.
    pub fn to_flat_map(&self) -> BTreeMap<String, OptionValue> {
        let mut map = BTreeMap::new();
        map.insert("release".to_string(), Value::Bool(self.is_release));
        map.insert("debug".to_string(), Value::Bool(!self.is_release));
        map.insert("emulator".to_string(), Value::Bool(self.is_emulator));
        map.insert("device".to_string(), Value::Bool(!self.is_emulator));
        if let Some(path) = &self.build_config {
            map.insert(
                "buildConfig".to_string(),
                Value::String(path.display().to_string()),
            );
        }
        for (key, value) in &self.platform_options {
            if RESERVED_OPTION_KEYS.contains(&key.as_str()) {
                warn!(platform = %self.platform, key = %key, "ignoring platform option that shadows a reserved build option");
                continue;
            }
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

/// Pipeline stages in execution order.
///
/// Each variant names the state reached once the matching step succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    GuardChecked,
    Validated,
    BeforeHookRun,
    WebBuilt,
    NativeBuilt,
    AfterHookRun,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::GuardChecked => "guard_checked",
            Stage::Validated => "validated",
            Stage::BeforeHookRun => "before_hook_run",
            Stage::WebBuilt => "web_built",
            Stage::NativeBuilt => "native_built",
            Stage::AfterHookRun => "after_hook_run",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolved(build_config: Option<&str>) -> ResolvedBuildOptions {
        ResolvedBuildOptions {
            platform: Platform::Ios,
            is_release: false,
            is_emulator: true,
            build_config: build_config.map(PathBuf::from),
            platform_options: PlatformOptions::new(),
        }
    }

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("IOS".parse::<Platform>().unwrap(), Platform::Ios);
        assert_eq!(" android ".parse::<Platform>().unwrap(), Platform::Android);
        let err = "windows".parse::<Platform>().unwrap_err();
        assert!(matches!(err, BuildError::UnknownPlatform(name) if name == "windows"));
    }

    #[test]
    fn hook_names() {
        assert_eq!(Hook::BeforeBuild.name(), "beforeBuild");
        assert_eq!(Hook::AfterBuild.dir_name(), "after-build");
        assert_eq!(Hook::AfterBuild.to_string(), "afterBuild");
    }

    #[test]
    fn request_builder_collects_platform_options() {
        let request = BuildRequest::default()
            .platform_option(Platform::Ios, "a", 1)
            .platform_option(Platform::Ios, "b", "two")
            .platform_option(Platform::Android, "c", true);
        assert_eq!(request.platform_options[&Platform::Ios].len(), 2);
        assert_eq!(request.platform_options[&Platform::Android]["c"], json!(true));
    }

    #[test]
    fn flat_map_omits_missing_build_config() {
        let map = resolved(None).to_flat_map();
        assert!(!map.contains_key("buildConfig"));
        assert_eq!(map["release"], json!(false));
        assert_eq!(map["debug"], json!(true));
        assert_eq!(map["emulator"], json!(true));
        assert_eq!(map["device"], json!(false));
    }

    #[test]
    fn flat_map_includes_build_config_when_present() {
        let map = resolved(Some("cfg.json")).to_flat_map();
        assert_eq!(map["buildConfig"], json!("cfg.json"));
    }

    #[test]
    fn platform_options_cannot_shadow_reserved_keys() {
        let mut options = resolved(None);
        options.platform_options.insert("release".into(), json!(true));
        options.platform_options.insert("codeSignIdentity".into(), json!("iPhone Developer"));
        let map = options.to_flat_map();
        assert_eq!(map["release"], json!(false));
        assert_eq!(map["codeSignIdentity"], json!("iPhone Developer"));
    }

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::Idle < Stage::GuardChecked);
        assert!(Stage::WebBuilt < Stage::NativeBuilt);
        assert!(Stage::AfterHookRun < Stage::Done);
    }
}
