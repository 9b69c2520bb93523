//! Native package build.
//!
//! Translates [`ResolvedBuildOptions`] into a native tool command line:
//!
//! ```text
//! cordova build <platform> --release|--debug --device|--emulator \
//!     [--buildConfig=<path>] [-- --<key>=<value> ...]
//! ```
//!
//! The flags come from [`ResolvedBuildOptions::to_flat_map`]. Reserved
//! build options render first; platform-scoped options go after `--`,
//! where the native tool forwards them to the platform's own build script.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::BuildNative;
use crate::error::BuildError;
use crate::process::{Invocation, ProcessRunner, spawn_failure};
use crate::types::{Platform, RESERVED_OPTION_KEYS, ResolvedBuildOptions};

/// Runs the native build tool for a single platform.
pub struct NativePackageTask {
    runner: Arc<dyn ProcessRunner>,
    native_dir: PathBuf,
    command: String,
}

impl NativePackageTask {
    pub fn new(runner: Arc<dyn ProcessRunner>, native_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            native_dir: native_dir.into(),
            command: "cordova".to_string(),
        }
    }

    /// Overrides the native tool program.
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    fn invocation(&self, platform: Platform, options: &ResolvedBuildOptions) -> Invocation {
        let mut flags = options.to_flat_map();
        let mut inv = Invocation::new(self.command.clone())
            .arg("build")
            .arg(platform.as_str())
            .current_dir(&self.native_dir);

        for key in RESERVED_OPTION_KEYS {
            if let Some(flag) = flags.remove(key).and_then(|value| render_flag(key, &value)) {
                inv = inv.arg(flag);
            }
        }

        let passthrough: Vec<String> = flags
            .iter()
            .filter_map(|(key, value)| render_flag(key, value))
            .collect();
        if !passthrough.is_empty() {
            inv = inv.arg("--").args(passthrough);
        }
        inv
    }
}

/// Renders one platform option as a command-line flag.
///
/// `true` becomes a bare `--key`, `false` and `null` are dropped.
fn render_flag(key: &str, value: &Value) -> Option<String> {
    match value {
        Value::Bool(true) => Some(format!("--{}", key)),
        Value::Bool(false) | Value::Null => None,
        Value::String(s) => Some(format!("--{}={}", key, s)),
        other => Some(format!("--{}={}", key, other)),
    }
}

impl BuildNative for NativePackageTask {
    fn run(
        &self,
        platform: Platform,
        options: &ResolvedBuildOptions,
    ) -> Result<Platform, BuildError> {
        let invocation = self.invocation(platform, options);
        info!(%platform, command = %invocation, "building native package");

        let output = self
            .runner
            .run(&invocation)
            .map_err(|e| BuildError::NativeBuildFailed {
                platform: platform.to_string(),
                code: None,
                diagnostics: spawn_failure(&invocation, &e),
            })?;

        if !output.success() {
            return Err(BuildError::NativeBuildFailed {
                platform: platform.to_string(),
                code: output.code,
                diagnostics: output.diagnostics(),
            });
        }
        Ok(platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessOutput;
    use crate::process::testing::FakeRunner;
    use crate::types::PlatformOptions;
    use serde_json::json;
    use std::path::Path;

    fn options(platform: Platform) -> ResolvedBuildOptions {
        ResolvedBuildOptions {
            platform,
            is_release: false,
            is_emulator: true,
            build_config: None,
            platform_options: PlatformOptions::new(),
        }
    }

    #[test]
    fn debug_emulator_build() {
        let runner = FakeRunner::succeeding();
        let task = NativePackageTask::new(Arc::new(runner.clone()), "/app/cordova");
        let built = task.run(Platform::Ios, &options(Platform::Ios)).unwrap();
        assert_eq!(built, Platform::Ios);

        let call = &runner.calls()[0];
        assert_eq!(call.program, "cordova");
        assert_eq!(call.args, vec!["build", "ios", "--debug", "--emulator"]);
        assert_eq!(call.cwd.as_deref(), Some(Path::new("/app/cordova")));
    }

    #[test]
    fn release_device_build_with_config_and_passthrough() {
        let runner = FakeRunner::succeeding();
        let mut opts = options(Platform::Android);
        opts.is_release = true;
        opts.is_emulator = false;
        opts.build_config = Some(PathBuf::from("cfg.json"));
        opts.platform_options.insert("keystore".into(), json!("release.keystore"));
        opts.platform_options.insert("versionCode".into(), json!(42));
        opts.platform_options.insert("gradleArg".into(), json!(true));
        opts.platform_options.insert("minify".into(), json!(false));

        NativePackageTask::new(Arc::new(runner.clone()), "cordova")
            .run(Platform::Android, &opts)
            .unwrap();

        let call = &runner.calls()[0];
        assert_eq!(
            call.args,
            vec![
                "build",
                "android",
                "--release",
                "--device",
                "--buildConfig=cfg.json",
                "--",
                "--gradleArg",
                "--keystore=release.keystore",
                "--versionCode=42",
            ]
        );
    }

    #[test]
    fn reserved_keys_are_not_passed_through() {
        let runner = FakeRunner::succeeding();
        let mut opts = options(Platform::Ios);
        opts.platform_options.insert("release".into(), json!(true));
        opts.platform_options.insert("buildConfig".into(), json!("sneaky.json"));

        NativePackageTask::new(Arc::new(runner.clone()), "cordova")
            .run(Platform::Ios, &opts)
            .unwrap();

        let call = &runner.calls()[0];
        assert_eq!(call.args, vec!["build", "ios", "--debug", "--emulator"]);
    }

    #[test]
    fn failure_forwards_native_diagnostics() {
        let runner = FakeRunner::with(|_| {
            Ok(ProcessOutput {
                code: Some(65),
                stdout: String::new(),
                stderr: "** BUILD FAILED **".into(),
            })
        });
        let err = NativePackageTask::new(Arc::new(runner), "cordova")
            .run(Platform::Ios, &options(Platform::Ios))
            .unwrap_err();
        match err {
            BuildError::NativeBuildFailed {
                platform,
                code,
                diagnostics,
            } => {
                assert_eq!(platform, "ios");
                assert_eq!(code, Some(65));
                assert_eq!(diagnostics, "** BUILD FAILED **");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn render_flag_formats_json_values() {
        assert_eq!(render_flag("k", &json!("v")), Some("--k=v".into()));
        assert_eq!(render_flag("k", &json!(1.5)), Some("--k=1.5".into()));
        assert_eq!(render_flag("k", &json!(["a"])), Some("--k=[\"a\"]".into()));
        assert_eq!(render_flag("k", &Value::Null), None);
    }
}
