//! Lifecycle hook execution.
//!
//! Scripts registered for a hook run one after another, in registration
//! order. The first script that fails aborts the hook, and with it the
//! whole build; later scripts for the same hook do not run.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use super::RunHook;
use crate::error::BuildError;
use crate::process::{Invocation, ProcessRunner, spawn_failure};
use crate::types::Hook;

/// Looks up the scripts registered for a hook.
pub trait HookRegistry {
    /// Returns script paths in the order they must run.
    fn scripts(&self, hook: Hook) -> Result<Vec<PathBuf>, BuildError>;
}

/// Hook scripts from configuration, with directory discovery as fallback.
///
/// Scripts configured under the hook's name win. When none are configured,
/// the files in `<hooks_dir>/<hook dir name>/` run sorted by file name.
/// Relative paths resolve against the project root.
#[derive(Debug, Clone, Default)]
pub struct HookScripts {
    project_root: PathBuf,
    configured: BTreeMap<String, Vec<PathBuf>>,
    hooks_dir: Option<PathBuf>,
}

impl HookScripts {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Default::default()
        }
    }

    /// Registers scripts for a hook by name (`beforeBuild`, `afterBuild`).
    pub fn register(mut self, hook_name: impl Into<String>, scripts: Vec<PathBuf>) -> Self {
        self.configured
            .entry(hook_name.into())
            .or_default()
            .extend(scripts);
        self
    }

    /// Sets the directory searched when no scripts are configured for a hook.
    pub fn hooks_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.hooks_dir = Some(dir.into());
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    fn discover(&self, hook: Hook) -> Result<Vec<PathBuf>, BuildError> {
        let Some(dir) = &self.hooks_dir else {
            return Ok(Vec::new());
        };
        let dir = self.resolve(dir).join(hook.dir_name());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut scripts = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                scripts.push(entry.path());
            }
        }
        scripts.sort();
        Ok(scripts)
    }
}

impl HookRegistry for HookScripts {
    fn scripts(&self, hook: Hook) -> Result<Vec<PathBuf>, BuildError> {
        match self.configured.get(hook.name()) {
            Some(scripts) if !scripts.is_empty() => {
                Ok(scripts.iter().map(|p| self.resolve(p)).collect())
            }
            _ => self.discover(hook),
        }
    }
}

/// Runs hook scripts through a [`ProcessRunner`].
pub struct HookTask<R: HookRegistry> {
    registry: R,
    runner: Arc<dyn ProcessRunner>,
    cwd: PathBuf,
}

impl<R: HookRegistry> HookTask<R> {
    /// Scripts run with `cwd` as their working directory.
    pub fn new(registry: R, runner: Arc<dyn ProcessRunner>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            runner,
            cwd: cwd.into(),
        }
    }
}

impl<R: HookRegistry> RunHook for HookTask<R> {
    fn run(&self, hook: Hook) -> Result<(), BuildError> {
        let scripts = self.registry.scripts(hook)?;
        if scripts.is_empty() {
            debug!(%hook, "no hook scripts registered");
            return Ok(());
        }

        for script in scripts {
            let script_name = script.display().to_string();
            info!(%hook, script = %script_name, "running hook script");

            let invocation = Invocation::new(script_name.clone())
                .current_dir(&self.cwd)
                .env("SHELLPACK_HOOK", hook.name())
                .env("SHELLPACK_PROJECT_ROOT", self.cwd.display().to_string());

            let output = self.runner.run(&invocation).map_err(|e| BuildError::HookFailed {
                hook: hook.name().to_string(),
                script: script_name.clone(),
                code: None,
                output: spawn_failure(&invocation, &e),
            })?;

            if !output.success() {
                return Err(BuildError::HookFailed {
                    hook: hook.name().to_string(),
                    script: script_name,
                    code: output.code,
                    output: output.diagnostics(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessOutput;
    use crate::process::testing::FakeRunner;
    use tempfile::TempDir;

    fn exit(code: i32) -> io::Result<ProcessOutput> {
        Ok(ProcessOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: format!("exit {}", code),
        })
    }

    #[test]
    fn no_scripts_is_a_noop() {
        let runner = FakeRunner::succeeding();
        let task = HookTask::new(HookScripts::new("/proj"), Arc::new(runner.clone()), "/proj");
        task.run(Hook::BeforeBuild).unwrap();
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn runs_configured_scripts_in_order_with_context() {
        let runner = FakeRunner::succeeding();
        let registry = HookScripts::new("/proj")
            .register("beforeBuild", vec!["a.sh".into(), "/abs/b.sh".into()])
            .register("afterBuild", vec!["after.sh".into()]);
        let task = HookTask::new(registry, Arc::new(runner.clone()), "/proj");

        task.run(Hook::BeforeBuild).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, "/proj/a.sh");
        assert_eq!(calls[1].program, "/abs/b.sh");
        assert_eq!(calls[0].cwd.as_deref(), Some(Path::new("/proj")));
        assert_eq!(calls[0].env["SHELLPACK_HOOK"], "beforeBuild");
    }

    #[test]
    fn first_failure_stops_remaining_scripts() {
        let runner = FakeRunner::with(|inv| {
            if inv.program.ends_with("two.sh") {
                exit(2)
            } else {
                exit(0)
            }
        });
        let registry = HookScripts::new("/proj").register(
            "beforeBuild",
            vec!["one.sh".into(), "two.sh".into(), "three.sh".into()],
        );
        let task = HookTask::new(registry, Arc::new(runner.clone()), "/proj");

        let err = task.run(Hook::BeforeBuild).unwrap_err();
        match err {
            BuildError::HookFailed {
                hook,
                script,
                code,
                output,
            } => {
                assert_eq!(hook, "beforeBuild");
                assert_eq!(script, "/proj/two.sh");
                assert_eq!(code, Some(2));
                assert_eq!(output, "exit 2");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn spawn_failure_is_a_hook_failure() {
        let runner = FakeRunner::with(|_| Err(io::Error::new(io::ErrorKind::NotFound, "no such file")));
        let registry = HookScripts::new("/proj").register("afterBuild", vec!["gone.sh".into()]);
        let task = HookTask::new(registry, Arc::new(runner), "/proj");

        let err = task.run(Hook::AfterBuild).unwrap_err();
        assert!(matches!(err, BuildError::HookFailed { code: None, .. }));
        assert!(err.to_string().contains("Failed to start"));
    }

    #[test]
    fn discovers_scripts_from_hooks_dir_sorted() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("hooks/before-build");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("20-icons.sh"), "").unwrap();
        fs::write(dir.join("10-env.sh"), "").unwrap();

        let registry = HookScripts::new(temp.path()).hooks_dir("hooks");
        let scripts = registry.scripts(Hook::BeforeBuild).unwrap();
        assert_eq!(scripts, vec![dir.join("10-env.sh"), dir.join("20-icons.sh")]);
        assert!(registry.scripts(Hook::AfterBuild).unwrap().is_empty());
    }

    #[test]
    fn configured_scripts_take_precedence_over_discovery() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("hooks/before-build");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("discovered.sh"), "").unwrap();

        let registry = HookScripts::new(temp.path())
            .hooks_dir("hooks")
            .register("beforeBuild", vec!["configured.sh".into()]);
        let scripts = registry.scripts(Hook::BeforeBuild).unwrap();
        assert_eq!(scripts, vec![temp.path().join("configured.sh")]);
    }
}
