//! Web bundle build.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use super::BuildWeb;
use crate::error::BuildError;
use crate::process::{Invocation, ProcessRunner, spawn_failure};

/// Runs the web bundler so its output lands in the native project's `www/`.
///
/// The default command is `ember build`; the environment (`development` by
/// default) and the output path are appended as
/// `--environment=<env> --output-path=<path>`.
pub struct WebBundleTask {
    runner: Arc<dyn ProcessRunner>,
    project_root: PathBuf,
    command: String,
    args: Vec<String>,
    environment: String,
    output_path: PathBuf,
}

impl WebBundleTask {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        project_root: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            project_root: project_root.into(),
            command: "ember".to_string(),
            args: vec!["build".to_string()],
            environment: "development".to_string(),
            output_path: output_path.into(),
        }
    }

    /// Overrides the bundler program and its leading arguments.
    pub fn command(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.command = command.into();
        self.args = args;
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(self.command.clone())
            .args(self.args.iter().cloned())
            .arg(format!("--environment={}", self.environment))
            .arg(format!("--output-path={}", self.output_path.display()))
            .current_dir(&self.project_root)
    }
}

impl BuildWeb for WebBundleTask {
    fn run(&self) -> Result<(), BuildError> {
        let invocation = self.invocation();
        info!(command = %invocation, "building web bundle");

        let output = self
            .runner
            .run(&invocation)
            .map_err(|e| BuildError::BundleBuildFailed {
                code: None,
                diagnostics: spawn_failure(&invocation, &e),
            })?;

        if !output.success() {
            return Err(BuildError::BundleBuildFailed {
                code: output.code,
                diagnostics: output.diagnostics(),
            });
        }
        Ok(())
    }
}
