//! External process invocation.
//!
//! Tasks describe the command they need as an [`Invocation`] and hand it to a
//! [`ProcessRunner`]. The runner reports a structured [`ProcessOutput`]
//! instead of failing on a non-zero exit, so each task can attach its own
//! context (hook name, platform) before turning the result into a
//! [`crate::BuildError`].

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// A command to run: program, arguments, working directory, extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr, unmodified.
    pub fn diagnostics(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, _) => self.stderr.clone(),
            (false, true) => self.stdout.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Runs external processes to completion.
///
/// Implementations return `Err` only when the process could not be started;
/// a process that ran and failed is an `Ok` output with a non-zero code.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput>;
}

/// [`ProcessRunner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        debug!(command = %invocation, cwd = ?invocation.cwd, "spawning process");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }

        let output = cmd.output()?;
        let result = ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(command = %invocation, code = ?result.code, "process exited");
        Ok(result)
    }
}

/// Formats a spawn failure the way the build errors present it.
pub(crate) fn spawn_failure(invocation: &Invocation, err: &io::Error) -> String {
    format!(
        "Failed to start `{}`: {}\n\nEnsure the tool is installed and available on PATH.",
        invocation, err
    )
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fake runner shared by task tests.

    use super::*;
    use std::sync::{Arc, Mutex};

    type Responder = Box<dyn Fn(&Invocation) -> io::Result<ProcessOutput> + Send + Sync>;

    /// Records every invocation and answers with a scripted response.
    #[derive(Clone)]
    pub struct FakeRunner {
        pub calls: Arc<Mutex<Vec<Invocation>>>,
        respond: Arc<Responder>,
    }

    impl FakeRunner {
        pub fn succeeding() -> Self {
            Self::with(|_| {
                Ok(ProcessOutput {
                    code: Some(0),
                    ..Default::default()
                })
            })
        }

        pub fn with(
            respond: impl Fn(&Invocation) -> io::Result<ProcessOutput> + Send + Sync + 'static,
        ) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                respond: Arc::new(Box::new(respond)),
            }
        }

        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
            self.calls.lock().unwrap().push(invocation.clone());
            (self.respond)(invocation)
        }
    }
}
