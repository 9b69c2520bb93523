//! Build orchestration for hybrid mobile apps.
//!
//! `shellpack-core` packages a web application bundle into a native iOS or
//! Android app by sequencing three external toolchains: a web bundler, a
//! native build tool, and user-defined lifecycle hook scripts. It does not
//! compile anything itself.
//!
//! # Pipeline
//!
//! A [`BuildCommand`] derives [`ResolvedBuildOptions`] from a raw
//! [`BuildRequest`], checks that the web app uses `hash` routing, then runs:
//!
//! 1. **Validate platform** - the platform must be installed in the native project
//! 2. **`beforeBuild` hook** - user scripts, in registration order
//! 3. **Web bundle build** - the bundler writes assets into the native project
//! 4. **Native package build** - the native tool builds the app for one platform
//! 5. **`afterBuild` hook**
//!
//! The first failure stops the pipeline and is returned unchanged.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use shellpack_core::process::SystemRunner;
//! use shellpack_core::tasks::{HookScripts, HookTask, InstalledPlatforms, NativePackageTask, WebBundleTask};
//! use shellpack_core::{AppConfig, BuildCommand, BuildRequest, BuildTasks, Platform, StaticProjectConfig};
//!
//! let runner = Arc::new(SystemRunner);
//! let tasks = BuildTasks {
//!     validate: Box::new(InstalledPlatforms::new("cordova")),
//!     hooks: Box::new(HookTask::new(HookScripts::new("."), runner.clone(), ".")),
//!     web: Box::new(WebBundleTask::new(runner.clone(), ".", "cordova/www")),
//!     native: Box::new(NativePackageTask::new(runner, "cordova")),
//! };
//!
//! let mut build = BuildCommand::new(StaticProjectConfig(AppConfig::new("hash")), tasks);
//! let report = build.run(&BuildRequest::default().platform(Platform::Android).release(true))?;
//! # Ok::<(), shellpack_core::BuildError>(())
//! ```

pub mod analytics;
pub mod error;
pub mod orchestrator;
pub mod process;
pub mod project;
pub mod tasks;
pub mod types;

pub use analytics::{Analytics, BuildEvent, EventLog, NoopAnalytics, Outcome};
pub use error::BuildError;
pub use orchestrator::{
    BuildCommand, BuildReport, BuildTasks, DefaultPlatform, FixedDefault, PipelineState,
};
pub use project::{AppConfig, LOCATION_TYPE_HASH, ProjectConfig, StaticProjectConfig};
pub use types::{
    BuildRequest, Hook, OptionValue, Platform, PlatformOptions, ResolvedBuildOptions, Stage,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
