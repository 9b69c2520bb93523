//! Build pipeline tasks.
//!
//! Each task type is a trait so the orchestrator can be driven by fakes in
//! tests and by the process-backed implementations in production:
//!
//! | Trait | Production implementation | External tool |
//! |-------|---------------------------|---------------|
//! | [`ValidatePlatform`] | [`InstalledPlatforms`] | native project layout |
//! | [`RunHook`] | [`HookTask`] | user hook scripts |
//! | [`BuildWeb`] | [`WebBundleTask`] | web bundler (`ember build`) |
//! | [`BuildNative`] | [`NativePackageTask`] | native tool (`cordova build`) |
//!
//! Tasks hold no state between invocations.

use crate::error::BuildError;
use crate::types::{Hook, Platform, ResolvedBuildOptions};

pub mod hook;
pub mod native;
pub mod validate;
pub mod web;

pub use hook::{HookRegistry, HookScripts, HookTask};
pub use native::NativePackageTask;
pub use validate::InstalledPlatforms;
pub use web::WebBundleTask;

/// Checks that a platform has been added to the native project.
pub trait ValidatePlatform {
    fn run(&self, platform: Platform) -> Result<(), BuildError>;
}

/// Runs every script registered for a lifecycle hook.
pub trait RunHook {
    fn run(&self, hook: Hook) -> Result<(), BuildError>;
}

/// Produces the web assets embedded in the native app.
pub trait BuildWeb {
    fn run(&self) -> Result<(), BuildError>;
}

/// Packages the web assets into a native app for one platform.
pub trait BuildNative {
    /// Returns the platform that was built.
    fn run(
        &self,
        platform: Platform,
        options: &ResolvedBuildOptions,
    ) -> Result<Platform, BuildError>;
}
