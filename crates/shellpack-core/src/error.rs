//! Error types for shellpack-core.
//!
//! Every variant is fatal to the build pipeline. Diagnostics coming from
//! external tools (bundler, native build tool, hook scripts) are carried
//! verbatim so the user sees exactly what the tool printed.

/// Error conditions raised while deriving a build or running its stages.
///
/// # Example
///
/// ```
/// use shellpack_core::BuildError;
///
/// let err = BuildError::PlatformNotInstalled {
///     platform: "android".to_string(),
///     installed: vec!["ios".to_string()],
/// };
/// assert!(err.to_string().contains("android"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The web app does not use fragment-based routing.
    ///
    /// The native shell serves assets from the local filesystem, so any
    /// routing mode other than `hash` resolves client-side routes against a
    /// `file://` root and breaks navigation.
    #[error(
        "locationType is '{location_type}', but packaged apps require 'hash'.\n\n\
         The native shell loads the app from the local filesystem, where only\n\
         fragment-based routes resolve. Set `locationType: 'hash'` in the web\n\
         app's environment config (and `project.location_type` in shellpack.toml)."
    )]
    InvalidLocationMode {
        /// The routing mode the project is configured with.
        location_type: String,
    },

    /// The requested platform has not been added to the native project.
    #[error(
        "platform '{platform}' is not installed. Installed platforms: {installed:?}\n\n\
         Add it with the native tool first, e.g. `cordova platform add {platform}`"
    )]
    PlatformNotInstalled {
        platform: String,
        installed: Vec<String>,
    },

    /// A lifecycle hook script exited unsuccessfully.
    #[error("hook '{hook}' failed: {script} exited with {}\n\n{output}", describe_code(.code))]
    HookFailed {
        hook: String,
        script: String,
        code: Option<i32>,
        output: String,
    },

    /// The web bundler failed.
    #[error("web bundle build failed (exit {})\n\n{diagnostics}", describe_code(.code))]
    BundleBuildFailed {
        code: Option<i32>,
        diagnostics: String,
    },

    /// The native build tool failed.
    #[error("native build for {platform} failed (exit {})\n\n{diagnostics}", describe_code(.code))]
    NativeBuildFailed {
        platform: String,
        code: Option<i32>,
        diagnostics: String,
    },

    /// A platform name that shellpack does not know about.
    #[error("unknown platform '{0}'. Supported platforms: ios, android")]
    UnknownPlatform(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal or failed to start)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_location_mode_explains_the_fix() {
        let err = BuildError::InvalidLocationMode {
            location_type: "auto".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'auto'"));
        assert!(msg.contains("locationType: 'hash'"));
    }

    #[test]
    fn hook_failure_forwards_output() {
        let err = BuildError::HookFailed {
            hook: "beforeBuild".into(),
            script: "hooks/prepare.sh".into(),
            code: Some(3),
            output: "missing env file".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("hooks/prepare.sh"));
        assert!(msg.contains("status 3"));
        assert!(msg.ends_with("missing env file"));
    }

    #[test]
    fn signal_exit_is_described() {
        let err = BuildError::BundleBuildFailed {
            code: None,
            diagnostics: String::new(),
        };
        assert!(err.to_string().contains("no status"));
    }
}
