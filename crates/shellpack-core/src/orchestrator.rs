//! The `build` command: option derivation, pre-flight guard, and the
//! sequential task pipeline.
//!
//! ```text
//! Idle -> GuardChecked -> Validated -> BeforeHookRun -> WebBuilt
//!      -> NativeBuilt -> AfterHookRun -> Done
//! ```
//!
//! Any transition may fail into [`PipelineState::Failed`], after which no
//! further task runs and the error is returned to the caller.

use tracing::{info, warn};

use crate::analytics::{Analytics, BuildEvent, NoopAnalytics, Outcome};
use crate::error::BuildError;
use crate::project::{AppConfig, ProjectConfig};
use crate::tasks::{BuildNative, BuildWeb, RunHook, ValidatePlatform};
use crate::types::{BuildRequest, Hook, Platform, ResolvedBuildOptions, Stage};

/// Chooses the platform when the request does not name one.
pub trait DefaultPlatform {
    fn resolve(&self) -> Platform;
}

/// Always resolves to the same platform. Defaults to iOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDefault(pub Platform);

impl Default for FixedDefault {
    fn default() -> Self {
        FixedDefault(Platform::Ios)
    }
}

impl DefaultPlatform for FixedDefault {
    fn resolve(&self) -> Platform {
        self.0
    }
}

/// The task instances a single build runs.
pub struct BuildTasks {
    pub validate: Box<dyn ValidatePlatform>,
    pub hooks: Box<dyn RunHook>,
    pub web: Box<dyn BuildWeb>,
    pub native: Box<dyn BuildNative>,
}

/// Where the pipeline stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// The last stage completed successfully.
    Reached(Stage),
    /// The transition into `stage` failed. Terminal.
    Failed { stage: Stage, reason: String },
}

/// Result of a completed build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    /// Platform reported by the native build task.
    pub platform: Platform,
    pub options: ResolvedBuildOptions,
}

/// Orchestrates one `build` invocation.
///
/// # Example
///
/// ```ignore
/// use shellpack_core::{BuildCommand, BuildRequest, BuildTasks, StaticProjectConfig, AppConfig};
///
/// let mut build = BuildCommand::new(StaticProjectConfig(AppConfig::new("hash")), tasks);
/// let report = build.run(&BuildRequest::default())?;
/// println!("built {}", report.platform);
/// ```
pub struct BuildCommand {
    project: Box<dyn ProjectConfig>,
    tasks: BuildTasks,
    default_platform: Box<dyn DefaultPlatform>,
    analytics: Box<dyn Analytics>,
    state: PipelineState,
}

impl BuildCommand {
    pub fn new(project: impl ProjectConfig + 'static, tasks: BuildTasks) -> Self {
        Self {
            project: Box::new(project),
            tasks,
            default_platform: Box::new(FixedDefault::default()),
            analytics: Box::new(NoopAnalytics),
            state: PipelineState::Reached(Stage::Idle),
        }
    }

    /// Sets the policy used when no platform is requested.
    pub fn default_platform(mut self, policy: impl DefaultPlatform + 'static) -> Self {
        self.default_platform = Box::new(policy);
        self
    }

    pub fn analytics(mut self, analytics: impl Analytics + 'static) -> Self {
        self.analytics = Box::new(analytics);
        self
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Derives the options the native build receives.
    ///
    /// Only `request.platform_options[platform]` survives; options filed
    /// under any other platform are discarded.
    pub fn derive(&self, request: &BuildRequest) -> ResolvedBuildOptions {
        let platform = request
            .platform
            .unwrap_or_else(|| self.default_platform.resolve());

        ResolvedBuildOptions {
            platform,
            is_release: request.release.unwrap_or(false),
            is_emulator: !request.device.unwrap_or(false),
            build_config: request.build_config.clone(),
            platform_options: request
                .platform_options
                .get(&platform)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Runs the full pipeline.
    ///
    /// Stops at the first failing stage and returns its error unchanged.
    pub fn run(&mut self, request: &BuildRequest) -> Result<BuildReport, BuildError> {
        self.state = PipelineState::Reached(Stage::Idle);

        let guard = self.project.config().and_then(|config| check_location(&config));
        self.advance(Stage::GuardChecked, guard)?;

        let options = self.derive(request);
        let platform = options.platform;
        info!(
            %platform,
            release = options.is_release,
            emulator = options.is_emulator,
            build_config = ?options.build_config,
            "starting build"
        );

        let result = self.run_tasks(&options);
        self.report(platform, &result);
        let built = result?;

        self.state = PipelineState::Reached(Stage::Done);
        info!(platform = %built, "build complete");
        Ok(BuildReport {
            platform: built,
            options,
        })
    }

    fn run_tasks(&mut self, options: &ResolvedBuildOptions) -> Result<Platform, BuildError> {
        let platform = options.platform;

        let validated = self.tasks.validate.run(platform);
        self.advance(Stage::Validated, validated)?;

        let before = self.tasks.hooks.run(Hook::BeforeBuild);
        self.advance(Stage::BeforeHookRun, before)?;

        let web = self.tasks.web.run();
        self.advance(Stage::WebBuilt, web)?;

        let native = self.tasks.native.run(platform, options);
        let built = self.advance(Stage::NativeBuilt, native)?;

        let after = self.tasks.hooks.run(Hook::AfterBuild);
        self.advance(Stage::AfterHookRun, after)?;

        Ok(built)
    }

    /// Records the outcome of the transition into `stage`.
    fn advance<T>(&mut self, stage: Stage, result: Result<T, BuildError>) -> Result<T, BuildError> {
        match result {
            Ok(value) => {
                info!(%stage, "stage complete");
                self.state = PipelineState::Reached(stage);
                Ok(value)
            }
            Err(e) => {
                self.state = PipelineState::Failed {
                    stage,
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    fn report(&self, platform: Platform, result: &Result<Platform, BuildError>) {
        let event = match (result, &self.state) {
            (Ok(built), _) => BuildEvent {
                platform: *built,
                outcome: Outcome::Success,
                stage: None,
            },
            (Err(_), PipelineState::Failed { stage, .. }) => BuildEvent {
                platform,
                outcome: Outcome::Failure,
                stage: Some(*stage),
            },
            (Err(_), PipelineState::Reached(_)) => BuildEvent {
                platform,
                outcome: Outcome::Failure,
                stage: None,
            },
        };
        if let Err(e) = self.analytics.track(&event) {
            warn!(error = %e, "failed to record build analytics");
        }
    }
}

fn check_location(config: &AppConfig) -> Result<(), BuildError> {
    if config.uses_hash_routing() {
        return Ok(());
    }
    Err(BuildError::InvalidLocationMode {
        location_type: config.location_type.clone(),
    })
}
