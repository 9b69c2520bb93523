//! # shellpack
//!
//! Command-line tool for packaging a web application into native iOS and
//! Android apps.
//!
//! ## Overview
//!
//! `shellpack build` runs the web bundler, then the native build tool, with
//! user hook scripts before and after:
//!
//! ```bash
//! # Debug build for the default platform (iOS), targeting an emulator
//! shellpack build
//!
//! # Signed Android release for a connected device
//! shellpack build --platform android --release --device \
//!     --build-config build.json \
//!     --platform-opt android.keystore=release.keystore
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `build` | Bundle the web app and package it for one platform |
//! | `init` | Write a starter `shellpack.toml` |
//! | `platforms` | List platforms installed in the native project |
//!
//! ## Configuration
//!
//! Settings are read from `shellpack.toml` (see [`config`]). CLI flags
//! override the file.
//!
//! ## Logging
//!
//! Progress is logged through `tracing`. Set `RUST_LOG` to adjust, or pass
//! `--verbose` for debug output including every external command.
//! `--verbose` takes precedence over `RUST_LOG`.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use shellpack_core::process::{ProcessRunner, SystemRunner};
use shellpack_core::tasks::{
    HookScripts, HookTask, InstalledPlatforms, NativePackageTask, WebBundleTask,
};
use shellpack_core::{
    BuildCommand, BuildRequest, BuildTasks, EventLog, FixedDefault, NoopAnalytics, Platform,
    PlatformOptions,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod config;

use config::{CONFIG_FILE_NAME, ConfigResolver, ShellpackConfig};

/// Packages a web app bundle into native iOS and Android apps.
#[derive(Parser, Debug)]
#[command(name = "shellpack", author, version, about = "Hybrid mobile app build orchestrator", long_about = None)]
pub struct Cli {
    /// Enable debug logging, including every external command. Overrides RUST_LOG.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bundle the web app and build the native package.
    Build(BuildArgs),
    /// Write a starter shellpack.toml.
    Init {
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        output: PathBuf,
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
    /// List platforms installed in the native project.
    Platforms {
        #[arg(long, help = "Optional path to config file")]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct BuildArgs {
    #[arg(long, value_enum, help = "Target platform (defaults to build.default_platform, then ios)")]
    platform: Option<PlatformArg>,
    #[arg(long, help = "Build a release package")]
    release: bool,
    #[arg(long, help = "Build for a physical device instead of an emulator")]
    device: bool,
    #[arg(long, help = "Signing/build config file passed to the native tool")]
    build_config: Option<PathBuf>,
    #[arg(long, help = "Web bundler environment (overrides web.environment)")]
    environment: Option<String>,
    #[arg(
        long = "platform-opt",
        value_name = "PLATFORM.KEY=VALUE",
        help = "Platform-specific native option, e.g. ios.codeSignIdentity=\"iPhone Developer\""
    )]
    platform_opts: Vec<String>,
    #[arg(long, help = "Optional path to config file")]
    config: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
#[clap(rename_all = "lowercase")]
enum PlatformArg {
    Ios,
    Android,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Ios => Platform::Ios,
            PlatformArg::Android => Platform::Android,
        }
    }
}

/// Parses the CLI, runs the selected command, and returns its result.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Build(args) => cmd_build(args),
        Command::Init { output, force } => cmd_init(&output, force),
        Command::Platforms { config } => cmd_platforms(config.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .without_time()
        .with_target(false)
        .init();
}

fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// A configured build, ready to run.
struct BuildPlan {
    command: BuildCommand,
    request: BuildRequest,
    root: PathBuf,
    environment: String,
}

/// Merges CLI flags with the config file into a request and a wired command.
///
/// A relative `--build-config` resolves against `cwd`, a relative
/// `build.build_config` against the project root. The native tool runs
/// inside the native directory, so it must receive an absolute path.
fn plan_build(
    args: &BuildArgs,
    resolver: &ConfigResolver,
    cwd: &Path,
    runner: Arc<dyn ProcessRunner>,
) -> Result<BuildPlan> {
    let root = resolver.project_root(cwd);
    let config = &resolver.config;

    let build_config = match &args.build_config {
        Some(path) => Some(cwd.join(path)),
        None => config.build.build_config.as_ref().map(|path| root.join(path)),
    };
    let cli_options = parse_platform_opts(&args.platform_opts)?;
    let request = BuildRequest {
        platform: args.platform.map(Into::into),
        release: Some(args.release),
        device: Some(args.device),
        build_config,
        platform_options: resolver.platform_options(cli_options)?,
    };
    let environment = resolver.resolve(
        args.environment.clone(),
        |c| Some(c.web.environment.clone()),
        "development".to_string(),
    );

    let default_platform = config.default_platform()?.unwrap_or(Platform::Ios);
    let command = BuildCommand::new(
        config.project.clone(),
        production_tasks(&root, config, &environment, runner),
    )
    .default_platform(FixedDefault(default_platform));
    let command = match &config.build.analytics_log {
        Some(path) => command.analytics(EventLog::new(root.join(path))),
        None => command.analytics(NoopAnalytics),
    };

    Ok(BuildPlan {
        command,
        request,
        root,
        environment,
    })
}

fn cmd_build(args: BuildArgs) -> Result<()> {
    let resolver = ConfigResolver::load(args.config.as_deref())?;
    if let Some(path) = &resolver.config_path {
        println!("Using config file: {:?}", path);
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let mut plan = plan_build(&args, &resolver, &cwd, Arc::new(SystemRunner))?;

    info!(root = ?plan.root, environment = %plan.environment, "building project");
    let report = plan.command.run(&plan.request)?;

    println!("\n✓ {} build completed!", report.platform);
    println!(
        "  Profile: {}",
        if report.options.is_release { "release" } else { "debug" }
    );
    println!(
        "  Target: {}",
        if report.options.is_emulator { "emulator" } else { "device" }
    );
    if let Some(path) = &report.options.build_config {
        println!("  Build config: {:?}", path);
    }
    Ok(())
}

fn production_tasks(
    root: &Path,
    config: &ShellpackConfig,
    environment: &str,
    runner: Arc<dyn ProcessRunner>,
) -> BuildTasks {
    let native_dir = root.join(&config.project.native_dir);

    let mut hooks = HookScripts::new(root);
    for (name, scripts) in &config.hooks {
        hooks = hooks.register(name.clone(), scripts.clone());
    }
    if let Some(dir) = &config.project.hooks_dir {
        hooks = hooks.hooks_dir(dir);
    }

    BuildTasks {
        validate: Box::new(InstalledPlatforms::new(&native_dir)),
        hooks: Box::new(HookTask::new(hooks, runner.clone(), root)),
        web: Box::new(
            WebBundleTask::new(runner.clone(), root, native_dir.join("www"))
                .command(config.web.command.clone(), config.web.args.clone())
                .environment(environment),
        ),
        native: Box::new(
            NativePackageTask::new(runner, &native_dir).command(config.native.command.clone()),
        ),
    }
}

/// Parses repeated `--platform-opt PLATFORM.KEY=VALUE` flags.
///
/// Values that parse as JSON (`true`, `42`, `"quoted"`) keep their type;
/// anything else is passed as a plain string.
fn parse_platform_opts(raw: &[String]) -> Result<BTreeMap<Platform, PlatformOptions>> {
    let mut out: BTreeMap<Platform, PlatformOptions> = BTreeMap::new();
    for entry in raw {
        let Some((scoped_key, value)) = entry.split_once('=') else {
            bail!("Invalid --platform-opt '{}': expected PLATFORM.KEY=VALUE", entry);
        };
        let Some((platform, key)) = scoped_key.split_once('.') else {
            bail!("Invalid --platform-opt '{}': expected PLATFORM.KEY=VALUE", entry);
        };
        if key.is_empty() {
            bail!("Invalid --platform-opt '{}': option name is empty", entry);
        }
        let platform: Platform = platform
            .parse()
            .with_context(|| format!("Invalid --platform-opt '{}'", entry))?;
        let value = serde_json::from_str::<Value>(value)
            .unwrap_or_else(|_| Value::String(value.to_string()));
        out.entry(platform)
            .or_default()
            .insert(key.to_string(), value);
    }
    Ok(out)
}

fn cmd_init(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(
            "{:?} already exists. Pass --force to overwrite it.",
            output
        );
    }
    std::fs::write(output, ShellpackConfig::generate_starter_toml())
        .with_context(|| format!("Failed to write config file: {:?}", output))?;
    println!("Wrote {:?}", output);
    Ok(())
}

fn cmd_platforms(config_path: Option<&Path>) -> Result<()> {
    let resolver = ConfigResolver::load(config_path)?;
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let native_dir = resolver
        .project_root(&cwd)
        .join(&resolver.config.project.native_dir);

    let installed = InstalledPlatforms::new(&native_dir).installed()?;
    println!("Platforms in {:?}:", native_dir);
    for (platform, present) in platform_status(&installed) {
        let status = if present { "installed" } else { "not installed" };
        println!("  - {} ({})", platform, status);
    }
    Ok(())
}

fn platform_status(installed: &[String]) -> Vec<(Platform, bool)> {
    Platform::ALL
        .iter()
        .map(|platform| {
            let present = installed.iter().any(|name| name == platform.as_str());
            (*platform, present)
        })
        .collect()
}
