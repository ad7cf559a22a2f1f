//! Plugin lifecycle pipeline.
//!
//! Installs the vendor CLI, acquires a plugin source tree, packages it
//! into a `.difypkg` artifact and optionally wires the plugin into a
//! running Dify instance for remote debugging.

pub mod debug;

use std::path::{Path, PathBuf};

use crate::acquire::PluginSource;
use crate::cli::{OutputManager, PluginArgs, SourceKind};
use crate::config_env;
use crate::error::{OpsError, Result};
use crate::install;
use crate::probe::{self, EnvironmentProfile, MIN_PYTHON_VERSION};
use crate::process::ProcessRunner;

use debug::CredentialPrompt;

/// File extension of packaged plugin artifacts.
pub const PACKAGE_EXTENSION: &str = "difypkg";

/// Runs the plugin workflow. Returns the process exit code.
///
/// The environment profile is constructed once by the caller and passed
/// through.
pub async fn run<R: ProcessRunner, P: CredentialPrompt>(
    args: &PluginArgs,
    profile: &EnvironmentProfile,
    runner: &R,
    prompt: &mut P,
    output: &OutputManager,
) -> Result<i32> {
    output.banner("Dify plugin installer");

    check_python_runtime(runner, output).await?;

    output.step(1, "Checking and installing the Dify CLI");
    if !install::ensure_dify_cli(profile, runner, output).await? {
        return Err(OpsError::precondition("the dify CLI is not available"));
    }

    let source = match args.kind {
        SourceKind::Github => PluginSource::github(&args.source),
        SourceKind::Local => PluginSource::Local {
            path: PathBuf::from(&args.source),
        },
        SourceKind::Marketplace => PluginSource::Marketplace {
            name: args.source.clone(),
        },
    };

    if let PluginSource::Marketplace { name } = &source {
        output.step(2, &format!("Installing plugin from the Marketplace: {}", name));
        print_marketplace_instructions(output);
        return Ok(0);
    }

    output.step(2, &format!("Fetching plugin source: {}", args.source));
    let clone_base = std::env::temp_dir();
    let Some(plugin_dir) = source.resolve(&clone_base, runner, output).await? else {
        output.error("Failed to obtain the plugin directory");
        return Ok(1);
    };

    output.step(3, "Packaging plugin");
    let Some(artifact) = package_plugin(&plugin_dir, runner, output).await? else {
        return Ok(1);
    };

    if args.package_only {
        output.success(&format!("Plugin packaged: {}", artifact.display()));
        return Ok(0);
    }

    if let Some(dify_dir) = &args.dify_dir {
        output.step(4, "Configuring Dify for plugins");
        config_env::disable_signature_verification(dify_dir, output).await?;
    }

    if args.debug {
        output.step(5, "Collecting plugin debug credentials");
        debug::print_credential_instructions(output);
        let credentials = prompt.read_credentials()?;
        config_env::write_debug_env(&plugin_dir, &credentials).await?;
        output.success(".env configured");

        output.step(6, "Running plugin debug session");
        debug::run_debug_session(&plugin_dir, runner, output).await?;
    } else {
        print_install_instructions(&artifact, output);
    }

    Ok(0)
}

/// Packages the plugin directory with the vendor CLI.
///
/// The CLI runs with the parent directory as working context, so the
/// artifact lands as a sibling of the source tree. A non-zero exit or a
/// missing artifact is a reported failure; the caller must not treat a
/// partial artifact as success.
pub async fn package_plugin<R: ProcessRunner>(
    plugin_dir: &Path,
    runner: &R,
    output: &OutputManager,
) -> Result<Option<PathBuf>> {
    config_env::ensure_plugin_env(plugin_dir, output).await?;

    let name = plugin_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            OpsError::precondition(format!(
                "plugin directory has no usable name: {}",
                plugin_dir.display()
            ))
        })?;
    let parent = plugin_dir.parent().ok_or_else(|| {
        OpsError::precondition(format!(
            "plugin directory has no parent: {}",
            plugin_dir.display()
        ))
    })?;

    let target = format!("./{}", name);
    let result = runner
        .run_captured("dify", &["plugin", "package", &target], Some(parent))
        .await?;

    if result.success {
        let artifact = parent.join(format!("{}.{}", name, PACKAGE_EXTENSION));
        if artifact.exists() {
            output.success("Plugin packaged successfully");
            output.success(&format!("Package location: {}", artifact.display()));
            return Ok(Some(artifact));
        }
    }

    output.error("Plugin packaging failed");
    if !result.stderr.is_empty() {
        output.error(result.stderr.trim());
    }
    Ok(None)
}

/// Gates the workflow on a Python runtime recent enough for plugin
/// development (the plugin entry point and its tooling require it).
async fn check_python_runtime<R: ProcessRunner>(
    runner: &R,
    output: &OutputManager,
) -> Result<()> {
    let result = runner.run_captured("python3", &["--version"], None).await?;
    if !result.success {
        output.error("Python 3 runtime not found");
        return Err(OpsError::precondition("python3 is not available"));
    }

    let reported = if result.stdout.trim().is_empty() {
        result.stderr.clone()
    } else {
        result.stdout.clone()
    };
    match probe::parse_python_version(&reported) {
        Some(version) if version >= MIN_PYTHON_VERSION => {
            output.success(&format!("Python version: {}", reported.trim()));
            Ok(())
        }
        Some((major, minor)) => {
            output.error(&format!(
                "Python version too old ({}.{}), 3.12 or newer is required",
                major, minor
            ));
            Err(OpsError::precondition(format!(
                "python {}.{} is older than the required 3.12",
                major, minor
            )))
        }
        None => {
            output.error(&format!(
                "Could not parse the Python version from: {}",
                reported.trim()
            ));
            Err(OpsError::precondition("unrecognized python3 version output"))
        }
    }
}

fn print_marketplace_instructions(output: &OutputManager) {
    output.plain("\nTo install the plugin through the Dify console:");
    output.plain("1. Log in to the Dify console");
    output.plain("2. Click the 'Plugins' icon in the top right corner");
    output.plain("3. Search the Marketplace for the plugin");
    output.plain("4. Click install");
    output.warn("Marketplace plugins are installed through the Dify web console");
}

fn print_install_instructions(artifact: &Path, output: &OutputManager) {
    output.plain("\nPlugin packaging complete!");
    output.plain("Install the plugin as follows:");
    output.plain("1. Log in to the Dify console");
    output.plain("2. Click the 'Plugins' icon in the top right corner");
    output.plain("3. Click 'Install plugin'");
    output.plain(&format!("4. Select the package: {}", artifact.display()));
}
