//! Environment file materialization.
//!
//! All of the key=value artifacts the pipelines touch: the platform
//! `.env` (copied from its template once, never clobbered), the
//! middleware feature flag (appended at most once) and the plugin debug
//! `.env` (regenerated on every debug run, since it carries transient
//! session credentials).

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::acquire::DOCKER_SUBDIR;
use crate::cli::OutputManager;
use crate::error::{OpsError, Result};

/// Marker key for the plugin signature verification flag.
const SIGNATURE_MARKER: &str = "force_verifying_signature";

/// Fixed remote-debug port of the plugin daemon.
pub const REMOTE_DEBUG_PORT: u16 = 5003;

/// Credentials for a remote plugin debug session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugCredentials {
    /// Debug API key from the Dify console
    pub api_key: String,
    /// Host address of the running instance
    pub host: String,
}

/// Materializes `<docker_dir>/.env` from `.env.example`.
///
/// The template being absent is fatal; an existing `.env` is left
/// byte-for-byte untouched.
pub async fn materialize_env(docker_dir: &Path, output: &OutputManager) -> Result<PathBuf> {
    let env_example = docker_dir.join(".env.example");
    let env_file = docker_dir.join(".env");

    if !env_example.exists() {
        output.error(&format!(".env.example not found: {}", env_example.display()));
        return Err(OpsError::MissingFile { path: env_example });
    }

    if env_file.exists() {
        output.warn(".env already exists, skipping creation");
    } else {
        fs::copy(&env_example, &env_file).await?;
        output.success(".env created");
    }

    Ok(env_file)
}

/// Appends the disable-signature-verification directive to
/// `<dify_dir>/docker/middleware.env` unless the marker is already set.
///
/// A missing middleware file is a skip with warning, not an abort.
pub async fn disable_signature_verification(
    dify_dir: &Path,
    output: &OutputManager,
) -> Result<bool> {
    let middleware_env = dify_dir.join(DOCKER_SUBDIR).join("middleware.env");

    if !middleware_env.exists() {
        output.warn(&format!(
            "middleware.env not found: {}",
            middleware_env.display()
        ));
        return Ok(false);
    }

    let content = fs::read_to_string(&middleware_env).await?;
    if !content.contains(SIGNATURE_MARKER) {
        let mut appended = content;
        if !appended.is_empty() && !appended.ends_with('\n') {
            appended.push('\n');
        }
        appended.push_str("\n# Disable plugin signature verification (development)\n");
        appended.push_str("force_verifying_signature=false\n");
        fs::write(&middleware_env, appended).await?;
        output.success("Plugin signature verification disabled");
    }

    Ok(true)
}

/// Copies a plugin's own `.env.example` to `.env` before packaging, when
/// the example exists and `.env` does not. Both being absent is fine.
pub async fn ensure_plugin_env(plugin_dir: &Path, output: &OutputManager) -> Result<()> {
    let env_file = plugin_dir.join(".env");
    if env_file.exists() {
        return Ok(());
    }

    let env_example = plugin_dir.join(".env.example");
    if env_example.exists() {
        fs::copy(&env_example, &env_file).await?;
        output.success(".env created");
    }
    Ok(())
}

/// Writes the plugin's remote-debug `.env`.
///
/// Unlike the other environment files this one is overwritten on every
/// debug run: it encodes transient session credentials.
pub async fn write_debug_env(plugin_dir: &Path, credentials: &DebugCredentials) -> Result<()> {
    let env_file = plugin_dir.join(".env");
    let content = format!(
        "INSTALL_METHOD=remote\n\
         REMOTE_INSTALL_HOST={}\n\
         REMOTE_INSTALL_PORT={}\n\
         REMOTE_INSTALL_KEY={}\n",
        credentials.host, REMOTE_DEBUG_PORT, credentials.api_key
    );
    fs::write(&env_file, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_template_is_fatal() {
        let docker_dir = tempfile::tempdir().unwrap();
        let output = OutputManager::quiet();

        let result = materialize_env(docker_dir.path(), &output).await;
        assert!(matches!(result, Err(OpsError::MissingFile { .. })));
    }

    #[tokio::test]
    async fn env_is_created_from_template_once() {
        let docker_dir = tempfile::tempdir().unwrap();
        std::fs::write(docker_dir.path().join(".env.example"), "KEY=value\n").unwrap();
        let output = OutputManager::quiet();

        let env_file = materialize_env(docker_dir.path(), &output).await.unwrap();
        assert_eq!(std::fs::read_to_string(&env_file).unwrap(), "KEY=value\n");
    }

    #[tokio::test]
    async fn existing_env_is_left_untouched() {
        let docker_dir = tempfile::tempdir().unwrap();
        std::fs::write(docker_dir.path().join(".env.example"), "KEY=template\n").unwrap();
        let env_file = docker_dir.path().join(".env");
        std::fs::write(&env_file, "KEY=user-edited\n").unwrap();
        let output = OutputManager::quiet();

        materialize_env(docker_dir.path(), &output).await.unwrap();
        materialize_env(docker_dir.path(), &output).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&env_file).unwrap(),
            "KEY=user-edited\n"
        );
    }

    #[tokio::test]
    async fn signature_flag_is_appended_exactly_once() {
        let dify_dir = tempfile::tempdir().unwrap();
        let docker_dir = dify_dir.path().join(DOCKER_SUBDIR);
        std::fs::create_dir(&docker_dir).unwrap();
        let middleware = docker_dir.join("middleware.env");
        std::fs::write(&middleware, "EXISTING=1\n").unwrap();
        let output = OutputManager::quiet();

        for _ in 0..3 {
            let configured = disable_signature_verification(dify_dir.path(), &output)
                .await
                .unwrap();
            assert!(configured);
        }

        let content = std::fs::read_to_string(&middleware).unwrap();
        let markers = content
            .lines()
            .filter(|line| line.starts_with(SIGNATURE_MARKER))
            .count();
        assert_eq!(markers, 1);
        assert!(content.contains("force_verifying_signature=false"));
        assert!(content.starts_with("EXISTING=1\n"));
    }

    #[tokio::test]
    async fn preset_signature_flag_is_not_duplicated() {
        let dify_dir = tempfile::tempdir().unwrap();
        let docker_dir = dify_dir.path().join(DOCKER_SUBDIR);
        std::fs::create_dir(&docker_dir).unwrap();
        let middleware = docker_dir.join("middleware.env");
        std::fs::write(&middleware, "force_verifying_signature=true\n").unwrap();
        let output = OutputManager::quiet();

        disable_signature_verification(dify_dir.path(), &output)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&middleware).unwrap(),
            "force_verifying_signature=true\n"
        );
    }

    #[tokio::test]
    async fn missing_middleware_file_is_a_skip() {
        let dify_dir = tempfile::tempdir().unwrap();
        let output = OutputManager::quiet();

        let configured = disable_signature_verification(dify_dir.path(), &output)
            .await
            .unwrap();
        assert!(!configured);
    }

    #[tokio::test]
    async fn plugin_env_is_seeded_from_example() {
        let plugin_dir = tempfile::tempdir().unwrap();
        std::fs::write(plugin_dir.path().join(".env.example"), "A=1\n").unwrap();
        let output = OutputManager::quiet();

        ensure_plugin_env(plugin_dir.path(), &output).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(plugin_dir.path().join(".env")).unwrap(),
            "A=1\n"
        );
    }

    #[tokio::test]
    async fn debug_env_is_regenerated_every_time() {
        let plugin_dir = tempfile::tempdir().unwrap();
        let env_file = plugin_dir.path().join(".env");
        std::fs::write(&env_file, "LEFTOVER=1\n").unwrap();

        let credentials = DebugCredentials {
            api_key: "secret-key".to_string(),
            host: "dify.example.com".to_string(),
        };
        write_debug_env(plugin_dir.path(), &credentials).await.unwrap();

        let content = std::fs::read_to_string(&env_file).unwrap();
        assert_eq!(
            content,
            "INSTALL_METHOD=remote\n\
             REMOTE_INSTALL_HOST=dify.example.com\n\
             REMOTE_INSTALL_PORT=5003\n\
             REMOTE_INSTALL_KEY=secret-key\n"
        );
    }
}
