//! Source and artifact acquisition.
//!
//! Obtains the platform's deployment manifests (idempotent clone) and a
//! plugin's source tree (destructive-idempotent clone, or a local path
//! used in place).

use std::path::{Path, PathBuf};

use crate::cli::OutputManager;
use crate::error::Result;
use crate::process::ProcessRunner;

/// Upstream repository holding the Dify deployment manifests.
pub const DIFY_REPO_URL: &str = "https://github.com/langgenius/dify.git";

/// Subdirectory of the platform source tree with the compose manifests.
pub const DOCKER_SUBDIR: &str = "docker";

/// Clones the Dify platform source under `install_dir`.
///
/// Idempotent: an existing `<install_dir>/dify` is reused untouched.
pub async fn clone_platform_source<R: ProcessRunner>(
    install_dir: &Path,
    runner: &R,
    output: &OutputManager,
) -> Result<PathBuf> {
    let dify_dir = install_dir.join("dify");

    if dify_dir.exists() {
        output.warn("Dify directory already exists, skipping clone");
        return Ok(dify_dir);
    }

    let dest = dify_dir.to_string_lossy().to_string();
    runner
        .run_checked("git", &["clone", DIFY_REPO_URL, &dest], None)
        .await?;
    output.success("Dify source cloned");

    Ok(dify_dir)
}

/// Where a plugin's source tree comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginSource {
    /// A remote repository to clone
    Github {
        /// Full clone URL
        url: String,
    },
    /// A local directory used in place
    Local {
        /// Path as given on the command line
        path: PathBuf,
    },
    /// A catalog name installed through the Marketplace web console
    Marketplace {
        /// Plugin name in the catalog
        name: String,
    },
}

impl PluginSource {
    /// Builds a GitHub source, expanding a bare `owner/name` to a full URL.
    pub fn github(source: &str) -> Self {
        let url = if source.starts_with("http") {
            source.to_string()
        } else {
            format!("https://github.com/{}", source)
        };
        Self::Github { url }
    }

    /// Resolves the source to a readable plugin directory.
    ///
    /// Clone and validation failures are reported through `output` and
    /// returned as `None`; the caller must not proceed to packaging.
    /// Marketplace sources have no local directory and always yield `None`.
    pub async fn resolve<R: ProcessRunner>(
        &self,
        clone_base: &Path,
        runner: &R,
        output: &OutputManager,
    ) -> Result<Option<PathBuf>> {
        match self {
            Self::Github { url } => {
                let name = derive_repo_name(url);
                let plugin_dir = clone_base.join(name);

                // Clone fresh; a stale tree from an earlier run is removed,
                // not reused.
                if plugin_dir.exists() {
                    tokio::fs::remove_dir_all(&plugin_dir).await?;
                }

                let dest = plugin_dir.to_string_lossy().to_string();
                let clone = runner
                    .run_captured("git", &["clone", url, &dest], None)
                    .await?;
                if !clone.success {
                    output.error("Failed to clone repository");
                    if !clone.stderr.is_empty() {
                        output.error(clone.stderr.trim());
                    }
                    return Ok(None);
                }

                output.success(&format!("Plugin source downloaded to: {}", plugin_dir.display()));
                Ok(Some(plugin_dir))
            }
            Self::Local { path } => {
                if !path.exists() {
                    output.error(&format!("Path does not exist: {}", path.display()));
                    return Ok(None);
                }
                Ok(Some(path.canonicalize()?))
            }
            Self::Marketplace { .. } => Ok(None),
        }
    }
}

/// Derives a plugin package name from a repository locator: the final
/// path segment, with any `.git` suffix stripped.
pub fn derive_repo_name(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRunner;

    #[test]
    fn derives_name_from_git_url() {
        assert_eq!(
            derive_repo_name("https://github.com/acme/my-plugin.git"),
            "my-plugin"
        );
        assert_eq!(derive_repo_name("https://github.com/acme/my-plugin"), "my-plugin");
        assert_eq!(derive_repo_name("acme/my-plugin"), "my-plugin");
    }

    #[tokio::test]
    async fn existing_platform_source_is_reused() {
        let base = tempfile::tempdir().unwrap();
        let dify_dir = base.path().join("dify");
        std::fs::create_dir(&dify_dir).unwrap();
        let marker = dify_dir.join("README.md");
        std::fs::write(&marker, "existing checkout").unwrap();

        let runner = FakeRunner::new();
        let output = OutputManager::quiet();

        let resolved = clone_platform_source(base.path(), &runner, &output)
            .await
            .unwrap();

        assert_eq!(resolved, dify_dir);
        assert!(runner.calls().is_empty());
        assert_eq!(
            std::fs::read_to_string(&marker).unwrap(),
            "existing checkout"
        );
    }

    #[tokio::test]
    async fn fresh_platform_source_is_cloned() {
        let base = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new();
        let output = OutputManager::quiet();

        let resolved = clone_platform_source(base.path(), &runner, &output)
            .await
            .unwrap();

        assert_eq!(resolved, base.path().join("dify"));
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "git");
        assert_eq!(calls[0].args[0], "clone");
        assert_eq!(calls[0].args[1], DIFY_REPO_URL);
    }

    #[test]
    fn bare_owner_name_expands_to_github_url() {
        assert_eq!(
            PluginSource::github("acme/my-plugin"),
            PluginSource::Github {
                url: "https://github.com/acme/my-plugin".to_string()
            }
        );
        assert_eq!(
            PluginSource::github("https://github.com/acme/my-plugin.git"),
            PluginSource::Github {
                url: "https://github.com/acme/my-plugin.git".to_string()
            }
        );
    }

    #[tokio::test]
    async fn github_resolve_names_directory_after_repository() {
        let base = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new();
        let output = OutputManager::quiet();

        let source = PluginSource::github("https://github.com/acme/my-plugin.git");
        let dir = source
            .resolve(base.path(), &runner, &output)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(dir.file_name().unwrap(), "my-plugin");
    }

    #[tokio::test]
    async fn github_resolve_removes_stale_directory_first() {
        let base = tempfile::tempdir().unwrap();
        let stale = base.path().join("my-plugin");
        std::fs::create_dir(&stale).unwrap();
        std::fs::write(stale.join("old.txt"), "stale").unwrap();

        let runner = FakeRunner::new();
        let output = OutputManager::quiet();

        let source = PluginSource::github("acme/my-plugin");
        source.resolve(base.path(), &runner, &output).await.unwrap();

        assert!(!stale.join("old.txt").exists());
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn failed_clone_yields_none() {
        let base = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new();
        let output = OutputManager::quiet();

        let url = "https://github.com/acme/broken.git";
        let dest = base.path().join("broken").to_string_lossy().to_string();
        runner.fail(&format!("git clone {} {}", url, dest), "repository not found");

        let source = PluginSource::github(url);
        let dir = source.resolve(base.path(), &runner, &output).await.unwrap();

        assert!(dir.is_none());
    }

    #[tokio::test]
    async fn missing_local_path_yields_none() {
        let runner = FakeRunner::new();
        let output = OutputManager::quiet();

        let source = PluginSource::Local {
            path: PathBuf::from("/nonexistent/plugin"),
        };
        let dir = source
            .resolve(Path::new("/tmp"), &runner, &output)
            .await
            .unwrap();

        assert!(dir.is_none());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn local_path_is_used_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new();
        let output = OutputManager::quiet();

        let source = PluginSource::Local {
            path: dir.path().to_path_buf(),
        };
        let resolved = source
            .resolve(Path::new("/tmp"), &runner, &output)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved, dir.path().canonicalize().unwrap());
        assert!(runner.calls().is_empty());
    }
}
