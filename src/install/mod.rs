//! Dependency installation.
//!
//! Ensures the container engine and the Dify vendor CLI are present and
//! runnable, with OS-specific installation recipes and probe-based
//! short-circuits so re-runs are cheap no-ops.

mod dify_cli;
mod docker;

pub use dify_cli::ensure_dify_cli;
pub use docker::{DockerRecipe, ensure_docker};
