//! Dify Ops - deployment and plugin lifecycle automation for self-hosted Dify.
//!
//! This binary provisions a Docker-based Dify deployment (deploy, stop,
//! restart, upgrade) and packages or remote-debugs Dify plugins, with
//! proper error handling and idempotent provisioning stages.

use std::process;

use dify_ops::cli;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
