//! Host environment probing.
//!
//! Classifies the host OS family and CPU architecture, counts CPUs and
//! measures total memory. The resulting [`EnvironmentProfile`] is built
//! once per invocation and passed through the pipeline by value.

use std::fmt;
use std::fs;

use sysinfo::System;

use crate::cli::OutputManager;
use crate::error::{OpsError, Result};

/// Minimum recommended CPU cores; fewer is a warning, not a failure.
pub const MIN_CPU_CORES: usize = 2;

/// Minimum required memory for a Dify deployment (4 GiB); less is fatal.
pub const MIN_MEMORY_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Minimum Python runtime for the plugin workflow.
pub const MIN_PYTHON_VERSION: (u32, u32) = (3, 12);

/// Host OS family classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    /// Ubuntu/Debian and derivatives (apt-based)
    Debian,
    /// CentOS/RHEL/Rocky/AlmaLinux (yum/dnf-based)
    Rhel,
    /// macOS
    Darwin,
    /// Linux without a recognized package-manager family
    GenericLinux,
    /// Windows
    Windows,
    /// Anything else
    Unknown,
}

impl OsFamily {
    /// Token used in release asset names (`dify-plugin-<os>-<arch>`).
    pub fn release_token(self) -> Option<&'static str> {
        match self {
            Self::Debian | Self::Rhel | Self::GenericLinux => Some("linux"),
            Self::Darwin => Some("darwin"),
            Self::Windows | Self::Unknown => None,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Debian => "debian-like",
            Self::Rhel => "rhel-like",
            Self::Darwin => "darwin",
            Self::GenericLinux => "generic-linux",
            Self::Windows => "windows",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Host CPU architecture classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    /// x86-64
    Amd64,
    /// 64-bit ARM
    Arm64,
    /// Anything else
    Unknown,
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Snapshot of the host environment, computed once per invocation.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentProfile {
    /// Host OS family
    pub os_family: OsFamily,
    /// Host CPU architecture
    pub arch: Arch,
    /// Number of logical CPUs
    pub cpu_count: usize,
    /// Total physical memory in bytes
    pub memory_bytes: u64,
}

impl EnvironmentProfile {
    /// Probes the current host.
    pub fn detect() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();

        Self {
            os_family: detect_os_family(),
            arch: classify_arch(std::env::consts::ARCH),
            cpu_count: num_cpus::get(),
            memory_bytes: sys.total_memory(),
        }
    }

    /// Total memory in whole GiB, rounded down to one decimal for display.
    pub fn memory_gib(&self) -> f64 {
        self.memory_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}

/// Classifies the host OS family.
pub fn detect_os_family() -> OsFamily {
    match std::env::consts::OS {
        "macos" => OsFamily::Darwin,
        "windows" => OsFamily::Windows,
        "linux" => fs::read_to_string("/etc/os-release")
            .map(|content| classify_os_release(&content))
            .unwrap_or(OsFamily::GenericLinux),
        _ => OsFamily::Unknown,
    }
}

/// Classifies a Linux distribution from `/etc/os-release` content.
pub fn classify_os_release(content: &str) -> OsFamily {
    let content = content.to_lowercase();
    if content.contains("ubuntu") || content.contains("debian") {
        OsFamily::Debian
    } else if content.contains("centos")
        || content.contains("rhel")
        || content.contains("rocky")
        || content.contains("almalinux")
    {
        OsFamily::Rhel
    } else {
        OsFamily::GenericLinux
    }
}

/// Classifies a CPU architecture identifier (`std::env::consts::ARCH` style).
pub fn classify_arch(machine: &str) -> Arch {
    match machine.to_lowercase().as_str() {
        "x86_64" | "amd64" => Arch::Amd64,
        "aarch64" | "arm64" => Arch::Arm64,
        _ => Arch::Unknown,
    }
}

/// Gates a deployment on the host requirements.
///
/// CPU below the recommended minimum is a warning; insufficient memory
/// or an unsupported OS family terminates the pipeline before any
/// installation step runs.
pub fn check_deploy_requirements(profile: &EnvironmentProfile, output: &OutputManager) -> Result<()> {
    if profile.cpu_count < MIN_CPU_CORES {
        output.warn(&format!(
            "CPU count ({}) is below the recommended minimum ({})",
            profile.cpu_count, MIN_CPU_CORES
        ));
    } else {
        output.success(&format!("CPU count: {}", profile.cpu_count));
    }

    if profile.memory_bytes < MIN_MEMORY_BYTES {
        output.error(&format!(
            "Memory ({:.1}GB) is below the required minimum (4GB)",
            profile.memory_gib()
        ));
        return Err(OpsError::precondition(format!(
            "insufficient memory: {:.1}GB available, 4GB required",
            profile.memory_gib()
        )));
    }
    output.success(&format!("Memory: {:.1}GB", profile.memory_gib()));

    match profile.os_family {
        OsFamily::Debian | OsFamily::Rhel => {
            output.success(&format!("Operating system: {}", profile.os_family));
            Ok(())
        }
        other => {
            output.error("Unsupported operating system; only Debian-like and RHEL-like hosts are supported");
            Err(OpsError::precondition(format!(
                "unsupported operating system: {}",
                other
            )))
        }
    }
}

/// Parses `python3 --version` output (`Python 3.12.1`) into (major, minor).
pub fn parse_python_version(output: &str) -> Option<(u32, u32)> {
    let version = output.trim().strip_prefix("Python ")?;
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}
