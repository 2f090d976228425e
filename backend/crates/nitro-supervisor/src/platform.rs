//! Platform detection and the server binary table.

use crate::{SupervisorError, SupervisorResult};

use std::fmt;
use std::panic::Location;

use error_location::ErrorLocation;

pub const WINDOWS_BINARY: &str = "nitro_windows_amd64.exe";
pub const MAC_ARM64_BINARY: &str = "nitro_mac_arm64";
pub const MAC_AMD64_BINARY: &str = "nitro_mac_amd64";
pub const LINUX_CUDA_BINARY: &str = "nitro_linux_amd64_cuda";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    MacOs,
    Linux,
    /// BSDs and other Unix-likes
    OtherUnix(String),
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpuArch {
    X86_64,
    Aarch64,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: OsFamily,
    pub arch: CpuArch,
}

impl OsFamily {
    /// Map a `std::env::consts::OS` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "windows" => Self::Windows,
            "macos" => Self::MacOs,
            "linux" => Self::Linux,
            "freebsd" | "openbsd" | "netbsd" | "dragonfly" | "solaris" | "illumos" => {
                Self::OtherUnix(name.to_string())
            }
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::OtherUnix(name) | Self::Other(name) => name,
        }
    }
}

impl CpuArch {
    /// Map a `std::env::consts::ARCH` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "x86_64" => Self::X86_64,
            "aarch64" => Self::Aarch64,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
            Self::Other(name) => name,
        }
    }
}

impl Platform {
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: OsFamily::from_name(os),
            arch: CpuArch::from_name(arch),
        }
    }

    /// The platform this process was compiled for.
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Server build for this platform, if one ships.
    ///
    /// Windows runs the amd64 build on every architecture. Linux and other
    /// Unix-likes share the CUDA build, which only exists for x86_64.
    pub fn binary_name(&self) -> Option<&'static str> {
        match (&self.os, &self.arch) {
            (OsFamily::Windows, _) => Some(WINDOWS_BINARY),
            (OsFamily::MacOs, CpuArch::Aarch64) => Some(MAC_ARM64_BINARY),
            (OsFamily::MacOs, CpuArch::X86_64) => Some(MAC_AMD64_BINARY),
            (OsFamily::Linux | OsFamily::OtherUnix(_), CpuArch::X86_64) => Some(LINUX_CUDA_BINARY),
            _ => None,
        }
    }

    #[track_caller]
    pub fn require_binary_name(&self) -> SupervisorResult<&'static str> {
        self.binary_name()
            .ok_or_else(|| SupervisorError::UnsupportedPlatform {
                os: self.os.name().to_string(),
                arch: self.arch.name().to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os.name(), self.arch.name())
    }
}
