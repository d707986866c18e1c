//! Platform detection
//!
//! Hook templates see the host through `${BUILD_OS}`, which names one of the
//! two supported host families using prebuilt-directory conventions:
//! - macOS → `"darwin-x86"`
//! - everything else → `"linux-x86"`
//!
//! Platform info is cached on first access.

use std::fmt;
use std::sync::LazyLock;

/// Current platform information (cached)
///
/// # Example
/// ```
/// use preupload_core::platform::CURRENT_PLATFORM;
///
/// let prebuilts = format!("prebuilts/{}/bin", CURRENT_PLATFORM.build_os());
/// ```
pub static CURRENT_PLATFORM: LazyLock<Platform> = LazyLock::new(Platform::detect);

/// Platform information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// OS: "darwin" (macOS), "linux", "windows", "unknown"
    pub os: &'static str,
    /// CPU architecture: "x86_64", "aarch64", etc.
    pub arch: &'static str,
}

impl Platform {
    /// Platform of the running binary
    pub fn detect() -> Self {
        Self {
            os: Self::detect_os(),
            arch: std::env::consts::ARCH,
        }
    }

    /// The host family exposed to hooks as `${BUILD_OS}`
    #[must_use]
    pub fn build_os(&self) -> BuildOs {
        if self.os == "darwin" {
            BuildOs::Darwin
        } else {
            BuildOs::Linux
        }
    }

    const fn detect_os() -> &'static str {
        #[cfg(target_os = "macos")]
        {
            "darwin"
        }

        #[cfg(target_os = "linux")]
        {
            "linux"
        }

        #[cfg(target_os = "windows")]
        {
            "windows"
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            "unknown"
        }
    }
}

/// Host platform family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildOs {
    /// Linux and anything that is not macOS
    Linux,
    /// macOS
    Darwin,
}

impl BuildOs {
    /// Value substituted for `${BUILD_OS}`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BuildOs::Linux => "linux-x86",
            BuildOs::Darwin => "darwin-x86",
        }
    }
}

impl fmt::Display for BuildOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
