//! Host platform detection

use std::fmt;

/// Operating system and CPU architecture pairs the engine ships for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    LinuxAmd64,
    LinuxArm64,
    WindowsAmd64,
    WindowsArm64,
    MacosAmd64,
    MacosArm64,
}

impl Platform {
    /// Platform this binary was built for, `None` if unsupported
    pub fn current() -> Option<Self> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Parse Rust's `target_os` / `target_arch` names
    pub fn from_parts(os: &str, arch: &str) -> Option<Self> {
        let arm = match arch {
            "x86_64" => false,
            "aarch64" => true,
            _ => return None,
        };
        match (os, arm) {
            ("linux", false) => Some(Self::LinuxAmd64),
            ("linux", true) => Some(Self::LinuxArm64),
            ("windows", false) => Some(Self::WindowsAmd64),
            ("windows", true) => Some(Self::WindowsArm64),
            ("macos", false) => Some(Self::MacosAmd64),
            ("macos", true) => Some(Self::MacosArm64),
            _ => None,
        }
    }

    /// Lowercase name used in artifact paths, e.g. `linux_amd64`
    pub fn normalized_name(&self) -> &'static str {
        match self {
            Self::LinuxAmd64 => "linux_amd64",
            Self::LinuxArm64 => "linux_arm64",
            Self::WindowsAmd64 => "windows_amd64",
            Self::WindowsArm64 => "windows_arm64",
            Self::MacosAmd64 => "macos_amd64",
            Self::MacosArm64 => "macos_arm64",
        }
    }

    pub fn is_linux(&self) -> bool {
        matches!(self, Self::LinuxAmd64 | Self::LinuxArm64)
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Self::WindowsAmd64 | Self::WindowsArm64)
    }

    pub fn is_macos(&self) -> bool {
        matches!(self, Self::MacosAmd64 | Self::MacosArm64)
    }

    /// macOS trackpads and mice already deliver a natural smooth scroll
    pub fn has_native_smooth_scroll(&self) -> bool {
        self.is_macos()
    }

    /// Whether the engine supports this OS version.
    ///
    /// `version` is the Windows build number or the macOS product version;
    /// any Linux version is accepted.
    pub fn is_os_version_supported(&self, version: &str) -> bool {
        if self.is_linux() {
            return true;
        }
        if self.is_windows() {
            // Windows 10 or later
            return version.trim().parse::<u32>().is_ok_and(|build| build >= 10240);
        }
        let mut parts = version.trim().split('.');
        let major = parts.next().and_then(|p| p.parse::<u32>().ok());
        let minor = match parts.next() {
            Some(p) => p.parse::<u32>().ok(),
            None => Some(0),
        };
        match (major, minor) {
            (Some(major), Some(minor)) => major > 10 || (major == 10 && minor >= 15),
            _ => false,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.normalized_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts() {
        assert_eq!(Platform::from_parts("linux", "x86_64"), Some(Platform::LinuxAmd64));
        assert_eq!(Platform::from_parts("macos", "aarch64"), Some(Platform::MacosArm64));
        assert_eq!(Platform::from_parts("freebsd", "x86_64"), None);
        assert_eq!(Platform::from_parts("linux", "riscv64"), None);
    }

    #[test]
    fn test_smooth_scroll_only_on_macos() {
        assert!(Platform::MacosAmd64.has_native_smooth_scroll());
        assert!(!Platform::WindowsAmd64.has_native_smooth_scroll());
        assert!(!Platform::LinuxArm64.has_native_smooth_scroll());
    }

    #[test]
    fn test_os_version_support() {
        assert!(Platform::WindowsAmd64.is_os_version_supported("19045"));
        assert!(!Platform::WindowsAmd64.is_os_version_supported("9600"));
        assert!(!Platform::WindowsArm64.is_os_version_supported("build"));
        assert!(Platform::MacosArm64.is_os_version_supported("14.2.1"));
        assert!(Platform::MacosAmd64.is_os_version_supported("10.15"));
        assert!(!Platform::MacosAmd64.is_os_version_supported("10.14.6"));
        assert!(Platform::MacosAmd64.is_os_version_supported("11"));
        assert!(!Platform::MacosAmd64.is_os_version_supported("ten"));
        assert!(Platform::LinuxAmd64.is_os_version_supported(""));
    }

    #[test]
    fn test_display() {
        assert_eq!(Platform::WindowsArm64.to_string(), "windows_arm64");
    }
}
