//! Constants and lookup tables from the specification
//!
//! This module centralizes the fixed tables §6 defines so they have exactly
//! one home: the environment-variable whitelist, the architecture token
//! set, and the two vendor lookup tables (architecture → generator
//! platform, major version → generator name).

/// Default concurrency cap for directory scans and probe fan-out.
pub const DEFAULT_SCAN_CONCURRENCY: usize = 8;

/// Environment-variable whitelist captured from vendor SDK activation (§6).
/// Matching is case-insensitive on Windows per §4.D/§9.
pub const VENDOR_ENV_WHITELIST: &[&str] = &[
    "CL",
    "_CL_",
    "INCLUDE",
    "LIBPATH",
    "LINK",
    "_LINK_",
    "LIB",
    "PATH",
    "TMP",
    "FRAMEWORKDIR",
    "FRAMEWORKDIR64",
    "FRAMEWORKVERSION",
    "FRAMEWORKVERSION64",
    "UCRTCONTEXTROOT",
    "UCRTVERSION",
    "UNIVERSALCRTSDKDIR",
    "VCINSTALLDIR",
    "VCTARGETSPATH",
    "WINDOWSLIBPATH",
    "WINDOWSSDKDIR",
    "WINDOWSSDKLIBVERSION",
    "WINDOWSSDKVERSION",
    "VISUALSTUDIOVERSION",
];

/// Fixed architecture list the Vendor Kit Builder (§4.E) iterates for every
/// installation.
pub const VS_BUILDER_ARCHITECTURES: &[&str] =
    &["x86", "amd64", "x86_amd64", "x86_arm", "amd64_arm", "amd64_x86"];

/// The full architecture token set (§6), including `arm` which the builder
/// never emits on its own but which a user-authored kit may still specify.
pub const ARCHITECTURE_TOKENS: &[&str] = &[
    "x86",
    "amd64",
    "x86_amd64",
    "x86_arm",
    "amd64_arm",
    "amd64_x86",
    "arm",
];

/// Architecture → `preferredGenerator.platform` (§6). `None` means the
/// platform field is omitted for that architecture.
pub fn generator_platform_for_arch(arch: &str) -> Option<&'static str> {
    match arch {
        "amd64" => Some("x64"),
        "arm" => Some("ARM"),
        "amd64_arm" => Some("ARM"),
        _ => None,
    }
}

/// Vendor major version → `preferredGenerator.name` (§6).
pub fn generator_name_for_major_version(major: u32) -> Option<&'static str> {
    match major {
        10 => Some("Visual Studio 10 2010"),
        11 => Some("Visual Studio 11 2012"),
        12 => Some("Visual Studio 12 2013"),
        14 => Some("Visual Studio 14 2015"),
        15 => Some("Visual Studio 15 2017"),
        16 => Some("Visual Studio 16 2019"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_contains_include_and_path() {
        assert!(VENDOR_ENV_WHITELIST.contains(&"INCLUDE"));
        assert!(VENDOR_ENV_WHITELIST.contains(&"PATH"));
    }

    #[test]
    fn generator_platform_table() {
        assert_eq!(generator_platform_for_arch("amd64"), Some("x64"));
        assert_eq!(generator_platform_for_arch("arm"), Some("ARM"));
        assert_eq!(generator_platform_for_arch("amd64_arm"), Some("ARM"));
        assert_eq!(generator_platform_for_arch("x86"), None);
    }

    #[test]
    fn generator_name_table() {
        assert_eq!(
            generator_name_for_major_version(16),
            Some("Visual Studio 16 2019")
        );
        assert_eq!(generator_name_for_major_version(9), None);
    }
}
