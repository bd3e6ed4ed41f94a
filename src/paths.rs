//! Path Resolver (§4.A): host-aware resolution of well-known directories,
//! `PATH` lookup, and bundled-tool discovery under vendor installation
//! trees.
//!
//! Every function here takes an [`Env`] rather than reading
//! `std::env::var` directly, so tests can exercise Windows-shaped
//! behavior (e.g. `HOMEDRIVE`/`HOMEPATH`) on any host without mutating
//! process-global state — the same reason the upstream logic keeps this
//! resolver side-effect-free apart from the documented Ninja hint.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::vendor::VendorInstallation;

/// Which directory/variable conventions to apply. The spec's host
/// branches (`Windows` vs. everything else) are modeled explicitly so
/// they're testable independent of the host actually running the tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    Windows,
    Unix,
}

impl Host {
    pub fn current() -> Self {
        if cfg!(windows) {
            Host::Windows
        } else {
            Host::Unix
        }
    }
}

impl Default for Host {
    fn default() -> Self {
        Host::current()
    }
}

/// A source of environment variables. `std::env::var` in production;
/// a plain map in tests.
pub trait Env {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads from the real process environment.
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Env for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

const DATA_DIR_NAME: &str = "CMakeTools";

/// `user_home()` (§4.A).
pub fn user_home(host: Host, env: &dyn Env) -> PathBuf {
    match host {
        Host::Windows => {
            let drive = env.get("HOMEDRIVE").unwrap_or_else(|| {
                warn!("HOMEDRIVE not set, defaulting to C:");
                "C:".to_string()
            });
            let path = env.get("HOMEPATH").unwrap_or_else(|| {
                warn!("HOMEPATH not set, defaulting to \\Users\\Public");
                "Users\\Public".to_string()
            });
            PathBuf::from(format!("{drive}\\{path}"))
        }
        Host::Unix => env
            .get("HOME")
            .or_else(|| env.get("PROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                warn!("neither HOME nor PROFILE set");
                PathBuf::from("/")
            }),
    }
}

/// `user_local_dir()` (§4.A).
pub fn user_local_dir(host: Host, env: &dyn Env) -> PathBuf {
    match host {
        Host::Windows => env
            .get("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| user_home(host, env).join("AppData").join("Local")),
        Host::Unix => env
            .get("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| user_home(host, env).join(".local").join("share")),
    }
}

/// `user_roaming_dir()` (§4.A).
pub fn user_roaming_dir(host: Host, env: &dyn Env) -> PathBuf {
    match host {
        Host::Windows => env
            .get("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| user_home(host, env).join("AppData").join("Roaming")),
        Host::Unix => env
            .get("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| user_home(host, env).join(".config")),
    }
}

/// `data_dir()` (§4.A): `user_local_dir()/CMakeTools`.
pub fn data_dir(host: Host, env: &dyn Env) -> PathBuf {
    user_local_dir(host, env).join(DATA_DIR_NAME)
}

/// `roaming_data_dir()` (§4.A): `user_roaming_dir()/CMakeTools`.
pub fn roaming_data_dir(host: Host, env: &dyn Env) -> PathBuf {
    user_roaming_dir(host, env).join(DATA_DIR_NAME)
}

/// `tmp_dir()` (§4.A).
pub fn tmp_dir(host: Host, env: &dyn Env) -> PathBuf {
    match host {
        Host::Windows => env
            .get("TEMP")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("C:\\Windows\\Temp")),
        Host::Unix => PathBuf::from("/tmp"),
    }
}

/// Well-known kits-file locations (§6).
pub fn user_kits_file(host: Host, env: &dyn Env) -> PathBuf {
    data_dir(host, env).join("cmake-tools-kits.json")
}

pub fn legacy_user_kits_file(host: Host, env: &dyn Env) -> PathBuf {
    match host {
        Host::Windows => roaming_data_dir(host, env).join("cmake-tools.json"),
        Host::Unix => data_dir(host, env).join("cmake-tools.json"),
    }
}

pub fn workspace_kits_file(workspace: &Path) -> PathBuf {
    workspace.join(".vscode").join("cmake-kits.json")
}

fn pathext_candidates(host: Host, env: &dyn Env, basename: &str) -> Vec<String> {
    if host != Host::Windows {
        return vec![basename.to_string()];
    }
    let pathext = env
        .get("PATHEXT")
        .unwrap_or_else(|| ".COM;.EXE;.BAT;.CMD".to_string());
    let mut candidates = vec![basename.to_string()];
    for ext in pathext.split(';').filter(|e| !e.is_empty()) {
        candidates.push(format!("{basename}{ext}"));
    }
    candidates
}

/// `which(name)` (§4.A): first `PATH` entry whose basename equals `name`,
/// with `PATHEXT` expansion on Windows. `None` on miss.
pub fn which(host: Host, env: &dyn Env, name: &str) -> Option<PathBuf> {
    let path_var = env.get("PATH")?;
    let sep = if host == Host::Windows { ';' } else { ':' };
    for dir in path_var.split(sep).filter(|d| !d.is_empty()) {
        for candidate in pathext_candidates(host, env, name) {
            let full = Path::new(dir).join(&candidate);
            if full.is_file() {
                return Some(full);
            }
        }
    }
    None
}

/// The result of [`resolve_cmake`]: the resolved `cmake` path and,
/// if a bundled installation was selected, its sibling Ninja directory.
/// Per §9's preferred re-architecture, the Ninja hint travels with the
/// resolution result instead of living in a process-global slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmakeResolution {
    pub cmake: Option<PathBuf>,
    pub bundled_ninja_dir: Option<PathBuf>,
}

/// `resolve_cmake(raw_path, vars)` (§4.A).
///
/// `expand` is the external `expand(template, vars) -> string` collaborator
/// (§6); when `None`, `raw_path` is used verbatim.
pub fn resolve_cmake(
    host: Host,
    env: &dyn Env,
    raw_path: &str,
    vars: &HashMap<String, String>,
    expand: Option<&dyn Fn(&str, &HashMap<String, String>) -> String>,
    vendor_installations: &[VendorInstallation],
) -> CmakeResolution {
    let expanded = match expand {
        Some(f) => f(raw_path, vars),
        None => raw_path.to_string(),
    };

    if expanded != "auto" && expanded != "cmake" {
        return CmakeResolution {
            cmake: Some(PathBuf::from(expanded)),
            bundled_ninja_dir: None,
        };
    }

    if let Some(found) = which(host, env, "cmake") {
        return CmakeResolution {
            cmake: Some(found),
            bundled_ninja_dir: None,
        };
    }

    if host != Host::Windows {
        return CmakeResolution::default();
    }

    for root_var in ["ProgramFiles", "ProgramFiles(x86)"] {
        if let Some(root) = env.get(root_var) {
            let candidate = Path::new(&root).join("CMake").join("bin").join("cmake.exe");
            if candidate.is_file() {
                return CmakeResolution {
                    cmake: Some(candidate),
                    bundled_ninja_dir: None,
                };
            }
        }
    }

    for install in vendor_installations {
        let candidate = install
            .installation_path
            .join("Common7")
            .join("IDE")
            .join("CommonExtensions")
            .join("Microsoft")
            .join("CMake")
            .join("CMake")
            .join("bin")
            .join("cmake.exe");
        if candidate.is_file() {
            let ninja_dir = install
                .installation_path
                .join("Common7")
                .join("IDE")
                .join("CommonExtensions")
                .join("Microsoft")
                .join("CMake")
                .join("Ninja");
            let bundled_ninja_dir = if ninja_dir.join("ninja.exe").is_file() {
                Some(ninja_dir)
            } else {
                None
            };
            return CmakeResolution {
                cmake: Some(candidate),
                bundled_ninja_dir,
            };
        }
    }

    CmakeResolution::default()
}

/// `resolve_ctest(cmake_path)` (§4.A).
pub fn resolve_ctest(cmake_path: &Path) -> PathBuf {
    let dir = match cmake_path.parent() {
        Some(d) => d,
        None => return PathBuf::from("ctest"),
    };
    let sibling = dir.join(if cfg!(windows) { "ctest.exe" } else { "ctest" });
    if is_executable(&sibling) {
        sibling
    } else {
        PathBuf::from("ctest")
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn windows_home_joins_drive_and_path() {
        let e = env(&[("HOMEDRIVE", "C:"), ("HOMEPATH", "\\Users\\alice")]);
        assert_eq!(
            user_home(Host::Windows, &e),
            PathBuf::from("C:\\Users\\alice")
        );
    }

    #[test]
    fn windows_home_defaults_when_missing() {
        let e: HashMap<String, String> = HashMap::new();
        assert_eq!(
            user_home(Host::Windows, &e),
            PathBuf::from("C:\\Users\\Public")
        );
    }

    #[test]
    fn unix_home_prefers_home_over_profile() {
        let e = env(&[("HOME", "/home/alice"), ("PROFILE", "/other")]);
        assert_eq!(user_home(Host::Unix, &e), PathBuf::from("/home/alice"));
    }

    #[test]
    fn unix_home_falls_back_to_profile() {
        let e = env(&[("PROFILE", "/home/bob")]);
        assert_eq!(user_home(Host::Unix, &e), PathBuf::from("/home/bob"));
    }

    #[test]
    fn data_dir_appends_fixed_literal() {
        let e = env(&[("XDG_DATA_HOME", "/home/alice/.data")]);
        assert_eq!(
            data_dir(Host::Unix, &e),
            PathBuf::from("/home/alice/.data/CMakeTools")
        );
    }

    #[test]
    fn tmp_dir_is_slash_tmp_on_unix() {
        let e: HashMap<String, String> = HashMap::new();
        assert_eq!(tmp_dir(Host::Unix, &e), PathBuf::from("/tmp"));
    }

    #[test]
    fn which_finds_first_path_match() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("mytool");
        std::fs::write(&bin, "").unwrap();
        let e = env(&[("PATH", dir.path().to_str().unwrap())]);
        assert_eq!(which(Host::Unix, &e, "mytool"), Some(bin));
    }

    #[test]
    fn which_misses_return_none() {
        let e = env(&[("PATH", "/does/not/exist")]);
        assert_eq!(which(Host::Unix, &e, "nonexistent-tool"), None);
    }

    #[test]
    fn which_expands_pathext_on_windows() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("cmake.exe");
        std::fs::write(&bin, "").unwrap();
        let e = env(&[
            ("PATH", dir.path().to_str().unwrap()),
            ("PATHEXT", ".EXE;.BAT"),
        ]);
        assert_eq!(which(Host::Windows, &e, "cmake"), Some(bin));
    }

    #[test]
    fn resolve_cmake_passes_through_explicit_path() {
        let e: HashMap<String, String> = HashMap::new();
        let vars = HashMap::new();
        let res = resolve_cmake(
            Host::Unix,
            &e,
            "/opt/cmake/bin/cmake",
            &vars,
            None,
            &[],
        );
        assert_eq!(res.cmake, Some(PathBuf::from("/opt/cmake/bin/cmake")));
        assert_eq!(res.bundled_ninja_dir, None);
    }

    #[test]
    fn resolve_cmake_expands_auto_via_which() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("cmake");
        std::fs::write(&bin, "").unwrap();
        let e = env(&[("PATH", dir.path().to_str().unwrap())]);
        let vars = HashMap::new();
        let res = resolve_cmake(Host::Unix, &e, "auto", &vars, None, &[]);
        assert_eq!(res.cmake, Some(bin));
    }

    #[test]
    fn resolve_cmake_runs_expand_when_provided() {
        let e: HashMap<String, String> = HashMap::new();
        let mut vars = HashMap::new();
        vars.insert("root".to_string(), "/custom".to_string());
        let expand = |template: &str, vars: &HashMap<String, String>| -> String {
            template.replace("${root}", vars.get("root").map(String::as_str).unwrap_or(""))
        };
        let res = resolve_cmake(
            Host::Unix,
            &e,
            "${root}/bin/cmake",
            &vars,
            Some(&expand),
            &[],
        );
        assert_eq!(res.cmake, Some(PathBuf::from("/custom/bin/cmake")));
    }

    #[test]
    fn resolve_ctest_falls_back_to_bare_name_when_missing() {
        let cmake = PathBuf::from("/opt/cmake/bin/cmake");
        assert_eq!(resolve_ctest(&cmake), PathBuf::from("ctest"));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_ctest_finds_executable_sibling() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let cmake = dir.path().join("cmake");
        let ctest = dir.path().join("ctest");
        std::fs::write(&cmake, "").unwrap();
        std::fs::write(&ctest, "").unwrap();
        std::fs::set_permissions(&ctest, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(resolve_ctest(&cmake), ctest);
    }
}
