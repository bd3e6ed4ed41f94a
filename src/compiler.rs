//! Compiler Prober (§4.B): classify a candidate binary, run it under a
//! version-probe argument, and parse the result into a [`Kit`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, trace, warn};

use crate::exec::{exec, ExecOptions};
use crate::kit::{CompilerKit, Kit, KitHeader, PreferredGenerator};
use crate::paths::Host;

/// `CompilerIdentity` (§3): the structured result of parsing a compiler's
/// free-form version output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerIdentity {
    pub family: Family,
    pub version: String,
    pub full_version: String,
    pub target: Option<String>,
    pub thread_model: Option<String>,
    pub installed_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Gcc,
    Clang,
}

fn gcc_basename_re() -> Regex {
    Regex::new(r"^(?:(?P<triple>[A-Za-z0-9_]+(?:-[A-Za-z0-9_]+)*)-)?gcc(?:-\d+(?:\.\d+)*)?(?:\.exe)?$")
        .expect("static regex")
}

fn clang_basename_re() -> Regex {
    Regex::new(r"^clang(?:-\d+(?:\.\d+)*)?(?:\.exe)?$").expect("static regex")
}

fn classify(basename: &str) -> Option<(Family, Option<String>)> {
    if let Some(caps) = clang_basename_re().captures(basename) {
        let _ = caps;
        return Some((Family::Clang, None));
    }
    if let Some(caps) = gcc_basename_re().captures(basename) {
        let triple = caps.name("triple").map(|m| m.as_str().to_string());
        return Some((Family::Gcc, triple));
    }
    None
}

fn parse_gcc_version(output: &str) -> Option<(String, String)> {
    let re = Regex::new(r"(?m)^gcc version (\S+) (.*)$").expect("static regex");
    let caps = re.captures(output)?;
    let version = caps.get(1)?.as_str().to_string();
    let full = caps.get(0)?.as_str().to_string();
    Some((version, full))
}

fn parse_clang_version(output: &str) -> Option<(String, String)> {
    let re =
        Regex::new(r"(?m)^(?:Apple LLVM|Apple clang|clang) version (\S+)[\s-]").expect("static regex");
    let caps = re.captures(output)?;
    let version = caps.get(1)?.as_str().to_string();
    let full = caps.get(0)?.as_str().trim_end().to_string();
    Some((version, full))
}

pub(crate) fn parse_field(output: &str, label: &str) -> Option<String> {
    let pattern = format!(r"(?m)^{label}:\s+(.*)$");
    let re = Regex::new(&pattern).ok()?;
    re.captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Classify, execute, and parse a candidate compiler path, using the
/// current host for the MinGW augmentation gate (§4.B).
pub async fn probe(bin: &Path) -> Option<Kit> {
    probe_on(bin, Host::current()).await
}

/// Same as [`probe`] but with an explicit host, so the Windows-only
/// MinGW augmentation (§4.B step 9) is exercisable in tests regardless
/// of the host actually running them. Absorbs every `ProbeFailed`-class
/// condition as `None` per §4.B/§7 — only unclassifiable paths,
/// non-zero exits, and unparsable output return `None`; the caller
/// (Directory Scanner / Aggregator) is never handed an `Err`.
pub async fn probe_on(bin: &Path, host: Host) -> Option<Kit> {
    let basename = bin.file_name()?.to_str()?;
    let (family, triple) = classify(basename)?;

    trace!(path = %bin.display(), "probing candidate compiler");
    let output = match exec(bin, &["-v".to_string()], None, &ExecOptions::default()).await {
        Ok(o) => o,
        Err(e) => {
            debug!(path = %bin.display(), error = %e, "probe invocation failed");
            return None;
        }
    };
    if !output.success() {
        debug!(path = %bin.display(), retc = ?output.retc, "probe exited non-zero");
        return None;
    }

    let combined = format!("{}\n{}", output.stdout, output.stderr);
    let identity = match family {
        Family::Gcc => {
            let (version, full_version) = parse_gcc_version(&combined)?;
            CompilerIdentity {
                family,
                version,
                full_version,
                target: triple.clone(),
                thread_model: None,
                installed_dir: None,
            }
        }
        Family::Clang => {
            let (version, full_version) = parse_clang_version(&combined)?;
            let target = parse_field(&combined, "Target");
            if let Some(target) = &target {
                if target.contains("msvc") {
                    trace!(path = %bin.display(), %target, "clang targets msvc, rejecting");
                    return None;
                }
            }
            CompilerIdentity {
                family,
                version,
                full_version,
                target,
                thread_model: parse_field(&combined, "Thread model"),
                installed_dir: parse_field(&combined, "InstalledDir"),
            }
        }
    };

    let dir = bin.parent().unwrap_or_else(|| Path::new("."));
    let mut compilers = BTreeMap::new();
    compilers.insert("C".to_string(), bin.to_path_buf());
    if let Some(cxx) = sibling_cxx(dir, basename, family) {
        compilers.insert("CXX".to_string(), cxx);
    }

    let name = match family {
        Family::Gcc => match &triple {
            Some(t) => format!("GCC for {t} {}", identity.version),
            None => format!("GCC {}", identity.version),
        },
        Family::Clang => format!("Clang {}", identity.version),
    };

    let mut header = KitHeader::default();
    if family == Family::Gcc && host == Host::Windows {
        if let Some(mingw_dir) = mingw_augmentation(dir).await {
            header.preferred_generator = Some(PreferredGenerator {
                name: "MinGW Makefiles".to_string(),
                toolset: None,
                platform: None,
            });
            let mut env = BTreeMap::new();
            env.insert(
                "CMT_MINGW_PATH".to_string(),
                mingw_dir.display().to_string(),
            );
            header.environment_variables = Some(env);
        }
    }

    Some(Kit::Compiler(CompilerKit {
        name,
        compilers,
        header,
    }))
}

fn sibling_cxx(dir: &Path, basename: &str, family: Family) -> Option<PathBuf> {
    let sibling_name = match family {
        Family::Gcc => basename.replacen("gcc", "g++", 1),
        Family::Clang => basename.replacen("clang", "clang++", 1),
    };
    if sibling_name == basename {
        return None;
    }
    let candidate = dir.join(&sibling_name);
    candidate.is_file().then_some(candidate)
}

/// MinGW augmentation (§4.B, Windows + GCC only): if the binary's
/// lowercased path mentions `"mingw"`, require a `mingw32-make.exe`
/// sibling whose `-v` output matches the documented two-line shape.
async fn mingw_augmentation(dir: &Path) -> Option<PathBuf> {
    if !dir.to_string_lossy().to_lowercase().contains("mingw") {
        return None;
    }
    let make = dir.join("mingw32-make.exe");
    if !make.is_file() {
        return None;
    }
    let mut opts = ExecOptions::default();
    let mut env = std::collections::HashMap::new();
    env.insert("PATH".to_string(), dir.display().to_string());
    opts.env = Some(env);
    let output = exec(&make, &["-v".to_string()], None, &opts).await.ok()?;
    if !output.success() {
        return None;
    }
    let mut lines = output.stdout.lines();
    let first = lines.next()?;
    let second = lines.next()?;
    if first.contains("Make") && second.contains("mingw32") {
        Some(dir.to_path_buf())
    } else {
        warn!(dir = %dir.display(), "mingw32-make output did not match expected shape");
        None
    }
}
