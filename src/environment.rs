//! Kit Effective-Environment Composer (§4.H): merge host env, kit-declared
//! env, and vendor SDK env with deterministic precedence, patch path-like
//! variables, and locate the MSVC compiler driver in the result.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::kit::Kit;
use crate::paths::Host;
use crate::variable_map::VariableMap;
use crate::vendor::env::extract_environment;
use crate::vendor::VendorInstallation;

/// `effective_env(kit, expand_opts?)` (§4.H).
///
/// Vendor activation is not cached across calls (§1 non-goals: "caching
/// probe results across runs") — each call that needs it re-runs the
/// Vendor SDK Environment Extractor, which is why this function takes
/// the same inputs component D needs rather than a precomputed map.
pub async fn effective_env(
    host: Host,
    kit: &Kit,
    host_env: &VariableMap,
    vendor_installations: &[VendorInstallation],
    tmp_dir: &Path,
    bundled_ninja_dir: Option<&Path>,
    expand: Option<&dyn Fn(&str, &HashMap<String, String>) -> String>,
    expand_vars: &HashMap<String, String>,
) -> VariableMap {
    let mut env = host_env.clone();

    if let Some(vars) = &kit.header().environment_variables {
        for (k, v) in vars {
            let value = match expand {
                Some(f) => f(v, expand_vars),
                None => v.clone(),
            };
            env.insert_ci(k, value);
        }
    }

    if let Kit::Vendor(vk) = kit {
        if let Some(install) = vendor_installations
            .iter()
            .find(|i| i.instance_id == vk.visual_studio)
        {
            if let Some(vendor_env) = extract_environment(
                host,
                install,
                &vk.visual_studio_architecture,
                tmp_dir,
                bundled_ninja_dir,
            )
            .await
            {
                if host == Host::Windows {
                    env.merge_uppercasing_keys(&vendor_env);
                } else {
                    env.merge(&vendor_env);
                }
            }
        }
    }

    if let Some(mingw_path) = env.get_ci("CMT_MINGW_PATH").map(str::to_string) {
        if let Some(path) = env.get("PATH").map(str::to_string) {
            env.insert_ci("PATH", format!("{path};{mingw_path}"));
        } else if let Some(path) = env.get("Path").map(str::to_string) {
            env.insert_ci("Path", format!("{path};{mingw_path}"));
        }
    }

    env
}

/// `find_cl(env)` (§4.H): locate `PATH`/`PATHEXT` case-insensitively and
/// test every `<dir>/cl<ext>` in order; `None` on miss.
pub fn find_cl(env: &VariableMap) -> Option<PathBuf> {
    let path = env.get_ci("PATH")?;
    let pathext = env
        .get_ci("PATHEXT")
        .map(str::to_string)
        .unwrap_or_else(|| ".COM;.EXE;.BAT;.CMD".to_string());

    for dir in path.split(';').filter(|d| !d.is_empty()) {
        for ext in std::iter::once("").chain(pathext.split(';')) {
            let candidate = Path::new(dir).join(format!("cl{ext}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}
