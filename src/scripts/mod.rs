//! Activation script generation for a [`Kit`]'s effective environment.
//!
//! `[SUPPLEMENT]` (SPEC_FULL.md §4.D): spec.md's distillation only asks
//! for the effective environment as a `VariableMap` (§4.H); this module
//! carries over the teacher's multi-shell `askama`-templated export so a
//! composed environment can be sourced by a human, the way the original
//! bundle activation scripts worked, generalized from "MSVC toolchain" to
//! "any kit".
//!
//! # Supported shells
//!
//! - CMD (Windows Command Prompt)
//! - PowerShell
//! - Bash (Git Bash, WSL, POSIX shells)

use askama::Template;

use crate::error::{KitError, Result};
use crate::variable_map::VariableMap;

/// Shell type for script generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellType {
    Cmd,
    PowerShell,
    Bash,
}

impl ShellType {
    pub fn detect() -> Self {
        if std::env::var("PSModulePath").is_ok() {
            return ShellType::PowerShell;
        }
        if std::env::var("BASH").is_ok()
            || std::env::var("SHELL")
                .map(|s| s.contains("bash"))
                .unwrap_or(false)
        {
            return ShellType::Bash;
        }
        #[cfg(windows)]
        return ShellType::Cmd;
        #[cfg(not(windows))]
        return ShellType::Bash;
    }

    pub fn script_extension(&self) -> &'static str {
        match self {
            ShellType::Cmd => "bat",
            ShellType::PowerShell => "ps1",
            ShellType::Bash => "sh",
        }
    }

    pub fn script_filename(&self, base_name: &str) -> String {
        format!("{}.{}", base_name, self.script_extension())
    }
}

impl std::fmt::Display for ShellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellType::Cmd => write!(f, "cmd"),
            ShellType::PowerShell => write!(f, "powershell"),
            ShellType::Bash => write!(f, "bash"),
        }
    }
}

/// One `NAME=value` pair, in the order it should be emitted.
#[derive(Debug, Clone)]
struct EnvPair {
    name: String,
    value: String,
}

fn pairs_from(env: &VariableMap) -> Vec<EnvPair> {
    env.iter()
        .map(|(k, v)| EnvPair {
            name: k.to_string(),
            value: v.to_string(),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "activate.bat.txt")]
struct CmdActivateTemplate<'a> {
    kit_name: &'a str,
    vars: Vec<EnvPair>,
}

#[derive(Template)]
#[template(path = "activate.ps1.txt")]
struct PowerShellActivateTemplate<'a> {
    kit_name: &'a str,
    vars: Vec<EnvPair>,
}

#[derive(Template)]
#[template(path = "activate.sh.txt")]
struct BashActivateTemplate<'a> {
    kit_name: &'a str,
    vars: Vec<EnvPair>,
}

/// Rendered activation scripts for every supported shell.
#[derive(Debug, Clone)]
pub struct GeneratedScripts {
    pub cmd: String,
    pub powershell: String,
    pub bash: String,
}

impl GeneratedScripts {
    pub fn get(&self, shell: ShellType) -> &str {
        match shell {
            ShellType::Cmd => &self.cmd,
            ShellType::PowerShell => &self.powershell,
            ShellType::Bash => &self.bash,
        }
    }
}

/// Renders activation scripts for every shell from a kit's effective
/// environment (§4.H's `effective_env` output).
pub fn generate_activation_scripts(kit_name: &str, env: &VariableMap) -> Result<GeneratedScripts> {
    Ok(GeneratedScripts {
        cmd: generate_script(kit_name, env, ShellType::Cmd)?,
        powershell: generate_script(kit_name, env, ShellType::PowerShell)?,
        bash: generate_script(kit_name, env, ShellType::Bash)?,
    })
}

/// Renders a single shell's activation script.
pub fn generate_script(kit_name: &str, env: &VariableMap, shell: ShellType) -> Result<String> {
    let vars = pairs_from(env);
    let rendered = match shell {
        ShellType::Cmd => CmdActivateTemplate { kit_name, vars }
            .render()
            .map_err(|e| KitError::Other(format!("failed to render CMD template: {e}")))?,
        ShellType::PowerShell => PowerShellActivateTemplate { kit_name, vars }
            .render()
            .map_err(|e| KitError::Other(format!("failed to render PowerShell template: {e}")))?,
        ShellType::Bash => BashActivateTemplate { kit_name, vars }
            .render()
            .map_err(|e| KitError::Other(format!("failed to render Bash template: {e}")))?,
    };
    Ok(rendered)
}

/// Writes every shell's script to `output_dir/<base_name>.<ext>`.
pub async fn save_scripts(
    scripts: &GeneratedScripts,
    output_dir: &std::path::Path,
    base_name: &str,
) -> Result<()> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(KitError::Io)?;

    for shell in [ShellType::Cmd, ShellType::PowerShell, ShellType::Bash] {
        let path = output_dir.join(shell.script_filename(base_name));
        tokio::fs::write(&path, scripts.get(shell))
            .await
            .map_err(KitError::Io)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_env() -> VariableMap {
        let mut env = VariableMap::new();
        env.push("INCLUDE", "C:\\inc");
        env.push("PATH", "C:\\a;C:\\b");
        env
    }

    #[test]
    fn script_extension_matches_shell() {
        assert_eq!(ShellType::Cmd.script_extension(), "bat");
        assert_eq!(ShellType::PowerShell.script_extension(), "ps1");
        assert_eq!(ShellType::Bash.script_extension(), "sh");
    }

    #[test]
    fn cmd_script_contains_set_statements() {
        let script = generate_script("GCC 9.4.0", &sample_env(), ShellType::Cmd).unwrap();
        assert!(script.contains("GCC 9.4.0"));
        assert!(script.contains("set \"INCLUDE=C:\\inc\""));
        assert!(script.contains("set \"PATH=C:\\a;C:\\b\""));
    }

    #[test]
    fn powershell_script_uses_env_drive() {
        let script = generate_script("GCC 9.4.0", &sample_env(), ShellType::PowerShell).unwrap();
        assert!(script.contains("$env:INCLUDE"));
    }

    #[test]
    fn bash_script_exports_variables() {
        let script = generate_script("GCC 9.4.0", &sample_env(), ShellType::Bash).unwrap();
        assert!(script.contains("export INCLUDE=\"C:\\inc\""));
    }

    #[test]
    fn generate_activation_scripts_renders_all_three() {
        let scripts = generate_activation_scripts("GCC", &sample_env()).unwrap();
        assert!(scripts.cmd.contains("INCLUDE"));
        assert!(scripts.powershell.contains("INCLUDE"));
        assert!(scripts.bash.contains("INCLUDE"));
    }

    #[tokio::test]
    async fn save_scripts_writes_all_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let scripts = generate_activation_scripts("GCC", &sample_env()).unwrap();
        save_scripts(&scripts, dir.path(), "activate").await.unwrap();
        assert!(dir.path().join("activate.bat").exists());
        assert!(dir.path().join("activate.ps1").exists());
        assert!(dir.path().join("activate.sh").exists());
    }
}
