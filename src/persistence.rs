//! Kit Persistence & Diff (§4.G): load and validate a kits document in a
//! relaxed JSON dialect, and decide whether a kit transition is material.
//!
//! `change_needs_clean` itself lives on [`crate::kit`] since it operates
//! purely on the `Kit` data model; this module owns the document-level
//! concerns — parsing, schema validation, and the one distinguished
//! terminal failure (§7): syntactically valid but schema-invalid.

use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::constants::ARCHITECTURE_TOKENS;
use crate::error::{KitError, Result};
use crate::kit::Kit;

/// `schema_loader(path) -> validator` (§6), narrowed to exactly the kits
/// document shape this crate needs to validate. A `schema_loader`
/// collaborator would normally *produce* one of these from a JSON Schema
/// file; no such schema-validating crate exists in this dependency
/// stack, so the kits schema is expressed directly as Rust.
pub trait Validator {
    /// Returns one `(dataPath, message)` pair per violation.
    fn validate(&self, value: &Value) -> Vec<(String, String)>;
}

/// The kits-document schema (§3 invariants, §6): an array of objects,
/// each with a non-empty `name`, at least one of `compilers` /
/// `visualStudio` / `toolchainFile`, and `visualStudioArchitecture`
/// present and a recognized token whenever `visualStudio` is set.
pub struct KitsSchema;

impl Validator for KitsSchema {
    fn validate(&self, value: &Value) -> Vec<(String, String)> {
        let mut violations = Vec::new();
        let array = match value.as_array() {
            Some(a) => a,
            None => {
                violations.push(("/".to_string(), "expected an array".to_string()));
                return violations;
            }
        };
        for (i, item) in array.iter().enumerate() {
            let path = format!("/{i}");
            let obj = match item.as_object() {
                Some(o) => o,
                None => {
                    violations.push((path, "expected an object".to_string()));
                    continue;
                }
            };
            match obj.get("name").and_then(Value::as_str) {
                Some(n) if !n.is_empty() => {}
                Some(_) => violations.push((format!("{path}/name"), "must not be empty".to_string())),
                None => violations.push((format!("{path}/name"), "required".to_string())),
            }

            let has_compilers = obj.get("compilers").is_some();
            let has_vs = obj.get("visualStudio").is_some();
            let has_toolchain = obj.get("toolchainFile").is_some();
            if !has_compilers && !has_vs && !has_toolchain {
                violations.push((
                    path.clone(),
                    "must have one of compilers, visualStudio, or toolchainFile".to_string(),
                ));
            }

            if has_vs {
                match obj.get("visualStudioArchitecture").and_then(Value::as_str) {
                    Some(arch) if ARCHITECTURE_TOKENS.contains(&arch) => {}
                    Some(arch) => violations.push((
                        format!("{path}/visualStudioArchitecture"),
                        format!("unrecognized architecture token {arch:?}"),
                    )),
                    None => violations.push((
                        format!("{path}/visualStudioArchitecture"),
                        "required when visualStudio is set".to_string(),
                    )),
                }
            }
        }
        violations
    }
}

/// Strips `//` and `/* */` comments and trailing commas before `]`/`}`
/// from a relaxed JSON dialect (§4.G, §6). Comments and commas inside
/// string literals are left untouched.
fn strip_relaxed_json(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some((_, c)) = chars.next() {
        if in_string {
            out.push(c);
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                chars.next();
                for (_, next) in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut prev = '\0';
                for (_, next) in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    strip_trailing_commas(&out)
}

fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escape = false;
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if c == '"' {
            in_string = true;
            out.push(c);
            i += 1;
            continue;
        }
        if c == ',' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && (chars[j] == ']' || chars[j] == '}') {
                i += 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

/// `load(path)` (§4.G): absent file returns `[]`; parse failures and
/// schema failures both return `[]` with a diagnostic logged — schema
/// failures additionally log one line per violation (§7's distinguished
/// terminal failure).
pub fn load_kits(path: &Path, validator: &dyn Validator) -> Vec<Kit> {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read kits document");
            return Vec::new();
        }
    };

    let cleaned = strip_relaxed_json(&raw);
    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(v) => v,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse kits document");
            return Vec::new();
        }
    };

    let violations = validator.validate(&value);
    if !violations.is_empty() {
        for (data_path, message) in &violations {
            warn!(path = %path.display(), data_path, message, "kits document schema violation");
        }
        return Vec::new();
    }

    match serde_json::from_value::<Vec<Option<Kit>>>(value) {
        Ok(kits) => kits.into_iter().flatten().collect(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to deserialize validated kits document");
            Vec::new()
        }
    }
}

/// Like [`load_kits`] but surfaces a parse failure as `Err` instead of an
/// empty vec with only a logged warning — used by the CLI surface, which
/// wants to report the failure to the user rather than silently proceed.
pub fn load_kits_strict(path: &Path, validator: &dyn Validator) -> Result<Vec<Kit>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(KitError::Io(e)),
    };
    let cleaned = strip_relaxed_json(&raw);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| KitError::ParseError(e.to_string()))?;
    let violations = validator.validate(&value);
    if !violations.is_empty() {
        return Err(KitError::SchemaInvalid(violations));
    }
    let kits: Vec<Option<Kit>> =
        serde_json::from_value(value).map_err(|e| KitError::ParseError(e.to_string()))?;
    Ok(kits.into_iter().flatten().collect())
}

/// Serializes `kits` as pretty JSON to `path`.
pub fn save_kits(path: &Path, kits: &[Kit]) -> Result<()> {
    let json = serde_json::to_string_pretty(kits).map_err(|e| KitError::ParseError(e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_and_block_comments() {
        let input = "[ // comment\n{ \"a\": 1 /* inline */ } ]";
        let cleaned = strip_relaxed_json(input);
        let value: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value[0]["a"], 1);
    }

    #[test]
    fn strips_trailing_commas() {
        let input = "[1, 2, 3,]";
        let cleaned = strip_relaxed_json(input);
        let value: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
    }

    #[test]
    fn leaves_commas_inside_strings_alone() {
        let input = r#"["a, b", "c",]"#;
        let cleaned = strip_relaxed_json(input);
        let value: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value[0], "a, b");
    }

    #[test]
    fn schema_rejects_missing_name() {
        let value: Value = serde_json::from_str(r#"[{"compilers": {"C": "/usr/bin/gcc"}}]"#).unwrap();
        let violations = KitsSchema.validate(&value);
        assert!(violations.iter().any(|(p, _)| p == "/0/name"));
    }

    #[test]
    fn schema_rejects_unrecognized_architecture() {
        let value: Value = serde_json::from_str(
            r#"[{"name": "x", "visualStudio": "v", "visualStudioArchitecture": "sparc"}]"#,
        )
        .unwrap();
        let violations = KitsSchema.validate(&value);
        assert!(!violations.is_empty());
    }

    #[test]
    fn schema_accepts_valid_document() {
        let value: Value =
            serde_json::from_str(r#"[{"name": "x", "compilers": {"C": "/usr/bin/gcc"}}]"#).unwrap();
        assert!(KitsSchema.validate(&value).is_empty());
    }

    #[test]
    fn load_kits_missing_file_returns_empty() {
        let kits = load_kits(Path::new("/does/not/exist/kits.json"), &KitsSchema);
        assert!(kits.is_empty());
    }

    #[test]
    fn load_kits_round_trips_through_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kits.json");
        let mut compilers = std::collections::BTreeMap::new();
        compilers.insert("C".to_string(), std::path::PathBuf::from("/usr/bin/gcc"));
        let kit = Kit::Compiler(crate::kit::CompilerKit {
            name: "GCC".to_string(),
            compilers,
            header: Default::default(),
        });
        save_kits(&path, &[kit.clone()]).unwrap();
        let loaded = load_kits(&path, &KitsSchema);
        assert_eq!(loaded, vec![kit]);
    }

    #[test]
    fn load_kits_schema_failure_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kits.json");
        std::fs::write(&path, r#"[{"compilers": {"C": "/usr/bin/gcc"}}]"#).unwrap();
        let loaded = load_kits(&path, &KitsSchema);
        assert!(loaded.is_empty());
    }

    #[test]
    fn load_kits_strict_reports_schema_violations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kits.json");
        std::fs::write(&path, r#"[{"compilers": {"C": "/usr/bin/gcc"}}]"#).unwrap();
        let err = load_kits_strict(&path, &KitsSchema).unwrap_err();
        assert!(matches!(err, KitError::SchemaInvalid(_)));
    }
}
