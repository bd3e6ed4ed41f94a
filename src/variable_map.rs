//! `VariableMap` (§3): an ordered mapping from case-insensitive variable
//! name to string value. Insertion order is preserved for stable
//! serialization and PATH-like precedence; lookup is case-insensitive on
//! hosts that demand it (Windows).

use std::fmt;

/// Ordered, optionally case-insensitive string-to-string map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableMap {
    entries: Vec<(String, String)>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the entry whose key matches `key`, case-insensitively.
    fn find_ci(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    /// Case-sensitive lookup — used where the spec calls for exact-name
    /// comparisons (e.g. "already present in the extracted PATH").
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Case-insensitive lookup, for Windows-origin maps (§9).
    pub fn get_ci(&self, key: &str) -> Option<&str> {
        self.find_ci(key).map(|i| self.entries[i].1.as_str())
    }

    /// Insert or, if `key` already exists (case-insensitively), overwrite
    /// in place preserving its original position. The stored key is also
    /// replaced with `key` as given, so repeated case-insensitive inserts
    /// under a new casing (e.g. `merge_uppercasing_keys`) actually change
    /// the casing on disk instead of leaving the first-seen variant.
    pub fn insert_ci(&mut self, key: &str, value: impl Into<String>) {
        match self.find_ci(key) {
            Some(i) => self.entries[i] = (key.to_string(), value.into()),
            None => self.entries.push((key.to_string(), value.into())),
        }
    }

    /// Insert preserving the key's case exactly as given, appending if no
    /// case-sensitive match exists (used to build host_env, where keys
    /// must not collapse into each other before the explicit §4.H
    /// uppercase-on-merge step).
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn remove_ci(&mut self, key: &str) -> Option<String> {
        let idx = self.find_ci(key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `other` onto `self` in order; on a Windows-origin merge every
    /// key is uppercased as it is applied, so `PATH`/`Path`/`path` collapse
    /// (§4.H step 3).
    pub fn merge_uppercasing_keys(&mut self, other: &VariableMap) {
        for (k, v) in other.iter() {
            self.insert_ci(&k.to_uppercase(), v);
        }
    }

    /// Merge `other` onto `self` preserving keys as given.
    pub fn merge(&mut self, other: &VariableMap) {
        for (k, v) in other.iter() {
            self.insert_ci(k, v);
        }
    }

    /// True if no two keys differ only in case (§8 invariant 5).
    pub fn has_no_case_collisions(&self) -> bool {
        for i in 0..self.entries.len() {
            for j in (i + 1)..self.entries.len() {
                if self.entries[i].0 != self.entries[j].0
                    && self.entries[i].0.eq_ignore_ascii_case(&self.entries[j].0)
                {
                    return false;
                }
            }
        }
        true
    }
}

impl fmt::Display for VariableMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.entries {
            writeln!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

impl FromIterator<(String, String)> for VariableMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut map = VariableMap::new();
        for (k, v) in iter {
            map.push(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut m = VariableMap::new();
        m.push("B", "2");
        m.push("A", "1");
        let keys: Vec<_> = m.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["B", "A"]);
    }

    #[test]
    fn insert_ci_overwrites_in_place() {
        let mut m = VariableMap::new();
        m.push("Path", "first");
        m.insert_ci("PATH", "second");
        assert_eq!(m.len(), 1);
        assert_eq!(m.get_ci("path"), Some("second"));
    }

    #[test]
    fn insert_ci_replaces_stored_key_casing() {
        let mut m = VariableMap::new();
        m.push("Path", "first");
        m.insert_ci("PATH", "second");
        assert_eq!(m.get("PATH"), Some("second"));
        assert_eq!(m.get("Path"), None);
    }

    #[test]
    fn get_ci_matches_regardless_of_case() {
        let mut m = VariableMap::new();
        m.push("INCLUDE", "x");
        assert_eq!(m.get_ci("include"), Some("x"));
    }

    #[test]
    fn merge_uppercasing_keys_collapses_variants() {
        let mut host = VariableMap::new();
        host.push("Path", "C:\\a");
        let mut vendor = VariableMap::new();
        vendor.push("PATH", "C:\\b");
        host.merge_uppercasing_keys(&vendor);
        assert!(host.has_no_case_collisions());
        assert_eq!(host.get("PATH"), Some("C:\\b"));
    }

    #[test]
    fn detects_case_collisions() {
        let mut m = VariableMap::new();
        m.push("PATH", "a");
        m.push("Path", "b");
        assert!(!m.has_no_case_collisions());
    }
}
