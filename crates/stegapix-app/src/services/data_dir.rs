// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::{Path, PathBuf};

use stegapix_core::error::Result;

/// Return the application data directory, creating it if needed.
///
/// An explicit directory wins, then `STEGAPIX_DATA_DIR`, then the XDG data
/// home.
pub fn data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => resolve(|key| std::env::var(key).ok()),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Return a subdirectory inside the data dir (e.g. "work", "published").
pub fn data_subdir(base: &Path, name: &str) -> Result<PathBuf> {
    let dir = base.join(name);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn resolve(var: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = var("STEGAPIX_DATA_DIR").filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    base_dir(&var).join("stegapix")
}

fn base_dir(var: &impl Fn(&str) -> Option<String>) -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Some(xdg) = var("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(home) = var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    std::env::temp_dir()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn explicit_variable_wins() {
        let dir = resolve(env(&[
            ("STEGAPIX_DATA_DIR", "/srv/stegapix"),
            ("XDG_DATA_HOME", "/xdg"),
        ]));
        assert_eq!(dir, PathBuf::from("/srv/stegapix"));
    }

    #[test]
    fn xdg_then_home() {
        assert_eq!(
            resolve(env(&[("XDG_DATA_HOME", "/xdg"), ("HOME", "/home/u")])),
            PathBuf::from("/xdg/stegapix")
        );
        assert_eq!(
            resolve(env(&[("HOME", "/home/u")])),
            PathBuf::from("/home/u/.local/share/stegapix")
        );
    }

    #[test]
    fn explicit_dir_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = data_dir(Some(&tmp.path().join("a/b"))).unwrap();
        assert!(dir.is_dir());
        assert!(data_subdir(&dir, "work").unwrap().is_dir());
    }
}
