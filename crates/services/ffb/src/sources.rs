//! Library module enumeration.
//!
//! Resolves the `sources` of a build descriptor to concrete files without a
//! shell. A pattern is a path whose last component may contain `*` (any run
//! of characters) and `?` (exactly one character). A `**` component right
//! before the file name searches every directory below.

use std::{
    collections::HashSet,
    path::{Component, Path, PathBuf},
};

use walkdir::WalkDir;

use crate::prelude::*;

fn has_wildcard(value: &str) -> bool {
    value.contains(['*', '?'])
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Matches `name` against a `*`/`?` pattern. A leading `.` in `name` is
/// only matched by a leading `.` in the pattern.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    if is_hidden(name) && !pattern.starts_with('.') {
        return false;
    }
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut p, mut n) = (0, 0);
    // Position of the last `*` and the name index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p).copied() {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, tried)) => {
                    p = star + 1;
                    n = tried + 1;
                    backtrack = Some((star, tried + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// Resolves every pattern against `base_dir`, in order, dropping duplicates.
///
/// A literal path must name an existing file and a wildcard pattern must
/// match at least one.
pub fn resolve_sources(base_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for pattern in patterns {
        for source in resolve_pattern(base_dir, pattern)? {
            if seen.insert(source.clone()) {
                sources.push(source);
            }
        }
    }
    Ok(sources)
}

fn resolve_pattern(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(pattern);
    if !has_wildcard(pattern) {
        let source = base_dir.join(path);
        if !source.is_file() {
            return Err(Error::SourceNotFound(source));
        }
        return Ok(vec![source]);
    }

    let file_pattern = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::UnsupportedPattern(pattern.to_string()))?;

    let mut dir = PathBuf::new();
    let mut recursive = false;
    let parents: Vec<Component> = path
        .parent()
        .map(|parent| parent.components().collect())
        .unwrap_or_default();
    for (idx, component) in parents.iter().enumerate() {
        let value = component.as_os_str().to_string_lossy();
        if value == "**" && idx + 1 == parents.len() {
            recursive = true;
        } else if has_wildcard(&value) {
            return Err(Error::UnsupportedPattern(pattern.to_string()));
        } else {
            dir.push(component.as_os_str());
        }
    }

    let root = base_dir.join(dir);
    if !root.is_dir() {
        return Err(Error::NoSourcesMatched(pattern.to_string()));
    }

    let walker = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();
    let mut matches = Vec::new();
    // `**` does not descend into hidden directories
    let walker = walker.into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !entry.file_type().is_dir()
            || !is_hidden(&entry.file_name().to_string_lossy())
    });
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file()
            && wildcard_match(file_pattern, &entry.file_name().to_string_lossy())
        {
            matches.push(entry.into_path());
        }
    }

    if matches.is_empty() {
        return Err(Error::NoSourcesMatched(pattern.to_string()));
    }
    Ok(matches)
}
