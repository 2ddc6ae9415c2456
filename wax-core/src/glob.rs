//! Glob expansion.
//!
//! Each positive pattern is split into a literal directory prefix (its *base*)
//! and a glob remainder. The base is walked in lexical order and every file
//! whose base-relative path matches the remainder is yielded together with
//! that base, which is what key generation later strips.
//!
//! Patterns starting with `!` exclude files (matched relative to `cwd`). A
//! file matched by several patterns is yielded once, at its first position.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::WaxError;

/// One file produced by [`expand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobMatch {
    pub path: PathBuf,
    /// Literal directory prefix of the pattern that matched, resolved against `cwd`.
    pub base: PathBuf,
}

/// Expand `patterns` relative to `cwd`.
///
/// A base directory that does not exist simply yields no files.
pub fn expand(patterns: &[String], cwd: &Path) -> Result<Vec<GlobMatch>, WaxError> {
    let (negative, positive): (Vec<&String>, Vec<&String>) =
        patterns.iter().partition(|p| p.starts_with('!'));
    let excludes = exclusion_set(negative.iter().map(|p| &p[1..]))?;

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for pattern in positive {
        for found in expand_one(pattern, cwd)? {
            if is_excluded(&excludes, &found.path, cwd) {
                continue;
            }
            if seen.insert(found.path.clone()) {
                out.push(found);
            }
        }
    }
    tracing::debug!(?patterns, matched = out.len(), "expanded globs");
    Ok(out)
}

fn expand_one(pattern: &str, cwd: &Path) -> Result<Vec<GlobMatch>, WaxError> {
    let normalized = pattern.replace('\\', "/");
    let (parent, rest) = split_pattern(&normalized);
    let base = cwd.join(parent);

    if !is_glob(rest) {
        let path = base.join(rest);
        return Ok(if path.is_file() {
            vec![GlobMatch { path, base }]
        } else {
            vec![]
        });
    }

    if !base.is_dir() {
        return Ok(vec![]);
    }

    let matcher = compile(rest)?;
    let mut out = Vec::new();
    for entry in WalkDir::new(&base).sort_by_file_name() {
        let entry = entry.map_err(|e| WaxError::Walk {
            path: base.clone(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = slash_path(entry.path().strip_prefix(&base).unwrap_or(entry.path()));
        if matcher.is_match(&rel) {
            out.push(GlobMatch {
                path: entry.into_path(),
                base: base.clone(),
            });
        }
    }
    Ok(out)
}

/// Split a pattern into its literal directory prefix and the remainder.
fn split_pattern(pattern: &str) -> (&str, &str) {
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    let mut end = 0;
    for (idx, ch) in pattern.char_indices() {
        if is_magic(ch) {
            break;
        }
        if ch == '/' {
            end = idx + 1;
        }
    }
    let parent = &pattern[..end];
    let parent = if parent.len() > 1 {
        parent.trim_end_matches('/')
    } else {
        parent
    };
    (parent, &pattern[end..])
}

fn is_magic(ch: char) -> bool {
    matches!(ch, '*' | '?' | '[' | '{')
}

fn is_glob(pattern: &str) -> bool {
    pattern.chars().any(is_magic)
}

fn compile(pattern: &str) -> Result<GlobMatcher, WaxError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| WaxError::Pattern {
            pattern: pattern.to_string(),
            source: e,
        })
}

fn exclusion_set<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet, WaxError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.replace('\\', "/");
        let pattern = pattern.strip_prefix("./").unwrap_or(&pattern);
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| WaxError::Pattern {
                pattern: pattern.to_string(),
                source: e,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| WaxError::Pattern {
        pattern: "<exclusions>".to_string(),
        source: e,
    })
}

fn is_excluded(excludes: &GlobSet, path: &Path, cwd: &Path) -> bool {
    if excludes.is_empty() {
        return false;
    }
    let rel = slash_path(path.strip_prefix(cwd).unwrap_or(path));
    excludes.is_match(&rel)
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("partials/**/*.hbs", "partials", "**/*.hbs")]
    #[case("./partials/*.hbs", "partials", "*.hbs")]
    #[case("*.hbs", "", "*.hbs")]
    #[case("/abs/dir/{a,b}.hbs", "/abs/dir", "{a,b}.hbs")]
    #[case("/x.hbs", "/", "x.hbs")]
    #[case("data/site.json", "data", "site.json")]
    #[case("a/b[0-9]/c.hbs", "a", "b[0-9]/c.hbs")]
    fn split_pattern_cases(#[case] pattern: &str, #[case] parent: &str, #[case] rest: &str) {
        assert_eq!(split_pattern(pattern), (parent, rest));
    }
}
