//! Derivation of release and development version numbers.
//!
//! Versions are treated as dot separated numbers with an optional suffix
//! (`1.0`, `1.0.2-SNAPSHOT`). Two-part versions are valid here because
//! branch names such as `hotfix/1.0` are built from them.

use crate::error::{Result, VersionError};
use regex::Regex;
use std::sync::LazyLock;

/// Suffix marking a development version
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*)(.*)$").expect("version pattern is valid")
});

fn split_numbers(version: &str) -> Result<(Vec<u64>, &str)> {
    let invalid = |reason: &str| VersionError::InvalidVersion {
        version: version.to_string(),
        reason: reason.to_string(),
    };

    let captures = VERSION_PATTERN
        .captures(version.trim())
        .ok_or_else(|| invalid("expected dot separated numbers"))?;
    let numbers = captures
        .get(1)
        .map(|m| m.as_str())
        .ok_or_else(|| invalid("expected dot separated numbers"))?
        .split('.')
        .map(|n| n.parse::<u64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| invalid("version number out of range"))?;
    let suffix = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
    Ok((numbers, suffix))
}

fn join(numbers: &[u64]) -> String {
    numbers
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Whether the version carries the development suffix
pub fn is_snapshot(version: &str) -> bool {
    version.ends_with(SNAPSHOT_SUFFIX)
}

/// Release version of a development version: `1.1-SNAPSHOT` -> `1.1`
pub fn release_version_of(version: &str) -> Result<String> {
    split_numbers(version)?;
    Ok(version
        .strip_suffix(SNAPSHOT_SUFFIX)
        .unwrap_or(version)
        .to_string())
}

/// Next patch release: `1.0.1` -> `1.0.2`, `1.0` -> `1.1`
pub fn next_patch_version(version: &str) -> Result<String> {
    let (mut numbers, _) = split_numbers(version)?;
    if let Some(last) = numbers.last_mut() {
        *last += 1;
    }
    Ok(join(&numbers))
}

/// Development version following a release: `1.0.1` -> `1.0.2-SNAPSHOT`
pub fn next_patch_development_version(version: &str) -> Result<String> {
    Ok(format!("{}{}", next_patch_version(version)?, SNAPSHOT_SUFFIX))
}

/// First patch release of a release line: `1.0` -> `1.0.1`, `1.0.0` -> `1.0.1`
pub fn first_patch_version(release_version: &str) -> Result<String> {
    let (mut numbers, _) = split_numbers(release_version)?;
    if numbers.len() < 3 {
        numbers.push(1);
    } else if let Some(last) = numbers.last_mut() {
        *last += 1;
    }
    Ok(join(&numbers))
}

/// Development version for fixes on a release branch: `1.0` -> `1.0.1-SNAPSHOT`
pub fn fixes_development_version(release_version: &str) -> Result<String> {
    Ok(format!("{}{}", first_patch_version(release_version)?, SNAPSHOT_SUFFIX))
}

/// Development version for the next release line: `1.1.0` -> `1.2.0-SNAPSHOT`
pub fn next_minor_development_version(version: &str) -> Result<String> {
    let (mut numbers, _) = split_numbers(version)?;
    let index = if numbers.len() >= 2 { 1 } else { 0 };
    numbers[index] += 1;
    for n in numbers.iter_mut().skip(index + 1) {
        *n = 0;
    }
    Ok(format!("{}{}", join(&numbers), SNAPSHOT_SUFFIX))
}
