//! Semver bump helpers for package.json versions

use crate::manifest::MANIFEST_NAME;
use crate::{jsonfile, Error, Result};
use semver::Version;
use std::path::Path;

/// Which version segment a bump touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseKind {
    Major,
    Minor,
    Patch,
}

impl std::str::FromStr for ReleaseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "major" => Ok(ReleaseKind::Major),
            "minor" => Ok(ReleaseKind::Minor),
            "patch" => Ok(ReleaseKind::Patch),
            other => Err(Error::Other(format!(
                "Unknown release kind '{}' (expected major, minor or patch)",
                other
            ))),
        }
    }
}

/// Bump a semver string, clearing pre-release and build metadata
pub fn bump(version: &str, kind: ReleaseKind) -> Result<String> {
    let current = Version::parse(version)?;

    let next = match kind {
        ReleaseKind::Major => Version::new(current.major + 1, 0, 0),
        ReleaseKind::Minor => Version::new(current.major, current.minor + 1, 0),
        ReleaseKind::Patch => Version::new(current.major, current.minor, current.patch + 1),
    };

    Ok(next.to_string())
}

/// Bump the version field of a package.json in place, returning (old, new)
pub fn bump_manifest<P: AsRef<Path>>(
    package_root: P,
    kind: ReleaseKind,
) -> Result<(String, String)> {
    let manifest_path = package_root.as_ref().join(MANIFEST_NAME);
    let mut old_version = String::new();
    let mut new_version = String::new();

    jsonfile::transform_json_file(&manifest_path, |mut doc: serde_json::Value| {
        let current = doc
            .get("version")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                Error::InvalidManifest(format!("{}: missing version", manifest_path.display()))
            })?
            .to_string();

        let next = bump(&current, kind)?;
        doc["version"] = serde_json::Value::String(next.clone());

        old_version = current;
        new_version = next;
        Ok(doc)
    })?;

    Ok((old_version, new_version))
}
