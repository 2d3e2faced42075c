//! npm manifest handling for package.json
//!
//! This module provides the typed view of the `package.json` fields unpm
//! cares about. Fields the tool does not touch are preserved verbatim
//! through a flattened side map, so a load/save cycle never drops anything
//! another tool wrote into the manifest.
//!
//! # Examples
//!
//! ```no_run
//! use unpm::PackageManifest;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manifest = PackageManifest::load(".")?;
//! manifest.version = "1.1.0".to_string();
//! manifest.save(".")?;
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const MANIFEST_NAME: &str = "package.json";

/// npm package manifest (package.json)
///
/// Mirrors the manifest fields unpm reads or rewrites: identity, repository,
/// scripts, dependencies, and the `config` block that drives Unity install
/// path resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,

    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,

    #[serde(
        rename = "devDependencies",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub dev_dependencies: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PackageConfig>,

    /// Fields unpm does not interpret, preserved across load/save
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Repository entry of a package.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub repo_type: Option<String>,

    pub url: String,
}

/// The `config` block of a package.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Scope segment inserted into the Unity install path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// unpm-specific overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unpm: Option<UnpmOptions>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// `config.unpm` overrides for install path resolution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnpmOptions {
    /// Full override of the Unity install path, relative to the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_path: Option<String>,

    /// Skip the Plugins/ segment of the default install path
    #[serde(default)]
    pub flat_install: bool,

    /// Override of the package's Unity source subfolder, relative to the
    /// package root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_path: Option<String>,
}

impl PackageManifest {
    /// Load package.json from the given package directory
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let manifest_path = dir.as_ref().join(MANIFEST_NAME);

        if !manifest_path.exists() {
            return Err(Error::InvalidManifest(format!(
                "no package.json in {}",
                dir.as_ref().display()
            )));
        }

        let content = fs::read_to_string(&manifest_path)?;
        let manifest: PackageManifest = serde_json::from_str(&content)
            .map_err(|e| Error::InvalidManifest(format!("{}: {}", manifest_path.display(), e)))?;

        Ok(manifest)
    }

    /// Save package.json to the given package directory
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        crate::jsonfile::write_json_pretty(dir.as_ref().join(MANIFEST_NAME), self)
    }

    /// Check if package.json exists in the given directory
    pub fn exists<P: AsRef<Path>>(dir: P) -> bool {
        dir.as_ref().join(MANIFEST_NAME).exists()
    }

    /// Scope from the config block, if any
    pub fn scope(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.scope.as_deref())
    }

    /// unpm overrides from the config block, if any
    pub fn unpm_options(&self) -> Option<&UnpmOptions> {
        self.config.as_ref().and_then(|c| c.unpm.as_ref())
    }

    /// Name with any @scope/ prefix stripped
    pub fn unscoped_name(&self) -> &str {
        unscoped(&self.name)
    }

    /// Repository URL, if any
    pub fn repository_url(&self) -> Option<&str> {
        self.repository.as_ref().map(|r| r.url.as_str())
    }
}

/// Strip the @scope/ prefix from an npm package name
pub fn unscoped(name: &str) -> &str {
    match name.strip_prefix('@') {
        Some(rest) => rest.split_once('/').map(|(_, n)| n).unwrap_or(name),
        None => name,
    }
}

/// Validate an npm-style package name
///
/// Accepts `name` or `@scope/name` where both segments are lowercase npm
/// identifiers.
pub fn validate_package_name(name: &str) -> Result<()> {
    let re = regex::Regex::new(r"^(@[a-z0-9][a-z0-9._-]*/)?[a-z0-9][a-z0-9._-]*$")
        .map_err(|e| Error::Other(format!("name pattern failed to compile: {}", e)))?;

    if re.is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidPackageName(name.to_string()))
    }
}

/// Rename a package, propagating the change to the places that embed it.
///
/// Updates the manifest name, renames `src/<old>` to `src/<new>` when the
/// package uses the src-subfolder convention, and rewrites a `test/`
/// harness manifest that depends on the package by its old name.
pub fn set_package_name<P: AsRef<Path>>(package_root: P, new_name: &str) -> Result<()> {
    let package_root = package_root.as_ref();
    validate_package_name(new_name)?;

    let mut manifest = PackageManifest::load(package_root)?;
    let old_name = manifest.name.clone();
    let old_unscoped = unscoped(&old_name).to_string();
    let new_unscoped = unscoped(new_name).to_string();

    manifest.name = new_name.to_string();
    manifest.save(package_root)?;

    // src/<name> subfolder convention
    let old_src = package_root.join("src").join(&old_unscoped);
    let new_src = package_root.join("src").join(&new_unscoped);
    if old_src.is_dir() && old_src != new_src {
        fs::rename(&old_src, &new_src)?;
    }

    // Test harness keeps a file: dependency on the package under test
    let test_manifest = package_root.join("test").join(MANIFEST_NAME);
    if test_manifest.exists() {
        crate::jsonfile::transform_json_file(&test_manifest, |mut doc: serde_json::Value| {
            if let Some(deps) = doc.get_mut("dependencies").and_then(|d| d.as_object_mut()) {
                if let Some(spec) = deps.remove(&old_name) {
                    deps.insert(new_name.to_string(), spec);
                }
            }
            Ok(doc)
        })?;
    }

    Ok(())
}
