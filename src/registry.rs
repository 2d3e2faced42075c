//! Sidecar registries tracking which npm packages are mirrored into a Unity
//! project and where
//!
//! Two JSON documents live at the Unity project root:
//!
//! - `unpm-local.json` - per-package record of what is actually installed:
//!   version, repository, install path, source path, samples path, and the
//!   local clone when one exists. Created on first install, updated on every
//!   sync.
//! - `unpm-packages.json` - durable conventions: explicit per-package
//!   repository/install-path entries plus scope templates whose
//!   `{package_name}` placeholder lets unpm guess locations for packages
//!   that were never recorded explicitly.
//!
//! Both are read fresh from disk per operation and rewritten whole through
//! the [`crate::jsonfile`] pipeline.

use crate::pkginfo::{split_scoped_name, PackageInfo};
use crate::{jsonfile, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const LOCAL_REGISTRY_NAME: &str = "unpm-local.json";
pub const PACKAGES_REGISTRY_NAME: &str = "unpm-packages.json";

/// Placeholder expanded in scope-template strings
pub const PACKAGE_NAME_PLACEHOLDER: &str = "{package_name}";

/// unpm-local.json - what is installed in this project right now
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnpmLocal {
    #[serde(default)]
    pub packages: BTreeMap<String, LocalEntry>,
}

/// One installed package as recorded in unpm-local.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalEntry {
    pub name: String,

    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Install target relative to the project root
    pub install_path: String,

    /// Unity source subfolder relative to the package root
    pub src_path: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples_path: Option<String>,

    /// Local working clone of the package repository, when one was made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone_path: Option<String>,

    /// Last sync, RFC 3339
    pub updated: String,
}

/// unpm-packages.json - conventions that outlive individual installs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnpmPackages {
    #[serde(default)]
    pub packages: BTreeMap<String, PackageEntry>,

    #[serde(default)]
    pub scopes: BTreeMap<String, ScopeTemplate>,
}

/// Explicit per-package convention entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageEntry {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_path: Option<String>,
}

/// User-authored scope convention with `{package_name}` placeholders
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_path: Option<String>,
}

impl UnpmLocal {
    pub fn path<P: AsRef<Path>>(project_root: P) -> PathBuf {
        project_root.as_ref().join(LOCAL_REGISTRY_NAME)
    }

    /// Load the registry, creating an empty document on disk when missing
    pub fn ensure<P: AsRef<Path>>(project_root: P) -> Result<Self> {
        jsonfile::transform_json_file_or_default(Self::path(project_root), Ok)
    }

    /// Load the registry without creating it
    pub fn load<P: AsRef<Path>>(project_root: P) -> Result<Option<Self>> {
        let path = Self::path(project_root);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(jsonfile::read_json(path)?))
    }

    /// Read-merge-write the entry for a synced package.
    ///
    /// Creates the entry on first install; on later syncs updates version,
    /// paths and timestamp while preserving fields this sync does not know
    /// (notably `clone_path`).
    pub fn record<P: AsRef<Path>>(project_root: P, info: &PackageInfo) -> Result<LocalEntry> {
        let project_root = project_root.as_ref();
        let entry = local_entry_for(project_root, info);
        let name = info.name().to_string();

        let updated =
            jsonfile::transform_json_file_or_default(Self::path(project_root), |mut doc: Self| {
                let merged = match doc.packages.remove(&name) {
                    Some(existing) => LocalEntry {
                        clone_path: existing.clone_path,
                        ..entry.clone()
                    },
                    None => entry.clone(),
                };
                doc.packages.insert(name.clone(), merged);
                Ok(doc)
            })?;

        Ok(updated
            .packages
            .get(&name)
            .cloned()
            .unwrap_or(entry))
    }

    /// Record the local clone directory for a package
    pub fn set_clone_path<P: AsRef<Path>>(
        project_root: P,
        package_name: &str,
        clone_path: &Path,
    ) -> Result<()> {
        let package_name = package_name.to_string();
        let clone_path = clone_path.display().to_string();

        jsonfile::transform_json_file_or_default(
            Self::path(project_root),
            move |mut doc: Self| {
                match doc.packages.get_mut(&package_name) {
                    Some(entry) => {
                        entry.clone_path = Some(clone_path);
                        entry.updated = now();
                    }
                    None => {
                        return Err(Error::PackageNotFound(package_name.clone()));
                    }
                }
                Ok(doc)
            },
        )?;
        Ok(())
    }

    /// Bump the sync timestamp for a package
    pub fn touch<P: AsRef<Path>>(project_root: P, package_name: &str) -> Result<()> {
        let package_name = package_name.to_string();
        jsonfile::transform_json_file_or_default(
            Self::path(project_root),
            move |mut doc: Self| {
                if let Some(entry) = doc.packages.get_mut(&package_name) {
                    entry.updated = now();
                }
                Ok(doc)
            },
        )?;
        Ok(())
    }
}

impl UnpmPackages {
    pub fn path<P: AsRef<Path>>(project_root: P) -> PathBuf {
        project_root.as_ref().join(PACKAGES_REGISTRY_NAME)
    }

    /// Load the registry, creating an empty document on disk when missing
    pub fn ensure<P: AsRef<Path>>(project_root: P) -> Result<Self> {
        jsonfile::transform_json_file_or_default(Self::path(project_root), Ok)
    }

    /// Load the registry without creating it
    pub fn load<P: AsRef<Path>>(project_root: P) -> Result<Option<Self>> {
        let path = Self::path(project_root);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(jsonfile::read_json(path)?))
    }

    /// Read-merge-write the convention entry for a synced package.
    ///
    /// Fields already present win only when the incoming info has nothing
    /// for them; a sync always refreshes what it knows.
    pub fn record<P: AsRef<Path>>(project_root: P, info: &PackageInfo) -> Result<()> {
        let name = info.name().to_string();
        let repository = info.manifest.repository_url().map(String::from);
        let install_path = Some(info.install_path.display().to_string());

        jsonfile::transform_json_file_or_default(
            Self::path(project_root),
            move |mut doc: Self| {
                let merged = match doc.packages.remove(&name) {
                    Some(existing) => PackageEntry {
                        name: name.clone(),
                        repository: repository.clone().or(existing.repository),
                        install_path: install_path.clone().or(existing.install_path),
                    },
                    None => PackageEntry {
                        name: name.clone(),
                        repository: repository.clone(),
                        install_path: install_path.clone(),
                    },
                };
                doc.packages.insert(name.clone(), merged);
                Ok(doc)
            },
        )?;
        Ok(())
    }

    /// The scope template that applies to a package name.
    ///
    /// A scoped name selects its own scope's template. A bare name falls
    /// back to the template only when exactly one scope is configured.
    fn template_for(&self, package_name: &str) -> Option<&ScopeTemplate> {
        let (scope, _) = split_scoped_name(package_name);
        match scope {
            Some(scope) => self.scopes.get(scope),
            None => {
                if self.scopes.len() == 1 {
                    self.scopes.values().next()
                } else {
                    None
                }
            }
        }
    }
}

/// Expand the `{package_name}` placeholder in a scope-template string
pub fn expand_template(template: &str, package_name: &str) -> String {
    template.replace(PACKAGE_NAME_PLACEHOLDER, package_name)
}

/// Where a package installs in this project, relative to the project root.
///
/// Precedence: explicit unpm-local.json entry, explicit unpm-packages.json
/// entry, scope-template expansion, then the default convention path.
pub fn find_install_path_for_package<P: AsRef<Path>>(
    project_root: P,
    package_name: &str,
) -> Result<PathBuf> {
    let project_root = project_root.as_ref();

    if let Some(local) = UnpmLocal::load(project_root)? {
        if let Some(entry) = local.packages.get(package_name) {
            return Ok(PathBuf::from(&entry.install_path));
        }
    }

    let (scope, bare_name) = split_scoped_name(package_name);

    if let Some(packages) = UnpmPackages::load(project_root)? {
        if let Some(entry) = packages.packages.get(package_name) {
            if let Some(path) = entry.install_path.as_deref() {
                return Ok(PathBuf::from(path));
            }
        }
        if let Some(template) = packages.template_for(package_name) {
            if let Some(path) = template.install_path.as_deref() {
                return Ok(PathBuf::from(expand_template(path, bare_name)));
            }
        }
    }

    // Default convention when nothing is recorded
    let mut path = PathBuf::from("Assets").join("Plugins").join("packages");
    if let Some(scope) = scope {
        path.push(scope);
    }
    path.push(bare_name);
    Ok(path)
}

/// Repository URL for a package, from explicit entries or scope templates
pub fn find_repository_for_package<P: AsRef<Path>>(
    project_root: P,
    package_name: &str,
) -> Result<String> {
    let project_root = project_root.as_ref();

    if let Some(local) = UnpmLocal::load(project_root)? {
        if let Some(url) = local
            .packages
            .get(package_name)
            .and_then(|e| e.repository.clone())
        {
            return Ok(url);
        }
    }

    if let Some(packages) = UnpmPackages::load(project_root)? {
        if let Some(url) = packages
            .packages
            .get(package_name)
            .and_then(|e| e.repository.clone())
        {
            return Ok(url);
        }
        if let Some(url) = packages
            .template_for(package_name)
            .and_then(|t| t.repository.as_deref())
        {
            let (_, bare_name) = split_scoped_name(package_name);
            return Ok(expand_template(url, bare_name));
        }
    }

    Err(Error::PackageNotFound(format!(
        "{} (no repository recorded in {} or {})",
        package_name, LOCAL_REGISTRY_NAME, PACKAGES_REGISTRY_NAME
    )))
}

fn local_entry_for(project_root: &Path, info: &PackageInfo) -> LocalEntry {
    let src_path = info
        .package_unity_src
        .strip_prefix(&info.package_root)
        .unwrap_or(&info.package_unity_src)
        .display()
        .to_string();

    let samples_path = info.unity_samples_path.as_ref().map(|p| {
        p.strip_prefix(project_root)
            .unwrap_or(p)
            .display()
            .to_string()
    });

    LocalEntry {
        name: info.name().to_string(),
        version: info.version().to_string(),
        repository: info.manifest.repository_url().map(String::from),
        install_path: info.install_path.display().to_string(),
        src_path,
        samples_path,
        clone_path: None,
        updated: now(),
    }
}

impl UnpmLocal {
    /// Drop a package's entry, returning it when it existed
    pub fn remove<P: AsRef<Path>>(
        project_root: P,
        package_name: &str,
    ) -> Result<Option<LocalEntry>> {
        let package_name = package_name.to_string();
        let mut removed = None;

        jsonfile::transform_json_file_or_default(
            Self::path(project_root),
            |mut doc: Self| {
                removed = doc.packages.remove(&package_name);
                Ok(doc)
            },
        )?;

        Ok(removed)
    }
}

/// How far out of step a registry entry is with the filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Warning,
    Error,
}

/// One inconsistency found by [`audit_project`]
#[derive(Debug, Clone)]
pub struct RegistryIssue {
    pub package: String,
    pub severity: IssueSeverity,
    pub message: String,
}

/// Reconcile the registries against the filesystem and node_modules.
///
/// Reports entries whose install directory or node_modules copy is gone,
/// version drift between the registry and node_modules, recorded clones
/// that no longer exist, and installed directories no registry entry
/// accounts for.
pub fn audit_project<P: AsRef<Path>>(project_root: P) -> Result<Vec<RegistryIssue>> {
    let project_root = project_root.as_ref();
    let mut issues = Vec::new();

    let local = UnpmLocal::load(project_root)?.unwrap_or_default();

    for (name, entry) in &local.packages {
        let install_dir = project_root.join(&entry.install_path);
        if !install_dir.is_dir() {
            issues.push(RegistryIssue {
                package: name.clone(),
                severity: IssueSeverity::Error,
                message: format!("install directory missing: {}", entry.install_path),
            });
        }

        let package_root = project_root.join("node_modules").join(name);
        if !package_root.is_dir() {
            issues.push(RegistryIssue {
                package: name.clone(),
                severity: IssueSeverity::Warning,
                message: "not present under node_modules".to_string(),
            });
        } else if let Ok(manifest) = crate::manifest::PackageManifest::load(&package_root) {
            if manifest.version != entry.version {
                issues.push(RegistryIssue {
                    package: name.clone(),
                    severity: IssueSeverity::Warning,
                    message: format!(
                        "version drift: registry has {}, node_modules has {} (re-run unpm install {})",
                        entry.version, manifest.version, name
                    ),
                });
            }
        }

        if let Some(clone_path) = &entry.clone_path {
            if !Path::new(clone_path).is_dir() {
                issues.push(RegistryIssue {
                    package: name.clone(),
                    severity: IssueSeverity::Warning,
                    message: format!("recorded clone missing: {}", clone_path),
                });
            }
        }
    }

    issues.extend(unregistered_installs(project_root, &local)?);

    Ok(issues)
}

/// Directories under Assets/Plugins/packages that no registry entry claims
fn unregistered_installs(project_root: &Path, local: &UnpmLocal) -> Result<Vec<RegistryIssue>> {
    let packages_root = project_root.join("Assets").join("Plugins").join("packages");
    if !packages_root.is_dir() {
        return Ok(Vec::new());
    }

    let claimed: Vec<PathBuf> = local
        .packages
        .values()
        .map(|e| project_root.join(&e.install_path))
        .collect();

    let mut issues = Vec::new();
    for entry in std::fs::read_dir(&packages_root)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }

        if claimed.iter().any(|c| *c == path) {
            continue;
        }

        let mut children = Vec::new();
        for child in std::fs::read_dir(&path)? {
            let child = child?.path();
            if child.is_dir() {
                children.push(child);
            }
        }

        // A directory with claimed children is a scope directory; report
        // only the children nothing claims. Anything else is itself an
        // unregistered install.
        let has_claimed_child = children.iter().any(|c| claimed.iter().any(|p| p == c));
        let unclaimed: Vec<&PathBuf> = if has_claimed_child {
            children
                .iter()
                .filter(|c| !claimed.iter().any(|p| p == *c))
                .collect()
        } else {
            Vec::new()
        };

        let report: Vec<&PathBuf> = if has_claimed_child {
            unclaimed
        } else {
            vec![&path]
        };

        for dir in report {
            let relative = dir
                .strip_prefix(project_root)
                .unwrap_or(dir)
                .display()
                .to_string();
            issues.push(RegistryIssue {
                package: dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| relative.clone()),
                severity: IssueSeverity::Warning,
                message: format!(
                    "installed at {} but not recorded in {}",
                    relative, LOCAL_REGISTRY_NAME
                ),
            });
        }
    }

    Ok(issues)
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
