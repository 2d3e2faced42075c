//! Package path/info resolution
//!
//! Given a package root, this module computes everything the sync and
//! registry layers need to know about where the package lives and where it
//! installs: whether the package sits under a project's `node_modules`, the
//! Unity project root, the install target under `Assets/`, and the package's
//! own Unity source subfolder.
//!
//! Resolution is pure path assembly driven by `package.json` config fields
//! and caller overrides; nothing here touches the filesystem beyond reading
//! the manifest and probing which source-layout convention the package uses.
//!
//! # Examples
//!
//! ```no_run
//! use unpm::{InfoOptions, PackageInfo};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let info = PackageInfo::resolve("node_modules/my-pkg", &InfoOptions::default())?;
//! println!("installs to {}", info.unity_install_path.display());
//! # Ok(())
//! # }
//! ```

use crate::manifest::{unscoped, PackageManifest};
use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Caller overrides for [`PackageInfo::resolve`]
#[derive(Debug, Clone, Default)]
pub struct InfoOptions {
    /// Unity project root, for packages not installed under node_modules
    pub project_root: Option<PathBuf>,

    /// Scope override (wins over `config.scope`)
    pub scope: Option<String>,

    /// Install path override, relative to the project root (wins over
    /// `config.unpm.install_path` and the default convention)
    pub install_path: Option<String>,
}

/// Resolved install/source information for one package
#[derive(Debug, Clone)]
pub struct PackageInfo {
    pub manifest: PackageManifest,

    /// Absolute path of the package root
    pub package_root: PathBuf,

    /// True when the package root sits under a node_modules directory
    pub is_dependency_install: bool,

    /// Absolute path of the Unity project root
    pub unity_project_root: PathBuf,

    /// Install target relative to the project root
    pub install_path: PathBuf,

    /// Absolute install target under Assets/
    pub unity_install_path: PathBuf,

    /// Absolute path of the package's Unity source subfolder
    pub package_unity_src: PathBuf,

    /// Samples source directory, when the package ships one
    pub samples_src: Option<PathBuf>,

    /// Install target for samples, when the package ships them
    pub unity_samples_path: Option<PathBuf>,
}

impl PackageInfo {
    /// Resolve package info from a package root directory.
    ///
    /// Fails when package.json is missing or invalid, or when no Unity
    /// project root can be determined.
    pub fn resolve<P: AsRef<Path>>(package_root: P, options: &InfoOptions) -> Result<Self> {
        let package_root = absolute(package_root.as_ref())?;
        let manifest = PackageManifest::load(&package_root)?;

        let dependency_project_root = project_root_above_node_modules(&package_root);
        let is_dependency_install = dependency_project_root.is_some();

        let unity_project_root = match options.project_root.as_ref() {
            Some(root) => absolute(root)?,
            None => dependency_project_root.ok_or_else(|| {
                Error::NoUnityProject(format!(" for package '{}'", manifest.name))
            })?,
        };

        let scope = options
            .scope
            .clone()
            .or_else(|| manifest.scope().map(String::from));

        let install_path = resolve_install_path(&manifest, options, scope.as_deref());
        let unity_install_path = unity_project_root.join(&install_path);
        let package_unity_src = resolve_unity_src(&manifest, &package_root);

        let samples_dir = package_root.join("Samples");
        let (samples_src, unity_samples_path) = if samples_dir.is_dir() {
            let mut samples_rel = PathBuf::from("Assets").join("Samples").join("packages");
            if let Some(scope) = scope.as_deref() {
                samples_rel.push(scope);
            }
            samples_rel.push(manifest.unscoped_name());
            (Some(samples_dir), Some(unity_project_root.join(samples_rel)))
        } else {
            (None, None)
        };

        Ok(Self {
            manifest,
            package_root,
            is_dependency_install,
            unity_project_root,
            install_path,
            unity_install_path,
            package_unity_src,
            samples_src,
            unity_samples_path,
        })
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }
}

/// Install path relative to the project root.
///
/// Precedence: caller override, then `config.unpm.install_path`, then the
/// `Assets/[Plugins/]packages/[scope/]<name>` convention.
fn resolve_install_path(
    manifest: &PackageManifest,
    options: &InfoOptions,
    scope: Option<&str>,
) -> PathBuf {
    if let Some(path) = options.install_path.as_deref() {
        return PathBuf::from(path);
    }
    if let Some(path) = manifest.unpm_options().and_then(|o| o.install_path.as_deref()) {
        return PathBuf::from(path);
    }

    let flat = manifest.unpm_options().map(|o| o.flat_install).unwrap_or(false);

    let mut path = PathBuf::from("Assets");
    if !flat {
        path.push("Plugins");
    }
    path.push("packages");
    if let Some(scope) = scope {
        path.push(scope);
    }
    path.push(manifest.unscoped_name());
    path
}

/// The package's Unity source subfolder.
///
/// `config.unpm.src_path` wins; otherwise `Runtime/` when present, falling
/// back to the `src/<name>` convention.
fn resolve_unity_src(manifest: &PackageManifest, package_root: &Path) -> PathBuf {
    if let Some(src) = manifest.unpm_options().and_then(|o| o.src_path.as_deref()) {
        return package_root.join(src);
    }

    let runtime = package_root.join("Runtime");
    if runtime.is_dir() {
        return runtime;
    }

    package_root.join("src").join(manifest.unscoped_name())
}

/// Unity project root for a dependency install: the directory above the
/// topmost node_modules component, or None when the path has no
/// node_modules ancestor.
fn project_root_above_node_modules(package_root: &Path) -> Option<PathBuf> {
    let mut root = PathBuf::new();
    for component in package_root.components() {
        if let Component::Normal(name) = component {
            if name == "node_modules" {
                return Some(root);
            }
        }
        root.push(component.as_os_str());
    }
    None
}

/// Absolutize without requiring the path to exist on disk
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize(path))
    } else {
        Ok(normalize(&std::env::current_dir()?.join(path)))
    }
}

/// Collapse `.` and `..` components lexically
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Strip the scope from a package name spec like `@acme/pkg`, keeping the
/// scope around for path assembly.
pub fn split_scoped_name(name: &str) -> (Option<&str>, &str) {
    match name.strip_prefix('@') {
        Some(rest) => match rest.split_once('/') {
            Some((scope, pkg)) => (Some(scope), pkg),
            None => (None, name),
        },
        None => (None, unscoped(name)),
    }
}
