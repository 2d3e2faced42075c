//! Filtered tree copy between package source and the Unity Assets folder
//!
//! Both sync directions go through the same walkdir-based copy:
//! install-to-Unity copies the package's Unity source subfolder (and
//! Samples, when present) under `Assets/`, and copy-from-Unity brings the
//! engine-edited files back into the package. Unity's generated `.meta`
//! files are excluded by default in both directions.
//!
//! # Examples
//!
//! ```no_run
//! use unpm::{CopyOptions, InfoOptions, PackageInfo};
//! use unpm::sync::install_package_to_unity;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let info = PackageInfo::resolve("node_modules/my-pkg", &InfoOptions::default())?;
//! let stats = install_package_to_unity(&info, &CopyOptions::default())?;
//! println!("copied {} files", stats.files_copied);
//! # Ok(())
//! # }
//! ```

use crate::pkginfo::{InfoOptions, PackageInfo};
use crate::registry::{self, UnpmLocal, UnpmPackages};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Options for [`copy_tree`] and the sync entry points
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Delete the target directory contents before copying
    pub overwrite: bool,

    /// Copy `.meta` files too (excluded by default)
    pub include_meta: bool,

    /// Additional substring patterns to exclude
    pub exclude: Vec<String>,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            include_meta: false,
            exclude: Vec::new(),
        }
    }
}

/// Counts reported by a tree copy
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyStats {
    pub files_copied: usize,
    pub files_skipped: usize,
}

impl CopyOptions {
    fn includes(&self, path: &Path) -> bool {
        if !self.include_meta && path.extension().and_then(|e| e.to_str()) == Some("meta") {
            return false;
        }
        let path_str = path.to_string_lossy();
        !self.exclude.iter().any(|pattern| path_str.contains(pattern))
    }
}

/// Copy a source tree into a target directory, applying the filter.
///
/// With `overwrite`, the target's previous contents are removed first so
/// files deleted at the source disappear from the target too.
pub fn copy_tree<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dst: Q,
    options: &CopyOptions,
) -> Result<CopyStats> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !src.is_dir() {
        return Err(Error::Other(format!(
            "Source directory does not exist: {}",
            src.display()
        )));
    }

    if options.overwrite && dst.exists() {
        fs::remove_dir_all(dst)?;
    }
    fs::create_dir_all(dst)?;

    let mut stats = CopyStats::default();

    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| Error::Other(format!("walk failed: {}", e)))?;
        let path = entry.path();
        if path == src {
            continue;
        }

        let relative = path
            .strip_prefix(src)
            .map_err(|e| Error::Other(format!("walk escaped source root: {}", e)))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if !options.includes(relative) {
            stats.files_skipped += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &target)?;
        stats.files_copied += 1;
    }

    Ok(stats)
}

/// Install a package's Unity source (and samples) into the project's
/// Assets folder, then record the package in both registries.
pub fn install_package_to_unity(info: &PackageInfo, options: &CopyOptions) -> Result<CopyStats> {
    if !info.package_unity_src.is_dir() {
        return Err(Error::Other(format!(
            "Package '{}' has no Unity source at {}\n\n\
             Hint: expected a Runtime/ folder, a src/{}/ folder, or a\n\
             config.unpm.src_path entry in package.json",
            info.name(),
            info.package_unity_src.display(),
            info.manifest.unscoped_name()
        )));
    }

    let mut stats = copy_tree(&info.package_unity_src, &info.unity_install_path, options)?;

    if let (Some(samples_src), Some(samples_dst)) =
        (info.samples_src.as_ref(), info.unity_samples_path.as_ref())
    {
        let sample_stats = copy_tree(samples_src, samples_dst, options)?;
        stats.files_copied += sample_stats.files_copied;
        stats.files_skipped += sample_stats.files_skipped;
    }

    UnpmLocal::record(&info.unity_project_root, info)?;
    UnpmPackages::record(&info.unity_project_root, info)?;

    Ok(stats)
}

/// Copy the Unity-edited install back into the package source tree.
///
/// The Unity copy wins; `.meta` files stay behind unless `include_meta` is
/// set. Updates the package's sync timestamp in unpm-local.json.
pub fn copy_package_from_unity(info: &PackageInfo, options: &CopyOptions) -> Result<CopyStats> {
    if !info.unity_install_path.is_dir() {
        return Err(Error::Other(format!(
            "Package '{}' is not installed at {}\n\n\
             Hint: run 'unpm install {}' first.",
            info.name(),
            info.unity_install_path.display(),
            info.name()
        )));
    }

    let mut stats = copy_tree(&info.unity_install_path, &info.package_unity_src, options)?;

    if let (Some(samples_src), Some(samples_dst)) =
        (info.samples_src.as_ref(), info.unity_samples_path.as_ref())
    {
        if samples_dst.is_dir() {
            let sample_stats = copy_tree(samples_dst, samples_src, options)?;
            stats.files_copied += sample_stats.files_copied;
            stats.files_skipped += sample_stats.files_skipped;
        }
    }

    UnpmLocal::touch(&info.unity_project_root, info.name())?;

    Ok(stats)
}

/// What [`remove_package_from_unity`] actually deleted
#[derive(Debug, Clone, Default)]
pub struct RemovalReport {
    pub install_dir: Option<PathBuf>,
    pub samples_dir: Option<PathBuf>,
    pub entry_removed: bool,
}

/// Remove a package's install from Assets/ and drop its unpm-local.json
/// entry.
///
/// The unpm-packages.json convention entry is kept so a later install
/// lands in the same place. Unity's sibling `<dir>.meta` files are removed
/// along with the directories, and an emptied scope directory is cleaned
/// up too.
pub fn remove_package_from_unity<P: AsRef<Path>>(
    project_root: P,
    package_name: &str,
) -> Result<RemovalReport> {
    let project_root = project_root.as_ref();
    let mut report = RemovalReport::default();

    let entry = UnpmLocal::load(project_root)?
        .and_then(|local| local.packages.get(package_name).cloned());

    let install_rel = match &entry {
        Some(e) => PathBuf::from(&e.install_path),
        None => registry::find_install_path_for_package(project_root, package_name)?,
    };
    let install_dir = project_root.join(&install_rel);
    if install_dir.is_dir() {
        remove_dir_with_meta(&install_dir)?;
        remove_empty_scope_dir(&install_dir)?;
        report.install_dir = Some(install_dir);
    }

    if let Some(samples_rel) = entry.as_ref().and_then(|e| e.samples_path.as_deref()) {
        let samples_dir = project_root.join(samples_rel);
        if samples_dir.is_dir() {
            remove_dir_with_meta(&samples_dir)?;
            remove_empty_scope_dir(&samples_dir)?;
            report.samples_dir = Some(samples_dir);
        }
    }

    report.entry_removed = UnpmLocal::remove(project_root, package_name)?.is_some();

    Ok(report)
}

/// Remove a directory plus the `<dir>.meta` file Unity keeps beside it
fn remove_dir_with_meta(dir: &Path) -> Result<()> {
    fs::remove_dir_all(dir)?;
    if let (Some(parent), Some(name)) = (dir.parent(), dir.file_name()) {
        let meta = parent.join(format!("{}.meta", name.to_string_lossy()));
        if meta.is_file() {
            fs::remove_file(meta)?;
        }
    }
    Ok(())
}

/// Drop the parent scope directory when removing the package emptied it
fn remove_empty_scope_dir(removed: &Path) -> Result<()> {
    let Some(parent) = removed.parent() else {
        return Ok(());
    };
    if parent.file_name().map(|n| n == "packages").unwrap_or(true) {
        return Ok(());
    }
    if parent.is_dir() && fs::read_dir(parent)?.next().is_none() {
        remove_dir_with_meta(parent)?;
    }
    Ok(())
}

/// Re-install every package recorded in unpm-local.json from its
/// node_modules copy.
///
/// Per-package failures don't abort the rest; each package reports its own
/// outcome.
pub fn sync_project<P: AsRef<Path>>(
    project_root: P,
    options: &CopyOptions,
) -> Result<Vec<(String, Result<CopyStats>)>> {
    let project_root = project_root.as_ref();
    let local = UnpmLocal::load(project_root)?.ok_or_else(|| {
        Error::Other(format!(
            "No {} in {} (nothing to sync)",
            crate::registry::LOCAL_REGISTRY_NAME,
            project_root.display()
        ))
    })?;

    let mut outcomes = Vec::new();
    for name in local.packages.keys() {
        let package_root = project_root.join("node_modules").join(name);
        let outcome = if package_root.is_dir() {
            PackageInfo::resolve(
                &package_root,
                &InfoOptions {
                    project_root: Some(project_root.to_path_buf()),
                    ..Default::default()
                },
            )
            .and_then(|info| install_package_to_unity(&info, options))
        } else {
            Err(Error::PackageNotFound(format!(
                "{} (not in node_modules)",
                name
            )))
        };
        outcomes.push((name.clone(), outcome));
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkginfo::InfoOptions;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn make_package(project: &Path, name: &str) -> PathBuf {
        let pkg_root = project.join("node_modules").join(name);
        let src = pkg_root.join("src").join(name);
        fs::create_dir_all(&src).unwrap();
        fs::write(
            pkg_root.join("package.json"),
            serde_json::to_string_pretty(&json!({"name": name, "version": "1.0.0"})).unwrap(),
        )
        .unwrap();
        fs::write(src.join("Widget.cs"), "// widget").unwrap();
        fs::write(src.join("Widget.cs.meta"), "guid: abc").unwrap();
        fs::create_dir_all(src.join("Editor")).unwrap();
        fs::write(src.join("Editor").join("WidgetEditor.cs"), "// editor").unwrap();
        pkg_root
    }

    #[test]
    fn test_copy_tree_excludes_meta_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.cs"), "a").unwrap();
        fs::write(src.join("a.cs.meta"), "meta").unwrap();

        let dst = temp_dir.path().join("dst");
        let stats = copy_tree(&src, &dst, &CopyOptions::default()).unwrap();

        assert_eq!(stats.files_copied, 1);
        assert_eq!(stats.files_skipped, 1);
        assert!(dst.join("a.cs").exists());
        assert!(!dst.join("a.cs.meta").exists());
    }

    #[test]
    fn test_copy_tree_include_meta() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.cs"), "a").unwrap();
        fs::write(src.join("a.cs.meta"), "meta").unwrap();

        let dst = temp_dir.path().join("dst");
        let options = CopyOptions {
            include_meta: true,
            ..Default::default()
        };
        let stats = copy_tree(&src, &dst, &options).unwrap();

        assert_eq!(stats.files_copied, 2);
        assert!(dst.join("a.cs.meta").exists());
    }

    #[test]
    fn test_copy_tree_overwrite_removes_stale_files() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("keep.cs"), "keep").unwrap();

        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("stale.cs"), "stale").unwrap();

        let options = CopyOptions {
            overwrite: true,
            ..Default::default()
        };
        copy_tree(&src, &dst, &options).unwrap();

        assert!(dst.join("keep.cs").exists());
        assert!(!dst.join("stale.cs").exists());
    }

    #[test]
    fn test_copy_tree_without_overwrite_keeps_extra_files() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("new.cs"), "new").unwrap();

        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("existing.cs"), "existing").unwrap();

        copy_tree(&src, &dst, &CopyOptions::default()).unwrap();

        assert!(dst.join("new.cs").exists());
        assert!(dst.join("existing.cs").exists());
    }

    #[test]
    fn test_copy_tree_custom_exclude() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir_all(src.join("Tests")).unwrap();
        fs::write(src.join("a.cs"), "a").unwrap();
        fs::write(src.join("Tests").join("b.cs"), "b").unwrap();

        let dst = temp_dir.path().join("dst");
        let options = CopyOptions {
            exclude: vec!["Tests".to_string()],
            ..Default::default()
        };
        copy_tree(&src, &dst, &options).unwrap();

        assert!(dst.join("a.cs").exists());
        assert!(!dst.join("Tests").join("b.cs").exists());
    }

    #[test]
    fn test_copy_tree_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let result = copy_tree(
            temp_dir.path().join("missing"),
            temp_dir.path().join("dst"),
            &CopyOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_install_to_unity_copies_and_records() {
        let temp_dir = TempDir::new().unwrap();
        let pkg_root = make_package(temp_dir.path(), "my-pkg");
        let info = PackageInfo::resolve(&pkg_root, &InfoOptions::default()).unwrap();

        let stats = install_package_to_unity(&info, &CopyOptions::default()).unwrap();
        assert_eq!(stats.files_copied, 2);

        let installed = temp_dir
            .path()
            .join("Assets/Plugins/packages/my-pkg");
        assert!(installed.join("Widget.cs").exists());
        assert!(installed.join("Editor/WidgetEditor.cs").exists());
        assert!(!installed.join("Widget.cs.meta").exists());

        let local = UnpmLocal::load(temp_dir.path()).unwrap().unwrap();
        assert!(local.packages.contains_key("my-pkg"));
        let packages = UnpmPackages::load(temp_dir.path()).unwrap().unwrap();
        assert!(packages.packages.contains_key("my-pkg"));
    }

    #[test]
    fn test_install_to_unity_missing_src_errors() {
        let temp_dir = TempDir::new().unwrap();
        let pkg_root = temp_dir.path().join("node_modules").join("empty-pkg");
        fs::create_dir_all(&pkg_root).unwrap();
        fs::write(
            pkg_root.join("package.json"),
            serde_json::to_string_pretty(&json!({"name": "empty-pkg", "version": "1.0.0"}))
                .unwrap(),
        )
        .unwrap();

        let info = PackageInfo::resolve(&pkg_root, &InfoOptions::default()).unwrap();
        let result = install_package_to_unity(&info, &CopyOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_copy_from_unity_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let pkg_root = make_package(temp_dir.path(), "my-pkg");
        let info = PackageInfo::resolve(&pkg_root, &InfoOptions::default()).unwrap();
        install_package_to_unity(&info, &CopyOptions::default()).unwrap();

        // Simulate Unity edits: change a file, add a new one plus its .meta
        let installed = temp_dir.path().join("Assets/Plugins/packages/my-pkg");
        fs::write(installed.join("Widget.cs"), "// edited in unity").unwrap();
        fs::write(installed.join("New.cs"), "// new").unwrap();
        fs::write(installed.join("New.cs.meta"), "guid: def").unwrap();

        let stats = copy_package_from_unity(&info, &CopyOptions::default()).unwrap();
        assert_eq!(stats.files_copied, 3);

        let src = pkg_root.join("src/my-pkg");
        assert_eq!(
            fs::read_to_string(src.join("Widget.cs")).unwrap(),
            "// edited in unity"
        );
        assert!(src.join("New.cs").exists());
        assert!(!src.join("New.cs.meta").exists());
    }

    #[test]
    fn test_copy_from_unity_not_installed() {
        let temp_dir = TempDir::new().unwrap();
        let pkg_root = make_package(temp_dir.path(), "my-pkg");
        let info = PackageInfo::resolve(&pkg_root, &InfoOptions::default()).unwrap();

        let result = copy_package_from_unity(&info, &CopyOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_remove_package_deletes_install_and_entry() {
        let temp_dir = TempDir::new().unwrap();
        let pkg_root = make_package(temp_dir.path(), "my-pkg");
        let info = PackageInfo::resolve(&pkg_root, &InfoOptions::default()).unwrap();
        install_package_to_unity(&info, &CopyOptions::default()).unwrap();

        // Unity's folder meta beside the install dir
        let installed = temp_dir.path().join("Assets/Plugins/packages/my-pkg");
        fs::write(
            temp_dir.path().join("Assets/Plugins/packages/my-pkg.meta"),
            "guid: dir",
        )
        .unwrap();

        let report = remove_package_from_unity(temp_dir.path(), "my-pkg").unwrap();

        assert!(report.entry_removed);
        assert!(!installed.exists());
        assert!(!temp_dir
            .path()
            .join("Assets/Plugins/packages/my-pkg.meta")
            .exists());

        let local = UnpmLocal::load(temp_dir.path()).unwrap().unwrap();
        assert!(local.packages.is_empty());

        // Convention entry survives for later reinstalls
        let packages = UnpmPackages::load(temp_dir.path()).unwrap().unwrap();
        assert!(packages.packages.contains_key("my-pkg"));
    }

    #[test]
    fn test_remove_scoped_package_cleans_scope_dir() {
        let temp_dir = TempDir::new().unwrap();
        let pkg_root = temp_dir.path().join("node_modules").join("widgets");
        let src = pkg_root.join("src").join("widgets");
        fs::create_dir_all(&src).unwrap();
        fs::write(
            pkg_root.join("package.json"),
            serde_json::to_string_pretty(&json!({
                "name": "widgets",
                "version": "1.0.0",
                "config": {"scope": "acme"}
            }))
            .unwrap(),
        )
        .unwrap();
        fs::write(src.join("Widget.cs"), "// widget").unwrap();

        let info = PackageInfo::resolve(&pkg_root, &InfoOptions::default()).unwrap();
        install_package_to_unity(&info, &CopyOptions::default()).unwrap();

        remove_package_from_unity(temp_dir.path(), "widgets").unwrap();

        assert!(!temp_dir
            .path()
            .join("Assets/Plugins/packages/acme")
            .exists());
        assert!(temp_dir.path().join("Assets/Plugins").exists());
    }

    #[test]
    fn test_remove_package_without_install_still_drops_entry() {
        let temp_dir = TempDir::new().unwrap();
        let pkg_root = make_package(temp_dir.path(), "my-pkg");
        let info = PackageInfo::resolve(&pkg_root, &InfoOptions::default()).unwrap();
        UnpmLocal::record(temp_dir.path(), &info).unwrap();

        let report = remove_package_from_unity(temp_dir.path(), "my-pkg").unwrap();
        assert!(report.install_dir.is_none());
        assert!(report.entry_removed);
    }

    #[test]
    fn test_sync_project_reinstalls_recorded_packages() {
        let temp_dir = TempDir::new().unwrap();
        let pkg_root = make_package(temp_dir.path(), "my-pkg");
        let info = PackageInfo::resolve(&pkg_root, &InfoOptions::default()).unwrap();
        install_package_to_unity(&info, &CopyOptions::default()).unwrap();

        // Change the package source, then sync the whole project
        fs::write(
            pkg_root.join("src/my-pkg/Widget.cs"),
            "// updated upstream",
        )
        .unwrap();

        let outcomes = sync_project(temp_dir.path(), &CopyOptions::default()).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].1.is_ok());

        let installed = temp_dir.path().join("Assets/Plugins/packages/my-pkg");
        assert_eq!(
            fs::read_to_string(installed.join("Widget.cs")).unwrap(),
            "// updated upstream"
        );
    }

    #[test]
    fn test_sync_project_reports_missing_node_modules() {
        let temp_dir = TempDir::new().unwrap();
        let pkg_root = make_package(temp_dir.path(), "my-pkg");
        let info = PackageInfo::resolve(&pkg_root, &InfoOptions::default()).unwrap();
        UnpmLocal::record(temp_dir.path(), &info).unwrap();
        fs::remove_dir_all(temp_dir.path().join("node_modules")).unwrap();

        let outcomes = sync_project(temp_dir.path(), &CopyOptions::default()).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].1.is_err());
    }

    #[test]
    fn test_sync_project_without_registry_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = sync_project(temp_dir.path(), &CopyOptions::default());
        assert!(result.is_err());
    }
}
