//! Package template install and update
//!
//! A template is a tar.gz archive of a template repository (codeload-style
//! URL, configurable). Install downloads the archive, extracts it to a temp
//! directory, copies the contents into the target and applies the package
//! name. Update re-downloads and refreshes the template files while leaving
//! the target's package.json identity alone, merging only the template's
//! `scripts` and `dependencies` (template values win, pre-existing keys are
//! preserved).

use crate::manifest::{set_package_name, PackageManifest, MANIFEST_NAME};
use crate::sync::{copy_tree, CopyOptions};
use crate::{jsonfile, Config, Error, Result};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tar::Archive;

/// Options for [`install_template`]
#[derive(Debug, Clone, Default)]
pub struct TemplateOptions {
    /// Archive URL override (defaults to the configured template URL)
    pub url: Option<String>,

    /// Package name to apply after scaffolding
    pub name: Option<String>,
}

/// Entries never copied out of a template archive
const TEMPLATE_JUNK: &[&str] = &[".git", ".DS_Store", "node_modules"];

/// Scaffold a new package from the template archive.
///
/// Refuses to scaffold into a directory that already has a package.json.
pub fn install_template<P: AsRef<Path>>(target: P, options: &TemplateOptions) -> Result<()> {
    let target = target.as_ref();

    if PackageManifest::exists(target) {
        return Err(Error::Other(format!(
            "{} already exists in {}\n\n\
             Hint: use 'unpm update-package-template' to refresh an\n\
             existing package from the template.",
            MANIFEST_NAME,
            target.display()
        )));
    }

    let url = resolve_url(options.url.as_deref())?;
    let staging = download_and_extract(&url)?;
    let result = (|| {
        let template_root = locate_template_root(staging.path())?;

        fs::create_dir_all(target)?;
        copy_template_contents(&template_root, target, false)?;

        if let Some(name) = options.name.as_deref() {
            set_package_name(target, name)?;
        }
        Ok(())
    })();
    staging.cleanup();
    result
}

/// Refresh an existing package from the template archive.
///
/// Template files are copied over the target except the root package.json;
/// the template's `scripts` and `dependencies` are merged into the target
/// manifest with template precedence.
pub fn update_template<P: AsRef<Path>>(target: P, url_override: Option<&str>) -> Result<()> {
    let target = target.as_ref();

    if !PackageManifest::exists(target) {
        return Err(Error::InvalidManifest(format!(
            "no {} in {} (nothing to update)",
            MANIFEST_NAME,
            target.display()
        )));
    }

    let url = resolve_url(url_override)?;
    let staging = download_and_extract(&url)?;
    let result = (|| {
        let template_root = locate_template_root(staging.path())?;

        copy_template_contents(&template_root, target, true)?;

        let template_manifest_path = template_root.join(MANIFEST_NAME);
        if template_manifest_path.exists() {
            let template_doc: serde_json::Value = jsonfile::read_json(&template_manifest_path)?;
            jsonfile::transform_json_file(
                target.join(MANIFEST_NAME),
                |doc: serde_json::Value| Ok(merge_template_manifest(doc, &template_doc)),
            )?;
        }
        Ok(())
    })();
    staging.cleanup();
    result
}

fn resolve_url(url_override: Option<&str>) -> Result<String> {
    let url = match url_override {
        Some(url) => url.to_string(),
        None => Config::load()?.template.url,
    };

    url::Url::parse(&url)
        .map_err(|e| Error::Other(format!("Invalid template URL '{}': {}", url, e)))?;

    Ok(url)
}

/// Temp extraction directory, removed after use
struct Staging {
    dir: PathBuf,
}

impl Staging {
    fn path(&self) -> &Path {
        &self.dir
    }

    fn cleanup(self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn download_and_extract(url: &str) -> Result<Staging> {
    let staging = Staging {
        dir: env::temp_dir().join(format!("unpm-template-{}", std::process::id())),
    };
    if staging.dir.exists() {
        fs::remove_dir_all(&staging.dir)?;
    }
    fs::create_dir_all(&staging.dir)?;

    let archive_path = staging.dir.join("template.tar.gz");
    if let Err(e) = download_archive(url, &archive_path) {
        staging.cleanup();
        return Err(e);
    }

    let extract_dir = staging.dir.join("extracted");
    fs::create_dir_all(&extract_dir)?;
    let tar_gz = File::open(&archive_path)?;
    let tar = GzDecoder::new(tar_gz);
    let mut archive = Archive::new(tar);
    if let Err(e) = archive.unpack(&extract_dir) {
        staging.cleanup();
        return Err(e.into());
    }

    Ok(staging)
}

fn download_archive(url: &str, output: &Path) -> Result<()> {
    let mut response = reqwest::blocking::get(url)?;

    if !response.status().is_success() {
        return Err(Error::Other(format!(
            "Template download failed: {} returned {}",
            url,
            response.status()
        )));
    }

    let total = response.content_length().unwrap_or(0);
    let progress = if total > 0 {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::with_template("  {bar:30} {bytes}/{total_bytes}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(pb)
    } else {
        None
    };

    let mut file = File::create(output)?;
    let mut buffer = [0u8; 8192];
    loop {
        let read = response.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])?;
        if let Some(pb) = &progress {
            pb.inc(read as u64);
        }
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(())
}

/// The directory holding the template files inside the extracted archive.
///
/// Codeload tarballs wrap everything in a single `repo-ref/` directory;
/// archives without a wrapper use the extraction root directly.
fn locate_template_root(extract_parent: &Path) -> Result<PathBuf> {
    let extract_dir = extract_parent.join("extracted");

    let mut dirs = Vec::new();
    let mut has_files = false;
    for entry in fs::read_dir(&extract_dir)? {
        let entry = entry?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        } else {
            has_files = true;
        }
    }

    match (dirs.len(), has_files) {
        (1, false) => Ok(dirs.remove(0)),
        (0, false) => Err(Error::Other("Template archive is empty".to_string())),
        _ => Ok(extract_dir),
    }
}

fn copy_template_contents(
    template_root: &Path,
    target: &Path,
    skip_root_manifest: bool,
) -> Result<()> {
    let options = CopyOptions {
        overwrite: false,
        include_meta: true,
        exclude: TEMPLATE_JUNK.iter().map(|s| s.to_string()).collect(),
    };

    for entry in fs::read_dir(template_root)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name_str = name.to_string_lossy();

        if TEMPLATE_JUNK.iter().any(|junk| name_str == *junk) {
            continue;
        }
        if skip_root_manifest && name_str == MANIFEST_NAME {
            continue;
        }

        let destination = target.join(&name);
        if path.is_dir() {
            copy_tree(&path, &destination, &options)?;
        } else {
            fs::copy(&path, &destination)?;
        }
    }

    Ok(())
}

/// Merge a template manifest into a target manifest document.
///
/// Only `scripts` and `dependencies` are merged; template values win on
/// conflicting keys, keys the template does not mention are preserved, and
/// everything else in the target document stays untouched.
pub fn merge_template_manifest(
    mut target: serde_json::Value,
    template: &serde_json::Value,
) -> serde_json::Value {
    for section in ["scripts", "dependencies"] {
        let Some(template_map) = template.get(section).and_then(|s| s.as_object()) else {
            continue;
        };

        let target_section = target
            .as_object_mut()
            .map(|obj| {
                obj.entry(section.to_string())
                    .or_insert_with(|| serde_json::Value::Object(Default::default()))
            })
            .and_then(|v| v.as_object_mut());

        if let Some(target_map) = target_section {
            for (key, value) in template_map {
                target_map.insert(key.clone(), value.clone());
            }
        }
    }

    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_merge_template_wins_on_conflicts() {
        let target = json!({
            "name": "my-pkg",
            "version": "1.2.3",
            "scripts": {"test": "old-test", "custom": "keep-me"},
            "dependencies": {"left-pad": "^1.0.0"}
        });
        let template = json!({
            "name": "template",
            "version": "0.0.1",
            "scripts": {"test": "new-test", "build": "added"},
            "dependencies": {"left-pad": "^2.0.0", "rimraf": "^5.0.0"}
        });

        let merged = merge_template_manifest(target, &template);

        // Identity untouched
        assert_eq!(merged["name"], "my-pkg");
        assert_eq!(merged["version"], "1.2.3");

        // Template precedence
        assert_eq!(merged["scripts"]["test"], "new-test");
        assert_eq!(merged["dependencies"]["left-pad"], "^2.0.0");

        // Additions applied, pre-existing keys preserved
        assert_eq!(merged["scripts"]["build"], "added");
        assert_eq!(merged["scripts"]["custom"], "keep-me");
        assert_eq!(merged["dependencies"]["rimraf"], "^5.0.0");
    }

    #[test]
    fn test_merge_creates_missing_sections() {
        let target = json!({"name": "my-pkg", "version": "1.0.0"});
        let template = json!({"scripts": {"test": "run-tests"}});

        let merged = merge_template_manifest(target, &template);
        assert_eq!(merged["scripts"]["test"], "run-tests");
    }

    #[test]
    fn test_merge_without_template_sections_is_identity() {
        let target = json!({
            "name": "my-pkg",
            "version": "1.0.0",
            "scripts": {"test": "t"}
        });
        let template = json!({"name": "template"});

        let merged = merge_template_manifest(target.clone(), &template);
        assert_eq!(merged, target);
    }

    #[test]
    fn test_locate_template_root_single_wrapper_dir() {
        let temp_dir = TempDir::new().unwrap();
        let extracted = temp_dir.path().join("extracted");
        fs::create_dir_all(extracted.join("template-main")).unwrap();
        fs::write(extracted.join("template-main/package.json"), "{}").unwrap();

        let root = locate_template_root(temp_dir.path()).unwrap();
        assert!(root.ends_with("template-main"));
    }

    #[test]
    fn test_locate_template_root_flat_archive() {
        let temp_dir = TempDir::new().unwrap();
        let extracted = temp_dir.path().join("extracted");
        fs::create_dir_all(extracted.join("src")).unwrap();
        fs::write(extracted.join("package.json"), "{}").unwrap();

        let root = locate_template_root(temp_dir.path()).unwrap();
        assert_eq!(root, extracted);
    }

    #[test]
    fn test_locate_template_root_empty_archive() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("extracted")).unwrap();

        assert!(locate_template_root(temp_dir.path()).is_err());
    }

    #[test]
    fn test_copy_template_contents_skips_junk_and_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let template = temp_dir.path().join("template");
        fs::create_dir_all(template.join(".git")).unwrap();
        fs::create_dir_all(template.join("src")).unwrap();
        fs::write(template.join(".git/HEAD"), "ref").unwrap();
        fs::write(template.join("package.json"), "{}").unwrap();
        fs::write(template.join("README.md"), "# t").unwrap();
        fs::write(template.join("src/keep.cs"), "// cs").unwrap();

        let target = temp_dir.path().join("target");
        fs::create_dir_all(&target).unwrap();
        copy_template_contents(&template, &target, true).unwrap();

        assert!(!target.join(".git").exists());
        assert!(!target.join("package.json").exists());
        assert!(target.join("README.md").exists());
        assert!(target.join("src/keep.cs").exists());

        // Nested manifests still copy on install
        copy_template_contents(&template, &target, false).unwrap();
        assert!(target.join("package.json").exists());
    }
}
