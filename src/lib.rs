//! unpm - Sync npm packages in and out of Unity projects
//!
//! Unity plugin code is developed inside a Unity project, where `.meta`
//! files and engine tooling matter, but versioned and distributed as npm
//! packages. unpm bridges the two worlds:
//!
//! - Copies package source into `Assets/[Plugins/]packages/[scope/]name`
//!   and engine-side edits back out to the package
//! - Tracks installed packages in JSON sidecar registries
//!   (`unpm-local.json`, `unpm-packages.json`) at the project root
//! - Guesses install paths and repository URLs from user-authored scope
//!   templates with `{package_name}` placeholders
//! - Wraps git clone/pull/link/publish for package repositories
//! - Scaffolds and refreshes packages from a template archive
//!
//! # Examples
//!
//! ```no_run
//! use unpm::{CopyOptions, InfoOptions, PackageInfo};
//! use unpm::sync::install_package_to_unity;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Resolve where a dependency installs in its Unity project
//! let info = PackageInfo::resolve("node_modules/my-pkg", &InfoOptions::default())?;
//!
//! // Copy it under Assets/ and record it in the registries
//! let stats = install_package_to_unity(&info, &CopyOptions::default())?;
//! println!("copied {} files to {}", stats.files_copied, info.unity_install_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`manifest`] - package.json descriptor types and name handling
//! - [`pkginfo`] - install/source path resolution for a package
//! - [`registry`] - the unpm-local.json / unpm-packages.json registries
//! - [`jsonfile`] - shared JSON read/transform/write pipeline
//! - [`sync`] - filtered tree copy between package and Assets
//! - [`gitops`] - clone/pull/link/publish wrappers
//! - [`template`] - package template install and update
//! - [`version`] - semver bump helpers
//! - [`config`] - user configuration management
//! - [`error`] - error types and result handling

pub mod config;
pub mod error;
pub mod gitops;
pub mod jsonfile;
pub mod manifest;
pub mod pkginfo;
pub mod registry;
pub mod sync;
pub mod template;
pub mod version;

pub use config::Config;
pub use error::{Error, Result};
pub use gitops::{clone_or_pull, clone_package, ensure_remote, link_package, publish};
pub use manifest::{set_package_name, validate_package_name, PackageManifest, MANIFEST_NAME};
pub use pkginfo::{InfoOptions, PackageInfo};
pub use registry::{
    audit_project, find_install_path_for_package, find_repository_for_package, UnpmLocal,
    UnpmPackages, LOCAL_REGISTRY_NAME, PACKAGES_REGISTRY_NAME,
};
pub use sync::{copy_tree, CopyOptions, CopyStats};
pub use template::{install_template, update_template, TemplateOptions};
pub use version::{bump, bump_manifest, ReleaseKind};
