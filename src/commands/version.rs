use anyhow::Result;
use std::env;
use std::path::PathBuf;
use unpm::{bump_manifest, ReleaseKind};

pub fn run(kind: String, path: Option<String>) -> Result<()> {
    let kind: ReleaseKind = kind.parse()?;

    let package_root = match path {
        Some(p) => PathBuf::from(p),
        None => env::current_dir()?,
    };

    let (old_version, new_version) = bump_manifest(&package_root, kind)?;

    println!("✓ {} → {}", old_version, new_version);

    Ok(())
}
