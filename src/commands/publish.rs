use anyhow::Result;
use std::env;
use std::path::PathBuf;
use unpm::{bump_manifest, gitops, PackageManifest, ReleaseKind};

pub fn run(path: Option<String>, message: Option<String>, bump: Option<String>) -> Result<()> {
    let package_root = match path {
        Some(p) => PathBuf::from(p),
        None => env::current_dir()?,
    };

    let manifest = PackageManifest::load(&package_root)?;
    println!("Publishing {}...", manifest.name);
    println!();

    if let Some(kind) = bump {
        let kind: ReleaseKind = kind.parse()?;
        let (old_version, new_version) = bump_manifest(&package_root, kind)?;
        println!("  Version: {} → {}", old_version, new_version);
    }

    let manifest = PackageManifest::load(&package_root)?;
    let message = message
        .unwrap_or_else(|| format!("release {}@{}", manifest.name, manifest.version));

    println!("  Committing and pushing...");
    let outcome = gitops::publish(&package_root, &message)?;

    match &outcome.commit {
        Some(commit) => println!("  ✓ Committed {}", &commit[..commit.len().min(12)]),
        None => println!("  ⚠ Nothing to commit (worktree clean)"),
    }
    println!("  ✓ Pushed {} to origin", outcome.branch);
    println!();
    println!("✓ Published {}@{}", manifest.name, manifest.version);

    Ok(())
}
