use anyhow::Result;
use std::env;
use std::path::PathBuf;
use unpm::gitops;

pub fn run(package: String, project_root: Option<String>) -> Result<()> {
    let project_root = match project_root {
        Some(p) => PathBuf::from(p),
        None => env::current_dir()?,
    };

    println!("Linking {} to its local clone...", package);
    println!();

    let link = gitops::link_package(&project_root, &package)?;

    println!("✓ {} now points at the clone", link.display());
    println!();
    println!("Unity-side syncs will flow into the clone's worktree.");
    println!();

    Ok(())
}
