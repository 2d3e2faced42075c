use anyhow::Result;
use std::env;
use std::path::PathBuf;
use unpm::{gitops, Config};

pub fn run(package: String, project_root: Option<String>) -> Result<()> {
    let project_root = match project_root {
        Some(p) => PathBuf::from(p),
        None => env::current_dir()?,
    };

    let config = Config::load()?;
    let clones_dir = config.clones_dir()?;

    println!("Cloning repository for {}...", package);
    println!();

    let clone_path = gitops::clone_package(&project_root, &package, &clones_dir)?;

    println!("✓ Clone ready at {}", clone_path.display());
    println!();
    println!("To work against the clone directly:");
    println!("  unpm link {}", package);
    println!();

    Ok(())
}
