use anyhow::Result;
use std::env;
use std::path::PathBuf;
use unpm::UnpmLocal;

pub fn run(project_root: Option<String>) -> Result<()> {
    let project_root = match project_root {
        Some(p) => PathBuf::from(p),
        None => env::current_dir()?,
    };

    let local = match UnpmLocal::load(&project_root)? {
        Some(local) => local,
        None => {
            println!("No unpm-local.json found in {}.", project_root.display());
            println!();
            println!("Install packages with: unpm install <package>");
            return Ok(());
        }
    };

    if local.packages.is_empty() {
        println!("No packages installed.");
        println!();
        println!("Install packages with: unpm install <package>");
        return Ok(());
    }

    println!("Installed packages:");
    for (name, entry) in &local.packages {
        println!("  {} @ {}", name, entry.version);
        println!("    → {}", entry.install_path);
        if let Some(clone) = &entry.clone_path {
            println!("    clone: {}", clone);
        }
    }
    println!();

    let total = local.packages.len();
    println!(
        "Total: {} package{}",
        total,
        if total == 1 { "" } else { "s" }
    );

    Ok(())
}
