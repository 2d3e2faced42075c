use anyhow::Result;
use std::env;
use std::path::PathBuf;
use unpm::sync::remove_package_from_unity;
use unpm::UnpmLocal;

pub fn run(package: String, project_root: Option<String>) -> Result<()> {
    let project_root = match project_root {
        Some(p) => PathBuf::from(p),
        None => env::current_dir()?,
    };

    println!("Uninstalling package: {}", package);
    println!();

    let known = UnpmLocal::load(&project_root)?
        .map(|local| local.packages.contains_key(&package))
        .unwrap_or(false);
    if !known {
        println!("⚠ Package '{}' is not recorded in unpm-local.json", package);
        println!("  (removing by convention path if anything is there)");
        println!();
    }

    let report = remove_package_from_unity(&project_root, &package)?;

    match &report.install_dir {
        Some(dir) => println!("  ✓ Removed {}", dir.display()),
        None => println!("  ⚠ No installed files found under Assets/"),
    }
    if let Some(samples) = &report.samples_dir {
        println!("  ✓ Removed samples {}", samples.display());
    }
    if report.entry_removed {
        println!("  ✓ Removed from unpm-local.json");
    }

    println!();
    println!("✓ Uninstalled {}", package);
    println!();

    Ok(())
}
