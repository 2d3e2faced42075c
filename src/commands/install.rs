use anyhow::Result;
use std::env;
use std::path::PathBuf;
use unpm::sync::install_package_to_unity;
use unpm::{validate_package_name, CopyOptions, InfoOptions, PackageInfo};

pub fn run(
    package: String,
    project_root: Option<String>,
    scope: Option<String>,
    install_path: Option<String>,
    overwrite: bool,
    verbose: bool,
) -> Result<()> {
    validate_package_name(&package)?;

    let project_root = match project_root {
        Some(p) => PathBuf::from(p),
        None => env::current_dir()?,
    };

    let package_root = project_root.join("node_modules").join(&package);
    if !package_root.is_dir() {
        anyhow::bail!(
            "Package '{}' is not present in {}/node_modules\n\n\
             Hint: fetch it first with npm (npm install {}), then re-run\n\
             this command to mirror it into Assets/.",
            package,
            project_root.display(),
            package
        );
    }

    println!("Installing {} into Unity...", package);
    println!();

    let options = InfoOptions {
        project_root: Some(project_root),
        scope,
        install_path,
    };
    let info = PackageInfo::resolve(&package_root, &options)?;

    let copy_options = CopyOptions {
        overwrite,
        ..Default::default()
    };
    let stats = install_package_to_unity(&info, &copy_options)?;

    println!(
        "✓ Installed {}@{} to {}",
        info.name(),
        info.version(),
        info.install_path.display()
    );
    println!("  Files copied: {}", stats.files_copied);
    if verbose {
        println!("  Files skipped by filter: {}", stats.files_skipped);
        println!("  Source: {}", info.package_unity_src.display());
        if let Some(samples) = &info.unity_samples_path {
            println!("  Samples: {}", samples.display());
        }
    }
    println!("  Recorded in unpm-local.json and unpm-packages.json");
    println!();

    Ok(())
}
