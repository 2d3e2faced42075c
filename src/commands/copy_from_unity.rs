use anyhow::Result;
use std::env;
use std::path::PathBuf;
use unpm::sync::copy_package_from_unity;
use unpm::{CopyOptions, InfoOptions, PackageInfo};

pub fn run(
    path: Option<String>,
    project_root: Option<String>,
    include_meta: bool,
    overwrite: bool,
    verbose: bool,
) -> Result<()> {
    let package_root = match path {
        Some(p) => PathBuf::from(p),
        None => env::current_dir()?,
    };

    let options = InfoOptions {
        project_root: project_root.map(PathBuf::from),
        ..Default::default()
    };
    let info = PackageInfo::resolve(&package_root, &options)?;

    println!("Copying {} back from Unity...", info.name());
    println!();

    let copy_options = CopyOptions {
        overwrite,
        include_meta,
        exclude: Vec::new(),
    };
    let stats = copy_package_from_unity(&info, &copy_options)?;

    println!(
        "✓ Copied {} files from {} to {}",
        stats.files_copied,
        info.install_path.display(),
        info.package_unity_src.display()
    );
    if verbose {
        println!("  Files skipped by filter: {}", stats.files_skipped);
    }
    if !include_meta && stats.files_skipped > 0 {
        println!("  (.meta files stayed in Unity; use --include-meta to copy them)");
    }
    println!();

    Ok(())
}
