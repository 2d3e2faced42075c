use anyhow::Result;
use std::env;
use std::path::PathBuf;
use unpm::{InfoOptions, PackageInfo};

pub fn run(path: Option<String>, project_root: Option<String>) -> Result<()> {
    let package_root = match path {
        Some(p) => PathBuf::from(p),
        None => env::current_dir()?,
    };

    let options = InfoOptions {
        project_root: project_root.map(PathBuf::from),
        ..Default::default()
    };
    let info = PackageInfo::resolve(&package_root, &options)?;

    println!("{}@{}", info.name(), info.version());
    if let Some(description) = &info.manifest.description {
        println!("  {}", description);
    }
    println!();
    println!("  Package root:     {}", info.package_root.display());
    println!(
        "  Dependency install: {}",
        if info.is_dependency_install { "yes (under node_modules)" } else { "no" }
    );
    println!("  Unity project:    {}", info.unity_project_root.display());
    println!("  Install path:     {}", info.install_path.display());
    println!("  Unity source:     {}", info.package_unity_src.display());
    if let Some(samples) = &info.unity_samples_path {
        println!("  Samples install:  {}", samples.display());
    }
    if let Some(url) = info.manifest.repository_url() {
        println!("  Repository:       {}", url);
    }

    Ok(())
}
