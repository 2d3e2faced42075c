use anyhow::Result;
use std::env;
use std::path::PathBuf;
use unpm::{template, PackageManifest};

pub fn run(path: Option<String>, template_url: Option<String>) -> Result<()> {
    let target = match path {
        Some(p) => PathBuf::from(p),
        None => env::current_dir()?,
    };

    let manifest = PackageManifest::load(&target)?;
    println!(
        "Updating {}@{} from template...",
        manifest.name, manifest.version
    );
    println!();

    template::update_template(&target, template_url.as_deref())?;

    let updated = PackageManifest::load(&target)?;

    println!("✓ Template refreshed");
    println!("  Scripts: {}", updated.scripts.len());
    println!("  Dependencies: {}", updated.dependencies.len());
    println!();
    println!("Package name and version were left untouched.");

    Ok(())
}
