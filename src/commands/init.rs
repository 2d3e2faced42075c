use anyhow::Result;
use std::env;
use std::path::PathBuf;
use unpm::{template, PackageManifest, TemplateOptions};

pub fn run(
    path: Option<String>,
    name: Option<String>,
    template_url: Option<String>,
) -> Result<()> {
    let target = match path {
        Some(p) => PathBuf::from(p),
        None => env::current_dir()?,
    };

    println!("Initializing package in {}...", target.display());
    println!();

    let options = TemplateOptions {
        url: template_url,
        name,
    };
    template::install_template(&target, &options)?;

    let manifest = PackageManifest::load(&target)?;

    println!("✓ Created package '{}' from template", manifest.name);
    println!();
    println!("Next steps:");
    println!("  • Put Unity source under src/{}/", manifest.unscoped_name());
    println!("  • Install into a project: unpm install {}", manifest.name);
    println!();

    Ok(())
}
