use anyhow::Result;
use std::env;
use std::path::PathBuf;
use unpm::sync::sync_project;
use unpm::CopyOptions;

pub fn run(project_root: Option<String>, overwrite: bool, verbose: bool) -> Result<()> {
    let project_root = match project_root {
        Some(p) => PathBuf::from(p),
        None => env::current_dir()?,
    };

    println!("Syncing recorded packages into Unity...");
    println!();

    let options = CopyOptions {
        overwrite,
        ..Default::default()
    };
    let outcomes = sync_project(&project_root, &options)?;

    if outcomes.is_empty() {
        println!("No packages recorded in unpm-local.json.");
        return Ok(());
    }

    let mut failures = 0;
    for (name, outcome) in &outcomes {
        match outcome {
            Ok(stats) => {
                println!("  ✓ {} ({} files)", name, stats.files_copied);
                if verbose {
                    println!("    skipped by filter: {}", stats.files_skipped);
                }
            }
            Err(e) => {
                failures += 1;
                println!("  ✗ {}: {}", name, e);
            }
        }
    }

    println!();
    if failures > 0 {
        anyhow::bail!("{} of {} packages failed to sync", failures, outcomes.len());
    }
    println!("✓ Synced {} packages", outcomes.len());

    Ok(())
}
