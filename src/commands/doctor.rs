//! Doctor command - reconcile the registries with the filesystem
//!
//! Checks:
//! - Unity project layout (Assets/ present)
//! - Registry documents parse
//! - Registry entries vs. installed directories and node_modules
//! - Recorded clones still exist

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use unpm::registry::{audit_project, IssueSeverity};
use unpm::{UnpmLocal, UnpmPackages};

pub fn run(project_root: Option<String>) -> Result<()> {
    let project_root = match project_root {
        Some(p) => PathBuf::from(p),
        None => env::current_dir()?,
    };

    println!("unpm doctor");
    println!("===========");
    println!();
    println!("Checking {}...", project_root.display());
    println!();

    let mut warnings = 0;
    let mut errors = 0;

    if project_root.join("Assets").is_dir() {
        println!("  ✓ Assets/ directory present");
    } else {
        errors += 1;
        println!("  ✗ No Assets/ directory (is this a Unity project?)");
    }

    match UnpmLocal::load(&project_root) {
        Ok(Some(local)) => println!(
            "  ✓ unpm-local.json ({} package{})",
            local.packages.len(),
            if local.packages.len() == 1 { "" } else { "s" }
        ),
        Ok(None) => println!("  ⚠ unpm-local.json not created yet"),
        Err(e) => {
            errors += 1;
            println!("  ✗ unpm-local.json unreadable: {}", e);
        }
    }

    match UnpmPackages::load(&project_root) {
        Ok(Some(packages)) => println!(
            "  ✓ unpm-packages.json ({} entries, {} scopes)",
            packages.packages.len(),
            packages.scopes.len()
        ),
        Ok(None) => println!("  ⚠ unpm-packages.json not created yet"),
        Err(e) => {
            errors += 1;
            println!("  ✗ unpm-packages.json unreadable: {}", e);
        }
    }

    println!();

    let issues = audit_project(&project_root)?;
    if issues.is_empty() {
        println!("  ✓ Registries agree with the filesystem");
    } else {
        for issue in &issues {
            match issue.severity {
                IssueSeverity::Warning => {
                    warnings += 1;
                    println!("  ⚠ {}: {}", issue.package, issue.message);
                }
                IssueSeverity::Error => {
                    errors += 1;
                    println!("  ✗ {}: {}", issue.package, issue.message);
                }
            }
        }
    }

    println!();
    println!("Summary: {} warnings, {} errors", warnings, errors);

    if errors > 0 {
        anyhow::bail!("doctor found {} errors", errors);
    }

    Ok(())
}
