use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

mod commands;

/// unpm - Sync npm packages in and out of Unity projects
#[derive(Parser)]
#[command(name = "unpm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print per-file detail while copying
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a new package from the template archive
    InitPackage {
        /// Target directory (defaults to current directory)
        path: Option<String>,

        /// Package name to apply (e.g. my-pkg or @scope/my-pkg)
        #[arg(short, long)]
        name: Option<String>,

        /// Template archive URL override
        #[arg(long)]
        template_url: Option<String>,
    },

    /// Refresh an existing package from the template archive
    UpdatePackageTemplate {
        /// Package directory (defaults to current directory)
        path: Option<String>,

        /// Template archive URL override
        #[arg(long)]
        template_url: Option<String>,
    },

    /// Copy a package from node_modules into the Unity Assets folder
    Install {
        /// Package name (e.g. my-pkg or @scope/my-pkg)
        package: String,

        /// Unity project root (defaults to current directory)
        #[arg(long)]
        project_root: Option<String>,

        /// Scope segment for the install path
        #[arg(long)]
        scope: Option<String>,

        /// Install path override, relative to the project root
        #[arg(long)]
        install_path: Option<String>,

        /// Delete the install target before copying
        #[arg(long)]
        overwrite: bool,
    },

    /// Remove a package's install from Assets and unpm-local.json
    Uninstall {
        /// Package name
        package: String,

        /// Unity project root (defaults to current directory)
        #[arg(long)]
        project_root: Option<String>,
    },

    /// Re-install every recorded package from node_modules
    Sync {
        /// Unity project root (defaults to current directory)
        #[arg(long)]
        project_root: Option<String>,

        /// Delete each install target before copying
        #[arg(long)]
        overwrite: bool,
    },

    /// Reconcile the registries with the filesystem
    Doctor {
        /// Unity project root (defaults to current directory)
        #[arg(long)]
        project_root: Option<String>,
    },

    /// Copy Unity-side edits back into the package source tree
    CopyFromUnity {
        /// Package directory (defaults to current directory)
        path: Option<String>,

        /// Unity project root (for packages outside node_modules)
        #[arg(long)]
        project_root: Option<String>,

        /// Copy .meta files too
        #[arg(long)]
        include_meta: bool,

        /// Delete the package source before copying
        #[arg(long)]
        overwrite: bool,
    },

    /// Show resolved install/source paths for a package
    Info {
        /// Package directory (defaults to current directory)
        path: Option<String>,

        /// Unity project root (for packages outside node_modules)
        #[arg(long)]
        project_root: Option<String>,
    },

    /// List packages recorded in unpm-local.json
    List {
        /// Unity project root (defaults to current directory)
        #[arg(long)]
        project_root: Option<String>,
    },

    /// Bump the package version (major, minor or patch)
    Version {
        /// Release kind: major, minor or patch
        kind: String,

        /// Package directory (defaults to current directory)
        path: Option<String>,
    },

    /// Clone (or refresh) the repository recorded for a package
    Clone {
        /// Package name
        package: String,

        /// Unity project root (defaults to current directory)
        #[arg(long)]
        project_root: Option<String>,
    },

    /// Symlink node_modules/<package> to its local clone
    Link {
        /// Package name
        package: String,

        /// Unity project root (defaults to current directory)
        #[arg(long)]
        project_root: Option<String>,
    },

    /// Commit and push the package repository
    Publish {
        /// Package directory (defaults to current directory)
        path: Option<String>,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,

        /// Bump the version first: major, minor or patch
        #[arg(long)]
        bump: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::InitPackage {
            path,
            name,
            template_url,
        } => commands::init::run(path, name, template_url),
        Commands::UpdatePackageTemplate { path, template_url } => {
            commands::update_template::run(path, template_url)
        }
        Commands::Install {
            package,
            project_root,
            scope,
            install_path,
            overwrite,
        } => commands::install::run(
            package,
            project_root,
            scope,
            install_path,
            overwrite,
            cli.verbose,
        ),
        Commands::Uninstall {
            package,
            project_root,
        } => commands::uninstall::run(package, project_root),
        Commands::Sync {
            project_root,
            overwrite,
        } => commands::sync::run(project_root, overwrite, cli.verbose),
        Commands::Doctor { project_root } => commands::doctor::run(project_root),
        Commands::CopyFromUnity {
            path,
            project_root,
            include_meta,
            overwrite,
        } => commands::copy_from_unity::run(path, project_root, include_meta, overwrite, cli.verbose),
        Commands::Info { path, project_root } => commands::info::run(path, project_root),
        Commands::List { project_root } => commands::list::run(project_root),
        Commands::Version { kind, path } => commands::version::run(kind, path),
        Commands::Clone {
            package,
            project_root,
        } => commands::clone::run(package, project_root),
        Commands::Link {
            package,
            project_root,
        } => commands::link::run(package, project_root),
        Commands::Publish {
            path,
            message,
            bump,
        } => commands::publish::run(path, message, bump),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "unpm", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
