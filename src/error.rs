use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Version parsing error: {0}")]
    SemVer(#[from] semver::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Package not found: {0}")]
    PackageNotFound(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid package name: '{0}'\n\n\
             Hint: package names follow npm conventions.\n\
             Use lowercase letters, digits, '.', '_' and '-', optionally\n\
             prefixed with a scope: @my-scope/my-package")]
    InvalidPackageName(String),

    #[error("No Unity project found{}\n\n\
             Hint: unpm couldn't locate a Unity project for this package.\n\n\
             A Unity project root must contain an Assets/ directory.\n\n\
             Solutions:\n\
             1. Run the command from inside a Unity project\n\
             2. Install the package under the project's node_modules/\n\
             3. Pass the project explicitly: --project-root /path/to/project",
             .0)]
    NoUnityProject(String),

    #[error("{0}")]
    Other(String),
}
