//! Git operations for package repositories
//!
//! Clone-or-pull, remote management, local source linking and the
//! commit-and-push release flow, built on libgit2. Authentication is
//! delegated to git's native credential system: SSH agent, keys under
//! `~/.ssh/`, and configured credential helpers.
//!
//! Failures surface as rejected results; there are no retries.

use crate::registry::{self, UnpmLocal};
use crate::{Error, Result};
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    Cred, CredentialType, FetchOptions, IndexAddOption, PushOptions, RemoteCallbacks, Repository,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of a [`publish`] call
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    /// New commit id, None when the worktree had no changes to commit
    pub commit: Option<String>,

    /// Branch ref that was pushed to origin
    pub branch: String,
}

fn try_ssh_key_files(username: &str) -> std::result::Result<Cred, git2::Error> {
    let ssh_dir = dirs::home_dir().unwrap_or_default().join(".ssh");

    for key_name in &["id_ed25519", "id_rsa", "id_ecdsa"] {
        let private_key = ssh_dir.join(key_name);
        if !private_key.exists() {
            continue;
        }
        let public_key = ssh_dir.join(format!("{}.pub", key_name));
        let public_key_path = public_key.exists().then_some(public_key.as_path());

        if let Ok(cred) = Cred::ssh_key(username, public_key_path, &private_key, None) {
            return Ok(cred);
        }
    }

    Err(git2::Error::new(
        git2::ErrorCode::Auth,
        git2::ErrorClass::Ssh,
        "no usable SSH key found",
    ))
}

/// Set up authentication callbacks that delegate to git's native
/// credential system (agent, SSH keys, credential helpers).
fn setup_auth_callbacks(callbacks: &mut RemoteCallbacks) {
    callbacks.credentials(|url, username_from_url, allowed_types| {
        if allowed_types.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }

        if allowed_types.contains(CredentialType::SSH_KEY) {
            let username = username_from_url.unwrap_or("git");
            return Cred::ssh_key_from_agent(username).or_else(|_| try_ssh_key_files(username));
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Ok(config) = git2::Config::open_default() {
                if let Ok(cred) = Cred::credential_helper(&config, url, username_from_url) {
                    return Ok(cred);
                }
            }
            if let Some(username) = username_from_url {
                return Cred::userpass_plaintext(username, "");
            }
        }

        Err(git2::Error::new(
            git2::ErrorCode::Auth,
            git2::ErrorClass::Http,
            "authentication failed",
        ))
    });
}

fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut callbacks = RemoteCallbacks::new();
    setup_auth_callbacks(&mut callbacks);
    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

/// Clone a repository, or fetch and fast-forward when the target already
/// holds one.
///
/// Local state that diverged from origin is an error; there is no merge
/// logic here.
pub fn clone_or_pull<P: AsRef<Path>>(url: &str, target: P) -> Result<Repository> {
    let target = target.as_ref();

    if target.join(".git").exists() {
        let repo = Repository::open(target)?;
        pull_fast_forward(&repo)?;
        return Ok(repo);
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options());
    let repo = builder.clone(url, target)?;
    Ok(repo)
}

fn pull_fast_forward(repo: &Repository) -> Result<()> {
    let branch = {
        let head = repo.head()?;
        head.shorthand()
            .map(String::from)
            .ok_or_else(|| Error::Other("HEAD is not on a branch".to_string()))?
    };

    {
        let mut remote = repo.find_remote("origin")?;
        remote.fetch(&[branch.as_str()], Some(&mut fetch_options()), None)?;
    }

    let fetch_head = repo.find_reference("FETCH_HEAD")?;
    let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
    let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

    if analysis.is_up_to_date() {
        return Ok(());
    }

    if analysis.is_fast_forward() {
        let refname = format!("refs/heads/{}", branch);
        let mut reference = repo.find_reference(&refname)?;
        reference.set_target(fetch_commit.id(), "fast-forward")?;
        repo.set_head(&refname)?;
        repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
        return Ok(());
    }

    Err(Error::Other(format!(
        "Local clone has diverged from origin (branch '{}')\n\n\
         Hint: resolve the divergence manually, or delete the clone and\n\
         run the command again for a fresh checkout.",
        branch
    )))
}

/// Make sure a remote with the given name points at the given URL
pub fn ensure_remote(repo: &Repository, name: &str, url: &str) -> Result<()> {
    match repo.find_remote(name) {
        Ok(remote) => {
            if remote.url() != Some(url) {
                repo.remote_set_url(name, url)?;
            }
        }
        Err(_) => {
            repo.remote(name, url)?;
        }
    }
    Ok(())
}

/// Clone (or refresh) the repository recorded for a package.
///
/// The URL comes from the project registries; the clone lands in
/// `<clones_dir>/<name>`. When the package is already recorded in
/// unpm-local.json the clone path is written back there.
pub fn clone_package<P: AsRef<Path>>(
    project_root: P,
    package_name: &str,
    clones_dir: &Path,
) -> Result<PathBuf> {
    let project_root = project_root.as_ref();
    let url = registry::find_repository_for_package(project_root, package_name)?;

    let target = clones_dir.join(crate::manifest::unscoped(package_name));
    clone_or_pull(&url, &target)?;

    match UnpmLocal::set_clone_path(project_root, package_name, &target) {
        Ok(()) => {}
        // Cloning ahead of the first install is fine; nothing to record yet
        Err(Error::PackageNotFound(_)) => {}
        Err(e) => return Err(e),
    }

    Ok(target)
}

/// Replace `node_modules/<name>` with a symlink to the package's local
/// clone, so Unity edits flow straight into the clone's worktree.
pub fn link_package<P: AsRef<Path>>(project_root: P, package_name: &str) -> Result<PathBuf> {
    let project_root = project_root.as_ref();

    let local = UnpmLocal::load(project_root)?
        .ok_or_else(|| Error::PackageNotFound(package_name.to_string()))?;
    let entry = local
        .packages
        .get(package_name)
        .ok_or_else(|| Error::PackageNotFound(package_name.to_string()))?;
    let clone_path = entry.clone_path.as_deref().ok_or_else(|| {
        Error::Other(format!(
            "No clone recorded for '{}'\n\n\
             Hint: run 'unpm clone {}' first.",
            package_name, package_name
        ))
    })?;
    let clone_path = PathBuf::from(clone_path);
    if !clone_path.is_dir() {
        return Err(Error::Other(format!(
            "Recorded clone is missing: {}",
            clone_path.display()
        )));
    }

    let link = project_root.join("node_modules").join(package_name);
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)?;
    }

    if let Ok(metadata) = fs::symlink_metadata(&link) {
        if metadata.is_dir() {
            fs::remove_dir_all(&link)?;
        } else {
            fs::remove_file(&link)?;
        }
    }

    make_symlink(&clone_path, &link)?;
    Ok(link)
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::windows::fs::symlink_dir(target, link)?;
    Ok(())
}

/// Stage the full worktree, commit, and push HEAD to origin.
///
/// A clean worktree produces no commit but still pushes, so a re-run after
/// a failed push completes the release.
pub fn publish<P: AsRef<Path>>(repo_dir: P, message: &str) -> Result<PublishOutcome> {
    let repo = Repository::open(repo_dir.as_ref())?;

    let mut index = repo.index()?;
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
    index.write()?;
    let tree_id = index.write_tree()?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(_) => None,
    };

    let commit = if parent.as_ref().map(|p| p.tree_id()) == Some(tree_id) {
        None
    } else {
        let tree = repo.find_tree(tree_id)?;
        let signature = repo.signature()?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        Some(oid.to_string())
    };

    let branch = {
        let head = repo.head()?;
        head.shorthand()
            .map(String::from)
            .ok_or_else(|| Error::Other("HEAD is not on a branch".to_string()))?
    };
    let refname = format!("refs/heads/{}", branch);

    let mut callbacks = RemoteCallbacks::new();
    setup_auth_callbacks(&mut callbacks);
    let mut options = PushOptions::new();
    options.remote_callbacks(callbacks);

    let mut remote = repo.find_remote("origin")?;
    remote.push(&[format!("{}:{}", refname, refname).as_str()], Some(&mut options))?;

    Ok(PublishOutcome { commit, branch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo_with_commit(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        fs::write(dir.join("README.md"), "# test repo\n").unwrap();
        commit_all(&repo, "initial commit");
        repo
    }

    fn commit_all(repo: &Repository, message: &str) {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let signature = repo.signature().unwrap();
        let parent = repo.head().ok().map(|h| h.peel_to_commit().unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap();
    }

    #[test]
    fn test_clone_or_pull_fresh_clone() {
        let temp_dir = TempDir::new().unwrap();
        let origin_dir = temp_dir.path().join("origin");
        fs::create_dir_all(&origin_dir).unwrap();
        init_repo_with_commit(&origin_dir);

        let target = temp_dir.path().join("clone");
        clone_or_pull(origin_dir.to_str().unwrap(), &target).unwrap();

        assert!(target.join(".git").exists());
        assert!(target.join("README.md").exists());
    }

    #[test]
    fn test_clone_or_pull_fast_forwards() {
        let temp_dir = TempDir::new().unwrap();
        let origin_dir = temp_dir.path().join("origin");
        fs::create_dir_all(&origin_dir).unwrap();
        let origin = init_repo_with_commit(&origin_dir);

        let target = temp_dir.path().join("clone");
        clone_or_pull(origin_dir.to_str().unwrap(), &target).unwrap();

        fs::write(origin_dir.join("NEW.md"), "new file\n").unwrap();
        commit_all(&origin, "add NEW.md");

        clone_or_pull(origin_dir.to_str().unwrap(), &target).unwrap();
        assert!(target.join("NEW.md").exists());
    }

    #[test]
    fn test_ensure_remote_adds_and_updates() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();

        ensure_remote(&repo, "upstream", "https://example.com/a.git").unwrap();
        assert_eq!(
            repo.find_remote("upstream").unwrap().url(),
            Some("https://example.com/a.git")
        );

        ensure_remote(&repo, "upstream", "https://example.com/b.git").unwrap();
        assert_eq!(
            repo.find_remote("upstream").unwrap().url(),
            Some("https://example.com/b.git")
        );
    }

    #[test]
    fn test_publish_commits_and_pushes() {
        let temp_dir = TempDir::new().unwrap();
        let origin_dir = temp_dir.path().join("origin");
        fs::create_dir_all(&origin_dir).unwrap();
        let origin = init_repo_with_commit(&origin_dir);
        // Accept pushes into the checked-out branch
        origin
            .config()
            .unwrap()
            .set_str("receive.denyCurrentBranch", "ignore")
            .unwrap();
        let origin_head_before = origin.head().unwrap().target().unwrap();

        let work_dir = temp_dir.path().join("work");
        let work = clone_or_pull(origin_dir.to_str().unwrap(), &work_dir).unwrap();
        {
            let mut config = work.config().unwrap();
            config.set_str("user.name", "Test").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }

        fs::write(work_dir.join("release.txt"), "1.0.0\n").unwrap();
        let outcome = publish(&work_dir, "release 1.0.0").unwrap();

        assert!(outcome.commit.is_some());
        let origin_head_after = origin
            .find_reference(&format!("refs/heads/{}", outcome.branch))
            .unwrap()
            .target()
            .unwrap();
        assert_ne!(origin_head_before, origin_head_after);
        assert_eq!(origin_head_after.to_string(), outcome.commit.unwrap());
    }

    #[test]
    fn test_publish_clean_worktree_skips_commit() {
        let temp_dir = TempDir::new().unwrap();
        let origin_dir = temp_dir.path().join("origin");
        fs::create_dir_all(&origin_dir).unwrap();
        let origin = init_repo_with_commit(&origin_dir);
        origin
            .config()
            .unwrap()
            .set_str("receive.denyCurrentBranch", "ignore")
            .unwrap();

        let work_dir = temp_dir.path().join("work");
        let work = clone_or_pull(origin_dir.to_str().unwrap(), &work_dir).unwrap();
        {
            let mut config = work.config().unwrap();
            config.set_str("user.name", "Test").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }

        let outcome = publish(&work_dir, "no changes").unwrap();
        assert!(outcome.commit.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_link_package_replaces_node_modules_entry() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("proj");

        // Installed package with a recorded clone
        let pkg_root = project.join("node_modules").join("my-pkg");
        fs::create_dir_all(pkg_root.join("src/my-pkg")).unwrap();
        fs::write(
            pkg_root.join("package.json"),
            serde_json::to_string_pretty(&serde_json::json!({
                "name": "my-pkg", "version": "1.0.0"
            }))
            .unwrap(),
        )
        .unwrap();
        let info = crate::pkginfo::PackageInfo::resolve(
            &pkg_root,
            &crate::pkginfo::InfoOptions::default(),
        )
        .unwrap();
        UnpmLocal::record(&project, &info).unwrap();

        let clone_dir = temp_dir.path().join("clones").join("my-pkg");
        fs::create_dir_all(&clone_dir).unwrap();
        fs::write(clone_dir.join("cloned.txt"), "from clone").unwrap();
        UnpmLocal::set_clone_path(&project, "my-pkg", &clone_dir).unwrap();

        let link = link_package(&project, "my-pkg").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert!(link.join("cloned.txt").exists());
    }

    #[test]
    fn test_link_package_requires_clone() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("proj");

        let pkg_root = project.join("node_modules").join("my-pkg");
        fs::create_dir_all(pkg_root.join("src/my-pkg")).unwrap();
        fs::write(
            pkg_root.join("package.json"),
            serde_json::to_string_pretty(&serde_json::json!({
                "name": "my-pkg", "version": "1.0.0"
            }))
            .unwrap(),
        )
        .unwrap();
        let info = crate::pkginfo::PackageInfo::resolve(
            &pkg_root,
            &crate::pkginfo::InfoOptions::default(),
        )
        .unwrap();
        UnpmLocal::record(&project, &info).unwrap();

        let result = link_package(&project, "my-pkg");
        assert!(result.is_err());
    }
}
