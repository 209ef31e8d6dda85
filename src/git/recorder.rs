use std::path::{Path, PathBuf};

use git2::{Commit, Repository, Signature};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::time_utils::{TIMESTAMP_FORMAT, datetime_to_git_time};
use crate::{AppError, AppResult};

/// Version-control side of event dispatch.
pub trait Recorder {
    /// Mark `path` (relative to the working tree) for the next commit.
    fn stage(&mut self, path: &Path) -> AppResult<()>;

    /// Record the staged changes as a commit dated `timestamp`, returning its id.
    fn commit_at(&mut self, message: &str, timestamp: &OffsetDateTime) -> AppResult<String>;
}

/// Author identity overrides. Missing fields fall back to the repository config.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub name: Option<String>,
    pub email: Option<String>,
}

fn head_parents(repo: &Repository) -> AppResult<Vec<Commit<'_>>> {
    if let Ok(head) = repo.head()
        && let Some(oid) = head.target()
    {
        return Ok(vec![repo.find_commit(oid)?]);
    }
    // Unborn HEAD: the first commit has no parents.
    Ok(Vec::new())
}

/// Open the repository containing `path` and return its working tree, if any.
pub fn discover_workdir<P: AsRef<Path>>(path: P) -> Option<PathBuf> {
    Repository::discover(path)
        .ok()
        .and_then(|repo| repo.workdir().map(Path::to_path_buf))
}

/// [`Recorder`] that commits into a git repository via libgit2.
pub struct GitRecorder {
    repo: Repository,
    workdir: PathBuf,
    identity: Identity,
}

impl GitRecorder {
    #[tracing::instrument(name = "Opening repository", level = "debug", skip(identity))]
    pub fn discover<P: AsRef<Path> + std::fmt::Debug>(
        path: P,
        identity: Identity,
    ) -> AppResult<Self> {
        let repo = Repository::discover(&path)?;
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                AppError::Other(format!(
                    "repository at {} has no working tree",
                    repo.path().display()
                ))
            })?;
        debug!("Using working tree {}", workdir.display());
        Ok(Self {
            repo,
            workdir,
            identity,
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn signature_at(&self, timestamp: &OffsetDateTime) -> AppResult<Signature<'static>> {
        let when = datetime_to_git_time(timestamp);
        let (name, email) = match (&self.identity.name, &self.identity.email) {
            (Some(name), Some(email)) => (name.clone(), email.clone()),
            (name, email) => {
                let configured = self.repo.signature()?;
                (
                    name.clone().unwrap_or_else(|| {
                        String::from_utf8_lossy(configured.name_bytes()).into_owned()
                    }),
                    email.clone().unwrap_or_else(|| {
                        String::from_utf8_lossy(configured.email_bytes()).into_owned()
                    }),
                )
            }
        };
        Ok(Signature::new(&name, &email, &when)?)
    }
}

impl Recorder for GitRecorder {
    #[tracing::instrument(level = "trace", skip(self))]
    fn stage(&mut self, path: &Path) -> AppResult<()> {
        let mut index = self.repo.index()?;
        index.add_path(path)?;
        index.write()?;
        Ok(())
    }

    #[tracing::instrument(level = "trace", skip(self))]
    fn commit_at(&mut self, message: &str, timestamp: &OffsetDateTime) -> AppResult<String> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let parents = head_parents(&self.repo)?;
        let sig = self.signature_at(timestamp)?;
        let oid = self.repo.commit(
            Some("HEAD"),
            &sig,
            &sig,
            message,
            &tree,
            &parents.iter().collect::<Vec<&Commit>>(),
        )?;
        debug!("Created commit {}", oid);
        Ok(oid.to_string())
    }
}

/// [`Recorder`] that only logs what it would do.
#[derive(Debug, Default)]
pub struct DryRunRecorder {
    commits: u64,
}

impl Recorder for DryRunRecorder {
    fn stage(&mut self, path: &Path) -> AppResult<()> {
        debug!("[dry run] would stage {}", path.display());
        Ok(())
    }

    fn commit_at(&mut self, message: &str, timestamp: &OffsetDateTime) -> AppResult<String> {
        self.commits += 1;
        info!(
            "[dry run] would commit \"{}\" at {}",
            message,
            timestamp.format(TIMESTAMP_FORMAT)?
        );
        Ok(format!("dry-run-{}", self.commits))
    }
}

#[cfg(test)]
pub(crate) mod test_repo {
    use std::path::Path;

    use git2::Repository;

    /// A fresh repository with an identity configured and `files` written (not committed).
    pub(crate) fn init_with_files(dir: &Path, files: &[&str]) -> Repository {
        let repo = Repository::init(dir).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        for file in files {
            let path = dir.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, format!("// {file}\n")).unwrap();
        }
        repo
    }
}
