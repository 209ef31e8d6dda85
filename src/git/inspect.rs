use std::collections::BTreeMap;
use std::path::Path;

use git2::{Repository, Sort};
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{debug, trace};

use crate::AppResult;
use crate::time_utils::{DateRange, git_time_to_datetime};

/// Number of commits authored on one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayCommits {
    #[serde(with = "crate::serde_helpers::date")]
    pub date: Date,
    pub commits: usize,
}

/// Per-day commit counts reachable from HEAD.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryDigest {
    pub total_commits: usize,
    pub active_days: usize,
    pub days: Vec<DayCommits>,
}

/// Walk history from HEAD and bucket commits by author date, keeping days in `[since, until]`.
#[tracing::instrument(name = "Inspecting history", level = "debug")]
pub fn daily_commit_counts<P: AsRef<Path> + std::fmt::Debug>(
    path: P,
    since: Option<Date>,
    until: Option<Date>,
) -> AppResult<HistoryDigest> {
    if let (Some(since), Some(until)) = (since, until) {
        DateRange::new(since, until)?;
    }
    let repo = Repository::discover(&path)?;
    let mut revwalk = repo.revwalk()?;
    // Sorting must be set before pushing; changing it resets the walk.
    revwalk.set_sorting(Sort::TIME)?;
    if let Err(e) = revwalk.push_head() {
        debug!("No HEAD to walk (likely unborn branch) for {:?}: {}", path, e);
        return Ok(HistoryDigest::default());
    }

    let mut buckets: BTreeMap<Date, usize> = BTreeMap::new();
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        let date = git_time_to_datetime(commit.author().when())?.date();
        trace!("Commit {} authored on {}", commit.id(), date);
        if since.is_some_and(|s| date < s) || until.is_some_and(|u| date > u) {
            continue;
        }
        *buckets.entry(date).or_default() += 1;
    }

    let days: Vec<DayCommits> = buckets
        .into_iter()
        .map(|(date, commits)| DayCommits { date, commits })
        .collect();
    Ok(HistoryDigest {
        total_commits: days.iter().map(|d| d.commits).sum(),
        active_days: days.len(),
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::recorder::test_repo::init_with_files;
    use crate::git::recorder::{GitRecorder, Identity, Recorder};
    use time::macros::{date, datetime};

    #[test]
    fn empty_repository_has_empty_digest() {
        let dir = tempfile::tempdir().unwrap();
        init_with_files(dir.path(), &[]);
        let digest = daily_commit_counts(dir.path(), None, None).unwrap();
        assert_eq!(digest, HistoryDigest::default());
    }

    #[test]
    fn buckets_commits_by_author_day() {
        let dir = tempfile::tempdir().unwrap();
        init_with_files(dir.path(), &["a.txt"]);
        let mut recorder = GitRecorder::discover(dir.path(), Identity::default()).unwrap();
        let stamps = [
            datetime!(2025-05-04 09:00:00 UTC),
            datetime!(2025-05-04 17:30:00 UTC),
            datetime!(2025-05-06 11:00:00 UTC),
        ];
        for (i, ts) in stamps.iter().enumerate() {
            std::fs::write(dir.path().join("a.txt"), format!("rev {i}")).unwrap();
            recorder.stage(Path::new("a.txt")).unwrap();
            recorder.commit_at(&format!("rev {i}"), ts).unwrap();
        }

        let digest = daily_commit_counts(dir.path(), None, None).unwrap();
        assert_eq!(digest.total_commits, 3);
        assert_eq!(
            digest.days,
            vec![
                DayCommits {
                    date: date!(2025 - 05 - 04),
                    commits: 2
                },
                DayCommits {
                    date: date!(2025 - 05 - 06),
                    commits: 1
                },
            ]
        );

        let filtered =
            daily_commit_counts(dir.path(), Some(date!(2025 - 05 - 05)), None).unwrap();
        assert_eq!(filtered.total_commits, 1);
        assert_eq!(filtered.active_days, 1);
    }

    #[test]
    fn rejects_inverted_window() {
        let dir = tempfile::tempdir().unwrap();
        init_with_files(dir.path(), &[]);
        let err = daily_commit_counts(
            dir.path(),
            Some(date!(2025 - 06 - 01)),
            Some(date!(2025 - 05 - 01)),
        )
        .unwrap_err();
        assert!(matches!(err, crate::AppError::InvalidRange { .. }));
    }
}
