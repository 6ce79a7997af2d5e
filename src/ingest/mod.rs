//! Activity ingestion from a local git repository.
//!
//! Walks the history reachable from HEAD and turns every commit into a
//! `commit` activity with diff statistics from the first parent.

use crate::error::AnalysisResult;
use crate::models::{Activity, ActivityMetadata, ActivityType};
use chrono::{DateTime, NaiveDate, Utc};
use git2::{Commit, DiffOptions, Repository, Sort};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Options for reading commit activities.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Keep only commits whose author e-mail or name matches (case-insensitive).
    pub author: Option<String>,
    /// Keep only commits made on or after this UTC date.
    pub since: Option<NaiveDate>,
    /// Developer id stamped on every activity. Defaults to the author e-mail.
    pub developer_id: Option<String>,
    /// Whether to show a spinner.
    pub show_progress: bool,
}

/// Read commit activities from the repository containing `path`, oldest first.
pub fn read_commit_activities(
    path: &Path,
    options: &IngestOptions,
) -> AnalysisResult<Vec<Activity>> {
    let repo = Repository::discover(path)?;
    let repository_id = repository_name(&repo);
    info!("Reading commit history from {}", repository_id);

    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.set_sorting(Sort::TIME)?;

    let spinner = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        let template = "{spinner:.green} {pos} commits read";
        if let Ok(style) = ProgressStyle::default_spinner().template(template) {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut activities = Vec::new();
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        if let Some(ref pb) = spinner {
            pb.inc(1);
        }

        if !author_matches(&commit, options.author.as_deref()) {
            continue;
        }

        let Some(timestamp) = DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0) else {
            debug!("Skipping commit {} with out-of-range time", commit.id());
            continue;
        };

        if let Some(since) = options.since {
            if timestamp.date_naive() < since {
                continue;
            }
        }

        activities.push(commit_activity(&repo, &commit, timestamp, &repository_id, options)?);
    }

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    activities.sort_by_key(|a| a.timestamp);
    info!("Ingested {} commit activities", activities.len());
    Ok(activities)
}

fn commit_activity(
    repo: &Repository,
    commit: &Commit<'_>,
    timestamp: DateTime<Utc>,
    repository_id: &str,
    options: &IngestOptions,
) -> AnalysisResult<Activity> {
    let tree = commit.tree()?;
    let parent_tree = match commit.parents().next() {
        Some(parent) => Some(parent.tree()?),
        None => None,
    };

    let mut diff_opts = DiffOptions::new();
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))?;
    let stats = diff.stats()?;

    let hash = commit.id().to_string();
    let developer_id = options
        .developer_id
        .clone()
        .unwrap_or_else(|| commit.author().email().unwrap_or("unknown").to_string());

    Ok(Activity {
        id: hash.clone(),
        kind: ActivityType::Commit,
        developer_id,
        repository_id: repository_id.to_string(),
        timestamp,
        metadata: ActivityMetadata {
            commit_hash: Some(hash),
            lines_added: Some(stats.insertions() as u64),
            lines_deleted: Some(stats.deletions() as u64),
            files_changed: Some(stats.files_changed() as u64),
            ..Default::default()
        },
    })
}

fn author_matches(commit: &Commit<'_>, author: Option<&str>) -> bool {
    let Some(wanted) = author else {
        return true;
    };

    let signature = commit.author();
    let matches = |value: Option<&str>| value.is_some_and(|v| v.eq_ignore_ascii_case(wanted));
    let matched = matches(signature.email()) || matches(signature.name());
    matched
}

/// Directory name of the working tree (or the git dir for bare repositories).
fn repository_name(repo: &Repository) -> String {
    let dir = repo.workdir().unwrap_or_else(|| repo.path());
    dir.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use git2::{Signature, Time};
    use tempfile::TempDir;

    const DAY: i64 = 86_400;
    const BASE: i64 = 1_740_000_000; // 2025-02-19

    /// Write `files` and commit them as `email` at `secs`.
    fn commit(repo: &Repository, email: &str, secs: i64, files: &[(&str, &str)]) {
        let workdir = repo.workdir().unwrap().to_path_buf();
        let mut index = repo.index().unwrap();
        for (name, content) in files {
            std::fs::write(workdir.join(name), content).unwrap();
            index.add_path(Path::new(name)).unwrap();
        }
        index.write().unwrap();

        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::new("Dev", email, &Time::new(secs, 0)).unwrap();
        let parents: Vec<Commit<'_>> = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => vec![],
        };
        let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, "change", &tree, &parent_refs)
            .unwrap();
    }

    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();
        commit(&repo, "alice@example.com", BASE, &[("a.py", "x = 1\ny = 2\n")]);
        commit(&repo, "bob@example.com", BASE + DAY, &[("b.py", "z = 3\n")]);
        commit(
            &repo,
            "alice@example.com",
            BASE + 3 * DAY,
            &[("a.py", "x = 10\n"), ("c.py", "w = 4\n")],
        );
        temp_dir
    }

    #[test]
    fn test_reads_all_commits_oldest_first() {
        let temp_dir = fixture();
        let activities =
            read_commit_activities(temp_dir.path(), &IngestOptions::default()).unwrap();

        assert_eq!(activities.len(), 3);
        assert!(activities.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(activities.iter().all(|a| a.kind == ActivityType::Commit));
        assert_eq!(activities[0].developer_id, "alice@example.com");
        assert_eq!(activities[0].timestamp.timestamp(), BASE);
        assert_eq!(activities[0].metadata.lines_added, Some(2));
        assert_eq!(activities[0].metadata.files_changed, Some(1));
        assert_eq!(
            activities[0].metadata.commit_hash.as_deref(),
            Some(activities[0].id.as_str())
        );
    }

    #[test]
    fn test_diff_stats_against_parent() {
        let temp_dir = fixture();
        let activities =
            read_commit_activities(temp_dir.path(), &IngestOptions::default()).unwrap();

        let last = &activities[2].metadata;
        assert_eq!(last.files_changed, Some(2));
        assert_eq!(last.lines_added, Some(2));
        assert_eq!(last.lines_deleted, Some(2));
    }

    #[test]
    fn test_author_and_since_filters() {
        let temp_dir = fixture();
        let options = IngestOptions {
            author: Some("ALICE@example.com".to_string()),
            developer_id: Some("alice".to_string()),
            ..Default::default()
        };
        let activities = read_commit_activities(temp_dir.path(), &options).unwrap();
        assert_eq!(activities.len(), 2);
        assert!(activities.iter().all(|a| a.developer_id == "alice"));

        let since = DateTime::<Utc>::from_timestamp(BASE + DAY, 0).unwrap().date_naive();
        let options = IngestOptions {
            since: Some(since),
            ..Default::default()
        };
        let activities = read_commit_activities(temp_dir.path(), &options).unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].developer_id, "bob@example.com");
    }

    #[test]
    fn test_not_a_repository() {
        let temp_dir = TempDir::new().unwrap();
        let result = read_commit_activities(temp_dir.path(), &IngestOptions::default());
        assert!(matches!(result, Err(AnalysisError::Ingest(_))));
    }
}
