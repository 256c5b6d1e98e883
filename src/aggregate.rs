use crate::model::{
    ActivityRecord, AuthorCount, ChangeKind, CommitRecord, FileChange, FileChangeStats,
    ReportSummary,
};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Compute summary counts for one report.
pub fn summarize(commits: &[CommitRecord], activities: &[ActivityRecord]) -> ReportSummary {
    let mut summary = ReportSummary {
        total_commits: commits.len(),
        commits_by_author: commits_by_author(commits),
        file_changes: file_change_stats(commits),
        total_activities: activities.len(),
        ..ReportSummary::default()
    };

    for activity in activities {
        *summary.activities_by_state.entry(activity.state).or_insert(0) += 1;
        *summary
            .activities_by_kind_and_state
            .entry((activity.kind, activity.state))
            .or_insert(0) += 1;
    }

    summary
}

/// Commit counts per exact author string, most commits first, ties by name.
pub fn commits_by_author(commits: &[CommitRecord]) -> Vec<AuthorCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for commit in commits {
        *counts.entry(commit.author.as_str()).or_insert(0) += 1;
    }

    let mut entries: Vec<AuthorCount> = counts
        .into_iter()
        .map(|(author, commits)| AuthorCount {
            author: author.to_string(),
            commits,
        })
        .collect();
    entries.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.author.cmp(&b.author)));
    entries
}

/// Net unique-file changes over the window.
///
/// `commits` is in `git log` order (newest first), so history is replayed by
/// walking it backwards; timestamps are not trusted for ordering. A file
/// added and later deleted counts as neither; a file deleted and later
/// re-added counts as modified.
pub fn file_change_stats(commits: &[CommitRecord]) -> FileChangeStats {
    let mut added: HashSet<&str> = HashSet::new();
    let mut modified: HashSet<&str> = HashSet::new();
    let mut deleted: HashSet<&str> = HashSet::new();

    for commit in commits.iter().rev() {
        for file in &commit.files_changed {
            let path = file.path.as_str();
            match file.status {
                ChangeKind::Added => {
                    if deleted.remove(path) {
                        modified.insert(path);
                    } else {
                        added.insert(path);
                    }
                }
                ChangeKind::Deleted => {
                    if !added.remove(path) {
                        deleted.insert(path);
                    }
                    modified.remove(path);
                }
                ChangeKind::Modified => {
                    if let Some(previous) = file.previous_path.as_deref() {
                        if added.remove(previous) {
                            added.insert(path);
                            continue;
                        }
                    }
                    if !added.contains(path) && !deleted.contains(path) {
                        modified.insert(path);
                    }
                }
            }
        }
    }

    FileChangeStats {
        added: added.len(),
        modified: modified.len(),
        deleted: deleted.len(),
    }
}

/// Group commits by author in summary order, keeping each author's commits
/// in input order.
pub fn group_by_author<'a>(
    commits: &'a [CommitRecord],
    summary: &ReportSummary,
) -> Vec<(&'a str, Vec<&'a CommitRecord>)> {
    let mut by_author: HashMap<&str, Vec<&CommitRecord>> = HashMap::new();
    for commit in commits {
        by_author.entry(commit.author.as_str()).or_default().push(commit);
    }

    summary
        .commits_by_author
        .iter()
        .filter_map(|entry| by_author.remove_entry(entry.author.as_str()))
        .collect()
}

/// Per-file change history: path → (commit, change) in input order.
pub fn group_by_file(commits: &[CommitRecord]) -> BTreeMap<&str, Vec<(&CommitRecord, &FileChange)>> {
    let mut files: BTreeMap<&str, Vec<_>> = BTreeMap::new();
    for commit in commits {
        for change in &commit.files_changed {
            files.entry(change.path.as_str()).or_default().push((commit, change));
        }
    }
    files
}
