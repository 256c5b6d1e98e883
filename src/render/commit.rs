use super::{code_fence, escape_cell, join_lines, link, RenderContext};
use crate::aggregate::{group_by_author, group_by_file};
use crate::model::{CommitRecord, ReportSummary};

pub const BINARY_MARKER: &str = "*Binary file changed*";

/// Render the commit report: header, summary, author table, commits by
/// author, then diffs grouped by file.
pub fn render_commit_report(
    ctx: &RenderContext<'_>,
    commits: &[CommitRecord],
    summary: &ReportSummary,
) -> String {
    let mut out = Vec::new();
    ctx.push_header(&mut out, "Git Commit Report");

    out.push("## Summary".to_string());
    out.push(String::new());
    out.push(format!("- **Commits:** {}", summary.total_commits));
    out.push(format!("- **Authors:** {}", summary.commits_by_author.len()));
    out.push(format!("- **Files Added:** {}", summary.file_changes.added));
    out.push(format!("- **Files Modified:** {}", summary.file_changes.modified));
    out.push(format!("- **Files Deleted:** {}", summary.file_changes.deleted));
    out.push(String::new());

    if commits.is_empty() {
        out.push("No commits found in the specified period.".to_string());
        return join_lines(out);
    }

    out.push("## Commit Summary".to_string());
    out.push(String::new());
    out.push("| Commits | Author |".to_string());
    out.push("|---------|--------|".to_string());
    for entry in &summary.commits_by_author {
        out.push(format!("| {} | {} |", entry.commits, escape_cell(&entry.author)));
    }
    out.push(String::new());

    out.push("## Commits by Author".to_string());
    out.push(String::new());
    for (author, list) in group_by_author(commits, summary) {
        out.push(format!("### {author}"));
        out.push(String::new());
        for commit in list {
            let merge = if commit.is_merge() { " (merge)" } else { "" };
            out.push(format!(
                "- {} {}{merge} *({})*",
                commit_link(ctx, commit),
                commit.subject(),
                commit.timestamp.format("%Y-%m-%d %H:%M")
            ));
        }
        out.push(String::new());
        out.push("---".to_string());
        out.push(String::new());
    }

    out.push("## File Diffs".to_string());
    out.push(String::new());

    let files = group_by_file(commits);
    if files.is_empty() {
        out.push("No file changes found in the specified period.".to_string());
        out.push(String::new());
        return join_lines(out);
    }

    out.push("All changes to files in the specified period:".to_string());
    out.push(String::new());
    for (path, changes) in files {
        out.push(format!("### {path}"));
        out.push(String::new());
        for (commit, change) in changes {
            let renamed = change
                .previous_path
                .as_deref()
                .map(|p| format!(" (renamed from {p})"))
                .unwrap_or_default();
            out.push(format!(
                "**Commit:** {} - {} ({}) *[{}{renamed}]*",
                commit_link(ctx, commit),
                commit.subject(),
                commit.timestamp.format("%Y-%m-%d %H:%M"),
                change.status.label()
            ));
            out.push(String::new());
            match change.diff_text.as_deref() {
                Some(diff) if !change.binary => {
                    let fence = code_fence(diff);
                    out.push(format!("{fence}diff"));
                    out.push(diff.to_string());
                    out.push(fence);
                }
                _ => out.push(BINARY_MARKER.to_string()),
            }
            out.push(String::new());
        }
        out.push("---".to_string());
        out.push(String::new());
    }

    join_lines(out)
}

fn commit_link(ctx: &RenderContext<'_>, commit: &CommitRecord) -> String {
    let url = ctx.links.map(|links| links.commit(&commit.hash));
    link(commit.short_hash(), url.as_deref())
}
