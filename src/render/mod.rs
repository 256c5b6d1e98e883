pub mod commit;
pub mod platform;

use crate::model::{Platform, TimeRange};
use crate::platform::RepoLinks;
use chrono::{DateTime, Local, NaiveDate};

pub use commit::render_commit_report;
pub use platform::render_platform_report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Commit,
    GithubSummary,
    GitlabSummary,
}

impl ReportKind {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Github => ReportKind::GithubSummary,
            Platform::Gitlab => ReportKind::GitlabSummary,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ReportKind::Commit => "commit",
            ReportKind::GithubSummary => "github_summary",
            ReportKind::GitlabSummary => "gitlab_summary",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ReportKind::Commit => "commit report",
            ReportKind::GithubSummary => "GitHub summary",
            ReportKind::GitlabSummary => "GitLab summary",
        }
    }
}

/// `<YYYYMMDD>_<repo_name>_<time_range_token>_<report_kind>_report.md`
pub fn report_filename(date: NaiveDate, repo_name: &str, token: &str, kind: ReportKind) -> String {
    format!(
        "{}_{}_{}_{}_report.md",
        date.format("%Y%m%d"),
        repo_name,
        token,
        kind.slug()
    )
}

/// What every rendered report needs to know about the run.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub repo_name: &'a str,
    pub range: &'a TimeRange,
    pub generated_at: DateTime<Local>,
    pub links: Option<&'a RepoLinks>,
}

impl RenderContext<'_> {
    fn push_header(&self, out: &mut Vec<String>, title: &str) {
        out.push(format!("# {title} for {}", self.repo_name));
        out.push(format!(
            "*Generated on {}*",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push(String::new());
        out.push(format!(
            "**Period:** {} ({} to {})",
            self.range.description(),
            self.range.start.format("%Y-%m-%d"),
            self.range.end.format("%Y-%m-%d")
        ));
        out.push(String::new());
    }
}

fn link(label: &str, url: Option<&str>) -> String {
    match url {
        Some(url) if !url.is_empty() => format!("[{label}]({url})"),
        _ => label.to_string(),
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// A backtick fence longer than any backtick run inside `body`.
fn code_fence(body: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in body.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

fn join_lines(lines: Vec<String>) -> String {
    let mut text = lines.join("\n");
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
