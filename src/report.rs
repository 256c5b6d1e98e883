use crate::aggregate::summarize;
use crate::error::{ReportError, Result};
use crate::git::{CommitSource, GitRepo};
use crate::model::{Platform, TimeRange};
use crate::platform::{detect_platform, ActivitySource, GithubSource, GitlabSource, RepoLinks};
use crate::range;
use crate::render::{render_commit_report, render_platform_report, report_filename, RenderContext, ReportKind};
use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    All,
    Commits,
    Platform,
}

impl ReportType {
    fn wants_commits(self) -> bool {
        matches!(self, ReportType::All | ReportType::Commits)
    }

    fn wants_platform(self) -> bool {
        matches!(self, ReportType::All | ReportType::Platform)
    }
}

/// Executables used for the external tools.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub git: OsString,
    pub gh: OsString,
    pub glab: OsString,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            git: "git".into(),
            gh: "gh".into(),
            glab: "glab".into(),
        }
    }
}

/// Everything a run needs, resolved once up front.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub repo_path: PathBuf,
    pub repo_name: String,
    pub range: TimeRange,
    pub remote_url: Option<String>,
    pub platform: Option<Platform>,
    pub links: Option<RepoLinks>,
    pub output_dir: PathBuf,
    pub generated_at: DateTime<Local>,
    pub tools: ToolPaths,
}

impl RunContext {
    /// Resolve the time range, then open the repository and inspect its remote.
    pub fn prepare(
        repo_path: &Path,
        time_range: &str,
        output_dir: &Path,
        platform_override: Option<Platform>,
        tools: ToolPaths,
    ) -> Result<(Self, GitRepo)> {
        let range = range::resolve(time_range)?;
        let repo = GitRepo::open(repo_path, tools.git.clone())?;

        let remote_url = repo.remote_url();
        let platform = platform_override.or_else(|| remote_url.as_deref().and_then(detect_platform));
        let links = remote_url
            .as_deref()
            .and_then(|url| RepoLinks::from_remote(url, platform));
        info!(
            repo = %repo.path().display(),
            remote = remote_url.as_deref().unwrap_or("<none>"),
            platform = ?platform,
            start = %range.start,
            end = %range.end,
            "prepared report run"
        );

        let ctx = Self {
            repo_path: repo.path().to_path_buf(),
            repo_name: repo.name(),
            range,
            remote_url,
            platform,
            links,
            output_dir: output_dir.to_path_buf(),
            generated_at: Local::now(),
            tools,
        };
        Ok((ctx, repo))
    }

    fn render_context(&self) -> RenderContext<'_> {
        RenderContext {
            repo_name: &self.repo_name,
            range: &self.range,
            generated_at: self.generated_at,
            links: self.links.as_ref(),
        }
    }

    fn output_path(&self, kind: ReportKind) -> PathBuf {
        let name = report_filename(
            self.generated_at.date_naive(),
            &self.repo_name,
            &self.range.token,
            kind,
        );
        self.output_dir.join(name)
    }

    /// The CLI-backed activity source for the detected platform.
    pub fn activity_source(&self) -> Option<Box<dyn ActivitySource>> {
        match self.platform? {
            Platform::Github => Some(Box::new(GithubSource::new(self.tools.gh.clone(), &self.repo_path))),
            Platform::Gitlab => Some(Box::new(GitlabSource::new(self.tools.glab.clone(), &self.repo_path))),
        }
    }
}

/// Result of one requested report.
#[derive(Debug)]
pub enum ReportOutcome {
    Written { kind: ReportKind, path: PathBuf },
    Skipped { reason: String },
    Failed { report: String, error: ReportError },
}

impl ReportOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ReportOutcome::Failed { .. })
    }
}

/// Attempt each requested report independently; one failing does not stop
/// the others.
pub fn run_reports(
    ctx: &RunContext,
    report_type: ReportType,
    commits: &dyn CommitSource,
    activity: Option<&dyn ActivitySource>,
) -> Vec<ReportOutcome> {
    let mut outcomes = Vec::new();

    if report_type.wants_commits() {
        info!(repo = %ctx.repo_name, "generating commit report");
        outcomes.push(match generate_commit_report(ctx, commits) {
            Ok(path) => ReportOutcome::Written {
                kind: ReportKind::Commit,
                path,
            },
            Err(error) => ReportOutcome::Failed {
                report: ReportKind::Commit.title().to_string(),
                error,
            },
        });
    }

    if report_type.wants_platform() {
        match activity {
            Some(source) => {
                let kind = ReportKind::for_platform(source.platform());
                info!(repo = %ctx.repo_name, platform = %source.platform(), "generating platform summary");
                outcomes.push(match generate_platform_report(ctx, source) {
                    Ok(path) => ReportOutcome::Written { kind, path },
                    Err(error) => ReportOutcome::Failed {
                        report: kind.title().to_string(),
                        error,
                    },
                });
            }
            None => {
                let remote = ctx.remote_url.clone().unwrap_or_else(|| "<no origin remote>".to_string());
                if report_type == ReportType::Platform {
                    outcomes.push(ReportOutcome::Failed {
                        report: "platform summary".to_string(),
                        error: ReportError::UnsupportedPlatform(remote),
                    });
                } else {
                    warn!(%remote, "skipping platform summary: repository is not hosted on GitHub or GitLab");
                    outcomes.push(ReportOutcome::Skipped {
                        reason: format!(
                            "Skipping platform summary: {} is not hosted on GitHub or GitLab",
                            ctx.repo_name
                        ),
                    });
                }
            }
        }
    }

    outcomes
}

pub fn generate_commit_report(ctx: &RunContext, source: &dyn CommitSource) -> Result<PathBuf> {
    let spinner = spinner("Collecting commits...");
    let collected = source.collect_commits(&ctx.range);
    spinner.finish_and_clear();
    let commits = collected?;

    let summary = summarize(&commits, &[]);
    let markdown = render_commit_report(&ctx.render_context(), &commits, &summary);
    write_report(&ctx.output_path(ReportKind::Commit), &markdown)
}

pub fn generate_platform_report(ctx: &RunContext, source: &dyn ActivitySource) -> Result<PathBuf> {
    let platform = source.platform();
    let spinner = spinner(&format!("Collecting {platform} activity..."));
    let collected = source.collect_activity(&ctx.range);
    spinner.finish_and_clear();
    let activities = collected?;

    let summary = summarize(&[], &activities);
    let markdown = render_platform_report(&ctx.render_context(), platform, &activities, &summary);
    write_report(&ctx.output_path(ReportKind::for_platform(platform)), &markdown)
}

/// Write `contents` to `path`, creating the output directory if needed.
pub fn write_report(path: &Path, contents: &str) -> Result<PathBuf> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if dir.exists() && !dir.is_dir() {
            return Err(ReportError::OutputWriteError {
                path: dir.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
            });
        }
        fs::create_dir_all(dir).map_err(|source| ReportError::OutputWriteError {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, contents).map_err(|source| ReportError::OutputWriteError {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = contents.len(), "report written");
    Ok(path.to_path_buf())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActivityKind, ActivityRecord, ActivityState, ChangeKind, CommitRecord, FileChange};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    struct FakeCommits(Vec<CommitRecord>);

    impl CommitSource for FakeCommits {
        fn collect_commits(&self, _range: &TimeRange) -> Result<Vec<CommitRecord>> {
            Ok(self.0.clone())
        }
    }

    struct MissingTool;

    impl ActivitySource for MissingTool {
        fn platform(&self) -> Platform {
            Platform::Github
        }

        fn collect_activity(&self, _range: &TimeRange) -> Result<Vec<ActivityRecord>> {
            Err(ReportError::PlatformToolMissing {
                tool: "gh".to_string(),
                install_hint: "https://cli.github.com/".to_string(),
            })
        }
    }

    struct FakeActivity(Vec<ActivityRecord>);

    impl ActivitySource for FakeActivity {
        fn platform(&self) -> Platform {
            Platform::Gitlab
        }

        fn collect_activity(&self, _range: &TimeRange) -> Result<Vec<ActivityRecord>> {
            Ok(self.0.clone())
        }
    }

    fn context(output_dir: &Path) -> RunContext {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        RunContext {
            repo_path: output_dir.to_path_buf(),
            repo_name: "widgets".to_string(),
            range: range::resolve_at("2.weeks", now).unwrap(),
            remote_url: Some("https://github.com/acme/widgets.git".to_string()),
            platform: Some(Platform::Github),
            links: RepoLinks::from_remote("https://github.com/acme/widgets.git", None),
            output_dir: output_dir.to_path_buf(),
            generated_at: Local.with_ymd_and_hms(2024, 3, 15, 13, 0, 0).unwrap(),
            tools: ToolPaths::default(),
        }
    }

    fn binary_commit() -> CommitRecord {
        CommitRecord {
            hash: "0123456789abcdef".to_string(),
            parents: vec!["fedcba9876543210".to_string()],
            author: "Ada <ada@example.com>".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 14, 9, 0, 0).unwrap(),
            message: "Add logo".to_string(),
            files_changed: vec![FileChange {
                path: "logo.png".to_string(),
                status: ChangeKind::Added,
                previous_path: None,
                binary: true,
                diff_text: None,
            }],
        }
    }

    #[test]
    fn spinner_ticks_until_cleared() {
        let pb = spinner("Collecting commits...");
        assert_eq!(pb.message(), "Collecting commits...");
        std::thread::sleep(Duration::from_millis(250));
        pb.finish_and_clear();
        assert!(pb.is_finished());
    }

    #[test]
    fn platform_failure_does_not_block_commit_report() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        let outcomes = run_reports(&ctx, ReportType::All, &FakeCommits(vec![binary_commit()]), Some(&MissingTool));

        assert_eq!(outcomes.len(), 2);
        match &outcomes[0] {
            ReportOutcome::Written { kind, path } => {
                assert_eq!(*kind, ReportKind::Commit);
                assert_eq!(
                    path.file_name().unwrap().to_string_lossy(),
                    "20240315_widgets_2.weeks_commit_report.md"
                );
                let text = fs::read_to_string(path).unwrap();
                assert!(text.contains("*Binary file changed*"));
                assert!(text.contains("[0123456](https://github.com/acme/widgets/commit/0123456789abcdef)"));
            }
            other => panic!("commit report should be written, got {other:?}"),
        }
        assert!(matches!(
            &outcomes[1],
            ReportOutcome::Failed { error: ReportError::PlatformToolMissing { .. }, .. }
        ));

        let written: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(written.len(), 1);
    }

    #[test]
    fn unsupported_platform_fails_only_when_requested_alone() {
        let dir = tempdir().unwrap();
        let mut ctx = context(dir.path());
        ctx.platform = None;
        ctx.links = None;

        let only = run_reports(&ctx, ReportType::Platform, &FakeCommits(vec![]), None);
        assert!(matches!(
            &only[..],
            [ReportOutcome::Failed { error: ReportError::UnsupportedPlatform(_), .. }]
        ));

        let all = run_reports(&ctx, ReportType::All, &FakeCommits(vec![]), None);
        assert!(matches!(&all[..], [ReportOutcome::Written { .. }, ReportOutcome::Skipped { .. }]));
    }

    #[test]
    fn platform_report_uses_source_platform_in_filename() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        let activity = FakeActivity(vec![ActivityRecord {
            platform: Platform::Gitlab,
            kind: ActivityKind::ChangeRequest,
            number: 7,
            title: "Add cache".to_string(),
            author: "ana".to_string(),
            state: ActivityState::Merged,
            url: "https://gitlab.com/acme/widgets/-/merge_requests/7".to_string(),
        }]);

        let path = generate_platform_report(&ctx, &activity).unwrap();
        assert!(path.ends_with("20240315_widgets_2.weeks_gitlab_summary_report.md"));
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("- **MRs Merged:** 1"));
    }

    #[test]
    fn output_dir_is_created() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested/reports/out.md");
        let path = write_report(&target, "# hi\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "# hi\n");
    }

    #[test]
    fn output_dir_that_is_a_file_is_an_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let err = write_report(&blocker.join("out.md"), "# hi\n").unwrap_err();
        assert!(matches!(err, ReportError::OutputWriteError { .. }));
    }
}
