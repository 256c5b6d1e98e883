use crate::error::{ReportError, Result};
use crate::git::parse::{parse_log, LOG_FORMAT};
use crate::git::CommitSource;
use crate::model::{CommitRecord, TimeRange};
use crate::tool::{self, ToolFailure};
use gix::{discover, Repository};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const GIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S +0000";

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
    git_bin: OsString,
}

impl GitRepo {
    /// Open the repository containing `path`.
    pub fn open<P: AsRef<Path>>(path: P, git_bin: impl Into<OsString>) -> Result<Self> {
        let requested = path.as_ref();
        if !requested.is_dir() {
            return Err(ReportError::RepositoryNotFound(requested.to_path_buf()));
        }

        let repo = discover(requested).map_err(|e| {
            debug!(error = %e, path = %requested.display(), "repository discovery failed");
            ReportError::RepositoryNotFound(requested.to_path_buf())
        })?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self {
            repo,
            path,
            git_bin: git_bin.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory name of the working tree, used in report titles and file names.
    pub fn name(&self) -> String {
        let path = self.path.canonicalize().unwrap_or_else(|_| self.path.clone());
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "repository".to_string())
    }

    pub fn remote_url(&self) -> Option<String> {
        self.repo
            .config_snapshot()
            .string("remote.origin.url")
            .map(|url| url.to_string())
            .filter(|url| !url.trim().is_empty())
    }

    fn has_commits(&self) -> bool {
        match self.repo.head() {
            Ok(head) => !head.is_unborn(),
            Err(_) => true,
        }
    }

    fn git(&self, args: &[String]) -> Result<String> {
        let mut full_args = vec![
            "-C".to_string(),
            self.path.to_string_lossy().into_owned(),
            "-c".to_string(),
            "core.quotepath=false".to_string(),
        ];
        full_args.extend_from_slice(args);

        tool::run(&self.git_bin, &full_args, &self.path).map_err(|failure| {
            let stderr = match failure {
                ToolFailure::Missing => format!(
                    "{} is not installed or not in PATH",
                    self.git_bin.to_string_lossy()
                ),
                _ => failure.stderr(),
            };
            ReportError::VersionControlToolError {
                command: tool::command_line(&self.git_bin, &full_args),
                status: failure.status(),
                stderr,
            }
        })
    }
}

impl CommitSource for GitRepo {
    fn collect_commits(&self, range: &TimeRange) -> Result<Vec<CommitRecord>> {
        if !self.has_commits() {
            info!(repo = %self.path.display(), "repository has no commits yet");
            return Ok(Vec::new());
        }

        let args = vec![
            "log".to_string(),
            format!("--since={}", range.start.format(GIT_DATE_FORMAT)),
            format!("--until={}", range.end.format(GIT_DATE_FORMAT)),
            "--no-color".to_string(),
            "--no-ext-diff".to_string(),
            "--no-show-signature".to_string(),
            "--src-prefix=a/".to_string(),
            "--dst-prefix=b/".to_string(),
            "--patch".to_string(),
            LOG_FORMAT.to_string(),
        ];
        let output = self.git(&args)?;
        let commits = parse_log(&output);
        debug!(count = commits.len(), "parsed commits from git log");
        Ok(commits)
    }
}
