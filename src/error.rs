use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid time range '{0}': expected <N>.<unit> with N > 0 and unit one of week(s), month(s), year(s)")]
    InvalidRangeKind(String),
    #[error("Repository not found: {} is not a git repository", .0.display())]
    RepositoryNotFound(PathBuf),
    #[error("Version control tool error: `{command}` failed ({status}): {stderr}")]
    VersionControlToolError {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("Unsupported platform: remote '{0}' is neither a GitHub nor a GitLab repository")]
    UnsupportedPlatform(String),
    #[error("Platform tool missing: `{tool}` is not installed or not in PATH (install it from {install_hint})")]
    PlatformToolMissing { tool: String, install_hint: String },
    #[error("Platform tool error: `{command}` failed ({status}): {stderr}")]
    PlatformToolError {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("Output write error: {}: {source}", path.display())]
    OutputWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    /// Short category name, printed next to each failed report.
    pub fn kind(&self) -> &'static str {
        match self {
            ReportError::InvalidRangeKind(_) => "InvalidRangeKind",
            ReportError::RepositoryNotFound(_) => "RepositoryNotFound",
            ReportError::VersionControlToolError { .. } => "VersionControlToolError",
            ReportError::UnsupportedPlatform(_) => "UnsupportedPlatform",
            ReportError::PlatformToolMissing { .. } => "PlatformToolMissing",
            ReportError::PlatformToolError { .. } => "PlatformToolError",
            ReportError::OutputWriteError { .. } => "OutputWriteError",
        }
    }
}
