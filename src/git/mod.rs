pub mod parse;
pub mod repo;

use crate::error::Result;
use crate::model::{CommitRecord, TimeRange};

pub use parse::{parse_log, parse_patch};
pub use repo::GitRepo;

/// Anything that can list the commits made inside a time window.
pub trait CommitSource {
    fn collect_commits(&self, range: &TimeRange) -> Result<Vec<CommitRecord>>;
}
