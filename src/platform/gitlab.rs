use super::{parse_error, run_platform_tool, ActivitySource};
use crate::error::Result;
use crate::model::{ActivityKind, ActivityRecord, ActivityState, Platform, TimeRange};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;

const INSTALL_HINT: &str = "https://gitlab.com/gitlab-org/cli";
const PER_PAGE: &str = "100";

#[derive(Debug, Deserialize)]
struct GlItem {
    iid: u64,
    title: String,
    #[serde(default)]
    author: Option<GlAuthor>,
    #[serde(default)]
    web_url: String,
    #[serde(default)]
    state: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GlAuthor {
    username: String,
}

/// Issue and merge request activity from the GitLab CLI (`glab`).
///
/// `glab` list commands cannot filter by date, so results are filtered
/// against the range after parsing.
pub struct GitlabSource {
    glab_bin: OsString,
    repo_path: PathBuf,
}

impl GitlabSource {
    pub fn new(glab_bin: impl Into<OsString>, repo_path: impl Into<PathBuf>) -> Self {
        Self {
            glab_bin: glab_bin.into(),
            repo_path: repo_path.into(),
        }
    }

    fn list(&self, kind: ActivityKind) -> Result<Vec<GlItem>> {
        let subcommand = match kind {
            ActivityKind::Issue => "issue",
            ActivityKind::ChangeRequest => "mr",
        };
        let args: Vec<String> = vec![
            subcommand.to_string(),
            "list".to_string(),
            "--all".to_string(),
            "--output".to_string(),
            "json".to_string(),
            "--per-page".to_string(),
            PER_PAGE.to_string(),
        ];

        let output = run_platform_tool(&self.glab_bin, INSTALL_HINT, &args, &self.repo_path)?;
        let items = parse_items(&output).map_err(|e| parse_error(&self.glab_bin, &args, e))?;
        debug!(kind = subcommand, count = items.len(), "glab list returned");
        Ok(items)
    }
}

impl ActivitySource for GitlabSource {
    fn platform(&self) -> Platform {
        Platform::Gitlab
    }

    fn collect_activity(&self, range: &TimeRange) -> Result<Vec<ActivityRecord>> {
        let mut records = Vec::new();
        for kind in [ActivityKind::Issue, ActivityKind::ChangeRequest] {
            let items = self.list(kind)?;
            records.extend(records_in_range(&items, kind, range));
        }
        Ok(records)
    }
}

fn parse_items(output: &str) -> serde_json::Result<Vec<GlItem>> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(output)
}

/// Expand each item into one record per state it reached inside `range`,
/// ordered by state so the output mirrors the GitHub query order.
fn records_in_range(items: &[GlItem], kind: ActivityKind, range: &TimeRange) -> Vec<ActivityRecord> {
    let in_range = |ts: &Option<DateTime<Utc>>| ts.as_ref().is_some_and(|t| range.contains(t));

    let mut states = vec![ActivityState::Created, ActivityState::Updated];
    if kind == ActivityKind::ChangeRequest {
        states.push(ActivityState::Merged);
    }
    states.push(ActivityState::Closed);

    let mut records = Vec::new();
    for state in states {
        for item in items {
            let reached = match state {
                ActivityState::Created => in_range(&item.created_at),
                ActivityState::Updated => in_range(&item.updated_at),
                ActivityState::Merged => in_range(&item.merged_at),
                ActivityState::Closed => item.state == "closed" && in_range(&item.closed_at),
            };
            if reached {
                records.push(to_record(item, kind, state));
            }
        }
    }
    records
}

fn to_record(item: &GlItem, kind: ActivityKind, state: ActivityState) -> ActivityRecord {
    ActivityRecord {
        platform: Platform::Gitlab,
        kind,
        number: item.iid,
        title: item.title.clone(),
        author: item
            .author
            .as_ref()
            .map(|a| a.username.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        state,
        url: item.web_url.clone(),
    }
}
