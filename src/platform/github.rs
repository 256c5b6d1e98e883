use super::{parse_error, run_platform_tool, ActivitySource};
use crate::error::Result;
use crate::model::{ActivityKind, ActivityRecord, ActivityState, Platform, TimeRange};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;

const INSTALL_HINT: &str = "https://cli.github.com/";
const LIMIT: &str = "1000";

#[derive(Debug, Deserialize)]
struct GhItem {
    number: u64,
    title: String,
    #[serde(default)]
    author: Option<GhAuthor>,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct GhAuthor {
    login: String,
}

/// One `gh <issue|pr> list` query and the state it reports.
struct Query {
    kind: ActivityKind,
    state: ActivityState,
    qualifier: &'static str,
    list_state: &'static str,
}

const QUERIES: &[Query] = &[
    Query { kind: ActivityKind::Issue, state: ActivityState::Created, qualifier: "created", list_state: "all" },
    Query { kind: ActivityKind::Issue, state: ActivityState::Updated, qualifier: "updated", list_state: "all" },
    Query { kind: ActivityKind::Issue, state: ActivityState::Closed, qualifier: "closed", list_state: "closed" },
    Query { kind: ActivityKind::ChangeRequest, state: ActivityState::Created, qualifier: "created", list_state: "all" },
    Query { kind: ActivityKind::ChangeRequest, state: ActivityState::Updated, qualifier: "updated", list_state: "all" },
    Query { kind: ActivityKind::ChangeRequest, state: ActivityState::Merged, qualifier: "merged", list_state: "merged" },
    Query { kind: ActivityKind::ChangeRequest, state: ActivityState::Closed, qualifier: "closed", list_state: "closed" },
];

/// Issue and pull request activity from the GitHub CLI (`gh`).
pub struct GithubSource {
    gh_bin: OsString,
    repo_path: PathBuf,
}

impl GithubSource {
    pub fn new(gh_bin: impl Into<OsString>, repo_path: impl Into<PathBuf>) -> Self {
        Self {
            gh_bin: gh_bin.into(),
            repo_path: repo_path.into(),
        }
    }

    fn run_query(&self, query: &Query, since: &str) -> Result<Vec<ActivityRecord>> {
        let subcommand = match query.kind {
            ActivityKind::Issue => "issue",
            ActivityKind::ChangeRequest => "pr",
        };
        let mut search = format!("{}:>={since}", query.qualifier);
        if query.kind == ActivityKind::ChangeRequest && query.state == ActivityState::Closed {
            search.push_str(" is:unmerged");
        }

        let args: Vec<String> = vec![
            subcommand.to_string(),
            "list".to_string(),
            "--search".to_string(),
            search,
            "--state".to_string(),
            query.list_state.to_string(),
            "--json".to_string(),
            "number,title,author,url".to_string(),
            "--limit".to_string(),
            LIMIT.to_string(),
        ];

        let output = run_platform_tool(&self.gh_bin, INSTALL_HINT, &args, &self.repo_path)?;
        let items = parse_items(&output).map_err(|e| parse_error(&self.gh_bin, &args, e))?;
        debug!(kind = subcommand, state = ?query.state, count = items.len(), "gh query returned");

        Ok(items
            .into_iter()
            .map(|item| to_record(item, query.kind, query.state))
            .collect())
    }
}

impl ActivitySource for GithubSource {
    fn platform(&self) -> Platform {
        Platform::Github
    }

    fn collect_activity(&self, range: &TimeRange) -> Result<Vec<ActivityRecord>> {
        let since = range.start.format("%Y-%m-%d").to_string();
        let mut records = Vec::new();
        for query in QUERIES {
            records.extend(self.run_query(query, &since)?);
        }
        Ok(records)
    }
}

fn parse_items(output: &str) -> serde_json::Result<Vec<GhItem>> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(output)
}

fn to_record(item: GhItem, kind: ActivityKind, state: ActivityState) -> ActivityRecord {
    ActivityRecord {
        platform: Platform::Github,
        kind,
        number: item.number,
        title: item.title,
        author: item
            .author
            .map(|a| a.login)
            .filter(|login| !login.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        state,
        url: item.url,
    }
}
