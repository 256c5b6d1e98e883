use super::{join_lines, link, RenderContext};
use crate::model::{ActivityKind, ActivityRecord, ActivityState, Platform, ReportSummary};

struct Wording {
    noun: &'static str,
    short: &'static str,
    prefix: &'static str,
}

fn wording(platform: Platform, kind: ActivityKind) -> Wording {
    match (platform, kind) {
        (_, ActivityKind::Issue) => Wording {
            noun: "Issues",
            short: "Issues",
            prefix: "#",
        },
        (Platform::Github, ActivityKind::ChangeRequest) => Wording {
            noun: "Pull Requests",
            short: "PRs",
            prefix: "#",
        },
        (Platform::Gitlab, ActivityKind::ChangeRequest) => Wording {
            noun: "Merge Requests",
            short: "MRs",
            prefix: "!",
        },
    }
}

fn states_for(kind: ActivityKind) -> &'static [ActivityState] {
    match kind {
        ActivityKind::Issue => &[ActivityState::Created, ActivityState::Updated, ActivityState::Closed],
        ActivityKind::ChangeRequest => &[
            ActivityState::Created,
            ActivityState::Updated,
            ActivityState::Merged,
            ActivityState::Closed,
        ],
    }
}

/// Detailed lists, in this order; updates are only counted.
const DETAIL_SECTIONS: &[(ActivityKind, ActivityState)] = &[
    (ActivityKind::Issue, ActivityState::Created),
    (ActivityKind::Issue, ActivityState::Closed),
    (ActivityKind::ChangeRequest, ActivityState::Created),
    (ActivityKind::ChangeRequest, ActivityState::Merged),
    (ActivityKind::ChangeRequest, ActivityState::Closed),
];

fn state_label(kind: ActivityKind, state: ActivityState) -> String {
    if kind == ActivityKind::ChangeRequest && state == ActivityState::Closed {
        "Closed (not merged)".to_string()
    } else {
        state.label().to_string()
    }
}

/// Render the issue and pull/merge request summary for one platform.
pub fn render_platform_report(
    ctx: &RenderContext<'_>,
    platform: Platform,
    activities: &[ActivityRecord],
    summary: &ReportSummary,
) -> String {
    let mut out = Vec::new();
    ctx.push_header(&mut out, &format!("{platform} Activity Summary"));

    for kind in [ActivityKind::Issue, ActivityKind::ChangeRequest] {
        let words = wording(platform, kind);
        out.push(format!("## {} Summary", words.noun));
        out.push(String::new());
        for &state in states_for(kind) {
            out.push(format!(
                "- **{} {}:** {}",
                words.short,
                state_label(kind, state),
                summary.activity_count(kind, state)
            ));
        }
        out.push(String::new());
    }

    for &(kind, state) in DETAIL_SECTIONS {
        let items: Vec<&ActivityRecord> = activities
            .iter()
            .filter(|a| a.kind == kind && a.state == state)
            .collect();
        if items.is_empty() {
            continue;
        }

        let words = wording(platform, kind);
        out.push(format!("## {} {}", words.noun, state_label(kind, state)));
        out.push(String::new());
        for item in items {
            out.push(format!(
                "- {}: {} (by @{})",
                activity_link(ctx, &words, item),
                item.title,
                item.author
            ));
        }
        out.push(String::new());
    }

    join_lines(out)
}

fn activity_link(ctx: &RenderContext<'_>, words: &Wording, item: &ActivityRecord) -> String {
    let label = format!("{}{}", words.prefix, item.number);
    let url = if item.url.is_empty() {
        ctx.links.map(|links| links.activity(item.kind, item.number))
    } else {
        Some(item.url.clone())
    };
    link(&label, url.as_deref())
}
