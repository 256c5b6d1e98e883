use crate::model::Platform;
use crate::range::DEFAULT_TIME_RANGE;
use crate::report::{run_reports, ReportOutcome, ReportType, RunContext, ToolPaths};
use anyhow::{Context, Result};
use clap::{Args, Parser, ValueEnum};
use console::style;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "git-report")]
#[command(about = "Generate markdown reports of git commits and GitHub/GitLab activity")]
#[command(version)]
pub struct Cli {
    #[arg(help = "Path to the git repository")]
    pub repo_path: PathBuf,

    #[arg(
        long,
        default_value = DEFAULT_TIME_RANGE,
        help = "Time period for the report: <N>.<unit> with unit week(s), month(s) or year(s)"
    )]
    pub time_range: String,

    #[arg(long, default_value = ".", help = "Directory where reports will be saved")]
    pub output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = ReportTypeArg::All, help = "Which reports to generate")]
    pub report_type: ReportTypeArg,

    #[arg(long, value_enum, help = "Hosting platform, instead of detecting it from the origin remote")]
    pub platform: Option<PlatformArg>,

    #[command(flatten)]
    pub tools: ToolArgs,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity (-v, -vv, -vvv)")]
    pub verbose: u8,
}

#[derive(Args, Clone, Debug)]
pub struct ToolArgs {
    #[arg(long, env = "GIT_REPORT_GIT", default_value = "git", help = "git executable")]
    pub git_bin: PathBuf,

    #[arg(long, env = "GIT_REPORT_GH", default_value = "gh", help = "GitHub CLI executable")]
    pub gh_bin: PathBuf,

    #[arg(long, env = "GIT_REPORT_GLAB", default_value = "glab", help = "GitLab CLI executable")]
    pub glab_bin: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportTypeArg {
    /// Commit report and platform summary
    All,
    /// Only the commit report
    Commits,
    /// Only the GitHub/GitLab summary
    #[value(alias = "github", alias = "gitlab")]
    Platform,
}

impl From<ReportTypeArg> for ReportType {
    fn from(arg: ReportTypeArg) -> Self {
        match arg {
            ReportTypeArg::All => ReportType::All,
            ReportTypeArg::Commits => ReportType::Commits,
            ReportTypeArg::Platform => ReportType::Platform,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    Github,
    Gitlab,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Github => Platform::Github,
            PlatformArg::Gitlab => Platform::Gitlab,
        }
    }
}

impl From<ToolArgs> for ToolPaths {
    fn from(args: ToolArgs) -> Self {
        Self {
            git: args.git_bin.into_os_string(),
            gh: args.gh_bin.into_os_string(),
            glab: args.glab_bin.into_os_string(),
        }
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        crate::logging::init(self.verbose);

        let (ctx, repo) = RunContext::prepare(
            &self.repo_path,
            &self.time_range,
            &self.output_dir,
            self.platform.map(Platform::from),
            self.tools.into(),
        )
        .context("Failed to prepare report run")?;

        let activity = ctx.activity_source();
        let outcomes = run_reports(&ctx, self.report_type.into(), &repo, activity.as_deref());

        let mut generated = 0;
        for outcome in &outcomes {
            match outcome {
                ReportOutcome::Written { kind, path } => {
                    generated += 1;
                    println!(
                        "{} {} generated: {}",
                        style("✓").green(),
                        capitalize(kind.title()),
                        path.display()
                    );
                }
                ReportOutcome::Skipped { reason } => {
                    println!("{} {}", style("⚠").yellow(), reason);
                }
                ReportOutcome::Failed { report, error } => {
                    eprintln!(
                        "{} {} failed [{}]: {}",
                        style("✗").red(),
                        capitalize(report),
                        error.kind(),
                        error
                    );
                }
            }
        }

        println!("\n{}", "=".repeat(60));
        println!("{}", style("Report generation complete!").bold());
        println!("Total reports generated: {}", style(generated).cyan());
        println!("{}", "=".repeat(60));

        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        if failed > 0 {
            anyhow::bail!("{failed} of {} requested report(s) failed", outcomes.len());
        }
        Ok(())
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
