use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use tracing::info;

use crate::config::{load_token, OwnerApprovalPolicy, StatsConfig};
use crate::github::{
    ClientConfig, CommentSource, GitHubClient, DEFAULT_API_ENDPOINT, DEFAULT_GRAPHQL_ENDPOINT,
};
use crate::logging;
use crate::models::{Repository, TimeWindow};
use crate::stats::run_stats;

#[derive(Debug, Parser)]
#[command(name = "review-stats")]
#[command(about = "Rank pull request authors, approvers and reviewers of a repository")]
struct Cli {
    /// Path to the file containing the GitHub OAuth secret.
    #[arg(long, env = "GITHUB_TOKEN_PATH", default_value = "github.token")]
    github_token_path: PathBuf,

    /// Repository to report on, as owner/name.
    #[arg(long, default_value = "kubernetes/kops", value_parser = parse_repository)]
    repo: Repository,

    /// First day of the updated-at window.
    #[arg(long, default_value = "2020-07-01")]
    from: NaiveDate,

    /// Last day of the updated-at window.
    #[arg(long, default_value = "2021-07-01")]
    to: NaiveDate,

    /// Trusted maintainer logins, comma separated.
    #[arg(long, value_delimiter = ',')]
    owners: Vec<String>,

    #[arg(long, value_enum, default_value_t = OwnerApproval::Ignore)]
    owner_approval: OwnerApproval,

    /// Comment list scanned for /lgtm and /approve.
    #[arg(long, value_enum, default_value_t = CommentSourceArg::Review)]
    comment_source: CommentSourceArg,

    /// Requests allowed per hour, 0 disables throttling.
    #[arg(long, default_value_t = 3500)]
    throttle_hourly: u32,

    #[arg(long, default_value_t = 1000)]
    throttle_burst: u32,

    #[arg(long, env = "GITHUB_GRAPHQL_ENDPOINT", default_value = DEFAULT_GRAPHQL_ENDPOINT)]
    graphql_endpoint: String,

    #[arg(long, env = "GITHUB_API_ENDPOINT", default_value = DEFAULT_API_ENDPOINT)]
    api_endpoint: String,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OwnerApproval {
    Ignore,
    SuppressSelf,
    CreditAuthor,
}

impl From<OwnerApproval> for OwnerApprovalPolicy {
    fn from(value: OwnerApproval) -> Self {
        match value {
            OwnerApproval::Ignore => Self::Ignore,
            OwnerApproval::SuppressSelf => Self::SuppressSelfApproval,
            OwnerApproval::CreditAuthor => Self::CreditAuthor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CommentSourceArg {
    Review,
    Issue,
    Both,
}

impl From<CommentSourceArg> for CommentSource {
    fn from(value: CommentSourceArg) -> Self {
        match value {
            CommentSourceArg::Review => Self::Review,
            CommentSourceArg::Issue => Self::Issue,
            CommentSourceArg::Both => Self::Both,
        }
    }
}

impl Cli {
    fn stats_config(&self) -> anyhow::Result<StatsConfig> {
        let window = TimeWindow::new(self.from, self.to).ok_or_else(|| {
            anyhow::anyhow!(
                "--from {} must not be after --to {}",
                self.from,
                self.to
            )
        })?;

        Ok(StatsConfig::new(self.repo.clone(), window)
            .with_owners(
                self.owners
                    .iter()
                    .map(|owner| owner.trim())
                    .filter(|owner| !owner.is_empty()),
            )
            .with_owner_approval(self.owner_approval.into()))
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_endpoint: self.api_endpoint.clone(),
            graphql_endpoint: self.graphql_endpoint.clone(),
            comment_source: self.comment_source.into(),
            throttle_hourly: self.throttle_hourly,
            throttle_burst: self.throttle_burst,
        }
    }
}

fn parse_repository(value: &str) -> Result<Repository, String> {
    Repository::parse(value).ok_or_else(|| format!("expected owner/name, got '{value}'"))
}

pub async fn run_from_args<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let token = load_token(&cli.github_token_path);
    logging::init(cli.verbose, token.as_deref().unwrap_or_default());
    let token = token?;

    let config = cli.stats_config()?;
    let github = GitHubClient::new(token, cli.client_config())
        .context("error building github client")?;

    info!(
        "Gathering pull request activity for {} ({})",
        config.repository,
        config.window.updated_qualifier()
    );
    let report = run_stats(&github, &config).await?;
    report.log_tables();

    Ok(())
}
