use tracing::{debug, info};

use crate::collector::collect_pull_requests;
use crate::config::{OwnerApprovalPolicy, StatsConfig};
use crate::counter::RankedCounter;
use crate::error::StatsError;
use crate::models::{PullRequest, SignalSet};
use crate::signals::extract_signals;
use crate::source::ReviewSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsReport {
    pub authors: RankedCounter,
    pub approvers: RankedCounter,
    pub reviewers: RankedCounter,
    pub pull_requests: usize,
    pub search_cost: i64,
    pub rate_limit_remaining: i64,
}

impl Default for StatsReport {
    fn default() -> Self {
        Self {
            authors: RankedCounter::new("authors"),
            approvers: RankedCounter::new("approvers"),
            reviewers: RankedCounter::new("reviewers"),
            pull_requests: 0,
            search_cost: 0,
            rate_limit_remaining: 0,
        }
    }
}

impl StatsReport {
    /// Credits one pull request: its author once, and every login in each signal set once.
    pub fn record(&mut self, pr: &PullRequest, signals: &SignalSet) {
        self.pull_requests += 1;
        self.authors.increment(&pr.author);
        for login in &signals.approvers {
            self.approvers.increment(login);
        }
        for login in &signals.reviewers {
            self.reviewers.increment(login);
        }
    }

    pub fn tables(&self) -> [&RankedCounter; 3] {
        [&self.authors, &self.approvers, &self.reviewers]
    }

    pub fn log_tables(&self) {
        for counter in self.tables() {
            if counter.is_empty() {
                debug!("no {} recorded", counter.name());
            }
            for line in counter.table_lines() {
                info!("{line}");
            }
        }
    }
}

pub fn apply_owner_policy(config: &StatsConfig, pr: &PullRequest, signals: &mut SignalSet) {
    if !config.is_owner(&pr.author) {
        return;
    }

    match config.owner_approval {
        OwnerApprovalPolicy::Ignore => {}
        OwnerApprovalPolicy::SuppressSelfApproval => {
            signals.approvers.remove(&pr.author);
        }
        OwnerApprovalPolicy::CreditAuthor => {
            signals.approvers.insert(pr.author.clone());
        }
    }
}

/// Collects every matching pull request, then fetches and folds their review signals one at
/// a time in search order. The first failure ends the run without a report.
pub async fn run_stats<S>(source: &S, config: &StatsConfig) -> Result<StatsReport, StatsError>
where
    S: ReviewSource + ?Sized,
{
    let collected = collect_pull_requests(source, &config.repository, &config.window).await?;
    info!(
        "Search cost {} point(s). {} remaining.",
        collected.total_cost, collected.remaining
    );

    let mut report = StatsReport {
        search_cost: collected.total_cost,
        rate_limit_remaining: collected.remaining,
        ..StatsReport::default()
    };

    for pr in &collected.pull_requests {
        let mut signals = extract_signals(source, &config.repository, pr.number).await?;
        apply_owner_policy(config, pr, &mut signals);

        info!(
            "PR: {:>5} {} {} {}",
            pr.number,
            pr.author,
            signals.approvers_joined(),
            signals.reviewers_joined()
        );
        report.record(pr, &signals);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::{apply_owner_policy, run_stats, StatsReport};
    use crate::config::{OwnerApprovalPolicy, StatsConfig};
    use crate::error::{ApiError, StatsError};
    use crate::models::{
        Comment, PullRequest, Repository, Review, ReviewState, SearchPage, SignalSet, TimeWindow,
    };
    use crate::source::ReviewSource;

    #[derive(Default)]
    struct FakeSource {
        pull_requests: Vec<PullRequest>,
        reviews: HashMap<i64, Vec<Review>>,
        comments: HashMap<i64, Vec<Comment>>,
        failing_reviews: Option<i64>,
        log: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn log(&self) -> Vec<String> {
            self.log.lock().expect("log lock").clone()
        }
    }

    #[async_trait]
    impl ReviewSource for FakeSource {
        async fn search(&self, _: &str, _: Option<&str>) -> Result<SearchPage, ApiError> {
            self.log.lock().expect("log lock").push("search".to_string());
            Ok(SearchPage {
                pull_requests: self.pull_requests.clone(),
                has_next_page: false,
                end_cursor: None,
                cost: 1,
                remaining: 4999,
            })
        }

        async fn list_reviews(
            &self,
            _: &Repository,
            number: i64,
        ) -> Result<Vec<Review>, ApiError> {
            self.log
                .lock()
                .expect("log lock")
                .push(format!("reviews #{number}"));
            if self.failing_reviews == Some(number) {
                return Err(ApiError::Status {
                    status: 500,
                    body: "oops".to_string(),
                });
            }
            Ok(self.reviews.get(&number).cloned().unwrap_or_default())
        }

        async fn list_comments(
            &self,
            _: &Repository,
            number: i64,
        ) -> Result<Vec<Comment>, ApiError> {
            self.log
                .lock()
                .expect("log lock")
                .push(format!("comments #{number}"));
            Ok(self.comments.get(&number).cloned().unwrap_or_default())
        }
    }

    fn config() -> StatsConfig {
        StatsConfig::new(
            Repository::new("kubernetes", "kops"),
            TimeWindow::new(
                NaiveDate::from_ymd_opt(2020, 7, 1).expect("valid date"),
                NaiveDate::from_ymd_opt(2021, 7, 1).expect("valid date"),
            )
            .expect("valid window"),
        )
    }

    fn pr(number: i64, author: &str) -> PullRequest {
        PullRequest {
            number,
            author: author.to_string(),
        }
    }

    fn review(author: &str, state: ReviewState) -> Review {
        Review {
            author: author.to_string(),
            state,
        }
    }

    fn comment(author: &str, body: &str) -> Comment {
        Comment {
            author: author.to_string(),
            body: body.to_string(),
        }
    }

    fn pairs(values: &[(&str, u64)]) -> Vec<(String, u64)> {
        values
            .iter()
            .map(|(login, count)| (login.to_string(), *count))
            .collect()
    }

    #[tokio::test]
    async fn single_pull_request_scenario() {
        let source = FakeSource {
            pull_requests: vec![pr(42, "alice")],
            reviews: HashMap::from([(42, vec![review("bob", ReviewState::Approved)])]),
            comments: HashMap::from([(42, vec![comment("carol", "Nice work.\n/lgtm\n")])]),
            ..FakeSource::default()
        };

        let report = run_stats(&source, &config()).await.expect("run should succeed");

        assert_eq!(report.authors.rank(), pairs(&[("alice", 1)]));
        assert_eq!(report.approvers.rank(), pairs(&[("bob", 1)]));
        assert_eq!(report.reviewers.rank(), pairs(&[("bob", 1), ("carol", 1)]));
        assert_eq!(report.pull_requests, 1);
        assert_eq!(report.search_cost, 1);
        assert_eq!(report.rate_limit_remaining, 4999);
    }

    #[tokio::test]
    async fn repeated_signals_count_once_per_pull_request() {
        let source = FakeSource {
            pull_requests: vec![pr(1, "alice"), pr(2, "alice"), pr(3, "bob")],
            reviews: HashMap::from([
                (
                    1,
                    vec![
                        review("bob", ReviewState::ChangesRequested),
                        review("bob", ReviewState::Approved),
                    ],
                ),
                (2, vec![review("bob", ReviewState::Approved)]),
            ]),
            comments: HashMap::from([
                (1, vec![comment("bob", "/lgtm"), comment("bob", "/approve")]),
                (3, vec![comment("alice", "/lgtm\n/approve")]),
            ]),
            ..FakeSource::default()
        };

        let report = run_stats(&source, &config()).await.expect("run should succeed");

        assert_eq!(report.authors.rank(), pairs(&[("alice", 2), ("bob", 1)]));
        assert_eq!(report.approvers.rank(), pairs(&[("bob", 2), ("alice", 1)]));
        assert_eq!(report.reviewers.rank(), pairs(&[("bob", 2), ("alice", 1)]));
    }

    #[tokio::test]
    async fn fetches_sequentially_in_collection_order() {
        let source = FakeSource {
            pull_requests: vec![pr(7, "zed"), pr(3, "amy")],
            ..FakeSource::default()
        };

        run_stats(&source, &config()).await.expect("run should succeed");

        assert_eq!(
            source.log(),
            vec![
                "search".to_string(),
                "reviews #7".to_string(),
                "comments #7".to_string(),
                "reviews #3".to_string(),
                "comments #3".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn review_failure_aborts_run() {
        let source = FakeSource {
            pull_requests: vec![pr(1, "alice"), pr(2, "bob"), pr(3, "carol")],
            failing_reviews: Some(2),
            ..FakeSource::default()
        };

        let err = run_stats(&source, &config())
            .await
            .expect_err("run should fail");

        match err {
            StatsError::Transport { operation, .. } => {
                assert_eq!(operation, "list reviews on #2")
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!source.log().contains(&"reviews #3".to_string()));
    }

    #[test]
    fn owner_policy_defaults_to_no_change() {
        let config = config().with_owners(["alice"]);
        let mut signals = SignalSet::default();
        signals.approvers.insert("alice".to_string());

        apply_owner_policy(&config, &pr(1, "alice"), &mut signals);

        assert!(signals.approvers.contains("alice"));
    }

    #[test]
    fn suppresses_owner_self_approval() {
        let config = config()
            .with_owners(["alice"])
            .with_owner_approval(OwnerApprovalPolicy::SuppressSelfApproval);
        let mut signals = SignalSet::default();
        signals.approvers.insert("alice".to_string());
        signals.approvers.insert("bob".to_string());
        signals.reviewers.insert("alice".to_string());

        apply_owner_policy(&config, &pr(1, "alice"), &mut signals);

        assert_eq!(signals.approvers_joined(), "bob");
        assert_eq!(signals.reviewers_joined(), "alice");
    }

    #[test]
    fn suppression_only_applies_to_owners() {
        let config = config()
            .with_owners(["alice"])
            .with_owner_approval(OwnerApprovalPolicy::SuppressSelfApproval);
        let mut signals = SignalSet::default();
        signals.approvers.insert("bob".to_string());

        apply_owner_policy(&config, &pr(1, "bob"), &mut signals);

        assert_eq!(signals.approvers_joined(), "bob");
    }

    #[test]
    fn credits_owner_author_as_approver() {
        let config = config()
            .with_owners(["alice"])
            .with_owner_approval(OwnerApprovalPolicy::CreditAuthor);
        let mut signals = SignalSet::default();

        apply_owner_policy(&config, &pr(1, "alice"), &mut signals);

        assert_eq!(signals.approvers_joined(), "alice");
        assert!(signals.reviewers.is_empty());
    }

    #[test]
    fn empty_report_has_named_tables() {
        let report = StatsReport::default();
        let names: Vec<&str> = report.tables().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["authors", "approvers", "reviewers"]);
    }
}
