use std::sync::LazyLock;

use regex::Regex;

use crate::error::StatsError;
use crate::models::{Comment, Repository, Review, ReviewState, SignalSet};
use crate::source::ReviewSource;

static LGTM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*/lgtm\s*$").expect("lgtm pattern is valid"));
static APPROVE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*/approve\s*$").expect("approve pattern is valid"));

pub fn is_lgtm_command(body: &str) -> bool {
    LGTM_PATTERN.is_match(body)
}

pub fn is_approve_command(body: &str) -> bool {
    APPROVE_PATTERN.is_match(body)
}

/// Folds formal reviews and `/lgtm` / `/approve` comment commands into one signal set.
///
/// An approving review credits its author as approver and reviewer; requesting changes
/// credits a reviewer only. `/lgtm` adds a reviewer, `/approve` adds an approver, and a
/// comment carrying both lines counts for both.
pub fn reconcile_signals(reviews: &[Review], comments: &[Comment]) -> SignalSet {
    let mut signals = SignalSet::default();

    for review in reviews {
        match review.state {
            ReviewState::Approved => {
                signals.approvers.insert(review.author.clone());
                signals.reviewers.insert(review.author.clone());
            }
            ReviewState::ChangesRequested => {
                signals.reviewers.insert(review.author.clone());
            }
            ReviewState::Other => {}
        }
    }

    for comment in comments {
        if is_lgtm_command(&comment.body) {
            signals.reviewers.insert(comment.author.clone());
        }
        if is_approve_command(&comment.body) {
            signals.approvers.insert(comment.author.clone());
        }
    }

    signals
}

/// Fetches reviews then comments for one pull request and reconciles them.
pub async fn extract_signals<S>(
    source: &S,
    repository: &Repository,
    number: i64,
) -> Result<SignalSet, StatsError>
where
    S: ReviewSource + ?Sized,
{
    let reviews = source
        .list_reviews(repository, number)
        .await
        .map_err(|err| StatsError::transport(format!("list reviews on #{number}"), err))?;
    let comments = source
        .list_comments(repository, number)
        .await
        .map_err(|err| StatsError::transport(format!("list comments on #{number}"), err))?;

    Ok(reconcile_signals(&reviews, &comments))
}
