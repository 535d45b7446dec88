use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Deserialize;

/// Login GitHub reports for accounts that no longer exist.
pub const GHOST_LOGIN: &str = "ghost";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses `owner/name`.
    pub fn parse(value: &str) -> Option<Self> {
        let (owner, name) = value.trim().split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self { start, end })
    }

    /// Renders the window as a search `updated:` qualifier.
    pub fn updated_qualifier(&self) -> String {
        format!(
            "updated:{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: i64,
    pub author: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub author: String,
    pub state: ReviewState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub author: String,
    pub body: String,
}

/// One page of search results together with the rate-limit accounting for that page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub pull_requests: Vec<PullRequest>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
    pub cost: i64,
    pub remaining: i64,
}

/// Approvers and reviewers resolved for a single pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalSet {
    pub approvers: BTreeSet<String>,
    pub reviewers: BTreeSet<String>,
}

impl SignalSet {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.approvers.is_empty() && self.reviewers.is_empty()
    }

    pub fn approvers_joined(&self) -> String {
        join_logins(&self.approvers)
    }

    pub fn reviewers_joined(&self) -> String {
        join_logins(&self.reviewers)
    }
}

fn join_logins(logins: &BTreeSet<String>) -> String {
    logins
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
