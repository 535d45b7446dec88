use serde::{Deserialize, Serialize};

use crate::models::{ReviewState, GHOST_LOGIN};

#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a, V> {
    pub query: &'a str,
    pub variables: V,
}

#[derive(Debug, Serialize)]
pub struct SearchVariables<'a> {
    pub query: &'a str,
    #[serde(rename = "searchCursor")]
    pub search_cursor: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    pub rate_limit: Option<RateLimit>,
    pub search: SearchConnection,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimit {
    pub cost: i64,
    pub remaining: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConnection {
    pub page_info: PageInfo,
    #[serde(default)]
    pub nodes: Vec<Option<SearchNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// A search hit. Non pull request hits come back as empty objects, unreadable ones as null.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchNode {
    pub number: Option<i64>,
    pub author: Option<Actor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestReview {
    pub user: Option<Actor>,
    pub state: ReviewState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestComment {
    pub user: Option<Actor>,
    #[serde(default)]
    pub body: Option<String>,
}

pub fn login_or_ghost(actor: Option<Actor>) -> String {
    actor
        .map(|actor| actor.login)
        .unwrap_or_else(|| GHOST_LOGIN.to_string())
}
