use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::models::{Comment, PullRequest, Repository, Review, SearchPage};
use crate::source::ReviewSource;

pub mod schema;
pub mod throttle;

pub use throttle::Throttle;

pub const DEFAULT_API_ENDPOINT: &str = "https://api.github.com";
pub const DEFAULT_GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";
const PER_PAGE: i64 = 100;

const SEARCH_QUERY: &str = r#"
query($query: String!, $searchCursor: String) {
  rateLimit {
    cost
    remaining
  }
  search(type: ISSUE, first: 100, after: $searchCursor, query: $query) {
    pageInfo {
      hasNextPage
      endCursor
    }
    nodes {
      ... on PullRequest {
        number
        author {
          login
        }
      }
    }
  }
}
"#;

/// Which comment list is scanned for `/lgtm` and `/approve` commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommentSource {
    /// Inline pull request review comments.
    #[default]
    Review,
    /// Conversation comments on the pull request.
    Issue,
    Both,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_endpoint: String,
    pub graphql_endpoint: String,
    pub comment_source: CommentSource,
    pub throttle_hourly: u32,
    pub throttle_burst: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            graphql_endpoint: DEFAULT_GRAPHQL_ENDPOINT.to_string(),
            comment_source: CommentSource::default(),
            throttle_hourly: 3500,
            throttle_burst: 1000,
        }
    }
}

#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_endpoint: String,
    graphql_endpoint: String,
    comment_source: CommentSource,
    throttle: Option<Arc<Throttle>>,
}

impl GitHubClient {
    pub fn new(auth_token: impl Into<String>, config: ClientConfig) -> Result<Self, ApiError> {
        let auth_token = auth_token.into();
        ensure_not_blank("auth token", &auth_token)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("review-stats"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let mut authorization = HeaderValue::from_str(&format!("Bearer {auth_token}"))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let throttle = Throttle::new(config.throttle_hourly, config.throttle_burst).map(Arc::new);
        if let Some(throttle) = &throttle {
            debug!(interval = ?throttle.interval(), "request throttle enabled");
        }

        Ok(Self {
            http,
            api_endpoint: config.api_endpoint.trim_end_matches('/').to_string(),
            graphql_endpoint: config.graphql_endpoint,
            comment_source: config.comment_source,
            throttle,
        })
    }

    pub async fn search_pull_requests(
        &self,
        query: &str,
        after: Option<&str>,
    ) -> Result<SearchPage, ApiError> {
        ensure_not_blank("search query", query)?;

        let request = schema::GraphQlRequest {
            query: SEARCH_QUERY,
            variables: schema::SearchVariables {
                query,
                search_cursor: after,
            },
        };
        let data: schema::SearchData = self.post_graphql(&request).await?;

        let rate_limit = data.rate_limit.unwrap_or_else(|| {
            debug!("search response carried no rateLimit, counting the page as free");
            schema::RateLimit {
                cost: 0,
                remaining: 0,
            }
        });
        let pull_requests = data
            .search
            .nodes
            .into_iter()
            .flatten()
            .filter_map(|node| {
                let number = node.number?;
                Some(PullRequest {
                    number,
                    author: schema::login_or_ghost(node.author),
                })
            })
            .collect();

        Ok(SearchPage {
            pull_requests,
            has_next_page: data.search.page_info.has_next_page,
            end_cursor: data.search.page_info.end_cursor,
            cost: rate_limit.cost,
            remaining: rate_limit.remaining,
        })
    }

    pub async fn fetch_reviews(
        &self,
        repository: &Repository,
        number: i64,
    ) -> Result<Vec<Review>, ApiError> {
        ensure_valid_number(number)?;

        let reviews: Vec<schema::PullRequestReview> = self
            .get_paginated(&format!(
                "{}/repos/{repository}/pulls/{number}/reviews?per_page={PER_PAGE}&page=1",
                self.api_endpoint
            ))
            .await?;

        Ok(reviews
            .into_iter()
            .map(|review| Review {
                author: schema::login_or_ghost(review.user),
                state: review.state,
            })
            .collect())
    }

    pub async fn fetch_comments(
        &self,
        repository: &Repository,
        number: i64,
    ) -> Result<Vec<Comment>, ApiError> {
        ensure_valid_number(number)?;

        let mut comments: Vec<schema::PullRequestComment> = Vec::new();
        if matches!(self.comment_source, CommentSource::Review | CommentSource::Both) {
            comments.extend(
                self.get_paginated::<schema::PullRequestComment>(&format!(
                    "{}/repos/{repository}/pulls/{number}/comments?per_page={PER_PAGE}&page=1",
                    self.api_endpoint
                ))
                .await?,
            );
        }
        if matches!(self.comment_source, CommentSource::Issue | CommentSource::Both) {
            comments.extend(
                self.get_paginated::<schema::PullRequestComment>(&format!(
                    "{}/repos/{repository}/issues/{number}/comments?per_page={PER_PAGE}&page=1",
                    self.api_endpoint
                ))
                .await?,
            );
        }

        Ok(comments
            .into_iter()
            .map(|comment| Comment {
                author: schema::login_or_ghost(comment.user),
                body: comment.body.unwrap_or_default(),
            })
            .collect())
    }

    async fn post_graphql<V, T>(
        &self,
        request: &schema::GraphQlRequest<'_, V>,
    ) -> Result<T, ApiError>
    where
        V: serde::Serialize,
        T: DeserializeOwned,
    {
        self.wait_for_throttle().await;
        debug!("[github] POST {}", self.graphql_endpoint);
        let response = self
            .http
            .post(&self.graphql_endpoint)
            .json(request)
            .send()
            .await?;
        let body = read_success_body(response).await?;

        let envelope: schema::GraphQlResponse<T> =
            serde_json::from_str(&body).map_err(|source| ApiError::Decode {
                url: self.graphql_endpoint.clone(),
                source,
            })?;

        if !envelope.errors.is_empty() {
            return Err(ApiError::GraphQl {
                messages: envelope.errors.into_iter().map(|e| e.message).collect(),
            });
        }

        envelope.data.ok_or_else(|| ApiError::GraphQl {
            messages: vec!["response contained no data".to_string()],
        })
    }

    async fn get_paginated<T>(&self, first_url: &str) -> Result<Vec<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let mut next_url = Some(first_url.to_string());
        let mut items = Vec::new();

        while let Some(url) = next_url {
            let (page_items, link_header): (Vec<T>, Option<String>) =
                self.get_json_with_link(&url).await?;
            items.extend(page_items);
            next_url = link_header.and_then(|link| parse_next_url(&link));
        }

        Ok(items)
    }

    async fn get_json_with_link<T>(&self, url: &str) -> Result<(T, Option<String>), ApiError>
    where
        T: DeserializeOwned,
    {
        self.wait_for_throttle().await;
        debug!("[github] GET {url}");
        let response = self.http.get(url).send().await?;
        let link_header = response
            .headers()
            .get("Link")
            .and_then(|h| h.to_str().ok())
            .map(|v| v.to_string());

        let body = read_success_body(response).await?;
        let value = serde_json::from_str::<T>(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })?;
        Ok((value, link_header))
    }

    async fn wait_for_throttle(&self) {
        if let Some(throttle) = &self.throttle {
            throttle.acquire().await;
        }
    }
}

#[async_trait]
impl ReviewSource for GitHubClient {
    async fn search(&self, query: &str, after: Option<&str>) -> Result<SearchPage, ApiError> {
        self.search_pull_requests(query, after).await
    }

    async fn list_reviews(
        &self,
        repository: &Repository,
        number: i64,
    ) -> Result<Vec<Review>, ApiError> {
        self.fetch_reviews(repository, number).await
    }

    async fn list_comments(
        &self,
        repository: &Repository,
        number: i64,
    ) -> Result<Vec<Comment>, ApiError> {
        self.fetch_comments(repository, number).await
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: body.trim().to_string(),
        });
    }

    Ok(response.text().await?)
}

fn ensure_not_blank(label: impl Display, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidArgument(format!("{label} is required")));
    }
    Ok(())
}

fn ensure_valid_number(number: i64) -> Result<(), ApiError> {
    if number <= 0 {
        return Err(ApiError::InvalidArgument(
            "pr number must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

pub fn parse_next_url(link_header: &str) -> Option<String> {
    link_header
        .split(',')
        .map(str::trim)
        .find(|segment| segment.contains("rel=\"next\""))
        .and_then(|segment| {
            let start = segment.find('<')?;
            let end = segment.find('>')?;
            if end <= start + 1 {
                return None;
            }
            Some(segment[start + 1..end].to_string())
        })
}
