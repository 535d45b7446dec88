use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{Comment, Repository, Review, SearchPage};

/// Read-only view of the hosting service that the stats pipeline pulls from.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Runs one page of an issue search. `after` is the cursor returned by the previous page.
    async fn search(&self, query: &str, after: Option<&str>) -> Result<SearchPage, ApiError>;

    async fn list_reviews(
        &self,
        repository: &Repository,
        number: i64,
    ) -> Result<Vec<Review>, ApiError>;

    async fn list_comments(
        &self,
        repository: &Repository,
        number: i64,
    ) -> Result<Vec<Comment>, ApiError>;
}
