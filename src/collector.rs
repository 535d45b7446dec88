use tracing::debug;

use crate::error::{ApiError, StatsError};
use crate::models::{PullRequest, Repository, TimeWindow};
use crate::source::ReviewSource;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedPullRequests {
    pub pull_requests: Vec<PullRequest>,
    pub total_cost: i64,
    pub remaining: i64,
    pub pages: usize,
}

pub fn search_query(repository: &Repository, window: &TimeWindow) -> String {
    format!("is:pr repo:{repository} {}", window.updated_qualifier())
}

/// Walks every page of the pull request search for `repository` in `window`.
///
/// Cost is summed across pages; `remaining` is whatever the last page reported. Any page
/// failure aborts the walk, since a missing page would silently drop pull requests.
pub async fn collect_pull_requests<S>(
    source: &S,
    repository: &Repository,
    window: &TimeWindow,
) -> Result<CollectedPullRequests, StatsError>
where
    S: ReviewSource + ?Sized,
{
    let query = search_query(repository, window);
    let mut collected = CollectedPullRequests::default();
    let mut cursor: Option<String> = None;

    loop {
        let page_number = collected.pages + 1;
        debug!(page = page_number, cursor = cursor.as_deref(), "fetching search page");
        let page = source
            .search(&query, cursor.as_deref())
            .await
            .map_err(|err| StatsError::transport(format!("search page {page_number}"), err))?;

        collected.pages = page_number;
        collected.total_cost += page.cost;
        collected.remaining = page.remaining;
        collected.pull_requests.extend(page.pull_requests);

        if !page.has_next_page {
            break;
        }

        match page.end_cursor {
            Some(end_cursor) => cursor = Some(end_cursor),
            None => {
                return Err(StatsError::transport(
                    format!("search page {page_number}"),
                    ApiError::InvalidArgument(
                        "page reports more results but no end cursor".to_string(),
                    ),
                ))
            }
        }
    }

    Ok(collected)
}
