//! Paginated folder listing.

use pan123_protocol::RemoteEntry;
use pan123_protocol::constants::{
    FILE_LIST_PAGE_LIMIT, RATE_LIMIT_INTERVAL, RATE_LIMIT_PAGES, TIMEOUT_DEFAULT,
    TIMEOUT_FILE_LIST, URL_FILE_LIST,
};
use pan123_protocol::messages::{ListPage, ListQuery};
use serde::Serialize;
use tracing::{debug, info};

use crate::client::Client;
use crate::error::ApiError;

/// Every entry of one folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Listing {
    pub items: Vec<RemoteEntry>,
    /// Entry count reported by the server.
    pub total: u64,
}

impl Client {
    /// Fetches one page (1-based) of `parent_id`'s children.
    pub async fn list_page(
        &self,
        parent_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<ListPage, ApiError> {
        let query = ListQuery::folder(parent_id, page, limit);
        let env = self
            .get_json(URL_FILE_LIST, query.to_pairs(), TIMEOUT_FILE_LIST)
            .await?;
        Ok(env.parse_data()?)
    }

    /// Fetches every child of `parent_id`, page by page.
    ///
    /// Stops once the accumulated count reaches the reported total or a page
    /// comes back empty. After every [`RATE_LIMIT_PAGES`] pages, and only
    /// when another page follows, waits [`RATE_LIMIT_INTERVAL`]. The first
    /// failing page fails the whole listing.
    pub async fn list_all(&self, parent_id: i64) -> Result<Listing, ApiError> {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let batch = self
                .list_page(parent_id, page, FILE_LIST_PAGE_LIMIT)
                .await?;
            let received = batch.items.len();
            let total = batch.total;
            items.extend(batch.items);
            debug!(parent = parent_id, page, received, total, "listing page");

            if received == 0 || items.len() as u64 >= total {
                return Ok(Listing { items, total });
            }

            if page % RATE_LIMIT_PAGES == 0 {
                info!(
                    parent = parent_id,
                    pages = page,
                    pause_secs = RATE_LIMIT_INTERVAL.as_secs(),
                    "pausing listing"
                );
                tokio::time::sleep(RATE_LIMIT_INTERVAL).await;
            }
            page += 1;
        }
    }

    /// First page of the recycle bin.
    pub async fn list_recycle(&self) -> Result<Vec<RemoteEntry>, ApiError> {
        let query = ListQuery::recycle_bin(FILE_LIST_PAGE_LIMIT);
        let env = self
            .get_json(URL_FILE_LIST, query.to_pairs(), TIMEOUT_DEFAULT)
            .await?;
        let page: ListPage = env.parse_data()?;
        Ok(page.items)
    }
}
