use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

use crate::api::InventoryApi;
use crate::errors::ServiceError;
use crate::models::IssueRecord;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page of issues. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T: Clone> Page<T> {
    /// Slices `rows` for `page`; a page past the end is empty but keeps the totals.
    pub fn slice(rows: &[T], page: usize, page_size: usize) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total_items = rows.len();
        let total_pages = (total_items + page_size - 1) / page_size;

        let start = (page - 1).saturating_mul(page_size);
        let items = rows
            .iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();

        Self {
            items,
            page,
            page_size,
            total_items,
            total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Existing issues, paginated on this side.
#[derive(Clone)]
pub struct IssueLedger {
    api: Arc<dyn InventoryApi>,
    page_size: usize,
}

impl IssueLedger {
    pub fn new(api: Arc<dyn InventoryApi>, page_size: usize) -> Self {
        Self {
            api,
            page_size: if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size },
        }
    }

    #[instrument(skip(self))]
    pub async fn page(&self, page: usize) -> Result<Page<IssueRecord>, ServiceError> {
        let issues = self.api.issues().await?;
        Ok(Page::slice(&issues, page, self.page_size))
    }
}
