use serde::{Deserialize, Serialize};

pub(crate) const fn default_index() -> i64 {
    1
}

pub(crate) const fn default_page_size() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageQuery {
    #[serde(default = "default_index")]
    pub(crate) index: i64,
    #[serde(default = "default_page_size", alias = "pageSize")]
    pub(crate) page_size: i64,
}

impl PageQuery {
    /// 1-based page index to row offset.
    pub(crate) fn offset(&self) -> i64 {
        (self.index.max(1) - 1) * self.limit()
    }

    pub(crate) fn limit(&self) -> i64 {
        self.page_size.clamp(1, 1000)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PageResponse<T> {
    pub(crate) data: Vec<T>,
    pub(crate) total: i64,
    pub(crate) index: i64,
    #[serde(rename = "pageSize")]
    pub(crate) page_size: i64,
}
