use serde::Deserialize;

use crate::api::pagination::{default_index, default_page_size};
use crate::db::types::DifficultyLevel;

#[derive(Debug, Deserialize)]
pub(super) struct ListExamsQuery {
    #[serde(default = "default_index")]
    pub(super) index: i64,
    #[serde(default = "default_page_size", alias = "pageSize")]
    pub(super) page_size: i64,
    #[serde(default)]
    pub(super) difficulty: Option<DifficultyLevel>,
    #[serde(default)]
    pub(super) group: Option<String>,
}
