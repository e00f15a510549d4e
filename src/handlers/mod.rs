//! HTTP surface. Handlers stay thin: extract, call the service, wrap the
//! result in the standard envelope.

use std::collections::HashMap;

use serde::Deserialize;

pub mod assets;
pub mod categories;
pub mod departments;
pub mod employees;
pub mod health;
pub mod imports;
pub mod locations;
pub mod reports;
pub mod suppliers;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Standalone pagination query for endpoints without filter parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl PaginationQuery {
    pub fn clamped(&self) -> (u64, u64) {
        (self.page.max(1), self.per_page.clamp(1, MAX_PAGE_SIZE))
    }
}

/// Pulls page/per_page out of a raw query map. The remaining entries are
/// filter parameters; the filter engine ignores the pagination keys by
/// name anyway.
pub fn pagination_from_map(params: &HashMap<String, String>) -> (u64, u64) {
    let page = params
        .get("page")
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);
    let per_page = params
        .get("per_page")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, per_page)
}
