//! Keyset pagination support: the opaque continuation token and the cached
//! approximate totals that back "page X of Y" hints.
//!
//! Rows are ordered by `(created_at DESC, id DESC)`. The composite key is
//! mandatory: `created_at` alone is not unique, and paginating on a
//! non-unique key can skip or repeat rows at page boundaries. All
//! continuation state round-trips through the [`cursor::Cursor`] token;
//! nothing here holds per-caller state.

pub mod count_cache;
pub mod cursor;

pub use count_cache::CountCache;
pub use cursor::Cursor;

use serde::{Deserialize, Serialize};

/// Default page size for admin listings.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Pagination block returned alongside a page of rows.
///
/// `total` and `total_pages` come from the count cache and are advisory
/// display hints only; whether another page exists is decided solely by
/// `next_cursor` / `has_more`, which derive from the page-size+1 probe row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub next_cursor: Option<String>,
    pub prev_cursor: Option<String>,
    pub current_cursor: Option<String>,
    pub current_page: u64,
    pub has_more: bool,
    pub total: u64,
    pub total_pages: u64,
}

/// Ceiling division used for the advisory page count.
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}
