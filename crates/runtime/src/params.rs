//! Query parameters of list endpoints.

use serde::Deserialize;

/// Page size when `pagesize` is absent or unparsable
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound for `pagesize`
pub const MAX_PAGE_SIZE: i64 = 100;

/// `?pagesize=&page=&filter=`
///
/// Values are kept as text so that a malformed number falls back to its
/// default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub pagesize: Option<String>,
    pub page: Option<String>,
    pub filter: Option<String>,
}

fn parse(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse::<i64>().ok())
}

impl ListParams {
    /// `LIMIT`, clamped to `[1, MAX_PAGE_SIZE]`
    pub fn limit(&self) -> i64 {
        parse(self.pagesize.as_deref())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Zero-based page; negative values clamp to 0
    pub fn page(&self) -> i64 {
        parse(self.page.as_deref()).unwrap_or(0).max(0)
    }

    /// `OFFSET`
    pub fn offset(&self) -> i64 {
        self.page().saturating_mul(self.limit())
    }

    /// `%filter%` for `ILIKE`; `%%` matches every row
    pub fn filter_pattern(&self) -> String {
        format!("%{}%", self.filter.as_deref().unwrap_or_default())
    }
}
