//! Page arithmetic for root-comment listings.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A validated page request: `page >= 1`, `1 <= limit <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page:  u32,
  pub limit: u32,
}

impl PageRequest {
  /// Build a request from optional query parameters.
  ///
  /// A missing `page` means the first page; a missing `limit` falls back to
  /// `default_limit`. Out-of-range values are validation errors rather than
  /// being silently clamped.
  pub fn new(
    page: Option<u32>,
    limit: Option<u32>,
    default_limit: u32,
    max_limit: u32,
  ) -> Result<Self> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(default_limit);
    if page < 1 {
      return Err(Error::validation("page must be at least 1"));
    }
    if !(1..=max_limit).contains(&limit) {
      return Err(Error::validation(format!(
        "limit must be between 1 and {max_limit}"
      )));
    }
    Ok(Self { page, limit })
  }

  pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }

  /// Fill in the totals once the matching row count is known.
  pub fn info(&self, total: u64) -> PageInfo {
    let total_pages = total.div_ceil(u64::from(self.limit));
    PageInfo {
      page: self.page,
      limit: self.limit,
      total_root_comments: total,
      total_pages,
      has_next_page: u64::from(self.page) < total_pages,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
  pub page:                u32,
  pub limit:               u32,
  pub total_root_comments: u64,
  pub total_pages:         u64,
  pub has_next_page:       bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply() {
    let req = PageRequest::new(None, None, 10, 50).unwrap();
    assert_eq!(req, PageRequest { page: 1, limit: 10 });
    assert_eq!(req.offset(), 0);
  }

  #[test]
  fn out_of_range_is_rejected() {
    assert!(PageRequest::new(Some(0), None, 10, 50).is_err());
    assert!(PageRequest::new(None, Some(0), 10, 50).is_err());
    assert!(PageRequest::new(None, Some(51), 10, 50).is_err());
    assert!(PageRequest::new(None, Some(50), 10, 50).is_ok());
  }

  #[test]
  fn twenty_five_rows_in_pages_of_ten() {
    let first = PageRequest::new(Some(1), Some(10), 10, 50).unwrap();
    let info = first.info(25);
    assert_eq!(info.total_pages, 3);
    assert!(info.has_next_page);

    let last = PageRequest::new(Some(3), Some(10), 10, 50).unwrap();
    assert_eq!(last.offset(), 20);
    assert!(!last.info(25).has_next_page);
  }

  #[test]
  fn empty_listing_has_zero_pages() {
    let info = PageRequest::new(None, None, 10, 50).unwrap().info(0);
    assert_eq!(info.total_pages, 0);
    assert!(!info.has_next_page);
  }
}
