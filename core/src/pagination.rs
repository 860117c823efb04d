// core/src/pagination.rs

use serde::Serialize;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// A normalized page request: `page >= 1` and `1 <= limit <= MAX_PAGE_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  page: i64,
  limit: i64,
}

impl PageRequest {
  /// Missing or out-of-range values fall back to page 1 / the default limit;
  /// oversized limits are capped.
  pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
    let page = page.filter(|p| *p >= 1).unwrap_or(1);
    let limit = match limit {
      Some(l) if l >= 1 => l.min(MAX_PAGE_LIMIT),
      _ => DEFAULT_PAGE_LIMIT,
    };
    Self { page, limit }
  }

  pub fn page(&self) -> i64 {
    self.page
  }

  pub fn limit(&self) -> i64 {
    self.limit
  }

  pub fn offset(&self) -> i64 {
    (self.page - 1).saturating_mul(self.limit)
  }
}

impl Default for PageRequest {
  fn default() -> Self {
    Self::new(None, None)
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub total: i64,
  pub page: i64,
  pub limit: i64,
  pub total_pages: i64,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
    let total_pages = if total <= 0 {
      0
    } else {
      (total + request.limit() - 1) / request.limit()
    };
    Self {
      items,
      total,
      page: request.page(),
      limit: request.limit(),
      total_pages,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn offset_is_page_minus_one_times_limit() {
    let req = PageRequest::new(Some(2), Some(10));
    assert_eq!(req.offset(), 10);
    assert_eq!(PageRequest::new(Some(1), Some(10)).offset(), 0);
  }

  #[test]
  fn invalid_values_fall_back_to_defaults() {
    let req = PageRequest::new(Some(0), Some(-5));
    assert_eq!(req.page(), 1);
    assert_eq!(req.limit(), DEFAULT_PAGE_LIMIT);
    assert_eq!(PageRequest::new(None, Some(1_000)).limit(), MAX_PAGE_LIMIT);
  }

  #[test]
  fn total_pages_rounds_up() {
    let page: Page<u8> = Page::new(vec![], 21, PageRequest::new(Some(1), Some(10)));
    assert_eq!(page.total_pages, 3);
    let empty: Page<u8> = Page::new(vec![], 0, PageRequest::default());
    assert_eq!(empty.total_pages, 0);
  }
}
