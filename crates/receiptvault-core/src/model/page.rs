//! Pagination and receipt search filters

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::payment_mode::PaymentMode;
use super::receipt::{ReceiptDetail, ReceiptStatus};

pub const DEFAULT_RECEIPT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_BATCH_PAGE_SIZE: u32 = 20;

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Clamp page and size to at least 1
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.page_size as usize
    }

    pub fn limit(&self) -> usize {
        self.page_size as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        let size = u64::from(request.page_size.max(1));
        let total_pages = total_count.div_ceil(size) as u32;
        Self {
            items,
            total_count,
            page: request.page,
            page_size: request.page_size,
            total_pages,
            has_next: request.page < total_pages,
            has_previous: request.page > 1,
        }
    }

    /// Slice an already-filtered, already-ordered list
    pub fn from_all(all: Vec<T>, request: PageRequest) -> Self {
        let total_count = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset())
            .take(request.limit())
            .collect();
        Self::new(items, total_count, request)
    }
}

/// Receipt search criteria; every supplied criterion must match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptFilter {
    /// Case-insensitive substring of the receipt number or student name
    pub query: Option<String>,
    /// Case-insensitive substring of the student name
    pub student_name: Option<String>,
    /// Case-insensitive substring of the class name
    pub class_name: Option<String>,
    pub payment_mode: Option<PaymentMode>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<ReceiptStatus>,
}

impl ReceiptFilter {
    /// Receipts without a current version only match filters that do not
    /// look at version fields.
    pub fn matches(&self, detail: &ReceiptDetail) -> bool {
        if let Some(status) = self.status {
            if detail.receipt.status != status {
                return false;
            }
        }

        let version = detail.current_version.as_ref();

        if let Some(query) = non_blank(&self.query) {
            let in_number = contains_ci(&detail.receipt.receipt_number, query);
            let in_name = version
                .map(|v| contains_ci(&v.fields.student_name, query))
                .unwrap_or(false);
            if !in_number && !in_name {
                return false;
            }
        }

        let needs_version = non_blank(&self.student_name).is_some()
            || non_blank(&self.class_name).is_some()
            || self.payment_mode.is_some()
            || self.date_from.is_some()
            || self.date_to.is_some();
        if !needs_version {
            return true;
        }
        let Some(version) = version else {
            return false;
        };

        if let Some(student_name) = non_blank(&self.student_name) {
            if !contains_ci(&version.fields.student_name, student_name) {
                return false;
            }
        }
        if let Some(class_name) = non_blank(&self.class_name) {
            if !contains_ci(&version.fields.class_name, class_name) {
                return false;
            }
        }
        if let Some(mode) = self.payment_mode {
            if version.fields.payment_mode != mode {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if version.fields.date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if version.fields.date > to {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_math() {
        let page = Page::new(vec![1, 2], 102, PageRequest::new(3, 50));
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn test_from_all_slices() {
        let page = Page::from_all((1..=5).collect::<Vec<_>>(), PageRequest::new(2, 2));
        assert_eq!(page.items, vec![3, 4]);
        assert!(page.has_next);
        assert_eq!(page.total_count, 5);
    }

    #[test]
    fn test_empty_page() {
        let page: Page<u8> = Page::from_all(Vec::new(), PageRequest::new(0, 0));
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }
}
