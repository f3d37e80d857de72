use serde::{Deserialize, Serialize};

/// One page of a list result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: u64, page: u32, page_size: Option<u32>) -> Self {
        Self {
            items,
            total_count,
            page,
            page_size,
        }
    }

    /// Whether a later page exists. Always false when the page size is unknown.
    pub fn has_next_page(&self) -> bool {
        match self.page_size {
            Some(size) if size > 0 => u64::from(self.page) * u64::from(size) < self.total_count,
            _ => false,
        }
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_navigation() {
        let page = PagedResult::new(vec![1, 2], 5, 1, Some(2));
        assert!(page.has_next_page());
        assert!(!page.has_previous_page());

        let last = PagedResult::new(vec![5], 5, 3, Some(2));
        assert!(!last.has_next_page());
        assert!(last.has_previous_page());
    }

    #[test]
    fn test_unknown_page_size_has_no_next() {
        let page = PagedResult::new(vec![1], 50, 1, None);
        assert!(!page.has_next_page());
    }

    #[test]
    fn test_json_shape() {
        let page = PagedResult::new(vec!["a"], 1, 1, None);
        let text = serde_json::to_string(&page).unwrap();
        assert_eq!(text, r#"{"items":["a"],"totalCount":1,"page":1}"#);
    }
}
