use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;

/// Raw `?page=&limit=&search=` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

impl PageQuery {
    /// Clamp against the configured limits. Blank search terms are dropped.
    pub fn normalize(&self, api: &ApiConfig) -> PageRequest {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(api.default_page_limit)
            .clamp(1, api.max_page_limit.max(1));
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        PageRequest { page, limit, search }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page: page.max(1), limit: limit.max(1), search: None }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `%term%` pattern with LIKE wildcards escaped
    pub fn like_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|term| {
            let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
            format!("%{}%", escaped)
        })
    }

    /// Case-insensitive substring match used by the in-memory store
    pub fn matches(&self, fields: &[&str]) -> bool {
        match &self.search {
            None => true,
            Some(term) => {
                let needle = term.to_lowercase();
                fields.iter().any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: &PageRequest) -> Self {
        Self { items, total, page: request.page, limit: request.limit }
    }

    /// Slice an already filtered and ordered collection
    pub fn from_sorted(all: Vec<T>, request: &PageRequest) -> Self {
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit as usize)
            .collect();
        Self::new(items, total, request)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn defaults_and_clamps() {
        let api = AppConfig::development().api;

        let req = PageQuery::default().normalize(&api);
        assert_eq!(req, PageRequest { page: 1, limit: api.default_page_limit, search: None });

        let req = PageQuery { page: Some(-4), limit: Some(0), search: Some("   ".into()) }.normalize(&api);
        assert_eq!((req.page, req.limit, req.search), (1, 1, None));

        let req = PageQuery { page: Some(3), limit: Some(1_000_000), search: Some(" jak ".into()) }.normalize(&api);
        assert_eq!(req.limit, api.max_page_limit);
        assert_eq!(req.search.as_deref(), Some("jak"));
        assert_eq!(req.offset(), 2 * api.max_page_limit);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        let req = PageRequest::new(1, 10).with_search("50%_off");
        assert_eq!(req.like_pattern().as_deref(), Some("%50\\%\\_off%"));
    }

    #[test]
    fn from_sorted_slices_requested_page() {
        let page = Page::from_sorted((1..=25).collect::<Vec<_>>(), &PageRequest::new(3, 10));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
    }

    #[test]
    fn matches_is_case_insensitive() {
        let req = PageRequest::new(1, 10).with_search("SIGNAL");
        assert!(req.matches(&["No signal", ""]));
        assert!(!req.matches(&["Billing"]));
        assert!(PageRequest::new(1, 10).matches(&[]));
    }
}
