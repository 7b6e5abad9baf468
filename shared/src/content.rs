//! State of one paginated content source (announcements or calendar events).
//!
//! The browser side owns the HTTP call; this module owns what happens to the
//! source's data when a fetch starts, succeeds or fails.

use crate::ListResponse;

/// Query sent to a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub grade_level: Option<i32>,
}

impl ListQuery {
    /// First page with a page size large enough to hold all current content.
    /// Feed composition needs the whole candidate set to sort correctly.
    pub fn all(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            search: None,
            category_id: None,
            grade_level: None,
        }
    }

    /// Query-string pairs. `cache_bust` adds a `_ts` parameter so refreshes
    /// bypass any HTTP cache.
    pub fn params(&self, cache_bust: Option<i64>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("search", search.trim().to_string()));
        }
        if let Some(category_id) = self.category_id {
            params.push(("category_id", category_id.to_string()));
        }
        if let Some(grade_level) = self.grade_level {
            params.push(("grade_level", grade_level.to_string()));
        }
        if let Some(ts) = cache_bust {
            params.push(("_ts", ts.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone)]
pub struct SourceState<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub error: Option<String>,
    pub loading: bool,
    in_flight: u32,
    last_query: Option<ListQuery>,
}

impl<T> Default for SourceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            error: None,
            loading: false,
            in_flight: 0,
            last_query: None,
        }
    }
}

impl<T> SourceState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a fetch as started. Existing items stay visible meanwhile.
    pub fn begin(&mut self, query: ListQuery) {
        self.in_flight += 1;
        self.loading = true;
        self.last_query = Some(query);
    }

    /// Apply a fetch result. Success replaces the whole list; failure sets the
    /// error flag and keeps whatever was loaded before. The source stays
    /// loading until every started fetch has resolved.
    pub fn resolve(&mut self, result: Result<ListResponse<T>, String>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.loading = self.in_flight > 0;
        match result {
            Ok(response) => {
                self.total = response.total.max(response.items.len() as u64);
                self.items = response.items;
                self.error = None;
            }
            Err(e) => {
                log::warn!("Content fetch failed: {}", e);
                self.error = Some(e);
            }
        }
    }

    /// Query to re-issue on refresh.
    pub fn last_query(&self) -> Option<&ListQuery> {
        self.last_query.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(items: Vec<i64>) -> ListResponse<i64> {
        let total = items.len() as u64;
        ListResponse { items, total }
    }

    #[test]
    fn test_query_params() {
        let mut query = ListQuery::all(500);
        query.search = Some("  bake sale ".to_string());
        query.category_id = Some(3);

        let params = query.params(Some(42));

        assert_eq!(
            params,
            vec![
                ("page", "1".to_string()),
                ("limit", "500".to_string()),
                ("search", "bake sale".to_string()),
                ("category_id", "3".to_string()),
                ("_ts", "42".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_search_is_omitted() {
        let mut query = ListQuery::all(10);
        query.search = Some("   ".to_string());
        assert!(query.params(None).iter().all(|(k, _)| *k != "search"));
    }

    #[test]
    fn test_success_replaces_items() {
        let mut state = SourceState::new();
        state.begin(ListQuery::all(10));
        assert!(state.loading);

        state.resolve(Ok(response(vec![1, 2, 3])));
        state.begin(ListQuery::all(10));
        state.resolve(Ok(response(vec![4])));

        assert!(!state.loading);
        assert_eq!(state.items, vec![4]);
        assert_eq!(state.total, 1);
    }

    #[test]
    fn test_overlapping_fetches_stay_loading_until_last_resolves() {
        let mut state = SourceState::new();
        state.begin(ListQuery::all(10));
        state.begin(ListQuery::all(10));

        state.resolve(Ok(response(vec![1])));
        assert!(state.loading);
        assert_eq!(state.items, vec![1]);

        state.resolve(Err("Network error".to_string()));
        assert!(!state.loading);

        // A stray extra result never underflows
        state.resolve(Ok(response(vec![2])));
        assert!(!state.loading);
    }

    #[test]
    fn test_failure_keeps_loaded_items() {
        let mut state = SourceState::new();
        state.begin(ListQuery::all(10));
        state.resolve(Ok(response(vec![1, 2])));

        state.begin(ListQuery::all(10));
        state.resolve(Err("Network error".to_string()));

        assert!(state.has_error());
        assert_eq!(state.items, vec![1, 2]);

        state.begin(ListQuery::all(10));
        state.resolve(Ok(response(vec![3])));
        assert!(!state.has_error());
    }

    #[test]
    fn test_last_query_is_remembered_for_refresh() {
        let mut state: SourceState<i64> = SourceState::new();
        assert!(state.last_query().is_none());

        let mut query = ListQuery::all(500);
        query.grade_level = Some(11);
        state.begin(query.clone());

        assert_eq!(state.last_query(), Some(&query));
    }
}
