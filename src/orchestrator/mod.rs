use std::sync::Arc;
use tracing::{debug, error, info};

use crate::gateway::models::{DateRange, SortKey};
use crate::gateway::{GatewayError, TranscriptGateway};
use crate::view::{ViewMode, ViewState, PAGE_SIZE};

const LOAD_FAILED: &str = "Failed to load transcripts";
const SEARCH_FAILED: &str = "Failed to search transcripts";
const FILTER_FAILED: &str = "Failed to filter transcripts";
const DELETE_FAILED: &str = "Failed to delete transcript";

/// Keeps the history list consistent with the remote store.
///
/// Listing mode pages through `sort` results; Searching mode shows one
/// unpaginated `search` result. The two never combine. A date filter is a
/// one-shot replacement of the listing.
///
/// Failures never escape: they are logged and turned into a notification on
/// the view, and the previous list is left as it was.
pub struct QueryOrchestrator<G: TranscriptGateway + ?Sized = dyn TranscriptGateway> {
    gateway: Arc<G>,
    pub view: ViewState,
}

impl<G: TranscriptGateway + ?Sized> QueryOrchestrator<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            view: ViewState::default(),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.view.mode
    }

    pub fn is_active(&self) -> bool {
        self.view.mode != ViewMode::Idle
    }

    /// Open the history view and populate it for the current query.
    pub async fn enter_history(&mut self) -> bool {
        info!("Entering history view");
        self.refresh().await
    }

    pub fn leave_history(&mut self) {
        debug!("Leaving history view");
        self.view.mode = ViewMode::Idle;
    }

    /// Re-populate from page 0 using whatever view mode the query implies.
    pub async fn refresh(&mut self) -> bool {
        if !self.view.search_query.is_empty() {
            let query = self.view.search_query.clone();
            return self.run_search(&query).await;
        }
        if let Some(range) = self.view.date_range.clone() {
            return self.run_filter(&range).await;
        }
        self.load_first_page(self.view.sort_key).await
    }

    /// Update the search text. Non-empty switches to Searching mode, empty
    /// goes back to the sorted first page.
    pub async fn set_search(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            debug!("Search cleared, back to listing");
            return self.load_first_page(self.view.sort_key).await;
        }
        self.run_search(query).await
    }

    /// Change the ordering. While searching the key is only remembered.
    pub async fn set_sort(&mut self, key: SortKey) -> bool {
        if self.view.mode == ViewMode::Searching {
            debug!("Sort changed to {} while searching, deferred", key.as_str());
            self.view.sort_key = key;
            return true;
        }
        self.load_first_page(key).await
    }

    /// Fetch and append the next sorted page. Returns false without a request
    /// when not listing, when filtered, or when the last page was short.
    pub async fn load_more(&mut self) -> bool {
        if self.view.mode != ViewMode::Listing
            || self.view.date_range.is_some()
            || !self.view.has_more
        {
            debug!("Load more ignored (mode={:?}, has_more={})", self.view.mode, self.view.has_more);
            return false;
        }

        let next = self.view.page + 1;
        self.view.loading = true;
        let result = self
            .gateway
            .sort(self.view.sort_key, next * PAGE_SIZE, PAGE_SIZE)
            .await;
        self.view.loading = false;

        match result {
            Ok(page) => {
                debug!("Loaded page {} ({} items)", next, page.len());
                self.view.page = next;
                self.view.append_page(page);
                true
            }
            Err(e) => self.fail(&e, LOAD_FAILED),
        }
    }

    /// Replace the listing with transcripts created inside `range`.
    pub async fn apply_date_filter(&mut self, range: DateRange) -> bool {
        self.run_filter(&range).await
    }

    pub async fn clear_date_filter(&mut self) -> bool {
        self.load_first_page(self.view.sort_key).await
    }

    /// Delete on the server, then drop the item locally. No re-fetch.
    pub async fn delete(&mut self, id: &str) -> bool {
        match self.gateway.delete(id).await {
            Ok(()) => {
                self.view.remove(id);
                self.view.notify_success("Transcript deleted");
                true
            }
            Err(e) => self.fail(&e, DELETE_FAILED),
        }
    }

    // The fetchers below commit the query they ran only once it succeeds, so a
    // failure leaves query and list describing the same view.

    async fn load_first_page(&mut self, key: SortKey) -> bool {
        self.view.loading = true;
        let result = self.gateway.sort(key, 0, PAGE_SIZE).await;
        self.view.loading = false;

        match result {
            Ok(page) => {
                debug!("Loaded first page sorted by {} ({} items)", key.as_str(), page.len());
                self.view.mode = ViewMode::Listing;
                self.view.sort_key = key;
                self.view.search_query.clear();
                self.view.date_range = None;
                self.view.page = 0;
                self.view.replace_page(page);
                true
            }
            Err(e) => self.fail(&e, LOAD_FAILED),
        }
    }

    async fn run_search(&mut self, query: &str) -> bool {
        self.view.loading = true;
        let result = self.gateway.search(query).await;
        self.view.loading = false;

        match result {
            Ok(results) => {
                debug!("Search \"{}\" matched {} transcripts", query, results.len());
                self.view.mode = ViewMode::Searching;
                self.view.search_query = query.to_string();
                self.view.date_range = None;
                self.view.page = 0;
                self.view.replace_all(results);
                true
            }
            Err(e) => self.fail(&e, SEARCH_FAILED),
        }
    }

    async fn run_filter(&mut self, range: &DateRange) -> bool {
        self.view.loading = true;
        let result = self.gateway.filter_by_date_range(range).await;
        self.view.loading = false;

        match result {
            Ok(results) => {
                debug!("Date filter {}..{} matched {} transcripts", range.from, range.to, results.len());
                self.view.mode = ViewMode::Listing;
                self.view.search_query.clear();
                self.view.date_range = Some(range.clone());
                self.view.page = 0;
                self.view.replace_all(results);
                true
            }
            Err(e) => self.fail(&e, FILTER_FAILED),
        }
    }

    fn fail(&mut self, err: &GatewayError, fallback: &str) -> bool {
        error!("{}: {}", fallback, err);
        self.view.notify_error(err.user_message(fallback));
        false
    }
}
