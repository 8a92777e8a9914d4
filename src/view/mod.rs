use serde::Serialize;

use crate::gateway::models::{DateRange, SortKey, Transcript};

/// Fixed history page size. "Has more" is inferred from it.
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient, dismissible message shown after a user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

/// How the transcript list is currently populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Idle,
    Listing,
    Searching,
}

/// In-memory state behind the history view.
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub transcripts: Vec<Transcript>,
    pub page: usize,
    pub search_query: String,
    pub sort_key: SortKey,
    pub date_range: Option<DateRange>,
    pub has_more: bool,
    pub loading: bool,
    pub mode: ViewMode,
    pub notification: Option<Notification>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            transcripts: Vec::new(),
            page: 0,
            search_query: String::new(),
            sort_key: SortKey::default(),
            date_range: None,
            has_more: true,
            loading: false,
            mode: ViewMode::Idle,
            notification: None,
        }
    }
}

impl ViewState {
    /// Replace the list with a first page and infer `has_more` from its length.
    pub fn replace_page(&mut self, page: Vec<Transcript>) {
        self.has_more = page.len() == PAGE_SIZE;
        self.transcripts = page;
    }

    /// Append a follow-up page. A short or empty page ends pagination.
    pub fn append_page(&mut self, page: Vec<Transcript>) {
        self.has_more = page.len() == PAGE_SIZE;
        self.transcripts.extend(page);
    }

    /// Replace the list with an unpaginated result (search, date filter).
    pub fn replace_all(&mut self, results: Vec<Transcript>) {
        self.transcripts = results;
        self.has_more = false;
    }

    /// Drop the item with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.transcripts.len();
        self.transcripts.retain(|t| t.id != id);
        self.transcripts.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::error(message));
    }

    pub fn notify_success(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::success(message));
    }

    pub fn dismiss(&mut self) -> Option<Notification> {
        self.notification.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::transcript;

    fn page(n: usize, offset: usize) -> Vec<Transcript> {
        (0..n)
            .map(|i| transcript(&format!("id{}", i + offset), "t"))
            .collect()
    }

    #[test]
    fn defaults_allow_first_load() {
        let v = ViewState::default();
        assert!(v.has_more);
        assert_eq!(v.mode, ViewMode::Idle);
        assert_eq!(v.sort_key, SortKey::DateNewest);
        assert!(v.is_empty());
    }

    #[test]
    fn has_more_follows_page_length() {
        let mut v = ViewState::default();
        v.replace_page(page(PAGE_SIZE, 0));
        assert!(v.has_more);
        v.append_page(page(3, PAGE_SIZE));
        assert!(!v.has_more);
        assert_eq!(v.transcripts.len(), PAGE_SIZE + 3);
    }

    #[test]
    fn empty_follow_up_page_stops_pagination() {
        let mut v = ViewState::default();
        v.replace_page(page(PAGE_SIZE, 0));
        v.append_page(Vec::new());
        assert!(!v.has_more);
        assert_eq!(v.transcripts.len(), PAGE_SIZE);
    }

    #[test]
    fn remove_matches_exact_id_only() {
        let mut v = ViewState::default();
        v.replace_all(page(3, 0));
        assert!(v.remove("id1"));
        assert!(!v.remove("id1"));
        let ids: Vec<&str> = v.transcripts.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["id0", "id2"]);
    }

    #[test]
    fn notifications_are_dismissible() {
        let mut v = ViewState::default();
        v.notify_error("Failed to delete transcript");
        let n = v.dismiss().unwrap();
        assert!(n.is_error());
        assert!(v.notification.is_none());
    }
}
