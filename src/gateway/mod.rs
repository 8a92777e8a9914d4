pub mod http;
pub mod models;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use thiserror::Error;

use models::*;

pub use http::HttpGateway;

/// Failure of a single gateway round trip. Nothing is retried.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Unexpected response from {path}: {reason}")]
    Decode { path: String, reason: String },
}

impl GatewayError {
    /// The human-readable message the server attached, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            GatewayError::Http { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }

    /// Server message when available, else the caller's per-action fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// One method per backend capability. Each call is exactly one request.
#[async_trait]
pub trait TranscriptGateway: Send + Sync {
    async fn create(&self, title: &str, content: &str) -> GatewayResult<Transcript>;

    /// Analyze raw content without persisting anything.
    async fn analyze_standalone(&self, content: &str) -> GatewayResult<AnalysisResult>;

    /// Analyze a stored transcript; the server saves the result on it.
    async fn analyze_by_id(&self, id: &str) -> GatewayResult<AnalysisResult>;

    async fn list(&self, skip: usize, limit: usize) -> GatewayResult<Vec<Transcript>>;

    async fn get(&self, id: &str) -> GatewayResult<Transcript>;

    async fn update(&self, id: &str, update: &TranscriptUpdate) -> GatewayResult<Transcript>;

    async fn save_analysis(&self, id: &str, analysis: &AnalysisResult) -> GatewayResult<Transcript>;

    async fn delete(&self, id: &str) -> GatewayResult<()>;

    async fn search(&self, query: &str) -> GatewayResult<Vec<Transcript>>;

    async fn filter_by_date_range(&self, range: &DateRange) -> GatewayResult<Vec<Transcript>>;

    async fn sort(&self, key: SortKey, skip: usize, limit: usize) -> GatewayResult<Vec<Transcript>>;

    async fn export_pdf(&self, content: &str) -> GatewayResult<Vec<u8>>;

    async fn export_csv(&self, content: &str) -> GatewayResult<Vec<u8>>;

    /// Push a transcript to the external notes tool (Notion).
    async fn export_to_external_tool(&self, id: &str) -> GatewayResult<ExportMessage>;

    async fn update_action_item(
        &self,
        transcript_id: &str,
        item_id: &str,
        update: &ActionItemUpdate,
    ) -> GatewayResult<ActionItem>;

    async fn delete_action_item(&self, transcript_id: &str, item_id: &str) -> GatewayResult<()>;
}
