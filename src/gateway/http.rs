use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use urlencoding::encode;

use super::models::*;
use super::{GatewayError, GatewayResult, TranscriptGateway};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// `TranscriptGateway` over the analysis API's REST endpoints.
pub struct HttpGateway {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: Option<String>, token: Option<String>) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            base_url,
            token: token.filter(|t| !t.is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let req = self.client.request(method, url);
        match self.token {
            Some(ref token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, path: &str, req: RequestBuilder) -> GatewayResult<reqwest::Response> {
        debug!("-> {}", path);
        let resp = req.send().await.map_err(|source| {
            warn!("Request to {} failed: {}", path, source);
            GatewayError::Transport {
                path: path.to_string(),
                source,
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = error_message(status, &text);
            warn!("API returned {} for {}: {}", status, path, message);
            return Err(GatewayError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp)
    }

    async fn bytes(&self, path: &str, req: RequestBuilder) -> GatewayResult<Vec<u8>> {
        let resp = self.send(path, req).await?;
        let body = resp
            .bytes()
            .await
            .map_err(|source| GatewayError::Transport {
                path: path.to_string(),
                source,
            })?;
        Ok(body.to_vec())
    }

    async fn json<T: DeserializeOwned>(&self, path: &str, req: RequestBuilder) -> GatewayResult<T> {
        let body = self.bytes(path, req).await?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!("Failed to decode response from {}: {}", path, e);
            GatewayError::Decode {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

/// Pull the server's `detail` out of an error body.
///
/// FastAPI-style errors carry either a string or a list of `{msg}` objects.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        match json.get("detail") {
            Some(serde_json::Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(serde_json::Value::Array(items)) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|i| i.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if !msgs.is_empty() {
                    return msgs.join("; ");
                }
            }
            _ => {}
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

#[async_trait]
impl TranscriptGateway for HttpGateway {
    async fn create(&self, title: &str, content: &str) -> GatewayResult<Transcript> {
        let path = "/transcripts";
        let body = serde_json::json!({ "title": title, "content": content });
        self.json(path, self.request(Method::POST, path).json(&body))
            .await
    }

    async fn analyze_standalone(&self, content: &str) -> GatewayResult<AnalysisResult> {
        let path = "/transcripts/analyze";
        let body = serde_json::json!({ "content": content });
        self.json(path, self.request(Method::POST, path).json(&body))
            .await
    }

    async fn analyze_by_id(&self, id: &str) -> GatewayResult<AnalysisResult> {
        let path = format!("/transcripts/{}/analyze", encode(id));
        self.json(&path, self.request(Method::POST, &path)).await
    }

    async fn list(&self, skip: usize, limit: usize) -> GatewayResult<Vec<Transcript>> {
        let path = "/transcripts";
        let req = self
            .request(Method::GET, path)
            .query(&[("skip", skip), ("limit", limit)]);
        self.json(path, req).await
    }

    async fn get(&self, id: &str) -> GatewayResult<Transcript> {
        let path = format!("/transcripts/{}", encode(id));
        self.json(&path, self.request(Method::GET, &path)).await
    }

    async fn update(&self, id: &str, update: &TranscriptUpdate) -> GatewayResult<Transcript> {
        let path = format!("/transcripts/{}", encode(id));
        self.json(&path, self.request(Method::PUT, &path).json(update))
            .await
    }

    async fn save_analysis(&self, id: &str, analysis: &AnalysisResult) -> GatewayResult<Transcript> {
        let path = format!("/transcripts/{}/analysis", encode(id));
        let body = serde_json::json!({
            "summary": analysis.summary,
            "keyPoints": analysis.key_points,
            "actionItems": analysis.action_items,
        });
        self.json(&path, self.request(Method::PUT, &path).json(&body))
            .await
    }

    async fn delete(&self, id: &str) -> GatewayResult<()> {
        let path = format!("/transcripts/{}", encode(id));
        self.send(&path, self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn search(&self, query: &str) -> GatewayResult<Vec<Transcript>> {
        let path = "/transcripts/search";
        let req = self.request(Method::GET, path).query(&[("q", query)]);
        self.json(path, req).await
    }

    async fn filter_by_date_range(&self, range: &DateRange) -> GatewayResult<Vec<Transcript>> {
        let path = "/transcripts/filter/date-range";
        let req = self.request(Method::GET, path).query(&[
            ("from_date", range.from.as_str()),
            ("to_date", range.to.as_str()),
        ]);
        self.json(path, req).await
    }

    async fn sort(&self, key: SortKey, skip: usize, limit: usize) -> GatewayResult<Vec<Transcript>> {
        let path = "/transcripts/sort";
        let skip = skip.to_string();
        let limit = limit.to_string();
        let req = self.request(Method::GET, path).query(&[
            ("sort_by", key.as_str()),
            ("skip", skip.as_str()),
            ("limit", limit.as_str()),
        ]);
        self.json(path, req).await
    }

    async fn export_pdf(&self, content: &str) -> GatewayResult<Vec<u8>> {
        let path = "/transcripts/export/pdf";
        let body = serde_json::json!({ "content": content });
        self.bytes(path, self.request(Method::POST, path).json(&body))
            .await
    }

    async fn export_csv(&self, content: &str) -> GatewayResult<Vec<u8>> {
        let path = "/transcripts/export/csv";
        let body = serde_json::json!({ "content": content });
        self.bytes(path, self.request(Method::POST, path).json(&body))
            .await
    }

    async fn export_to_external_tool(&self, id: &str) -> GatewayResult<ExportMessage> {
        let path = format!("/transcripts/{}/export/notion", encode(id));
        self.json(&path, self.request(Method::POST, &path)).await
    }

    async fn update_action_item(
        &self,
        transcript_id: &str,
        item_id: &str,
        update: &ActionItemUpdate,
    ) -> GatewayResult<ActionItem> {
        let path = format!("/transcripts/{}/action-items/{}", encode(transcript_id), encode(item_id));
        self.json(&path, self.request(Method::PUT, &path).json(update))
            .await
    }

    async fn delete_action_item(&self, transcript_id: &str, item_id: &str) -> GatewayResult<()> {
        let path = format!("/transcripts/{}/action-items/{}", encode(transcript_id), encode(item_id));
        self.send(&path, self.request(Method::DELETE, &path)).await?;
        Ok(())
    }
}
