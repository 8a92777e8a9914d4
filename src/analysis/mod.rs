use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::gateway::models::{validate_submission, AnalysisResult, ValidationError};
use crate::gateway::{GatewayError, TranscriptGateway};
use crate::orchestrator::QueryOrchestrator;
use crate::view::Notification;

const ANALYZE_FAILED: &str = "Failed to analyze transcript";
const LOAD_FAILED: &str = "Failed to load transcript";

/// Application-wide state for the current analysis, owned by the caller's
/// root scope and passed to the flows that need it.
#[derive(Debug, Default)]
pub struct AppContext {
    pub analysis_result: Option<AnalysisResult>,
    /// Raw text the current result was produced from. Used by pdf/csv export.
    pub current_content: String,
    pub current_transcript_id: Option<String>,
    pub loading: bool,
    pub notification: Option<Notification>,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dismiss(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    fn fail(&mut self, err: &GatewayError, fallback: &str) -> bool {
        error!("{}: {}", fallback, err);
        self.notification = Some(Notification::error(err.user_message(fallback)));
        false
    }

    fn reject(&mut self, err: ValidationError) -> bool {
        debug!("Rejected before dispatch: {}", err);
        self.notification = Some(Notification::error(err.to_string()));
        false
    }
}

/// Create-then-analyze submission, plus the standalone variant.
pub struct AnalysisFlow<G: TranscriptGateway + ?Sized = dyn TranscriptGateway> {
    gateway: Arc<G>,
}

impl<G: TranscriptGateway + ?Sized> AnalysisFlow<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Persist the transcript, then analyze it by its new id.
    ///
    /// A failure in either phase leaves the previously displayed result in
    /// place. When `history` is showing, it is refreshed from page 0 so the
    /// new transcript appears as analyzed.
    pub async fn submit(
        &self,
        ctx: &mut AppContext,
        title: &str,
        content: &str,
        history: Option<&mut QueryOrchestrator<G>>,
    ) -> bool {
        if let Err(e) = validate_submission(title, content) {
            return ctx.reject(e);
        }

        ctx.loading = true;
        let outcome = self.create_and_analyze(title, content).await;
        ctx.loading = false;

        let (id, result) = match outcome {
            Ok(pair) => pair,
            Err(e) => return ctx.fail(&e, ANALYZE_FAILED),
        };

        info!(
            "Analyzed transcript {} ({} key points, {} action items)",
            id,
            result.key_points.len(),
            result.action_items.len()
        );
        ctx.analysis_result = Some(result);
        ctx.current_content = content.to_string();
        ctx.current_transcript_id = Some(id);
        ctx.notification = Some(Notification::success("Transcript analyzed successfully"));

        if let Some(history) = history {
            if history.is_active() {
                history.refresh().await;
            }
        }
        true
    }

    async fn create_and_analyze(
        &self,
        title: &str,
        content: &str,
    ) -> Result<(String, AnalysisResult), GatewayError> {
        let transcript = self.gateway.create(title, content).await?;
        debug!("Created transcript {}", transcript.id);
        let result = self.gateway.analyze_by_id(&transcript.id).await?;
        Ok((transcript.id, result))
    }

    /// Analyze text without saving a transcript.
    pub async fn analyze_standalone(&self, ctx: &mut AppContext, content: &str) -> bool {
        if content.trim().is_empty() {
            return ctx.reject(ValidationError::EmptyContent);
        }

        ctx.loading = true;
        let outcome = self.gateway.analyze_standalone(content).await;
        ctx.loading = false;

        match outcome {
            Ok(result) => {
                ctx.analysis_result = Some(result);
                ctx.current_content = content.to_string();
                ctx.current_transcript_id = None;
                ctx.notification = Some(Notification::success("Transcript analyzed successfully"));
                true
            }
            Err(e) => ctx.fail(&e, ANALYZE_FAILED),
        }
    }

    /// Store the current result on an existing transcript.
    pub async fn attach(&self, ctx: &mut AppContext, id: &str) -> bool {
        let Some(result) = ctx.analysis_result.clone() else {
            ctx.notification = Some(Notification::error("No analysis to save"));
            return false;
        };

        match self.gateway.save_analysis(id, &result).await {
            Ok(t) => {
                debug!("Saved analysis on {}", t.id);
                ctx.current_transcript_id = Some(t.id);
                ctx.notification = Some(Notification::success("Analysis saved"));
                true
            }
            Err(e) => ctx.fail(&e, "Failed to save analysis"),
        }
    }

    /// Load an already analyzed transcript as the current result.
    pub async fn open(&self, ctx: &mut AppContext, id: &str) -> bool {
        ctx.loading = true;
        let outcome = self.gateway.get(id).await;
        ctx.loading = false;

        let transcript = match outcome {
            Ok(t) => t,
            Err(e) => return ctx.fail(&e, LOAD_FAILED),
        };

        match AnalysisResult::from_transcript(&transcript) {
            Some(result) => {
                ctx.analysis_result = Some(result);
                ctx.current_content = transcript.content;
                ctx.current_transcript_id = Some(transcript.id);
                true
            }
            None => {
                ctx.notification = Some(Notification::error(format!(
                    "Transcript {} has not been analyzed yet",
                    transcript.id
                )));
                false
            }
        }
    }
}

/// Read transcript text from a file, or stdin when no path is given.
pub fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read transcript file: {}", p.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read transcript from stdin")?;
            Ok(buf)
        }
    }
}

/// Title used when none is given: the file name without extension.
pub fn default_title(path: Option<&Path>) -> Option<String> {
    path.and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
