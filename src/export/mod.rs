use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::analysis::AppContext;
use crate::gateway::models::{AnalysisResult, ExportMessage};
use crate::gateway::{GatewayError, TranscriptGateway};
use crate::view::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Pdf,
    Csv,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "pdf" => Some(ExportFormat::Pdf),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn filename(&self) -> &'static str {
        match self {
            ExportFormat::Json => "meeting_analysis.json",
            ExportFormat::Pdf => "meeting_analysis.pdf",
            ExportFormat::Csv => "meeting_analysis.csv",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Csv => "text/csv",
        }
    }
}

/// A finished export, ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: &'static str,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No analysis to export. Analyze a transcript first.")]
    NoAnalysis,
    #[error("No transcript content to export")]
    NoContent,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Failed to serialize analysis: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    fn user_message(&self, format: ExportFormat) -> String {
        match self {
            ExportError::Gateway(e) => {
                e.user_message(&format!("Failed to export {}", format.as_str().to_uppercase()))
            }
            other => other.to_string(),
        }
    }
}

/// Canonical, 2-space indented JSON document for an analysis.
pub fn analysis_json(analysis: &AnalysisResult) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(analysis)
}

/// Write `artifact` into `dir` and release the file handle.
pub fn save_artifact(artifact: &ExportArtifact, dir: &Path) -> Result<PathBuf, ExportError> {
    let path = dir.join(artifact.filename);
    std::fs::write(&path, &artifact.bytes).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    info!("Saved {} ({} bytes)", path.display(), artifact.bytes.len());
    Ok(path)
}

/// Maps an export request to a backend render or a local serialization.
pub struct ExportDispatcher<G: TranscriptGateway + ?Sized = dyn TranscriptGateway> {
    gateway: Arc<G>,
}

impl<G: TranscriptGateway + ?Sized> ExportDispatcher<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Build the artifact. json never touches the network; pdf and csv are
    /// rendered by the backend from the raw content.
    pub async fn render(
        &self,
        format: ExportFormat,
        analysis: Option<&AnalysisResult>,
        content: &str,
    ) -> Result<ExportArtifact, ExportError> {
        let bytes = match format {
            ExportFormat::Json => analysis_json(analysis.ok_or(ExportError::NoAnalysis)?)?,
            ExportFormat::Pdf | ExportFormat::Csv if content.trim().is_empty() => {
                return Err(ExportError::NoContent)
            }
            ExportFormat::Pdf => self.gateway.export_pdf(content).await?,
            ExportFormat::Csv => self.gateway.export_csv(content).await?,
        };
        Ok(ExportArtifact {
            filename: format.filename(),
            media_type: format.media_type(),
            bytes,
        })
    }

    /// Export the context's current analysis into `dir`.
    ///
    /// Failures become an error notification and leave no file behind.
    pub async fn export(
        &self,
        ctx: &mut AppContext,
        format: ExportFormat,
        dir: &Path,
    ) -> Option<PathBuf> {
        let saved = self
            .render(format, ctx.analysis_result.as_ref(), &ctx.current_content)
            .await
            .and_then(|artifact| save_artifact(&artifact, dir));

        match saved {
            Ok(path) => {
                ctx.notification = Some(Notification::success(format!(
                    "Exported {}",
                    format.filename()
                )));
                Some(path)
            }
            Err(e) => {
                error!("Export {} failed: {}", format.as_str(), e);
                ctx.notification = Some(Notification::error(e.user_message(format)));
                None
            }
        }
    }

    /// Push a stored transcript to the external notes tool.
    pub async fn export_to_external_tool(
        &self,
        ctx: &mut AppContext,
        id: &str,
    ) -> Option<ExportMessage> {
        match self.gateway.export_to_external_tool(id).await {
            Ok(reply) => {
                ctx.notification = Some(Notification::success(reply.message.clone()));
                Some(reply)
            }
            Err(e) => {
                error!("Notion export of {} failed: {}", id, e);
                ctx.notification =
                    Some(Notification::error(e.user_message("Failed to export to Notion")));
                None
            }
        }
    }
}
