//! In-memory gateway for unit tests. Records every call and serves pages
//! out of a local vector.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use super::models::*;
use super::{GatewayError, GatewayResult, TranscriptGateway};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { title: String, content: String },
    AnalyzeStandalone,
    AnalyzeById(String),
    List { skip: usize, limit: usize },
    Get(String),
    Update(String),
    SaveAnalysis(String),
    Delete(String),
    Search(String),
    Filter(DateRange),
    Sort { key: SortKey, skip: usize, limit: usize },
    ExportPdf,
    ExportCsv,
    ExportExternal(String),
    UpdateActionItem(String, String),
    DeleteActionItem(String, String),
}

impl Call {
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Call::List { .. } | Call::Search(_) | Call::Filter(_) | Call::Sort { .. }
        )
    }
}

pub fn transcript(id: &str, title: &str) -> Transcript {
    Transcript {
        id: id.to_string(),
        title: title.to_string(),
        content: format!("{title}: notes"),
        created_at: "2024-05-01T10:00:00".to_string(),
        updated_at: None,
        summary: None,
        key_points: None,
        action_items: None,
    }
}

pub fn analysis(summary: &str) -> AnalysisResult {
    AnalysisResult {
        summary: summary.to_string(),
        key_points: vec!["K1".to_string()],
        action_items: vec![],
        duration: None,
        participant_count: None,
    }
}

pub struct FakeGateway {
    pub store: Mutex<Vec<Transcript>>,
    pub search_results: Mutex<Vec<Transcript>>,
    pub filter_results: Mutex<Vec<Transcript>>,
    pub analysis: Mutex<AnalysisResult>,
    pub create_id: String,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Vec::new()),
            search_results: Mutex::new(Vec::new()),
            filter_results: Mutex::new(Vec::new()),
            analysis: Mutex::new(analysis("S")),
            create_id: "T1".to_string(),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `count` stored transcripts titled t00, t01, ... in creation order.
    pub fn with_transcripts(count: usize) -> Self {
        let gw = Self::new();
        {
            let mut store = gw.store.lock().unwrap();
            for i in 0..count {
                store.push(transcript(&format!("id{i:02}"), &format!("t{i:02}")));
            }
        }
        gw
    }

    /// Make every call to `op` fail with a server message.
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, op: &'static str, call: Call) -> GatewayResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(op) {
            return Err(GatewayError::Http {
                status: 500,
                message: format!("{op} exploded"),
            });
        }
        Ok(())
    }

    fn page(&self, key: Option<SortKey>, skip: usize, limit: usize) -> Vec<Transcript> {
        let mut all = self.store.lock().unwrap().clone();
        match key {
            Some(SortKey::DateOldest) | None => {}
            Some(SortKey::DateNewest) => all.reverse(),
            Some(SortKey::TitleAsc) => all.sort_by(|a, b| a.title.cmp(&b.title)),
            Some(SortKey::TitleDesc) => all.sort_by(|a, b| b.title.cmp(&a.title)),
        }
        all.into_iter().skip(skip).take(limit).collect()
    }
}

#[async_trait]
impl TranscriptGateway for FakeGateway {
    async fn create(&self, title: &str, content: &str) -> GatewayResult<Transcript> {
        self.record(
            "create",
            Call::Create {
                title: title.to_string(),
                content: content.to_string(),
            },
        )?;
        let mut t = transcript(&self.create_id, title);
        t.content = content.to_string();
        self.store.lock().unwrap().push(t.clone());
        Ok(t)
    }

    async fn analyze_standalone(&self, _content: &str) -> GatewayResult<AnalysisResult> {
        self.record("analyze_standalone", Call::AnalyzeStandalone)?;
        Ok(self.analysis.lock().unwrap().clone())
    }

    async fn analyze_by_id(&self, id: &str) -> GatewayResult<AnalysisResult> {
        self.record("analyze_by_id", Call::AnalyzeById(id.to_string()))?;
        let result = self.analysis.lock().unwrap().clone();
        for t in self.store.lock().unwrap().iter_mut() {
            if t.id == id {
                t.summary = Some(result.summary.clone());
                t.key_points = Some(result.key_points.clone());
            }
        }
        Ok(result)
    }

    async fn list(&self, skip: usize, limit: usize) -> GatewayResult<Vec<Transcript>> {
        self.record("list", Call::List { skip, limit })?;
        Ok(self.page(None, skip, limit))
    }

    async fn get(&self, id: &str) -> GatewayResult<Transcript> {
        self.record("get", Call::Get(id.to_string()))?;
        self.store
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::Http {
                status: 404,
                message: format!("Transcript {id} not found"),
            })
    }

    async fn update(&self, id: &str, update: &TranscriptUpdate) -> GatewayResult<Transcript> {
        self.record("update", Call::Update(id.to_string()))?;
        let mut store = self.store.lock().unwrap();
        let t = store
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| GatewayError::Http {
                status: 404,
                message: "Transcript not found".to_string(),
            })?;
        if let Some(ref title) = update.title {
            t.title = title.clone();
        }
        Ok(t.clone())
    }

    async fn save_analysis(&self, id: &str, analysis: &AnalysisResult) -> GatewayResult<Transcript> {
        self.record("save_analysis", Call::SaveAnalysis(id.to_string()))?;
        let mut t = transcript(id, "saved");
        t.summary = Some(analysis.summary.clone());
        Ok(t)
    }

    async fn delete(&self, id: &str) -> GatewayResult<()> {
        self.record("delete", Call::Delete(id.to_string()))?;
        self.store.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }

    async fn search(&self, query: &str) -> GatewayResult<Vec<Transcript>> {
        self.record("search", Call::Search(query.to_string()))?;
        Ok(self.search_results.lock().unwrap().clone())
    }

    async fn filter_by_date_range(&self, range: &DateRange) -> GatewayResult<Vec<Transcript>> {
        self.record("filter", Call::Filter(range.clone()))?;
        Ok(self.filter_results.lock().unwrap().clone())
    }

    async fn sort(&self, key: SortKey, skip: usize, limit: usize) -> GatewayResult<Vec<Transcript>> {
        self.record("sort", Call::Sort { key, skip, limit })?;
        Ok(self.page(Some(key), skip, limit))
    }

    async fn export_pdf(&self, _content: &str) -> GatewayResult<Vec<u8>> {
        self.record("export_pdf", Call::ExportPdf)?;
        Ok(b"%PDF-1.4 fake".to_vec())
    }

    async fn export_csv(&self, _content: &str) -> GatewayResult<Vec<u8>> {
        self.record("export_csv", Call::ExportCsv)?;
        Ok(b"summary\nS\n".to_vec())
    }

    async fn export_to_external_tool(&self, id: &str) -> GatewayResult<ExportMessage> {
        self.record("export_external", Call::ExportExternal(id.to_string()))?;
        Ok(ExportMessage {
            message: format!("Exported {id} to Notion"),
        })
    }

    async fn update_action_item(
        &self,
        transcript_id: &str,
        item_id: &str,
        update: &ActionItemUpdate,
    ) -> GatewayResult<ActionItem> {
        self.record(
            "update_action_item",
            Call::UpdateActionItem(transcript_id.to_string(), item_id.to_string()),
        )?;
        Ok(ActionItem {
            id: item_id.to_string(),
            description: update.description.clone().unwrap_or_else(|| "task".into()),
            owner: update.owner.clone(),
            deadline: update.deadline.clone(),
            priority: update.priority.unwrap_or(Priority::Medium),
            status: update.status.unwrap_or(ItemStatus::Pending),
            created_at: "2024-05-01T10:00:00".to_string(),
        })
    }

    async fn delete_action_item(&self, transcript_id: &str, item_id: &str) -> GatewayResult<()> {
        self.record(
            "delete_action_item",
            Call::DeleteActionItem(transcript_id.to_string(), item_id.to_string()),
        )
    }
}
