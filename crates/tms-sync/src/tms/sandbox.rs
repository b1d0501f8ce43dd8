use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use super::{DocumentUpload, TmsClient, UploadReceipt};
use crate::error::TmsError;
use crate::status::{SourceStatus, TargetStatus};

/// Which remote operation a recorded call was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Upload,
    UpdateDocument,
    GetSourceStatus,
    RequestTarget,
    GetTargetStatus,
    Download,
    CancelDocument,
    CancelTarget,
    DeleteDocument,
    SetJobId,
    ListLocales,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TmsCall {
    pub kind: CallKind,
    pub document_id: Option<String>,
    pub locale: Option<String>,
}

#[derive(Debug, Clone)]
struct SandboxDocument {
    content: String,
    job_id: Option<String>,
    source_status: SourceStatus,
    targets: HashMap<String, TargetStatus>,
}

impl SandboxDocument {
    fn placeholder() -> Self {
        Self {
            content: String::new(),
            job_id: None,
            source_status: SourceStatus::Current,
            targets: HashMap::new(),
        }
    }
}

#[derive(Debug)]
struct SandboxState {
    next_id: u64,
    documents: HashMap<String, SandboxDocument>,
    calls: Vec<TmsCall>,
    next_failures: HashMap<CallKind, VecDeque<TmsError>>,
    document_failures: HashMap<String, TmsError>,
    title_failures: HashMap<String, TmsError>,
    locales: Vec<String>,
    upload_importing: bool,
}

/// In-memory TMS for offline runs and tests.
///
/// Documents are numbered `doc-1`, `doc-2`, ... in upload order. Every call
/// is recorded, and failures can be scripted per call kind, per document
/// or per uploaded title.
#[derive(Debug)]
pub struct SandboxTms {
    state: Mutex<SandboxState>,
}

impl Default for SandboxTms {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxTms {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SandboxState {
                next_id: 1,
                documents: HashMap::new(),
                calls: Vec::new(),
                next_failures: HashMap::new(),
                document_failures: HashMap::new(),
                title_failures: HashMap::new(),
                locales: Vec::new(),
                upload_importing: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SandboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_locales(&self, locales: &[&str]) {
        self.state().locales = locales.iter().map(|l| l.to_string()).collect();
    }

    /// When set, uploads report the document as still importing.
    pub fn set_upload_importing(&self, importing: bool) {
        self.state().upload_importing = importing;
    }

    pub fn set_source_status(&self, document_id: &str, status: SourceStatus) {
        self.state()
            .documents
            .entry(document_id.to_string())
            .or_insert_with(SandboxDocument::placeholder)
            .source_status = status;
    }

    pub fn set_target_status(&self, document_id: &str, locale: &str, status: TargetStatus) {
        self.state()
            .documents
            .entry(document_id.to_string())
            .or_insert_with(SandboxDocument::placeholder)
            .targets
            .insert(locale.to_string(), status);
    }

    /// Fails the next call of `kind` with `error`.
    pub fn fail_next(&self, kind: CallKind, error: TmsError) {
        self.state()
            .next_failures
            .entry(kind)
            .or_default()
            .push_back(error);
    }

    /// Fails every call touching `document_id` until cleared.
    pub fn fail_document(&self, document_id: &str, error: TmsError) {
        self.state()
            .document_failures
            .insert(document_id.to_string(), error);
    }

    /// Fails every upload of a document with this title until cleared.
    pub fn fail_title(&self, title: &str, error: TmsError) {
        self.state()
            .title_failures
            .insert(title.to_string(), error);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.next_failures.clear();
        state.document_failures.clear();
        state.title_failures.clear();
    }

    pub fn calls(&self) -> Vec<TmsCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn calls_of(&self, kind: CallKind) -> usize {
        self.state().calls.iter().filter(|c| c.kind == kind).count()
    }

    pub fn document_exists(&self, document_id: &str) -> bool {
        self.state().documents.contains_key(document_id)
    }

    pub fn document_content(&self, document_id: &str) -> Option<String> {
        self.state()
            .documents
            .get(document_id)
            .map(|d| d.content.clone())
    }

    pub fn document_job_id(&self, document_id: &str) -> Option<String> {
        self.state()
            .documents
            .get(document_id)
            .and_then(|d| d.job_id.clone())
    }

    /// Records the call and returns the scripted failure for it, if any.
    fn begin(
        state: &mut SandboxState,
        kind: CallKind,
        document_id: Option<&str>,
        locale: Option<&str>,
        title: Option<&str>,
    ) -> Result<(), TmsError> {
        state.calls.push(TmsCall {
            kind,
            document_id: document_id.map(str::to_string),
            locale: locale.map(str::to_string),
        });

        if let Some(err) = state.next_failures.get_mut(&kind).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        if let Some(err) = document_id.and_then(|d| state.document_failures.get(d)) {
            return Err(err.clone());
        }
        if let Some(err) = title.and_then(|t| state.title_failures.get(t)) {
            return Err(err.clone());
        }
        Ok(())
    }

    fn document<'s>(
        state: &'s mut SandboxState,
        document_id: &str,
    ) -> Result<&'s mut SandboxDocument, TmsError> {
        state
            .documents
            .get_mut(document_id)
            .ok_or_else(|| TmsError::Api(format!("Document '{}' not found", document_id)))
    }

    fn initial_status(state: &SandboxState) -> SourceStatus {
        if state.upload_importing {
            SourceStatus::Importing
        } else {
            SourceStatus::Current
        }
    }
}

impl TmsClient for SandboxTms {
    fn upload(&self, doc: &DocumentUpload<'_>) -> Result<UploadReceipt, TmsError> {
        let mut state = self.state();
        Self::begin(&mut state, CallKind::Upload, None, Some(doc.locale), Some(doc.title))?;

        let document_id = format!("doc-{}", state.next_id);
        state.next_id += 1;
        let source_status = Self::initial_status(&state);
        state.documents.insert(
            document_id.clone(),
            SandboxDocument {
                content: doc.content.to_string(),
                job_id: doc.job_id.map(str::to_string),
                source_status,
                targets: HashMap::new(),
            },
        );

        Ok(UploadReceipt {
            document_id,
            importing: source_status == SourceStatus::Importing,
        })
    }

    fn update_document(
        &self,
        document_id: &str,
        doc: &DocumentUpload<'_>,
    ) -> Result<UploadReceipt, TmsError> {
        let mut state = self.state();
        Self::begin(
            &mut state,
            CallKind::UpdateDocument,
            Some(document_id),
            Some(doc.locale),
            Some(doc.title),
        )?;

        let source_status = Self::initial_status(&state);
        let document = Self::document(&mut state, document_id)?;
        document.content = doc.content.to_string();
        if doc.job_id.is_some() {
            document.job_id = doc.job_id.map(str::to_string);
        }
        document.source_status = source_status;
        for status in document.targets.values_mut() {
            if *status == TargetStatus::Current {
                *status = TargetStatus::Pending;
            }
        }

        Ok(UploadReceipt {
            document_id: document_id.to_string(),
            importing: source_status == SourceStatus::Importing,
        })
    }

    fn get_source_status(&self, document_id: &str) -> Result<SourceStatus, TmsError> {
        let mut state = self.state();
        Self::begin(&mut state, CallKind::GetSourceStatus, Some(document_id), None, None)?;
        Ok(Self::document(&mut state, document_id)?.source_status)
    }

    fn request_target(&self, document_id: &str, locale: &str) -> Result<bool, TmsError> {
        let mut state = self.state();
        Self::begin(
            &mut state,
            CallKind::RequestTarget,
            Some(document_id),
            Some(locale),
            None,
        )?;
        Self::document(&mut state, document_id)?
            .targets
            .insert(locale.to_string(), TargetStatus::Pending);
        Ok(true)
    }

    fn get_target_status(
        &self,
        document_id: &str,
        locale: &str,
    ) -> Result<TargetStatus, TmsError> {
        let mut state = self.state();
        Self::begin(
            &mut state,
            CallKind::GetTargetStatus,
            Some(document_id),
            Some(locale),
            None,
        )?;
        Ok(Self::document(&mut state, document_id)?
            .targets
            .get(locale)
            .copied()
            .unwrap_or(TargetStatus::Request))
    }

    fn download(&self, document_id: &str, locale: &str) -> Result<String, TmsError> {
        let mut state = self.state();
        Self::begin(&mut state, CallKind::Download, Some(document_id), Some(locale), None)?;
        let document = Self::document(&mut state, document_id)?;
        Ok(format!("[{}] {}", locale, document.content))
    }

    fn cancel_document(&self, document_id: &str) -> Result<(), TmsError> {
        let mut state = self.state();
        Self::begin(&mut state, CallKind::CancelDocument, Some(document_id), None, None)?;
        let document = Self::document(&mut state, document_id)?;
        document.source_status = SourceStatus::Cancelled;
        for status in document.targets.values_mut() {
            *status = TargetStatus::Cancelled;
        }
        Ok(())
    }

    fn cancel_target(&self, document_id: &str, locale: &str) -> Result<(), TmsError> {
        let mut state = self.state();
        Self::begin(
            &mut state,
            CallKind::CancelTarget,
            Some(document_id),
            Some(locale),
            None,
        )?;
        Self::document(&mut state, document_id)?
            .targets
            .insert(locale.to_string(), TargetStatus::Cancelled);
        Ok(())
    }

    fn delete_document(&self, document_id: &str) -> Result<(), TmsError> {
        let mut state = self.state();
        Self::begin(&mut state, CallKind::DeleteDocument, Some(document_id), None, None)?;
        state
            .documents
            .remove(document_id)
            .map(|_| ())
            .ok_or_else(|| TmsError::Api(format!("Document '{}' not found", document_id)))
    }

    fn set_job_id(&self, document_id: &str, job_id: Option<&str>) -> Result<(), TmsError> {
        let mut state = self.state();
        Self::begin(&mut state, CallKind::SetJobId, Some(document_id), None, None)?;
        Self::document(&mut state, document_id)?.job_id = job_id.map(str::to_string);
        Ok(())
    }

    fn list_locales(&self) -> Result<Vec<String>, TmsError> {
        let mut state = self.state();
        Self::begin(&mut state, CallKind::ListLocales, None, None, None)?;
        Ok(state.locales.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc<'a>(title: &'a str) -> DocumentUpload<'a> {
        DocumentUpload {
            title,
            content: "Hello",
            locale: "en_US",
            job_id: None,
        }
    }

    #[test]
    fn test_documents_numbered_in_upload_order() {
        let tms = SandboxTms::new();
        assert_eq!(tms.upload(&doc("a")).unwrap().document_id, "doc-1");
        assert_eq!(tms.upload(&doc("b")).unwrap().document_id, "doc-2");
        assert_eq!(tms.calls_of(CallKind::Upload), 2);
    }

    #[test]
    fn test_target_lifecycle() {
        let tms = SandboxTms::new();
        let id = tms.upload(&doc("a")).unwrap().document_id;
        assert_eq!(
            tms.get_target_status(&id, "es_ES").unwrap(),
            TargetStatus::Request
        );
        assert!(tms.request_target(&id, "es_ES").unwrap());
        assert_eq!(
            tms.get_target_status(&id, "es_ES").unwrap(),
            TargetStatus::Pending
        );
        assert_eq!(tms.download(&id, "es_ES").unwrap(), "[es_ES] Hello");
    }

    #[test]
    fn test_fail_next_is_consumed_once() {
        let tms = SandboxTms::new();
        tms.fail_next(CallKind::Upload, TmsError::Api("boom".into()));
        assert_eq!(
            tms.upload(&doc("a")).unwrap_err(),
            TmsError::Api("boom".into())
        );
        assert!(tms.upload(&doc("a")).is_ok());
        assert_eq!(tms.call_count(), 2);
    }

    #[test]
    fn test_document_and_title_failures_persist() {
        let tms = SandboxTms::new();
        tms.fail_title("bad", TmsError::Unavailable("down".into()));
        assert!(tms.upload(&doc("bad")).is_err());
        assert!(tms.upload(&doc("bad")).is_err());

        tms.set_target_status("old", "es_ES", TargetStatus::Ready);
        tms.fail_document(
            "old",
            TmsError::DocumentLocked {
                document_id: "old".into(),
                new_document_id: "new".into(),
            },
        );
        assert!(matches!(
            tms.download("old", "es_ES"),
            Err(TmsError::DocumentLocked { .. })
        ));
        tms.clear_failures();
        assert!(tms.download("old", "es_ES").is_ok());
    }

    #[test]
    fn test_unknown_document() {
        let tms = SandboxTms::new();
        assert!(matches!(
            tms.get_source_status("nope"),
            Err(TmsError::Api(_))
        ));
    }
}
