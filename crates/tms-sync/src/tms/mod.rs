//! The remote translation management service as seen by the engine.

mod sandbox;

pub use sandbox::{CallKind, SandboxTms, TmsCall};

use crate::error::TmsError;
use crate::status::{SourceStatus, TargetStatus};

/// A source document sent to the TMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentUpload<'a> {
    pub title: &'a str,
    pub content: &'a str,
    /// Remote locale of the source language.
    pub locale: &'a str,
    pub job_id: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub document_id: String,
    /// True while the TMS is still importing the document.
    pub importing: bool,
}

/// Blocking client for the TMS. Every method is one remote call; the
/// engine never retries.
pub trait TmsClient: Send + Sync {
    fn upload(&self, doc: &DocumentUpload<'_>) -> Result<UploadReceipt, TmsError>;

    /// Replaces the source of an existing document. The TMS may answer with
    /// a new document id.
    fn update_document(
        &self,
        document_id: &str,
        doc: &DocumentUpload<'_>,
    ) -> Result<UploadReceipt, TmsError>;

    fn get_source_status(&self, document_id: &str) -> Result<SourceStatus, TmsError>;

    /// Returns false when the TMS did not accept the request.
    fn request_target(&self, document_id: &str, locale: &str) -> Result<bool, TmsError>;

    fn get_target_status(&self, document_id: &str, locale: &str)
        -> Result<TargetStatus, TmsError>;

    fn download(&self, document_id: &str, locale: &str) -> Result<String, TmsError>;

    fn cancel_document(&self, document_id: &str) -> Result<(), TmsError>;

    fn cancel_target(&self, document_id: &str, locale: &str) -> Result<(), TmsError>;

    fn delete_document(&self, document_id: &str) -> Result<(), TmsError>;

    fn set_job_id(&self, document_id: &str, job_id: Option<&str>) -> Result<(), TmsError>;

    /// Locales published by the TMS.
    fn list_locales(&self) -> Result<Vec<String>, TmsError>;
}
