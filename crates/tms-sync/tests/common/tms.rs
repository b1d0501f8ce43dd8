//! A TMS client wrapping the sandbox that can slow down uploads, track how
//! many run at once, and panic on a chosen title.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tms_sync::tms::{DocumentUpload, UploadReceipt};
use tms_sync::{SandboxTms, SourceStatus, TargetStatus, TmsClient, TmsError};

pub struct InstrumentedTms {
    inner: Arc<SandboxTms>,
    upload_delay: Duration,
    panic_on_title: Option<String>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl InstrumentedTms {
    pub fn new(inner: Arc<SandboxTms>) -> Self {
        Self {
            inner,
            upload_delay: Duration::ZERO,
            panic_on_title: None,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    pub fn panic_on_title(mut self, title: &str) -> Self {
        self.panic_on_title = Some(title.to_string());
        self
    }

    /// Most uploads and updates that were ever in progress at once.
    pub fn max_concurrent_uploads(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn around_upload<T>(&self, doc: &DocumentUpload<'_>, call: impl FnOnce() -> T) -> T {
        if self.panic_on_title.as_deref() == Some(doc.title) {
            panic!("TMS client crashed on '{}'", doc.title);
        }
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        thread::sleep(self.upload_delay);
        let result = call();
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl TmsClient for InstrumentedTms {
    fn upload(&self, doc: &DocumentUpload<'_>) -> Result<UploadReceipt, TmsError> {
        self.around_upload(doc, || self.inner.upload(doc))
    }

    fn update_document(
        &self,
        document_id: &str,
        doc: &DocumentUpload<'_>,
    ) -> Result<UploadReceipt, TmsError> {
        self.around_upload(doc, || self.inner.update_document(document_id, doc))
    }

    fn get_source_status(&self, document_id: &str) -> Result<SourceStatus, TmsError> {
        self.inner.get_source_status(document_id)
    }

    fn request_target(&self, document_id: &str, locale: &str) -> Result<bool, TmsError> {
        self.inner.request_target(document_id, locale)
    }

    fn get_target_status(
        &self,
        document_id: &str,
        locale: &str,
    ) -> Result<TargetStatus, TmsError> {
        self.inner.get_target_status(document_id, locale)
    }

    fn download(&self, document_id: &str, locale: &str) -> Result<String, TmsError> {
        self.inner.download(document_id, locale)
    }

    fn cancel_document(&self, document_id: &str) -> Result<(), TmsError> {
        self.inner.cancel_document(document_id)
    }

    fn cancel_target(&self, document_id: &str, locale: &str) -> Result<(), TmsError> {
        self.inner.cancel_target(document_id, locale)
    }

    fn delete_document(&self, document_id: &str) -> Result<(), TmsError> {
        self.inner.delete_document(document_id)
    }

    fn set_job_id(&self, document_id: &str, job_id: Option<&str>) -> Result<(), TmsError> {
        self.inner.set_job_id(document_id, job_id)
    }

    fn list_locales(&self) -> Result<Vec<String>, TmsError> {
        self.inner.list_locales()
    }
}
