//! Document store: cache, live sync, and admin-gated mutations

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use log::warn;
use serde_json::json;

use crate::config::ArchiveConfig;
use crate::content::{self, classify, DocumentType};
use crate::error::{Error, Result};
use crate::gateway::{collections, Gateway, Query, Record, Subscription};
use crate::models::{parse_tag_list, AppUser, Document, DocumentForm, DocumentPatch};
use crate::store::category::{require_admin, CategoryStore};

/// In-memory cache of document records, synchronized with the backend via a
/// live subscription ordered by creation time descending.
///
/// Takes the category store at construction: document create/delete reach
/// into it to maintain the denormalized counts, so category state must exist
/// first. That cross-store write is the only one in the system and is not
/// transactional with the document write.
pub struct DocumentStore {
    gateway: Arc<dyn Gateway>,
    categories: Arc<CategoryStore>,
    documents: Arc<RwLock<Vec<Document>>>,
    loading: AtomicBool,
    last_error: RwLock<Option<String>>,
    subscription: Mutex<Option<Subscription>>,
    auto_detect_min_len: usize,
    preview_max_len: usize,
}

impl DocumentStore {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        categories: Arc<CategoryStore>,
        config: &ArchiveConfig,
    ) -> Self {
        Self {
            gateway,
            categories,
            documents: Arc::new(RwLock::new(Vec::new())),
            loading: AtomicBool::new(false),
            last_error: RwLock::new(None),
            subscription: Mutex::new(None),
            auto_detect_min_len: config.auto_detect_min_len,
            preview_max_len: config.preview_max_len,
        }
    }

    /// Snapshot of the cached documents, newest first
    pub fn documents(&self) -> Vec<Document> {
        self.documents.read().unwrap().clone()
    }

    /// List-view preview of a document's content, bounded by the configured
    /// length
    pub fn preview(&self, document: &Document) -> String {
        content::preview(
            &document.content,
            document.document_type,
            self.preview_max_len,
        )
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// The last mutation or load failure, retained until the next successful
    /// operation
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().unwrap().clone()
    }

    /// Fetch the full document collection ordered by creation time
    /// descending. With no authenticated user the cache is cleared instead.
    ///
    /// Fails soft: on backend error the previous cache is left untouched and
    /// the error flag is set.
    pub async fn load(&self, user: Option<&AppUser>) {
        if user.is_none() {
            *self.documents.write().unwrap() = Vec::new();
            return;
        }

        self.loading.store(true, Ordering::SeqCst);
        let result = self
            .gateway
            .query(collections::DOCUMENTS, Query::new().order_desc("createdAt"))
            .await;
        self.loading.store(false, Ordering::SeqCst);
        match result {
            Ok(records) => {
                *self.documents.write().unwrap() = decode_documents(records);
                self.clear_error();
            }
            Err(err) => {
                warn!("document load failed: {}", err);
                self.record_error(&Error::Gateway(err));
            }
        }
    }

    /// Establish the live subscription. Every snapshot fully replaces the
    /// cache: no incremental merge and no optimistic insert, the delivery is
    /// the sole source of truth for list contents. Gated on an
    /// authenticated user; `None` drops any existing subscription.
    pub fn subscribe(&self, user: Option<&AppUser>) -> Result<()> {
        if user.is_none() {
            self.unsubscribe();
            return Ok(());
        }

        let cache = self.documents.clone();
        let subscription = self.gateway.subscribe(
            collections::DOCUMENTS,
            Query::new().order_desc("createdAt"),
            Box::new(move |records| {
                *cache.write().unwrap() = decode_documents(records);
            }),
        )?;
        *self.subscription.lock().unwrap() = Some(subscription);
        Ok(())
    }

    /// Drop the live subscription; required on teardown so snapshots stop
    /// landing in discarded state
    pub fn unsubscribe(&self) {
        self.subscription.lock().unwrap().take();
    }

    /// Create a document. Admin only.
    ///
    /// Validates required fields before submission, normalizes tags, and
    /// resolves the document type (explicit choice wins; otherwise content
    /// above the detection threshold is auto-classified). On success the
    /// target category's count is incremented; the new record itself arrives
    /// through the subscription, not a local append.
    pub async fn create(&self, user: &AppUser, form: DocumentForm) -> Result<String> {
        let result = self.create_inner(user, form).await;
        self.track(result)
    }

    async fn create_inner(&self, user: &AppUser, form: DocumentForm) -> Result<String> {
        require_admin(user, "Only administrators can upload documents.")?;
        validate_form(&form)?;

        let content = form.content.trim().to_string();
        let document_type = form.document_type.unwrap_or_else(|| {
            if content.chars().count() > self.auto_detect_min_len {
                classify(&content)
            } else {
                DocumentType::Text
            }
        });
        let tags = parse_tag_list(&form.tags);

        let mut data = json!({
            "title": form.title.trim(),
            "content": content,
            "category": form.category,
            "author": user.name,
            "authorUid": user.uid,
            "isLocked": form.is_locked,
            "documentType": document_type,
            "tags": tags,
            "linkedDocuments": [],
            "comments": [],
        });
        // The password field is only present on locked documents
        if form.is_locked {
            if let Some(password) = &form.password {
                data["password"] = json!(password);
            }
        }

        self.loading.store(true, Ordering::SeqCst);
        let created = self.gateway.create(collections::DOCUMENTS, data).await;
        self.loading.store(false, Ordering::SeqCst);
        let id = created?;

        // The document write has already succeeded; a failure here leaves a
        // transient undercount until a manual recount.
        if let Err(err) = self.categories.adjust_count(&form.category, 1).await {
            warn!(
                "count increment for category '{}' failed: {}",
                form.category, err
            );
        }

        Ok(id)
    }

    /// Update a document. Admin only; only the fields present in the patch
    /// are sent, everything else is left untouched.
    pub async fn update(&self, user: &AppUser, id: &str, patch: DocumentPatch) -> Result<()> {
        let result = self.update_inner(user, id, patch).await;
        self.track(result)
    }

    async fn update_inner(&self, user: &AppUser, id: &str, patch: DocumentPatch) -> Result<()> {
        require_admin(user, "Only administrators can edit documents.")?;
        self.loading.store(true, Ordering::SeqCst);
        let updated = self
            .gateway
            .update(collections::DOCUMENTS, id, patch.to_value())
            .await;
        self.loading.store(false, Ordering::SeqCst);
        Ok(updated?)
    }

    /// Delete a document. Admin only; the target must exist in the local
    /// cache, which supplies the category whose count is then decremented
    /// (clamped at zero by the category store).
    pub async fn delete(&self, user: &AppUser, id: &str) -> Result<()> {
        let result = self.delete_inner(user, id).await;
        self.track(result)
    }

    async fn delete_inner(&self, user: &AppUser, id: &str) -> Result<()> {
        require_admin(user, "Only administrators can delete documents.")?;
        let category = self
            .documents
            .read()
            .unwrap()
            .iter()
            .find(|doc| doc.id == id)
            .map(|doc| doc.category.clone())
            .ok_or_else(|| Error::not_found(format!("document {}", id)))?;

        self.loading.store(true, Ordering::SeqCst);
        let deleted = self.gateway.delete(collections::DOCUMENTS, id).await;
        self.loading.store(false, Ordering::SeqCst);
        deleted?;

        // Same non-atomicity caveat as create
        if let Err(err) = self.categories.adjust_count(&category, -1).await {
            warn!("count decrement for category '{}' failed: {}", category, err);
        }

        Ok(())
    }

    fn track<T>(&self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.clear_error(),
            Err(err) => self.record_error(err),
        }
        result
    }

    fn record_error(&self, err: &Error) {
        *self.last_error.write().unwrap() = Some(err.user_message());
    }

    fn clear_error(&self) {
        *self.last_error.write().unwrap() = None;
    }
}

fn validate_form(form: &DocumentForm) -> Result<()> {
    if form.title.trim().is_empty() {
        return Err(Error::validation("A title is required."));
    }
    if form.content.trim().is_empty() {
        return Err(Error::validation("Content is required."));
    }
    if form.category.trim().is_empty() {
        return Err(Error::validation("A category must be selected."));
    }
    if form.is_locked
        && form
            .password
            .as_ref()
            .map(|password| password.is_empty())
            .unwrap_or(true)
    {
        return Err(Error::validation(
            "A password is required to lock a document.",
        ));
    }
    Ok(())
}

fn decode_documents(records: Vec<Record>) -> Vec<Document> {
    records
        .into_iter()
        .filter_map(|record| match record.decode() {
            Ok(document) => Some(document),
            Err(err) => {
                warn!("skipping undecodable document record {}: {}", record.id, err);
                None
            }
        })
        .collect()
}
