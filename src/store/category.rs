//! Category store: cache, live sync, and count maintenance

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use log::{debug, warn};
use serde_json::json;

use crate::error::{Error, Result};
use crate::gateway::{collections, Gateway, Query, Record, Subscription};
use crate::models::{
    AppUser, Category, CategoryForm, CategoryPatch, DEFAULT_CATEGORIES, SYSTEM_CREATOR,
};

/// In-memory cache of category records, synchronized with the backend via a
/// live subscription.
///
/// Mutations are admin-gated at the entry point; a failed gate never reaches
/// the backend. The denormalized `count` field is maintained through
/// [`adjust_count`](CategoryStore::adjust_count), which the document store
/// calls on create and delete.
pub struct CategoryStore {
    gateway: Arc<dyn Gateway>,
    categories: Arc<RwLock<Vec<Category>>>,
    loading: AtomicBool,
    last_error: RwLock<Option<String>>,
    subscription: Mutex<Option<Subscription>>,
}

impl CategoryStore {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            categories: Arc::new(RwLock::new(Vec::new())),
            loading: AtomicBool::new(false),
            last_error: RwLock::new(None),
            subscription: Mutex::new(None),
        }
    }

    /// Snapshot of the cached categories, ordered by name ascending
    pub fn categories(&self) -> Vec<Category> {
        self.categories.read().unwrap().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// The last mutation or load failure, retained until the next successful
    /// operation
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().unwrap().clone()
    }

    /// Fetch the full category collection, seeding the default set on an
    /// empty collection (one-time bootstrap, guarded only by the emptiness
    /// check). Runs without an auth gate.
    ///
    /// Fails soft: on backend error the previous cache is left untouched and
    /// the error flag is set.
    pub async fn load(&self) {
        self.loading.store(true, Ordering::SeqCst);
        let result = self.load_inner().await;
        self.loading.store(false, Ordering::SeqCst);
        match result {
            Ok(categories) => {
                *self.categories.write().unwrap() = categories;
                self.clear_error();
            }
            Err(err) => {
                warn!("category load failed: {}", err);
                self.record_error(&err);
            }
        }
    }

    async fn load_inner(&self) -> Result<Vec<Category>> {
        let query = Query::new().order_asc("name");
        let records = self
            .gateway
            .query(collections::CATEGORIES, query.clone())
            .await?;
        if !records.is_empty() {
            return Ok(decode_categories(records));
        }

        debug!("category collection is empty, seeding defaults");
        for (name, color) in DEFAULT_CATEGORIES {
            let data = json!({
                "name": name,
                "color": color,
                "count": 0,
                "createdBy": SYSTEM_CREATOR,
            });
            self.gateway.create(collections::CATEGORIES, data).await?;
        }
        let seeded = self.gateway.query(collections::CATEGORIES, query).await?;
        Ok(decode_categories(seeded))
    }

    /// Establish the live subscription; every snapshot fully replaces the
    /// cache
    pub fn subscribe(&self) -> Result<()> {
        let cache = self.categories.clone();
        let subscription = self.gateway.subscribe(
            collections::CATEGORIES,
            Query::new().order_asc("name"),
            Box::new(move |records| {
                *cache.write().unwrap() = decode_categories(records);
            }),
        )?;
        *self.subscription.lock().unwrap() = Some(subscription);
        Ok(())
    }

    /// Drop the live subscription
    pub fn unsubscribe(&self) {
        self.subscription.lock().unwrap().take();
    }

    /// Create a category. Admin only; the name must not collide
    /// case-insensitively with any cached category. The check runs against
    /// the local cache only, not re-verified at the backend.
    pub async fn create(&self, user: &AppUser, form: CategoryForm) -> Result<String> {
        let result = self.create_inner(user, form).await;
        self.track(result)
    }

    async fn create_inner(&self, user: &AppUser, form: CategoryForm) -> Result<String> {
        require_admin(user, "Only administrators can manage categories.")?;
        let name = form.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("A category name is required."));
        }
        let duplicate = self
            .categories
            .read()
            .unwrap()
            .iter()
            .any(|cat| cat.name.to_lowercase() == name.to_lowercase());
        if duplicate {
            return Err(Error::validation("A category with this name already exists."));
        }

        let data = json!({
            "name": name,
            "color": form.color,
            "count": 0,
            "createdBy": user.uid,
        });
        self.loading.store(true, Ordering::SeqCst);
        let created = self.gateway.create(collections::CATEGORIES, data).await;
        self.loading.store(false, Ordering::SeqCst);
        Ok(created?)
    }

    /// Update a category. Admin only; only the fields present in the patch
    /// are sent.
    pub async fn update(&self, user: &AppUser, id: &str, patch: CategoryPatch) -> Result<()> {
        let result = self.update_inner(user, id, patch).await;
        self.track(result)
    }

    async fn update_inner(&self, user: &AppUser, id: &str, patch: CategoryPatch) -> Result<()> {
        require_admin(user, "Only administrators can manage categories.")?;
        self.loading.store(true, Ordering::SeqCst);
        let updated = self
            .gateway
            .update(collections::CATEGORIES, id, patch.to_value())
            .await;
        self.loading.store(false, Ordering::SeqCst);
        Ok(updated?)
    }

    /// Delete a category. Admin only; rejected locally when the cached count
    /// shows documents still referencing it.
    pub async fn delete(&self, user: &AppUser, id: &str) -> Result<()> {
        let result = self.delete_inner(user, id).await;
        self.track(result)
    }

    async fn delete_inner(&self, user: &AppUser, id: &str) -> Result<()> {
        require_admin(user, "Only administrators can manage categories.")?;
        let in_use = self
            .categories
            .read()
            .unwrap()
            .iter()
            .any(|cat| cat.id == id && cat.count > 0);
        if in_use {
            return Err(Error::validation(
                "A category that still contains documents cannot be deleted.",
            ));
        }

        self.loading.store(true, Ordering::SeqCst);
        let deleted = self.gateway.delete(collections::CATEGORIES, id).await;
        self.loading.store(false, Ordering::SeqCst);
        Ok(deleted?)
    }

    /// Adjust the denormalized document count of the category with the given
    /// name, clamping at zero. An unknown name is a silent no-op.
    ///
    /// Not transactional with the document write that triggers it; a failure
    /// after a successful write leaves the count stale.
    pub async fn adjust_count(&self, name: &str, delta: i64) -> Result<()> {
        let records = self
            .gateway
            .query(collections::CATEGORIES, Query::new().eq("name", name))
            .await?;
        let record = match records.into_iter().next() {
            Some(record) => record,
            None => {
                debug!("adjust_count: no category named '{}', skipping", name);
                return Ok(());
            }
        };
        let category: Category = record.decode()?;
        let new_count = (category.count as i64 + delta).max(0) as u64;
        self.gateway
            .update(
                collections::CATEGORIES,
                &record.id,
                json!({ "count": new_count }),
            )
            .await?;
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

fn decode_categories(records: Vec<Record>) -> Vec<Category> {
    records
        .into_iter()
        .filter_map(|record| match record.decode() {
            Ok(category) => Some(category),
            Err(err) => {
                warn!("skipping undecodable category record {}: {}", record.id, err);
                None
            }
        })
        .collect()
}

pub(crate) fn require_admin(user: &AppUser, message: &str) -> Result<()> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(Error::permission(message))
    }
}
