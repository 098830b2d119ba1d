//! Backend gateway abstraction
//!
//! The archive core does not talk to a database directly; it consumes an
//! external document store through this trait. The backend owns record ids
//! and timestamps: `create` assigns the id and both timestamps, `update`
//! merges only the supplied fields and refreshes `updatedAt`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Collection names used by the archive
pub mod collections {
    pub const USERS: &str = "users";
    pub const DOCUMENTS: &str = "documents";
    pub const CATEGORIES: &str = "categories";
    /// Reserved, unused in the current scope
    pub const COMMENTS: &str = "comments";
}

/// Errors raised by the backend gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("subscription failed: {0}")]
    Subscription(String),

    #[error("record decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A raw record as delivered by the backend: the opaque id plus the
/// document body
#[derive(Debug, Clone)]
pub struct Record {
    pub id: String,
    pub data: Value,
}

impl Record {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Deserialize the record body into a typed model, injecting the record
    /// id into the `id` field
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        let mut data = self.data.clone();
        if let Some(obj) = data.as_object_mut() {
            obj.insert("id".to_string(), Value::String(self.id.clone()));
        }
        Ok(serde_json::from_value(data)?)
    }
}

/// An equality filter on a single field
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Ordering clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub order: SortOrder,
}

/// A backend query: filters, ordering, and an optional limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter
    pub fn eq<T: Into<Value>>(mut self, field: &str, value: T) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    /// Order ascending by a field
    pub fn order_asc(mut self, field: &str) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            order: SortOrder::Ascending,
        });
        self
    }

    /// Order descending by a field
    pub fn order_desc(mut self, field: &str) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            order: SortOrder::Descending,
        });
        self
    }

    /// Limit the number of records returned
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Callback invoked with the full current result set on every change
pub type SnapshotHandler = Box<dyn Fn(Vec<Record>) + Send + Sync>;

/// Handle to a live subscription.
///
/// Dropping the handle unsubscribes; a component tearing down must not hold
/// on to it, or its callback keeps firing into discarded state.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Explicitly cancel the subscription
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// External document database: CRUD, queries, and live subscriptions.
///
/// All operations are asynchronous with indefinite latency; callers must not
/// assume a mutation's resolution means a subscription has already delivered
/// the corresponding snapshot.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch a single record by id
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, GatewayError>;

    /// Run a query against a collection
    async fn query(&self, collection: &str, query: Query) -> Result<Vec<Record>, GatewayError>;

    /// Create a record; the backend assigns the id and timestamps
    async fn create(&self, collection: &str, data: Value) -> Result<String, GatewayError>;

    /// Create or replace a record at a caller-chosen id
    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<(), GatewayError>;

    /// Merge only the supplied fields into an existing record
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), GatewayError>;

    /// Delete a record by id
    async fn delete(&self, collection: &str, id: &str) -> Result<(), GatewayError>;

    /// Establish a live subscription; the handler receives the full current
    /// result set whenever the underlying data changes
    fn subscribe(
        &self,
        collection: &str,
        query: Query,
        handler: SnapshotHandler,
    ) -> Result<Subscription, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Named {
        id: String,
        name: String,
    }

    #[test]
    fn record_decode_injects_id() {
        let record = Record::new("abc", json!({ "name": "QA" }));
        let named: Named = record.decode().unwrap();
        assert_eq!(named.id, "abc");
        assert_eq!(named.name, "QA");
    }

    #[test]
    fn query_builder() {
        let query = Query::new().eq("name", "QA").order_desc("createdAt").limit(5);
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters[0].field, "name");
        assert_eq!(
            query.order_by,
            Some(OrderBy {
                field: "createdAt".to_string(),
                order: SortOrder::Descending,
            })
        );
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn subscription_cancels_once() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let hits = Arc::new(AtomicU32::new(0));
        let hits2 = hits.clone();
        let sub = Subscription::new(move || {
            hits2.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
