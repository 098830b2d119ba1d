//! In-memory fakes for the external collaborators
//!
//! The gateway fake tracks per-operation call counts (the role-gate tests
//! assert zero backend traffic) and supports one-shot fault injection. Live
//! subscriptions are delivered synchronously: an initial snapshot on
//! registration and a fresh one after every write, mirroring the
//! full-result-set contract.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use docarchive::gateway::{
    Gateway, GatewayError, Query, Record, SnapshotHandler, SortOrder, Subscription,
};
use docarchive::identity::{
    AuthStateHandler, IdentityError, IdentityProvider, ProviderUser,
};
use docarchive::models::{AppUser, UserRole};

// --- Test users ---

pub fn admin_user() -> AppUser {
    AppUser {
        uid: "admin-uid".to_string(),
        name: "Admin Kim".to_string(),
        email: "admin@test.com".to_string(),
        role: UserRole::Admin,
        created_at: String::new(),
        updated_at: String::new(),
        profile_image: None,
    }
}

pub fn viewer_user() -> AppUser {
    AppUser {
        uid: "viewer-uid".to_string(),
        name: "Viewer Park".to_string(),
        email: "viewer@test.com".to_string(),
        role: UserRole::Viewer,
        created_at: String::new(),
        updated_at: String::new(),
        profile_image: None,
    }
}

// --- Fake gateway ---

#[derive(Default)]
pub struct Calls {
    pub get: AtomicUsize,
    pub query: AtomicUsize,
    pub create: AtomicUsize,
    pub put: AtomicUsize,
    pub update: AtomicUsize,
    pub delete: AtomicUsize,
    pub subscribe: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.get.load(Ordering::SeqCst)
            + self.query.load(Ordering::SeqCst)
            + self.create.load(Ordering::SeqCst)
            + self.put.load(Ordering::SeqCst)
            + self.update.load(Ordering::SeqCst)
            + self.delete.load(Ordering::SeqCst)
            + self.subscribe.load(Ordering::SeqCst)
    }
}

struct StoredRecord {
    id: String,
    data: Value,
}

struct Subscriber {
    collection: String,
    query: Query,
    handler: Arc<SnapshotHandler>,
    active: Arc<AtomicBool>,
}

#[derive(Default)]
struct GatewayState {
    collections: HashMap<String, Vec<StoredRecord>>,
    subscribers: Vec<Subscriber>,
}

pub struct FakeGateway {
    state: Mutex<GatewayState>,
    clock: AtomicU64,
    pub calls: Calls,
    fail_ops: Mutex<HashSet<&'static str>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(GatewayState::default()),
            clock: AtomicU64::new(1),
            calls: Calls::default(),
            fail_ops: Mutex::new(HashSet::new()),
        })
    }

    /// Make the next call of the named operation fail
    pub fn fail_next(&self, op: &'static str) {
        self.fail_ops.lock().unwrap().insert(op);
    }

    fn check_fail(&self, op: &'static str) -> Result<(), GatewayError> {
        if self.fail_ops.lock().unwrap().remove(op) {
            Err(GatewayError::Unavailable(format!("injected {} failure", op)))
        } else {
            Ok(())
        }
    }

    fn timestamp(&self) -> String {
        format!("{:012}", self.clock.fetch_add(1, Ordering::SeqCst))
    }

    /// Insert a record directly, bypassing the call counters
    pub fn seed(&self, collection: &str, mut data: Value) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let now = self.timestamp();
        if let Some(obj) = data.as_object_mut() {
            obj.entry("createdAt").or_insert(Value::String(now.clone()));
            obj.entry("updatedAt").or_insert(Value::String(now));
        }
        self.state
            .lock()
            .unwrap()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(StoredRecord {
                id: id.clone(),
                data,
            });
        self.notify(collection);
        id
    }

    /// Read a stored record body for assertions
    pub fn record(&self, collection: &str, id: &str) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state
            .collections
            .get(collection)?
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.data.clone())
    }

    /// Number of records in a collection
    pub fn len(&self, collection: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .collections
            .get(collection)
            .map(|records| records.len())
            .unwrap_or(0)
    }

    /// Read the record body of the single record matching a field value
    pub fn find_by(&self, collection: &str, field: &str, value: &str) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state
            .collections
            .get(collection)?
            .iter()
            .find(|record| record.data.get(field).and_then(Value::as_str) == Some(value))
            .map(|record| record.data.clone())
    }

    fn eval(&self, collection: &str, query: &Query) -> Vec<Record> {
        let state = self.state.lock().unwrap();
        let mut records: Vec<Record> = state
            .collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| {
                        query.filters.iter().all(|filter| {
                            record.data.get(&filter.field) == Some(&filter.value)
                        })
                    })
                    .map(|record| Record::new(record.id.clone(), record.data.clone()))
                    .collect()
            })
            .unwrap_or_default();
        if let Some(order) = &query.order_by {
            records.sort_by_key(|record| {
                record
                    .data
                    .get(&order.field)
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string()
            });
            if order.order == SortOrder::Descending {
                records.reverse();
            }
        }
        if let Some(limit) = query.limit {
            records.truncate(limit);
        }
        records
    }

    fn notify(&self, collection: &str) {
        let subscribers: Vec<(Query, Arc<SnapshotHandler>)> = {
            let state = self.state.lock().unwrap();
            state
                .subscribers
                .iter()
                .filter(|sub| {
                    sub.collection == collection && sub.active.load(Ordering::SeqCst)
                })
                .map(|sub| (sub.query.clone(), sub.handler.clone()))
                .collect()
        };
        for (query, handler) in subscribers {
            handler(self.eval(collection, &query));
        }
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, GatewayError> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        self.check_fail("get")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .collections
            .get(collection)
            .and_then(|records| records.iter().find(|record| record.id == id))
            .map(|record| Record::new(record.id.clone(), record.data.clone())))
    }

    async fn query(&self, collection: &str, query: Query) -> Result<Vec<Record>, GatewayError> {
        self.calls.query.fetch_add(1, Ordering::SeqCst);
        self.check_fail("query")?;
        Ok(self.eval(collection, &query))
    }

    async fn create(&self, collection: &str, mut data: Value) -> Result<String, GatewayError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        self.check_fail("create")?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = self.timestamp();
        if let Some(obj) = data.as_object_mut() {
            obj.insert("createdAt".to_string(), Value::String(now.clone()));
            obj.insert("updatedAt".to_string(), Value::String(now));
        }
        self.state
            .lock()
            .unwrap()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(StoredRecord {
                id: id.clone(),
                data,
            });
        self.notify(collection);
        Ok(id)
    }

    async fn put(&self, collection: &str, id: &str, mut data: Value) -> Result<(), GatewayError> {
        self.calls.put.fetch_add(1, Ordering::SeqCst);
        self.check_fail("put")?;
        let now = self.timestamp();
        if let Some(obj) = data.as_object_mut() {
            obj.entry("createdAt").or_insert(Value::String(now.clone()));
            obj.insert("updatedAt".to_string(), Value::String(now));
        }
        {
            let mut state = self.state.lock().unwrap();
            let records = state.collections.entry(collection.to_string()).or_default();
            if let Some(existing) = records.iter_mut().find(|record| record.id == id) {
                existing.data = data;
            } else {
                records.push(StoredRecord {
                    id: id.to_string(),
                    data,
                });
            }
        }
        self.notify(collection);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), GatewayError> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        self.check_fail("update")?;
        let now = self.timestamp();
        {
            let mut state = self.state.lock().unwrap();
            let record = state
                .collections
                .get_mut(collection)
                .and_then(|records| records.iter_mut().find(|record| record.id == id))
                .ok_or_else(|| GatewayError::Write(format!("no record {} to update", id)))?;
            if let (Some(target), Some(fields)) = (record.data.as_object_mut(), patch.as_object())
            {
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
                target.insert("updatedAt".to_string(), Value::String(now));
            }
        }
        self.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), GatewayError> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.check_fail("delete")?;
        {
            let mut state = self.state.lock().unwrap();
            if let Some(records) = state.collections.get_mut(collection) {
                records.retain(|record| record.id != id);
            }
        }
        self.notify(collection);
        Ok(())
    }

    fn subscribe(
        &self,
        collection: &str,
        query: Query,
        handler: SnapshotHandler,
    ) -> Result<Subscription, GatewayError> {
        self.calls.subscribe.fetch_add(1, Ordering::SeqCst);
        let handler = Arc::new(handler);
        let active = Arc::new(AtomicBool::new(true));
        self.state.lock().unwrap().subscribers.push(Subscriber {
            collection: collection.to_string(),
            query: query.clone(),
            handler: handler.clone(),
            active: active.clone(),
        });
        // Initial snapshot, as a live query delivers on registration
        handler(self.eval(collection, &query));
        Ok(Subscription::new(move || {
            active.store(false, Ordering::SeqCst);
        }))
    }
}

// --- Fake identity provider ---

#[derive(Default)]
struct IdentityState {
    /// email -> (password, uid)
    accounts: HashMap<String, (String, String)>,
    current: Option<ProviderUser>,
    handlers: Vec<(Arc<AuthStateHandler>, Arc<AtomicBool>)>,
}

pub struct FakeIdentity {
    state: Mutex<IdentityState>,
}

impl FakeIdentity {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(IdentityState::default()),
        })
    }

    /// Pre-create a provider account, returning its uid
    pub fn register(&self, email: &str, password: &str) -> String {
        let uid = uuid::Uuid::new_v4().to_string();
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(email.to_string(), (password.to_string(), uid.clone()));
        uid
    }

    pub fn account_count(&self) -> usize {
        self.state.lock().unwrap().accounts.len()
    }

    /// Push an auth-state transition to all registered handlers
    pub fn emit(&self, user: Option<ProviderUser>) {
        let handlers: Vec<Arc<AuthStateHandler>> = {
            let mut state = self.state.lock().unwrap();
            state.current = user.clone();
            state
                .handlers
                .iter()
                .filter(|(_, active)| active.load(Ordering::SeqCst))
                .map(|(handler, _)| handler.clone())
                .collect()
        };
        for handler in handlers {
            handler(user.clone());
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, IdentityError> {
        let state = self.state.lock().unwrap();
        match state.accounts.get(email) {
            Some((stored, uid)) if stored == password => Ok(ProviderUser {
                uid: uid.clone(),
                email: email.to_string(),
            }),
            Some(_) => Err(IdentityError::InvalidCredentials),
            None => Err(IdentityError::UserNotFound),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, IdentityError> {
        let mut state = self.state.lock().unwrap();
        if state.accounts.contains_key(email) {
            return Err(IdentityError::EmailInUse);
        }
        let uid = uuid::Uuid::new_v4().to_string();
        state
            .accounts
            .insert(email.to_string(), (password.to_string(), uid.clone()));
        Ok(ProviderUser {
            uid,
            email: email.to_string(),
        })
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.state.lock().unwrap().current = None;
        Ok(())
    }

    fn on_auth_state_changed(&self, handler: AuthStateHandler) -> Subscription {
        let handler = Arc::new(handler);
        let active = Arc::new(AtomicBool::new(true));
        let current = {
            let mut state = self.state.lock().unwrap();
            state.handlers.push((handler.clone(), active.clone()));
            state.current.clone()
        };
        // Providers fire immediately with the current state on registration
        handler(current);
        Subscription::new(move || {
            active.store(false, Ordering::SeqCst);
        })
    }
}
