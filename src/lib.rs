//! Document archive client core
//!
//! Client-side state orchestration for a document archive backed by an
//! external document database and identity provider. The backend owns all
//! persistence; this crate provides the in-memory stores synchronized
//! through live subscriptions, the session adapter mapping provider users
//! to application users, and the content-type detection and rendering
//! pipeline for text, HTML, CSV, and markdown documents.

pub mod config;
pub mod content;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod models;
pub mod session;
pub mod store;

use std::sync::Arc;

use log::warn;

use crate::config::ArchiveConfig;
use crate::error::Result;
use crate::gateway::Gateway;
use crate::identity::IdentityProvider;
use crate::session::SessionAdapter;
use crate::store::{CategoryStore, DocumentStore};

/// The main entry point: wires the external collaborators into the session
/// adapter and the stores.
///
/// The category store is constructed before the document store because
/// document mutations reach into it for count maintenance; the dependency is
/// explicit at construction time rather than implied by initialization
/// order.
pub struct ArchiveClient {
    /// Session adapter for sign-in/up/out and the resolved-user stream
    pub session: Arc<SessionAdapter>,
    /// Category cache and mutations
    pub categories: Arc<CategoryStore>,
    /// Document cache and mutations
    pub documents: Arc<DocumentStore>,
}

impl ArchiveClient {
    /// Create a new client from the external collaborators
    ///
    /// # Example
    ///
    /// ```ignore
    /// use docarchive::{ArchiveClient, config::ArchiveConfig};
    ///
    /// let client = ArchiveClient::new(gateway, identity, ArchiveConfig::from_env());
    /// ```
    pub fn new(
        gateway: Arc<dyn Gateway>,
        identity: Arc<dyn IdentityProvider>,
        config: ArchiveConfig,
    ) -> Self {
        let categories = Arc::new(CategoryStore::new(gateway.clone()));
        let documents = Arc::new(DocumentStore::new(
            gateway.clone(),
            categories.clone(),
            &config,
        ));
        let session = Arc::new(SessionAdapter::new(identity, gateway, config));
        Self {
            session,
            categories,
            documents,
        }
    }

    /// App-start lifecycle: bootstrap the categories, establish their live
    /// subscription, and register for auth-state changes
    pub async fn start(&self) {
        self.categories.load().await;
        if let Err(err) = self.categories.subscribe() {
            warn!("category subscription failed: {}", err);
        }
        self.session.start();
    }

    /// Load documents and establish their subscription for the given
    /// session state; an unauthenticated state clears the cache instead
    pub async fn sync_documents(&self, user: Option<&crate::models::AppUser>) {
        self.documents.load(user).await;
        if let Err(err) = self.documents.subscribe(user) {
            warn!("document subscription failed: {}", err);
        }
    }

    /// Sign out and drop all caches keyed to the authenticated state
    pub async fn sign_out(&self) -> Result<()> {
        self.session.sign_out().await?;
        self.documents.unsubscribe();
        self.documents.load(None).await;
        Ok(())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::ArchiveConfig;
    pub use crate::content::{classify, preview, render, DocumentType, RenderedContent};
    pub use crate::error::{Error, Result};
    pub use crate::gateway::Gateway;
    pub use crate::identity::IdentityProvider;
    pub use crate::models::{AppUser, Category, Document, UserRole};
    pub use crate::ArchiveClient;
}
