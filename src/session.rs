//! Session adapter over the identity provider
//!
//! Maps provider-native users to the application's user model and keeps a
//! push-based stream of the current resolved user. Consumers should treat a
//! transient `None` while a profile lookup is pending as "not yet known";
//! the stream does not distinguish it from "signed out".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use serde_json::json;
use tokio::sync::{mpsc, watch};

use crate::config::ArchiveConfig;
use crate::error::{Error, Result};
use crate::gateway::{collections, Gateway, Subscription};
use crate::identity::{IdentityProvider, ProviderUser};
use crate::models::{AppUser, ProfilePatch, SignupForm, UserProfile, UserRole};

/// Wraps the identity provider and the `users` profile collection.
///
/// Construct once at app start; stores receive the resolved user explicitly
/// per call rather than reading ambient session state.
pub struct SessionAdapter {
    identity: Arc<dyn IdentityProvider>,
    gateway: Arc<dyn Gateway>,
    config: ArchiveConfig,
    current: watch::Sender<Option<AppUser>>,
    loading: AtomicBool,
    listener: Mutex<Option<Subscription>>,
}

impl SessionAdapter {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        gateway: Arc<dyn Gateway>,
        config: ArchiveConfig,
    ) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            identity,
            gateway,
            config,
            current,
            loading: AtomicBool::new(false),
            listener: Mutex::new(None),
        }
    }

    /// Stream of the current resolved application user (`None` when signed
    /// out or while a transition is being resolved)
    pub fn watch(&self) -> watch::Receiver<Option<AppUser>> {
        self.current.subscribe()
    }

    /// The most recently resolved user
    pub fn current_user(&self) -> Option<AppUser> {
        self.current.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Register with the provider's auth-state stream and spawn the task
    /// resolving provider users into application users.
    ///
    /// The provider callback is synchronous; transitions are bridged through
    /// a channel so the profile lookup can run asynchronously. A transition
    /// whose profile is missing or unreadable resolves to `None`.
    pub fn start(&self) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Option<ProviderUser>>();
        let subscription = self.identity.on_auth_state_changed(Box::new(move |user| {
            let _ = tx.send(user);
        }));
        *self.listener.lock().unwrap() = Some(subscription);

        let gateway = self.gateway.clone();
        let sender = self.current.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let resolved = match event {
                    Some(provider_user) => {
                        match lookup_profile(gateway.as_ref(), &provider_user.uid).await {
                            Ok(Some(profile)) => {
                                Some(AppUser::from_profile(&provider_user.uid, profile))
                            }
                            Ok(None) => {
                                warn!("no profile record for uid {}", provider_user.uid);
                                None
                            }
                            Err(err) => {
                                warn!("profile lookup failed: {}", err);
                                None
                            }
                        }
                    }
                    None => None,
                };
                // send_replace stores the value even with no receivers alive
                sender.send_replace(resolved);
            }
        });
    }

    /// Unregister from the provider's auth-state stream
    pub fn stop(&self) {
        self.listener.lock().unwrap().take();
    }

    /// Verify credentials and resolve the application user. A provider
    /// account without a profile record gets one auto-provisioned: name from
    /// the email's local part, role viewer unless the email is on the admin
    /// allow-list.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AppUser> {
        self.loading.store(true, Ordering::SeqCst);
        let result = self.sign_in_inner(email, password).await;
        self.loading.store(false, Ordering::SeqCst);
        if let Ok(user) = &result {
            self.current.send_replace(Some(user.clone()));
        }
        result
    }

    async fn sign_in_inner(&self, email: &str, password: &str) -> Result<AppUser> {
        let provider_user = self.identity.sign_in(email, password).await?;
        let profile = match lookup_profile(self.gateway.as_ref(), &provider_user.uid).await? {
            Some(profile) => profile,
            None => self.provision_profile(&provider_user).await?,
        };
        Ok(AppUser::from_profile(&provider_user.uid, profile))
    }

    async fn provision_profile(&self, provider_user: &ProviderUser) -> Result<UserProfile> {
        debug!(
            "no profile for uid {}, auto-provisioning",
            provider_user.uid
        );
        let name = provider_user
            .email
            .split('@')
            .next()
            .unwrap_or(&provider_user.email)
            .to_string();
        let role = if self.config.is_admin_email(&provider_user.email) {
            UserRole::Admin
        } else {
            UserRole::Viewer
        };
        self.gateway
            .put(
                collections::USERS,
                &provider_user.uid,
                json!({
                    "name": name,
                    "email": provider_user.email,
                    "role": role,
                }),
            )
            .await?;
        Ok(UserProfile {
            name,
            email: provider_user.email.clone(),
            role,
            created_at: String::new(),
            updated_at: String::new(),
            profile_image: None,
        })
    }

    /// Create a provider account and its profile record. The role is decided
    /// here: an admin key matching the configured secret grants admin,
    /// anything else (including empty) grants viewer.
    ///
    /// The two writes are not reconciled: if the profile write fails after
    /// the provider account was created, the provider account is orphaned.
    pub async fn sign_up(&self, form: SignupForm) -> Result<AppUser> {
        self.loading.store(true, Ordering::SeqCst);
        let result = self.sign_up_inner(form).await;
        self.loading.store(false, Ordering::SeqCst);
        if let Ok(user) = &result {
            self.current.send_replace(Some(user.clone()));
        }
        result
    }

    async fn sign_up_inner(&self, form: SignupForm) -> Result<AppUser> {
        if form.name.trim().is_empty() {
            return Err(Error::validation("A name is required."));
        }
        if form.email.trim().is_empty() {
            return Err(Error::validation("An email address is required."));
        }
        if form.password.is_empty() {
            return Err(Error::validation("A password is required."));
        }
        if form.password != form.confirm_password {
            return Err(Error::validation("The passwords do not match."));
        }

        let role = if form.admin_key == self.config.admin_signup_key {
            UserRole::Admin
        } else {
            UserRole::Viewer
        };

        let provider_user = self.identity.sign_up(&form.email, &form.password).await?;
        self.gateway
            .put(
                collections::USERS,
                &provider_user.uid,
                json!({
                    "name": form.name,
                    "email": form.email,
                    "role": role,
                }),
            )
            .await?;

        Ok(AppUser {
            uid: provider_user.uid,
            name: form.name,
            email: form.email,
            role,
            created_at: String::new(),
            updated_at: String::new(),
            profile_image: None,
        })
    }

    /// Close the provider session and publish `None`. Dropping caches keyed
    /// to the authenticated state is the caller's responsibility.
    pub async fn sign_out(&self) -> Result<()> {
        self.loading.store(true, Ordering::SeqCst);
        let result = self.identity.sign_out().await;
        self.loading.store(false, Ordering::SeqCst);
        result?;
        self.current.send_replace(None);
        Ok(())
    }

    /// Apply a partial profile update for the given user and publish the
    /// merged result
    pub async fn update_profile(&self, user: &AppUser, patch: ProfilePatch) -> Result<()> {
        self.gateway
            .update(collections::USERS, &user.uid, patch.to_value())
            .await?;

        let mut updated = user.clone();
        if let Some(name) = patch.name {
            updated.name = name;
        }
        if let Some(profile_image) = patch.profile_image {
            updated.profile_image = Some(profile_image);
        }
        self.current.send_replace(Some(updated));
        Ok(())
    }
}

async fn lookup_profile(gateway: &dyn Gateway, uid: &str) -> Result<Option<UserProfile>> {
    match gateway.get(collections::USERS, uid).await? {
        Some(record) => Ok(Some(serde_json::from_value(record.data)?)),
        None => Ok(None),
    }
}
