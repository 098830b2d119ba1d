//! Configuration options for the archive client

use crate::content::{AUTO_DETECT_MIN_LEN, PREVIEW_MAX_LEN};

/// Configuration options for the archive client
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Secret compared against the sign-up form's admin key; a match grants
    /// the admin role, anything else grants viewer
    pub admin_signup_key: String,

    /// Emails auto-provisioned as admin when a provider account exists
    /// without a profile record
    pub admin_emails: Vec<String>,

    /// Minimum trimmed content length before auto-detection of the document
    /// type kicks in
    pub auto_detect_min_len: usize,

    /// Maximum length of list-view previews
    pub preview_max_len: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            admin_signup_key: "164645".to_string(),
            admin_emails: vec![
                "cultsoda@gmail.com".to_string(),
                "admin@test.com".to_string(),
            ],
            auto_detect_min_len: AUTO_DETECT_MIN_LEN,
            preview_max_len: PREVIEW_MAX_LEN,
        }
    }
}

impl ArchiveConfig {
    /// Set the admin sign-up key
    pub fn with_admin_signup_key(mut self, value: &str) -> Self {
        self.admin_signup_key = value.to_string();
        self
    }

    /// Set the admin email allow-list
    pub fn with_admin_emails(mut self, value: Vec<String>) -> Self {
        self.admin_emails = value;
        self
    }

    /// Set the auto-detection threshold
    pub fn with_auto_detect_min_len(mut self, value: usize) -> Self {
        self.auto_detect_min_len = value;
        self
    }

    /// Set the preview length
    pub fn with_preview_max_len(mut self, value: usize) -> Self {
        self.preview_max_len = value;
        self
    }

    /// Overlay configuration from environment variables where present.
    ///
    /// `ARCHIVE_ADMIN_KEY` replaces the sign-up secret and
    /// `ARCHIVE_ADMIN_EMAILS` (comma-separated) replaces the allow-list.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("ARCHIVE_ADMIN_KEY") {
            if !key.is_empty() {
                config.admin_signup_key = key;
            }
        }
        if let Ok(emails) = std::env::var("ARCHIVE_ADMIN_EMAILS") {
            let emails: Vec<String> = emails
                .split(',')
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
            if !emails.is_empty() {
                config.admin_emails = emails;
            }
        }
        config
    }

    /// Whether the given email belongs to the admin allow-list
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|e| e == email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ArchiveConfig::default();
        assert_eq!(config.auto_detect_min_len, 50);
        assert_eq!(config.preview_max_len, 150);
        assert!(config.is_admin_email("admin@test.com"));
        assert!(!config.is_admin_email("viewer@test.com"));
    }

    #[test]
    fn builder() {
        let config = ArchiveConfig::default()
            .with_admin_signup_key("secret")
            .with_admin_emails(vec!["root@example.com".to_string()]);
        assert_eq!(config.admin_signup_key, "secret");
        assert!(config.is_admin_email("root@example.com"));
        assert!(!config.is_admin_email("admin@test.com"));
    }
}
