//! Data model for the archive: records, forms, and partial-update patches
//!
//! Wire field names are camelCase to match the backend documents
//! (`authorUid`, `createdAt`, `isLocked`, ...). Timestamps are opaque
//! backend-assigned strings; the backend guarantees `updatedAt >= createdAt`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::content::DocumentType;

/// Marker used as `createdBy` for bootstrap-seeded records
pub const SYSTEM_CREATOR: &str = "system";

/// The fixed set of opaque display-style tokens a category may use
pub const CATEGORY_COLORS: [&str; 8] = [
    "bg-blue-100 text-blue-800",
    "bg-green-100 text-green-800",
    "bg-purple-100 text-purple-800",
    "bg-red-100 text-red-800",
    "bg-yellow-100 text-yellow-800",
    "bg-indigo-100 text-indigo-800",
    "bg-pink-100 text-pink-800",
    "bg-gray-100 text-gray-800",
];

/// Categories seeded on first load when the collection is empty
pub const DEFAULT_CATEGORIES: [(&str, &str); 9] = [
    ("Business", "bg-blue-100 text-blue-800"),
    ("Planning", "bg-green-100 text-green-800"),
    ("Specs", "bg-purple-100 text-purple-800"),
    ("Design", "bg-red-100 text-red-800"),
    ("Frontend", "bg-yellow-100 text-yellow-800"),
    ("Backend", "bg-indigo-100 text-indigo-800"),
    ("QA", "bg-pink-100 text-pink-800"),
    ("Operations", "bg-gray-100 text-gray-800"),
    ("Personal", "bg-blue-100 text-blue-800"),
];

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Viewer,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// Profile record stored in the `users` collection, keyed by provider uid
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

/// The application's resolved view of an authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    #[serde(default)]
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl AppUser {
    pub fn from_profile(uid: &str, profile: UserProfile) -> Self {
        Self {
            uid: uid.to_string(),
            name: profile.name,
            email: profile.email,
            role: profile.role,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
            profile_image: profile.profile_image,
        }
    }
}

/// Reserved: comments are not active in the current scope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    pub content: String,
    pub author: String,
    pub author_uid: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// A document record.
///
/// `author` is a denormalized copy of the creator's name at creation time;
/// `author_uid` is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub content: String,
    /// References a Category by name; checked at form-submission time only
    pub category: String,
    pub author: String,
    pub author_uid: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub is_locked: bool,
    /// Present only when locked. Stored in plaintext; the lock is a
    /// lightweight deterrent, not a security boundary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Ordered as entered; duplicates are not deduplicated
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub document_type: DocumentType,
    #[serde(default)]
    pub linked_documents: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// A category record.
///
/// `count` is a denormalized tally of documents whose `category` field
/// equals this category's name; it is clamped at zero and maintained by the
/// document store, not computed on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub count: u64,
    pub created_by: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

// --- Forms ---

/// Sign-up form
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// Compared against the configured secret; a match grants admin
    pub admin_key: String,
}

/// Document creation form
#[derive(Debug, Clone, Default)]
pub struct DocumentForm {
    pub title: String,
    pub content: String,
    pub category: String,
    /// Explicit user selection; `None` means auto-detect from content
    pub document_type: Option<DocumentType>,
    pub is_locked: bool,
    pub password: Option<String>,
    pub tags: Vec<String>,
}

/// Category creation form
#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    pub name: String,
    pub color: String,
}

// --- Partial updates ---
//
// Only fields explicitly present are sent to the backend; absent fields are
// left untouched.

/// Partial document update
#[derive(Debug, Clone, Default)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub document_type: Option<DocumentType>,
    pub is_locked: Option<bool>,
    pub password: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl DocumentPatch {
    /// Build the patch object carrying only the present fields
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(title) = &self.title {
            map.insert("title".to_string(), json!(title));
        }
        if let Some(content) = &self.content {
            map.insert("content".to_string(), json!(content));
        }
        if let Some(category) = &self.category {
            map.insert("category".to_string(), json!(category));
        }
        if let Some(document_type) = &self.document_type {
            map.insert("documentType".to_string(), json!(document_type));
        }
        if let Some(is_locked) = self.is_locked {
            map.insert("isLocked".to_string(), json!(is_locked));
        }
        if let Some(password) = &self.password {
            map.insert("password".to_string(), json!(password));
        }
        if let Some(tags) = &self.tags {
            map.insert("tags".to_string(), json!(parse_tag_list(tags)));
        }
        Value::Object(map)
    }

    pub fn is_empty(&self) -> bool {
        self.to_value().as_object().map(|m| m.is_empty()).unwrap_or(true)
    }
}

/// Partial category update
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl CategoryPatch {
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(name) = &self.name {
            map.insert("name".to_string(), json!(name));
        }
        if let Some(color) = &self.color {
            map.insert("color".to_string(), json!(color));
        }
        Value::Object(map)
    }
}

/// Partial profile update
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub profile_image: Option<String>,
}

impl ProfilePatch {
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(name) = &self.name {
            map.insert("name".to_string(), json!(name));
        }
        if let Some(profile_image) = &self.profile_image {
            map.insert("profileImage".to_string(), json!(profile_image));
        }
        Value::Object(map)
    }
}

/// Parse a comma-separated tag input: split, trim, drop empties, keep order
/// and duplicates
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Normalize an already-split tag list with the same trimming contract as
/// [`parse_tags`]
pub fn parse_tag_list(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}
