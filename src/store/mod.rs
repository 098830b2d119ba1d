//! In-memory stores synchronized with the backend gateway
//!
//! Each store exclusively owns its cache. Caches are read-through: every
//! subscription snapshot fully replaces the contents, so the cache is
//! eventually consistent with the backend and mutations never append
//! locally. The one intentional cross-store write path is the document
//! store adjusting category counts.

pub mod category;
pub mod document;

pub use category::CategoryStore;
pub use document::DocumentStore;
