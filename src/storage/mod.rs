//!
//! libris storage module
//! ---------------------
//! Durable client-side storage for the admin console. Everything the console
//! must remember between runs (auth token, cached roles and identity, open tabs,
//! layout preferences) lives in one string key-value store with `localStorage`
//! semantics, snapshotted to a JSON file under the configured profile directory.
//!
//! - [`kv::KvStore`]: the generic store (in-memory or file-backed).
//! - [`cache_key::CacheKeys`]: namespaced key names.
//! - [`credentials::CredentialStore`]: typed accessors used by the session,
//!   tags-view and settings stores.

pub mod cache_key;
pub mod credentials;
pub mod kv;

pub use cache_key::{CacheKeys, DEFAULT_SYSTEM_NAME, JUST_LOGGED_IN};
pub use credentials::CredentialStore;
pub use kv::{KvStore, PersistenceSettings, StoreSettings};
