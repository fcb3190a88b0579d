/// Storage layer
///
/// One interface (`AccountStore` + `PostStore` + `StoreAdmin`) with two
/// implementations selected at startup:
///
/// - `memory`: dashmap-backed, per-post entry locks
/// - `postgres`: sqlx over PostgreSQL, per-post row locks
///
/// Mutations on a single post (like toggle, comment append) are atomic in
/// both backends.
pub mod memory;
pub mod postgres;

use crate::models::{
    Account, CommentRecord, LikeToggle, NewAccount, NewComment, NewPost, PostQuery, PostRecord,
    ProfileUpdate, StoreStats,
};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal store error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Account persistence
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. The email uniqueness check and the write are a
    /// single atomic step; a taken email yields `StoreError::DuplicateEmail`.
    async fn insert_account(&self, new: NewAccount) -> StoreResult<Account>;

    async fn find_account(&self, id: Uuid) -> StoreResult<Option<Account>>;

    /// Case-insensitive lookup
    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Batch lookup; unknown ids are skipped
    async fn find_accounts(&self, ids: &[Uuid]) -> StoreResult<Vec<Account>>;

    /// Oldest first
    async fn list_accounts(&self, limit: usize) -> StoreResult<Vec<Account>>;

    /// Partial update; `None` when the account does not exist
    async fn update_account(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<Account>>;

    async fn count_accounts(&self) -> StoreResult<usize>;
}

/// Post persistence
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, new: NewPost) -> StoreResult<PostRecord>;

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<PostRecord>>;

    async fn post_exists(&self, id: Uuid) -> StoreResult<bool>;

    /// Newest first by `created_at`, ties broken by insertion order.
    /// A `NULL` limit (`LIMIT ALL` in postgres) returns every match.
    async fn list_posts(&self, query: PostQuery) -> StoreResult<Vec<PostRecord>>;

    /// Flip `user_id`'s membership in the post's like set.
    /// `None` when the post does not exist.
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> StoreResult<Option<LikeToggle>>;

    /// Append a comment and return it with the post's new comment count.
    /// `None` when the post does not exist.
    async fn append_comment(
        &self,
        post_id: Uuid,
        comment: NewComment,
    ) -> StoreResult<Option<(CommentRecord, usize)>>;

    async fn stats(&self) -> StoreResult<StoreStats>;
}

/// Administrative lifecycle operations
#[async_trait]
pub trait StoreAdmin: Send + Sync {
    /// Remove every account, post, like and comment
    async fn reset(&self) -> StoreResult<()>;
}

/// Storage backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Postgres => "postgres",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StorageBackend::Postgres),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

/// The store handles shared by the services, all backed by one instance
#[derive(Clone)]
pub struct Stores {
    pub accounts: Arc<dyn AccountStore>,
    pub posts: Arc<dyn PostStore>,
    pub admin: Arc<dyn StoreAdmin>,
    pub backend: StorageBackend,
}

impl Stores {
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            accounts: store.clone(),
            posts: store.clone(),
            admin: store,
            backend: StorageBackend::Memory,
        }
    }

    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            accounts: store.clone(),
            posts: store.clone(),
            admin: store,
            backend: StorageBackend::Postgres,
        }
    }
}
