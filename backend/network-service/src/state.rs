use crate::db::{StorageBackend, Stores};
use crate::security::JwtKeys;
use crate::services::{AccountService, AdminService, PostService};
use std::sync::Arc;
use std::time::Instant;

/// Shared handler state, one per process
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub posts: PostService,
    pub admin: AdminService,
    pub backend: StorageBackend,
    pub admin_token: Option<String>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(stores: Stores, keys: Arc<JwtKeys>, admin_token: Option<String>) -> Self {
        let accounts = AccountService::new(stores.accounts.clone(), keys);
        let posts = PostService::new(stores.posts.clone(), stores.accounts.clone());
        let admin = AdminService::new(stores.admin.clone(), accounts.clone(), posts.clone());

        Self {
            accounts,
            posts,
            admin,
            backend: stores.backend,
            admin_token,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
