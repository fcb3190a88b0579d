/// Business logic over the storage traits
pub mod accounts;
pub mod admin;
pub mod posts;

pub use accounts::{AccountService, Credentials, Registration, Session, MAX_ACCOUNT_LIST};
pub use admin::{AdminService, SeedSummary, DEMO_EMAIL, DEMO_PASSWORD};
pub use posts::{CommentAdded, PostDraft, PostService, MAX_FEED_LIMIT};
