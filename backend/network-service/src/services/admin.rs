/// Store lifecycle: reset and demo dataset
use super::accounts::{AccountService, Registration};
use super::posts::{PostDraft, PostService};
use crate::db::StoreAdmin;
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

pub const DEMO_EMAIL: &str = "demo@aura.dev";
pub const DEMO_PASSWORD: &str = "password123";

const WELCOME_POSTS: [(&str, [&str; 2]); 3] = [
    (
        "🚀 Welcome to Aura! This professional network is now live and ready for connections.",
        ["welcome", "announcement"],
    ),
    (
        "💼 Building meaningful professional relationships is key to career growth. Excited to see this community grow!",
        ["career", "networking"],
    ),
    (
        "🌟 Just deployed the backend API successfully! The platform is now fully functional with user authentication and post management.",
        ["development", "update"],
    ),
];

/// Row counts after a seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub posts: usize,
}

#[derive(Clone)]
pub struct AdminService {
    admin: Arc<dyn StoreAdmin>,
    accounts: AccountService,
    posts: PostService,
}

impl AdminService {
    pub fn new(admin: Arc<dyn StoreAdmin>, accounts: AccountService, posts: PostService) -> Self {
        Self {
            admin,
            accounts,
            posts,
        }
    }

    /// Wipe all state and reseed the demo dataset
    pub async fn reset(&self) -> Result<SeedSummary> {
        self.admin.reset().await?;
        tracing::warn!("store reset");
        self.seed_demo().await
    }

    /// Demo account, three welcome posts, one like and one comment
    pub async fn seed_demo(&self) -> Result<SeedSummary> {
        let demo = self
            .accounts
            .register(Registration {
                name: "Demo User".to_string(),
                email: DEMO_EMAIL.to_string(),
                password: DEMO_PASSWORD.to_string(),
                profession: "Full Stack Developer".to_string(),
                company: Some("Aura Inc.".to_string()),
            })
            .await?;

        let mut first_post = None;
        for (content, tags) in WELCOME_POSTS {
            let post = self
                .posts
                .create(
                    demo.id,
                    PostDraft {
                        content: Some(content.to_string()),
                        tags: Some(tags.iter().map(|t| t.to_string()).collect()),
                        ..Default::default()
                    },
                )
                .await?;
            first_post.get_or_insert(post.id);
        }

        if let Some(post_id) = first_post {
            self.posts.toggle_like(post_id, demo.id).await?;
            self.posts
                .add_comment(post_id, demo.id, "Excited to be part of this amazing platform!")
                .await?;
        }

        let summary = SeedSummary {
            users: self.accounts.count().await?,
            posts: self.posts.stats().await?.posts,
        };
        tracing::info!(users = summary.users, posts = summary.posts, "demo data seeded");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Stores;
    use crate::security::JwtKeys;

    fn admin() -> AdminService {
        let stores = Stores::memory();
        let keys = Arc::new(JwtKeys::from_secret("admin-service-test-secret-0123456789", 1).unwrap());
        let accounts = AccountService::new(stores.accounts.clone(), keys);
        let posts = PostService::new(stores.posts.clone(), stores.accounts.clone());
        AdminService::new(stores.admin.clone(), accounts, posts)
    }

    #[tokio::test]
    async fn seed_creates_demo_dataset() {
        let admin = admin();
        let summary = admin.seed_demo().await.unwrap();

        assert_eq!(summary, SeedSummary { users: 1, posts: 3 });

        let stats = admin.posts.stats().await.unwrap();
        assert_eq!(stats.total_likes, 1);
        assert_eq!(stats.total_comments, 1);
    }

    #[tokio::test]
    async fn reset_is_repeatable() {
        let admin = admin();
        admin.seed_demo().await.unwrap();

        let summary = admin.reset().await.unwrap();
        assert_eq!(summary, SeedSummary { users: 1, posts: 3 });

        let session = admin
            .accounts
            .authenticate(crate::services::Credentials {
                email: Some(DEMO_EMAIL.into()),
                password: Some(DEMO_PASSWORD.into()),
            })
            .await
            .unwrap();
        assert_eq!(session.account.email, DEMO_EMAIL);
    }
}
