/// Post service - feed, likes and comments
///
/// Records keep account ids only. Every read resolves author and commenter
/// summaries from the account store, so profile edits show up on older
/// posts without touching them.
use crate::db::{AccountStore, PostStore};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{
    Account, AuthorSummary, Comment, CommentRecord, CommenterSummary, LikeToggle, NewComment,
    NewPost, Post, PostQuery, PostRecord, PostType, StoreStats, DEFAULT_AVATAR,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Feed page ceiling
pub const MAX_FEED_LIMIT: usize = 50;
pub const MAX_CONTENT_LEN: usize = 2000;
pub const MAX_COMMENT_LEN: usize = 500;
pub const DEFAULT_TAG: &str = "general";

const UNKNOWN_MEMBER: &str = "Unknown member";

/// Unvalidated post input
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub content: Option<String>,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub post_type: Option<PostType>,
}

/// Result of `add_comment`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAdded {
    pub comment: Comment,
    pub comments_count: usize,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
    accounts: Arc<dyn AccountStore>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostStore>, accounts: Arc<dyn AccountStore>) -> Self {
        Self { posts, accounts }
    }

    /// Create a post. Needs text or an image; tags default to `general`.
    pub async fn create(&self, author_id: Uuid, draft: PostDraft) -> Result<Post> {
        let author = self
            .accounts
            .find_account(author_id)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        let content = draft
            .content
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        let image = draft
            .image
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty());

        if content.is_empty() && image.is_none() {
            return Err(AppError::EmptyContent("Post"));
        }
        if content.chars().count() > MAX_CONTENT_LEN {
            return Err(AppError::Validation(format!(
                "Post cannot exceed {MAX_CONTENT_LEN} characters"
            )));
        }

        let tags = draft
            .tags
            .map(|tags| {
                tags.into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|tags| !tags.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_TAG.to_string()]);

        let record = self
            .posts
            .insert_post(NewPost {
                author_id,
                content,
                image,
                tags,
                post_type: draft.post_type.unwrap_or_default(),
            })
            .await?;

        metrics::record_post_created();
        tracing::info!(post_id = %record.id, author_id = %author_id, "post created");

        let directory = HashMap::from([(author.id, author)]);
        Ok(render_post(record, &directory))
    }

    /// Newest first, at most [`MAX_FEED_LIMIT`]
    pub async fn list(&self, limit: usize) -> Result<Vec<Post>> {
        self.query(PostQuery {
            limit: Some(limit.min(MAX_FEED_LIMIT)),
            author_id: None,
        })
        .await
    }

    /// Every post by one author, same ordering as `list`. Not capped.
    pub async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
        self.query(PostQuery {
            limit: None,
            author_id: Some(author_id),
        })
        .await
    }

    /// Missing post wins over missing user
    async fn require_post_and_user(&self, post_id: Uuid, user_id: Uuid) -> Result<Account> {
        if !self.posts.post_exists(post_id).await? {
            return Err(AppError::post_not_found());
        }

        self.accounts
            .find_account(user_id)
            .await?
            .ok_or_else(AppError::user_not_found)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Post> {
        let record = self
            .posts
            .find_post(id)
            .await?
            .ok_or_else(AppError::post_not_found)?;

        let mut posts = self.render(vec![record]).await?;
        posts.pop().ok_or_else(AppError::post_not_found)
    }

    /// Flip the user's like on a post
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeToggle> {
        self.require_post_and_user(post_id, user_id).await?;

        let toggle = self
            .posts
            .toggle_like(post_id, user_id)
            .await?
            .ok_or_else(AppError::post_not_found)?;

        metrics::record_like_toggled(toggle.liked);
        tracing::debug!(
            post_id = %post_id,
            user_id = %user_id,
            liked = toggle.liked,
            likes = toggle.likes_count,
            "like toggled"
        );
        Ok(toggle)
    }

    /// Append a comment and return it with the post's new comment count
    pub async fn add_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<CommentAdded> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::EmptyContent("Comment"));
        }
        if content.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::Validation(format!(
                "Comment cannot exceed {MAX_COMMENT_LEN} characters"
            )));
        }

        let commenter = self.require_post_and_user(post_id, user_id).await?;

        let (record, comments_count) = self
            .posts
            .append_comment(
                post_id,
                NewComment {
                    user_id,
                    content: content.to_string(),
                },
            )
            .await?
            .ok_or_else(AppError::post_not_found)?;

        metrics::record_comment_created();
        tracing::info!(post_id = %post_id, comment_id = %record.id, "comment added");

        let directory = HashMap::from([(commenter.id, commenter)]);
        Ok(CommentAdded {
            comment: render_comment(record, &directory),
            comments_count,
        })
    }

    /// Comments of one post in insertion order
    pub async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let record = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or_else(AppError::post_not_found)?;

        let ids: Vec<Uuid> = record.comments.iter().map(|c| c.user_id).collect();
        let directory = self.directory(ids).await?;

        Ok(record
            .comments
            .into_iter()
            .map(|c| render_comment(c, &directory))
            .collect())
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(self.posts.stats().await?)
    }

    async fn query(&self, query: PostQuery) -> Result<Vec<Post>> {
        let records = self.posts.list_posts(query).await?;
        self.render(records).await
    }

    async fn render(&self, records: Vec<PostRecord>) -> Result<Vec<Post>> {
        let ids = records.iter().flat_map(|post| {
            std::iter::once(post.author_id).chain(post.comments.iter().map(|c| c.user_id))
        });
        let directory = self.directory(ids.collect()).await?;

        Ok(records
            .into_iter()
            .map(|record| render_post(record, &directory))
            .collect())
    }

    /// Batch-load the accounts behind a set of ids
    async fn directory(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, Account>> {
        let unique: Vec<Uuid> = ids
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if unique.is_empty() {
            return Ok(HashMap::new());
        }

        let accounts = self.accounts.find_accounts(&unique).await?;
        Ok(accounts.into_iter().map(|a| (a.id, a)).collect())
    }
}

fn render_post(record: PostRecord, directory: &HashMap<Uuid, Account>) -> Post {
    let author = match directory.get(&record.author_id) {
        Some(account) => AuthorSummary::from(account),
        None => {
            tracing::warn!(post_id = %record.id, author_id = %record.author_id, "post author missing");
            AuthorSummary {
                id: record.author_id,
                name: UNKNOWN_MEMBER.to_string(),
                profession: String::new(),
                company: String::new(),
                avatar: DEFAULT_AVATAR.to_string(),
            }
        }
    };

    Post {
        id: record.id,
        content: record.content,
        image: record.image,
        author,
        likes: record.likes,
        shares: record.shares,
        comments: record
            .comments
            .into_iter()
            .map(|c| render_comment(c, directory))
            .collect(),
        tags: record.tags,
        post_type: record.post_type,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

fn render_comment(record: CommentRecord, directory: &HashMap<Uuid, Account>) -> Comment {
    let user = match directory.get(&record.user_id) {
        Some(account) => CommenterSummary::from(account),
        None => CommenterSummary {
            id: record.user_id,
            name: UNKNOWN_MEMBER.to_string(),
            profession: String::new(),
            avatar: DEFAULT_AVATAR.to_string(),
        },
    };

    Comment {
        id: record.id,
        user,
        content: record.content,
        created_at: record.created_at,
    }
}
