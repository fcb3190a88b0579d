use super::{AccountStore, PostStore, StoreAdmin, StoreError, StoreResult};
use crate::models::{
    Account, CommentRecord, LikeToggle, NewAccount, NewComment, NewPost, PostQuery, PostRecord,
    PostType, ProfileUpdate, StoreStats,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Row};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, profession, company, avatar, \
                               bio, location, website, connections, followers, following, \
                               created_at, updated_at";

const POST_COLUMNS: &str =
    "id, seq, author_id, content, image, shares, tags, post_type, created_at, updated_at";

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

/// PostgreSQL-backed store
///
/// Likes and comments live in their own tables. Toggles and appends take a
/// row lock on the owning post first, so writers on one post serialize.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct PostRow {
    id: Uuid,
    seq: i64,
    author_id: Uuid,
    content: String,
    image: Option<String>,
    shares: Vec<Uuid>,
    tags: Vec<String>,
    post_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_record(
        self,
        likes: Vec<Uuid>,
        comments: Vec<CommentRecord>,
    ) -> StoreResult<PostRecord> {
        let post_type: PostType = self.post_type.parse().map_err(StoreError::Internal)?;

        Ok(PostRecord {
            id: self.id,
            seq: self.seq,
            author_id: self.author_id,
            content: self.content,
            image: self.image,
            likes,
            shares: self.shares,
            tags: self.tags,
            post_type,
            comments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn map_unique_violation(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Database(err),
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = create_pool(database_url, max_connections).await?;
        let store = Self::new(pool);
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Attach likes and comments to post rows, preserving row order
    async fn hydrate(&self, rows: Vec<PostRow>) -> StoreResult<Vec<PostRecord>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();

        let like_rows = sqlx::query(
            r#"
            SELECT post_id, user_id
            FROM post_likes
            WHERE post_id = ANY($1)
            ORDER BY seq ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut likes: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in like_rows {
            let post_id: Uuid = row.get("post_id");
            likes.entry(post_id).or_default().push(row.get("user_id"));
        }

        let comment_rows = sqlx::query_as::<_, CommentRecord>(
            r#"
            SELECT id, post_id, user_id, content, created_at
            FROM post_comments
            WHERE post_id = ANY($1)
            ORDER BY seq ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut comments: HashMap<Uuid, Vec<CommentRecord>> = HashMap::new();
        for comment in comment_rows {
            comments.entry(comment.post_id).or_default().push(comment);
        }

        rows.into_iter()
            .map(|row| {
                let id = row.id;
                row.into_record(
                    likes.remove(&id).unwrap_or_default(),
                    comments.remove(&id).unwrap_or_default(),
                )
            })
            .collect()
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn insert_account(&self, new: NewAccount) -> StoreResult<Account> {
        let query = format!(
            r#"
            INSERT INTO accounts (id, name, email, password_hash, profession, company, avatar)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Account>(&query)
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(new.email.to_lowercase())
            .bind(&new.password_hash)
            .bind(&new.profession)
            .bind(&new.company)
            .bind(&new.avatar)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)
    }

    async fn find_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");

        Ok(sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE LOWER(email) = LOWER($1)");

        Ok(sqlx::query_as::<_, Account>(&query)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_accounts(&self, ids: &[Uuid]) -> StoreResult<Vec<Account>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ANY($1)");

        Ok(sqlx::query_as::<_, Account>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_accounts(&self, limit: usize) -> StoreResult<Vec<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY seq ASC LIMIT $1");

        Ok(sqlx::query_as::<_, Account>(&query)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_account(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<Account>> {
        let query = format!(
            r#"
            UPDATE accounts
            SET name = COALESCE($2, name),
                profession = COALESCE($3, profession),
                company = COALESCE($4, company),
                location = COALESCE($5, location),
                website = COALESCE($6, website),
                bio = COALESCE($7, bio),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );

        Ok(sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .bind(update.name.as_deref())
            .bind(update.profession.as_deref())
            .bind(update.company.as_deref())
            .bind(update.location.as_deref())
            .bind(update.website.as_deref())
            .bind(update.bio.as_deref())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn count_accounts(&self) -> StoreResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, new: NewPost) -> StoreResult<PostRecord> {
        let query = format!(
            r#"
            INSERT INTO posts (id, author_id, content, image, tags, post_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {POST_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&query)
            .bind(Uuid::new_v4())
            .bind(new.author_id)
            .bind(&new.content)
            .bind(new.image.as_deref())
            .bind(&new.tags)
            .bind(new.post_type.as_str())
            .fetch_one(&self.pool)
            .await?;

        row.into_record(Vec::new(), Vec::new())
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<PostRecord>> {
        let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");

        let row = sqlx::query_as::<_, PostRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn post_exists(&self, id: Uuid) -> StoreResult<bool> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn list_posts(&self, query: PostQuery) -> StoreResult<Vec<PostRecord>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE ($1::uuid IS NULL OR author_id = $1)
            ORDER BY created_at DESC, seq DESC
            LIMIT $2::bigint
            "#
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(query.author_id)
            .bind(query.limit.map(|limit| limit as i64))
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> StoreResult<Option<LikeToggle>> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let liked = removed == 0;
        if liked {
            sqlx::query("INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2)")
                .bind(post_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE posts SET updated_at = NOW() WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(LikeToggle {
            liked,
            likes_count: count as usize,
        }))
    }

    async fn append_comment(
        &self,
        post_id: Uuid,
        comment: NewComment,
    ) -> StoreResult<Option<(CommentRecord, usize)>> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let record = sqlx::query_as::<_, CommentRecord>(
            r#"
            INSERT INTO post_comments (id, post_id, user_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, user_id, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(comment.user_id)
        .bind(&comment.content)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE posts SET updated_at = NOW() WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some((record, count as usize)))
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM posts) AS posts,
                (SELECT COUNT(*) FROM post_likes) AS likes,
                (SELECT COUNT(*) FROM post_comments) AS comments
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStats {
            posts: row.get::<i64, _>("posts") as usize,
            total_likes: row.get::<i64, _>("likes") as usize,
            total_comments: row.get::<i64, _>("comments") as usize,
        })
    }
}

#[async_trait]
impl StoreAdmin for PgStore {
    async fn reset(&self) -> StoreResult<()> {
        sqlx::query("TRUNCATE post_comments, post_likes, posts, accounts RESTART IDENTITY")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
