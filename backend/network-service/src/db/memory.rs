use super::{AccountStore, PostStore, StoreAdmin, StoreError, StoreResult};
use crate::models::{
    Account, CommentRecord, LikeToggle, NewAccount, NewComment, NewPost, PostQuery, PostRecord,
    ProfileUpdate, StoreStats,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

struct AccountSlot {
    seq: i64,
    account: Account,
}

/// Process-local store
///
/// Every post mutation runs while holding the post's shard lock
/// (`get_mut`), so toggles and appends on one post never interleave.
/// Email uniqueness is enforced through the `entry` API on a lower-cased
/// index, which locks the email's shard across check and insert.
#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<Uuid, AccountSlot>,
    emails: DashMap<String, Uuid>,
    posts: DashMap<Uuid, PostRecord>,
    seq: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> i64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_account(&self, new: NewAccount) -> StoreResult<Account> {
        let email = new.email.to_lowercase();

        let slot = self.emails.entry(email.clone());
        // An index entry whose account is gone was left behind by a reset
        if let Entry::Occupied(existing) = &slot {
            if self.accounts.contains_key(existing.get()) {
                return Err(StoreError::DuplicateEmail);
            }
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: new.name,
            email,
            password_hash: new.password_hash,
            profession: new.profession,
            company: new.company,
            avatar: new.avatar,
            bio: String::new(),
            location: String::new(),
            website: String::new(),
            connections: Vec::new(),
            followers: Vec::new(),
            following: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.accounts.insert(
            account.id,
            AccountSlot {
                seq: self.next_seq(),
                account: account.clone(),
            },
        );
        match slot {
            Entry::Occupied(mut stale) => {
                stale.insert(account.id);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(account.id);
            }
        }

        Ok(account)
    }

    async fn find_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.accounts.get(&id).map(|slot| slot.account.clone()))
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let id = match self.emails.get(&email.trim().to_lowercase()) {
            Some(id) => *id,
            None => return Ok(None),
        };

        self.find_account(id).await
    }

    async fn find_accounts(&self, ids: &[Uuid]) -> StoreResult<Vec<Account>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.accounts.get(id).map(|slot| slot.account.clone()))
            .collect())
    }

    async fn list_accounts(&self, limit: usize) -> StoreResult<Vec<Account>> {
        let mut slots: Vec<(i64, Account)> = self
            .accounts
            .iter()
            .map(|slot| (slot.seq, slot.account.clone()))
            .collect();
        slots.sort_by_key(|(seq, _)| *seq);

        Ok(slots
            .into_iter()
            .take(limit)
            .map(|(_, account)| account)
            .collect())
    }

    async fn update_account(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<Account>> {
        Ok(self.accounts.get_mut(&id).map(|mut slot| {
            slot.account.apply(update);
            slot.account.clone()
        }))
    }

    async fn count_accounts(&self) -> StoreResult<usize> {
        Ok(self.accounts.len())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, new: NewPost) -> StoreResult<PostRecord> {
        let now = Utc::now();
        let record = PostRecord {
            id: Uuid::new_v4(),
            seq: self.next_seq(),
            author_id: new.author_id,
            content: new.content,
            image: new.image,
            likes: Vec::new(),
            shares: Vec::new(),
            tags: new.tags,
            post_type: new.post_type,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.posts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<PostRecord>> {
        Ok(self.posts.get(&id).map(|post| post.clone()))
    }

    async fn post_exists(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.posts.contains_key(&id))
    }

    async fn list_posts(&self, query: PostQuery) -> StoreResult<Vec<PostRecord>> {
        let mut posts: Vec<PostRecord> = self
            .posts
            .iter()
            .filter(|post| query.author_id.map_or(true, |author| post.author_id == author))
            .map(|post| post.clone())
            .collect();

        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        if let Some(limit) = query.limit {
            posts.truncate(limit);
        }

        Ok(posts)
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> StoreResult<Option<LikeToggle>> {
        let Some(mut post) = self.posts.get_mut(&post_id) else {
            return Ok(None);
        };

        let liked = match post.likes.iter().position(|id| *id == user_id) {
            Some(index) => {
                post.likes.remove(index);
                false
            }
            None => {
                post.likes.push(user_id);
                true
            }
        };
        post.updated_at = Utc::now();

        Ok(Some(LikeToggle {
            liked,
            likes_count: post.likes.len(),
        }))
    }

    async fn append_comment(
        &self,
        post_id: Uuid,
        comment: NewComment,
    ) -> StoreResult<Option<(CommentRecord, usize)>> {
        let Some(mut post) = self.posts.get_mut(&post_id) else {
            return Ok(None);
        };

        let record = CommentRecord {
            id: Uuid::new_v4(),
            post_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: Utc::now(),
        };
        post.comments.push(record.clone());
        post.updated_at = record.created_at;

        Ok(Some((record, post.comments.len())))
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        Ok(self
            .posts
            .iter()
            .fold(StoreStats::default(), |mut stats, post| {
                stats.posts += 1;
                stats.total_likes += post.likes.len();
                stats.total_comments += post.comments.len();
                stats
            }))
    }
}

#[async_trait]
impl StoreAdmin for MemoryStore {
    async fn reset(&self) -> StoreResult<()> {
        self.posts.clear();
        self.accounts.clear();
        self.emails.clear();
        Ok(())
    }
}
