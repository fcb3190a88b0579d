//! Domain models for accounts, posts and comments.
//!
//! `*Record` types are what the stores persist; `Post` and `Comment` are the
//! read views with author/commenter summaries resolved from live accounts.
mod account;
mod post;

pub use account::{
    Account, AuthorSummary, CommenterSummary, NewAccount, ProfileUpdate, DEFAULT_AVATAR,
    DEFAULT_COMPANY,
};
pub use post::{
    Comment, CommentRecord, LikeToggle, NewComment, NewPost, Post, PostQuery, PostRecord,
    PostType, StoreStats,
};
