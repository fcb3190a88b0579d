use super::{AuthorSummary, CommenterSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Post type tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Post,
    Article,
    Achievement,
    Question,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Post => "post",
            PostType::Article => "article",
            PostType::Achievement => "achievement",
            PostType::Question => "question",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "post" => Ok(PostType::Post),
            "article" => Ok(PostType::Article),
            "achievement" => Ok(PostType::Achievement),
            "question" => Ok(PostType::Question),
            other => Err(format!("unknown post type: {other}")),
        }
    }
}

/// Stored post. Holds account ids only; summaries are resolved on read.
#[derive(Debug, Clone)]
pub struct PostRecord {
    pub id: Uuid,
    /// Insertion sequence, breaks ties between equal timestamps
    pub seq: i64,
    pub author_id: Uuid,
    pub content: String,
    pub image: Option<String>,
    /// Liker ids, each at most once, in like order
    pub likes: Vec<Uuid>,
    pub shares: Vec<Uuid>,
    pub tags: Vec<String>,
    pub post_type: PostType,
    /// Append order
    pub comments: Vec<CommentRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored comment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub content: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub post_type: PostType,
}

/// Validated input for a new comment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: Uuid,
    pub content: String,
}

/// Listing filter, newest first. `limit: None` returns every match.
#[derive(Debug, Clone, Copy)]
pub struct PostQuery {
    pub limit: Option<usize>,
    pub author_id: Option<Uuid>,
}

/// Outcome of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: usize,
}

/// Aggregate counters for the API index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub posts: usize,
    pub total_likes: usize,
    pub total_comments: usize,
}

/// Post read view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub content: String,
    pub image: Option<String>,
    pub author: AuthorSummary,
    pub likes: Vec<Uuid>,
    pub shares: Vec<Uuid>,
    pub comments: Vec<Comment>,
    pub tags: Vec<String>,
    pub post_type: PostType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment read view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: CommenterSummary,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_type_parses_case_insensitively() {
        assert_eq!("Article".parse::<PostType>().unwrap(), PostType::Article);
        assert_eq!(" question ".parse::<PostType>().unwrap(), PostType::Question);
        assert!("poll".parse::<PostType>().is_err());
    }

    #[test]
    fn post_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(PostType::Achievement).unwrap(),
            "achievement"
        );
        assert_eq!(PostType::default(), PostType::Post);
    }

    #[test]
    fn like_toggle_uses_camel_case() {
        let json = serde_json::to_value(LikeToggle {
            liked: true,
            likes_count: 3,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"liked": true, "likesCount": 3}));
    }
}
