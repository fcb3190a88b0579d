use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_COMPANY: &str = "Not specified";
pub const DEFAULT_AVATAR: &str = "👨‍💼";

/// Account model - a registered member
///
/// `password_hash` is never serialized; every API response that carries an
/// account goes through this type.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profession: String,
    pub company: String,
    pub avatar: String,
    pub bio: String,
    pub location: String,
    pub website: String,
    /// Relation sets; no route mutates them yet
    pub connections: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Apply a partial profile update in place. Absent fields are untouched.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(profession) = &update.profession {
            self.profession = profession.clone();
        }
        if let Some(company) = &update.company {
            self.company = company.clone();
        }
        if let Some(location) = &update.location {
            self.location = location.clone();
        }
        if let Some(website) = &update.website {
            self.website = website.clone();
        }
        if let Some(bio) = &update.bio {
            self.bio = bio.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Fields required to persist a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    /// Already lower-cased
    pub email: String,
    pub password_hash: String,
    pub profession: String,
    pub company: String,
    pub avatar: String,
}

/// Partial profile update (`PATCH /api/users/{id}`)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Profession must be 1-100 characters"))]
    pub profession: Option<String>,
    #[validate(length(max = 100, message = "Company cannot exceed 100 characters"))]
    pub company: Option<String>,
    #[validate(length(max = 100, message = "Location cannot exceed 100 characters"))]
    pub location: Option<String>,
    #[validate(length(max = 200, message = "Website cannot exceed 200 characters"))]
    pub website: Option<String>,
    #[validate(length(max = 500, message = "Bio cannot exceed 500 characters"))]
    pub bio: Option<String>,
}

impl ProfileUpdate {
    /// Trim every present field
    pub fn normalized(self) -> Self {
        fn trim(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string())
        }

        Self {
            name: trim(self.name),
            profession: trim(self.profession),
            company: trim(self.company),
            location: trim(self.location),
            website: trim(self.website),
            bio: trim(self.bio),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.profession.is_none()
            && self.company.is_none()
            && self.location.is_none()
            && self.website.is_none()
            && self.bio.is_none()
    }
}

/// Author fields embedded in a post response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub profession: String,
    pub company: String,
    pub avatar: String,
}

impl From<&Account> for AuthorSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            profession: account.profession.clone(),
            company: account.company.clone(),
            avatar: account.avatar.clone(),
        }
    }
}

/// Commenter fields embedded in a comment response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommenterSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub profession: String,
    pub avatar: String,
}

impl From<&Account> for CommenterSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            profession: account.profession.clone(),
            avatar: account.avatar.clone(),
        }
    }
}
