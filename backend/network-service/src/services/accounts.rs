/// Account service - registration, login and profile management
use crate::db::AccountStore;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{Account, NewAccount, ProfileUpdate, DEFAULT_AVATAR, DEFAULT_COMPANY};
use crate::security::{hash_password, verify_against_dummy, verify_password, JwtKeys};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Largest page `list` will return
pub const MAX_ACCOUNT_LIST: usize = 20;

const MISSING_CREDENTIALS: &str = "Please provide email and password";

/// Registration input (`POST /api/auth/register`)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Registration {
    #[validate(length(min = 1, max = 50, message = "Please provide your full name (max 50 characters)"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Please provide your profession"))]
    pub profession: String,
    #[validate(length(max = 100, message = "Company cannot exceed 100 characters"))]
    pub company: Option<String>,
}

impl Registration {
    /// Trim text fields and lower-case the email. The password is left alone.
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password,
            profession: self.profession.trim().to_string(),
            company: self
                .company
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        }
    }
}

/// Login input (`POST /api/auth/login`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// An authenticated account plus its bearer token
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub account: Account,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    keys: Arc<JwtKeys>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, keys: Arc<JwtKeys>) -> Self {
        Self { store, keys }
    }

    /// Create an account. The credential is stored as an Argon2id hash.
    pub async fn register(&self, registration: Registration) -> Result<Account> {
        let registration = registration.normalized();
        if let Err(errors) = registration.validate() {
            metrics::record_auth_attempt("register_rejected");
            return Err(errors.into());
        }

        let password_hash = hash_password(&registration.password)?;
        let new = NewAccount {
            name: registration.name,
            email: registration.email,
            password_hash,
            profession: registration.profession,
            company: registration
                .company
                .unwrap_or_else(|| DEFAULT_COMPANY.to_string()),
            avatar: DEFAULT_AVATAR.to_string(),
        };

        let account = match self.store.insert_account(new).await {
            Ok(account) => account,
            Err(err) => {
                metrics::record_auth_attempt("register_rejected");
                return Err(err.into());
            }
        };

        metrics::record_auth_attempt("register_ok");
        tracing::info!(account_id = %account.id, "account registered");
        Ok(account)
    }

    /// Sign a token for an account
    pub fn issue_session(&self, account: Account) -> Result<Session> {
        let token = self
            .keys
            .generate_access_token(account.id, &account.email, &account.name)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Session { token, account })
    }

    /// Check credentials. Unknown email and wrong password fail identically.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<Session> {
        let email = credentials
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        let password = credentials.password.filter(|p| !p.is_empty());

        let (Some(email), Some(password)) = (email, password) else {
            return Err(AppError::Validation(MISSING_CREDENTIALS.to_string()));
        };

        let verified = match self.store.find_account_by_email(&email).await? {
            Some(account) => verify_password(&password, &account.password_hash).map(|_| account),
            None => {
                verify_against_dummy(&password);
                Err(AppError::InvalidCredentials)
            }
        };

        match verified {
            Ok(account) => {
                metrics::record_auth_attempt("login_ok");
                tracing::info!(account_id = %account.id, "login succeeded");
                self.issue_session(account)
            }
            Err(err) => {
                metrics::record_auth_attempt("login_failed");
                tracing::info!("login failed");
                Err(err)
            }
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Account> {
        self.store
            .find_account(id)
            .await?
            .ok_or_else(AppError::user_not_found)
    }

    /// Partial profile update. Posts and comments pick up the new fields on
    /// their next read.
    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Account> {
        let update = update.normalized();
        update.validate()?;

        let account = self
            .store
            .update_account(id, &update)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        tracing::info!(account_id = %id, "profile updated");
        Ok(account)
    }

    /// Oldest first, at most [`MAX_ACCOUNT_LIST`]
    pub async fn list(&self, limit: usize) -> Result<Vec<Account>> {
        Ok(self
            .store
            .list_accounts(limit.min(MAX_ACCOUNT_LIST))
            .await?)
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.store.count_accounts().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    const SECRET: &str = "account-service-test-secret-0123456789";

    fn service() -> AccountService {
        let keys = Arc::new(JwtKeys::from_secret(SECRET, 1).unwrap());
        AccountService::new(Arc::new(MemoryStore::new()), keys)
    }

    fn ava() -> Registration {
        Registration {
            name: "  Ava  ".into(),
            email: "Ava@Example.com".into(),
            password: "secret1".into(),
            profession: "Engineer".into(),
            company: None,
        }
    }

    #[tokio::test]
    async fn register_normalizes_and_hashes() {
        let service = service();
        let account = service.register(ava()).await.unwrap();

        assert_eq!(account.name, "Ava");
        assert_eq!(account.email, "ava@example.com");
        assert_eq!(account.company, DEFAULT_COMPANY);
        assert_eq!(account.avatar, DEFAULT_AVATAR);
        assert_ne!(account.password_hash, "secret1");
        assert!(account.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn duplicate_email_rejected_case_insensitively() {
        let service = service();
        service.register(ava()).await.unwrap();

        let mut again = ava();
        again.email = "AVA@EXAMPLE.COM".into();
        let err = service.register(again).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let service = service();

        let mut bad_email = ava();
        bad_email.email = "not-an-email".into();
        assert!(matches!(
            service.register(bad_email).await,
            Err(AppError::Validation(_))
        ));

        let mut short_password = ava();
        short_password.password = "12345".into();
        assert!(matches!(
            service.register(short_password).await,
            Err(AppError::Validation(_))
        ));

        let mut blank_name = ava();
        blank_name.name = "   ".into();
        assert!(matches!(
            service.register(blank_name).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn authenticate_issues_token_for_subject() {
        let service = service();
        let account = service.register(ava()).await.unwrap();

        let session = service
            .authenticate(Credentials {
                email: Some("ava@example.com".into()),
                password: Some("secret1".into()),
            })
            .await
            .unwrap();

        assert_eq!(session.account.id, account.id);
        assert_eq!(
            service.keys.get_user_id_from_token(&session.token).unwrap(),
            account.id
        );
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_fail_identically() {
        let service = service();
        service.register(ava()).await.unwrap();

        let wrong = service
            .authenticate(Credentials {
                email: Some("ava@example.com".into()),
                password: Some("nope-nope".into()),
            })
            .await
            .unwrap_err();
        let unknown = service
            .authenticate(Credentials {
                email: Some("ghost@example.com".into()),
                password: Some("secret1".into()),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn missing_credentials_is_validation_error() {
        let err = service()
            .authenticate(Credentials {
                email: Some("ava@example.com".into()),
                password: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(ref m) if m == MISSING_CREDENTIALS));
    }

    #[tokio::test]
    async fn update_profile_and_not_found() {
        let service = service();
        let account = service.register(ava()).await.unwrap();

        let updated = service
            .update_profile(
                account.id,
                ProfileUpdate {
                    bio: Some(" Building things ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.bio, "Building things");
        assert_eq!(updated.name, "Ava");

        let err = service
            .update_profile(Uuid::new_v4(), ProfileUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("User")));
    }

    #[tokio::test]
    async fn list_is_capped() {
        let service = service();
        for i in 0..22 {
            let mut reg = ava();
            reg.email = format!("user{i}@example.com");
            service.register(reg).await.unwrap();
        }

        assert_eq!(service.list(100).await.unwrap().len(), MAX_ACCOUNT_LIST);
        assert_eq!(service.count().await.unwrap(), 22);
    }
}
