use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::UserRecord;
use crate::store::{paths, KeyedStore};

const MIN_PASSWORD_LEN: usize = 6;

/// An authenticated session: who it belongs to and how to prove it
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub uid: String,
    pub token: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionDoc {
    uid: String,
    created_at: chrono::DateTime<Utc>,
}

/// Identity provider backed by the keyed store
///
/// Thin adapter, not an auth protocol: argon2-hashed passwords in the user
/// record, opaque UUID bearer tokens under `sessions/{token}`. Authorization
/// checks elsewhere in the app are advisory; a real deployment pairs this
/// with store-side access rules.
pub struct AuthService {
    store: Arc<dyn KeyedStore>,
}

impl AuthService {
    pub fn new(store: Arc<dyn KeyedStore>) -> Self {
        Self { store }
    }

    /// Registers a new account and opens a session
    pub async fn register(&self, email: &str, password: &str, name: &str) -> AppResult<Session> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::InvalidInput("Email invalid".to_string()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::WeakPassword);
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailTaken);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        let uid = Uuid::new_v4().to_string();
        let record = UserRecord {
            email,
            name: name.trim().to_string(),
            password_hash,
            created_at: Utc::now(),
        };
        self.store
            .set(&paths::user(&uid), serde_json::to_value(&record)?)
            .await?;

        tracing::info!(uid = %uid, "User registered");
        self.open_session(&uid, &record.name).await
    }

    /// Verifies credentials and opens a session
    ///
    /// Unknown email and wrong password collapse into one error so the
    /// response does not reveal which accounts exist.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Session> {
        let email = email.trim().to_lowercase();
        let (uid, record) = self
            .find_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let parsed_hash = PasswordHash::new(&record.password_hash)
            .map_err(|e| AppError::Internal(format!("Stored hash unreadable: {}", e)))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::InvalidCredentials)?;

        tracing::info!(uid = %uid, "User logged in");
        self.open_session(&uid, &record.name).await
    }

    /// Deletes the session; an unknown token is already logged out
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.store.remove(&paths::session(token)).await
    }

    /// Resolves a bearer token to the owning user id
    pub async fn authenticate(&self, token: &str) -> AppResult<String> {
        let doc = self
            .store
            .get(&paths::session(token))
            .await?
            .ok_or_else(|| AppError::Unauthorized("Sesiune expirată".to_string()))?;
        let session: SessionDoc = serde_json::from_value(doc)?;
        Ok(session.uid)
    }

    async fn open_session(&self, uid: &str, name: &str) -> AppResult<Session> {
        let token = Uuid::new_v4().to_string();
        let doc = SessionDoc {
            uid: uid.to_string(),
            created_at: Utc::now(),
        };
        self.store
            .set(&paths::session(&token), serde_json::to_value(&doc)?)
            .await?;
        Ok(Session {
            uid: uid.to_string(),
            token,
            name: name.to_string(),
        })
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<(String, UserRecord)>> {
        for (path, doc) in self.store.list(paths::USERS).await? {
            let record: UserRecord = serde_json::from_value(doc)?;
            if record.email == email {
                let uid = path
                    .strip_prefix(paths::USERS)
                    .unwrap_or(&path)
                    .to_string();
                return Ok(Some((uid, record)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let auth = service();
        let session = auth
            .register("ana@example.com", "parola123", "Ana")
            .await
            .unwrap();
        assert_eq!(session.name, "Ana");

        let login = auth.login("ana@example.com", "parola123").await.unwrap();
        assert_eq!(login.uid, session.uid);
        assert_ne!(login.token, session.token);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let auth = service();
        auth.register("ana@example.com", "parola123", "Ana")
            .await
            .unwrap();
        let err = auth
            .register("Ana@Example.com", "altaparola", "Ana 2")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailTaken));
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let auth = service();
        let err = auth.register("ana@example.com", "abc", "Ana").await.unwrap_err();
        assert!(matches!(err, AppError::WeakPassword));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let auth = service();
        auth.register("ana@example.com", "parola123", "Ana")
            .await
            .unwrap();
        let err = auth.login("ana@example.com", "gresit").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_unknown_email_same_error_as_wrong_password() {
        let auth = service();
        let err = auth.login("nimeni@example.com", "parola123").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_and_logout() {
        let auth = service();
        let session = auth
            .register("ana@example.com", "parola123", "Ana")
            .await
            .unwrap();

        let uid = auth.authenticate(&session.token).await.unwrap();
        assert_eq!(uid, session.uid);

        auth.logout(&session.token).await.unwrap();
        assert!(auth.authenticate(&session.token).await.is_err());
    }
}
