use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::{
    password::{hash_password_blocking, verify_password_blocking},
    repo::UserStore,
    repo_types::User,
};
use crate::db::StoreError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("{0}")]
    Validation(&'static str),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<StoreError> for CredentialError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(_) => CredentialError::DuplicateEmail,
            StoreError::Other(e) => CredentialError::Store(e),
        }
    }
}

/// Owns user credentials: registration and login checks on top of a [`UserStore`].
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    // Compared against when the email is unknown so both login failures cost one hash.
    dummy_hash: Arc<OnceCell<String>>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            users,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    async fn dummy_hash(&self) -> anyhow::Result<&str> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| hash_password_blocking("not-a-real-password".into()))
            .await?;
        Ok(hash.as_str())
    }

    /// Registers a new user, rejecting an email that is already taken.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, CredentialError> {
        let (email, hash) = self.prepare(email, password).await?;

        if self.users.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(CredentialError::DuplicateEmail);
        }

        // A concurrent registration can still win the race; the store's
        // unique index rejects it and that surfaces as DuplicateEmail too.
        Ok(self.users.create(&email, &hash).await?)
    }

    /// Creates a user without the existence pre-check; only the store's
    /// unique constraint guards against duplicates.
    pub async fn create_user(&self, email: &str, password: &str) -> Result<User, CredentialError> {
        let (email, hash) = self.prepare(email, password).await?;
        Ok(self.users.create(&email, &hash).await?)
    }

    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, CredentialError> {
        let email = normalize_email(email);
        let user = self.users.find_by_email(&email).await?;

        let Some(user) = user else {
            let dummy = self.dummy_hash().await?.to_owned();
            let _ = verify_password_blocking(password.to_owned(), dummy).await;
            debug!(email = %email, "login unknown email");
            return Err(CredentialError::InvalidCredentials);
        };

        let ok = verify_password_blocking(password.to_owned(), user.password_hash.clone()).await?;
        if !ok {
            debug!(user_id = %user.id, "login invalid password");
            return Err(CredentialError::InvalidCredentials);
        }
        Ok(user)
    }

    async fn prepare(&self, email: &str, password: &str) -> Result<(String, String), CredentialError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(CredentialError::Validation("Invalid email"));
        }
        if password.is_empty() {
            return Err(CredentialError::Validation("Password must not be empty"));
        }
        let hash = hash_password_blocking(password.to_owned()).await?;
        Ok((email, hash))
    }
}
