//! # User Management
//!
//! User model and repository for authentication.
//! Users are stored as documents in the `users` collection with a unique
//! index on `email`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::crypto::{hash_password, verify_password};
use super::errors::{AuthError, AuthResult};
use crate::schema::USERS_COLLECTION;
use crate::storage::{Collection, StorageClient, StorageResult};

/// Stored user document
///
/// This is the persisted shape and includes the password hash. Use
/// [`UserResponse`] for anything that leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,

    /// User's email address (unique)
    pub email: String,

    /// Argon2id password hash (never plaintext)
    pub password_hash: String,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user, hashing the given password
    pub fn new(email: String, password: &str) -> AuthResult<Self> {
        let password_hash = hash_password(password)?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    /// Verify a password against this user's stored hash
    pub fn verify_password(&self, password: &str) -> AuthResult<bool> {
        verify_password(password, &self.password_hash)
    }

    fn to_document(&self) -> AuthResult<Value> {
        serde_json::to_value(self).map_err(|e| AuthError::CorruptRecord(e.to_string()))
    }

    fn from_document(document: Value) -> AuthResult<Self> {
        serde_json::from_value(document).map_err(|e| AuthError::CorruptRecord(e.to_string()))
    }
}

/// Public view of a registered user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// User repository trait
///
/// Abstracts storage operations for users.
pub trait UserRepository: Send + Sync {
    /// Find a user by their email
    fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Check if an email is already registered
    fn email_exists(&self, email: &str) -> AuthResult<bool> {
        Ok(self.find_by_email(email)?.is_some())
    }

    /// Create a new user
    ///
    /// Fails with a duplicate-key storage error when the email is taken,
    /// whether or not the caller looked it up first.
    fn create(&self, user: &User) -> AuthResult<()>;

    /// Number of registered users
    fn count(&self) -> AuthResult<usize>;
}

/// User repository over the document store
#[derive(Debug, Clone)]
pub struct StoredUserRepository {
    users: Collection,
}

impl StoredUserRepository {
    /// Open the `users` collection and declare its email index
    pub fn open(client: &StorageClient) -> StorageResult<Self> {
        let users = client.collection(USERS_COLLECTION, &["email"])?;
        Ok(Self { users })
    }
}

impl UserRepository for StoredUserRepository {
    fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        self.users
            .find_one("email", &Value::String(email.to_string()))?
            .map(User::from_document)
            .transpose()
    }

    fn create(&self, user: &User) -> AuthResult<()> {
        self.users.insert(user.to_document()?)?;
        Ok(())
    }

    fn count(&self) -> AuthResult<usize> {
        Ok(self.users.count()?)
    }
}
