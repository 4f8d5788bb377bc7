//! # Auth Module
//!
//! User registration and login: Argon2id password storage, HS256 access
//! tokens, and the workflow that ties them to the document store.

pub mod crypto;
pub mod errors;
pub mod jwt;
pub mod service;
pub mod user;

pub use errors::{AuthError, AuthResult, EMAIL_IN_USE_MESSAGE, INVALID_CREDENTIALS_MESSAGE};
pub use jwt::{JwtClaims, JwtConfig, JwtManager, TokenResponse, MAX_TOKEN_TTL_MINUTES};
pub use service::{AuthWorkflow, Stage};
pub use user::{StoredUserRepository, User, UserRepository, UserResponse};
