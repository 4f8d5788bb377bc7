//! # Auth Workflow
//!
//! Registration, login and token verification over a [`UserRepository`].
//!
//! Each request walks `Idle → Validating → CheckingUniqueness → Persisting
//! → Responded`, or drops into `Failed` from whichever stage rejected it.
//! Transitions are logged at debug; the failing stage is logged at warn for
//! client errors and error for internal ones.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use super::errors::{AuthError, AuthResult};
use super::jwt::{JwtClaims, JwtConfig, JwtManager, TokenResponse};
use super::user::{StoredUserRepository, User, UserRepository, UserResponse};
use crate::api::ErrorSignal;
use crate::schema::{is_valid_email, login_schema, user_schema, RequestValidator, SchemaDescriptor};

/// Workflow stage, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Validating,
    CheckingUniqueness,
    Persisting,
    Responded,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Validating => "validating",
            Stage::CheckingUniqueness => "checking_uniqueness",
            Stage::Persisting => "persisting",
            Stage::Responded => "responded",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks the current stage of one request
struct Progress {
    operation: &'static str,
    stage: Stage,
}

impl Progress {
    fn start(operation: &'static str) -> Self {
        debug!(operation, stage = %Stage::Idle, "auth workflow started");
        Self {
            operation,
            stage: Stage::Idle,
        }
    }

    fn enter(&mut self, stage: Stage) {
        debug!(operation = self.operation, from = %self.stage, to = %stage, "auth stage");
        self.stage = stage;
    }

    fn finish<T>(mut self, result: AuthResult<T>) -> AuthResult<T> {
        match &result {
            Ok(_) => self.enter(Stage::Responded),
            Err(err) => {
                let failed_at = self.stage;
                self.enter(Stage::Failed);
                if err.is_client_error() {
                    warn!(operation = self.operation, stage = %failed_at, error = %err, "auth request rejected");
                } else {
                    error!(operation = self.operation, stage = %failed_at, error = %err, "auth request failed");
                }
                self.enter(Stage::Responded);
            }
        }
        result
    }
}

/// Registration and login over a user repository
pub struct AuthWorkflow<U: UserRepository = StoredUserRepository> {
    users: Arc<U>,
    jwt_manager: JwtManager,
    user_schema: SchemaDescriptor,
    login_schema: SchemaDescriptor,
}

impl<U: UserRepository> AuthWorkflow<U> {
    pub fn new(users: U, jwt_config: JwtConfig) -> Self {
        Self {
            users: Arc::new(users),
            jwt_manager: JwtManager::new(jwt_config),
            user_schema: user_schema(),
            login_schema: login_schema(),
        }
    }

    /// Register a new user from a request payload
    ///
    /// # Errors
    ///
    /// - 400 validation signal for missing/mistyped/short fields or a bad email
    /// - `EmailAlreadyExists` or a duplicate-key storage error (both 409)
    pub fn register(&self, payload: &Map<String, Value>) -> AuthResult<UserResponse> {
        let mut progress = Progress::start("register");
        let result = self.register_stages(payload, &mut progress);
        progress.finish(result)
    }

    fn register_stages(
        &self,
        payload: &Map<String, Value>,
        progress: &mut Progress,
    ) -> AuthResult<UserResponse> {
        progress.enter(Stage::Validating);
        RequestValidator::new(&self.user_schema).validate(payload)?;
        let email = string_field(payload, "email")?;
        let password = string_field(payload, "password")?;
        if !is_valid_email(email) {
            return Err(ErrorSignal::bad_request("Email must be a valid email address")
                .with_details(serde_json::json!({ "field": "email" }))
                .into());
        }

        progress.enter(Stage::CheckingUniqueness);
        if self.users.email_exists(email)? {
            return Err(AuthError::EmailAlreadyExists);
        }

        progress.enter(Stage::Persisting);
        let user = User::new(email.to_string(), password)?;
        // A concurrent registration may still win here; the unique index decides
        self.users.create(&user)?;

        Ok(UserResponse::from(&user))
    }

    /// Authenticate a user and issue an access token
    ///
    /// Unknown emails and wrong passwords fail identically.
    pub fn login(&self, payload: &Map<String, Value>) -> AuthResult<TokenResponse> {
        let mut progress = Progress::start("login");
        let result = self.login_stages(payload, &mut progress);
        progress.finish(result)
    }

    fn login_stages(
        &self,
        payload: &Map<String, Value>,
        progress: &mut Progress,
    ) -> AuthResult<TokenResponse> {
        progress.enter(Stage::Validating);
        RequestValidator::new(&self.login_schema).validate(payload)?;
        let email = string_field(payload, "email")?;
        let password = string_field(payload, "password")?;

        let user = self
            .users
            .find_by_email(email)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.verify_password(password)? {
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.jwt_manager.generate_access_token(&user)?;
        Ok(TokenResponse::new(
            user.email,
            access_token,
            self.jwt_manager.expires_in(),
        ))
    }

    /// Validate an access token issued by [`login`](Self::login)
    pub fn verify_token(&self, token: &str) -> AuthResult<JwtClaims> {
        self.jwt_manager.validate_token(token)
    }

    /// Repository backing this workflow
    pub fn users(&self) -> &U {
        &self.users
    }
}

fn string_field<'p>(payload: &'p Map<String, Value>, name: &str) -> AuthResult<&'p str> {
    payload.get(name).and_then(Value::as_str).ok_or_else(|| {
        AuthError::Validation(ErrorSignal::bad_request(format!(
            "Invalid type at required field '{}' (expected: 'String')",
            name
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::errors::{EMAIL_IN_USE_MESSAGE, INVALID_CREDENTIALS_MESSAGE};
    use crate::storage::StorageClient;
    use serde_json::json;

    fn workflow() -> AuthWorkflow {
        let repo = StoredUserRepository::open(&StorageClient::in_memory("test")).unwrap();
        AuthWorkflow::new(repo, JwtConfig::new("test_secret", 15))
    }

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    fn signal(err: AuthError) -> ErrorSignal {
        ErrorSignal::from(err)
    }

    #[test]
    fn test_register_success() {
        let auth = workflow();
        let user = auth
            .register(&payload(json!({ "email": "a@b.co", "password": "secret1" })))
            .unwrap();

        assert_eq!(user.email, "a@b.co");
        assert_eq!(auth.users().count().unwrap(), 1);
    }

    #[test]
    fn test_register_missing_fields() {
        let auth = workflow();
        let err = signal(auth.register(&payload(json!({}))).unwrap_err());

        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Missing required fields: (email, password)");
    }

    #[test]
    fn test_register_wrong_type() {
        let auth = workflow();
        let err = signal(
            auth.register(&payload(json!({ "email": "a@b.co", "password": 123456 })))
                .unwrap_err(),
        );

        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.message(),
            "Invalid type at required field 'password' (expected: 'String')"
        );
    }

    #[test]
    fn test_register_short_password() {
        let auth = workflow();
        let err = signal(
            auth.register(&payload(json!({ "email": "a@b.co", "password": "12345" })))
                .unwrap_err(),
        );

        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Password must be at least 6 characters long");
        assert_eq!(auth.users().count().unwrap(), 0);
    }

    #[test]
    fn test_register_bad_email() {
        let auth = workflow();
        let err = signal(
            auth.register(&payload(json!({ "email": "not-an-email", "password": "secret1" })))
                .unwrap_err(),
        );

        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Email must be a valid email address");
    }

    #[test]
    fn test_register_duplicate() {
        let auth = workflow();
        let body = payload(json!({ "email": "a@b.co", "password": "secret1" }));

        auth.register(&body).unwrap();
        let err = signal(auth.register(&body).unwrap_err());

        assert_eq!(err.status_code(), 409);
        assert_eq!(err.message(), EMAIL_IN_USE_MESSAGE);
        assert_eq!(auth.users().count().unwrap(), 1);
    }

    #[test]
    fn test_login_issues_verifiable_token() {
        let auth = workflow();
        let body = payload(json!({ "email": "a@b.co", "password": "secret1" }));
        auth.register(&body).unwrap();

        let token = auth.login(&body).unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 15 * 60);

        let claims = auth.verify_token(&token.access_token).unwrap();
        assert_eq!(claims.email, "a@b.co");
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let auth = workflow();
        auth.register(&payload(json!({ "email": "a@b.co", "password": "secret1" })))
            .unwrap();

        let wrong_password = signal(
            auth.login(&payload(json!({ "email": "a@b.co", "password": "nope123" })))
                .unwrap_err(),
        );
        let unknown_email = signal(
            auth.login(&payload(json!({ "email": "x@y.co", "password": "secret1" })))
                .unwrap_err(),
        );

        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password.status_code(), 401);
        assert_eq!(wrong_password.message(), INVALID_CREDENTIALS_MESSAGE);
    }

    #[test]
    fn test_verify_token_rejects_garbage() {
        let auth = workflow();
        assert!(matches!(
            auth.verify_token("garbage"),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::CheckingUniqueness.to_string(), "checking_uniqueness");
        assert_eq!(Stage::Responded.to_string(), "responded");
    }
}
