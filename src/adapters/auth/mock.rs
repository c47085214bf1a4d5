//! Mock session validator for testing.
//!
//! Maps fixed bearer tokens to users so HTTP tests can authenticate without
//! minting JWTs.
//!
//! # Example
//!
//! ```ignore
//! let validator = MockSessionValidator::new()
//!     .with_test_user("admin-token", "user-admin")
//!     .with_test_user("user-token", "user-1");
//!
//! let user = validator.validate("admin-token").await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Mock session validator for testing.
///
/// Tokens not in the map return `InvalidToken`.
#[derive(Debug, Default, Clone)]
pub struct MockSessionValidator {
    tokens: HashMap<String, AuthenticatedUser>,
    /// Returned for every validation when set.
    force_error: Option<AuthError>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token that maps to a user.
    pub fn with_user(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }

    /// Adds a valid token for a user with the given id.
    ///
    /// # Panics
    ///
    /// If `user_id` is empty.
    pub fn with_test_user(self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let user = AuthenticatedUser::new(
            UserId::new(&user_id).expect("test user id must not be empty"),
            Some(format!("{}@test.example.com", user_id)),
        );
        self.with_user(token, user)
    }

    /// Forces all validations to return the specified error.
    pub fn with_error(mut self, error: AuthError) -> Self {
        self.force_error = Some(error);
        self
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = &self.force_error {
            return Err(error.clone());
        }

        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
