// Login and registration against the users table.

use serde::Serialize;

use crate::auth::{self, TokenSigner};
use crate::db::UserRepo;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
}

pub struct AuthService<'a> {
    users: UserRepo<'a>,
    tokens: &'a TokenSigner,
}

impl<'a> AuthService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            users: UserRepo::new(&state.pool),
            tokens: &state.tokens,
        }
    }

    /// Authenticate and issue a bearer token. An unknown username and a wrong
    /// password are indistinguishable to the caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let user = self
            .users
            .select_by_username(username)
            .await?
            .ok_or(crate::auth::AuthError::InvalidCredentials)?;

        auth::verify_password(password, &user.password_hash)?;

        let token = self.tokens.issue(user.id, &user.username)?;
        tracing::info!(user_id = user.id, username = %user.username, "login");

        Ok(LoginResponse {
            token,
            user: UserInfo { id: user.id, username: user.username },
        })
    }

    /// Create a user with a salted password hash; duplicate usernames yield 409
    pub async fn register(&self, username: &str, password: &str) -> Result<UserInfo, ApiError> {
        let mut errors = crate::validation::ValidationErrors::new();
        crate::validation::check_name(&mut errors, "username", Some(username));
        if password.len() < 8 {
            errors.push("password", "must be at least 8 characters");
        }
        errors.into_result().map_err(ApiError::from)?;

        let hash = auth::hash_password(password)?;
        let user = self.users.insert(username.trim(), &hash).await?;
        tracing::info!(user_id = user.id, username = %user.username, "user registered");

        Ok(UserInfo { id: user.id, username: user.username })
    }
}
