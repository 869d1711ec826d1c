//! Demo-only account store.
//!
//! Passwords are kept in plaintext and only for as long as the owning session
//! lives. Nothing is persisted and nothing here is suitable for real credentials.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

/// Validation failures shown to the user on the login and signup forms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Please enter both email and password.")]
    MissingCredentials,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("This email is already registered. Please log in instead.")]
    EmailTaken,

    #[error("Invalid email or password.")]
    InvalidCredentials,
}

#[derive(Debug, Default, Clone)]
pub struct UserStore {
    users: HashMap<String, String>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `email`. `confirm` must repeat `password`.
    pub fn signup(&mut self, email: &str, password: &str, confirm: &str) -> Result<(), AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if password != confirm {
            return Err(AuthError::PasswordMismatch);
        }
        if self.users.contains_key(email) {
            return Err(AuthError::EmailTaken);
        }
        self.users.insert(email.to_owned(), password.to_owned());
        debug!(users = self.users.len(), "Registered demo account");
        Ok(())
    }

    /// Check `password` against the one stored for `email`.
    pub fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        match self.users.get(email) {
            Some(stored) if stored == password => Ok(()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.users.contains_key(email)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoginState {
    #[default]
    LoggedOut,
    LoggedIn {
        email: String,
    },
}

impl LoginState {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn { .. })
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Self::LoggedIn { email } => Some(email.as_str()),
            Self::LoggedOut => None,
        }
    }
}
