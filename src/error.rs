//! Error types
//!
//! Provides a unified error type hierarchy for all adapter operations.
//!
//! # Design
//! Uses thiserror for ergonomic error definitions. Failures raised by the
//! PocketBase server are carried unmodified in [`FirebaseError::Backend`];
//! the adapter only adds the few local validation errors below.

use crate::pocketbase::ClientResponseError;
use thiserror::Error;

/// Top-level error type
///
/// Wraps the module-specific errors (Auth, Firestore) and the backend's own
/// response errors into a unified type.
///
/// # Example
/// ```
/// use firebase_pocketbase::{FirebaseError, AuthError};
///
/// let auth_err: FirebaseError = AuthError::InvalidEmail.into();
/// ```
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Authentication-related errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Firestore-related errors
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// Error response returned by the PocketBase server
    #[error("Backend error: {0}")]
    Backend(#[from] ClientResponseError),

    /// Network/HTTP errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Realtime connection errors
    #[error("Realtime error: {0}")]
    Realtime(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Authentication errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email address is invalid
    #[error("Invalid email address")]
    InvalidEmail,

    /// Password is invalid
    #[error("Invalid password")]
    InvalidPassword,

    /// Invalid credential
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
}

/// Firestore errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FirestoreError {
    /// Invalid argument (e.g. an empty or too-short path)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid data (e.g. write payload that is not an object)
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl FirebaseError {
    /// Create an internal error from a string
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if error is retryable
    ///
    /// Nothing in this crate retries; callers may use this to decide.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Realtime(_) => true,
            Self::Backend(err) => err.status == 429 || err.status >= 500,
            _ => false,
        }
    }

    /// Check if error indicates authentication is required
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Backend(err) if err.status == 401 || err.status == 403)
    }
}
