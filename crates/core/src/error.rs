//! Error types shared by the rental services.
//!
//! Remote failures arrive as an `{error, errorMsg}` pair and are carried as
//! [`StoreError::Remote`]. Local input problems are [`ValidationError`]s and
//! are always raised before any network call. Callers turn either into an
//! [`Alert`] for display.

use std::fmt;

use thiserror::Error;

/// Local input rejected before reaching the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required form fields are blank.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    /// A date could not be parsed as a calendar date.
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    /// The rental would end before it starts.
    #[error("end date {end} is before start date {start}")]
    InvertedInterval {
        /// Start date as typed.
        start: String,
        /// End date as typed.
        end: String,
    },
    /// A price below zero.
    #[error("daily price must not be negative")]
    NegativePrice,
    /// A numeric field could not be parsed.
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    /// The selected client or game is not in the loaded list.
    #[error("unknown {kind} {id:?}")]
    UnknownSelection {
        /// `client`, `game` or `rental`.
        kind: &'static str,
        /// Identifier that failed to resolve.
        id: String,
    },
    /// Sign-in attempted without login or password.
    #[error("login and password are required")]
    MissingCredentials,
}

impl ValidationError {
    /// Short title for the constraint that failed.
    pub fn title(&self) -> &'static str {
        match self {
            Self::MissingFields(_) => "Required fields",
            Self::InvalidDate(_) => "Invalid dates",
            Self::InvertedInterval { .. } => "Invalid interval",
            Self::NegativePrice | Self::InvalidNumber(_) => "Invalid value",
            Self::UnknownSelection { .. } => "Selection required",
            Self::MissingCredentials => "Credentials required",
        }
    }
}

/// Failure reported by a collection backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend flagged `error` on its response, with an optional message.
    #[error("{}", .0.as_deref().unwrap_or("remote store reported an error"))]
    Remote(Option<String>),
    /// The backend answered with a non-success status and no envelope.
    #[error("remote store answered with HTTP {0}")]
    Status(u16),
    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// A document did not match the expected shape.
    #[error("malformed document: {0}")]
    Decode(#[from] serde_json::Error),
    /// No document with the given id.
    #[error("document {0} not found")]
    NotFound(String),
}

impl StoreError {
    /// Message supplied by the backend, if any.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Remote(message) => message.as_deref().filter(|msg| !msg.trim().is_empty()),
            _ => None,
        }
    }
}

/// Authentication failures.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The backend refused the credentials.
    #[error("{}", .0.as_deref().unwrap_or("sign-in rejected"))]
    Rejected(Option<String>),
    /// Transport or decoding failure while talking to the auth endpoint.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The persisted session file could not be read or written.
    #[error(transparent)]
    Session(#[from] anyhow::Error),
}

/// Crate-level error.
#[derive(Error, Debug)]
pub enum Error {
    /// Input validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Collection call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Authentication failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl Error {
    /// Build the alert shown to the user, falling back to `default_message`
    /// when the backend gave no message.
    pub fn alert(&self, default_message: &str) -> Alert {
        match self {
            Self::Validation(err) => Alert::new(err.title(), err.to_string()),
            Self::Store(err) => Alert::new(
                "Error",
                err.remote_message().unwrap_or(default_message).to_string(),
            ),
            Self::Auth(AuthError::Rejected(Some(message))) => {
                Alert::new("Sign-in failed", message.clone())
            }
            Self::Auth(AuthError::Store(err)) => Alert::new(
                "Sign-in failed",
                err.remote_message().unwrap_or(default_message).to_string(),
            ),
            Self::Auth(_) => Alert::new("Sign-in failed", default_message.to_string()),
        }
    }
}

/// Blocking user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Heading.
    pub title: String,
    /// Body text.
    pub message: String,
}

impl Alert {
    /// Build a new alert.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Convenience alias used across the services.
pub type Result<T, E = Error> = std::result::Result<T, E>;
