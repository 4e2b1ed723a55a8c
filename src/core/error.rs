//! Typed error handling for the agora engine
//!
//! Errors are grouped by category so callers can react to specific cases
//! instead of inspecting a generic `anyhow::Error`.
//!
//! # Error Categories
//!
//! - [`IncludeError`]: include registry wiring mistakes (never user-facing)
//! - [`VoteError`]: vote casting that could not be serialized
//! - [`EntityError`]: missing or malformed entities
//! - [`StorageError`]: failures reported by a storage collaborator
//! - [`ConfigError`]: configuration parsing and validation
//!
//! # Example
//!
//! ```rust,ignore
//! match ledger.cast(voter_id, SubjectRef::topic(1), VoteDirection::Up).await {
//!     Ok(outcome) => println!("now {}", outcome.vote_count),
//!     Err(err) if err.is_retryable() => { /* try again */ }
//!     Err(err) => return Err(err),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use crate::core::entity::EntityId;
use crate::core::vote::SubjectType;

/// The main error type for the engine
#[derive(Debug)]
pub enum ForumError {
    /// Include registry errors
    Include(IncludeError),

    /// Vote casting errors
    Vote(VoteError),

    /// Entity lookup and conversion errors
    Entity(EntityError),

    /// Storage collaborator errors
    Storage(StorageError),

    /// Configuration errors
    Config(ConfigError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for ForumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForumError::Include(e) => write!(f, "{}", e),
            ForumError::Vote(e) => write!(f, "{}", e),
            ForumError::Entity(e) => write!(f, "{}", e),
            ForumError::Storage(e) => write!(f, "{}", e),
            ForumError::Config(e) => write!(f, "{}", e),
            ForumError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ForumError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ForumError::Include(e) => Some(e),
            ForumError::Vote(e) => Some(e),
            ForumError::Entity(e) => Some(e),
            ForumError::Storage(e) => Some(e),
            ForumError::Config(e) => Some(e),
            ForumError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ForumError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForumError::Include(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ForumError::Vote(e) => e.status_code(),
            ForumError::Entity(e) => e.status_code(),
            ForumError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ForumError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ForumError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ForumError::Include(e) => e.error_code(),
            ForumError::Vote(e) => e.error_code(),
            ForumError::Entity(e) => e.error_code(),
            ForumError::Storage(_) => "STORAGE_ERROR",
            ForumError::Config(_) => "CONFIG_ERROR",
            ForumError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller may safely retry the failed operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, ForumError::Vote(VoteError::Conflict { .. }))
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ForumError::Vote(VoteError::Conflict {
                voter_id,
                subject_type,
                subject_id,
            }) => Some(serde_json::json!({
                "voter_id": voter_id,
                "subject_type": subject_type,
                "subject_id": subject_id,
                "retryable": true
            })),
            ForumError::Entity(EntityError::NotFound { resource_type, id }) => {
                Some(serde_json::json!({
                    "resource_type": resource_type,
                    "id": id
                }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ForumError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Include Errors
// =============================================================================

/// Errors raised while a repository wires up the include registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IncludeError {
    /// The same include name was registered twice for one request
    #[error("Include '{name}' is already registered")]
    Duplicate { name: String },

    /// A nested include points at a parent that was never registered
    #[error("Include '{name}' nests under unknown include '{parent}'")]
    UnknownParent { name: String, parent: String },
}

impl IncludeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            IncludeError::Duplicate { .. } => "DUPLICATE_INCLUDE",
            IncludeError::UnknownParent { .. } => "UNKNOWN_INCLUDE_PARENT",
        }
    }
}

impl From<IncludeError> for ForumError {
    fn from(err: IncludeError) -> Self {
        ForumError::Include(err)
    }
}

// =============================================================================
// Vote Errors
// =============================================================================

/// Errors raised by the vote ledger
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoteError {
    /// A concurrent cast for the same voter and subject got there first
    ///
    /// Raised when the pair's lock is held past the timeout, or when the
    /// store finds the live vote changed since it was read.
    #[error("Vote by voter {voter_id} on {subject_type} {subject_id} conflicted with a concurrent vote")]
    Conflict {
        voter_id: EntityId,
        subject_type: SubjectType,
        subject_id: EntityId,
    },
}

impl VoteError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            VoteError::Conflict { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            VoteError::Conflict { .. } => "VOTE_CONFLICT",
        }
    }
}

impl From<VoteError> for ForumError {
    fn from(err: VoteError) -> Self {
        ForumError::Vote(err)
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to entities
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    /// Entity was not found
    #[error("{resource_type} with id '{id}' not found")]
    NotFound { resource_type: String, id: EntityId },

    /// Entity could not be turned into a resource
    #[error("Failed to serialize/deserialize {resource_type}: {message}")]
    SerializationError {
        resource_type: String,
        message: String,
    },
}

impl EntityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntityError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
            EntityError::SerializationError { .. } => "ENTITY_SERIALIZATION_ERROR",
        }
    }
}

impl From<EntityError> for ForumError {
    fn from(err: EntityError) -> Self {
        ForumError::Entity(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors reported by storage collaborators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// A storage operation failed
    #[error("Storage operation '{operation}' failed: {message}")]
    OperationFailed { operation: String, message: String },

    /// A lock on shared storage state could not be taken
    #[error("Failed to acquire {kind} lock: {message}")]
    LockPoisoned { kind: String, message: String },
}

impl From<StorageError> for ForumError {
    fn from(err: StorageError) -> Self {
        ForumError::Storage(err)
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", .file.as_deref().map(|f| format!(" '{}'", f)).unwrap_or_default())]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// A configuration value is out of range
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// File could not be read
    #[error("Config IO error: {message}")]
    IoError { message: String },
}

impl From<ConfigError> for ForumError {
    fn from(err: ConfigError) -> Self {
        ForumError::Config(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for ForumError {
    fn from(err: serde_json::Error) -> Self {
        ForumError::Internal(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for ForumError {
    fn from(err: serde_yaml::Error) -> Self {
        ForumError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for ForumError {
    fn from(err: std::io::Error) -> Self {
        ForumError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

/// Collaborators report failures through `anyhow`; typed errors they carry
/// are recovered, anything else becomes a storage failure.
impl From<anyhow::Error> for ForumError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ForumError>() {
            Ok(forum_err) => return forum_err,
            Err(err) => err,
        };
        let err = match err.downcast::<EntityError>() {
            Ok(entity_err) => return ForumError::Entity(entity_err),
            Err(err) => err,
        };
        let err = match err.downcast::<VoteError>() {
            Ok(vote_err) => return ForumError::Vote(vote_err),
            Err(err) => err,
        };
        match err.downcast::<StorageError>() {
            Ok(storage_err) => ForumError::Storage(storage_err),
            Err(err) => ForumError::Storage(StorageError::OperationFailed {
                operation: "collaborator".to_string(),
                message: format!("{:#}", err),
            }),
        }
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for agora operations
pub type ForumResult<T> = Result<T, ForumError>;
