//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the IDV Stack.
//! Each identifier is a distinct type — you cannot pass a [`ReviewId`]
//! where a [`SessionId`] is expected.
//!
//! ## Validation
//!
//! String-based identifiers ([`SessionId`], [`ReviewerId`], [`ImageRef`])
//! validate format at construction time. The UUID-based [`ReviewId`] is
//! always valid by construction and never reused.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Maximum length for string-based identifiers (storage key limit).
const MAX_ID_LEN: usize = 128;

fn valid_key(s: &str) -> bool {
    !s.is_empty() && s.len() <= MAX_ID_LEN && !s.chars().any(char::is_whitespace)
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// An opaque identifier for a verification session, stable across attempts.
///
/// Issued by the upstream session service; this stack treats it as a lookup
/// key and never inspects its structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session identifier, validating the key format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSessionId`] if the value is empty,
    /// longer than 128 characters, or contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if !valid_key(&id) {
            return Err(ValidationError::InvalidSessionId(id));
        }
        Ok(Self(id))
    }

    /// Access the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ReviewId
// ---------------------------------------------------------------------------

/// A unique identifier for a review queue item.
///
/// Generated at enqueue time and never reused, even after the item reaches
/// a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(Uuid);

impl ReviewId {
    /// Create a new random review identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a review identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReviewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "review:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ReviewerId
// ---------------------------------------------------------------------------

/// The identity of a human reviewer, as asserted by the (out-of-scope)
/// authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewerId(String);

impl ReviewerId {
    /// Create a reviewer identifier, validating the key format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidReviewerId`] if the value is empty,
    /// longer than 128 characters, or contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if !valid_key(&id) {
            return Err(ValidationError::InvalidReviewerId(id));
        }
        Ok(Self(id))
    }

    /// Access the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReviewerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ImageRef
// ---------------------------------------------------------------------------

/// A handle to an image held by the encrypted object-storage collaborator.
///
/// The stack passes these through to evidence adapters and never
/// dereferences them itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef(String);

impl ImageRef {
    /// Create an image reference.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidImageRef`] if the handle is empty.
    pub fn new(handle: impl Into<String>) -> Result<Self, ValidationError> {
        let handle = handle.into();
        if handle.is_empty() {
            return Err(ValidationError::InvalidImageRef);
        }
        Ok(Self(handle))
    }

    /// Access the underlying handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
