//! Error types for the field-service SDK.

use fieldops_security::{Action, EntityKind};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldServiceError {
    /// The record does not exist, or is soft-deleted for this caller.
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: Uuid },

    #[error("access denied: {action} on {entity}")]
    AccessDenied { entity: EntityKind, action: Action },

    #[error("illegal {entity} transition: {from} -> {to}")]
    IllegalTransition {
        entity: EntityKind,
        from: String,
        to: String,
    },

    /// No document number could be allocated. The caller may retry the whole operation.
    #[error("sequence unavailable for {key}: {message}")]
    SequenceUnavailable { key: String, message: String },

    #[error("store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// Another write changed the record first. Nothing was written; the whole
    /// operation may be retried against the fresh state.
    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: EntityKind, id: Uuid },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl FieldServiceError {
    #[must_use]
    pub fn not_found(entity: EntityKind, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    #[must_use]
    pub fn access_denied(entity: EntityKind, action: Action) -> Self {
        Self::AccessDenied { entity, action }
    }

    #[must_use]
    pub fn illegal_transition(
        entity: EntityKind,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::IllegalTransition {
            entity,
            from: from.into(),
            to: to.into(),
        }
    }

    #[must_use]
    pub fn sequence_unavailable(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SequenceUnavailable {
            key: key.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(entity: EntityKind, id: Uuid) -> Self {
        Self::Conflict { entity, id }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Transient failures; nothing was committed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SequenceUnavailable { .. }
                | Self::StoreUnavailable { .. }
                | Self::Conflict { .. }
        )
    }
}
