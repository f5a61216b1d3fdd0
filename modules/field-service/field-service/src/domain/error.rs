use field_service_sdk::errors::FieldServiceError;
use field_service_sdk::SequenceKey;
use fieldops_security::{Action, EntityKind};
use uuid::Uuid;

use super::repo::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
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

    #[error("sequence {key} unavailable: {message}")]
    SequenceUnavailable { key: SequenceKey, message: String },

    #[error("store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// A conditional write lost to a concurrent one.
    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: EntityKind, id: Uuid },

    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },
}

impl DomainError {
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
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Map a failure of the entity store holding `entity` records.
    ///
    /// `id` names the record the call addressed, when there was one.
    #[must_use]
    pub fn from_store(entity: EntityKind, id: Option<Uuid>, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(missing) => Self::not_found(entity, id.unwrap_or(missing)),
            StoreError::Conflict(message) => Self::validation("id", message),
            StoreError::Stale(stale) => Self::Conflict {
                entity,
                id: id.unwrap_or(stale),
            },
            StoreError::Unavailable(message) => Self::StoreUnavailable { message },
        }
    }

    /// Map a failure of the counter store behind `key`.
    #[must_use]
    pub fn from_counter(key: SequenceKey, err: &StoreError) -> Self {
        Self::SequenceUnavailable {
            key,
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for FieldServiceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound { entity, id } => Self::not_found(entity, id),
            DomainError::AccessDenied { entity, action } => Self::access_denied(entity, action),
            DomainError::IllegalTransition { entity, from, to } => {
                Self::illegal_transition(entity, from, to)
            }
            DomainError::SequenceUnavailable { key, .. } => {
                Self::sequence_unavailable(key.to_string(), "counter store unavailable")
            }
            DomainError::StoreUnavailable { .. } => {
                Self::store_unavailable("entity store unavailable")
            }
            DomainError::Conflict { entity, id } => Self::conflict(entity, id),
            DomainError::Validation { field, message } => {
                Self::validation(format!("{field}: {message}"))
            }
        }
    }
}
