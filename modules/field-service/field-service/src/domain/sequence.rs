use field_service_sdk::{DocumentKind, DocumentNumber, SequenceKey};
use tracing::{debug, instrument};

use super::error::DomainError;
use super::ports::ClockRef;
use super::repo::CounterStoreRef;

/// Mints document numbers from the counter store.
///
/// Each call is exactly one atomic increment. A failed increment is reported,
/// never retried here, so a number can't be minted twice.
pub struct SequenceGenerator {
    counters: CounterStoreRef,
    clock: ClockRef,
}

impl SequenceGenerator {
    #[must_use]
    pub fn new(counters: CounterStoreRef, clock: ClockRef) -> Self {
        Self { counters, clock }
    }

    /// # Errors
    /// `SequenceUnavailable` when the counter store fails.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn next(&self, key: SequenceKey) -> Result<DocumentNumber, DomainError> {
        let value = self
            .counters
            .increment_counter(&key)
            .await
            .map_err(|e| DomainError::from_counter(key, &e))?;
        let number = DocumentNumber::new(key, value);
        debug!(number = %number, "document number allocated");
        Ok(number)
    }

    /// # Errors
    /// `SequenceUnavailable` when the counter store fails.
    pub async fn next_document_number(
        &self,
        kind: DocumentKind,
        year: i32,
    ) -> Result<DocumentNumber, DomainError> {
        self.next(SequenceKey::new(kind, year)).await
    }

    /// Number in the current calendar year, as read from the clock.
    ///
    /// # Errors
    /// `SequenceUnavailable` when the counter store fails.
    pub async fn next_for_current_year(
        &self,
        kind: DocumentKind,
    ) -> Result<DocumentNumber, DomainError> {
        self.next_document_number(kind, self.clock.current_year())
            .await
    }
}
