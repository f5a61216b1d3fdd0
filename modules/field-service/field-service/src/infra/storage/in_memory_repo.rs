//! In-memory entity stores.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use field_service_sdk::{
    Client, Equipment, Installation, Intervention, Invoice, Message, Product, Quote, QuoteRequest,
    Resource, User,
};
use fieldops_security::ScopePredicate;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::repo::{EntityStore, StoreError, Stores};

/// Store for one record type, keyed by record id.
///
/// Each call takes the lock once, so every write is applied whole or not at all.
pub struct InMemoryEntityStore<T> {
    records: RwLock<BTreeMap<Uuid, T>>,
}

impl<T: Resource> InMemoryEntityStore<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored records, soft-deleted ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl<T: Resource> Default for InMemoryEntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Resource> EntityStore<T> for InMemoryEntityStore<T> {
    async fn create(&self, record: T) -> Result<T, StoreError> {
        let id = record.resource_id();
        let mut records = self.records.write();
        if records.contains_key(&id) {
            return Err(StoreError::Conflict(format!(
                "{} {id} already exists",
                T::KIND
            )));
        }
        records.insert(id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        Ok(self.records.read().get(&id).cloned())
    }

    async fn query(&self, filter: &ScopePredicate) -> Result<Vec<T>, StoreError> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|record| filter.matches(*record))
            .cloned()
            .collect())
    }

    async fn update_if(&self, id: Uuid, expected: &T, record: T) -> Result<T, StoreError> {
        if record.resource_id() != id {
            return Err(StoreError::Conflict(format!(
                "{} id cannot change from {id} to {}",
                T::KIND,
                record.resource_id()
            )));
        }
        let mut records = self.records.write();
        let slot = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if *slot != *expected {
            return Err(StoreError::Stale(id));
        }
        *slot = record.clone();
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.records
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}

/// A full set of empty in-memory stores.
#[must_use]
pub fn in_memory_stores() -> Stores {
    Stores {
        users: Arc::new(InMemoryEntityStore::<User>::new()),
        clients: Arc::new(InMemoryEntityStore::<Client>::new()),
        equipment: Arc::new(InMemoryEntityStore::<Equipment>::new()),
        interventions: Arc::new(InMemoryEntityStore::<Intervention>::new()),
        installations: Arc::new(InMemoryEntityStore::<Installation>::new()),
        quotes: Arc::new(InMemoryEntityStore::<Quote>::new()),
        invoices: Arc::new(InMemoryEntityStore::<Invoice>::new()),
        products: Arc::new(InMemoryEntityStore::<Product>::new()),
        messages: Arc::new(InMemoryEntityStore::<Message>::new()),
        quote_requests: Arc::new(InMemoryEntityStore::<QuoteRequest>::new()),
    }
}
