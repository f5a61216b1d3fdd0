use std::sync::Arc;

use async_trait::async_trait;
use field_service_sdk::{
    Client, Equipment, Installation, Intervention, Invoice, Message, Product, Quote, QuoteRequest,
    Resource, SequenceKey, User,
};
use fieldops_security::ScopePredicate;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(Uuid),

    #[error("conflict: {0}")]
    Conflict(String),

    /// A conditional write found the record changed since it was read.
    #[error("record {0} changed since it was read")]
    Stale(Uuid),

    /// The backend failed or did not answer in time. Nothing was written.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Persistence of one record type.
///
/// `query` evaluates the scope predicate itself; callers never hand-build
/// per-entity filters.
#[async_trait]
pub trait EntityStore<T: Resource>: Send + Sync {
    async fn create(&self, record: T) -> Result<T, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<T>, StoreError>;

    async fn query(&self, filter: &ScopePredicate) -> Result<Vec<T>, StoreError>;

    /// Replace the stored record `id` with `record`, provided it still equals
    /// `expected`.
    ///
    /// The comparison and the write are one atomic step; a mismatch fails with
    /// `Stale` and writes nothing.
    async fn update_if(&self, id: Uuid, expected: &T, record: T) -> Result<T, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Atomic per-key counters backing document numbering.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment the counter for `key` and return the new value.
    ///
    /// A missing counter starts at zero, so the first call returns 1. Two
    /// concurrent calls never observe the same value.
    async fn increment_counter(&self, key: &SequenceKey) -> Result<u64, StoreError>;
}

pub type StoreRef<T> = Arc<dyn EntityStore<T>>;
pub type CounterStoreRef = Arc<dyn CounterStore>;

/// One store per managed record type.
#[derive(Clone)]
pub struct Stores {
    pub users: StoreRef<User>,
    pub clients: StoreRef<Client>,
    pub equipment: StoreRef<Equipment>,
    pub interventions: StoreRef<Intervention>,
    pub installations: StoreRef<Installation>,
    pub quotes: StoreRef<Quote>,
    pub invoices: StoreRef<Invoice>,
    pub products: StoreRef<Product>,
    pub messages: StoreRef<Message>,
    pub quote_requests: StoreRef<QuoteRequest>,
}

/// Typed lookup of the store holding `T`.
pub trait StoreFor<T: Resource> {
    fn store(&self) -> &dyn EntityStore<T>;
}

macro_rules! store_for {
    ($($ty:ty => $field:ident),+ $(,)?) => {
        $(
            impl StoreFor<$ty> for Stores {
                fn store(&self) -> &dyn EntityStore<$ty> {
                    self.$field.as_ref()
                }
            }
        )+
    };
}

store_for! {
    User => users,
    Client => clients,
    Equipment => equipment,
    Intervention => interventions,
    Installation => installations,
    Quote => quotes,
    Invoice => invoices,
    Product => products,
    Message => messages,
    QuoteRequest => quote_requests,
}
