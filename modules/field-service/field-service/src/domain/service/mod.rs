//! Entry points used by request handlers.
//!
//! Every call takes the acting [`Principal`] explicitly. Single-record calls
//! check existence first and permission second, so `NotFound` and
//! `AccessDenied` are never confused.

mod documents;
mod equipment;
mod requests;

use std::sync::Arc;

use field_service_sdk::{
    Client, Deletion, DocumentKind, DocumentNumber, Equipment, GeoPoint, Installation,
    Intervention, Message, Product, QuoteRequest, QuoteRequestStatus, Resource, User, WorkStatus,
};
use fieldops_security::{
    Action, EntityKind, PolicyEngineRef, Principal, ScopeDecision, ScopeSubject,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::DocumentsConfig;

use super::error::DomainError;
use super::lifecycle::{Lifecycle, Transitions, apply_transition};
use super::ports::ClockRef;
use super::repo::{CounterStoreRef, EntityStore, StoreFor, Stores};
use super::scope::{OwnershipDirectory, ScopeResolver, StoreBackedDirectory};
use super::sequence::SequenceGenerator;

/// Records that are persisted as submitted by the caller.
///
/// Quotes and invoices are not: they go through the document operations,
/// which mint their number.
pub trait DirectlyCreated: Resource {
    /// Reject a new record whose contents make no sense at creation time.
    ///
    /// # Errors
    /// `Validation` naming the offending field.
    fn check_new(&self, _principal: &Principal) -> Result<(), DomainError> {
        Ok(())
    }
}

impl DirectlyCreated for User {}

impl DirectlyCreated for Client {
    fn check_new(&self, _principal: &Principal) -> Result<(), DomainError> {
        require_active(self.active)
    }
}

impl DirectlyCreated for Equipment {}

impl DirectlyCreated for Intervention {
    fn check_new(&self, _principal: &Principal) -> Result<(), DomainError> {
        require_initial(self.status, WorkStatus::Scheduled)?;
        require_finite(self.technician_location)
    }
}

impl DirectlyCreated for Installation {
    fn check_new(&self, _principal: &Principal) -> Result<(), DomainError> {
        require_initial(self.status, WorkStatus::Scheduled)
    }
}

impl DirectlyCreated for Product {
    fn check_new(&self, _principal: &Principal) -> Result<(), DomainError> {
        require_active(self.active)
    }
}

impl DirectlyCreated for Message {
    fn check_new(&self, _principal: &Principal) -> Result<(), DomainError> {
        if self.body.trim().is_empty() {
            return Err(DomainError::validation("body", "must not be empty"));
        }
        if self.sender_id == self.recipient_id {
            return Err(DomainError::validation(
                "recipient_id",
                "must differ from the sender",
            ));
        }
        if self.read_at.is_some() || self.deleted_by_sender || self.deleted_by_recipient {
            return Err(DomainError::validation(
                "message",
                "a new message is unread and not deleted",
            ));
        }
        Ok(())
    }
}

impl DirectlyCreated for QuoteRequest {
    fn check_new(&self, principal: &Principal) -> Result<(), DomainError> {
        require_initial(self.status, QuoteRequestStatus::Open)?;
        if self.technician_id.is_some() || self.quote_id.is_some() {
            return Err(DomainError::validation(
                "technician_id",
                "a new request is unclaimed and unquoted",
            ));
        }
        if !principal.is_admin() && self.requested_by != principal.id() {
            return Err(DomainError::validation(
                "requested_by",
                "must be the requesting user",
            ));
        }
        Ok(())
    }
}

/// Records whose descriptive fields may be edited in place.
///
/// Ownership dimensions and status never change through an edit; status moves
/// through [`FieldService::transition`] only.
pub trait Editable: Resource {
    /// # Errors
    /// `Validation` naming the first field that may not change.
    fn check_edit(&self, current: &Self) -> Result<(), DomainError>;
}

impl Editable for User {
    fn check_edit(&self, current: &Self) -> Result<(), DomainError> {
        unchanged("role", &self.role, &current.role)?;
        unchanged("created_at", &self.created_at, &current.created_at)
    }
}

impl Editable for Client {
    fn check_edit(&self, current: &Self) -> Result<(), DomainError> {
        unchanged("owner_user_id", &self.owner_user_id, &current.owner_user_id)?;
        unchanged("active", &self.active, &current.active)?;
        unchanged("created_at", &self.created_at, &current.created_at)
    }
}

impl Editable for Equipment {
    fn check_edit(&self, current: &Self) -> Result<(), DomainError> {
        unchanged("client_id", &self.client_id, &current.client_id)?;
        unchanged("status", &self.status, &current.status)?;
        unchanged(
            "maintenance_history",
            &self.maintenance_history,
            &current.maintenance_history,
        )?;
        unchanged(
            "last_maintenance_date",
            &self.last_maintenance_date,
            &current.last_maintenance_date,
        )
    }
}

impl Editable for Intervention {
    fn check_edit(&self, current: &Self) -> Result<(), DomainError> {
        unchanged("client_id", &self.client_id, &current.client_id)?;
        unchanged("technician_id", &self.technician_id, &current.technician_id)?;
        unchanged("status", &self.status, &current.status)?;
        unchanged("completed_at", &self.completed_at, &current.completed_at)?;
        require_finite(self.technician_location)
    }
}

impl Editable for Installation {
    fn check_edit(&self, current: &Self) -> Result<(), DomainError> {
        unchanged("client_id", &self.client_id, &current.client_id)?;
        unchanged("status", &self.status, &current.status)
    }
}

impl Editable for Product {
    fn check_edit(&self, current: &Self) -> Result<(), DomainError> {
        unchanged("supplier_id", &self.supplier_id, &current.supplier_id)?;
        unchanged("active", &self.active, &current.active)
    }
}

fn unchanged<V>(field: &str, edited: &V, current: &V) -> Result<(), DomainError>
where
    V: PartialEq + ?Sized,
{
    if edited == current {
        Ok(())
    } else {
        Err(DomainError::validation(field, "cannot be changed by an edit"))
    }
}

fn require_active(active: bool) -> Result<(), DomainError> {
    if active {
        Ok(())
    } else {
        Err(DomainError::validation("active", "new records start active"))
    }
}

/// Refuses NaN and infinite coordinates.
fn require_finite(location: Option<GeoPoint>) -> Result<(), DomainError> {
    match location {
        Some(point) if !(point.latitude.is_finite() && point.longitude.is_finite()) => Err(
            DomainError::validation("technician_location", "coordinates must be finite"),
        ),
        _ => Ok(()),
    }
}

fn require_initial<S: Transitions>(status: S, initial: S) -> Result<(), DomainError> {
    if status == initial {
        Ok(())
    } else {
        Err(DomainError::validation(
            "status",
            format!("new records start as {}", initial.label()),
        ))
    }
}

pub struct FieldService {
    stores: Stores,
    scope: ScopeResolver,
    sequences: SequenceGenerator,
    clock: ClockRef,
    documents: DocumentsConfig,
}

impl FieldService {
    /// Wire the service with Client sets derived from `stores`.
    #[must_use]
    pub fn new(
        stores: Stores,
        policy: PolicyEngineRef,
        counters: CounterStoreRef,
        clock: ClockRef,
        documents: DocumentsConfig,
    ) -> Self {
        let directory = Arc::new(StoreBackedDirectory::new(stores.clone()));
        Self::with_directory(stores, policy, directory, counters, clock, documents)
    }

    #[must_use]
    pub fn with_directory(
        stores: Stores,
        policy: PolicyEngineRef,
        directory: Arc<dyn OwnershipDirectory>,
        counters: CounterStoreRef,
        clock: ClockRef,
        documents: DocumentsConfig,
    ) -> Self {
        Self {
            scope: ScopeResolver::new(policy, directory),
            sequences: SequenceGenerator::new(counters, clock.clone()),
            stores,
            clock,
            documents,
        }
    }

    fn store<T>(&self) -> &dyn EntityStore<T>
    where
        T: Resource,
        Stores: StoreFor<T>,
    {
        <Stores as StoreFor<T>>::store(&self.stores)
    }

    /// # Errors
    /// `StoreUnavailable` when the principal's Client set cannot be read.
    pub async fn resolve_scope(
        &self,
        principal: &Principal,
        entity: EntityKind,
        action: Action,
    ) -> Result<ScopeDecision, DomainError> {
        self.scope.resolve_scope(principal, entity, action).await
    }

    /// # Errors
    /// `AccessDenied` when `instance` is outside the principal's scope.
    pub async fn check_instance_access<S>(
        &self,
        principal: &Principal,
        entity: EntityKind,
        action: Action,
        instance: &S,
    ) -> Result<(), DomainError>
    where
        S: ScopeSubject + Sync + ?Sized,
    {
        self.scope
            .check_instance_access(principal, entity, action, instance)
            .await
    }

    /// # Errors
    /// `SequenceUnavailable` when the counter store fails.
    pub async fn next_document_number(
        &self,
        kind: DocumentKind,
        year: i32,
    ) -> Result<DocumentNumber, DomainError> {
        self.sequences.next_document_number(kind, year).await
    }

    /// Validate and apply a status change, stamped with the current time.
    ///
    /// # Errors
    /// `IllegalTransition` when the transition table forbids it.
    pub fn apply_transition<E: Lifecycle>(
        &self,
        entity: E,
        requested: E::Status,
    ) -> Result<E, DomainError> {
        apply_transition(entity, requested, self.clock.now())
    }

    /// Records of kind `T` visible to `principal`.
    ///
    /// # Errors
    /// `AccessDenied` when the role may not list `T` at all.
    #[instrument(skip_all, fields(entity = %T::KIND, principal = %principal.id()))]
    pub async fn list<T>(&self, principal: &Principal) -> Result<Vec<T>, DomainError>
    where
        T: Resource,
        Stores: StoreFor<T>,
    {
        let filter = self
            .scope
            .authorize(principal, T::KIND, Action::List)
            .await?;
        let mut records = self
            .store::<T>()
            .query(&filter)
            .await
            .map_err(|e| DomainError::from_store(T::KIND, None, e))?;
        if !principal.is_admin() {
            records.retain(|record| record.is_visible_to(principal.id()));
        }
        debug!(count = records.len(), "records listed");
        Ok(records)
    }

    /// # Errors
    /// `NotFound` before `AccessDenied`.
    #[instrument(skip_all, fields(entity = %T::KIND, principal = %principal.id(), id = %id))]
    pub async fn get<T>(&self, principal: &Principal, id: Uuid) -> Result<T, DomainError>
    where
        T: Resource,
        Stores: StoreFor<T>,
    {
        let record = self.fetch::<T>(principal, id).await?;
        self.scope
            .check_instance_access(principal, T::KIND, Action::Read, &record)
            .await?;
        Ok(record)
    }

    /// # Errors
    /// `AccessDenied` when the new record is outside the principal's create
    /// scope; `Validation` for malformed records.
    #[instrument(skip_all, fields(entity = %T::KIND, principal = %principal.id()))]
    pub async fn create<T>(&self, principal: &Principal, record: T) -> Result<T, DomainError>
    where
        T: DirectlyCreated,
        Stores: StoreFor<T>,
    {
        self.scope
            .check_instance_access(principal, T::KIND, Action::Create, &record)
            .await?;
        record.check_new(principal)?;
        let id = record.resource_id();
        let created = self
            .store::<T>()
            .create(record)
            .await
            .map_err(|e| DomainError::from_store(T::KIND, Some(id), e))?;
        info!(id = %id, "record created");
        Ok(created)
    }

    /// Replace the editable fields of a stored record.
    ///
    /// Both the stored and the edited record must be inside the principal's
    /// update scope, so an edit cannot move a record out of reach.
    ///
    /// # Errors
    /// `NotFound`, then `AccessDenied`, then `Validation`.
    #[instrument(skip_all, fields(entity = %T::KIND, principal = %principal.id(), id = %id))]
    pub async fn update<T>(
        &self,
        principal: &Principal,
        id: Uuid,
        edited: T,
    ) -> Result<T, DomainError>
    where
        T: Editable,
        Stores: StoreFor<T>,
    {
        let current = self.fetch::<T>(principal, id).await?;
        self.scope
            .check_instance_access(principal, T::KIND, Action::Update, &current)
            .await?;
        if edited.resource_id() != id {
            return Err(DomainError::validation(
                "id",
                "cannot be changed by an edit",
            ));
        }
        edited.check_edit(&current)?;
        self.scope
            .check_instance_access(principal, T::KIND, Action::Update, &edited)
            .await?;

        let updated = self.save(id, &current, edited).await?;
        info!("record updated");
        Ok(updated)
    }

    /// Hard- or soft-delete according to the record kind.
    ///
    /// # Errors
    /// `NotFound` before `AccessDenied`.
    #[instrument(skip_all, fields(entity = %T::KIND, principal = %principal.id(), id = %id))]
    pub async fn delete<T>(&self, principal: &Principal, id: Uuid) -> Result<(), DomainError>
    where
        T: Resource,
        Stores: StoreFor<T>,
    {
        let current = self.fetch::<T>(principal, id).await?;
        self.scope
            .check_instance_access(principal, T::KIND, Action::Delete, &current)
            .await?;

        let store = self.store::<T>();
        let mode = match T::DELETION {
            Deletion::Hard => store.delete(id).await.map(|()| "hard"),
            Deletion::Soft => {
                let mut removed = current.clone();
                removed.soft_delete(principal.id());
                store.update_if(id, &current, removed).await.map(|_| "soft")
            }
        }
        .map_err(|e| DomainError::from_store(T::KIND, Some(id), e))?;

        info!(mode, "record deleted");
        Ok(())
    }

    /// Move a stored record to `requested`.
    ///
    /// # Errors
    /// `NotFound`, then `AccessDenied` (update scope), then `IllegalTransition`.
    #[instrument(skip_all, fields(entity = %T::KIND, principal = %principal.id(), id = %id))]
    pub async fn transition<T>(
        &self,
        principal: &Principal,
        id: Uuid,
        requested: T::Status,
    ) -> Result<T, DomainError>
    where
        T: Lifecycle,
        Stores: StoreFor<T>,
    {
        let record = self.fetch::<T>(principal, id).await?;
        self.scope
            .check_instance_access(principal, T::KIND, Action::Update, &record)
            .await?;

        let from = record.status();
        let updated = self.apply_transition(record.clone(), requested)?;
        let updated = self.save(id, &record, updated).await?;
        info!(from = from.label(), to = requested.label(), "status changed");
        Ok(updated)
    }

    /// Load a record, treating records soft-deleted for the caller as absent.
    async fn fetch<T>(&self, principal: &Principal, id: Uuid) -> Result<T, DomainError>
    where
        T: Resource,
        Stores: StoreFor<T>,
    {
        let record = self
            .store::<T>()
            .get_by_id(id)
            .await
            .map_err(|e| DomainError::from_store(T::KIND, Some(id), e))?
            .ok_or_else(|| DomainError::not_found(T::KIND, id))?;
        if !principal.is_admin() && !record.is_visible_to(principal.id()) {
            return Err(DomainError::not_found(T::KIND, id));
        }
        Ok(record)
    }

    /// Write `record` over `expected`, the copy it was derived from.
    ///
    /// # Errors
    /// `Conflict` when another write replaced `expected` first.
    async fn save<T>(&self, id: Uuid, expected: &T, record: T) -> Result<T, DomainError>
    where
        T: Resource,
        Stores: StoreFor<T>,
    {
        self.store::<T>()
            .update_if(id, expected, record)
            .await
            .map_err(|e| DomainError::from_store(T::KIND, Some(id), e))
    }
}
