//! Access scope resolution.
//!
//! The role-policy table names a [`ScopeRule`] per role, entity kind and
//! action; the resolver turns that rule into a concrete [`ScopePredicate`]
//! for one principal, looking up the principal's Client set when the rule
//! depends on it.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use fieldops_security::{
    Action, EntityKind, PolicyEngineRef, Principal, ScopeDecision, ScopePredicate, ScopeRule,
    ScopeSubject,
};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::error::DomainError;
use super::repo::{StoreError, Stores};

/// Resolves the Client sets scoping depends on.
#[async_trait]
pub trait OwnershipDirectory: Send + Sync {
    /// Clients whose `owner_user_id` is `user`.
    async fn clients_owned_by(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError>;

    /// Clients of the equipment, interventions and installations assigned to `technician`.
    async fn clients_served_by(&self, technician: Uuid) -> Result<Vec<Uuid>, StoreError>;
}

/// Directory answering from the entity stores.
pub struct StoreBackedDirectory {
    stores: Stores,
}

impl StoreBackedDirectory {
    #[must_use]
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }
}

#[async_trait]
impl OwnershipDirectory for StoreBackedDirectory {
    async fn clients_owned_by(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let owned = self
            .stores
            .clients
            .query(&ScopePredicate::ByOwnerUser(user))
            .await?;
        Ok(owned.into_iter().map(|client| client.id).collect())
    }

    async fn clients_served_by(&self, technician: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let assigned = ScopePredicate::ByAssignedTechnician(technician);
        let mut served = BTreeSet::new();

        let equipment = self.stores.equipment.query(&assigned).await?;
        served.extend(equipment.into_iter().map(|e| e.client_id));

        let interventions = self.stores.interventions.query(&assigned).await?;
        served.extend(interventions.into_iter().map(|i| i.client_id));

        let installations = self.stores.installations.query(&assigned).await?;
        served.extend(installations.into_iter().map(|i| i.client_id));

        Ok(served.into_iter().collect())
    }
}

pub struct ScopeResolver {
    policy: PolicyEngineRef,
    directory: Arc<dyn OwnershipDirectory>,
}

impl ScopeResolver {
    #[must_use]
    pub fn new(policy: PolicyEngineRef, directory: Arc<dyn OwnershipDirectory>) -> Self {
        Self { policy, directory }
    }

    /// Compute the decision for `principal` acting on `entity` records.
    ///
    /// Rules over a Client set follow one convention: an empty set yields an
    /// empty listing for `list`, and a denial for every other action.
    ///
    /// # Errors
    /// `StoreUnavailable` when the Client set cannot be looked up.
    #[instrument(
        skip_all,
        fields(principal = %principal.id(), role = %principal.role(), entity = %entity, action = %action)
    )]
    pub async fn resolve_scope(
        &self,
        principal: &Principal,
        entity: EntityKind,
        action: Action,
    ) -> Result<ScopeDecision, DomainError> {
        let me = principal.id();
        let decision = match self.policy.rule(principal.role(), entity, action) {
            ScopeRule::Deny => ScopeDecision::deny(),
            ScopeRule::Unrestricted => ScopeDecision::allow(ScopePredicate::Any),
            ScopeRule::OwnedByPrincipal => ScopeDecision::allow(ScopePredicate::ByOwnerUser(me)),
            ScopeRule::PrincipalClients => {
                let owned = self
                    .directory
                    .clients_owned_by(me)
                    .await
                    .map_err(|e| DomainError::from_store(EntityKind::Client, None, e))?;
                client_set_decision(owned, action)
            }
            ScopeRule::ServedClients => {
                let served = self
                    .directory
                    .clients_served_by(me)
                    .await
                    .map_err(|e| DomainError::from_store(EntityKind::Client, None, e))?;
                client_set_decision(served, action)
            }
            ScopeRule::AssignedToPrincipal => {
                ScopeDecision::allow(ScopePredicate::ByAssignedTechnician(me))
            }
            ScopeRule::AssignedOrUnclaimed => ScopeDecision::allow(
                ScopePredicate::ByAssignedTechnician(me).or(ScopePredicate::Unassigned),
            ),
            ScopeRule::CreatedByPrincipal => ScopeDecision::allow(ScopePredicate::ByCreator(me)),
            ScopeRule::ParticipantPrincipal => {
                ScopeDecision::allow(ScopePredicate::ByParticipant(me))
            }
            ScopeRule::PrincipalItself => ScopeDecision::allow(ScopePredicate::ByIdentity(me)),
        };

        debug!(allowed = decision.allowed, filter = %decision.filter, "scope resolved");
        Ok(decision)
    }

    /// Resolve the scope and fail unless the action is allowed at all.
    ///
    /// # Errors
    /// `AccessDenied` for a denied decision; resolution errors as-is.
    pub async fn authorize(
        &self,
        principal: &Principal,
        entity: EntityKind,
        action: Action,
    ) -> Result<ScopePredicate, DomainError> {
        let decision = self.resolve_scope(principal, entity, action).await?;
        if decision.allowed {
            return Ok(decision.filter);
        }
        warn!(
            principal = %principal.id(),
            role = %principal.role(),
            entity = %entity,
            action = %action,
            "access denied"
        );
        Err(DomainError::access_denied(entity, action))
    }

    /// Verify that an already-fetched (or prospective) record satisfies the
    /// principal's scope for `action`.
    ///
    /// # Errors
    /// `AccessDenied` when the decision is denied or the record falls outside
    /// its filter; resolution errors as-is.
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
        let decision = self.resolve_scope(principal, entity, action).await?;
        if decision.permits(instance) {
            return Ok(());
        }
        warn!(
            principal = %principal.id(),
            role = %principal.role(),
            entity = %entity,
            action = %action,
            resource = %instance.resource_id(),
            "instance access denied"
        );
        Err(DomainError::access_denied(entity, action))
    }
}

fn client_set_decision(clients: Vec<Uuid>, action: Action) -> ScopeDecision {
    if clients.is_empty() && !action.is_collection() {
        ScopeDecision::deny()
    } else {
        ScopeDecision::allow(ScopePredicate::ByOwnerClient(clients))
    }
}
