use crate::entity::{Action, EntityKind};
use crate::principal::Role;

/// Type alias for a reference-counted Policy Engine
pub type PolicyEngineRef = std::sync::Arc<dyn PolicyEngine>;

/// How an action granted by the policy is narrowed for the calling principal.
///
/// Rules are templates: the scope resolver binds them to the principal (and,
/// for the client-set rules, to the Client ids looked up in the store) to
/// produce a concrete `ScopePredicate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeRule {
    /// Action not permitted.
    Deny,
    /// `ScopePredicate::Any`
    Unrestricted,
    /// Records owned by the principal's user account (`ByOwnerUser`).
    OwnedByPrincipal,
    /// Records of Clients owned by the principal (`ByOwnerClient` over the owned set).
    PrincipalClients,
    /// Records of Clients the technician serves (`ByOwnerClient` over the served set).
    ServedClients,
    /// Records assigned to the principal (`ByAssignedTechnician`).
    AssignedToPrincipal,
    /// Records assigned to the principal or still unclaimed.
    AssignedOrUnclaimed,
    /// Records authored by the principal (`ByCreator`).
    CreatedByPrincipal,
    /// Records the principal takes part in (`ByParticipant`).
    ParticipantPrincipal,
    /// The principal's own user record (`ByIdentity`).
    PrincipalItself,
}

impl ScopeRule {
    #[must_use]
    pub fn is_denied(self) -> bool {
        self == ScopeRule::Deny
    }
}

/// Policy Engine - maps (role, entity kind, action) to the rule narrowing it.
pub trait PolicyEngine: Send + Sync {
    fn rule(&self, role: Role, entity: EntityKind, action: Action) -> ScopeRule;
}

/// One row of the role policy table.
///
/// `read` covers both `list` and `read`; `delete` covers soft and hard deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolicyEntry {
    pub role: Role,
    pub entity: EntityKind,
    pub read: ScopeRule,
    pub create: ScopeRule,
    pub update: ScopeRule,
    pub delete: ScopeRule,
}

impl PolicyEntry {
    const fn new(
        role: Role,
        entity: EntityKind,
        [read, create, update, delete]: [ScopeRule; 4],
    ) -> Self {
        Self {
            role,
            entity,
            read,
            create,
            update,
            delete,
        }
    }

    #[must_use]
    pub fn rule_for(&self, action: Action) -> ScopeRule {
        match action {
            Action::List | Action::Read => self.read,
            Action::Create => self.create,
            Action::Update => self.update,
            Action::Delete => self.delete,
        }
    }
}

use ScopeRule::{
    AssignedOrUnclaimed, AssignedToPrincipal, CreatedByPrincipal, Deny, OwnedByPrincipal,
    ParticipantPrincipal, PrincipalClients, PrincipalItself, ServedClients, Unrestricted,
};

const ALL: [ScopeRule; 4] = [Unrestricted, Unrestricted, Unrestricted, Unrestricted];
const NONE: [ScopeRule; 4] = [Deny, Deny, Deny, Deny];
const READ_ONLY_ANY: [ScopeRule; 4] = [Unrestricted, Deny, Deny, Deny];
const ASSIGNED: [ScopeRule; 4] = [
    AssignedToPrincipal,
    AssignedToPrincipal,
    AssignedToPrincipal,
    Deny,
];
const AUTHORED: [ScopeRule; 4] = [
    CreatedByPrincipal,
    CreatedByPrincipal,
    CreatedByPrincipal,
    Deny,
];
const CLIENT_READ: [ScopeRule; 4] = [PrincipalClients, Deny, Deny, Deny];
const SELF_ONLY: [ScopeRule; 4] = [PrincipalItself, Deny, PrincipalItself, Deny];
const CONVERSATION: [ScopeRule; 4] = [
    ParticipantPrincipal,
    CreatedByPrincipal,
    ParticipantPrincipal,
    ParticipantPrincipal,
];

/// The authoritative role policy table.
///
/// Missing rows are denied. Adding a role or an entity kind is a table edit.
pub const POLICY_TABLE: &[PolicyEntry] = &[
    // admin
    PolicyEntry::new(Role::Admin, EntityKind::Client, ALL),
    PolicyEntry::new(Role::Admin, EntityKind::Equipment, ALL),
    PolicyEntry::new(Role::Admin, EntityKind::Intervention, ALL),
    PolicyEntry::new(Role::Admin, EntityKind::Installation, ALL),
    PolicyEntry::new(Role::Admin, EntityKind::Quote, ALL),
    PolicyEntry::new(Role::Admin, EntityKind::Invoice, ALL),
    PolicyEntry::new(Role::Admin, EntityKind::Product, ALL),
    PolicyEntry::new(Role::Admin, EntityKind::User, ALL),
    PolicyEntry::new(Role::Admin, EntityKind::Message, ALL),
    PolicyEntry::new(Role::Admin, EntityKind::QuoteRequest, ALL),
    // technician
    PolicyEntry::new(
        Role::Technician,
        EntityKind::Client,
        [ServedClients, Deny, Deny, Deny],
    ),
    PolicyEntry::new(Role::Technician, EntityKind::Equipment, ASSIGNED),
    PolicyEntry::new(Role::Technician, EntityKind::Intervention, ASSIGNED),
    PolicyEntry::new(Role::Technician, EntityKind::Installation, ASSIGNED),
    PolicyEntry::new(Role::Technician, EntityKind::Quote, AUTHORED),
    PolicyEntry::new(Role::Technician, EntityKind::Invoice, AUTHORED),
    PolicyEntry::new(Role::Technician, EntityKind::Product, READ_ONLY_ANY),
    PolicyEntry::new(Role::Technician, EntityKind::User, SELF_ONLY),
    PolicyEntry::new(Role::Technician, EntityKind::Message, CONVERSATION),
    PolicyEntry::new(
        Role::Technician,
        EntityKind::QuoteRequest,
        [AssignedOrUnclaimed, Deny, AssignedOrUnclaimed, Deny],
    ),
    // client
    PolicyEntry::new(
        Role::Client,
        EntityKind::Client,
        [OwnedByPrincipal, Deny, OwnedByPrincipal, Deny],
    ),
    PolicyEntry::new(Role::Client, EntityKind::Equipment, CLIENT_READ),
    PolicyEntry::new(Role::Client, EntityKind::Intervention, CLIENT_READ),
    PolicyEntry::new(Role::Client, EntityKind::Installation, CLIENT_READ),
    PolicyEntry::new(Role::Client, EntityKind::Quote, CLIENT_READ),
    PolicyEntry::new(Role::Client, EntityKind::Invoice, CLIENT_READ),
    PolicyEntry::new(Role::Client, EntityKind::Product, READ_ONLY_ANY),
    PolicyEntry::new(Role::Client, EntityKind::User, SELF_ONLY),
    PolicyEntry::new(Role::Client, EntityKind::Message, CONVERSATION),
    PolicyEntry::new(
        Role::Client,
        EntityKind::QuoteRequest,
        [PrincipalClients, PrincipalClients, Deny, Deny],
    ),
    // supplier
    PolicyEntry::new(Role::Supplier, EntityKind::Client, NONE),
    PolicyEntry::new(Role::Supplier, EntityKind::Equipment, NONE),
    PolicyEntry::new(Role::Supplier, EntityKind::Intervention, NONE),
    PolicyEntry::new(Role::Supplier, EntityKind::Installation, NONE),
    PolicyEntry::new(Role::Supplier, EntityKind::Quote, NONE),
    PolicyEntry::new(Role::Supplier, EntityKind::Invoice, NONE),
    PolicyEntry::new(
        Role::Supplier,
        EntityKind::Product,
        [CreatedByPrincipal, CreatedByPrincipal, CreatedByPrincipal, CreatedByPrincipal],
    ),
    PolicyEntry::new(Role::Supplier, EntityKind::User, SELF_ONLY),
    PolicyEntry::new(Role::Supplier, EntityKind::Message, CONVERSATION),
    PolicyEntry::new(Role::Supplier, EntityKind::QuoteRequest, NONE),
];

/// Policy engine backed by a static table (by default [`POLICY_TABLE`]).
#[derive(Clone, Copy, Debug)]
pub struct StaticPolicyTable {
    entries: &'static [PolicyEntry],
}

impl StaticPolicyTable {
    #[must_use]
    pub fn new(entries: &'static [PolicyEntry]) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &'static [PolicyEntry] {
        self.entries
    }

    #[must_use]
    pub fn entry(&self, role: Role, entity: EntityKind) -> Option<&'static PolicyEntry> {
        self.entries
            .iter()
            .find(|e| e.role == role && e.entity == entity)
    }
}

impl Default for StaticPolicyTable {
    fn default() -> Self {
        Self::new(POLICY_TABLE)
    }
}

impl PolicyEngine for StaticPolicyTable {
    fn rule(&self, role: Role, entity: EntityKind, action: Action) -> ScopeRule {
        self.entry(role, entity)
            .map_or(ScopeRule::Deny, |entry| entry.rule_for(action))
    }
}
