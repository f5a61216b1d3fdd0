use std::fmt;

use uuid::Uuid;

/// Scope dimensions a record exposes to the predicate evaluator.
///
/// Each implementor must answer every dimension explicitly: `None` (or an
/// empty participant list) means the record does not carry that dimension,
/// and any predicate over it fails to match.
///
/// # Example
/// ```rust,ignore
/// impl ScopeSubject for Equipment {
///     fn resource_id(&self) -> Uuid { self.id }
///     fn owner_user_id(&self) -> Option<Uuid> { None }
///     fn client_id(&self) -> Option<Uuid> { Some(self.client_id) }
///     fn technician_id(&self) -> Option<Uuid> { self.technician_id }
///     fn creator_id(&self) -> Option<Uuid> { None }
///     fn participant_ids(&self) -> Vec<Uuid> { Vec::new() }
/// }
/// ```
pub trait ScopeSubject {
    /// Primary identifier of the record.
    fn resource_id(&self) -> Uuid;

    /// User account owning the record (the portal account of a Client).
    fn owner_user_id(&self) -> Option<Uuid>;

    /// Client company the record belongs to. A Client answers with its own id.
    fn client_id(&self) -> Option<Uuid>;

    /// Technician assigned to the record, if any.
    fn technician_id(&self) -> Option<Uuid>;

    /// User who authored the record (quote author, product supplier, message sender).
    fn creator_id(&self) -> Option<Uuid>;

    /// Users taking part in a conversation record.
    fn participant_ids(&self) -> Vec<Uuid>;
}

/// Declarative filter describing which records a principal may act on.
///
/// The same vocabulary is used for every entity kind; stores evaluate it
/// against [`ScopeSubject`] dimensions, never against per-entity query text.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum ScopePredicate {
    /// Every record.
    Any,
    /// No record.
    Nothing,
    /// `owner_user_id == user`
    ByOwnerUser(Uuid),
    /// `client_id IN clients`. An empty set matches nothing.
    ByOwnerClient(Vec<Uuid>),
    /// `technician_id == technician`
    ByAssignedTechnician(Uuid),
    /// `technician_id IS NULL`
    Unassigned,
    /// `creator_id == user`
    ByCreator(Uuid),
    /// `user IN participant_ids`
    ByParticipant(Uuid),
    /// `resource_id == user`
    ByIdentity(Uuid),
    /// Disjunction of the inner predicates.
    AnyOf(Vec<ScopePredicate>),
}

impl ScopePredicate {
    /// Build a disjunction, flattening nested `AnyOf` and collapsing trivial cases.
    #[must_use]
    pub fn any_of(predicates: impl IntoIterator<Item = ScopePredicate>) -> Self {
        let mut parts = Vec::new();
        for predicate in predicates {
            match predicate {
                ScopePredicate::Any => return ScopePredicate::Any,
                ScopePredicate::Nothing => {}
                ScopePredicate::AnyOf(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => ScopePredicate::Nothing,
            1 => parts.remove(0),
            _ => ScopePredicate::AnyOf(parts),
        }
    }

    #[must_use]
    pub fn or(self, other: ScopePredicate) -> Self {
        Self::any_of([self, other])
    }

    /// Returns true if this predicate places no restriction at all.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        match self {
            ScopePredicate::Any => true,
            ScopePredicate::AnyOf(parts) => parts.iter().any(Self::is_unrestricted),
            _ => false,
        }
    }

    /// Returns true if no record can ever satisfy this predicate.
    #[must_use]
    pub fn denies_all(&self) -> bool {
        match self {
            ScopePredicate::Nothing => true,
            ScopePredicate::ByOwnerClient(clients) => clients.is_empty(),
            ScopePredicate::AnyOf(parts) => parts.iter().all(Self::denies_all),
            _ => false,
        }
    }

    /// Evaluate the predicate against a single record.
    #[must_use]
    pub fn matches<S>(&self, subject: &S) -> bool
    where
        S: ScopeSubject + ?Sized,
    {
        match self {
            ScopePredicate::Any => true,
            ScopePredicate::Nothing => false,
            ScopePredicate::ByOwnerUser(user) => subject.owner_user_id() == Some(*user),
            ScopePredicate::ByOwnerClient(clients) => subject
                .client_id()
                .is_some_and(|client| clients.contains(&client)),
            ScopePredicate::ByAssignedTechnician(technician) => {
                subject.technician_id() == Some(*technician)
            }
            ScopePredicate::Unassigned => subject.technician_id().is_none(),
            ScopePredicate::ByCreator(user) => subject.creator_id() == Some(*user),
            ScopePredicate::ByParticipant(user) => subject.participant_ids().contains(user),
            ScopePredicate::ByIdentity(user) => subject.resource_id() == *user,
            ScopePredicate::AnyOf(parts) => parts.iter().any(|p| p.matches(subject)),
        }
    }
}

impl fmt::Display for ScopePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopePredicate::Any => f.write_str("any"),
            ScopePredicate::Nothing => f.write_str("nothing"),
            ScopePredicate::ByOwnerUser(user) => write!(f, "owner_user={user}"),
            ScopePredicate::ByOwnerClient(clients) => {
                write!(f, "client_in[{}]", clients.len())
            }
            ScopePredicate::ByAssignedTechnician(t) => write!(f, "technician={t}"),
            ScopePredicate::Unassigned => f.write_str("unassigned"),
            ScopePredicate::ByCreator(user) => write!(f, "creator={user}"),
            ScopePredicate::ByParticipant(user) => write!(f, "participant={user}"),
            ScopePredicate::ByIdentity(user) => write!(f, "self={user}"),
            ScopePredicate::AnyOf(parts) => {
                f.write_str("(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str(")")
            }
        }
    }
}
