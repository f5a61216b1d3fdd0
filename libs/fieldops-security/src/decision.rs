use crate::access_scope::{ScopePredicate, ScopeSubject};

/// Outcome of scope resolution for one principal, entity kind and action.
///
/// A denied decision always carries `ScopePredicate::Nothing`, so applying its
/// filter to a query can never leak records.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScopeDecision {
    pub allowed: bool,
    pub filter: ScopePredicate,
}

impl ScopeDecision {
    #[must_use]
    pub fn allow(filter: ScopePredicate) -> Self {
        Self {
            allowed: true,
            filter,
        }
    }

    #[must_use]
    pub fn deny() -> Self {
        Self {
            allowed: false,
            filter: ScopePredicate::Nothing,
        }
    }

    /// True when the decision is allowed and the record satisfies its filter.
    #[must_use]
    pub fn permits<S>(&self, subject: &S) -> bool
    where
        S: ScopeSubject + ?Sized,
    {
        self.allowed && self.filter.matches(subject)
    }
}
