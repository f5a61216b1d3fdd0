pub use crate::{
    Action, EntityKind, PolicyEngine, PolicyEngineRef, Principal, Role, ScopeDecision,
    ScopePredicate, ScopeRule, ScopeSubject, StaticPolicyTable,
};
