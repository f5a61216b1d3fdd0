#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
pub mod access_scope;
pub mod decision;
pub mod entity;
pub mod policy_engine;
pub mod prelude;
pub mod principal;

pub use access_scope::{ScopePredicate, ScopeSubject};
pub use decision::ScopeDecision;
pub use entity::{Action, EntityKind, UnknownName};
pub use policy_engine::{PolicyEngine, PolicyEngineRef, ScopeRule, StaticPolicyTable};
pub use principal::{Principal, Role};
