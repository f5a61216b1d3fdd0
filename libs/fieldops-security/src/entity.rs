use std::fmt;
use std::str::FromStr;

/// Error returned when parsing a role, entity kind or action name fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: '{value}'")]
pub struct UnknownName {
    what: &'static str,
    value: String,
}

impl UnknownName {
    pub(crate) fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_owned(),
        }
    }
}

/// Resource types subject to access scoping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Client,
    Equipment,
    Intervention,
    Installation,
    Quote,
    Invoice,
    Product,
    User,
    Message,
    QuoteRequest,
}

impl EntityKind {
    pub const ALL: [EntityKind; 10] = [
        EntityKind::Client,
        EntityKind::Equipment,
        EntityKind::Intervention,
        EntityKind::Installation,
        EntityKind::Quote,
        EntityKind::Invoice,
        EntityKind::Product,
        EntityKind::User,
        EntityKind::Message,
        EntityKind::QuoteRequest,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Client => "client",
            EntityKind::Equipment => "equipment",
            EntityKind::Intervention => "intervention",
            EntityKind::Installation => "installation",
            EntityKind::Quote => "quote",
            EntityKind::Invoice => "invoice",
            EntityKind::Product => "product",
            EntityKind::User => "user",
            EntityKind::Message => "message",
            EntityKind::QuoteRequest => "quote_request",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownName::new("entity kind", s))
    }
}

/// Operation a principal wants to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    List,
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::List,
        Action::Read,
        Action::Create,
        Action::Update,
        Action::Delete,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Collection-level actions answer with an empty result instead of a
    /// denial when the caller's ownership set is empty.
    #[must_use]
    pub fn is_collection(self) -> bool {
        matches!(self, Action::List)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownName::new("action", s))
    }
}
