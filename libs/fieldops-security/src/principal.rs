use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::entity::UnknownName;

/// Role class of an authenticated caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Technician,
    Client,
    Supplier,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Technician, Role::Client, Role::Supplier];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Technician => "technician",
            Role::Client => "client",
            Role::Supplier => "supplier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownName::new("role", s))
    }
}

/// `Principal` is the authenticated actor of a request.
///
/// Identity is asserted by the authentication layer in front of the core and is
/// trusted as-is. Every core call receives it explicitly; there is no ambient
/// request context.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Principal {
    id: Uuid,
    role: Role,
    client_ref: Option<Uuid>,
}

impl Principal {
    #[must_use]
    pub fn new(id: Uuid, role: Role) -> Self {
        Self {
            id,
            role,
            client_ref: None,
        }
    }

    #[must_use]
    pub fn admin(id: Uuid) -> Self {
        Self::new(id, Role::Admin)
    }

    #[must_use]
    pub fn technician(id: Uuid) -> Self {
        Self::new(id, Role::Technician)
    }

    #[must_use]
    pub fn client(id: Uuid) -> Self {
        Self::new(id, Role::Client)
    }

    #[must_use]
    pub fn supplier(id: Uuid) -> Self {
        Self::new(id, Role::Supplier)
    }

    /// Attach the Client record the authentication layer associated with this
    /// account. Informational only: scoping always re-derives the owned set
    /// from `Client.owner_user_id`.
    #[must_use]
    pub fn with_client_ref(mut self, client_id: Uuid) -> Self {
        self.client_ref = Some(client_id);
        self
    }

    /// User id of the caller
    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    #[must_use]
    pub fn client_ref(&self) -> Option<Uuid> {
        self.client_ref
    }

    #[inline]
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
