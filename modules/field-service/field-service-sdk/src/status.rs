//! Closed status enumerations.
//!
//! Legal transitions between these values are owned by the module's lifecycle
//! tables; the SDK only names the states.

use std::fmt;
use std::str::FromStr;

/// Error returned when a status name is not part of its enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {entity} status: '{value}'")]
pub struct UnknownStatus {
    pub entity: &'static str,
    pub value: String,
}

macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident for $entity:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(UnknownStatus {
                        entity: $entity,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

status_enum! {
    /// Status of scheduled field work (interventions and installations).
    WorkStatus for "work" {
        Scheduled => "scheduled",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

pub type InterventionStatus = WorkStatus;
pub type InstallationStatus = WorkStatus;

status_enum! {
    QuoteStatus for "quote" {
        Draft => "draft",
        Sent => "sent",
        Accepted => "accepted",
        Rejected => "rejected",
        Expired => "expired",
    }
}

status_enum! {
    InvoiceStatus for "invoice" {
        Draft => "draft",
        Sent => "sent",
        Paid => "paid",
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
}

status_enum! {
    EquipmentStatus for "equipment" {
        Operational => "operational",
        MaintenanceRequired => "maintenance_required",
        UnderMaintenance => "under_maintenance",
        Defective => "defective",
        Retired => "retired",
    }
}

status_enum! {
    /// Status of a client's request for a quote.
    QuoteRequestStatus for "quote_request" {
        Open => "open",
        Claimed => "claimed",
        Quoted => "quoted",
        Closed => "closed",
    }
}
