//! Status transition tables.
//!
//! Every status change goes through [`apply_transition`]; records never have
//! their status assigned directly.

use field_service_sdk::{
    Equipment, EquipmentStatus, Installation, Intervention, Invoice, InvoiceStatus,
    MaintenanceOutcome, MaintenanceRecord, Quote, QuoteRequest, QuoteRequestStatus, QuoteStatus,
    Resource, WorkStatus,
};
use time::OffsetDateTime;

use super::error::DomainError;

/// A closed status enumeration with a fixed successor table.
pub trait Transitions: Copy + Eq + Send + Sync + 'static {
    /// Statuses reachable in one step. Empty for terminal statuses.
    fn successors(self) -> &'static [Self];

    fn label(self) -> &'static str;

    fn can_transition_to(self, next: Self) -> bool {
        self.successors().contains(&next)
    }

    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}

macro_rules! transitions {
    ($status:ident { $($from:ident => [$($to:ident),* $(,)?]),+ $(,)? }) => {
        impl Transitions for $status {
            #[allow(clippy::match_same_arms)]
            fn successors(self) -> &'static [Self] {
                match self {
                    $($status::$from => &[$($status::$to),*],)+
                }
            }

            fn label(self) -> &'static str {
                self.as_str()
            }
        }
    };
}

transitions!(WorkStatus {
    Scheduled => [InProgress, Cancelled],
    InProgress => [Completed, Cancelled],
    Completed => [],
    Cancelled => [],
});

transitions!(QuoteStatus {
    Draft => [Sent],
    Sent => [Accepted, Rejected, Expired],
    Accepted => [],
    Rejected => [],
    Expired => [],
});

transitions!(InvoiceStatus {
    Draft => [Sent],
    Sent => [Paid, Overdue, Cancelled],
    Overdue => [Paid, Cancelled],
    Paid => [],
    Cancelled => [],
});

transitions!(EquipmentStatus {
    Operational => [MaintenanceRequired, Defective, Retired],
    MaintenanceRequired => [Operational, UnderMaintenance, Defective, Retired],
    UnderMaintenance => [MaintenanceRequired, Operational, Defective, Retired],
    Defective => [Retired],
    Retired => [],
});

transitions!(QuoteRequestStatus {
    Open => [Claimed, Closed],
    Claimed => [Quoted, Closed],
    Quoted => [],
    Closed => [],
});

/// A record carrying a lifecycle status.
pub trait Lifecycle: Resource {
    type Status: Transitions;

    fn status(&self) -> Self::Status;

    /// Store `status` and any timestamp tied to entering it.
    fn enter(&mut self, status: Self::Status, at: OffsetDateTime);
}

impl Lifecycle for Intervention {
    type Status = WorkStatus;

    fn status(&self) -> WorkStatus {
        self.status
    }

    fn enter(&mut self, status: WorkStatus, at: OffsetDateTime) {
        if status == WorkStatus::Completed {
            self.completed_at = Some(at);
        }
        self.status = status;
    }
}

impl Lifecycle for Installation {
    type Status = WorkStatus;

    fn status(&self) -> WorkStatus {
        self.status
    }

    fn enter(&mut self, status: WorkStatus, _at: OffsetDateTime) {
        self.status = status;
    }
}

impl Lifecycle for Quote {
    type Status = QuoteStatus;

    fn status(&self) -> QuoteStatus {
        self.status
    }

    fn enter(&mut self, status: QuoteStatus, _at: OffsetDateTime) {
        self.status = status;
    }
}

impl Lifecycle for Invoice {
    type Status = InvoiceStatus;

    fn status(&self) -> InvoiceStatus {
        self.status
    }

    fn enter(&mut self, status: InvoiceStatus, at: OffsetDateTime) {
        if status == InvoiceStatus::Paid {
            self.paid_at = Some(at);
        }
        self.status = status;
    }
}

impl Lifecycle for Equipment {
    type Status = EquipmentStatus;

    fn status(&self) -> EquipmentStatus {
        self.status
    }

    fn enter(&mut self, status: EquipmentStatus, _at: OffsetDateTime) {
        self.status = status;
    }
}

impl Lifecycle for QuoteRequest {
    type Status = QuoteRequestStatus;

    fn status(&self) -> QuoteRequestStatus {
        self.status
    }

    fn enter(&mut self, status: QuoteRequestStatus, _at: OffsetDateTime) {
        self.status = status;
    }
}

/// Move `entity` to `requested` if its transition table allows it.
///
/// # Errors
/// `IllegalTransition` naming both statuses; the entity is dropped unchanged.
pub fn apply_transition<E: Lifecycle>(
    mut entity: E,
    requested: E::Status,
    at: OffsetDateTime,
) -> Result<E, DomainError> {
    let current = entity.status();
    if !current.can_transition_to(requested) {
        return Err(DomainError::illegal_transition(
            E::KIND,
            current.label(),
            requested.label(),
        ));
    }
    entity.enter(requested, at);
    Ok(entity)
}

/// Append a maintenance record and apply its effect on the equipment status.
///
/// # Errors
/// `Validation` for retired equipment.
pub fn record_maintenance(
    mut equipment: Equipment,
    record: MaintenanceRecord,
) -> Result<Equipment, DomainError> {
    if equipment.status.is_terminal() {
        return Err(DomainError::validation(
            "status",
            format!("{} equipment accepts no maintenance records", equipment.status),
        ));
    }

    let at = record.performed_at;
    let next = match record.outcome {
        MaintenanceOutcome::Routine => None,
        MaintenanceOutcome::Completed => {
            equipment.last_maintenance_date = Some(at);
            (equipment.status == EquipmentStatus::UnderMaintenance)
                .then_some(EquipmentStatus::Operational)
        }
        MaintenanceOutcome::FaultDetected => (equipment.status != EquipmentStatus::Defective)
            .then_some(EquipmentStatus::Defective),
    };
    equipment.maintenance_history.push(record);

    match next {
        Some(status) => apply_transition(equipment, status, at),
        None => Ok(equipment),
    }
}
