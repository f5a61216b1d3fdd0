use field_service_sdk::{Equipment, MaintenanceRecord, NewMaintenanceRecord, Resource};
use fieldops_security::{Action, Principal, Role};
use tracing::{info, instrument};
use uuid::Uuid;

use super::FieldService;
use crate::domain::error::DomainError;
use crate::domain::lifecycle::record_maintenance;

impl FieldService {
    /// Append a maintenance record to an equipment's history.
    ///
    /// A technician is recorded as the performer; an admin entry has none.
    ///
    /// # Errors
    /// `NotFound`, then `AccessDenied`, then `Validation` for an empty
    /// description or retired equipment.
    #[instrument(skip_all, fields(principal = %principal.id(), equipment = %equipment_id))]
    pub async fn add_maintenance_record(
        &self,
        principal: &Principal,
        equipment_id: Uuid,
        input: NewMaintenanceRecord,
    ) -> Result<Equipment, DomainError> {
        let equipment = self.fetch::<Equipment>(principal, equipment_id).await?;
        self.scope
            .check_instance_access(principal, Equipment::KIND, Action::Update, &equipment)
            .await?;

        if input.description.trim().is_empty() {
            return Err(DomainError::validation("description", "must not be empty"));
        }
        let record = MaintenanceRecord {
            performed_at: self.clock.now(),
            technician_id: (principal.role() == Role::Technician).then_some(principal.id()),
            description: input.description,
            outcome: input.outcome,
        };

        let updated = record_maintenance(equipment.clone(), record)?;
        let equipment = self.save(equipment_id, &equipment, updated).await?;
        info!(
            status = %equipment.status,
            entries = equipment.maintenance_history.len(),
            "maintenance recorded"
        );
        Ok(equipment)
    }
}
