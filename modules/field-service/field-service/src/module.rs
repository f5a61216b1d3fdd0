//! Module wiring.

use std::sync::Arc;

use anyhow::Context;
use fieldops_security::StaticPolicyTable;
use tracing::info;

use crate::config::{DocumentsConfig, FieldServiceConfig};
use crate::domain::ports::{ClockRef, SystemClock};
use crate::domain::service::FieldService;
use crate::infra::storage::{InMemoryCounterStore, SeaOrmCounterStore, in_memory_stores};

/// Build the service from configuration.
///
/// Document counters live in the configured database, which is migrated on
/// connect. Entity records are held in memory.
///
/// # Errors
/// Returns an error if the configuration is invalid or the counter database
/// cannot be opened and migrated.
pub async fn init(config: &FieldServiceConfig) -> anyhow::Result<FieldService> {
    info!("Initializing field-service module");
    config.validate()?;

    let counters = SeaOrmCounterStore::connect(&config.database)
        .await
        .context("failed to open the document counter store")?;

    let service = FieldService::new(
        in_memory_stores(),
        Arc::new(StaticPolicyTable::default()),
        Arc::new(counters),
        Arc::new(SystemClock),
        config.documents.clone(),
    );
    info!("field-service module initialized");
    Ok(service)
}

/// Fully in-memory service with the default policy table.
#[must_use]
pub fn in_memory(clock: ClockRef, documents: DocumentsConfig) -> FieldService {
    FieldService::new(
        in_memory_stores(),
        Arc::new(StaticPolicyTable::default()),
        Arc::new(InMemoryCounterStore::new()),
        clock,
        documents,
    )
}
