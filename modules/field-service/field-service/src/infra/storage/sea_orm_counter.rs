//! Document counters persisted through SeaORM.

use std::time::Duration;

use async_trait::async_trait;
use field_service_sdk::SequenceKey;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, DbErr, EntityTrait, QuerySelect, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use super::entity::{self, Entity as SequenceCounters};
use super::migrations::Migrator;
use crate::config::DatabaseConfig;
use crate::domain::repo::{CounterStore, StoreError};

/// Counter store over the `sequence_counters` table.
///
/// Backends with `RETURNING` increment in one upsert statement. Others run
/// a transaction holding an exclusive lock on the counter row.
pub struct SeaOrmCounterStore {
    db: DatabaseConnection,
    timeout: Duration,
}

impl SeaOrmCounterStore {
    #[must_use]
    pub fn new(db: DatabaseConnection, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    /// Connect to `config.url` and bring the schema up to date.
    ///
    /// SQLite is opened with a single pooled connection: writers serialize on
    /// it, and an in-memory database stays one database.
    ///
    /// # Errors
    /// Returns an error if the connection or a migration fails.
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let mut options = ConnectOptions::new(config.url.as_str());
        options.sqlx_logging(false);
        if config.url.starts_with("sqlite:") {
            options.max_connections(1);
        }
        let db = Database::connect(options).await?;
        Migrator::up(&db, None).await?;
        info!(
            timeout = %humantime::format_duration(config.store_timeout),
            "sequence counter store ready"
        );
        Ok(Self::new(db, config.store_timeout))
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn upsert_returning(&self, key: &SequenceKey) -> Result<i64, DbErr> {
        let row = SequenceCounters::insert(entity::ActiveModel {
            kind: Set(key.kind.as_str().to_owned()),
            year: Set(key.year),
            last_value: Set(1),
        })
        .on_conflict(
            OnConflict::columns([entity::Column::Kind, entity::Column::Year])
                .value(
                    entity::Column::LastValue,
                    Expr::col((SequenceCounters, entity::Column::LastValue)).add(1),
                )
                .to_owned(),
        )
        .exec_with_returning(&self.db)
        .await?;
        Ok(row.last_value)
    }

    /// Increment under `SELECT .. FOR UPDATE` for backends without `RETURNING`.
    ///
    /// The row is seeded at zero first with an upsert that leaves an existing
    /// value alone, so the lock always has a row to wait on and two first
    /// increments queue instead of both inserting.
    async fn increment_locked(&self, key: &SequenceKey) -> Result<i64, DbErr> {
        let txn = self.db.begin().await?;

        SequenceCounters::insert(entity::ActiveModel {
            kind: Set(key.kind.as_str().to_owned()),
            year: Set(key.year),
            last_value: Set(0),
        })
        .on_conflict(
            OnConflict::columns([entity::Column::Kind, entity::Column::Year])
                .value(
                    entity::Column::LastValue,
                    Expr::col((SequenceCounters, entity::Column::LastValue)),
                )
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let model = SequenceCounters::find_by_id((key.kind.as_str().to_owned(), key.year))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("counter {key}")))?;

        let value = model.last_value + 1;
        let mut active: entity::ActiveModel = model.into();
        active.last_value = Set(value);
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(value)
    }
}

#[async_trait]
impl CounterStore for SeaOrmCounterStore {
    async fn increment_counter(&self, key: &SequenceKey) -> Result<u64, StoreError> {
        let increment = async {
            if self.db.support_returning() {
                self.upsert_returning(key).await
            } else {
                self.increment_locked(key).await
            }
        };

        let value = tokio::time::timeout(self.timeout, increment)
            .await
            .map_err(|_| {
                StoreError::Unavailable(format!(
                    "counter {key} not incremented within {}",
                    humantime::format_duration(self.timeout)
                ))
            })?
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        debug!(key = %key, value, "counter incremented");
        u64::try_from(value)
            .map_err(|_| StoreError::Conflict(format!("counter {key} holds {value}")))
    }
}
