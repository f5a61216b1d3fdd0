//! Storage adapters for the field-service module.

pub mod counter_repo;
pub mod entity;
pub mod in_memory_repo;
pub mod migrations;
pub mod sea_orm_counter;

pub use counter_repo::InMemoryCounterStore;
pub use in_memory_repo::{InMemoryEntityStore, in_memory_stores};
pub use sea_orm_counter::SeaOrmCounterStore;
