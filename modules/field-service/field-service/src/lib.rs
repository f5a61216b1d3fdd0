//! Field-service Module Implementation
//!
//! The public contract is defined in `field-service-sdk` and re-exported here.
//! This crate owns access scoping, document numbering and entity lifecycles;
//! transport and authentication live in front of it.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub use field_service_sdk::{
    DocumentKind, DocumentNumber, FieldServiceError, Resource, SequenceKey,
};

pub mod config;
pub mod telemetry;

pub mod domain;
pub mod infra;
pub mod module;

pub use config::FieldServiceConfig;
pub use domain::service::FieldService;
