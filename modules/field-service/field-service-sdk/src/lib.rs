//! Field-service SDK
//!
//! Transport-agnostic contract of the field-service module: the records it
//! manages, their status enumerations, document numbering types and the
//! public error type.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod document;
pub mod errors;
pub mod models;
pub mod resource;
pub mod status;

pub use document::{DocumentKind, DocumentNumber, InvalidDocumentNumber, SequenceKey};
pub use errors::FieldServiceError;
pub use models::{
    Client, ContactInfo, DocumentTotals, Equipment, GeoPoint, Installation, Intervention, Invoice,
    LineItem, MaintenanceOutcome, MaintenanceRecord, Message, NewInvoice, NewMaintenanceRecord,
    NewQuote, Product, Quote, QuoteRequest, User,
};
pub use resource::{Deletion, Resource};
pub use status::{
    EquipmentStatus, InstallationStatus, InterventionStatus, InvoiceStatus, QuoteRequestStatus,
    QuoteStatus, UnknownStatus, WorkStatus,
};
