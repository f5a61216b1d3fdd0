//! Public models for the field-service module.
//!
//! These are transport-agnostic data structures that define the contract
//! between the field-service module and its consumers.

use fieldops_security::Role;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::document::DocumentNumber;
use crate::status::{
    EquipmentStatus, InvoiceStatus, QuoteRequestStatus, QuoteStatus, WorkStatus,
};

/// Portal or staff account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub active: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Customer company. Owned by exactly one portal user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub contact: ContactInfo,
    pub active: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaintenanceOutcome {
    /// Inspection or servicing with no status effect.
    Routine,
    /// Maintenance finished; equipment under maintenance returns to service.
    Completed,
    /// A fault was found; equipment becomes defective.
    FaultDetected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceRecord {
    pub performed_at: OffsetDateTime,
    pub technician_id: Option<Uuid>,
    pub description: String,
    pub outcome: MaintenanceOutcome,
}

/// Input for appending a maintenance record; author and timestamp are filled in by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMaintenanceRecord {
    pub description: String,
    pub outcome: MaintenanceOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equipment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub name: String,
    pub serial_number: Option<String>,
    pub status: EquipmentStatus,
    pub maintenance_history: Vec<MaintenanceRecord>,
    pub last_maintenance_date: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Intervention {
    pub id: Uuid,
    pub client_id: Uuid,
    pub technician_id: Uuid,
    pub equipment_id: Option<Uuid>,
    pub scheduled_date: OffsetDateTime,
    pub status: WorkStatus,
    pub description: String,
    pub technician_location: Option<GeoPoint>,
    pub completed_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub client_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub scheduled_date: Option<OffsetDateTime>,
    pub status: WorkStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl LineItem {
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// Monetary totals of a quote or invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl DocumentTotals {
    /// `tax_rate` is a percentage; the tax amount is rounded to cents.
    #[must_use]
    pub fn compute(items: &[LineItem], tax_rate: Decimal) -> Self {
        let subtotal: Decimal = items.iter().map(LineItem::amount).sum();
        let tax_amount = (subtotal * tax_rate / Decimal::ONE_HUNDRED).round_dp(2);
        Self {
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub id: Uuid,
    pub number: DocumentNumber,
    pub client_id: Uuid,
    pub author_user_id: Uuid,
    pub items: Vec<LineItem>,
    pub tax_rate: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub status: QuoteStatus,
    pub valid_until: Option<OffsetDateTime>,
    /// The invoice billing this quote, once one has been issued.
    pub invoice_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuote {
    pub client_id: Uuid,
    pub items: Vec<LineItem>,
    /// Defaults to the configured tax rate when absent.
    pub tax_rate: Option<Decimal>,
    pub valid_until: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub id: Uuid,
    pub number: DocumentNumber,
    pub client_id: Uuid,
    pub author_user_id: Uuid,
    pub quote_id: Option<Uuid>,
    pub items: Vec<LineItem>,
    pub tax_rate: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub status: InvoiceStatus,
    pub due_date: Option<OffsetDateTime>,
    pub paid_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub client_id: Uuid,
    pub items: Vec<LineItem>,
    pub tax_rate: Option<Decimal>,
    pub due_date: Option<OffsetDateTime>,
}

/// Catalogue item published by a supplier (or by an administrator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    pub sent_at: OffsetDateTime,
    pub read_at: Option<OffsetDateTime>,
    pub deleted_by_sender: bool,
    pub deleted_by_recipient: bool,
}

/// A client's request for a quote, claimed by a technician.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub id: Uuid,
    pub client_id: Uuid,
    pub requested_by: Uuid,
    pub description: String,
    pub technician_id: Option<Uuid>,
    pub status: QuoteRequestStatus,
    pub quote_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}
