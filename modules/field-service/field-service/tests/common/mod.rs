#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Common fixtures for field-service integration tests

use std::str::FromStr;
use std::sync::Arc;

use field_service::FieldService;
use field_service::config::DocumentsConfig;
use field_service::domain::ports::FixedClock;
use field_service::domain::repo::{CounterStoreRef, Stores};
use field_service::infra::storage::{InMemoryCounterStore, in_memory_stores};
use field_service_sdk::{
    Client, ContactInfo, Equipment, EquipmentStatus, Installation, Intervention, LineItem,
    Message, NewInvoice, NewQuote, Product, QuoteRequest, QuoteRequestStatus, User, WorkStatus,
};
use fieldops_security::{Principal, Role, StaticPolicyTable};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use time::macros::datetime;
use uuid::Uuid;

pub const NOW: OffsetDateTime = datetime!(2025-06-02 14:30 UTC);

/// Service plus direct handles on its stores.
pub struct Harness {
    pub service: Arc<FieldService>,
    pub stores: Stores,
}

pub fn harness_with_counters(counters: CounterStoreRef) -> Harness {
    let stores = in_memory_stores();
    let service = FieldService::new(
        stores.clone(),
        Arc::new(StaticPolicyTable::default()),
        counters,
        Arc::new(FixedClock(NOW)),
        DocumentsConfig::default(),
    );
    Harness {
        service: Arc::new(service),
        stores,
    }
}

pub fn harness() -> Harness {
    harness_with_counters(Arc::new(InMemoryCounterStore::new()))
}

pub fn user(role: Role) -> User {
    User {
        id: Uuid::new_v4(),
        email: format!("{}@example.test", Uuid::new_v4().simple()),
        display_name: role.to_string(),
        role,
        active: true,
        created_at: NOW,
    }
}

pub fn principal_of(user: &User) -> Principal {
    Principal::new(user.id, user.role)
}

pub fn client(owner: Uuid, name: &str) -> Client {
    Client {
        id: Uuid::new_v4(),
        owner_user_id: owner,
        name: name.to_owned(),
        contact: ContactInfo {
            email: Some(format!("contact@{}.test", name.to_lowercase())),
            phone: None,
            address: None,
        },
        active: true,
        created_at: NOW,
    }
}

pub fn equipment(client_id: Uuid, technician: Option<Uuid>) -> Equipment {
    Equipment {
        id: Uuid::new_v4(),
        client_id,
        technician_id: technician,
        name: "air handling unit".to_owned(),
        serial_number: None,
        status: EquipmentStatus::Operational,
        maintenance_history: Vec::new(),
        last_maintenance_date: None,
        created_at: NOW,
    }
}

pub fn intervention(client_id: Uuid, technician: Uuid) -> Intervention {
    Intervention {
        id: Uuid::new_v4(),
        client_id,
        technician_id: technician,
        equipment_id: None,
        scheduled_date: NOW,
        status: WorkStatus::Scheduled,
        description: "filter replacement".to_owned(),
        technician_location: None,
        completed_at: None,
    }
}

pub fn installation(client_id: Uuid, equipment_id: Uuid, technician: Option<Uuid>) -> Installation {
    Installation {
        id: Uuid::new_v4(),
        equipment_id,
        client_id,
        technician_id: technician,
        scheduled_date: None,
        status: WorkStatus::Scheduled,
    }
}

pub fn product(supplier: Uuid) -> Product {
    Product {
        id: Uuid::new_v4(),
        supplier_id: supplier,
        name: "thermostat".to_owned(),
        sku: format!("TH-{}", Uuid::new_v4().simple()),
        unit_price: Decimal::from(89),
        active: true,
    }
}

pub fn message(sender: Uuid, recipient: Uuid) -> Message {
    Message {
        id: Uuid::new_v4(),
        sender_id: sender,
        recipient_id: recipient,
        body: "Technician is on the way".to_owned(),
        sent_at: NOW,
        read_at: None,
        deleted_by_sender: false,
        deleted_by_recipient: false,
    }
}

pub fn quote_request(client_id: Uuid, requested_by: Uuid) -> QuoteRequest {
    QuoteRequest {
        id: Uuid::new_v4(),
        client_id,
        requested_by,
        description: "replace the boiler".to_owned(),
        technician_id: None,
        status: QuoteRequestStatus::Open,
        quote_id: None,
        created_at: NOW,
    }
}

pub fn items() -> Vec<LineItem> {
    vec![
        LineItem {
            description: "labour".to_owned(),
            quantity: Decimal::from(3),
            unit_price: Decimal::from_str("45.00").unwrap(),
        },
        LineItem {
            description: "gasket".to_owned(),
            quantity: Decimal::ONE,
            unit_price: Decimal::from_str("7.90").unwrap(),
        },
    ]
}

pub fn new_quote(client_id: Uuid) -> NewQuote {
    NewQuote {
        client_id,
        items: items(),
        tax_rate: None,
        valid_until: None,
    }
}

pub fn new_invoice(client_id: Uuid) -> NewInvoice {
    NewInvoice {
        client_id,
        items: items(),
        tax_rate: None,
        due_date: None,
    }
}
