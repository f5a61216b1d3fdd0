#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use field_service_sdk::{
    Client, ContactInfo, DocumentKind, Equipment, EquipmentStatus, GeoPoint, Intervention, Invoice,
    InvoiceStatus, LineItem, MaintenanceOutcome, Message, NewInvoice, NewMaintenanceRecord,
    NewQuote, Product, Quote, QuoteRequest, QuoteRequestStatus, QuoteStatus, Resource,
    SequenceKey, WorkStatus,
};
use fieldops_security::{Action, EntityKind, Principal, ScopePredicate, StaticPolicyTable};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use time::macros::datetime;
use tracing_test::traced_test;
use uuid::Uuid;

use crate::config::DocumentsConfig;
use crate::domain::error::DomainError;
use crate::domain::ports::FixedClock;
use crate::domain::repo::{CounterStore, EntityStore, StoreError};
use crate::domain::service::FieldService;
use crate::infra::storage::{InMemoryCounterStore, InMemoryEntityStore, in_memory_stores};
use crate::module;

const NOW: OffsetDateTime = datetime!(2025-03-14 09:00 UTC);

fn d(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn line(description: &str, quantity: &str, unit_price: &str) -> LineItem {
    LineItem {
        description: description.to_owned(),
        quantity: d(quantity),
        unit_price: d(unit_price),
    }
}

fn new_quote(client_id: Uuid) -> NewQuote {
    NewQuote {
        client_id,
        items: vec![line("boiler service", "2", "50")],
        tax_rate: None,
        valid_until: None,
    }
}

fn client_record(owner: Uuid, name: &str) -> Client {
    Client {
        id: Uuid::new_v4(),
        owner_user_id: owner,
        name: name.to_owned(),
        contact: ContactInfo::default(),
        active: true,
        created_at: NOW,
    }
}

fn equipment_record(client_id: Uuid, technician: Option<Uuid>) -> Equipment {
    Equipment {
        id: Uuid::new_v4(),
        client_id,
        technician_id: technician,
        name: "heat pump".to_owned(),
        serial_number: Some("HP-100".to_owned()),
        status: EquipmentStatus::Operational,
        maintenance_history: Vec::new(),
        last_maintenance_date: None,
        created_at: NOW,
    }
}

fn intervention_record(client_id: Uuid, technician: Uuid) -> Intervention {
    Intervention {
        id: Uuid::new_v4(),
        client_id,
        technician_id: technician,
        equipment_id: None,
        scheduled_date: NOW,
        status: WorkStatus::Scheduled,
        description: "yearly check".to_owned(),
        technician_location: None,
        completed_at: None,
    }
}

fn product_record(supplier: Uuid) -> Product {
    Product {
        id: Uuid::new_v4(),
        supplier_id: supplier,
        name: "filter".to_owned(),
        sku: "FLT-1".to_owned(),
        unit_price: d("12.50"),
        active: true,
    }
}

fn message_record(sender: Uuid, recipient: Uuid) -> Message {
    Message {
        id: Uuid::new_v4(),
        sender_id: sender,
        recipient_id: recipient,
        body: "When can you come by?".to_owned(),
        sent_at: NOW,
        read_at: None,
        deleted_by_sender: false,
        deleted_by_recipient: false,
    }
}

fn request_record(client_id: Uuid, requested_by: Uuid) -> QuoteRequest {
    QuoteRequest {
        id: Uuid::new_v4(),
        client_id,
        requested_by,
        description: "new radiator".to_owned(),
        technician_id: None,
        status: QuoteRequestStatus::Open,
        quote_id: None,
        created_at: NOW,
    }
}

fn in_memory_service() -> FieldService {
    module::in_memory(Arc::new(FixedClock(NOW)), DocumentsConfig::default())
}

struct World {
    service: FieldService,
    admin: Principal,
    tech: Principal,
    owner: Principal,
    supplier: Principal,
    client: Client,
    equipment: Equipment,
}

async fn world_with(service: FieldService) -> World {
    let admin = Principal::admin(Uuid::new_v4());
    let tech = Principal::technician(Uuid::new_v4());
    let owner = Principal::client(Uuid::new_v4());
    let supplier = Principal::supplier(Uuid::new_v4());

    let client = service
        .create(&admin, client_record(owner.id(), "Acme"))
        .await
        .unwrap();
    let equipment = service
        .create(&admin, equipment_record(client.id, Some(tech.id())))
        .await
        .unwrap();

    World {
        service,
        admin,
        tech,
        owner,
        supplier,
        client,
        equipment,
    }
}

async fn world() -> World {
    world_with(in_memory_service()).await
}

struct DownCounterStore;

#[async_trait]
impl CounterStore for DownCounterStore {
    async fn increment_counter(&self, _key: &SequenceKey) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_owned()))
    }
}

/// Quote store whose first insert fails.
struct FlakyQuotes {
    failed: AtomicBool,
    inner: InMemoryEntityStore<Quote>,
}

#[async_trait]
impl EntityStore<Quote> for FlakyQuotes {
    async fn create(&self, record: Quote) -> Result<Quote, StoreError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("disk full".to_owned()));
        }
        self.inner.create(record).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Quote>, StoreError> {
        self.inner.get_by_id(id).await
    }

    async fn query(&self, filter: &ScopePredicate) -> Result<Vec<Quote>, StoreError> {
        self.inner.query(filter).await
    }

    async fn update_if(
        &self,
        id: Uuid,
        expected: &Quote,
        record: Quote,
    ) -> Result<Quote, StoreError> {
        self.inner.update_if(id, expected, record).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }
}

/// Counter store that numbers everything but invoices.
struct NoInvoiceNumbers(InMemoryCounterStore);

#[async_trait]
impl CounterStore for NoInvoiceNumbers {
    async fn increment_counter(&self, key: &SequenceKey) -> Result<u64, StoreError> {
        if key.kind == DocumentKind::Invoice {
            return Err(StoreError::Unavailable("invoice counter locked".to_owned()));
        }
        self.0.increment_counter(key).await
    }
}

/// Store that hands control back to the scheduler before every call, so
/// operations joined on one task interleave between their reads and writes.
struct YieldingStore<T> {
    inner: InMemoryEntityStore<T>,
}

impl<T: Resource> YieldingStore<T> {
    fn new() -> Self {
        Self {
            inner: InMemoryEntityStore::new(),
        }
    }
}

#[async_trait]
impl<T: Resource> EntityStore<T> for YieldingStore<T> {
    async fn create(&self, record: T) -> Result<T, StoreError> {
        tokio::task::yield_now().await;
        self.inner.create(record).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.get_by_id(id).await
    }

    async fn query(&self, filter: &ScopePredicate) -> Result<Vec<T>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.query(filter).await
    }

    async fn update_if(&self, id: Uuid, expected: &T, record: T) -> Result<T, StoreError> {
        tokio::task::yield_now().await;
        self.inner.update_if(id, expected, record).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.inner.delete(id).await
    }
}

fn interleaving_service() -> FieldService {
    let mut stores = in_memory_stores();
    stores.quotes = Arc::new(YieldingStore::<Quote>::new());
    stores.quote_requests = Arc::new(YieldingStore::<QuoteRequest>::new());
    FieldService::new(
        stores,
        Arc::new(StaticPolicyTable::default()),
        Arc::new(InMemoryCounterStore::new()),
        Arc::new(FixedClock(NOW)),
        DocumentsConfig::default(),
    )
}

async fn accepted_quote(w: &World) -> Quote {
    let quote = w
        .service
        .create_quote(&w.tech, new_quote(w.client.id))
        .await
        .unwrap();
    w.service
        .transition::<Quote>(&w.tech, quote.id, QuoteStatus::Sent)
        .await
        .unwrap();
    w.service
        .transition::<Quote>(&w.admin, quote.id, QuoteStatus::Accepted)
        .await
        .unwrap()
}

#[tokio::test]
async fn quotes_are_numbered_and_totalled() {
    let w = world().await;

    let first = w
        .service
        .create_quote(&w.tech, new_quote(w.client.id))
        .await
        .unwrap();
    let second = w
        .service
        .create_quote(
            &w.tech,
            NewQuote {
                tax_rate: Some(d("5.5")),
                ..new_quote(w.client.id)
            },
        )
        .await
        .unwrap();

    assert_eq!(first.number.to_string(), "DEV-2025-001");
    assert_eq!(second.number.to_string(), "DEV-2025-002");
    assert_eq!(first.status, QuoteStatus::Draft);
    assert_eq!(first.author_user_id, w.tech.id());
    assert_eq!(first.created_at, NOW);
    assert_eq!(first.subtotal, d("100"));
    assert_eq!(first.tax_amount, d("20"));
    assert_eq!(first.total, d("120"));
    assert_eq!(second.tax_amount, d("5.50"));
}

#[tokio::test]
async fn invalid_lines_consume_no_number() {
    let w = world().await;

    let empty = w
        .service
        .create_quote(
            &w.tech,
            NewQuote {
                items: Vec::new(),
                ..new_quote(w.client.id)
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(empty, DomainError::Validation { ref field, .. } if field == "items"));

    let negative = w
        .service
        .create_quote(
            &w.tech,
            NewQuote {
                items: vec![line("part", "1", "10"), line("discount", "1", "-3")],
                ..new_quote(w.client.id)
            },
        )
        .await
        .unwrap_err();
    assert!(
        matches!(negative, DomainError::Validation { ref field, .. } if field == "items[1].unit_price")
    );

    let taxed = w
        .service
        .create_quote(
            &w.tech,
            NewQuote {
                tax_rate: Some(d("101")),
                ..new_quote(w.client.id)
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(taxed, DomainError::Validation { ref field, .. } if field == "tax_rate"));

    let quote = w
        .service
        .create_quote(&w.tech, new_quote(w.client.id))
        .await
        .unwrap();
    assert_eq!(quote.number.to_string(), "DEV-2025-001");
}

#[tokio::test]
async fn line_item_limit_comes_from_config() {
    let service = module::in_memory(
        Arc::new(FixedClock(NOW)),
        DocumentsConfig {
            max_line_items: 1,
            ..DocumentsConfig::default()
        },
    );
    let w = world_with(service).await;

    let err = w
        .service
        .create_invoice(
            &w.admin,
            NewInvoice {
                client_id: w.client.id,
                items: vec![line("a", "1", "1"), line("b", "1", "1")],
                tax_rate: None,
                due_date: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Validation { ref message, .. } if message.contains("at most 1")));
}

#[tokio::test]
async fn documents_need_a_known_active_client() {
    let w = world().await;

    let unknown = w
        .service
        .create_quote(&w.tech, new_quote(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(unknown, DomainError::Validation { ref field, .. } if field == "client_id"));

    w.service
        .delete::<Client>(&w.admin, w.client.id)
        .await
        .unwrap();
    let inactive = w
        .service
        .create_quote(&w.tech, new_quote(w.client.id))
        .await
        .unwrap_err();
    assert!(
        matches!(inactive, DomainError::Validation { ref message, .. } if message.contains("inactive"))
    );
}

#[tokio::test]
async fn clients_and_suppliers_cannot_author_quotes() {
    let w = world().await;

    for principal in [&w.owner, &w.supplier] {
        let err = w
            .service
            .create_quote(principal, new_quote(w.client.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::AccessDenied {
                entity: EntityKind::Quote,
                action: Action::Create
            }
        ));
    }
}

#[tokio::test]
async fn counter_outage_fails_without_storing_a_document() {
    let stores = in_memory_stores();
    let service = FieldService::new(
        stores.clone(),
        Arc::new(StaticPolicyTable::default()),
        Arc::new(DownCounterStore),
        Arc::new(FixedClock(NOW)),
        DocumentsConfig::default(),
    );
    let w = world_with(service).await;

    let err = w
        .service
        .create_quote(&w.tech, new_quote(w.client.id))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DomainError::SequenceUnavailable { key, .. }
            if key == SequenceKey::new(DocumentKind::Quote, 2025)
    ));
    assert!(
        stores
            .quotes
            .query(&ScopePredicate::Any)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn failed_insert_leaves_a_gap() {
    let mut stores = in_memory_stores();
    stores.quotes = Arc::new(FlakyQuotes {
        failed: AtomicBool::new(false),
        inner: InMemoryEntityStore::new(),
    });
    let counters = Arc::new(InMemoryCounterStore::new());
    let service = FieldService::new(
        stores,
        Arc::new(StaticPolicyTable::default()),
        counters.clone(),
        Arc::new(FixedClock(NOW)),
        DocumentsConfig::default(),
    );
    let w = world_with(service).await;

    let err = w
        .service
        .create_quote(&w.tech, new_quote(w.client.id))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::StoreUnavailable { .. }));

    let quote = w
        .service
        .create_quote(&w.tech, new_quote(w.client.id))
        .await
        .unwrap();
    assert_eq!(quote.number.to_string(), "DEV-2025-002");
    assert_eq!(
        counters.last_value(&SequenceKey::new(DocumentKind::Quote, 2025)),
        2
    );
}

#[tokio::test]
async fn accepted_quote_is_invoiced_once() {
    let w = world().await;
    let quote = w
        .service
        .create_quote(&w.tech, new_quote(w.client.id))
        .await
        .unwrap();

    let early = w
        .service
        .invoice_from_quote(&w.tech, quote.id, None)
        .await
        .unwrap_err();
    assert!(matches!(early, DomainError::Validation { ref field, .. } if field == "status"));

    w.service
        .transition::<Quote>(&w.tech, quote.id, QuoteStatus::Sent)
        .await
        .unwrap();
    w.service
        .transition::<Quote>(&w.admin, quote.id, QuoteStatus::Accepted)
        .await
        .unwrap();

    let invoice = w
        .service
        .invoice_from_quote(&w.tech, quote.id, Some(datetime!(2025-04-14 00:00 UTC)))
        .await
        .unwrap();
    assert_eq!(invoice.number.to_string(), "INV-2025-001");
    assert_eq!(invoice.quote_id, Some(quote.id));
    assert_eq!(invoice.total, quote.total);
    assert_eq!(invoice.status, InvoiceStatus::Draft);

    let billed: Quote = w.service.get(&w.admin, quote.id).await.unwrap();
    assert_eq!(billed.invoice_id, Some(invoice.id));

    let again = w
        .service
        .invoice_from_quote(&w.tech, quote.id, None)
        .await
        .unwrap_err();
    assert!(matches!(again, DomainError::Validation { ref field, .. } if field == "quote_id"));
}

#[tokio::test]
async fn racing_invoice_requests_bill_a_quote_once() {
    let w = world_with(interleaving_service()).await;
    let quote = accepted_quote(&w).await;

    let (first, second) = tokio::join!(
        w.service.invoice_from_quote(&w.tech, quote.id, None),
        w.service.invoice_from_quote(&w.admin, quote.id, None),
    );
    let (invoice, lost) = match (first, second) {
        (Ok(invoice), Err(err)) | (Err(err), Ok(invoice)) => (invoice, err),
        _ => panic!("exactly one of two racing invoice requests must succeed"),
    };

    assert!(matches!(
        lost,
        DomainError::Conflict { entity: EntityKind::Quote, id } if id == quote.id
    ));
    assert_eq!(invoice.number.to_string(), "INV-2025-001");
    let invoices = w.service.list::<Invoice>(&w.admin).await.unwrap();
    assert_eq!(invoices, vec![invoice.clone()]);
    let billed: Quote = w.service.get(&w.admin, quote.id).await.unwrap();
    assert_eq!(billed.invoice_id, Some(invoice.id));
}

#[tokio::test]
async fn failed_invoice_releases_its_quote() {
    let counters = Arc::new(NoInvoiceNumbers(InMemoryCounterStore::new()));
    let service = FieldService::new(
        in_memory_stores(),
        Arc::new(StaticPolicyTable::default()),
        counters,
        Arc::new(FixedClock(NOW)),
        DocumentsConfig::default(),
    );
    let w = world_with(service).await;
    let quote = accepted_quote(&w).await;

    let err = w
        .service
        .invoice_from_quote(&w.admin, quote.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::SequenceUnavailable { .. }));

    let released: Quote = w.service.get(&w.admin, quote.id).await.unwrap();
    assert_eq!(released, quote);
    assert!(w.service.list::<Invoice>(&w.admin).await.unwrap().is_empty());
}

#[tokio::test]
async fn invoice_lifecycle_is_enforced() {
    let w = world().await;
    let invoice = w
        .service
        .create_invoice(
            &w.admin,
            NewInvoice {
                client_id: w.client.id,
                items: vec![line("labour", "3", "40")],
                tax_rate: Some(Decimal::ZERO),
                due_date: None,
            },
        )
        .await
        .unwrap();

    let skipped = w
        .service
        .transition::<Invoice>(&w.admin, invoice.id, InvoiceStatus::Paid)
        .await
        .unwrap_err();
    assert!(matches!(
        skipped,
        DomainError::IllegalTransition { ref from, ref to, .. } if from == "draft" && to == "paid"
    ));

    w.service
        .transition::<Invoice>(&w.admin, invoice.id, InvoiceStatus::Sent)
        .await
        .unwrap();
    let paid = w
        .service
        .transition::<Invoice>(&w.admin, invoice.id, InvoiceStatus::Paid)
        .await
        .unwrap();

    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert_eq!(paid.paid_at, Some(NOW));
}

#[tokio::test]
async fn owner_cannot_change_quote_status() {
    let w = world().await;
    let quote = w
        .service
        .create_quote(&w.tech, new_quote(w.client.id))
        .await
        .unwrap();

    let read: Quote = w.service.get(&w.owner, quote.id).await.unwrap();
    assert_eq!(read.id, quote.id);

    let err = w
        .service
        .transition::<Quote>(&w.owner, quote.id, QuoteStatus::Sent)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AccessDenied { .. }));
}

#[tokio::test]
#[traced_test]
async fn missing_records_are_not_found_before_access_is_checked() {
    let w = world().await;

    let missing = w
        .service
        .get::<Equipment>(&w.supplier, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(missing, DomainError::NotFound { entity: EntityKind::Equipment, .. }));

    let denied = w
        .service
        .get::<Equipment>(&w.supplier, w.equipment.id)
        .await
        .unwrap_err();
    assert!(matches!(denied, DomainError::AccessDenied { .. }));
    assert!(logs_contain("instance access denied"));
}

#[tokio::test]
async fn soft_deleted_client_disappears_for_its_owner() {
    let w = world().await;
    assert_eq!(w.service.list::<Client>(&w.owner).await.unwrap().len(), 1);

    w.service
        .delete::<Client>(&w.admin, w.client.id)
        .await
        .unwrap();

    assert!(w.service.list::<Client>(&w.owner).await.unwrap().is_empty());
    let hidden = w
        .service
        .get::<Client>(&w.owner, w.client.id)
        .await
        .unwrap_err();
    assert!(matches!(hidden, DomainError::NotFound { .. }));

    let kept: Client = w.service.get(&w.admin, w.client.id).await.unwrap();
    assert!(!kept.active);
}

#[tokio::test]
async fn suppliers_retire_only_their_products() {
    let w = world().await;
    let rival = Principal::supplier(Uuid::new_v4());
    let product = w
        .service
        .create(&w.supplier, product_record(w.supplier.id()))
        .await
        .unwrap();

    let foreign = w
        .service
        .create(&w.supplier, product_record(rival.id()))
        .await
        .unwrap_err();
    assert!(matches!(foreign, DomainError::AccessDenied { .. }));

    let err = w
        .service
        .delete::<Product>(&rival, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AccessDenied { .. }));

    assert_eq!(w.service.list::<Product>(&w.tech).await.unwrap().len(), 1);
    w.service
        .delete::<Product>(&w.supplier, product.id)
        .await
        .unwrap();
    assert!(w.service.list::<Product>(&w.tech).await.unwrap().is_empty());
    assert_eq!(w.service.list::<Product>(&w.admin).await.unwrap().len(), 1);
}

#[tokio::test]
async fn message_deletion_is_per_participant() {
    let w = world().await;
    let message = w
        .service
        .create(&w.owner, message_record(w.owner.id(), w.tech.id()))
        .await
        .unwrap();

    let spoofed = w
        .service
        .create(&w.owner, message_record(w.tech.id(), w.owner.id()))
        .await
        .unwrap_err();
    assert!(matches!(spoofed, DomainError::AccessDenied { .. }));

    w.service
        .delete::<Message>(&w.tech, message.id)
        .await
        .unwrap();

    assert!(w.service.list::<Message>(&w.tech).await.unwrap().is_empty());
    let still: Message = w.service.get(&w.owner, message.id).await.unwrap();
    assert!(still.deleted_by_recipient);
    assert!(!still.deleted_by_sender);
}

#[tokio::test]
async fn only_the_recipient_marks_a_message_read() {
    let w = world().await;
    let message = w
        .service
        .create(&w.owner, message_record(w.owner.id(), w.tech.id()))
        .await
        .unwrap();

    let err = w
        .service
        .mark_message_read(&w.owner, message.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AccessDenied { .. }));

    let read = w
        .service
        .mark_message_read(&w.tech, message.id)
        .await
        .unwrap();
    assert_eq!(read.read_at, Some(NOW));
}

#[tokio::test]
async fn technicians_claim_open_requests() {
    let w = world().await;
    let other = Principal::technician(Uuid::new_v4());
    let request = w
        .service
        .create(&w.owner, request_record(w.client.id, w.owner.id()))
        .await
        .unwrap();

    let by_admin = w
        .service
        .claim_quote_request(&w.admin, request.id)
        .await
        .unwrap_err();
    assert!(matches!(by_admin, DomainError::AccessDenied { .. }));

    let claimed = w
        .service
        .claim_quote_request(&w.tech, request.id)
        .await
        .unwrap();
    assert_eq!(claimed.status, QuoteRequestStatus::Claimed);
    assert_eq!(claimed.technician_id, Some(w.tech.id()));

    let taken = w
        .service
        .claim_quote_request(&other, request.id)
        .await
        .unwrap_err();
    assert!(matches!(taken, DomainError::AccessDenied { .. }));
    assert!(
        w.service
            .list::<QuoteRequest>(&other)
            .await
            .unwrap()
            .is_empty()
    );

    let twice = w
        .service
        .claim_quote_request(&w.tech, request.id)
        .await
        .unwrap_err();
    assert!(matches!(twice, DomainError::IllegalTransition { .. }));
}

#[tokio::test]
async fn racing_claims_leave_a_single_technician() {
    let w = world_with(interleaving_service()).await;
    let rival = Principal::technician(Uuid::new_v4());
    let request = w
        .service
        .create(&w.owner, request_record(w.client.id, w.owner.id()))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        w.service.claim_quote_request(&w.tech, request.id),
        w.service.claim_quote_request(&rival, request.id),
    );
    let (claimed, lost) = match (first, second) {
        (Ok(claimed), Err(err)) | (Err(err), Ok(claimed)) => (claimed, err),
        _ => panic!("exactly one of two racing claims must succeed"),
    };

    assert!(matches!(
        lost,
        DomainError::Conflict { entity: EntityKind::QuoteRequest, id } if id == request.id
    ));
    let stored: QuoteRequest = w.service.get(&w.admin, request.id).await.unwrap();
    assert_eq!(stored, claimed);
    assert_eq!(stored.status, QuoteRequestStatus::Claimed);
    assert!(
        stored.technician_id == Some(w.tech.id()) || stored.technician_id == Some(rival.id())
    );
}

#[tokio::test]
async fn claimed_request_is_answered_with_a_quote() {
    let w = world().await;
    let request = w
        .service
        .create(&w.owner, request_record(w.client.id, w.owner.id()))
        .await
        .unwrap();
    w.service
        .claim_quote_request(&w.tech, request.id)
        .await
        .unwrap();
    let quote = w
        .service
        .create_quote(&w.tech, new_quote(w.client.id))
        .await
        .unwrap();

    let answered = w
        .service
        .answer_quote_request(&w.tech, request.id, quote.id)
        .await
        .unwrap();

    assert_eq!(answered.status, QuoteRequestStatus::Quoted);
    assert_eq!(answered.quote_id, Some(quote.id));
}

#[tokio::test]
async fn requests_are_filed_for_owned_clients_only() {
    let w = world().await;
    let stranger = w
        .service
        .create(&w.admin, client_record(Uuid::new_v4(), "Globex"))
        .await
        .unwrap();

    let err = w
        .service
        .create(&w.owner, request_record(stranger.id, w.owner.id()))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AccessDenied { .. }));

    let on_behalf = w
        .service
        .create(&w.owner, request_record(w.client.id, Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(on_behalf, DomainError::Validation { ref field, .. } if field == "requested_by"));
}

#[tokio::test]
async fn completed_maintenance_returns_equipment_to_service() {
    let w = world().await;
    w.service
        .transition::<Equipment>(&w.tech, w.equipment.id, EquipmentStatus::MaintenanceRequired)
        .await
        .unwrap();
    w.service
        .transition::<Equipment>(&w.tech, w.equipment.id, EquipmentStatus::UnderMaintenance)
        .await
        .unwrap();

    let equipment = w
        .service
        .add_maintenance_record(
            &w.tech,
            w.equipment.id,
            NewMaintenanceRecord {
                description: "replaced compressor".to_owned(),
                outcome: MaintenanceOutcome::Completed,
            },
        )
        .await
        .unwrap();

    assert_eq!(equipment.status, EquipmentStatus::Operational);
    assert_eq!(equipment.last_maintenance_date, Some(NOW));
    assert_eq!(equipment.maintenance_history.len(), 1);
    assert_eq!(
        equipment.maintenance_history[0].technician_id,
        Some(w.tech.id())
    );

    let blank = w
        .service
        .add_maintenance_record(
            &w.admin,
            w.equipment.id,
            NewMaintenanceRecord {
                description: "  ".to_owned(),
                outcome: MaintenanceOutcome::Routine,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(blank, DomainError::Validation { ref field, .. } if field == "description"));
}

#[tokio::test]
async fn edits_keep_records_in_scope() {
    let w = world().await;

    let mut renamed = w.client.clone();
    renamed.contact.phone = Some("+33 1 23 45 67 89".to_owned());
    let updated = w
        .service
        .update(&w.owner, w.client.id, renamed)
        .await
        .unwrap();
    assert_eq!(updated.contact.phone.as_deref(), Some("+33 1 23 45 67 89"));

    let mut handed_over = w.client.clone();
    handed_over.owner_user_id = Uuid::new_v4();
    let err = w
        .service
        .update(&w.owner, w.client.id, handed_over)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "owner_user_id"));

    let mut reassigned = w.equipment.clone();
    reassigned.technician_id = Some(Uuid::new_v4());
    let err = w
        .service
        .update(&w.tech, w.equipment.id, reassigned)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AccessDenied { .. }));

    let mut status_edit = w.equipment.clone();
    status_edit.status = EquipmentStatus::Retired;
    let err = w
        .service
        .update(&w.admin, w.equipment.id, status_edit)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "status"));
}

#[tokio::test]
async fn intervention_technician_cannot_be_swapped_by_an_edit() {
    let w = world().await;
    let other = Principal::technician(Uuid::new_v4());
    let visit = w
        .service
        .create(&w.admin, intervention_record(w.client.id, w.tech.id()))
        .await
        .unwrap();

    let swapped = Intervention {
        technician_id: other.id(),
        description: "handed to another technician".to_owned(),
        ..visit.clone()
    };
    let err = w
        .service
        .update(&w.admin, visit.id, swapped)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "technician_id"));

    let kept: Intervention = w.service.get(&w.tech, visit.id).await.unwrap();
    assert_eq!(kept, visit);
    let err = w
        .service
        .get::<Intervention>(&other, visit.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AccessDenied { .. }));

    let rescheduled = Intervention {
        description: "yearly check, bring ladder".to_owned(),
        ..visit.clone()
    };
    let updated = w
        .service
        .update(&w.tech, visit.id, rescheduled)
        .await
        .unwrap();
    assert_eq!(updated.technician_id, w.tech.id());

    let nowhere = Intervention {
        technician_location: Some(GeoPoint {
            latitude: f64::NAN,
            longitude: 2.35,
        }),
        ..updated.clone()
    };
    let err = w
        .service
        .update(&w.tech, visit.id, nowhere)
        .await
        .unwrap_err();
    assert!(
        matches!(err, DomainError::Validation { ref field, .. } if field == "technician_location")
    );
}

#[tokio::test]
async fn new_work_starts_scheduled_and_assigned_to_self() {
    let w = world().await;

    let mut started = intervention_record(w.client.id, w.tech.id());
    started.status = WorkStatus::InProgress;
    let err = w.service.create(&w.tech, started).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "status"));

    let err = w
        .service
        .create(&w.tech, intervention_record(w.client.id, Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AccessDenied { .. }));

    let own = w
        .service
        .create(&w.tech, intervention_record(w.client.id, w.tech.id()))
        .await
        .unwrap();
    let started = w
        .service
        .transition::<Intervention>(&w.tech, own.id, WorkStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(started.status, WorkStatus::InProgress);
}

#[tokio::test]
async fn only_admins_hard_delete_work_records() {
    let w = world().await;

    let err = w
        .service
        .delete::<Equipment>(&w.tech, w.equipment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AccessDenied { action: Action::Delete, .. }));

    w.service
        .delete::<Equipment>(&w.admin, w.equipment.id)
        .await
        .unwrap();
    let gone = w
        .service
        .get::<Equipment>(&w.admin, w.equipment.id)
        .await
        .unwrap_err();
    assert!(matches!(gone, DomainError::NotFound { .. }));
}
