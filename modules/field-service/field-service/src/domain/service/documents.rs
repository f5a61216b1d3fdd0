//! Quotes and invoices: numbered documents with computed totals.

use field_service_sdk::{
    DocumentKind, DocumentTotals, Invoice, InvoiceStatus, LineItem, NewInvoice, NewQuote, Quote,
    QuoteStatus,
};
use fieldops_security::{Action, EntityKind, Principal, ScopeSubject};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::FieldService;
use crate::domain::error::DomainError;

/// Scope dimensions of a document that has no number yet.
struct DraftDocument {
    id: Uuid,
    client_id: Uuid,
    author: Uuid,
}

impl ScopeSubject for DraftDocument {
    fn resource_id(&self) -> Uuid {
        self.id
    }
    fn owner_user_id(&self) -> Option<Uuid> {
        None
    }
    fn client_id(&self) -> Option<Uuid> {
        Some(self.client_id)
    }
    fn technician_id(&self) -> Option<Uuid> {
        None
    }
    fn creator_id(&self) -> Option<Uuid> {
        Some(self.author)
    }
    fn participant_ids(&self) -> Vec<Uuid> {
        Vec::new()
    }
}

struct InvoiceDraft {
    id: Uuid,
    client_id: Uuid,
    items: Vec<LineItem>,
    tax_rate: Decimal,
    due_date: Option<OffsetDateTime>,
    quote_id: Option<Uuid>,
}

impl FieldService {
    /// Create a draft quote numbered `DEV-<year>-<seq>`.
    ///
    /// # Errors
    /// `Validation` for malformed line items or an unknown client,
    /// `AccessDenied` outside the create scope, `SequenceUnavailable` when
    /// no number can be minted. Nothing is stored on error.
    #[instrument(skip_all, fields(principal = %principal.id(), client = %input.client_id))]
    pub async fn create_quote(
        &self,
        principal: &Principal,
        input: NewQuote,
    ) -> Result<Quote, DomainError> {
        let tax_rate = input.tax_rate.unwrap_or(self.documents.default_tax_rate);
        self.validate_lines(&input.items, tax_rate)?;

        let draft = DraftDocument {
            id: Uuid::new_v4(),
            client_id: input.client_id,
            author: principal.id(),
        };
        self.scope
            .check_instance_access(principal, EntityKind::Quote, Action::Create, &draft)
            .await?;
        self.ensure_billable_client(input.client_id).await?;

        let number = self
            .sequences
            .next_for_current_year(DocumentKind::Quote)
            .await?;
        let totals = DocumentTotals::compute(&input.items, tax_rate);
        let quote = Quote {
            id: draft.id,
            number,
            client_id: input.client_id,
            author_user_id: principal.id(),
            items: input.items,
            tax_rate,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            total: totals.total,
            status: QuoteStatus::Draft,
            valid_until: input.valid_until,
            invoice_id: None,
            created_at: self.clock.now(),
        };

        let quote = self
            .stores
            .quotes
            .create(quote)
            .await
            .map_err(|e| DomainError::from_store(EntityKind::Quote, Some(draft.id), e))?;
        info!(number = %quote.number, total = %quote.total, "quote created");
        Ok(quote)
    }

    /// Create a draft invoice numbered `INV-<year>-<seq>`.
    ///
    /// # Errors
    /// Same as [`FieldService::create_quote`].
    #[instrument(skip_all, fields(principal = %principal.id(), client = %input.client_id))]
    pub async fn create_invoice(
        &self,
        principal: &Principal,
        input: NewInvoice,
    ) -> Result<Invoice, DomainError> {
        let tax_rate = input.tax_rate.unwrap_or(self.documents.default_tax_rate);
        let draft = InvoiceDraft {
            id: Uuid::new_v4(),
            client_id: input.client_id,
            items: input.items,
            tax_rate,
            due_date: input.due_date,
            quote_id: None,
        };
        self.check_invoice_draft(principal, &draft).await?;
        self.issue_invoice(principal, draft).await
    }

    /// Bill an accepted quote. Lines and tax rate are copied from the quote.
    ///
    /// The quote is linked to the new invoice before the invoice is stored,
    /// so two concurrent calls cannot both bill it.
    ///
    /// # Errors
    /// `Validation` unless the quote is accepted and not yet invoiced,
    /// `Conflict` when a concurrent call reserved the quote first.
    #[instrument(skip_all, fields(principal = %principal.id(), quote = %quote_id))]
    pub async fn invoice_from_quote(
        &self,
        principal: &Principal,
        quote_id: Uuid,
        due_date: Option<OffsetDateTime>,
    ) -> Result<Invoice, DomainError> {
        let quote: Quote = self.get(principal, quote_id).await?;
        if quote.status != QuoteStatus::Accepted {
            return Err(DomainError::validation(
                "status",
                format!(
                    "quote {} is {}, only accepted quotes are invoiced",
                    quote.number, quote.status
                ),
            ));
        }
        if let Some(invoice_id) = quote.invoice_id {
            return Err(DomainError::validation(
                "quote_id",
                format!("quote {} is already billed by invoice {invoice_id}", quote.number),
            ));
        }

        let draft = InvoiceDraft {
            id: Uuid::new_v4(),
            client_id: quote.client_id,
            items: quote.items.clone(),
            tax_rate: quote.tax_rate,
            due_date,
            quote_id: Some(quote.id),
        };
        self.check_invoice_draft(principal, &draft).await?;

        let reserved = Quote {
            invoice_id: Some(draft.id),
            ..quote.clone()
        };
        let reserved = self.save(quote.id, &quote, reserved).await?;

        match self.issue_invoice(principal, draft).await {
            Ok(invoice) => Ok(invoice),
            Err(err) => {
                if let Err(release) = self.save(quote.id, &reserved, quote).await {
                    warn!(error = %release, "quote reservation not released");
                }
                Err(err)
            }
        }
    }

    /// Check line items, create scope and client of an invoice about to be issued.
    async fn check_invoice_draft(
        &self,
        principal: &Principal,
        draft: &InvoiceDraft,
    ) -> Result<(), DomainError> {
        self.validate_lines(&draft.items, draft.tax_rate)?;
        let subject = DraftDocument {
            id: draft.id,
            client_id: draft.client_id,
            author: principal.id(),
        };
        self.scope
            .check_instance_access(principal, EntityKind::Invoice, Action::Create, &subject)
            .await?;
        self.ensure_billable_client(draft.client_id).await
    }

    /// Mint a number for a checked draft and store the invoice.
    async fn issue_invoice(
        &self,
        principal: &Principal,
        input: InvoiceDraft,
    ) -> Result<Invoice, DomainError> {
        let number = self
            .sequences
            .next_for_current_year(DocumentKind::Invoice)
            .await?;
        let totals = DocumentTotals::compute(&input.items, input.tax_rate);
        let invoice = Invoice {
            id: input.id,
            number,
            client_id: input.client_id,
            author_user_id: principal.id(),
            quote_id: input.quote_id,
            items: input.items,
            tax_rate: input.tax_rate,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            total: totals.total,
            status: InvoiceStatus::Draft,
            due_date: input.due_date,
            paid_at: None,
            created_at: self.clock.now(),
        };

        let invoice = self
            .stores
            .invoices
            .create(invoice)
            .await
            .map_err(|e| DomainError::from_store(EntityKind::Invoice, Some(input.id), e))?;
        info!(number = %invoice.number, total = %invoice.total, "invoice created");
        Ok(invoice)
    }

    fn validate_lines(&self, items: &[LineItem], tax_rate: Decimal) -> Result<(), DomainError> {
        if items.is_empty() {
            return Err(DomainError::validation(
                "items",
                "at least one line item is required",
            ));
        }
        let max = self.documents.max_line_items;
        if items.len() > max {
            return Err(DomainError::validation(
                "items",
                format!("at most {max} line items are allowed, got {}", items.len()),
            ));
        }
        for (index, item) in items.iter().enumerate() {
            if item.description.trim().is_empty() {
                return Err(DomainError::validation(
                    format!("items[{index}].description"),
                    "must not be empty",
                ));
            }
            if item.quantity <= Decimal::ZERO {
                return Err(DomainError::validation(
                    format!("items[{index}].quantity"),
                    "must be positive",
                ));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(DomainError::validation(
                    format!("items[{index}].unit_price"),
                    "must not be negative",
                ));
            }
        }
        if !(Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&tax_rate) {
            return Err(DomainError::validation(
                "tax_rate",
                format!("must be within 0..=100, got {tax_rate}"),
            ));
        }
        Ok(())
    }

    async fn ensure_billable_client(&self, client_id: Uuid) -> Result<(), DomainError> {
        let client = self
            .stores
            .clients
            .get_by_id(client_id)
            .await
            .map_err(|e| DomainError::from_store(EntityKind::Client, Some(client_id), e))?;
        match client {
            Some(client) if client.active => Ok(()),
            Some(_) => Err(DomainError::validation(
                "client_id",
                format!("client {client_id} is inactive"),
            )),
            None => Err(DomainError::validation(
                "client_id",
                format!("unknown client {client_id}"),
            )),
        }
    }
}
