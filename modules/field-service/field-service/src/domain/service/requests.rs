//! Quote requests and messages: records with participant-specific actions.

use field_service_sdk::{Message, Quote, QuoteRequest, QuoteRequestStatus, QuoteStatus, Resource};
use fieldops_security::{Action, Principal, Role};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::FieldService;
use crate::domain::error::DomainError;

impl FieldService {
    /// Assign an open request to the calling technician.
    ///
    /// # Errors
    /// `AccessDenied` for non-technicians and requests claimed by someone
    /// else, `IllegalTransition` when the request is no longer open,
    /// `Conflict` when another claim landed between read and write.
    #[instrument(skip_all, fields(principal = %principal.id(), request = %request_id))]
    pub async fn claim_quote_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
    ) -> Result<QuoteRequest, DomainError> {
        if principal.role() != Role::Technician {
            warn!(role = %principal.role(), "only technicians claim quote requests");
            return Err(DomainError::access_denied(
                QuoteRequest::KIND,
                Action::Update,
            ));
        }

        let request = self.fetch::<QuoteRequest>(principal, request_id).await?;
        self.scope
            .check_instance_access(principal, QuoteRequest::KIND, Action::Update, &request)
            .await?;

        let mut claimed = self.apply_transition(request.clone(), QuoteRequestStatus::Claimed)?;
        claimed.technician_id = Some(principal.id());
        let request = self.save(request_id, &request, claimed).await?;
        info!("quote request claimed");
        Ok(request)
    }

    /// Link a claimed request to the quote answering it.
    ///
    /// # Errors
    /// `AccessDenied` unless the caller may update the request and read the
    /// quote; `Validation` when the quote belongs to another client.
    #[instrument(skip_all, fields(principal = %principal.id(), request = %request_id))]
    pub async fn answer_quote_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
        quote_id: Uuid,
    ) -> Result<QuoteRequest, DomainError> {
        let request = self.fetch::<QuoteRequest>(principal, request_id).await?;
        self.scope
            .check_instance_access(principal, QuoteRequest::KIND, Action::Update, &request)
            .await?;

        let quote: Quote = self.get(principal, quote_id).await?;
        if quote.client_id != request.client_id {
            return Err(DomainError::validation(
                "quote_id",
                "quote is for a different client",
            ));
        }
        if quote.status == QuoteStatus::Rejected || quote.status == QuoteStatus::Expired {
            return Err(DomainError::validation(
                "quote_id",
                format!("quote {} is {}", quote.number, quote.status),
            ));
        }

        let mut answered = self.apply_transition(request.clone(), QuoteRequestStatus::Quoted)?;
        answered.quote_id = Some(quote.id);
        let request = self.save(request_id, &request, answered).await?;
        info!(number = %quote.number, "quote request answered");
        Ok(request)
    }

    /// Stamp a message as read by its recipient. Reading twice keeps the
    /// first timestamp.
    ///
    /// # Errors
    /// `AccessDenied` unless the caller is the recipient.
    #[instrument(skip_all, fields(principal = %principal.id(), message = %message_id))]
    pub async fn mark_message_read(
        &self,
        principal: &Principal,
        message_id: Uuid,
    ) -> Result<Message, DomainError> {
        let message = self.fetch::<Message>(principal, message_id).await?;
        self.scope
            .check_instance_access(principal, Message::KIND, Action::Update, &message)
            .await?;
        if message.recipient_id != principal.id() {
            warn!("only the recipient marks a message read");
            return Err(DomainError::access_denied(Message::KIND, Action::Update));
        }

        if message.read_at.is_some() {
            return Ok(message);
        }
        let read = Message {
            read_at: Some(self.clock.now()),
            ..message.clone()
        };
        self.save(message_id, &message, read).await
    }
}
