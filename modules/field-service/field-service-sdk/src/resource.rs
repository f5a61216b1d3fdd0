//! Scope dimensions and deletion semantics of every managed record.

use fieldops_security::{EntityKind, ScopeSubject};
use uuid::Uuid;

use crate::models::{
    Client, Equipment, Installation, Intervention, Invoice, Message, Product, Quote, QuoteRequest,
    User,
};

/// How a record disappears when deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// The record is removed from the store.
    Hard,
    /// The record stays in the store with a removal flag.
    Soft,
}

/// A record managed by the field-service module.
///
/// `PartialEq` backs conditional writes: a record is replaced only while it
/// still equals the copy the write was based on.
pub trait Resource: ScopeSubject + PartialEq + Clone + Send + Sync + 'static {
    const KIND: EntityKind;
    const DELETION: Deletion;

    /// False once the record has been soft-deleted from `viewer`'s point of view.
    fn is_visible_to(&self, _viewer: Uuid) -> bool {
        true
    }

    /// Apply a soft delete on behalf of `actor`. Only called for `Deletion::Soft` kinds.
    fn soft_delete(&mut self, _actor: Uuid) {}
}

/// Declares the scope dimensions of a record type.
///
/// Every dimension must be given: an expression over `$s`, or `none`.
macro_rules! scope_subject {
    (
        $ty:ty, |$s:ident| {
            owner: $owner:tt,
            client: $client:tt,
            technician: $technician:tt,
            creator: $creator:tt,
            participants: $participants:tt $(,)?
        }
    ) => {
        impl ScopeSubject for $ty {
            fn resource_id(&self) -> Uuid {
                self.id
            }
            fn owner_user_id(&self) -> Option<Uuid> {
                let $s = self;
                scope_subject!(@dim $s, $owner)
            }
            fn client_id(&self) -> Option<Uuid> {
                let $s = self;
                scope_subject!(@dim $s, $client)
            }
            fn technician_id(&self) -> Option<Uuid> {
                let $s = self;
                scope_subject!(@dim $s, $technician)
            }
            fn creator_id(&self) -> Option<Uuid> {
                let $s = self;
                scope_subject!(@dim $s, $creator)
            }
            fn participant_ids(&self) -> Vec<Uuid> {
                let $s = self;
                scope_subject!(@list $s, $participants)
            }
        }
    };
    (@dim $s:ident, none) => {{
        let _ = $s;
        None
    }};
    (@dim $s:ident, $e:block) => {
        $e
    };
    (@list $s:ident, none) => {{
        let _ = $s;
        Vec::new()
    }};
    (@list $s:ident, $e:block) => {
        $e
    };
}

scope_subject!(User, |u| {
    owner: { Some(u.id) },
    client: none,
    technician: none,
    creator: none,
    participants: none,
});

scope_subject!(Client, |c| {
    owner: { Some(c.owner_user_id) },
    client: { Some(c.id) },
    technician: none,
    creator: none,
    participants: none,
});

scope_subject!(Equipment, |e| {
    owner: none,
    client: { Some(e.client_id) },
    technician: { e.technician_id },
    creator: none,
    participants: none,
});

scope_subject!(Intervention, |i| {
    owner: none,
    client: { Some(i.client_id) },
    technician: { Some(i.technician_id) },
    creator: none,
    participants: none,
});

scope_subject!(Installation, |i| {
    owner: none,
    client: { Some(i.client_id) },
    technician: { i.technician_id },
    creator: none,
    participants: none,
});

scope_subject!(Quote, |q| {
    owner: none,
    client: { Some(q.client_id) },
    technician: none,
    creator: { Some(q.author_user_id) },
    participants: none,
});

scope_subject!(Invoice, |i| {
    owner: none,
    client: { Some(i.client_id) },
    technician: none,
    creator: { Some(i.author_user_id) },
    participants: none,
});

scope_subject!(Product, |p| {
    owner: none,
    client: none,
    technician: none,
    creator: { Some(p.supplier_id) },
    participants: none,
});

scope_subject!(Message, |m| {
    owner: none,
    client: none,
    technician: none,
    creator: { Some(m.sender_id) },
    participants: { vec![m.sender_id, m.recipient_id] },
});

scope_subject!(QuoteRequest, |r| {
    owner: none,
    client: { Some(r.client_id) },
    technician: { r.technician_id },
    creator: { Some(r.requested_by) },
    participants: none,
});

impl Resource for User {
    const KIND: EntityKind = EntityKind::User;
    const DELETION: Deletion = Deletion::Hard;
}

impl Resource for Client {
    const KIND: EntityKind = EntityKind::Client;
    const DELETION: Deletion = Deletion::Soft;

    fn is_visible_to(&self, _viewer: Uuid) -> bool {
        self.active
    }

    fn soft_delete(&mut self, _actor: Uuid) {
        self.active = false;
    }
}

impl Resource for Equipment {
    const KIND: EntityKind = EntityKind::Equipment;
    const DELETION: Deletion = Deletion::Hard;
}

impl Resource for Intervention {
    const KIND: EntityKind = EntityKind::Intervention;
    const DELETION: Deletion = Deletion::Hard;
}

impl Resource for Installation {
    const KIND: EntityKind = EntityKind::Installation;
    const DELETION: Deletion = Deletion::Hard;
}

impl Resource for Quote {
    const KIND: EntityKind = EntityKind::Quote;
    const DELETION: Deletion = Deletion::Hard;
}

impl Resource for Invoice {
    const KIND: EntityKind = EntityKind::Invoice;
    const DELETION: Deletion = Deletion::Hard;
}

impl Resource for Product {
    const KIND: EntityKind = EntityKind::Product;
    const DELETION: Deletion = Deletion::Soft;

    fn is_visible_to(&self, _viewer: Uuid) -> bool {
        self.active
    }

    fn soft_delete(&mut self, _actor: Uuid) {
        self.active = false;
    }
}

impl Resource for Message {
    const KIND: EntityKind = EntityKind::Message;
    const DELETION: Deletion = Deletion::Soft;

    fn is_visible_to(&self, viewer: Uuid) -> bool {
        !((viewer == self.sender_id && self.deleted_by_sender)
            || (viewer == self.recipient_id && self.deleted_by_recipient))
    }

    /// Each participant removes the message from their own mailbox only.
    /// An administrator removes it for both sides.
    fn soft_delete(&mut self, actor: Uuid) {
        let is_sender = actor == self.sender_id;
        let is_recipient = actor == self.recipient_id;
        if !is_sender && !is_recipient {
            self.deleted_by_sender = true;
            self.deleted_by_recipient = true;
            return;
        }
        if is_sender {
            self.deleted_by_sender = true;
        }
        if is_recipient {
            self.deleted_by_recipient = true;
        }
    }
}

impl Resource for QuoteRequest {
    const KIND: EntityKind = EntityKind::QuoteRequest;
    const DELETION: Deletion = Deletion::Hard;
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use fieldops_security::ScopePredicate;
    use time::OffsetDateTime;

    fn message(sender: Uuid, recipient: Uuid) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender_id: sender,
            recipient_id: recipient,
            body: "hello".to_owned(),
            sent_at: OffsetDateTime::UNIX_EPOCH,
            read_at: None,
            deleted_by_sender: false,
            deleted_by_recipient: false,
        }
    }

    #[test]
    fn client_exposes_itself_as_client_dimension() {
        let owner = Uuid::new_v4();
        let client = Client {
            id: Uuid::new_v4(),
            owner_user_id: owner,
            name: "Acme".to_owned(),
            contact: crate::models::ContactInfo::default(),
            active: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };

        assert!(ScopePredicate::ByOwnerUser(owner).matches(&client));
        assert!(ScopePredicate::ByOwnerClient(vec![client.id]).matches(&client));
        assert!(!ScopePredicate::ByCreator(owner).matches(&client));
    }

    #[test]
    fn message_soft_delete_is_per_participant() {
        let sender = Uuid::new_v4();
        let recipient = Uuid::new_v4();
        let mut msg = message(sender, recipient);

        msg.soft_delete(recipient);

        assert!(msg.is_visible_to(sender));
        assert!(!msg.is_visible_to(recipient));
        assert!(ScopePredicate::ByParticipant(recipient).matches(&msg));
    }

    #[test]
    fn message_soft_delete_by_outsider_hides_both_sides() {
        let sender = Uuid::new_v4();
        let recipient = Uuid::new_v4();
        let mut msg = message(sender, recipient);

        msg.soft_delete(Uuid::new_v4());

        assert!(!msg.is_visible_to(sender));
        assert!(!msg.is_visible_to(recipient));
    }
}
