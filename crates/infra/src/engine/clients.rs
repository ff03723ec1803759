use tracing::{debug, info, warn};

use servicepro_clients::{Client, ClientId, PhoneSet, normalize_phone};
use servicepro_core::Entity;
use servicepro_orders::RepairOrder;

use crate::error::{ClientError, StoreResult};
use crate::store::RecordStore;

/// Phone-number based client lookup and registration.
pub struct ClientRegistry<'a, S> {
    store: &'a mut S,
}

impl<'a, S: RecordStore> ClientRegistry<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn find(&self, id: ClientId) -> StoreResult<Option<Client>> {
        self.store.find::<Client>(id)
    }

    /// The client owning `phone` (compared after normalization), if any.
    pub fn find_by_phone(&self, phone: &str) -> StoreResult<Option<Client>> {
        if normalize_phone(phone).is_empty() {
            return Ok(None);
        }
        let mut matches = self.store.find_all_by::<Client>(|c| c.has_phone(phone))?;
        Ok(if matches.is_empty() { None } else { Some(matches.swap_remove(0)) })
    }

    /// Resolve the client for `primary_phone`, registering one if needed.
    ///
    /// Numbers are trimmed and de-duplicated; at least one must remain. An
    /// existing client gains any numbers it did not have yet. A new client
    /// starts with zero orders.
    pub fn get_or_create(
        &mut self,
        primary_phone: &str,
        name: &str,
        additional_phones: &[String],
    ) -> Result<Client, ClientError> {
        let phones = PhoneSet::from_raw(
            std::iter::once(primary_phone).chain(additional_phones.iter().map(String::as_str)),
        )?;

        match self.find_by_phone(phones.primary())? {
            Some(existing) => {
                self.ensure_phones_free(&phones, Some(existing.id()))?;
                let mut merged = existing.clone();
                if !merged.merge_phones(&phones) {
                    debug!(client_id = %existing.id(), "client resolved by phone");
                    return Ok(existing);
                }
                let updated = self
                    .store
                    .update::<Client>(existing.id(), |c| {
                        c.merge_phones(&phones);
                    })?
                    .ok_or(ClientError::NotFound(existing.id()))?;
                info!(client_id = %updated.id(), phones = updated.phones().len(), "merged new phone numbers into client");
                Ok(updated)
            }
            None => {
                self.ensure_phones_free(&phones, None)?;
                let client = self
                    .store
                    .create::<Client, ClientError>(|id| Ok(Client::register(id, name, phones)))?;
                info!(client_id = %client.id(), "registered client");
                Ok(client)
            }
        }
    }

    /// Count one more order for the client. A missing client is not an
    /// error: orders can outlive the client record.
    pub fn increment_orders(&mut self, id: ClientId) -> StoreResult<()> {
        if self.store.update::<Client>(id, Client::record_order)?.is_none() {
            debug!(client_id = %id, "order counter not incremented, client missing");
        }
        Ok(())
    }

    /// Replace name, phone numbers and email. Fails without changes when no
    /// number survives trimming or a number belongs to another client.
    pub fn update_details(
        &mut self,
        id: ClientId,
        name: &str,
        phones: &[String],
        email: Option<&str>,
    ) -> Result<Client, ClientError> {
        let phones = PhoneSet::from_raw(phones)?;
        self.ensure_phones_free(&phones, Some(id))?;
        let updated = self
            .store
            .update::<Client>(id, |c| c.update_details(name, phones, email))?
            .ok_or(ClientError::NotFound(id))?;
        info!(client_id = %id, "client details updated");
        Ok(updated)
    }

    /// Clients whose name or phone numbers contain `term`.
    pub fn search(&self, term: &str) -> StoreResult<Vec<Client>> {
        self.store.find_all_by::<Client>(|c| c.matches(term))
    }

    pub fn list(&self) -> StoreResult<Vec<Client>> {
        self.store.query_all::<Client>()
    }

    /// The client's orders, newest first.
    pub fn history(&self, id: ClientId) -> StoreResult<Vec<RepairOrder>> {
        let mut orders = self.store.find_all_by::<RepairOrder>(|o| o.client_id() == id)?;
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then(b.id().cmp(&a.id())));
        Ok(orders)
    }

    fn ensure_phones_free(&self, phones: &PhoneSet, owner: Option<ClientId>) -> Result<(), ClientError> {
        for phone in phones.iter() {
            if let Some(other) = self.find_by_phone(phone)? {
                if Some(other.id()) != owner {
                    warn!(phone, owner = %other.id(), "phone number already registered");
                    return Err(ClientError::PhoneTaken {
                        phone: phone.to_string(),
                        owner: other.id(),
                    });
                }
            }
        }
        Ok(())
    }
}
