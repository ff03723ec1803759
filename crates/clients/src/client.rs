use serde::{Deserialize, Serialize};

use servicepro_core::{DomainError, Entity, record_id};

use crate::phone::{PhoneSet, normalize_phone};

record_id!(
    /// Client identifier, assigned by the record store.
    ClientId
);

/// A person who brings devices in for repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredClient")]
pub struct Client {
    id: ClientId,
    name: String,
    phones: PhoneSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    orders_count: u32,
}

impl Client {
    /// A freshly registered client with no orders yet. The name is kept as
    /// given, blank included; it is corrected later through an edit.
    pub fn register(id: ClientId, name: impl Into<String>, phones: PhoneSet) -> Self {
        Self {
            id,
            name: name.into(),
            phones,
            email: None,
            orders_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phones(&self) -> &PhoneSet {
        &self.phones
    }

    pub fn primary_phone(&self) -> &str {
        self.phones.primary()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn orders_count(&self) -> u32 {
        self.orders_count
    }

    pub fn has_phone(&self, phone: &str) -> bool {
        self.phones.contains(phone)
    }

    /// Add any numbers not already on file. Returns `true` if the set grew.
    pub fn merge_phones(&mut self, phones: &PhoneSet) -> bool {
        self.phones.merge(phones)
    }

    pub fn record_order(&mut self) {
        self.orders_count = self.orders_count.saturating_add(1);
    }

    /// Replace the editable details. Phone ownership across clients is the
    /// registry's concern.
    pub fn update_details(&mut self, name: impl Into<String>, phones: PhoneSet, email: Option<&str>) {
        self.name = name.into();
        self.phones = phones;
        self.email = non_blank(email);
    }

    /// Case-insensitive match on name, or a phone match on the normalized
    /// form of `term`.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        if self.name.to_lowercase().contains(&term.to_lowercase()) {
            return true;
        }
        let digits = normalize_phone(term);
        !digits.is_empty() && self.phones.iter().any(|p| normalize_phone(p).contains(&digits))
    }
}

impl Entity for Client {
    type Id = ClientId;

    fn id(&self) -> ClientId {
        self.id
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// On-disk shape; a client must keep at least one phone number.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredClient {
    id: ClientId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    phones: Vec<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    orders_count: u32,
}

impl TryFrom<StoredClient> for Client {
    type Error = DomainError;

    fn try_from(stored: StoredClient) -> Result<Self, Self::Error> {
        let phones = PhoneSet::from_raw(stored.phones).map_err(|_| {
            DomainError::invariant(format!("client {} has no phone numbers", stored.id))
        })?;
        Ok(Self {
            id: stored.id,
            name: stored.name,
            phones,
            email: non_blank(stored.email.as_deref()),
            orders_count: stored.orders_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        let phones = PhoneSet::from_raw(["+380671234567"]).unwrap();
        Client::register(ClientId::new(1), "Петренко Іван", phones)
    }

    #[test]
    fn registers_with_zero_orders() {
        let c = client();
        assert_eq!(c.name(), "Петренко Іван");
        assert_eq!(c.orders_count(), 0);
        assert_eq!(c.primary_phone(), "+380671234567");
        assert!(c.has_phone("380 67 123 45 67"));
    }

    #[test]
    fn names_are_kept_as_given() {
        let phones = PhoneSet::from_raw(["+380671234567"]).unwrap();
        assert_eq!(Client::register(ClientId::new(2), "", phones).name(), "");

        let mut c = client();
        c.update_details(" Іваненко ", PhoneSet::from_raw(["0501112233"]).unwrap(), Some("  "));
        assert_eq!(c.name(), " Іваненко ");
        assert_eq!(c.email(), None);
        assert!(!c.has_phone("+380671234567"));
    }

    #[test]
    fn search_matches_name_or_phone_fragment() {
        let c = client();
        assert!(c.matches("петренко"));
        assert!(c.matches("123 45"));
        assert!(!c.matches("Сидоренко"));
    }

    #[test]
    fn loads_snapshot_records() {
        let json = r#"{"id":3,"name":"Іваненко Марія","phones":["+380509876543"],"email":"","ordersCount":2}"#;
        let c: Client = serde_json::from_str(json).unwrap();
        assert_eq!(c.phones().as_slice(), &["+380509876543".to_string()]);
        assert_eq!(c.orders_count(), 2);
        assert_eq!(c.email(), None);

        let out = serde_json::to_value(&c).unwrap();
        assert_eq!(out["phones"][0], "+380509876543");
        assert_eq!(out["ordersCount"], 2);
    }

    #[test]
    fn rejects_records_without_phones() {
        let json = r#"{"id":4,"name":"Nobody","phones":[]}"#;
        assert!(serde_json::from_str::<Client>(json).is_err());

        let single_phone = r#"{"id":5,"name":"Іваненко Марія","phone":"+380509876543"}"#;
        assert!(serde_json::from_str::<Client>(single_phone).is_err());
    }
}
