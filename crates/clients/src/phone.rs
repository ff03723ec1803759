use serde::{Deserialize, Serialize};

use servicepro_core::{DomainError, DomainResult, ValueObject};

/// Canonical comparison form of a phone number: whitespace removed, one
/// leading `+` dropped. No numbering-plan validation is attempted.
pub fn normalize_phone(phone: &str) -> String {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    match compact.strip_prefix('+') {
        Some(rest) => rest.to_string(),
        None => compact,
    }
}

/// Non-empty, ordered set of phone numbers, unique by normalized form.
///
/// Numbers are kept as the operator typed them (trimmed); only comparison
/// goes through [`normalize_phone`]. The first entry is the primary number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PhoneSet(Vec<String>);

impl ValueObject for PhoneSet {}

impl PhoneSet {
    /// Build a set from raw input. Blank entries are dropped and later
    /// duplicates (by normalized form) are ignored.
    pub fn from_raw<I, S>(phones: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Vec::new();
        for phone in phones {
            push_unique(&mut set, phone.as_ref());
        }
        if set.is_empty() {
            return Err(DomainError::validation("at least one phone number is required"));
        }
        Ok(Self(set))
    }

    pub fn primary(&self) -> &str {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `phone` matches any entry after normalization.
    pub fn contains(&self, phone: &str) -> bool {
        let needle = normalize_phone(phone);
        !needle.is_empty() && self.0.iter().any(|p| normalize_phone(p) == needle)
    }

    /// Union `other` into this set. Returns `true` if anything was added.
    pub fn merge(&mut self, other: &PhoneSet) -> bool {
        let before = self.0.len();
        for phone in other.iter() {
            push_unique(&mut self.0, phone);
        }
        self.0.len() != before
    }
}

fn push_unique(set: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    let normalized = normalize_phone(trimmed);
    if normalized.is_empty() {
        return;
    }
    if set.iter().any(|p| normalize_phone(p) == normalized) {
        return;
    }
    set.push(trimmed.to_string());
}

impl TryFrom<Vec<String>> for PhoneSet {
    type Error = DomainError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_raw(value)
    }
}

impl From<PhoneSet> for Vec<String> {
    fn from(value: PhoneSet) -> Self {
        value.0
    }
}
