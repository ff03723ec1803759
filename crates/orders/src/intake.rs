use serde::{Deserialize, Serialize};

use servicepro_core::Money;

use crate::order::{Device, Priority};

/// Everything needed to open a repair order for a walk-in client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderIntake {
    pub client_name: String,
    /// Contact numbers; the first one is used to look up an existing client.
    pub phones: Vec<String>,
    pub device: Device,
    pub issue_description: String,
    pub priority: Priority,
    pub prepayment: Money,
}

impl OrderIntake {
    pub fn new<I, S>(client_name: impl Into<String>, phones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client_name: client_name.into(),
            phones: phones.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Intake form values exactly as a front end submits them.
///
/// Conversion is lenient on purpose: an unparseable prepayment becomes zero
/// and an unknown priority becomes `normal`. Phones are only trimmed here;
/// an empty phone list is rejected when the client is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntakeForm {
    pub client_name: String,
    pub phones: Vec<String>,
    /// Single-number forms send `phone` instead of `phones`.
    pub phone: String,
    pub device_type: String,
    pub device_brand: String,
    pub device_model: String,
    pub device_serial: String,
    pub device_password: String,
    pub issue: String,
    pub priority: String,
    pub prepayment: String,
}

impl From<IntakeForm> for OrderIntake {
    fn from(form: IntakeForm) -> Self {
        let phones = form
            .phones
            .into_iter()
            .chain(std::iter::once(form.phone))
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self {
            client_name: form.client_name.trim().to_string(),
            phones,
            device: Device {
                kind: form.device_type.trim().to_string(),
                brand: form.device_brand.trim().to_string(),
                model: form.device_model.trim().to_string(),
                serial: form.device_serial.trim().to_string(),
                password: form.device_password,
            },
            issue_description: form.issue.trim().to_string(),
            priority: Priority::parse_lenient(&form.priority),
            prepayment: Money::parse_lenient(&form.prepayment),
        }
    }
}
