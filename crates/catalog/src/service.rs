use serde::{Deserialize, Serialize};

use servicepro_core::{DomainError, DomainResult, Entity, Money, record_id};

record_id!(
    /// Catalog service identifier.
    ServiceId
);

/// Fields supplied when adding or editing a service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetails {
    pub name: String,
    pub category: String,
    /// Free-form display text such as "30 хв".
    pub duration: String,
    pub price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    id: ServiceId,
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    duration: String,
    price: Money,
}

impl Service {
    pub fn new(id: ServiceId, details: ServiceDetails) -> DomainResult<Self> {
        let mut service = Self {
            id,
            name: String::new(),
            category: String::new(),
            duration: String::new(),
            price: Money::zero(),
        };
        service.update(details)?;
        Ok(service)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn update(&mut self, details: ServiceDetails) -> DomainResult<()> {
        let name = details.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("service name cannot be empty"));
        }
        if details.price.is_negative() {
            return Err(DomainError::validation("service price cannot be negative"));
        }
        self.name = name.to_string();
        self.category = details.category.trim().to_string();
        self.duration = details.duration.trim().to_string();
        self.price = details.price;
        Ok(())
    }
}

impl Entity for Service {
    type Id = ServiceId;

    fn id(&self) -> ServiceId {
        self.id
    }
}

/// Price spread across a set of services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStats {
    pub count: usize,
    /// Mean price, rounded half-up to a whole minor unit.
    pub average: Money,
    pub min: Money,
    pub max: Money,
}

impl PriceStats {
    /// `None` for an empty catalog.
    pub fn of<'a>(services: impl IntoIterator<Item = &'a Service>) -> Option<Self> {
        let prices: Vec<i64> = services.into_iter().map(|s| s.price.minor()).collect();
        let count = prices.len();
        let min = *prices.iter().min()?;
        let max = *prices.iter().max()?;
        let total: i128 = prices.iter().map(|p| i128::from(*p)).sum();
        let n = count as i128;
        let average = i64::try_from((total + n / 2) / n).ok()?;
        Some(Self {
            count,
            average: Money::from_minor(average),
            min: Money::from_minor(min),
            max: Money::from_minor(max),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(id: u64, name: &str, price: i64) -> Service {
        Service::new(
            ServiceId::new(id),
            ServiceDetails {
                name: name.into(),
                category: "Ремонт".into(),
                duration: "30 хв".into(),
                price: Money::from_major(price),
            },
        )
        .unwrap()
    }

    #[test]
    fn rejects_blank_names() {
        let err = Service::new(ServiceId::new(1), ServiceDetails::default()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn failed_update_leaves_service_unchanged() {
        let mut s = service(1, "Діагностика", 300);
        let bad = ServiceDetails {
            name: "Діагностика".into(),
            price: Money::from_minor(-100),
            ..ServiceDetails::default()
        };
        assert!(s.update(bad).is_err());
        assert_eq!(s.price(), Money::from_major(300));
        assert_eq!(s.duration(), "30 хв");
    }

    #[test]
    fn price_stats_round_the_mean() {
        let services = [
            service(1, "Діагностика", 300),
            service(2, "Заміна дисплея", 500),
            service(3, "Чистка від пилу", 600),
        ];
        let stats = PriceStats::of(&services).unwrap();
        assert_eq!(stats.count, 3);
        // 1400 / 3 = 466.666.. -> 466.67
        assert_eq!(stats.average, Money::from_minor(46_667));
        assert_eq!(stats.min, Money::from_major(300));
        assert_eq!(stats.max, Money::from_major(600));

        assert!(PriceStats::of(&Vec::<Service>::new()).is_none());
    }
}
