use serde::{Deserialize, Serialize};

use servicepro_core::{DomainError, DomainResult, Entity, Money, record_id};

record_id!(
    /// Inventory part identifier.
    PartId
);

/// Parts with fewer units than this are flagged for reordering.
pub const LOW_STOCK_THRESHOLD: u32 = 3;

/// Input for creating a part.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPart {
    pub name: String,
    pub sku: String,
    pub category: String,
    pub quantity: u32,
    pub unit_cost: Money,
    pub unit_price: Money,
}

/// Editable descriptive fields. Quantity and cost only change through stock
/// operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartDetails {
    pub name: String,
    pub sku: String,
    pub category: String,
    pub unit_price: Money,
}

/// A stocked spare part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredPart")]
pub struct InventoryPart {
    id: PartId,
    name: String,
    sku: String,
    category: String,
    quantity: u32,
    unit_cost: Money,
    unit_price: Money,
}

impl InventoryPart {
    pub fn new(id: PartId, part: NewPart) -> DomainResult<Self> {
        let name = required_name(&part.name)?;
        ensure_not_negative("unit cost", part.unit_cost)?;
        ensure_not_negative("unit price", part.unit_price)?;
        Ok(Self {
            id,
            name,
            sku: part.sku.trim().to_string(),
            category: part.category.trim().to_string(),
            quantity: part.quantity,
            unit_cost: part.unit_cost,
            unit_price: part.unit_price,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Weighted-average purchase cost of one unit.
    pub fn unit_cost(&self) -> Money {
        self.unit_cost
    }

    /// List price of one unit.
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity < LOW_STOCK_THRESHOLD
    }

    /// Take `qty` units out of stock.
    ///
    /// Either the whole quantity is taken or nothing changes; `false` means
    /// there was not enough stock.
    pub fn deduct(&mut self, qty: u32) -> bool {
        if qty > self.quantity {
            return false;
        }
        self.quantity -= qty;
        true
    }

    /// Put back units taken by an earlier [`deduct`](Self::deduct). The cost
    /// basis is left as is.
    pub fn return_stock(&mut self, qty: u32) {
        self.quantity = self.quantity.saturating_add(qty);
    }

    /// Book a purchase of `qty` units at `unit_cost`, blending the cost into
    /// the running weighted average. Nothing changes when the new quantity
    /// would not fit.
    pub fn receive(&mut self, qty: u32, unit_cost: Money) -> DomainResult<()> {
        ensure_not_negative("unit cost", unit_cost)?;
        let quantity = self.quantity.checked_add(qty).ok_or_else(|| {
            DomainError::validation(format!(
                "receiving {qty} units of part {} overflows its stock count",
                self.id
            ))
        })?;
        if let Some(blended) = Money::weighted_average(self.unit_cost, self.quantity, unit_cost, qty) {
            self.unit_cost = blended;
        }
        self.quantity = quantity;
        Ok(())
    }

    pub fn update_details(&mut self, details: PartDetails) -> DomainResult<()> {
        let name = required_name(&details.name)?;
        ensure_not_negative("unit price", details.unit_price)?;
        self.name = name;
        self.sku = details.sku.trim().to_string();
        self.category = details.category.trim().to_string();
        self.unit_price = details.unit_price;
        Ok(())
    }

    /// Stock valued at list price.
    pub fn retail_value(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    /// Stock valued at weighted-average cost.
    pub fn cost_value(&self) -> Money {
        self.unit_cost.times(self.quantity)
    }
}

impl Entity for InventoryPart {
    type Id = PartId;

    fn id(&self) -> PartId {
        self.id
    }
}

/// On-disk shape; loading goes through the same checks as [`InventoryPart::new`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPart {
    id: PartId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    sku: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    quantity: u32,
    unit_cost: Money,
    unit_price: Money,
}

impl TryFrom<StoredPart> for InventoryPart {
    type Error = DomainError;

    fn try_from(stored: StoredPart) -> Result<Self, Self::Error> {
        let part = NewPart {
            name: stored.name,
            sku: stored.sku,
            category: stored.category,
            quantity: stored.quantity,
            unit_cost: stored.unit_cost,
            unit_price: stored.unit_price,
        };
        InventoryPart::new(stored.id, part)
    }
}

fn required_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("part name cannot be empty"));
    }
    Ok(name.to_string())
}

fn ensure_not_negative(field: &str, amount: Money) -> DomainResult<()> {
    if amount.is_negative() {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn part(quantity: u32, cost: i64) -> InventoryPart {
        InventoryPart::new(
            PartId::new(1),
            NewPart {
                name: "Дисплей iPhone 12".into(),
                sku: "IP12-DISP".into(),
                category: "Дисплеї".into(),
                quantity,
                unit_cost: Money::from_major(cost),
                unit_price: Money::from_major(2800),
            },
        )
        .unwrap()
    }

    #[test]
    fn rejects_blank_name_and_negative_prices() {
        let err = InventoryPart::new(PartId::new(1), NewPart::default()).unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("name") => {}
            _ => panic!("expected validation error"),
        }

        let negative = NewPart {
            name: "Батарея".into(),
            unit_price: Money::from_minor(-1),
            ..NewPart::default()
        };
        assert!(InventoryPart::new(PartId::new(2), negative).is_err());
    }

    #[test]
    fn receive_blends_cost_by_quantity() {
        let mut p = part(0, 0);
        p.receive(10, Money::from_major(100)).unwrap();
        p.receive(10, Money::from_major(200)).unwrap();
        assert_eq!(p.quantity(), 20);
        assert_eq!(p.unit_cost(), Money::from_major(150));
    }

    #[test]
    fn receive_of_nothing_on_empty_stock_keeps_cost() {
        let mut p = part(0, 900);
        p.receive(0, Money::from_major(5)).unwrap();
        assert_eq!(p.unit_cost(), Money::from_major(900));
        assert_eq!(p.quantity(), 0);
    }

    #[test]
    fn receive_refuses_quantity_overflow_without_mutation() {
        let mut p = part(u32::MAX - 1, 900);
        let err = p.receive(2, Money::from_major(100)).unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("overflows") => {}
            _ => panic!("expected validation error"),
        }
        assert_eq!(p.quantity(), u32::MAX - 1);
        assert_eq!(p.unit_cost(), Money::from_major(900));

        assert!(p.receive(1, Money::from_minor(-1)).is_err());
        assert_eq!(p.quantity(), u32::MAX - 1);
    }

    #[test]
    fn return_keeps_cost_basis() {
        let mut p = part(5, 2200);
        assert!(p.deduct(2));
        p.return_stock(2);
        assert_eq!(p.quantity(), 5);
        assert_eq!(p.unit_cost(), Money::from_major(2200));
    }

    #[test]
    fn low_stock_below_three() {
        assert!(part(2, 1).is_low_stock());
        assert!(!part(3, 1).is_low_stock());
    }

    #[test]
    fn details_edit_leaves_stock_alone() {
        let mut p = part(5, 2200);
        p.update_details(PartDetails {
            name: "Дисплей iPhone 12 OLED".into(),
            sku: "IP12-OLED".into(),
            category: "Дисплеї".into(),
            unit_price: Money::from_major(3100),
        })
        .unwrap();
        assert_eq!(p.quantity(), 5);
        assert_eq!(p.unit_cost(), Money::from_major(2200));
        assert_eq!(p.retail_value(), Money::from_major(15_500));
        assert_eq!(p.cost_value(), Money::from_major(11_000));
    }

    #[test]
    fn loads_snapshot_records_with_optional_fields_missing() {
        let json = r#"{"id":7,"name":"Клавіатура HP","quantity":10,"unitCost":60000,"unitPrice":80000}"#;
        let p: InventoryPart = serde_json::from_str(json).unwrap();
        assert_eq!(p.id(), PartId::new(7));
        assert_eq!(p.quantity(), 10);
        assert_eq!(p.sku(), "");
        assert_eq!(p.unit_price(), Money::from_major(800));
    }

    #[test]
    fn loading_checks_the_same_rules_as_new() {
        let negative = r#"{"id":1,"name":"Дисплей","quantity":5,"unitCost":-50000,"unitPrice":-1000}"#;
        let err = serde_json::from_str::<InventoryPart>(negative).unwrap_err();
        assert!(err.to_string().contains("cannot be negative"));

        let nameless = r#"{"id":2,"name":"  ","quantity":1,"unitCost":100,"unitPrice":200}"#;
        assert!(serde_json::from_str::<InventoryPart>(nameless).is_err());

        let original_layout = r#"{"id":1,"name":"Дисплей iPhone 12","qty":5,"cost":2200,"price":2800}"#;
        assert!(serde_json::from_str::<InventoryPart>(original_layout).is_err());
    }

    proptest! {
        #[test]
        fn deduct_never_goes_negative(stock in 0u32..1_000, qty in 0u32..2_000) {
            let mut p = part(stock, 100);
            let ok = p.deduct(qty);
            prop_assert_eq!(ok, qty <= stock);
            if ok {
                prop_assert_eq!(p.quantity(), stock - qty);
            } else {
                prop_assert_eq!(p.quantity(), stock);
            }
        }

        #[test]
        fn deduct_then_return_restores_quantity(stock in 0u32..1_000, qty in 0u32..1_000) {
            let mut p = part(stock, 100);
            if p.deduct(qty) {
                p.return_stock(qty);
            }
            prop_assert_eq!(p.quantity(), stock);
        }
    }
}
