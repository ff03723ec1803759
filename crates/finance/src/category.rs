//! Ledger categories the engine writes on its own.

/// Money taken at intake.
pub const PREPAYMENT: &str = "Prepayment";
/// Balance collected when a device is handed back.
pub const REPAIR_PAYMENT: &str = "Repair payment";
/// Bulk delivery of several parts.
pub const SUPPLY: &str = "Supply";
/// Fallback for manual entries without a category.
pub const OTHER: &str = "Other";

/// Category for a single-part purchase.
pub fn purchase(part_name: &str) -> String {
    format!("Purchase: {part_name}")
}
