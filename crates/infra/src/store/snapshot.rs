//! JSON snapshot document: the portable persisted state of a workshop.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use servicepro_catalog::Service;
use servicepro_clients::Client;
use servicepro_finance::Transaction;
use servicepro_inventory::InventoryPart;
use servicepro_orders::RepairOrder;

use crate::error::StoreResult;

/// Every collection as a top-level array. Missing arrays load as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub clients: Vec<Client>,
    pub orders: Vec<RepairOrder>,
    pub inventory: Vec<InventoryPart>,
    pub services: Vec<Service>,
    pub transactions: Vec<Transaction>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> StoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a snapshot file; `Ok(None)` when it does not exist yet.
    pub fn load(path: &Path) -> StoreResult<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the snapshot next to `path` and rename it into place, so a crash
    /// mid-write never leaves a truncated file behind.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let json = self.to_json()?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn missing_collections_default_to_empty() {
        let snapshot = Snapshot::from_json(r#"{"clients": [], "user": null}"#).unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn writes_all_top_level_arrays() {
        let json = Snapshot::default().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for key in ["clients", "orders", "inventory", "services", "transactions"] {
            assert!(value[key].is_array(), "missing {key}");
        }
    }

    #[test]
    fn records_breaking_their_rules_do_not_load() {
        let documents = [
            r#"{"transactions":[{"id":1,"type":"income","amount":-700,"category":"Other","date":"2024-02-01T09:00:00Z"}]}"#,
            r#"{"inventory":[{"id":1,"name":"Дисплей","quantity":5,"unitCost":-500,"unitPrice":-10}]}"#,
            r#"{"orders":[{"id":1,"number":"R-240201-001","clientId":1,"prepayment":-100,"createdAt":"2024-02-01T10:30:00Z"}]}"#,
            r#"{"clients":[{"id":1,"name":"Петренко О.В.","phones":[]}]}"#,
        ];
        for json in documents {
            let err = Snapshot::from_json(json).unwrap_err();
            assert!(matches!(err, StoreError::Json(_)), "{json} loaded as {err:?}");
        }
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = std::env::temp_dir().join(format!("servicepro-snapshot-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("state.json");

        assert!(Snapshot::load(&path).unwrap().is_none());
        Snapshot::default().save(&path).unwrap();
        assert_eq!(Snapshot::load(&path).unwrap(), Some(Snapshot::default()));
        assert!(!path.with_extension("json.tmp").exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
