//! Open the workshop described by the environment, print its dashboard and
//! write the snapshot back.

use anyhow::Context;

use servicepro_infra::{EngineConfig, Workshop};

fn main() -> anyhow::Result<()> {
    servicepro_observability::init();

    let config = EngineConfig::load().context("invalid SERVICEPRO_* configuration")?;
    tracing::info!(
        snapshot = ?config.snapshot_path,
        seed_demo_data = config.seed_demo_data,
        revenue_month_match = ?config.revenue_month_match,
        "opening workshop"
    );

    let workshop = Workshop::open(config).context("failed to open workshop")?;

    let dashboard = workshop.dashboard().context("failed to read dashboard")?;
    let low_stock = workshop.low_stock().context("failed to read inventory")?;
    for part in &low_stock {
        tracing::warn!(part = part.name(), quantity = part.quantity(), "low stock");
    }
    println!("{}", serde_json::to_string_pretty(&dashboard)?);

    workshop.flush().context("failed to write snapshot")?;
    Ok(())
}
