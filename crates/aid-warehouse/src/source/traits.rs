//! # Warehouse Trait
//!
//! One method per fixed query. Implementations can be swapped for
//! different backends (DuckDB, a memoizing wrapper, test doubles).

use async_trait::async_trait;

use crate::error::Result;
use aid_domain::{
    AidTransaction, CivilianEvent, HealthcareAttack, PoliticalEvent, RawRecordSets,
    WeaponIncident,
};

/// Source of the five dashboard record sets
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Aid disbursements, most recent fiscal year first
    async fn aid_transactions(&self) -> Result<Vec<AidTransaction>>;

    /// Monthly political violence counters
    async fn political_events(&self) -> Result<Vec<PoliticalEvent>>;

    /// Monthly civilian targeting counters
    async fn civilian_events(&self) -> Result<Vec<CivilianEvent>>;

    /// Per-country healthcare attack totals
    async fn healthcare_attacks(&self) -> Result<Vec<HealthcareAttack>>;

    /// Incident counts per country, weapon and location
    async fn weapon_incidents(&self) -> Result<Vec<WeaponIncident>>;
}

/// Run the five fetches concurrently. The first failure aborts the load.
///
/// # Errors
///
/// Returns the error of whichever fetch failed first.
pub async fn fetch_all(warehouse: &dyn Warehouse) -> Result<RawRecordSets> {
    let (aid, political, civilian, healthcare, weapons) = tokio::try_join!(
        warehouse.aid_transactions(),
        warehouse.political_events(),
        warehouse.civilian_events(),
        warehouse.healthcare_attacks(),
        warehouse.weapon_incidents(),
    )?;

    tracing::info!(
        aid = aid.len(),
        political = political.len(),
        civilian = civilian.len(),
        healthcare = healthcare.len(),
        weapons = weapons.len(),
        "Record sets loaded"
    );

    Ok(RawRecordSets {
        aid,
        political,
        civilian,
        healthcare,
        weapons,
    })
}
