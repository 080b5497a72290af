//! The five fixed analytical queries feeding the dashboard.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Source table names
pub mod tables {
    pub const AID: &str = "aid_transactions";
    pub const POLITICAL: &str = "violence_combined";
    pub const CIVILIAN: &str = "civilian_combined";
    pub const HEALTH: &str = "health";

    pub const ALL: [&str; 4] = [AID, POLITICAL, CIVILIAN, HEALTH];
}

/// Identity of one warehouse query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseQuery {
    AidDisbursements,
    PoliticalEvents,
    CivilianEvents,
    HealthcareAttacks,
    WeaponIncidents,
}

impl WarehouseQuery {
    pub const ALL: [Self; 5] = [
        Self::AidDisbursements,
        Self::PoliticalEvents,
        Self::CivilianEvents,
        Self::HealthcareAttacks,
        Self::WeaponIncidents,
    ];

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AidDisbursements => "aid_disbursements",
            Self::PoliticalEvents => "political_events",
            Self::CivilianEvents => "civilian_events",
            Self::HealthcareAttacks => "healthcare_attacks",
            Self::WeaponIncidents => "weapon_incidents",
        }
    }

    /// Query text. Column order matches the row mappers of every source.
    #[must_use]
    pub const fn sql(&self) -> &'static str {
        match self {
            Self::AidDisbursements => {
                r#"
                SELECT
                    Country_Name,
                    CAST(Fiscal_Year AS INTEGER) AS Fiscal_Year,
                    CAST(Current_Dollar_Amount AS DOUBLE) AS Current_Dollar_Amount,
                    Activity_Name,
                    Activity_Description,
                    Funding_Agency_Name,
                    Foreign_Assistance_Objective_Name,
                    International_Purpose_Name,
                    International_Category_Name,
                    International_Sector_Name
                FROM aid_transactions
                WHERE Transaction_Type_Name = 'Disbursements'
                  AND Fiscal_Year IS NOT NULL
                ORDER BY Fiscal_Year DESC
                "#
            }
            Self::PoliticalEvents => {
                r#"
                SELECT
                    CAST(Year AS INTEGER) AS Year,
                    Month,
                    CAST(COALESCE(pse_events, 0) AS BIGINT) AS pse_events,
                    CAST(COALESCE(pse_fatalities, 0) AS BIGINT) AS pse_fatalities,
                    CAST(COALESCE(israel_events, 0) AS BIGINT) AS israel_events,
                    CAST(COALESCE(israel_fatalities, 0) AS BIGINT) AS israel_fatalities
                FROM violence_combined
                WHERE Year IS NOT NULL
                ORDER BY Year
                "#
            }
            Self::CivilianEvents => {
                r#"
                SELECT
                    CAST(Year AS INTEGER) AS Year,
                    Month,
                    CAST(COALESCE(pse_events, 0) AS BIGINT) AS pse_events,
                    CAST(COALESCE(pse_fatalities, 0) AS BIGINT) AS pse_fatalities,
                    CAST(COALESCE(israel_events, 0) AS BIGINT) AS israel_events,
                    CAST(COALESCE(israel_fatalities, 0) AS BIGINT) AS israel_fatalities
                FROM civilian_combined
                WHERE Year IS NOT NULL
                ORDER BY Year
                "#
            }
            Self::HealthcareAttacks => {
                r#"
                SELECT
                    Country,
                    CAST(COALESCE(SUM("Number of Attacks on Health Facilities Reporting Damaged"), 0) AS BIGINT) AS healthcare_facilities_damaged,
                    CAST(COALESCE(SUM("Occupation of Health Facility"), 0) AS BIGINT) AS healthcare_facilities_occupied,
                    CAST(COALESCE(SUM("Health Transportation Damaged"), 0) AS BIGINT) AS health_transportation_damaged,
                    CAST(COALESCE(SUM("Looting of Health Supplies"), 0) AS BIGINT) AS health_supplies_looted,
                    CAST(COALESCE(SUM(TRY_CAST("Health Workers Killed" AS BIGINT)), 0) AS BIGINT) AS health_workers_killed,
                    CAST(COALESCE(SUM(TRY_CAST("Health Workers Injured" AS BIGINT)), 0) AS BIGINT) AS health_workers_injured,
                    CAST(COUNT(DISTINCT "Weapon Used") AS BIGINT) AS weapons_used
                FROM health
                WHERE Country IS NOT NULL
                GROUP BY Country
                ORDER BY Country
                "#
            }
            Self::WeaponIncidents => {
                r#"
                SELECT
                    Country,
                    "Weapon Used" AS weapon_used,
                    CAST(COUNT(*) AS BIGINT) AS weapon_usage_count,
                    "Location of Incident" AS incident_location,
                    CAST(COUNT(*) AS BIGINT) AS attack_count
                FROM health
                WHERE Country IS NOT NULL
                GROUP BY Country, "Weapon Used", "Location of Incident"
                ORDER BY Country, weapon_usage_count DESC, attack_count DESC
                "#
            }
        }
    }

    /// Cache key: query name plus a digest of the query text, so editing a
    /// query never serves results memoized for the old text.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let digest = Sha256::digest(self.sql().as_bytes());
        let hex = format!("{digest:x}");
        format!("warehouse:{}:{}", self.name(), &hex[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_cache_keys_are_stable_and_distinct() {
        let keys: HashSet<String> = WarehouseQuery::ALL.iter().map(WarehouseQuery::cache_key).collect();
        assert_eq!(keys.len(), WarehouseQuery::ALL.len());
        assert_eq!(
            WarehouseQuery::PoliticalEvents.cache_key(),
            WarehouseQuery::PoliticalEvents.cache_key()
        );
        assert!(WarehouseQuery::AidDisbursements
            .cache_key()
            .starts_with("warehouse:aid_disbursements:"));
    }

    #[test]
    fn test_queries_target_known_tables() {
        for query in WarehouseQuery::ALL {
            assert!(tables::ALL.iter().any(|table| query.sql().contains(table)));
        }
        assert!(WarehouseQuery::AidDisbursements.sql().contains("'Disbursements'"));
    }
}
