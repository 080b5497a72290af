//! # DuckDB Warehouse
//!
//! Runs the fixed queries against a local DuckDB database holding the raw
//! aid, violence and health extracts.

use async_trait::async_trait;
use duckdb::{Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::{Result, WarehouseError};
use crate::queries::{WarehouseQuery, tables};
use crate::source::traits::Warehouse;
use aid_domain::{
    AidTransaction, CivilianEvent, ConflictEvent, HealthcareAttack, PoliticalEvent,
    WeaponIncident,
};

const SCHEMA: &str = r#"
    -- Raw aid transactions, every transaction type
    CREATE TABLE IF NOT EXISTS aid_transactions (
        Country_Name VARCHAR,
        Fiscal_Year INTEGER,
        Current_Dollar_Amount DOUBLE,
        Activity_Name VARCHAR,
        Activity_Description VARCHAR,
        Funding_Agency_Name VARCHAR,
        Foreign_Assistance_Objective_Name VARCHAR,
        International_Purpose_Name VARCHAR,
        International_Category_Name VARCHAR,
        International_Sector_Name VARCHAR,
        Transaction_Type_Name VARCHAR
    );

    -- Monthly political violence counters
    CREATE TABLE IF NOT EXISTS violence_combined (
        Year INTEGER,
        Month VARCHAR,
        pse_events BIGINT,
        pse_fatalities BIGINT,
        israel_events BIGINT,
        israel_fatalities BIGINT
    );

    -- Monthly civilian targeting counters
    CREATE TABLE IF NOT EXISTS civilian_combined (
        Year INTEGER,
        Month VARCHAR,
        pse_events BIGINT,
        pse_fatalities BIGINT,
        israel_events BIGINT,
        israel_fatalities BIGINT
    );

    -- Incident-level attacks on healthcare; casualty columns arrive as text
    CREATE TABLE IF NOT EXISTS health (
        Country VARCHAR,
        "Number of Attacks on Health Facilities Reporting Damaged" BIGINT,
        "Occupation of Health Facility" BIGINT,
        "Health Transportation Damaged" BIGINT,
        "Looting of Health Supplies" BIGINT,
        "Health Workers Killed" VARCHAR,
        "Health Workers Injured" VARCHAR,
        "Weapon Used" VARCHAR,
        "Location of Incident" VARCHAR
    );
"#;

/// DuckDB-backed [`Warehouse`].
#[derive(Clone)]
pub struct DuckDbWarehouse {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbWarehouse {
    /// Open an in-memory database with an empty schema.
    ///
    /// # Errors
    ///
    /// Returns an error if DuckDB cannot open or initialise the database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Open (or create) a database file.
    ///
    /// # Errors
    ///
    /// Returns an error if DuckDB cannot open or initialise the database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| WarehouseError::DuckDb("connection mutex poisoned".to_string()))?;
        f(&conn)
    }

    /// Execute raw SQL statements, e.g. to seed or transform source tables.
    ///
    /// # Errors
    ///
    /// Returns the DuckDB error of the first failing statement.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.with_conn(|conn| Ok(conn.execute_batch(sql)?))
    }

    /// Append a CSV extract (with header row) to a source table.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown table or a failed copy.
    pub fn import_csv<P: AsRef<Path>>(&self, table: &str, path: P) -> Result<usize> {
        let table = known_table(table)?;
        let query = format!(
            "COPY {table} FROM '{}' (HEADER)",
            escape_literal(&path.as_ref().display().to_string())
        );
        let count = self.with_conn(|conn| Ok(conn.execute(&query, [])?))?;
        tracing::info!(table, rows = count, path = %path.as_ref().display(), "Imported CSV extract");
        Ok(count)
    }

    /// Append a Parquet extract to a source table. Columns are matched by
    /// name, so the file may order them differently from the table.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown table or a failed insert.
    pub fn import_parquet<P: AsRef<Path>>(&self, table: &str, path: P) -> Result<usize> {
        let table = known_table(table)?;
        let query = format!(
            "INSERT INTO {table} BY NAME SELECT * FROM read_parquet('{}')",
            escape_literal(&path.as_ref().display().to_string())
        );
        let count = self.with_conn(|conn| Ok(conn.execute(&query, [])?))?;
        tracing::info!(table, rows = count, path = %path.as_ref().display(), "Imported Parquet extract");
        Ok(count)
    }

    /// Import every `<table>.csv` or `<table>.parquet` found in `dir`.
    ///
    /// # Errors
    ///
    /// Returns the first import error.
    pub fn import_dir<P: AsRef<Path>>(&self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(WarehouseError::InvalidImport(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut total = 0;
        for table in tables::ALL {
            let csv = dir.join(format!("{table}.csv"));
            let parquet = dir.join(format!("{table}.parquet"));
            if csv.is_file() {
                total += self.import_csv(table, &csv)?;
            } else if parquet.is_file() {
                total += self.import_parquet(table, &parquet)?;
            } else {
                tracing::warn!(table, dir = %dir.display(), "No extract found for table");
            }
        }
        Ok(total)
    }

    /// Run one fixed query on the blocking pool.
    async fn run<T, F>(&self, query: WarehouseQuery, map_row: F) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: Fn(&Row<'_>) -> duckdb::Result<T> + Send + 'static,
    {
        let this = self.clone();
        let rows = tokio::task::spawn_blocking(move || {
            this.with_conn(|conn| {
                let mut stmt = conn.prepare(query.sql())?;
                let rows = stmt.query_map([], |row| map_row(row))?;
                Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
            })
        })
        .await??;

        tracing::debug!(query = query.name(), rows = rows.len(), "Warehouse query executed");
        Ok(rows)
    }
}

fn known_table(table: &str) -> Result<&'static str> {
    tables::ALL
        .into_iter()
        .find(|known| *known == table)
        .ok_or_else(|| WarehouseError::InvalidImport(format!("unknown table '{table}'")))
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

fn conflict_event(row: &Row<'_>) -> duckdb::Result<ConflictEvent> {
    Ok(ConflictEvent {
        year: row.get(0)?,
        month: row.get(1)?,
        pse_events: row.get(2)?,
        pse_fatalities: row.get(3)?,
        israel_events: row.get(4)?,
        israel_fatalities: row.get(5)?,
    })
}

#[async_trait]
impl Warehouse for DuckDbWarehouse {
    async fn aid_transactions(&self) -> Result<Vec<AidTransaction>> {
        self.run(WarehouseQuery::AidDisbursements, |row| {
            Ok(AidTransaction {
                country: row.get(0)?,
                fiscal_year: row.get(1)?,
                dollar_amount: row.get(2)?,
                activity_name: row.get(3)?,
                activity_description: row.get(4)?,
                funding_agency: row.get(5)?,
                objective_name: row.get(6)?,
                purpose_name: row.get(7)?,
                category_name: row.get(8)?,
                sector_name: row.get(9)?,
            })
        })
        .await
    }

    async fn political_events(&self) -> Result<Vec<PoliticalEvent>> {
        self.run(WarehouseQuery::PoliticalEvents, conflict_event).await
    }

    async fn civilian_events(&self) -> Result<Vec<CivilianEvent>> {
        self.run(WarehouseQuery::CivilianEvents, conflict_event).await
    }

    async fn healthcare_attacks(&self) -> Result<Vec<HealthcareAttack>> {
        self.run(WarehouseQuery::HealthcareAttacks, |row| {
            Ok(HealthcareAttack {
                country: row.get(0)?,
                facilities_damaged: row.get(1)?,
                facilities_occupied: row.get(2)?,
                transportation_damaged: row.get(3)?,
                supplies_looted: row.get(4)?,
                workers_killed: row.get(5)?,
                workers_injured: row.get(6)?,
                weapons_used: row.get(7)?,
            })
        })
        .await
    }

    async fn weapon_incidents(&self) -> Result<Vec<WeaponIncident>> {
        self.run(WarehouseQuery::WeaponIncidents, |row| {
            Ok(WeaponIncident {
                country: row.get(0)?,
                weapon_used: row.get(1)?,
                weapon_usage_count: row.get(2)?,
                incident_location: row.get(3)?,
                attack_count: row.get(4)?,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::traits::fetch_all;

    fn seeded() -> DuckDbWarehouse {
        let warehouse = DuckDbWarehouse::open_in_memory().unwrap();
        warehouse
            .execute_batch(
                r#"
                INSERT INTO aid_transactions VALUES
                    ('West Bank and Gaza', 2020, 100.0, 'Water', 'Wells', 'USAID', 'Economic', 'Relief', NULL, NULL, 'Disbursements'),
                    ('Israel', 2021, 200.0, 'Defense', 'Systems', 'DoD', 'Military', 'Security', NULL, NULL, 'Disbursements'),
                    ('Israel', 2021, 999.0, 'Defense', 'Systems', 'DoD', 'Military', 'Security', NULL, NULL, 'Obligations');

                INSERT INTO violence_combined VALUES
                    (2023, 'October', 10, 100, 5, 50),
                    (2023, NULL, 1, 1, 1, 1),
                    (NULL, 'May', 1, 1, 1, 1);

                INSERT INTO civilian_combined VALUES (2023, 'October', 4, 40, NULL, 5);

                INSERT INTO health VALUES
                    ('OPT', 1, 0, 1, 0, '3', 'n/a', 'Airstrike', 'Hospital'),
                    ('OPT', 2, 1, 0, 1, '2', '7', 'Airstrike', 'Clinic'),
                    ('Israel', 1, 0, 0, 0, '1', '2', 'Rocket', 'Hospital');
                "#,
            )
            .unwrap();
        warehouse
    }

    #[tokio::test]
    async fn test_empty_database() {
        let warehouse = DuckDbWarehouse::open_in_memory().unwrap();
        let raw = fetch_all(&warehouse).await.unwrap();
        assert!(raw.aid.is_empty());
        assert!(raw.weapons.is_empty());
    }

    #[tokio::test]
    async fn test_aid_query_keeps_disbursements_only() {
        let warehouse = seeded();
        let aid = warehouse.aid_transactions().await.unwrap();
        assert_eq!(aid.len(), 2);
        assert_eq!(aid[0].fiscal_year, 2021);
        assert_eq!(aid[0].dollar_amount, Some(200.0));
        assert_eq!(aid[1].country.as_deref(), Some("West Bank and Gaza"));
        assert_eq!(aid[1].category_name, None);
    }

    #[tokio::test]
    async fn test_aid_query_keeps_rows_with_null_columns() {
        let warehouse = seeded();
        warehouse
            .execute_batch(
                r#"
                INSERT INTO aid_transactions VALUES
                    (NULL, 2019, 50.0, NULL, NULL, NULL, 'Economic', NULL, NULL, NULL, 'Disbursements'),
                    ('Israel', 2019, NULL, 'Training', NULL, 'DoD', 'Military', NULL, NULL, NULL, 'Disbursements');
                "#,
            )
            .unwrap();

        let aid = warehouse.aid_transactions().await.unwrap();
        assert_eq!(aid.len(), 4);
        let unnamed = aid.iter().find(|a| a.country.is_none()).unwrap();
        assert_eq!(unnamed.activity_name, None);
        assert_eq!(unnamed.funding_agency, None);
        let unpriced = aid.iter().find(|a| a.dollar_amount.is_none()).unwrap();
        assert_eq!(unpriced.activity_name.as_deref(), Some("Training"));
    }

    #[tokio::test]
    async fn test_parquet_import_matches_columns_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aid_transactions.parquet");
        let source = DuckDbWarehouse::open_in_memory().unwrap();
        source
            .execute_batch(&format!(
                r#"
                COPY (
                    SELECT
                        'Disbursements' AS Transaction_Type_Name,
                        'Funding' AS Activity_Name,
                        2022 AS Fiscal_Year,
                        'Israel' AS Country_Name,
                        75.5 AS Current_Dollar_Amount,
                        'USAID' AS Funding_Agency_Name
                ) TO '{}' (FORMAT PARQUET);
                "#,
                escape_literal(&path.display().to_string())
            ))
            .unwrap();

        let warehouse = DuckDbWarehouse::open_in_memory().unwrap();
        assert_eq!(warehouse.import_dir(dir.path()).unwrap(), 1);

        let aid = warehouse.aid_transactions().await.unwrap();
        assert_eq!(aid.len(), 1);
        assert_eq!(aid[0].country.as_deref(), Some("Israel"));
        assert_eq!(aid[0].fiscal_year, 2022);
        assert_eq!(aid[0].dollar_amount, Some(75.5));
        assert_eq!(aid[0].activity_name.as_deref(), Some("Funding"));
        assert_eq!(aid[0].funding_agency.as_deref(), Some("USAID"));
        assert_eq!(aid[0].objective_name, None);
    }

    #[tokio::test]
    async fn test_event_queries() {
        let warehouse = seeded();
        let political = warehouse.political_events().await.unwrap();
        assert_eq!(political.len(), 2);
        assert!(political.iter().any(|e| e.month.is_none()));

        let civilian = warehouse.civilian_events().await.unwrap();
        assert_eq!(civilian[0].israel_events, 0);
        assert_eq!(civilian[0].pse_fatalities, 40);
    }

    #[tokio::test]
    async fn test_health_aggregates() {
        let warehouse = seeded();
        let health = warehouse.healthcare_attacks().await.unwrap();
        let opt = health.iter().find(|h| h.country == "OPT").unwrap();
        assert_eq!(opt.facilities_damaged, 3);
        assert_eq!(opt.workers_killed, 5);
        assert_eq!(opt.workers_injured, 7);
        assert_eq!(opt.weapons_used, 1);

        let weapons = warehouse.weapon_incidents().await.unwrap();
        assert_eq!(weapons.len(), 3);
        assert!(weapons.iter().all(|w| w.weapon_usage_count == w.attack_count));
    }

    #[test]
    fn test_import_rejects_unknown_table() {
        let warehouse = DuckDbWarehouse::open_in_memory().unwrap();
        let err = warehouse.import_csv("users", "/tmp/users.csv").unwrap_err();
        assert!(matches!(err, WarehouseError::InvalidImport(_)));
    }

    #[test]
    fn test_import_dir_requires_directory() {
        let warehouse = DuckDbWarehouse::open_in_memory().unwrap();
        assert!(warehouse.import_dir("/definitely/not/here").is_err());
    }
}
