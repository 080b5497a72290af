//! # Aid Dashboard
//!
//! Wiring between configuration, the warehouse and the analytics session.
//!
//! ## Flow
//!
//! 1. Open DuckDB and import any configured extracts
//! 2. Wrap the source in the configured query cache
//! 3. Fetch the five record sets concurrently and canonicalize them
//! 4. Apply selector changes to a [`DashboardSession`] and render the report

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

use aid_analytics::{DashboardParams, DashboardSession, ParamChange};
use aid_domain::RecordSets;
use aid_warehouse::{
    CacheConfig, CachedWarehouse, DuckDbWarehouse, MemoryCache, RedisCache, SharedCache,
    Warehouse, fetch_all,
};
use std::io::{ErrorKind, Write};
use std::sync::Arc;

pub use config::{CacheBackend, Config, LogFormat};
pub use error::{DashboardError, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Open the DuckDB source and import extracts from `IMPORT_DIR`.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or an import fails.
pub async fn open_source(config: &Config) -> Result<DuckDbWarehouse> {
    let path = config.duckdb_path.clone();
    let import_dir = config.import_dir.clone();

    let source = tokio::task::spawn_blocking(move || {
        let source = match &path {
            Some(path) => DuckDbWarehouse::open(path)?,
            None => DuckDbWarehouse::open_in_memory()?,
        };
        if let Some(dir) = &import_dir {
            let rows = source.import_dir(dir)?;
            tracing::info!(dir = %dir.display(), rows, "Imported extracts");
        }
        Ok::<_, aid_warehouse::WarehouseError>(source)
    })
    .await
    .map_err(aid_warehouse::WarehouseError::from)??;

    tracing::info!(
        path = %config
            .duckdb_path
            .as_ref()
            .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string()),
        "DuckDB warehouse opened"
    );
    Ok(source)
}

/// Build the warehouse stack described by `config`.
///
/// # Errors
///
/// Returns an error if DuckDB or the Redis cache cannot be reached.
pub async fn build_warehouse(config: &Config) -> Result<Box<dyn Warehouse>> {
    let source = open_source(config).await?;
    let settings = &config.cache;

    let cache: SharedCache = match settings.backend {
        CacheBackend::None => {
            tracing::info!("Query cache disabled");
            return Ok(Box::new(source));
        }
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::Redis => Arc::new(
            RedisCache::new(&CacheConfig {
                url: settings.redis_url.clone(),
            })
            .await?,
        ),
    };

    tracing::info!(
        backend = ?settings.backend,
        strategy = %settings.strategy,
        ttl_secs = settings.ttl.as_secs(),
        "Query cache enabled"
    );

    Ok(Box::new(
        CachedWarehouse::new(source, cache)
            .with_strategy(settings.strategy)
            .with_ttl(settings.ttl),
    ))
}

/// Fetch the five record sets and freeze them for a session.
///
/// # Errors
///
/// Returns the first fetch error.
pub async fn load_record_sets(warehouse: &dyn Warehouse) -> Result<RecordSets> {
    let raw = fetch_all(warehouse).await?;
    let records = RecordSets::from_raw(raw);
    tracing::info!(
        political_dated = records.political.len(),
        civilian_dated = records.civilian.len(),
        "Record sets ready"
    );
    Ok(records)
}

/// Start a session from default selections and apply `name=value` changes
/// in order.
///
/// # Errors
///
/// Returns an error for the first assignment that does not parse.
pub fn session_with<S: AsRef<str>>(records: RecordSets, assignments: &[S]) -> Result<DashboardSession> {
    let mut session = DashboardSession::new(records, DashboardParams::default());
    for assignment in assignments {
        let change = ParamChange::parse(assignment.as_ref())?;
        session.apply(change);
    }
    Ok(session)
}

/// Write a rendered report and flush. A reader that closed the pipe early
/// (e.g. `| head`) ends output without an error.
///
/// # Errors
///
/// Returns any other I/O error from the writer.
pub fn write_output<W: Write>(out: &mut W, text: &str) -> Result<()> {
    match out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        Err(err) if err.kind() == ErrorKind::BrokenPipe => {
            tracing::debug!("Output closed by reader");
            Ok(())
        }
        other => other.map_err(DashboardError::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aid_domain::{PALESTINE, Selection};
    use std::fs;

    fn seeded() -> DuckDbWarehouse {
        let warehouse = DuckDbWarehouse::open_in_memory().unwrap();
        warehouse
            .execute_batch(
                r"
                INSERT INTO aid_transactions VALUES
                    ('West Bank and Gaza', 2020, 100.0, 'Water', 'Wells', 'USAID', 'Economic', 'Relief', NULL, NULL, 'Disbursements'),
                    ('Israel', 2020, 200.0, 'Defense', 'Systems', 'DoD', 'Military', 'Security', NULL, NULL, 'Disbursements');

                INSERT INTO violence_combined VALUES
                    (2023, 'October', 10, 100, 5, 50),
                    (2022, 'Smarch', 1, 1, 1, 1);

                INSERT INTO civilian_combined VALUES (2023, 'October', 4, 40, 1, 5);

                INSERT INTO health VALUES
                    ('OPT', 1, 0, 1, 0, '3', '1', 'Airstrike', 'Hospital'),
                    ('Israel', 1, 0, 0, 0, '1', '2', 'Rocket', 'Hospital');
                ",
            )
            .unwrap();
        warehouse
    }

    #[tokio::test]
    async fn test_load_canonicalizes_and_dates() {
        let records = load_record_sets(&seeded()).await.unwrap();

        assert!(records.aid.iter().any(|a| a.country.as_deref() == Some(PALESTINE)));
        assert!(records.healthcare.iter().all(|h| h.country != "OPT"));
        assert_eq!(records.political.len(), 1);
    }

    #[tokio::test]
    async fn test_session_with_assignments() {
        let records = load_record_sets(&seeded()).await.unwrap();
        let mut session =
            session_with(records, &["aid.country=Palestine", "health.metric=workers_killed"]).unwrap();

        assert_eq!(
            session.params().aid.country,
            Selection::Only(PALESTINE.to_string())
        );
        let overview = session.aid_overview();
        assert_eq!(overview.total_aid_display, "$100.00");

        let report = session.report();
        assert_eq!(report.civilian_share.pse_display, "40.00%");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_output() {
        let mut buf = Vec::new();
        write_output(&mut buf, "# Report\n").unwrap();
        assert_eq!(buf, b"# Report\n");

        assert!(write_output(&mut ClosedPipe, "# Report\n").is_ok());
        assert!(matches!(
            write_output(&mut FullDisk, "# Report\n"),
            Err(DashboardError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_session_rejects_unknown_selector() {
        let records = load_record_sets(&seeded()).await.unwrap();
        assert!(session_with(records, &["aid.colour=red"]).is_err());
    }

    #[tokio::test]
    async fn test_build_warehouse_without_cache() {
        let config = Config {
            cache: config::CacheSettings {
                backend: CacheBackend::None,
                ..config::CacheSettings::default()
            },
            ..Config::default()
        };
        let warehouse = build_warehouse(&config).await.unwrap();
        let records = load_record_sets(warehouse.as_ref()).await.unwrap();
        assert!(records.aid.is_empty());

        let session = session_with::<&str>(records, &[]).unwrap();
        assert_eq!(session.params().aid.country, Selection::All);
    }

    #[tokio::test]
    async fn test_import_dir_with_memory_cache() {
        let dir = std::env::temp_dir().join(format!("aid-dashboard-import-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("violence_combined.csv"),
            "Year,Month,pse_events,pse_fatalities,israel_events,israel_fatalities\n\
             2023,October,10,100,5,50\n\
             2023,November,2,20,1,10\n",
        )
        .unwrap();

        let config = Config {
            import_dir: Some(dir.clone()),
            ..Config::default()
        };
        let warehouse = build_warehouse(&config).await.unwrap();
        let records = load_record_sets(warehouse.as_ref()).await.unwrap();
        assert_eq!(records.political.len(), 2);

        fs::remove_dir_all(&dir).unwrap();
    }
}
