//! # Cached Warehouse
//!
//! Wraps any [`Warehouse`] with a [`QueryCache`] and a [`ReadStrategy`].
//! Results are memoized per query under [`WarehouseQuery::cache_key`].

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::time::Duration;

use crate::cache::{DEFAULT_TTL, SharedCache};
use crate::error::Result;
use crate::queries::WarehouseQuery;
use crate::source::Warehouse;
use crate::strategy::ReadStrategy;
use aid_domain::{
    AidTransaction, CivilianEvent, HealthcareAttack, PoliticalEvent, WeaponIncident,
};

/// Memoizing decorator over a warehouse
pub struct CachedWarehouse<W> {
    inner: W,
    cache: SharedCache,
    strategy: ReadStrategy,
    ttl: Duration,
}

impl<W: Warehouse> CachedWarehouse<W> {
    pub fn new(inner: W, cache: SharedCache) -> Self {
        Self {
            inner,
            cache,
            strategy: ReadStrategy::default(),
            ttl: DEFAULT_TTL,
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: ReadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub const fn strategy(&self) -> ReadStrategy {
        self.strategy
    }

    pub const fn inner(&self) -> &W {
        &self.inner
    }

    /// Forget the memoized result of one query
    ///
    /// # Errors
    ///
    /// Returns the cache backend error.
    pub async fn invalidate(&self, query: WarehouseQuery) -> Result<bool> {
        let removed = self.cache.delete(&query.cache_key()).await?;
        tracing::debug!(query = query.name(), removed, "Invalidated cached query");
        Ok(removed)
    }

    /// Forget every memoized query result
    ///
    /// # Errors
    ///
    /// Returns the first cache backend error.
    pub async fn invalidate_all(&self) -> Result<usize> {
        let mut removed = 0;
        for query in WarehouseQuery::ALL {
            if self.invalidate(query).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn fetch<T, Fut>(&self, query: WarehouseQuery, source_fn: impl FnOnce() -> Fut) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = Result<T>>,
    {
        let key = query.cache_key();
        let cache = &self.cache;
        let ttl = self.ttl;
        self.strategy
            .read(
                &key,
                || cache.get(&key),
                source_fn,
                |payload| cache.set(&key, payload, ttl),
            )
            .await
    }
}

#[async_trait]
impl<W: Warehouse> Warehouse for CachedWarehouse<W> {
    async fn aid_transactions(&self) -> Result<Vec<AidTransaction>> {
        self.fetch(WarehouseQuery::AidDisbursements, || self.inner.aid_transactions())
            .await
    }

    async fn political_events(&self) -> Result<Vec<PoliticalEvent>> {
        self.fetch(WarehouseQuery::PoliticalEvents, || self.inner.political_events())
            .await
    }

    async fn civilian_events(&self) -> Result<Vec<CivilianEvent>> {
        self.fetch(WarehouseQuery::CivilianEvents, || self.inner.civilian_events())
            .await
    }

    async fn healthcare_attacks(&self) -> Result<Vec<HealthcareAttack>> {
        self.fetch(WarehouseQuery::HealthcareAttacks, || self.inner.healthcare_attacks())
            .await
    }

    async fn weapon_incidents(&self) -> Result<Vec<WeaponIncident>> {
        self.fetch(WarehouseQuery::WeaponIncidents, || self.inner.weapon_incidents())
            .await
    }
}
