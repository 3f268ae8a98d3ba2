use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::filter::{FilterColumn, FilterSet, ALL_SENTINEL};
use crate::store::{Responsable, Store, StoreError, Usuario};

pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V: Clone> Entry<V> {
    fn fresh(&self) -> Option<V> {
        (Instant::now() < self.expires_at).then(|| self.value.clone())
    }
}

/// Memoizes near-static reference reads (filter options, active roster) and
/// filtered query results. Entries expire passively after the TTL; any write
/// invalidates everything explicitly.
pub struct StoreCache {
    ttl: Duration,
    options: HashMap<FilterColumn, Entry<Vec<String>>>,
    usuarios: Option<Entry<Vec<Usuario>>>,
    results: HashMap<String, Entry<Vec<Responsable>>>,
}

impl StoreCache {
    pub fn new() -> StoreCache {
        StoreCache::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> StoreCache {
        StoreCache {
            ttl,
            options: HashMap::new(),
            usuarios: None,
            results: HashMap::new(),
        }
    }

    fn entry<V>(&self, value: V) -> Entry<V> {
        Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        }
    }

    /// Distinct values of one column, prefixed with the sentinel.
    pub fn options(
        &mut self,
        store: &mut dyn Store,
        column: FilterColumn,
    ) -> Result<Vec<String>, StoreError> {
        if let Some(hit) = self.options.get(&column).and_then(|e| e.fresh()) {
            return Ok(hit);
        }
        let mut values = store.distinct_values(column)?;
        values.insert(0, ALL_SENTINEL.to_string());
        let entry = self.entry(values.clone());
        self.options.insert(column, entry);
        Ok(values)
    }

    pub fn usuarios(&mut self, store: &mut dyn Store) -> Result<Vec<Usuario>, StoreError> {
        if let Some(hit) = self.usuarios.as_ref().and_then(|e| e.fresh()) {
            return Ok(hit);
        }
        let roster = store.active_usuarios()?;
        self.usuarios = Some(self.entry(roster.clone()));
        Ok(roster)
    }

    pub fn query(
        &mut self,
        store: &mut dyn Store,
        filter: &FilterSet,
    ) -> Result<Vec<Responsable>, StoreError> {
        let key = filter.cache_key();
        if let Some(hit) = self.results.get(&key).and_then(|e| e.fresh()) {
            return Ok(hit);
        }
        let rows = store.query_responsables(filter)?;
        let entry = self.entry(rows.clone());
        self.results.insert(key, entry);
        Ok(rows)
    }

    /// Drops every cached entry. Called after any successful write, since
    /// usuario values feed the usuario filter's option list.
    pub fn invalidate(&mut self) {
        self.options.clear();
        self.usuarios = None;
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    struct CountingStore {
        inner: SqliteStore,
        reads: usize,
    }

    impl CountingStore {
        fn seeded() -> CountingStore {
            let store = SqliteStore::open_in_memory();
            for (id, sede) in [(1, "Norte"), (2, "Sur")] {
                store.seed_responsable(&Responsable {
                    id,
                    sede: sede.to_string(),
                    escuela: "Salud".to_string(),
                    carrera: "Enfermería".to_string(),
                    nivel: "1".to_string(),
                    jornada: "Diurna".to_string(),
                    usuario: "a".to_string(),
                    nombre: "A".to_string(),
                    apellido: "A".to_string(),
                });
            }
            store.seed_usuario("jsmith", "Juan", "Smith", true);
            CountingStore {
                inner: store,
                reads: 0,
            }
        }
    }

    impl Store for CountingStore {
        fn backend_name(&self) -> &'static str {
            "counting"
        }

        fn distinct_values(&mut self, column: FilterColumn) -> Result<Vec<String>, StoreError> {
            self.reads += 1;
            self.inner.distinct_values(column)
        }

        fn active_usuarios(&mut self) -> Result<Vec<Usuario>, StoreError> {
            self.reads += 1;
            self.inner.active_usuarios()
        }

        fn query_responsables(
            &mut self,
            filter: &FilterSet,
        ) -> Result<Vec<Responsable>, StoreError> {
            self.reads += 1;
            self.inner.query_responsables(filter)
        }

        fn update_responsable(
            &mut self,
            id: i64,
            usuario: &str,
            nombre: &str,
            apellido: &str,
        ) -> Result<(), StoreError> {
            self.inner.update_responsable(id, usuario, nombre, apellido)
        }
    }

    #[test]
    fn second_read_within_ttl_hits_the_cache() {
        let mut store = CountingStore::seeded();
        let mut cache = StoreCache::new();

        let first = cache.options(&mut store, FilterColumn::Sede).unwrap();
        let second = cache.options(&mut store, FilterColumn::Sede).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.reads, 1);
    }

    #[test]
    fn options_are_sentinel_prefixed_and_sorted() {
        let mut store = CountingStore::seeded();
        let mut cache = StoreCache::new();

        let values = cache.options(&mut store, FilterColumn::Sede).unwrap();
        assert_eq!(values, vec![ALL_SENTINEL, "Norte", "Sur"]);
    }

    #[test]
    fn invalidate_forces_a_store_reread() {
        let mut store = CountingStore::seeded();
        let mut cache = StoreCache::new();

        cache.options(&mut store, FilterColumn::Sede).unwrap();
        cache.usuarios(&mut store).unwrap();
        assert_eq!(store.reads, 2);

        cache.invalidate();
        cache.options(&mut store, FilterColumn::Sede).unwrap();
        cache.usuarios(&mut store).unwrap();
        assert_eq!(store.reads, 4);
    }

    #[test]
    fn expired_entries_are_reread() {
        let mut store = CountingStore::seeded();
        let mut cache = StoreCache::with_ttl(Duration::ZERO);

        cache.options(&mut store, FilterColumn::Sede).unwrap();
        cache.options(&mut store, FilterColumn::Sede).unwrap();
        assert_eq!(store.reads, 2);
    }

    #[test]
    fn query_results_are_cached_per_filter_set() {
        let mut store = CountingStore::seeded();
        let mut cache = StoreCache::new();

        let norte = FilterSet {
            sede: Some("Norte".to_string()),
            ..FilterSet::default()
        };
        let rows = cache.query(&mut store, &norte).unwrap();
        assert_eq!(rows.len(), 1);
        cache.query(&mut store, &norte).unwrap();
        assert_eq!(store.reads, 1);

        cache.query(&mut store, &FilterSet::default()).unwrap();
        assert_eq!(store.reads, 2);
    }

    #[test]
    fn failed_reads_cache_nothing() {
        struct FailingReads;
        impl Store for FailingReads {
            fn backend_name(&self) -> &'static str {
                "failing"
            }
            fn distinct_values(&mut self, _: FilterColumn) -> Result<Vec<String>, StoreError> {
                Err(StoreError::Query("boom".to_string()))
            }
            fn active_usuarios(&mut self) -> Result<Vec<Usuario>, StoreError> {
                Err(StoreError::Query("boom".to_string()))
            }
            fn query_responsables(
                &mut self,
                _: &FilterSet,
            ) -> Result<Vec<Responsable>, StoreError> {
                Err(StoreError::Query("boom".to_string()))
            }
            fn update_responsable(
                &mut self,
                _: i64,
                _: &str,
                _: &str,
                _: &str,
            ) -> Result<(), StoreError> {
                Ok(())
            }
        }

        let mut cache = StoreCache::new();
        assert!(cache.options(&mut FailingReads, FilterColumn::Sede).is_err());
        assert!(cache.usuarios(&mut FailingReads).is_err());
        assert!(cache.query(&mut FailingReads, &FilterSet::default()).is_err());
    }
}
