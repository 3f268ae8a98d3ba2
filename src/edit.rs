use thiserror::Error;

use crate::cache::StoreCache;
use crate::filter::FilterSet;
use crate::store::{Store, StoreError, Usuario};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{field} must not be empty")]
    Validation { field: &'static str },
    #[error(transparent)]
    Read(#[from] StoreError),
    #[error("batch aborted after {updated} of {total} rows: {source}")]
    Aborted {
        updated: usize,
        total: usize,
        source: StoreError,
    },
}

/// First/last name of the given roster entry, or empty strings when the
/// username is not in the roster.
pub fn resolve_default_names(roster: &[Usuario], username: &str) -> (String, String) {
    roster
        .iter()
        .find(|u| u.username == username)
        .map(|u| (u.first_name.clone(), u.last_name.clone()))
        .unwrap_or_default()
}

/// Applies one single-row update, then invalidates the cache. The caller is
/// trusted to have picked `usuario` from the active roster.
pub fn update_record(
    store: &mut dyn Store,
    cache: &mut StoreCache,
    id: i64,
    usuario: &str,
    nombre: &str,
    apellido: &str,
) -> Result<(), StoreError> {
    store.update_responsable(id, usuario, nombre, apellido)?;
    cache.invalidate();
    Ok(())
}

/// Applies the same triple to every row matching the filter, sequentially and
/// in result order. Rejects empty values before touching any row. A failure
/// at row k leaves rows 1..k-1 committed and the rest untouched; the cache is
/// invalidated once per batch, on success and after a committed prefix alike.
pub fn update_batch(
    store: &mut dyn Store,
    cache: &mut StoreCache,
    filter: &FilterSet,
    usuario: &str,
    nombre: &str,
    apellido: &str,
) -> Result<usize, BatchError> {
    for (field, value) in [
        ("usuario", usuario),
        ("nombre", nombre),
        ("apellido", apellido),
    ] {
        if value.is_empty() {
            return Err(BatchError::Validation { field });
        }
    }

    let rows = cache.query(store, filter)?;
    let total = rows.len();
    for (done, row) in rows.iter().enumerate() {
        if let Err(source) = store.update_responsable(row.id, usuario, nombre, apellido) {
            cache.invalidate();
            return Err(BatchError::Aborted {
                updated: done,
                total,
                source,
            });
        }
    }
    cache.invalidate();
    Ok(total)
}
