use serde::Serialize;
use thiserror::Error;

use crate::config::Config;
use crate::filter::{FilterColumn, FilterSet};

pub mod pg;
pub mod sqlite;

pub use pg::PgStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),
    #[error("read query failed: {0}")]
    Query(String),
    #[error("update failed: {0}")]
    Update(String),
}

/// One row of the responsables table. Rows pre-exist in the store; only
/// usuario/nombre/apellido are ever written back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Responsable {
    pub id: i64,
    pub sede: String,
    pub escuela: String,
    pub carrera: String,
    pub nivel: String,
    pub jornada: String,
    pub usuario: String,
    pub nombre: String,
    pub apellido: String,
}

/// An active directory entry eligible as an assignment target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Data access seam. Constructed once at startup and handed to whoever needs
/// it; dropped at shutdown.
pub trait Store {
    fn backend_name(&self) -> &'static str;

    /// Distinct non-null values of one categorical column, sorted ascending.
    fn distinct_values(&mut self, column: FilterColumn) -> Result<Vec<String>, StoreError>;

    /// Username and display name of every active directory entry.
    fn active_usuarios(&mut self) -> Result<Vec<Usuario>, StoreError>;

    /// Rows matching the filter set, ordered by id.
    fn query_responsables(&mut self, filter: &FilterSet) -> Result<Vec<Responsable>, StoreError>;

    /// Sets the three mutable fields of one row, keyed by id. An id matching
    /// no row is a successful no-op.
    fn update_responsable(
        &mut self,
        id: i64,
        usuario: &str,
        nombre: &str,
        apellido: &str,
    ) -> Result<(), StoreError>;
}

/// Opens the backend selected by the configured URL scheme.
pub fn open(config: &Config) -> Result<Box<dyn Store>, StoreError> {
    let url = config.connection_url();
    if let Some(path) = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("file://"))
    {
        Ok(Box::new(SqliteStore::open(std::path::Path::new(path))?))
    } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Ok(Box::new(PgStore::connect(&url)?))
    } else {
        let scheme = url.split("://").next().unwrap_or("");
        Err(StoreError::Connection(format!(
            "unsupported store url scheme: {scheme}"
        )))
    }
}
