use postgres::types::ToSql;
use postgres::{Client, NoTls};

use super::{Responsable, Store, StoreError, Usuario};
use crate::filter::{compose_select, FilterColumn, FilterSet};

/// Remote backend over a PostgreSQL server, driven synchronously. One client,
/// no pooling, no retry: a transient failure surfaces immediately.
pub struct PgStore {
    client: Client,
}

impl PgStore {
    pub fn connect(url: &str) -> Result<PgStore, StoreError> {
        let mut client =
            Client::connect(url, NoTls).map_err(|e| StoreError::Connection(e.to_string()))?;
        client
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS responsables(
                    id BIGINT PRIMARY KEY,
                    sede TEXT NOT NULL,
                    escuela TEXT NOT NULL,
                    carrera TEXT NOT NULL,
                    nivel TEXT NOT NULL,
                    jornada TEXT NOT NULL,
                    usuario TEXT,
                    nombre TEXT,
                    apellido TEXT
                );
                CREATE TABLE IF NOT EXISTS usuarios(
                    username TEXT PRIMARY KEY,
                    first_name TEXT NOT NULL,
                    last_name TEXT NOT NULL,
                    is_active INTEGER NOT NULL
                );",
            )
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(PgStore { client })
    }
}

fn query_err(e: postgres::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

impl Store for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    fn distinct_values(&mut self, column: FilterColumn) -> Result<Vec<String>, StoreError> {
        let sql = format!(
            "SELECT DISTINCT {0} FROM responsables WHERE {0} IS NOT NULL ORDER BY {0}",
            column.as_sql()
        );
        let rows = self.client.query(sql.as_str(), &[]).map_err(query_err)?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    fn active_usuarios(&mut self) -> Result<Vec<Usuario>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT username, first_name, last_name FROM usuarios
                 WHERE is_active = 1 ORDER BY username",
                &[],
            )
            .map_err(query_err)?;
        Ok(rows
            .iter()
            .map(|r| Usuario {
                username: r.get(0),
                first_name: r.get(1),
                last_name: r.get(2),
            })
            .collect())
    }

    fn query_responsables(&mut self, filter: &FilterSet) -> Result<Vec<Responsable>, StoreError> {
        let (sql, params) = compose_select(filter, '$');
        let param_refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        let rows = self
            .client
            .query(sql.as_str(), &param_refs)
            .map_err(query_err)?;
        Ok(rows
            .iter()
            .map(|r| Responsable {
                id: r.get(0),
                sede: r.get(1),
                escuela: r.get(2),
                carrera: r.get(3),
                nivel: r.get(4),
                jornada: r.get(5),
                usuario: r.get::<_, Option<String>>(6).unwrap_or_default(),
                nombre: r.get::<_, Option<String>>(7).unwrap_or_default(),
                apellido: r.get::<_, Option<String>>(8).unwrap_or_default(),
            })
            .collect())
    }

    fn update_responsable(
        &mut self,
        id: i64,
        usuario: &str,
        nombre: &str,
        apellido: &str,
    ) -> Result<(), StoreError> {
        self.client
            .execute(
                "UPDATE responsables SET usuario = $1, nombre = $2, apellido = $3 WHERE id = $4",
                &[&usuario, &nombre, &apellido, &id],
            )
            .map_err(|e| StoreError::Update(e.to_string()))?;
        Ok(())
    }
}
