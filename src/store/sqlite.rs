use std::path::Path;

use rusqlite::Connection;

use super::{Responsable, Store, StoreError, Usuario};
use crate::filter::{compose_select, FilterColumn, FilterSet};

/// Embedded backend over a local SQLite file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<SqliteStore, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Connection(e.to_string()))?;
            }
        }
        let conn = Connection::open(path).map_err(connect_err)?;
        ensure_schema(&conn).map_err(connect_err)?;
        Ok(SqliteStore { conn })
    }
}

fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS responsables(
            id INTEGER PRIMARY KEY,
            sede TEXT NOT NULL,
            escuela TEXT NOT NULL,
            carrera TEXT NOT NULL,
            nivel TEXT NOT NULL,
            jornada TEXT NOT NULL,
            usuario TEXT,
            nombre TEXT,
            apellido TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS usuarios(
            username TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            is_active INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn connect_err(e: rusqlite::Error) -> StoreError {
    StoreError::Connection(e.to_string())
}

fn query_err(e: rusqlite::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

impl Store for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn distinct_values(&mut self, column: FilterColumn) -> Result<Vec<String>, StoreError> {
        let sql = format!(
            "SELECT DISTINCT {0} FROM responsables WHERE {0} IS NOT NULL ORDER BY {0}",
            column.as_sql()
        );
        let mut stmt = self.conn.prepare(&sql).map_err(query_err)?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;
        Ok(values)
    }

    fn active_usuarios(&mut self) -> Result<Vec<Usuario>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT username, first_name, last_name FROM usuarios
                 WHERE is_active = 1 ORDER BY username",
            )
            .map_err(query_err)?;
        let usuarios = stmt
            .query_map([], |row| {
                Ok(Usuario {
                    username: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                })
            })
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;
        Ok(usuarios)
    }

    fn query_responsables(&mut self, filter: &FilterSet) -> Result<Vec<Responsable>, StoreError> {
        let (sql, params) = compose_select(filter, '?');
        let mut stmt = self.conn.prepare(&sql).map_err(query_err)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                Ok(Responsable {
                    id: row.get(0)?,
                    sede: row.get(1)?,
                    escuela: row.get(2)?,
                    carrera: row.get(3)?,
                    nivel: row.get(4)?,
                    jornada: row.get(5)?,
                    usuario: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                    nombre: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                    apellido: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
                })
            })
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;
        Ok(rows)
    }

    fn update_responsable(
        &mut self,
        id: i64,
        usuario: &str,
        nombre: &str,
        apellido: &str,
    ) -> Result<(), StoreError> {
        self.conn
            .execute(
                "UPDATE responsables SET usuario = ?1, nombre = ?2, apellido = ?3 WHERE id = ?4",
                rusqlite::params![usuario, nombre, apellido, id],
            )
            .map_err(|e| StoreError::Update(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
impl SqliteStore {
    pub fn open_in_memory() -> SqliteStore {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        ensure_schema(&conn).expect("ensure schema");
        SqliteStore { conn }
    }

    pub fn seed_responsable(&self, row: &Responsable) {
        self.conn
            .execute(
                "INSERT INTO responsables(id, sede, escuela, carrera, nivel, jornada, usuario, nombre, apellido)
                 VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    row.id,
                    row.sede,
                    row.escuela,
                    row.carrera,
                    row.nivel,
                    row.jornada,
                    row.usuario,
                    row.nombre,
                    row.apellido
                ],
            )
            .expect("seed responsable");
    }

    pub fn seed_usuario(&self, username: &str, first_name: &str, last_name: &str, active: bool) {
        self.conn
            .execute(
                "INSERT INTO usuarios(username, first_name, last_name, is_active) VALUES(?1, ?2, ?3, ?4)",
                rusqlite::params![username, first_name, last_name, active as i64],
            )
            .expect("seed usuario");
    }
}
