use std::collections::HashSet;

use serde_json::json;

use crate::edit::{self, BatchError};
use crate::filter::FilterSet;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};

fn request_filters(req: &Request) -> FilterSet {
    FilterSet::from_params(req.params.get("filters").unwrap_or(&serde_json::Value::Null))
}

fn handle_query(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filter = request_filters(req);
    match state.cache.query(state.store.as_mut(), &filter) {
        Ok(rows) => ok(&req.id, json!({ "total": rows.len(), "rows": rows })),
        Err(e) => HandlerErr::from(e).response(&req.id),
    }
}

fn handle_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filter = request_filters(req);
    let rows = match state.cache.query(state.store.as_mut(), &filter) {
        Ok(rows) => rows,
        Err(e) => return HandlerErr::from(e).response(&req.id),
    };

    let total = rows.len();
    let unique = rows
        .iter()
        .filter(|r| !r.usuario.is_empty())
        .map(|r| r.usuario.as_str())
        .collect::<HashSet<_>>()
        .len();
    let avg = if total > 0 && unique > 0 {
        json!((total as f64 / unique as f64 * 10.0).round() / 10.0)
    } else {
        serde_json::Value::Null
    };

    ok(
        &req.id,
        json!({
            "total": total,
            "uniqueUsuarios": unique,
            "avgPerUsuario": avg,
        }),
    )
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(id) = req.params.get("id").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing/invalid id", None);
    };
    let usuario = match req.params.get("usuario").and_then(|v| v.as_str()) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => return err(&req.id, "bad_params", "missing usuario", None),
    };

    let provided = |key: &str| {
        req.params
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    };
    let (nombre, apellido) = match (provided("nombre"), provided("apellido")) {
        (Some(nombre), Some(apellido)) => (nombre, apellido),
        (nombre, apellido) => {
            // Omitted name parts default to the roster entry's display name.
            let roster = match state.cache.usuarios(state.store.as_mut()) {
                Ok(roster) => roster,
                Err(e) => return HandlerErr::from(e).response(&req.id),
            };
            let (default_nombre, default_apellido) = edit::resolve_default_names(&roster, &usuario);
            (
                nombre.unwrap_or(default_nombre),
                apellido.unwrap_or(default_apellido),
            )
        }
    };

    match edit::update_record(
        state.store.as_mut(),
        &mut state.cache,
        id,
        &usuario,
        &nombre,
        &apellido,
    ) {
        Ok(()) => ok(
            &req.id,
            json!({
                "id": id,
                "usuario": usuario,
                "nombre": nombre,
                "apellido": apellido,
            }),
        ),
        Err(e) => HandlerErr::from(e).response(&req.id),
    }
}

fn handle_bulk_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filter = request_filters(req);
    let param = |key: &str| {
        req.params
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };
    let usuario = param("usuario");
    let nombre = param("nombre");
    let apellido = param("apellido");

    match edit::update_batch(
        state.store.as_mut(),
        &mut state.cache,
        &filter,
        &usuario,
        &nombre,
        &apellido,
    ) {
        Ok(updated) => ok(&req.id, json!({ "updated": updated })),
        Err(BatchError::Validation { field }) => err(
            &req.id,
            "validation_failed",
            format!("{field} must not be empty"),
            Some(json!({ "field": field })),
        ),
        Err(BatchError::Read(e)) => HandlerErr::from(e).response(&req.id),
        Err(BatchError::Aborted {
            updated,
            total,
            source,
        }) => err(
            &req.id,
            "db_update_failed",
            source.to_string(),
            Some(json!({ "updatedBeforeFailure": updated, "total": total })),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "responsables.query" => Some(handle_query(state, req)),
        "responsables.summary" => Some(handle_summary(state, req)),
        "responsables.update" => Some(handle_update(state, req)),
        "responsables.bulkUpdate" => Some(handle_bulk_update(state, req)),
        _ => None,
    }
}
