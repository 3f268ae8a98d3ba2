use serde_json::json;

use crate::filter::FilterColumn;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};

fn handle_filter_options(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(name) = req.params.get("column").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing column", None);
    };
    let Some(column) = FilterColumn::parse(name) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown filter column: {name}"),
            None,
        );
    };

    match state.cache.options(state.store.as_mut(), column) {
        Ok(values) => ok(&req.id, json!({ "column": name, "values": values })),
        Err(e) => HandlerErr::from(e).response(&req.id),
    }
}

fn handle_usuarios_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.cache.usuarios(state.store.as_mut()) {
        Ok(usuarios) => ok(&req.id, json!({ "usuarios": usuarios })),
        Err(e) => HandlerErr::from(e).response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "filters.options" => Some(handle_filter_options(state, req)),
        "usuarios.list" => Some(handle_usuarios_list(state, req)),
        _ => None,
    }
}
