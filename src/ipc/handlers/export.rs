use std::path::Path;

use serde_json::json;

use crate::export;
use crate::filter::FilterSet;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};

fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filter =
        FilterSet::from_params(req.params.get("filters").unwrap_or(&serde_json::Value::Null));
    let rows = match state.cache.query(state.store.as_mut(), &filter) {
        Ok(rows) => rows,
        Err(e) => return HandlerErr::from(e).response(&req.id),
    };

    match export::write_xlsx(&rows, Path::new(export::EXPORT_PATH)) {
        Ok(written) => ok(
            &req.id,
            json!({ "path": export::EXPORT_PATH, "rows": written }),
        ),
        Err(e) => err(&req.id, "export_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "responsables.export" => Some(handle_export(state, req)),
        _ => None,
    }
}
