use serde::Deserialize;

use crate::cache::StoreCache;
use crate::store::Store;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub store: Box<dyn Store>,
    pub cache: StoreCache,
}
