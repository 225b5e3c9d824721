use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::ids::{IdGenerator, UuidIds};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub ids: Box<dyn IdGenerator>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            workspace: None,
            db: None,
            ids: Box::new(UuidIds),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
