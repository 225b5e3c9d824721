use crate::ipc::error::err;
use crate::ipc::types::Request;
use rusqlite::Connection;

/// Takes the connection slot rather than the whole state so callers can
/// borrow the id generator alongside it.
pub fn db_conn<'a>(
    db: &'a Option<Connection>,
    req: &Request,
) -> Result<&'a Connection, serde_json::Value> {
    db.as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}
