use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::db_conn;
use crate::ipc::types::{AppState, Request};
use crate::render::DisplaySettings;
use rusqlite::Connection;
use serde_json::{json, Map, Value};

#[derive(Clone, Copy)]
enum SetupSection {
    Display,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "display" => Some(Self::Display),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Display => "setup.display",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Display => {
            serde_json::to_value(DisplaySettings::default()).unwrap_or_else(|_| json!({}))
        }
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())
}

fn parse_string_len(
    v: &Value,
    key: &str,
    min_len: usize,
    max_len: usize,
) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    let len = s.chars().count();
    if len < min_len || len > max_len {
        return Err(format!("{} length must be in {}..={}", key, min_len, max_len));
    }
    Ok(s.to_string())
}

fn parse_status_options(v: &Value, key: &str) -> Result<Vec<String>, String> {
    let items = v
        .as_array()
        .ok_or_else(|| format!("{} must be an array", key))?;
    if items.is_empty() || items.len() > 16 {
        return Err(format!("{} must hold 1..=16 entries", key));
    }
    items
        .iter()
        .map(|item| parse_string_len(item, key, 1, 40))
        .collect()
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match section {
            SetupSection::Display => match k.as_str() {
                "currencySymbol" | "placeholder" => {
                    obj.insert(k.clone(), Value::String(parse_string_len(v, k, 1, 8)?));
                }
                "emptyMessage" => {
                    obj.insert(k.clone(), Value::String(parse_string_len(v, k, 1, 120)?));
                }
                "statusOptions" => {
                    let opts = parse_status_options(v, k)?;
                    obj.insert(k.clone(), json!(opts));
                }
                _ => return Err(format!("unknown display field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(conn: &Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    let Some(raw) = db::settings_get_raw(conn, section.key())? else {
        return Ok(current);
    };
    // Malformed saved values fall back to defaults instead of blocking reads.
    match serde_json::from_str::<Value>(&raw) {
        Ok(saved) => {
            if let Some(saved_obj) = saved.as_object() {
                let mut merged = current.clone();
                match merge_section_patch(section, &mut merged, saved_obj) {
                    Ok(()) => current = merged,
                    Err(e) => log::warn!("ignoring saved {}: {}", section.key(), e),
                }
            }
        }
        Err(e) => log::warn!("ignoring saved {}: {}", section.key(), e),
    }
    Ok(current)
}

/// Display options for rendering; defaults when nothing usable is saved.
pub fn load_display_settings(conn: &Connection) -> anyhow::Result<DisplaySettings> {
    let section = load_section(conn, SetupSection::Display)?;
    Ok(serde_json::from_value(section).unwrap_or_default())
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let display = match load_section(conn, SetupSection::Display) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };
    ok(&req.id, json!({ "display": display }))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(conn, section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", format!("{e:#}"), None);
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
