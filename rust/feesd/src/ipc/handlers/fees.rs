use crate::filter::{self, RecordFilter};
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::setup::load_display_settings;
use crate::ipc::helpers::{db_conn, required_str};
use crate::ipc::types::{AppState, Request};
use crate::render;
use crate::store;
use crate::submit;
use anyhow::Context;
use serde_json::json;
use std::path::PathBuf;

fn parse_filter(req: &Request) -> Result<RecordFilter, serde_json::Value> {
    filter::parse_record_filter(req.params.get("filter"))
        .map_err(|msg| err(&req.id, "bad_params", msg, None))
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let filter = match parse_filter(req) {
        Ok(f) => f,
        Err(e) => return e,
    };
    let records = match store::load(conn, &mut *state.ids) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };
    let matching = filter::filter_records(&records, &filter);
    ok(&req.id, json!({ "records": matching }))
}

fn handle_table(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let filter = match parse_filter(req) {
        Ok(f) => f,
        Err(e) => return e,
    };
    let loaded = store::load(conn, &mut *state.ids)
        .and_then(|records| Ok((records, load_display_settings(conn)?)));
    let (records, display) = match loaded {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };
    let view = render::render_table(&filter::filter_records(&records, &filter), &display);
    ok(&req.id, json!(view))
}

fn handle_history(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let key = match required_str(req, "key") {
        Ok(k) => k,
        Err(e) => return e,
    };
    let loaded = store::load(conn, &mut *state.ids)
        .and_then(|records| Ok((records, load_display_settings(conn)?)));
    let (records, display) = match loaded {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };

    match render::find_for_history(&records, &key) {
        Some(record) => ok(
            &req.id,
            json!({
                "found": true,
                "history": render::render_history(record, &display)
            }),
        ),
        None => {
            log::debug!("history requested for unknown key {}", key);
            ok(&req.id, json!({ "found": false }))
        }
    }
}

fn handle_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let form = match submit::parse_fee_form(req.params.get("form")) {
        Ok(f) => f,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let filter = match parse_filter(req) {
        Ok(f) => f,
        Err(e) => return e,
    };

    // Single writer assumed: load, mutate, write the whole collection back.
    let mut records = match store::load(conn, &mut *state.ids) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };
    let result = submit::apply_submission(&mut records, &form, &mut *state.ids);
    if let Err(e) = store::save(conn, &records) {
        log::error!("saving fee records failed: {:#}", e);
        return err(&req.id, "db_update_failed", format!("{e:#}"), None);
    }
    log::info!(
        "fee payment {} recorded on {} ({:?})",
        result.payment_id,
        result.record_id,
        result.outcome
    );

    let display = match load_display_settings(conn) {
        Ok(d) => d,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };
    let table = render::render_table(&filter::filter_records(&records, &filter), &display);
    ok(
        &req.id,
        json!({
            "outcome": result.outcome,
            "recordId": result.record_id,
            "paymentId": result.payment_id,
            "paymentCount": result.payment_count,
            "table": table
        }),
    )
}

/// Appends records exported from the browser widget's storage slot.
fn handle_import_legacy(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let path = match required_str(req, "path") {
        Ok(p) => PathBuf::from(p),
        Err(e) => return e,
    };

    let parsed = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))
        .and_then(|text| {
            serde_json::from_str::<serde_json::Value>(&text)
                .with_context(|| format!("{} is not valid JSON", path.to_string_lossy()))
        });
    let value = match parsed {
        Ok(v) if v.is_array() => v,
        Ok(_) => {
            return err(
                &req.id,
                "bad_import",
                "import file must hold a JSON array of records",
                None,
            )
        }
        Err(e) => return err(&req.id, "bad_import", format!("{e:#}"), None),
    };
    let offered = value.as_array().map(|a| a.len()).unwrap_or(0);

    let mut records = match store::load(conn, &mut *state.ids) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };
    let imported = store::records_from_json(value, &mut *state.ids);
    let imported_count = imported.len();
    records.extend(imported);
    if let Err(e) = store::save(conn, &records) {
        return err(&req.id, "db_update_failed", format!("{e:#}"), None);
    }
    log::info!(
        "imported {} of {} legacy fee records from {}",
        imported_count,
        offered,
        path.to_string_lossy()
    );

    ok(
        &req.id,
        json!({
            "imported": imported_count,
            "skipped": offered - imported_count,
            "total": records.len()
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "fees.list" => Some(handle_list(state, req)),
        "fees.table" => Some(handle_table(state, req)),
        "fees.history" => Some(handle_history(state, req)),
        "fees.submit" => Some(handle_submit(state, req)),
        "fees.importLegacy" => Some(handle_import_legacy(state, req)),
        _ => None,
    }
}
