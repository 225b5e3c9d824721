//! Whole-collection persistence of fee records in the `fees.records` slot.
//!
//! Reads are fail-soft: a slot that is missing, not JSON, or not an array
//! loads as an empty collection. Elements are classified into the flat
//! single-payment shape written before payment lists existed, or the ledger
//! shape, and both are normalized to [`FeeRecord`] before anything else
//! sees them. Records or payments stored without an id get one on the
//! first load, and the collection is written back so the id sticks.

use crate::calc;
use crate::db;
use crate::ids::IdGenerator;
use crate::model::{FeeRecord, Payment};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;

pub const RECORDS_KEY: &str = "fees.records";

/// Record element exactly as found in storage. Every field is optional and
/// loosely typed; old writers stored timestamp ids as numbers and amounts as
/// strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRecord {
    id: Value,
    roll_number: Value,
    name: Value,
    payments: Value,
    amount: Value,
    total_fee: Value,
    date: Value,
    status: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPayment {
    id: Value,
    amount: Value,
    date: Value,
    status: Value,
}

/// Fields shared by both stored shapes.
#[derive(Debug)]
struct RecordHead {
    id: String,
    roll_number: Option<String>,
    name: String,
    total_fee: Option<f64>,
    date: String,
    status: String,
}

#[derive(Debug)]
enum StoredRecord {
    /// Has a non-empty payments list.
    Ledger {
        head: RecordHead,
        payments: Vec<Payment>,
    },
    /// Single flat amount, no (or an empty) payments list.
    Legacy { head: RecordHead, amount: f64 },
}

/// Ids and roll numbers are opaque strings; numbers are accepted as written
/// by older versions.
fn opaque_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(value: &Value) -> String {
    value.as_str().map(str::to_string).unwrap_or_default()
}

impl StoredRecord {
    fn classify(raw: RawRecord, ids: &mut dyn IdGenerator) -> Self {
        let head = RecordHead {
            id: opaque_string(&raw.id).unwrap_or_else(|| ids.next_id()),
            roll_number: opaque_string(&raw.roll_number).filter(|r| !r.is_empty()),
            name: text(&raw.name),
            total_fee: calc::coerce_amount(&raw.total_fee),
            date: text(&raw.date),
            status: text(&raw.status),
        };

        let payments: Vec<Payment> = match raw.payments {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match serde_json::from_value::<RawPayment>(item) {
                    Ok(p) => Some(Payment {
                        id: opaque_string(&p.id).unwrap_or_else(|| ids.next_id()),
                        amount: calc::coerce_amount(&p.amount).unwrap_or(0.0),
                        date: text(&p.date),
                        status: text(&p.status),
                    }),
                    Err(e) => {
                        log::warn!("skipping malformed payment in record {}: {}", head.id, e);
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        if payments.is_empty() {
            StoredRecord::Legacy {
                head,
                amount: calc::coerce_amount(&raw.amount).unwrap_or(0.0),
            }
        } else {
            StoredRecord::Ledger { head, payments }
        }
    }

    fn normalize(self) -> FeeRecord {
        let (head, payments) = match self {
            StoredRecord::Ledger { head, payments } => (head, payments),
            StoredRecord::Legacy { head, amount } => {
                let synthesized = Payment {
                    id: head.id.clone(),
                    amount,
                    date: head.date.clone(),
                    status: head.status.clone(),
                };
                (head, vec![synthesized])
            }
        };
        FeeRecord {
            amount: calc::sum_amounts(&payments),
            id: head.id,
            roll_number: head.roll_number,
            name: head.name,
            payments,
            total_fee: head.total_fee,
            date: head.date,
            status: head.status,
        }
    }
}

/// Counts ids handed out while normalizing.
struct MintingIds<'a> {
    inner: &'a mut dyn IdGenerator,
    minted: usize,
}

impl IdGenerator for MintingIds<'_> {
    fn next_id(&mut self) -> String {
        self.minted += 1;
        self.inner.next_id()
    }
}

/// Normalizes a decoded collection. Anything other than an array is treated
/// as no records; non-object elements are skipped.
pub fn records_from_json(value: Value, ids: &mut dyn IdGenerator) -> Vec<FeeRecord> {
    let Value::Array(items) = value else {
        log::warn!("stored fee records are not an array; treating as empty");
        return Vec::new();
    };

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            log::warn!("skipping stored fee record #{}: not an object", idx);
            continue;
        }
        match serde_json::from_value::<RawRecord>(item) {
            Ok(raw) => out.push(StoredRecord::classify(raw, ids).normalize()),
            Err(e) => log::warn!("skipping stored fee record #{}: {}", idx, e),
        }
    }
    out
}

pub fn load(conn: &Connection, ids: &mut dyn IdGenerator) -> anyhow::Result<Vec<FeeRecord>> {
    let Some(raw) = db::settings_get_raw(conn, RECORDS_KEY)? else {
        return Ok(Vec::new());
    };
    let value = match serde_json::from_str::<Value>(&raw) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("stored fee records are not valid JSON ({}); treating as empty", e);
            return Ok(Vec::new());
        }
    };

    let mut minting = MintingIds { inner: ids, minted: 0 };
    let records = records_from_json(value, &mut minting);
    if minting.minted > 0 {
        log::info!("assigned {} missing fee record ids; saving", minting.minted);
        save(conn, &records)?;
    }
    Ok(records)
}

/// Replaces the whole stored collection.
pub fn save(conn: &Connection, records: &[FeeRecord]) -> anyhow::Result<()> {
    let value = serde_json::to_value(records)?;
    db::settings_set_json(conn, RECORDS_KEY, &value)
}
