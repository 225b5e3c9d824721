use crate::calc;
use crate::model::FeeRecord;
use serde::{Deserialize, Serialize};

/// Display options persisted in the `setup.display` slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplaySettings {
    pub currency_symbol: String,
    pub placeholder: String,
    pub empty_message: String,
    pub status_options: Vec<String>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            placeholder: "-".to_string(),
            empty_message: "No records found.".to_string(),
            status_options: vec!["Paid".to_string(), "Pending".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceTone {
    /// Money still owed.
    Warning,
    /// Settled exactly.
    Success,
    /// Overpaid.
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub seq: usize,
    pub roll_number: String,
    pub name: String,
    pub paid: String,
    pub total_fee: String,
    pub date: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_class: Option<String>,
    pub balance: String,
    pub balance_tone: BalanceTone,
    /// Key for `fees.history`.
    pub history_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub rows: Vec<TableRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
    /// Choices for the status filter and form select.
    pub status_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub seq: usize,
    pub amount: String,
    pub date: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    pub record_id: String,
    pub title: String,
    pub rows: Vec<HistoryRow>,
}

/// Rounds to cents and folds `-0.00` into `0.00`.
fn round_cents(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn format_currency(value: Option<f64>, display: &DisplaySettings) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{} {:.2}", display.currency_symbol, round_cents(v)),
        None => display.placeholder.clone(),
    }
}

fn text_or_placeholder(value: &str, display: &DisplaySettings) -> String {
    if value.is_empty() {
        display.placeholder.clone()
    } else {
        value.to_string()
    }
}

fn balance_tone(balance: f64) -> BalanceTone {
    let cents = round_cents(balance);
    if cents > 0.0 {
        BalanceTone::Warning
    } else if cents == 0.0 {
        BalanceTone::Success
    } else {
        BalanceTone::None
    }
}

/// Identifier shown next to the student name and used to reopen the history.
fn history_key(record: &FeeRecord) -> String {
    record
        .merge_key()
        .map(str::to_string)
        .unwrap_or_else(|| record.id.clone())
}

pub fn render_table(records: &[FeeRecord], display: &DisplaySettings) -> TableView {
    if records.is_empty() {
        return TableView {
            rows: Vec::new(),
            empty_message: Some(display.empty_message.clone()),
            status_options: display.status_options.clone(),
        };
    }

    let rows = records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let paid = calc::paid_amount(record);
            let balance = calc::balance(record, paid);
            TableRow {
                seq: idx + 1,
                roll_number: text_or_placeholder(record.merge_key().unwrap_or(""), display),
                name: record.name.clone(),
                paid: format_currency(Some(paid), display),
                total_fee: format_currency(record.total_fee, display),
                date: text_or_placeholder(&record.date, display),
                status: text_or_placeholder(&record.status, display),
                status_class: (!record.status.is_empty())
                    .then(|| format!("status-{}", record.status)),
                balance: format_currency(Some(balance), display),
                balance_tone: balance_tone(balance),
                history_key: history_key(record),
            }
        })
        .collect();

    TableView {
        rows,
        empty_message: None,
        status_options: display.status_options.clone(),
    }
}

pub fn render_history(record: &FeeRecord, display: &DisplaySettings) -> HistoryView {
    let rows = calc::payment_history(record)
        .into_iter()
        .enumerate()
        .map(|(idx, p)| HistoryRow {
            seq: idx + 1,
            amount: format_currency(Some(p.amount), display),
            date: text_or_placeholder(&p.date, display),
            status: text_or_placeholder(&p.status, display),
        })
        .collect();

    HistoryView {
        record_id: record.id.clone(),
        title: format!("{} ({})", record.name, history_key(record)),
        rows,
    }
}

/// First record whose roll number or id equals `key`.
pub fn find_for_history<'a>(records: &'a [FeeRecord], key: &str) -> Option<&'a FeeRecord> {
    records
        .iter()
        .find(|r| r.merge_key() == Some(key) || r.id == key)
}
