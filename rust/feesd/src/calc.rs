use crate::model::{FeeRecord, Payment, STATUS_PENDING};
use serde_json::Value;

/// Lenient float parse of the longest numeric prefix: `"12.5kg"` is 12.5,
/// `"  7"` is 7, `"abc"` is `None`. Non-finite results are rejected.
pub fn parse_leading_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric view of a stored or submitted JSON value. Numbers pass through,
/// strings go through [`parse_leading_number`], anything else is `None`.
pub fn coerce_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_leading_number(s),
        _ => None,
    }
}

pub fn sum_amounts(payments: &[Payment]) -> f64 {
    payments.iter().map(|p| p.amount).sum()
}

pub fn paid_amount(record: &FeeRecord) -> f64 {
    if record.payments.is_empty() {
        record.amount
    } else {
        sum_amounts(&record.payments)
    }
}

/// Outstanding amount. Overpayment comes out negative.
pub fn balance(record: &FeeRecord, paid: f64) -> f64 {
    match record.total_fee {
        Some(total) => total - paid,
        // Unknown total: a pending record still owes everything recorded.
        None if record.status == STATUS_PENDING => paid,
        None => 0.0,
    }
}

/// Payments in insertion order; never empty.
pub fn payment_history(record: &FeeRecord) -> Vec<Payment> {
    if !record.payments.is_empty() {
        return record.payments.clone();
    }
    vec![Payment {
        id: record.id.clone(),
        amount: record.amount,
        date: record.date.clone(),
        status: record.status.clone(),
    }]
}
