use crate::calc;
use crate::ids::IdGenerator;
use crate::model::{FeeRecord, Payment};
use serde::Serialize;
use serde_json::Value;

/// Raw form fields as typed by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeeForm {
    pub roll_number: String,
    pub name: String,
    pub amount: String,
    pub total_fee: String,
    pub date: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
struct Submission {
    roll_number: Option<String>,
    name: String,
    amount: f64,
    total_fee: Option<f64>,
    date: String,
    status: String,
}

impl FeeForm {
    fn normalize(&self) -> Submission {
        let roll = self.roll_number.trim();
        let amount = match calc::parse_leading_number(&self.amount) {
            Some(v) if v >= 0.0 => v,
            Some(v) => {
                log::warn!("negative fee amount {} recorded as 0", v);
                0.0
            }
            None => 0.0,
        };
        Submission {
            roll_number: (!roll.is_empty()).then(|| roll.to_string()),
            name: self.name.trim().to_string(),
            amount,
            total_fee: calc::parse_leading_number(&self.total_fee),
            date: self.date.clone(),
            status: self.status.clone(),
        }
    }
}

/// Reads the `form` request object. Fields may be strings, numbers or null.
pub fn parse_fee_form(raw: Option<&Value>) -> Result<FeeForm, String> {
    let Some(obj) = raw.and_then(|v| v.as_object()) else {
        return Err("form must be an object".into());
    };
    let field = |key: &str| -> Result<String, String> {
        match obj.get(key) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(format!("form.{} must be string or number", key)),
        }
    };
    Ok(FeeForm {
        roll_number: field("rollNumber")?,
        name: field("name")?,
        amount: field("amount")?,
        total_fee: field("totalFee")?,
        date: field("date")?,
        status: field("status")?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitOutcome {
    Created,
    Appended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    pub outcome: SubmitOutcome,
    pub record_id: String,
    pub payment_id: String,
    pub payment_count: usize,
}

/// Applies one form submission to the in-memory collection.
///
/// A non-empty roll number selects the first record with exactly that roll
/// number; the payment is appended there. Otherwise a new record is pushed.
/// The caller persists the collection afterwards.
pub fn apply_submission(
    records: &mut Vec<FeeRecord>,
    form: &FeeForm,
    ids: &mut dyn IdGenerator,
) -> SubmitResult {
    let sub = form.normalize();
    if sub.name.is_empty() {
        log::warn!("fee submission accepted with an empty student name");
    }

    let payment = Payment {
        id: ids.next_id(),
        amount: sub.amount,
        date: sub.date.clone(),
        status: sub.status.clone(),
    };
    let payment_id = payment.id.clone();

    let existing = match sub.roll_number.as_deref() {
        Some(roll) => records.iter_mut().find(|r| r.merge_key() == Some(roll)),
        None => None,
    };

    if let Some(record) = existing {
        record.payments.push(payment);
        record.amount = calc::sum_amounts(&record.payments);
        if sub.total_fee.is_some() {
            record.total_fee = sub.total_fee;
        }
        record.date = sub.date;
        record.status = sub.status;
        log::debug!(
            "appended payment {} to record {} ({} payments)",
            payment_id,
            record.id,
            record.payments.len()
        );
        return SubmitResult {
            outcome: SubmitOutcome::Appended,
            record_id: record.id.clone(),
            payment_id,
            payment_count: record.payments.len(),
        };
    }

    let record = FeeRecord {
        id: ids.next_id(),
        roll_number: sub.roll_number,
        name: sub.name,
        amount: payment.amount,
        payments: vec![payment],
        total_fee: sub.total_fee,
        date: sub.date,
        status: sub.status,
    };
    let record_id = record.id.clone();
    records.push(record);
    log::debug!("created record {} with payment {}", record_id, payment_id);

    SubmitResult {
        outcome: SubmitOutcome::Created,
        record_id,
        payment_id,
        payment_count: 1,
    }
}
