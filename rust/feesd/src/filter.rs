use crate::model::FeeRecord;
use serde_json::Value;

/// Filter bar state. Passed explicitly into every listing and render call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Case-insensitive substring of the student name; empty matches all.
    pub name: String,
    /// Exact record status; empty matches all.
    pub status: String,
}

impl RecordFilter {
    pub fn matches(&self, record: &FeeRecord) -> bool {
        let name_ok = self.name.is_empty()
            || record
                .name
                .to_lowercase()
                .contains(&self.name.to_lowercase());
        let status_ok = self.status.is_empty() || record.status == self.status;
        name_ok && status_ok
    }
}

/// Stable filter: matching records in their stored order.
pub fn filter_records(records: &[FeeRecord], filter: &RecordFilter) -> Vec<FeeRecord> {
    records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect()
}

/// Reads the optional `filter` request object. Missing or null fields are
/// empty patterns.
pub fn parse_record_filter(raw: Option<&Value>) -> Result<RecordFilter, String> {
    let Some(raw) = raw else {
        return Ok(RecordFilter::default());
    };
    if raw.is_null() {
        return Ok(RecordFilter::default());
    }
    let Some(obj) = raw.as_object() else {
        return Err("filter must be an object".into());
    };

    let field = |key: &str| -> Result<String, String> {
        match obj.get(key) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(format!("filter.{} must be string", key)),
        }
    };
    Ok(RecordFilter {
        name: field("name")?,
        status: field("status")?,
    })
}
