use serde::Serialize;

/// Record-level status that marks the whole paid amount as still owed when no
/// total fee is known.
pub const STATUS_PENDING: &str = "Pending";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub amount: f64,
    /// Display-only; stored exactly as submitted.
    pub date: String,
    pub status: String,
}

/// One student's fee state. Always held in the payments-list shape; legacy
/// flat records are converted by the store on load.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
    pub name: String,
    pub payments: Vec<Payment>,
    /// Sum of `payments[].amount`, kept for readers of the old flat shape.
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_fee: Option<f64>,
    /// Date of the last payment.
    pub date: String,
    /// Status of the last payment.
    pub status: String,
}

impl FeeRecord {
    /// Roll number usable as a merge key (present and non-empty).
    pub fn merge_key(&self) -> Option<&str> {
        self.roll_number.as_deref().filter(|r| !r.is_empty())
    }
}
