use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A leave request. Pending and Approved rows live in the same store and
/// differ only by `status`; rejected requests are deleted outright and
/// leave no history.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Leave {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "ENG_0004")]
    pub employee_id: String,

    /// Copy of the employee's name frozen at submission time. Not a join:
    /// a later rename of the employee does not change this field.
    #[schema(example = "Asha Rahman")]
    pub employee_name: String,

    #[schema(example = "2024-05-01", format = "date", value_type = String)]
    pub date: NaiveDate,

    #[schema(example = "Medical")]
    pub reason: String,

    #[schema(example = "Pending")]
    pub status: String,

    #[schema(example = "2024-04-20 09:15:00", value_type = String, nullable = true)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Strict parse of the wire status value; anything unrecognized is the
    /// caller's problem (InvalidArgument), never a silent default.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(LeaveStatus::Pending),
            "Approved" => Some(LeaveStatus::Approved),
            "Rejected" => Some(LeaveStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LeaveStatus::Pending => "Pending",
            LeaveStatus::Approved => "Approved",
            LeaveStatus::Rejected => "Rejected",
        }
    }
}
