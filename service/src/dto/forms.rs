use chrono::NaiveDate;
use rocket::serde::{Deserialize, Serialize};

use super::{schemars, JsonSchema, PostingStatus};

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct CheckHandicaps {
    pub date: NaiveDate,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize, Clone)]
pub struct NewExclusion {
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub reason: Option<String>,
}

/// Create or full update of a golfer.
#[derive(Debug, JsonSchema, Serialize, Deserialize, Clone, Default)]
pub struct GolferForm {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub member_number: Option<String>,
    pub ghin_number: Option<String>,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize, Clone)]
pub struct RoundOverride {
    pub posting_status: PostingStatus,
    pub excuse_reason: Option<String>,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize, Clone)]
pub struct BatchStatsRequest {
    pub member_numbers: Vec<String>,
}
