mod forms;
mod mutation;

use chrono::NaiveDate;
use entity::sea_orm_active_enums::PostingStatus as DbPostingStatus;
use entity::*;
use rocket::FromFormField;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::{self, JsonSchema};

pub use forms::*;

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PostingStatus {
    Posted,
    ExcusedNoPost,
    UnexcusedNoPost,
}

impl From<DbPostingStatus> for PostingStatus {
    fn from(status: DbPostingStatus) -> Self {
        match status {
            DbPostingStatus::Posted => Self::Posted,
            DbPostingStatus::ExcusedNoPost => Self::ExcusedNoPost,
            DbPostingStatus::UnexcusedNoPost => Self::UnexcusedNoPost,
        }
    }
}

impl From<PostingStatus> for DbPostingStatus {
    fn from(status: PostingStatus) -> Self {
        match status {
            PostingStatus::Posted => Self::Posted,
            PostingStatus::ExcusedNoPost => Self::ExcusedNoPost,
            PostingStatus::UnexcusedNoPost => Self::UnexcusedNoPost,
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct Golfer {
    pub id: i32,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub member_number: Option<String>,
    pub ghin_number: Option<String>,
}

impl From<golfer::Model> for Golfer {
    fn from(g: golfer::Model) -> Self {
        Self {
            id: g.id,
            first_name: g.first_name,
            middle_name: g.middle_name,
            last_name: g.last_name,
            suffix: g.suffix,
            email: g.email,
            gender: g.gender,
            member_number: g.member_number,
            ghin_number: g.ghin_number,
        }
    }
}

/// "First Middle Last Suffix" with absent parts skipped.
pub fn full_name(g: &golfer::Model) -> String {
    [
        Some(g.first_name.as_str()),
        g.middle_name.as_deref(),
        Some(g.last_name.as_str()),
        g.suffix.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct Round {
    pub id: i32,
    pub date: NaiveDate,
    pub golfer_id: i32,
    pub tee_time: String,
    pub posting_status: PostingStatus,
    pub excuse_reason: Option<String>,
}

impl From<tee_time::Model> for Round {
    fn from(r: tee_time::Model) -> Self {
        Self {
            id: r.id,
            date: r.date,
            golfer_id: r.golfer_id,
            tee_time: r.tee_time,
            posting_status: r.posting_status.into(),
            excuse_reason: r.excuse_reason,
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct Exclusion {
    pub id: i32,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub reason: Option<String>,
}

impl From<excluded_date::Model> for Exclusion {
    fn from(e: excluded_date::Model) -> Self {
        Self {
            id: e.id,
            date: e.date,
            start_time: e.start_time,
            end_time: e.end_time,
            reason: e.reason,
        }
    }
}

#[derive(Serialize, JsonSchema, Debug)]
pub struct DuplicateGroup {
    /// The shared GHIN or member number
    pub key: String,
    pub golfers: Vec<Golfer>,
}

#[derive(Serialize, JsonSchema, Debug)]
pub struct DuplicateGolfers {
    pub by_ghin: Vec<DuplicateGroup>,
    pub by_member_number: Vec<DuplicateGroup>,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, FromFormField)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    Email,
    Ghin,
    #[field(value = "member_number")]
    MemberNumber,
}
