//! The two external feeds: the vendor tee sheet and the handicap posting report.
//!
//! Each ingestion stage hands the engine an [`Ingest`] instead of a bare `Result`, so a
//! broken secondary feed can be told apart from a broken primary one.

pub mod gmail;
pub mod posting_report;
pub mod tee_sheet;

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::Serialize;
use thiserror::Error;

pub use gmail::GmailClient;
pub use posting_report::{fetch_posted_ghins, PostedKeys, ReportLocator};
pub use tee_sheet::{MtechClient, TeeSheet, TeeSheetRecord};

#[derive(Debug)]
pub enum Ingest<T> {
    /// The stage produced usable data.
    Ready(T),
    /// The stage failed but the run may continue as if it produced nothing.
    Degraded(String),
    /// The run cannot continue.
    Fatal(String),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("oauth token refresh failed: {0}")]
    Auth(String),
    #[error("no report email matched `{0}`")]
    NoMessage(String),
    #[error("report email has no attachment matching `{0}`")]
    NoAttachment(String),
    #[error("attachment is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("attachment is not a readable workbook: {0}")]
    Workbook(String),
    #[error("report is missing the `{0}` column")]
    MissingColumn(&'static str),
}

/// Shape of the posting feed outcome reported back to the caller.
#[derive(Debug, Clone, Serialize, JsonSchema, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PostingFeedStatus {
    Ready { posted: usize },
    Degraded { reason: String },
}
