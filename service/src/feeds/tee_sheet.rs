use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;

use super::{FeedError, Ingest};
use crate::exclusions::{is_excluded, ExclusionWindow};
use crate::normalize::{normalize_date, normalize_time, vendor_date};
use rocket_okapi::okapi::schemars::{self, JsonSchema};

const DATE_COLUMN: usize = 0;
const TIME_COLUMN: usize = 1;
const NAME_COLUMN: usize = 2;
const MIN_COLUMNS: usize = 5;

/// Feed versions put the member number in either of the last two columns. Earlier
/// entries win.
const MEMBER_NUMBER_COLUMNS: [usize; 2] = [5, 4];

/// One golfer on the tee sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeeSheetRecord {
    pub member_number: String,
    /// Canonical `HH:MM`
    pub time: String,
    pub date: NaiveDate,
    pub name: String,
}

impl TeeSheetRecord {
    fn slot(&self) -> (NaiveDate, String) {
        (self.date, self.time.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, JsonSchema, PartialEq, Eq)]
pub struct TeeSheetSummary {
    pub rows: usize,
    pub unparseable: usize,
    pub other_date: usize,
    pub excluded: usize,
    pub missing_member_number: usize,
    pub kept: usize,
    /// Distinct `(date, time)` slots among the kept rows
    pub groups: usize,
    /// Slots with a single golfer
    pub solo: usize,
}

/// Parsed tee sheet for a single date, grouped by tee time slot.
#[derive(Debug, Clone, Default)]
pub struct TeeSheet {
    pub records: Vec<TeeSheetRecord>,
    slots: HashMap<(NaiveDate, String), usize>,
    pub summary: TeeSheetSummary,
}

impl TeeSheet {
    /// Parses the vendor CSV and keeps the rows for `date` that no window excludes.
    pub fn parse(csv_text: &str, date: NaiveDate, windows: &[ExclusionWindow]) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(csv_text.as_bytes());

        let mut summary = TeeSheetSummary::default();
        let mut records = Vec::new();

        for row in reader.records() {
            summary.rows += 1;
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping unreadable tee sheet row: {}", e);
                    summary.unparseable += 1;
                    continue;
                }
            };
            let cell = |i: usize| row.get(i).map(clean).unwrap_or_default();

            if row.len() < MIN_COLUMNS {
                summary.unparseable += 1;
                continue;
            }
            let Some(row_date) = normalize_date(&cell(DATE_COLUMN)) else {
                // Header rows land here too
                summary.unparseable += 1;
                continue;
            };
            if row_date != date {
                summary.other_date += 1;
                continue;
            }
            let raw_time = cell(TIME_COLUMN);
            if is_excluded(&raw_time, windows) {
                summary.excluded += 1;
                continue;
            }
            let Some(time) = normalize_time(Some(&raw_time)) else {
                summary.unparseable += 1;
                continue;
            };
            let Some(member_number) = MEMBER_NUMBER_COLUMNS
                .iter()
                .map(|&i| cell(i))
                .find(|value| !value.is_empty())
            else {
                summary.missing_member_number += 1;
                continue;
            };
            records.push(TeeSheetRecord {
                member_number,
                time,
                date: row_date,
                name: display_name(&cell(NAME_COLUMN)),
            });
        }

        summary.kept = records.len();
        let mut slots = HashMap::new();
        for record in &records {
            *slots.entry(record.slot()).or_insert(0) += 1;
        }
        let mut sheet = Self {
            records,
            slots,
            summary,
        };
        sheet.summary.groups = sheet.slots.len();
        sheet.summary.solo = sheet.solo_count();
        sheet
    }

    /// Number of golfers sharing this record's date and tee time.
    pub fn group_size(&self, record: &TeeSheetRecord) -> usize {
        self.slots.get(&record.slot()).copied().unwrap_or(0)
    }

    /// A round played alone in its slot.
    pub fn is_solo(&self, record: &TeeSheetRecord) -> bool {
        self.group_size(record) == 1
    }

    pub fn solo_count(&self) -> usize {
        self.slots.values().filter(|&&n| n == 1).count()
    }
}

fn clean(value: &str) -> String {
    value.replace('\r', "").trim().to_string()
}

/// Drops the vendor's ` - suffix` from a player name.
fn display_name(raw: &str) -> String {
    raw.split('-').next().unwrap_or_default().trim().to_string()
}

/// Client for the club's tee sheet vendor.
#[derive(Debug, Clone)]
pub struct MtechClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MtechClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Tee sheet client built without a timeout: {}", e);
                reqwest::Client::new()
            });
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub async fn fetch_csv(&self, date: NaiveDate) -> Result<String, FeedError> {
        let url = format!("{}/cmtapi/teetimes/", self.base_url.trim_end_matches('/'));
        let the_date = vendor_date(date);
        let response = self
            .http
            .get(&url)
            .query(&[("apikey", self.api_key.as_str()), ("TheDate", the_date.as_str())])
            .header("Accept", "text/csv")
            .send()
            .await
            .map_err(|source| FeedError::Http {
                endpoint: "tee sheet",
                source,
            })?;
        if !response.status().is_success() {
            return Err(FeedError::Status {
                endpoint: "tee sheet",
                status: response.status().as_u16(),
            });
        }
        response.text().await.map_err(|source| FeedError::Http {
            endpoint: "tee sheet",
            source,
        })
    }

    /// Fetches and parses the tee sheet for `date`. Any failure here is fatal for the run.
    pub async fn ingest(&self, date: NaiveDate, windows: &[ExclusionWindow]) -> Ingest<TeeSheet> {
        info!("Fetching tee sheet for {}", date);
        match self.fetch_csv(date).await {
            Ok(text) => {
                let sheet = TeeSheet::parse(&text, date, windows);
                info!(
                    "Tee sheet for {}: {} rows, {} kept in {} groups ({} solo), {} excluded, {} unparseable",
                    date,
                    sheet.summary.rows,
                    sheet.summary.kept,
                    sheet.summary.groups,
                    sheet.summary.solo,
                    sheet.summary.excluded,
                    sheet.summary.unparseable
                );
                Ingest::Ready(sheet)
            }
            Err(e) => Ingest::Fatal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    const SHEET: &str = "\
Date,Time,Name,GHIN,Member,MemberNo
6/1/2024,8:00 AM,\"Smith, John - M\",1111111,,A100
6/1/2024,8:00 AM,\"Jones, Amy\",2222222,B200,
6/1/2024,8:10 AM,\"Brown, Tim\",,C300,C300x
6/2/2024,8:10 AM,\"Other, Day\",,D400,
6/1/2024,9:00 AM,\"No, Member\",4444444,,
6/1/24,not a time,\"Bad, Time\",,E500,
";

    #[test]
    fn parses_quoted_names_and_member_columns() {
        let sheet = TeeSheet::parse(SHEET, june_first(), &[]);
        let members: Vec<_> = sheet.records.iter().map(|r| r.member_number.as_str()).collect();
        assert_eq!(members, vec!["A100", "B200", "C300x"]);
        assert_eq!(sheet.records[0].name, "Smith, John");
        assert_eq!(sheet.records[0].time, "08:00");
    }

    #[test]
    fn summary_counts_every_drop() {
        let sheet = TeeSheet::parse(SHEET, june_first(), &[]);
        assert_eq!(
            sheet.summary,
            TeeSheetSummary {
                rows: 7,
                unparseable: 2,
                other_date: 1,
                excluded: 0,
                missing_member_number: 1,
                kept: 3,
                groups: 2,
                solo: 1,
            }
        );
    }

    #[test]
    fn groups_detect_solo_rounds() {
        let sheet = TeeSheet::parse(SHEET, june_first(), &[]);
        assert!(!sheet.is_solo(&sheet.records[0]));
        assert!(!sheet.is_solo(&sheet.records[1]));
        assert!(sheet.is_solo(&sheet.records[2]));
        assert_eq!(sheet.solo_count(), 1);
    }

    #[test]
    fn grouping_happens_after_time_normalization() {
        let text = "6/1/2024,8:00,\"A, A\",,,M1\n6/1/2024,08:00 AM,\"B, B\",,,M2\n";
        let sheet = TeeSheet::parse(text, june_first(), &[]);
        assert_eq!(sheet.group_size(&sheet.records[0]), 2);
        assert_eq!((sheet.summary.groups, sheet.summary.solo), (1, 0));
    }

    #[test]
    fn excluded_rows_are_dropped_before_grouping() {
        let windows = [ExclusionWindow::between("08:05", "08:30")];
        let sheet = TeeSheet::parse(SHEET, june_first(), &windows);
        assert_eq!(sheet.records.len(), 2);
        assert_eq!(sheet.summary.excluded, 1);
        assert_eq!((sheet.summary.groups, sheet.summary.solo), (1, 0));
    }

    #[tokio::test]
    async fn fetches_with_vendor_date_format() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/cmtapi/teetimes/")
                    .query_param("apikey", "secret")
                    .query_param("TheDate", "6-1-2024");
                then.status(200).body(SHEET);
            })
            .await;

        let client = MtechClient::new(server.base_url(), "secret", Duration::from_secs(5));
        let Ingest::Ready(sheet) = client.ingest(june_first(), &[]).await else {
            panic!("tee sheet should ingest");
        };
        mock.assert_async().await;
        assert_eq!(sheet.records.len(), 3);
    }

    #[tokio::test]
    async fn vendor_errors_are_fatal() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cmtapi/teetimes/");
                then.status(503);
            })
            .await;

        let client = MtechClient::new(server.base_url(), "secret", Duration::from_secs(5));
        match client.ingest(june_first(), &[]).await {
            Ingest::Fatal(reason) => assert!(reason.contains("503"), "{reason}"),
            other => panic!("expected fatal, got {other:?}"),
        }
    }
}
