use std::collections::HashSet;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use log::{info, warn};

use super::gmail::GmailClient;
use super::{FeedError, Ingest};

const GHIN_HEADER: &str = "ghin";
const POSTED_HEADER: &str = "total posted on date played";

/// GHIN numbers that posted a score for the reporting date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostedKeys(HashSet<String>);

impl PostedKeys {
    pub fn contains(&self, ghin: &str) -> bool {
        let ghin = ghin.trim();
        !ghin.is_empty() && self.0.contains(ghin)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for PostedKeys {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

/// Where the governing body's played/posted report is found in the mailbox.
#[derive(Debug, Clone)]
pub struct ReportLocator {
    pub sender: String,
    pub subject: String,
    /// Case-insensitive substring the attachment filename must contain
    pub attachment_marker: String,
}

impl ReportLocator {
    /// The report for `date` is mailed the following day.
    pub fn search_query(&self, date: NaiveDate) -> String {
        let mailed = date + Duration::days(1);
        let before = mailed + Duration::days(1);
        format!(
            "from:{} subject:\"{}\" after:{} before:{}",
            self.sender,
            self.subject,
            mailed.format("%Y/%m/%d"),
            before.format("%Y/%m/%d")
        )
    }

    fn matches_attachment(&self, filename: &str) -> bool {
        let filename = filename.to_lowercase();
        filename.ends_with(".xlsx") && filename.contains(&self.attachment_marker.to_lowercase())
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Int(i) => i.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Reads the first worksheet of an xlsx workbook as text rows.
pub fn workbook_rows(bytes: Vec<u8>) -> Result<Vec<Vec<String>>, FeedError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| FeedError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| FeedError::Workbook("workbook has no sheets".to_string()))?
        .map_err(|e| FeedError::Workbook(e.to_string()))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

/// Picks the GHIN numbers whose "posted on date played" count is positive.
///
/// The header row is the first row mentioning a GHIN column.
pub fn posted_ghins_from_rows(rows: &[Vec<String>]) -> Result<Vec<String>, FeedError> {
    let find = |header: &[String], needle: &str| {
        header
            .iter()
            .position(|h| h.to_lowercase().contains(needle))
    };
    let (header_idx, header) = rows
        .iter()
        .enumerate()
        .find(|(_, row)| find(row, GHIN_HEADER).is_some())
        .ok_or(FeedError::MissingColumn(GHIN_HEADER))?;
    let ghin_col = find(header, GHIN_HEADER).ok_or(FeedError::MissingColumn(GHIN_HEADER))?;
    let posted_col = find(header, POSTED_HEADER).ok_or(FeedError::MissingColumn(POSTED_HEADER))?;

    Ok(rows[header_idx + 1..]
        .iter()
        .filter(|row| {
            row.get(posted_col)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .is_some_and(|posted| posted > 0.0)
        })
        .filter_map(|row| row.get(ghin_col))
        .map(|ghin| ghin.trim().to_string())
        .filter(|ghin| !ghin.is_empty())
        .collect())
}

async fn download_report(
    gmail: &GmailClient,
    locator: &ReportLocator,
    date: NaiveDate,
) -> Result<Vec<String>, FeedError> {
    let token = gmail.access_token().await?;
    let query = locator.search_query(date);
    let message_id = gmail
        .search(&token, &query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| FeedError::NoMessage(query.clone()))?;

    let message = gmail.message(&token, &message_id).await?;
    let attachments = message.attachments();
    let attachment = attachments
        .iter()
        .find(|a| locator.matches_attachment(&a.filename))
        .ok_or_else(|| {
            let names: Vec<_> = attachments.iter().map(|a| a.filename.as_str()).collect();
            warn!("Attachments on report email: {:?}", names);
            FeedError::NoAttachment(locator.attachment_marker.clone())
        })?;
    info!("Reading posting report attachment {}", attachment.filename);

    let bytes = gmail
        .attachment(&token, &message.id, &attachment.attachment_id)
        .await?;
    posted_ghins_from_rows(&workbook_rows(bytes)?)
}

/// Collects the GHIN numbers that posted for `date`.
///
/// Never fatal: any failure degrades to an empty posted set so the tee sheet can still be
/// reconciled.
pub async fn fetch_posted_ghins(
    gmail: &GmailClient,
    locator: &ReportLocator,
    date: NaiveDate,
) -> Ingest<PostedKeys> {
    match download_report(gmail, locator, date).await {
        Ok(ghins) => {
            let keys: PostedKeys = ghins.into_iter().collect();
            info!("Posting report for {}: {} GHIN numbers posted", date, keys.len());
            Ingest::Ready(keys)
        }
        Err(e) => {
            warn!("Posting report unavailable for {}, treating as nothing posted: {}", date, e);
            Ingest::Degraded(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::gmail::OAuthCredentials;
    use httpmock::prelude::*;
    use rust_xlsxwriter::Workbook;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn locator() -> ReportLocator {
        ReportLocator {
            sender: "reporting@ghin.com".to_string(),
            subject: "Played / Posted Report".to_string(),
            attachment_marker: "played".to_string(),
        }
    }

    fn report_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Player Rounds").unwrap();
        sheet.write_string(1, 0, "Golfer Name").unwrap();
        sheet.write_string(1, 1, "GHIN Number").unwrap();
        sheet.write_string(1, 2, "Total Posted on Date Played").unwrap();
        sheet.write_string(2, 0, "Smith, John").unwrap();
        sheet.write_number(2, 1, 1111111.0).unwrap();
        sheet.write_number(2, 2, 1.0).unwrap();
        sheet.write_string(3, 0, "Jones, Amy").unwrap();
        sheet.write_number(3, 1, 2222222.0).unwrap();
        sheet.write_number(3, 2, 0.0).unwrap();
        sheet.write_string(4, 0, "Brown, Tim").unwrap();
        sheet.write_string(4, 1, " 3333333 ").unwrap();
        sheet.write_string(4, 2, "2").unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn only_positive_posted_counts() {
        let data = rows(&[
            &["GHIN #", "Name", "Total Posted On Date Played"],
            &["1", "a", "1"],
            &["2", "b", "0"],
            &["3", "c", ""],
            &["", "d", "4"],
            &[" 5 ", "e", "2.0"],
        ]);
        assert_eq!(posted_ghins_from_rows(&data).unwrap(), vec!["1", "5"]);
    }

    #[test]
    fn missing_columns_are_errors() {
        let no_ghin = rows(&[&["Name", "Total posted on date played"], &["a", "1"]]);
        assert!(matches!(
            posted_ghins_from_rows(&no_ghin),
            Err(FeedError::MissingColumn(GHIN_HEADER))
        ));
        let no_posted = rows(&[&["GHIN", "Name"], &["1", "a"]]);
        assert!(matches!(
            posted_ghins_from_rows(&no_posted),
            Err(FeedError::MissingColumn(POSTED_HEADER))
        ));
    }

    #[test]
    fn reads_real_workbooks() {
        let rows = workbook_rows(report_workbook()).unwrap();
        assert_eq!(rows[2][1], "1111111");
        let ghins = posted_ghins_from_rows(&rows).unwrap();
        assert_eq!(ghins, vec!["1111111", "3333333"]);
    }

    #[test]
    fn posted_keys_trim_and_ignore_blanks() {
        let keys: PostedKeys = ["  123 ", "", "456"].into_iter().collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("123"));
        assert!(keys.contains(" 456"));
        assert!(!keys.contains(""));
    }

    #[test]
    fn search_targets_the_following_day() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(
            locator().search_query(date),
            "from:reporting@ghin.com subject:\"Played / Posted Report\" after:2024/07/01 before:2024/07/02"
        );
    }

    #[test]
    fn attachment_marker_is_case_insensitive() {
        let locator = locator();
        assert!(locator.matches_attachment("Played_Posted_Report.XLSX"));
        assert!(!locator.matches_attachment("Played.csv"));
        assert!(!locator.matches_attachment("summary.xlsx"));
    }

    fn gmail(server: &MockServer) -> GmailClient {
        GmailClient::new(
            server.base_url(),
            server.url("/token"),
            OAuthCredentials {
                client_id: "cid".to_string(),
                client_secret: "secret".to_string(),
                refresh_token: "refresh".to_string(),
            },
            std::time::Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn downloads_and_parses_the_report() {
        use base64::Engine;
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/token")
                    .body_includes("refresh_token=refresh");
                then.status(200)
                    .json_body(serde_json::json!({ "access_token": "tok", "expires_in": 3600 }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/gmail/v1/users/me/messages")
                    .header("Authorization", "Bearer tok");
                then.status(200)
                    .json_body(serde_json::json!({ "messages": [{ "id": "m1" }] }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gmail/v1/users/me/messages/m1");
                then.status(200).json_body(serde_json::json!({
                    "id": "m1",
                    "payload": { "parts": [
                        { "filename": "Played_Posted.xlsx", "body": { "attachmentId": "att" } }
                    ] }
                }));
            })
            .await;
        let data = base64::engine::general_purpose::URL_SAFE.encode(report_workbook());
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/gmail/v1/users/me/messages/m1/attachments/att");
                then.status(200)
                    .json_body(serde_json::json!({ "data": data, "size": 10 }));
            })
            .await;

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let Ingest::Ready(keys) = fetch_posted_ghins(&gmail(&server), &locator(), date).await
        else {
            panic!("report should parse");
        };
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("1111111"));
        assert!(!keys.contains("2222222"));
    }

    #[tokio::test]
    async fn missing_email_degrades() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200)
                    .json_body(serde_json::json!({ "access_token": "tok" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gmail/v1/users/me/messages");
                then.status(200).json_body(serde_json::json!({ "resultSizeEstimate": 0 }));
            })
            .await;

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let outcome = fetch_posted_ghins(&gmail(&server), &locator(), date).await;
        assert!(matches!(outcome, Ingest::Degraded(reason) if reason.contains("no report email")));
    }

    #[tokio::test]
    async fn rejected_refresh_token_degrades() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(400)
                    .json_body(serde_json::json!({ "error": "invalid_grant" }));
            })
            .await;

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let outcome = fetch_posted_ghins(&gmail(&server), &locator(), date).await;
        assert!(matches!(outcome, Ingest::Degraded(_)));
    }
}
