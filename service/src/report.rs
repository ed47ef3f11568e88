//! Posting percentages per golfer, the summary over them and the CSV exports.

use std::collections::HashMap;

use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use entity::sea_orm_active_enums::PostingStatus as DbPostingStatus;
use entity::{golfer, tee_time};
use itertools::Itertools;
use log::error;
use rocket::FromForm;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};

use crate::dto::{full_name, Golfer, PostingStatus};
use crate::error::GenericError;
use crate::query::{
    get_golfer, golfers_by_member_numbers, member_key, rounds_for_date, rounds_for_golfer,
    rounds_with_golfers,
};

const RECENT_ROUNDS: usize = 5;
const PERFORMER_MIN_ROUNDS: usize = 5;
const POOR_BELOW: u32 = 80;
const GOOD_FROM: u32 = 90;

/// `round(posted / (posted + unexcused) * 100)`; excused rounds do not count, no eligible
/// rounds is 0.
pub fn posting_percentage(posted: usize, unexcused: usize) -> u32 {
    let eligible = posted + unexcused;
    if eligible == 0 {
        return 0;
    }
    (posted as f64 / eligible as f64 * 100.0).round() as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    posted: usize,
    unexcused: usize,
    excused: usize,
}

impl Tally {
    fn count(&mut self, status: DbPostingStatus) {
        match status {
            DbPostingStatus::Posted => self.posted += 1,
            DbPostingStatus::UnexcusedNoPost => self.unexcused += 1,
            DbPostingStatus::ExcusedNoPost => self.excused += 1,
        }
    }

    fn total(&self) -> usize {
        self.posted + self.unexcused + self.excused
    }

    fn percentage(&self) -> u32 {
        posting_percentage(self.posted, self.unexcused)
    }
}

#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct RecentRound {
    pub date: NaiveDate,
    pub tee_time: String,
    pub posting_status: PostingStatus,
    pub excuse_reason: Option<String>,
}

#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct GolferPostingRow {
    pub golfer_id: i32,
    pub golfer_name: String,
    pub member_number: Option<String>,
    pub ghin_number: Option<String>,
    pub total_rounds: usize,
    pub posted_rounds: usize,
    pub unexcused_no_post: usize,
    pub excused_no_post: usize,
    pub posting_percentage: u32,
    pub last_round_date: Option<NaiveDate>,
    pub recent_activity: Vec<RecentRound>,
    /// Newest first
    #[serde(skip)]
    unexcused_dates: Vec<NaiveDate>,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Default, FromForm)]
pub struct ReportFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Name or member number fragment
    pub search: Option<String>,
    pub min_rounds: Option<usize>,
    pub gender: Option<String>,
}

fn filter_date(raw: &Option<String>, invalid: &'static str) -> Result<Option<NaiveDate>, GenericError> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| GenericError::BadRequest(invalid)),
    }
}

impl ReportFilter {
    pub fn date_range(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), GenericError> {
        Ok((
            filter_date(&self.start_date, "Invalid start date")?,
            filter_date(&self.end_date, "Invalid end date")?,
        ))
    }
}

fn has_ghin(golfer: &golfer::Model) -> bool {
    golfer
        .ghin_number
        .as_deref()
        .is_some_and(|g| !g.trim().is_empty())
}

/// Groups rounds (newest first) by golfer and computes each golfer's posting figures.
///
/// Golfers without a GHIN are left out since they cannot post. Rows are ordered worst
/// percentage first, then by most rounds.
pub fn posting_rows(
    rounds: Vec<(tee_time::Model, golfer::Model)>,
    filter: &ReportFilter,
) -> Vec<GolferPostingRow> {
    let gender = filter
        .gender
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty());
    let search = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut golfers: HashMap<i32, golfer::Model> = HashMap::new();
    let mut by_golfer: HashMap<i32, Vec<tee_time::Model>> = HashMap::new();
    for (round, golfer) in rounds {
        if !has_ghin(&golfer) {
            continue;
        }
        if gender.is_some_and(|g| golfer.gender.as_deref().map(str::trim) != Some(g)) {
            continue;
        }
        by_golfer.entry(golfer.id).or_default().push(round);
        golfers.entry(golfer.id).or_insert(golfer);
    }

    by_golfer
        .into_iter()
        .filter_map(|(id, rounds)| golfers.remove(&id).map(|g| row(g, rounds)))
        .filter(|row| match &search {
            None => true,
            Some(term) => {
                row.golfer_name.to_lowercase().contains(term)
                    || row
                        .member_number
                        .as_deref()
                        .is_some_and(|m| m.to_lowercase().contains(term))
            }
        })
        .filter(|row| filter.min_rounds.map_or(true, |min| row.total_rounds >= min))
        .sorted_by(|a, b| {
            a.posting_percentage
                .cmp(&b.posting_percentage)
                .then(b.total_rounds.cmp(&a.total_rounds))
                .then(a.golfer_name.cmp(&b.golfer_name))
        })
        .collect()
}

fn row(golfer: golfer::Model, mut rounds: Vec<tee_time::Model>) -> GolferPostingRow {
    rounds.sort_by(|a, b| b.date.cmp(&a.date).then(b.tee_time.cmp(&a.tee_time)));
    let mut tally = Tally::default();
    rounds.iter().for_each(|r| tally.count(r.posting_status));
    GolferPostingRow {
        golfer_id: golfer.id,
        golfer_name: full_name(&golfer),
        member_number: golfer.member_number,
        ghin_number: golfer.ghin_number,
        total_rounds: tally.total(),
        posted_rounds: tally.posted,
        unexcused_no_post: tally.unexcused,
        excused_no_post: tally.excused,
        posting_percentage: tally.percentage(),
        last_round_date: rounds.first().map(|r| r.date),
        recent_activity: rounds
            .iter()
            .take(RECENT_ROUNDS)
            .map(|r| RecentRound {
                date: r.date,
                tee_time: r.tee_time.clone(),
                posting_status: r.posting_status.into(),
                excuse_reason: r.excuse_reason.clone(),
            })
            .collect(),
        unexcused_dates: rounds
            .iter()
            .filter(|r| r.posting_status == DbPostingStatus::UnexcusedNoPost)
            .map(|r| r.date)
            .collect(),
    }
}

#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct PostingSummary {
    pub total_golfers: usize,
    pub total_rounds: usize,
    pub total_posted: usize,
    pub total_unexcused: usize,
    pub overall_posting_percentage: u32,
    /// Under 80% with at least five rounds
    pub poor_performers: usize,
    /// 90% or better with at least five rounds
    pub good_performers: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn summarize(
    rows: &[GolferPostingRow],
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> PostingSummary {
    let total_posted = rows.iter().map(|r| r.posted_rounds).sum();
    let total_unexcused = rows.iter().map(|r| r.unexcused_no_post).sum();
    let performers = |keep: fn(u32) -> bool| {
        rows.iter()
            .filter(|r| r.total_rounds >= PERFORMER_MIN_ROUNDS && keep(r.posting_percentage))
            .count()
    };
    PostingSummary {
        total_golfers: rows.len(),
        total_rounds: rows.iter().map(|r| r.total_rounds).sum(),
        total_posted,
        total_unexcused,
        overall_posting_percentage: posting_percentage(total_posted, total_unexcused),
        poor_performers: performers(|p| p < POOR_BELOW),
        good_performers: performers(|p| p >= GOOD_FROM),
        start_date,
        end_date,
    }
}

#[derive(Serialize, JsonSchema, Debug)]
pub struct PostingHistory {
    pub summary: PostingSummary,
    pub golfers: Vec<GolferPostingRow>,
}

pub async fn posting_history(
    db: &impl ConnectionTrait,
    filter: &ReportFilter,
) -> Result<PostingHistory, GenericError> {
    let (start, end) = filter.date_range()?;
    let rounds = rounds_with_golfers(db, start, end).await?;
    let golfers = posting_rows(rounds, filter);
    Ok(PostingHistory {
        summary: summarize(&golfers, start, end),
        golfers,
    })
}

fn csv_text(records: Vec<Vec<String>>) -> Result<String, GenericError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());
    for record in records {
        writer.write_record(&record).map_err(|e| {
            error!("Could not write csv record: {}", e);
            GenericError::UnknownError("Could not build csv")
        })?;
    }
    let bytes = writer.into_inner().map_err(|e| {
        error!("Could not flush csv: {}", e);
        GenericError::UnknownError("Could not build csv")
    })?;
    String::from_utf8(bytes).map_err(|_| GenericError::UnknownError("Could not build csv"))
}

/// One line per golfer with their totals.
pub fn summary_csv(rows: &[GolferPostingRow]) -> Result<String, GenericError> {
    let header = [
        "Name",
        "Member Number",
        "GHIN Number",
        "Total Rounds",
        "Posted Rounds",
        "Unexcused No Post",
        "Excused No Post",
        "Posting Percentage",
        "Last Round Date",
    ]
    .map(String::from)
    .to_vec();
    let lines = rows.iter().map(|r| {
        vec![
            r.golfer_name.clone(),
            r.member_number.clone().unwrap_or_default(),
            r.ghin_number.clone().unwrap_or_default(),
            r.total_rounds.to_string(),
            r.posted_rounds.to_string(),
            r.unexcused_no_post.to_string(),
            r.excused_no_post.to_string(),
            format!("{}%", r.posting_percentage),
            r.last_round_date.map(|d| d.to_string()).unwrap_or_default(),
        ]
    });
    csv_text(std::iter::once(header).chain(lines).collect())
}

/// Name, member number and every unexcused date, padded to the golfer with the most.
pub fn detailed_csv(rows: &[GolferPostingRow]) -> Result<String, GenericError> {
    let widest = rows.iter().map(|r| r.unexcused_dates.len()).max().unwrap_or(0);
    let mut header = vec!["Name".to_string(), "Member Number".to_string()];
    header.extend((1..=widest).map(|i| format!("Unexcused Date {i}")));
    let lines = rows.iter().map(|r| {
        let mut line = vec![
            r.golfer_name.clone(),
            r.member_number.clone().unwrap_or_default(),
        ];
        line.extend(
            (0..widest).map(|i| r.unexcused_dates.get(i).map(|d| d.to_string()).unwrap_or_default()),
        );
        line
    });
    csv_text(std::iter::once(header).chain(lines).collect())
}

#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct GolferStats {
    pub golfer: Golfer,
    pub total_rounds: usize,
    pub posted: usize,
    pub unexcused: usize,
    pub excused: usize,
    pub posting_percentage: u32,
}

pub async fn golfer_stats(
    db: &impl ConnectionTrait,
    golfer_id: i32,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<GolferStats, GenericError> {
    let golfer = get_golfer(db, golfer_id).await?;
    let mut tally = Tally::default();
    rounds_for_golfer(db, golfer_id, start, end)
        .await?
        .iter()
        .for_each(|r| tally.count(r.posting_status));
    Ok(GolferStats {
        golfer: golfer.into(),
        total_rounds: tally.total(),
        posted: tally.posted,
        unexcused: tally.unexcused,
        excused: tally.excused,
        posting_percentage: tally.percentage(),
    })
}

#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct BatchStat {
    pub id: i32,
    pub member_number: Option<String>,
    pub name: String,
    pub posting_percentage: u32,
}

/// Lifetime posting percentage for each known member number.
pub async fn batch_stats(
    db: &impl ConnectionTrait,
    member_numbers: &[String],
) -> Result<Vec<BatchStat>, GenericError> {
    if member_numbers.iter().all(|m| m.trim().is_empty()) {
        return Err(GenericError::BadRequest("No member numbers provided"));
    }
    let golfers = golfers_by_member_numbers(db, member_numbers).await?;
    let keys: Vec<String> = member_numbers.iter().map(|m| member_key(m)).unique().collect();
    let mut stats = Vec::new();
    for key in keys {
        let Some(golfer) = golfers.get(&key) else {
            continue;
        };
        let mut tally = Tally::default();
        rounds_for_golfer(db, golfer.id, None, None)
            .await?
            .iter()
            .for_each(|r| tally.count(r.posting_status));
        stats.push(BatchStat {
            id: golfer.id,
            member_number: golfer.member_number.clone(),
            name: full_name(golfer),
            posting_percentage: tally.percentage(),
        });
    }
    Ok(stats)
}

#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct NoPostGolfer {
    pub name: String,
    pub email: Option<String>,
    pub member_number: Option<String>,
    pub tee_time: String,
}

/// Unexcused non-posters for one date, split the way the daily summary lists them.
#[derive(Serialize, JsonSchema, Debug, Clone, Default, PartialEq)]
pub struct NoPostReport {
    pub date: Option<NaiveDate>,
    pub men: Vec<NoPostGolfer>,
    pub women: Vec<NoPostGolfer>,
    pub other: Vec<NoPostGolfer>,
}

pub async fn no_posts(db: &impl ConnectionTrait, date: NaiveDate) -> Result<NoPostReport, GenericError> {
    let mut report = NoPostReport {
        date: Some(date),
        ..Default::default()
    };
    for (round, golfer) in rounds_for_date(db, date).await? {
        let Some(golfer) = golfer else { continue };
        if round.posting_status != DbPostingStatus::UnexcusedNoPost {
            continue;
        }
        let entry = NoPostGolfer {
            name: full_name(&golfer),
            email: golfer.email.clone(),
            member_number: golfer.member_number.clone(),
            tee_time: round.tee_time,
        };
        let gender = golfer.gender.as_deref().map(|g| g.trim().to_uppercase());
        match gender.as_deref().and_then(|g| g.chars().next()) {
            Some('M') => report.men.push(entry),
            Some('F') | Some('W') => report.women.push(entry),
            _ => report.other.push(entry),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golfer(id: i32, last: &str, ghin: Option<&str>, gender: &str) -> golfer::Model {
        golfer::Model {
            id,
            first_name: "Pat".to_string(),
            middle_name: None,
            last_name: last.to_string(),
            suffix: None,
            email: None,
            gender: Some(gender.to_string()),
            member_number: Some(format!("M{id}")),
            ghin_number: ghin.map(str::to_string),
        }
    }

    fn round(golfer_id: i32, day: u32, status: DbPostingStatus) -> tee_time::Model {
        tee_time::Model {
            id: 0,
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            golfer_id,
            tee_time: "08:00".to_string(),
            posting_status: status,
            excuse_reason: None,
        }
    }

    fn rounds_for(g: &golfer::Model, statuses: &[DbPostingStatus]) -> Vec<(tee_time::Model, golfer::Model)> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| (round(g.id, i as u32 + 1, *s), g.clone()))
            .collect()
    }

    use DbPostingStatus::*;

    #[test]
    fn percentage_ignores_excused_rounds() {
        assert_eq!(posting_percentage(3, 1), 75);
        assert_eq!(posting_percentage(0, 0), 0);
        assert_eq!(posting_percentage(2, 1), 67);
        assert_eq!(posting_percentage(1, 1), 50);
    }

    #[test]
    fn rows_skip_golfers_without_ghin_and_sort_worst_first() {
        let good = golfer(1, "Good", Some("111"), "M");
        let bad = golfer(2, "Bad", Some("222"), "F");
        let busy_bad = golfer(3, "Busy", Some("333"), "M");
        let no_ghin = golfer(4, "None", Some(" "), "M");

        let mut rounds = rounds_for(&good, &[Posted, Posted, Posted, UnexcusedNoPost, ExcusedNoPost, ExcusedNoPost]);
        rounds.extend(rounds_for(&bad, &[UnexcusedNoPost]));
        rounds.extend(rounds_for(&busy_bad, &[UnexcusedNoPost, UnexcusedNoPost]));
        rounds.extend(rounds_for(&no_ghin, &[UnexcusedNoPost]));

        let rows = posting_rows(rounds, &ReportFilter::default());
        let ids: Vec<_> = rows.iter().map(|r| r.golfer_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        let good = &rows[2];
        assert_eq!(good.posting_percentage, 75);
        assert_eq!(good.total_rounds, 6);
        assert_eq!(good.excused_no_post, 2);
        assert_eq!(good.recent_activity.len(), 5);
        assert_eq!(good.last_round_date, NaiveDate::from_ymd_opt(2024, 6, 6));
    }

    #[test]
    fn filters_apply_to_rows() {
        let a = golfer(1, "Alpha", Some("111"), "M");
        let b = golfer(2, "Beta", Some("222"), "F");
        let mut rounds = rounds_for(&a, &[Posted]);
        rounds.extend(rounds_for(&b, &[Posted, Posted]));

        let women = ReportFilter {
            gender: Some("F".to_string()),
            ..Default::default()
        };
        assert_eq!(posting_rows(rounds.clone(), &women).len(), 1);

        let search = ReportFilter {
            search: Some("alp".to_string()),
            ..Default::default()
        };
        assert_eq!(posting_rows(rounds.clone(), &search)[0].golfer_id, 1);

        let busy = ReportFilter {
            min_rounds: Some(2),
            ..Default::default()
        };
        assert_eq!(posting_rows(rounds, &busy)[0].golfer_id, 2);
    }

    #[test]
    fn summary_counts_performers() {
        let steady = golfer(1, "Steady", Some("1"), "M");
        let lax = golfer(2, "Lax", Some("2"), "M");
        let new = golfer(3, "New", Some("3"), "M");
        let mut rounds = rounds_for(&steady, &[Posted; 5]);
        rounds.extend(rounds_for(&lax, &[UnexcusedNoPost; 5]));
        rounds.extend(rounds_for(&new, &[UnexcusedNoPost]));

        let rows = posting_rows(rounds, &ReportFilter::default());
        let summary = summarize(&rows, None, None);
        assert_eq!(summary.total_golfers, 3);
        assert_eq!(summary.total_rounds, 11);
        assert_eq!(summary.overall_posting_percentage, 45);
        assert_eq!(summary.poor_performers, 1);
        assert_eq!(summary.good_performers, 1);
    }

    #[test]
    fn csv_quotes_every_field() {
        let g = golfer(1, "Smith, Jr", Some("111"), "M");
        let rows = posting_rows(rounds_for(&g, &[Posted, UnexcusedNoPost]), &ReportFilter::default());
        let text = summary_csv(&rows).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("\"Name\",\"Member Number\",\"GHIN Number\",\"Total Rounds\",\"Posted Rounds\",\"Unexcused No Post\",\"Excused No Post\",\"Posting Percentage\",\"Last Round Date\"")
        );
        assert_eq!(
            lines.next(),
            Some("\"Pat Smith, Jr\",\"M1\",\"111\",\"2\",\"1\",\"1\",\"0\",\"50%\",\"2024-06-02\"")
        );
    }

    #[test]
    fn detailed_csv_pads_to_widest_golfer() {
        let a = golfer(1, "Alpha", Some("111"), "M");
        let b = golfer(2, "Beta", Some("222"), "M");
        let mut rounds = rounds_for(&a, &[UnexcusedNoPost, Posted, UnexcusedNoPost]);
        rounds.extend(rounds_for(&b, &[UnexcusedNoPost, Posted, Posted]));

        let rows = posting_rows(rounds, &ReportFilter::default());
        let text = detailed_csv(&rows).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "\"Name\",\"Member Number\",\"Unexcused Date 1\",\"Unexcused Date 2\""
        );
        assert_eq!(lines[1], "\"Pat Alpha\",\"M1\",\"2024-06-03\",\"2024-06-01\"");
        assert_eq!(lines[2], "\"Pat Beta\",\"M2\",\"2024-06-01\",\"\"");
    }
}
