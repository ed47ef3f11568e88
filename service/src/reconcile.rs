//! The reconciliation run: join the tee sheet to golfers, check the posting report and
//! record one round per golfer and tee time.

use std::collections::HashMap;

use chrono::NaiveDate;
use entity::golfer;
use entity::sea_orm_active_enums::PostingStatus;
use itertools::Itertools;
use log::{debug, error, info, warn};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use sea_orm::ConnectionTrait;
use serde::Serialize;

use crate::config::RunConfig;
use crate::error::GenericError;
use crate::exclusions::ExclusionWindow;
use crate::feeds::tee_sheet::TeeSheetSummary;
use crate::feeds::{fetch_posted_ghins, Ingest, PostedKeys, PostingFeedStatus, TeeSheet};
use crate::mutation::RoundUpsert;
use crate::query::{
    exclusions_for_date, golfers_by_member_numbers, member_key, round_statuses_for_date,
};

pub const SOLO_REASON: &str = "solo";
pub const NO_GHIN_REASON: &str = "no_ghin";

const WRITE_CHUNK: usize = 50;

/// Higher ranks are never overwritten by lower ones.
pub fn rank(status: PostingStatus) -> u8 {
    match status {
        PostingStatus::UnexcusedNoPost => 0,
        PostingStatus::ExcusedNoPost => 1,
        PostingStatus::Posted => 2,
    }
}

/// Whether a freshly derived status should replace the stored one.
pub fn may_replace(stored: PostingStatus, derived: PostingStatus) -> bool {
    rank(derived) > rank(stored)
}

/// Decides the posting status of one round.
///
/// A golfer without a GHIN cannot post, so their round is excused rather than counted
/// against them.
pub fn classify(
    ghin: Option<&str>,
    solo: bool,
    posted: &PostedKeys,
) -> (PostingStatus, Option<&'static str>) {
    let ghin = ghin.map(str::trim).filter(|g| !g.is_empty());
    match ghin {
        Some(ghin) if posted.contains(ghin) => (PostingStatus::Posted, None),
        _ if solo => (PostingStatus::ExcusedNoPost, Some(SOLO_REASON)),
        None => (PostingStatus::ExcusedNoPost, Some(NO_GHIN_REASON)),
        Some(_) => (PostingStatus::UnexcusedNoPost, None),
    }
}

#[derive(Serialize, JsonSchema, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Tee sheet records considered
    pub total: usize,
    pub inserted: usize,
    /// Stored rounds raised to a higher status
    pub upgraded: usize,
    /// Stored rounds left alone because they already had an equal or higher status
    pub kept: usize,
    /// Writes that failed
    pub skipped: usize,
    /// Statuses of the rounds written this run, kept rounds are not counted
    pub posted: usize,
    pub excused: usize,
    pub unexcused: usize,
    pub unmatched: usize,
}

#[derive(Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    /// A write failed, a golfer could not be matched or the posting report was unavailable
    Partial,
}

#[derive(Serialize, JsonSchema, Debug, Clone)]
pub struct RunReport {
    pub date: NaiveDate,
    pub outcome: RunOutcome,
    pub stats: RunStats,
    /// Member numbers on the tee sheet with no golfer
    pub unmatched: Vec<String>,
    pub posting_feed: PostingFeedStatus,
    pub tee_sheet: TeeSheetSummary,
}

enum Plan {
    Insert(RoundUpsert),
    Upgrade(RoundUpsert),
    Keep,
}

/// Fetches both feeds for `date` and reconciles them into the round table.
pub async fn run_reconciliation(
    db: &impl ConnectionTrait,
    config: &RunConfig,
    date: NaiveDate,
) -> Result<RunReport, GenericError> {
    let windows: Vec<ExclusionWindow> = exclusions_for_date(db, date)
        .await?
        .iter()
        .map(ExclusionWindow::from)
        .collect();
    debug!("{} exclusion windows for {}", windows.len(), date);

    let tee_sheet = config.mtech_client().ingest(date, &windows).await;
    if let Ingest::Fatal(reason) = tee_sheet {
        error!("Tee sheet for {} unavailable: {}", date, reason);
        return Err(GenericError::UpstreamFeed(reason));
    }
    let posted = fetch_posted_ghins(&config.gmail_client(), &config.report, date).await;
    reconcile(db, date, tee_sheet, posted).await
}

/// Reconciles already ingested feeds. A fatal tee sheet aborts, a degraded posting report
/// is read as nothing posted.
pub async fn reconcile(
    db: &impl ConnectionTrait,
    date: NaiveDate,
    tee_sheet: Ingest<TeeSheet>,
    posted: Ingest<PostedKeys>,
) -> Result<RunReport, GenericError> {
    let sheet = match tee_sheet {
        Ingest::Ready(sheet) => sheet,
        Ingest::Degraded(reason) | Ingest::Fatal(reason) => {
            return Err(GenericError::UpstreamFeed(reason))
        }
    };
    let (posted, posting_feed) = match posted {
        Ingest::Ready(keys) => {
            let status = PostingFeedStatus::Ready { posted: keys.len() };
            (keys, status)
        }
        Ingest::Degraded(reason) | Ingest::Fatal(reason) => {
            (PostedKeys::default(), PostingFeedStatus::Degraded { reason })
        }
    };

    let member_numbers: Vec<String> = sheet
        .records
        .iter()
        .map(|r| r.member_number.clone())
        .collect();
    let golfers: HashMap<String, golfer::Model> =
        golfers_by_member_numbers(db, &member_numbers).await?;
    let mut stored = round_statuses_for_date(db, date).await?;
    info!(
        "Reconciling {} tee sheet records for {}: {} golfers matched, {} posted GHINs",
        sheet.records.len(),
        date,
        golfers.len(),
        posted.len()
    );

    let mut stats = RunStats {
        total: sheet.records.len(),
        ..Default::default()
    };
    let mut unmatched = Vec::new();
    let mut plans = Vec::with_capacity(sheet.records.len());

    for record in &sheet.records {
        let Some(golfer) = golfers.get(&member_key(&record.member_number)) else {
            stats.unmatched += 1;
            unmatched.push(record.member_number.clone());
            continue;
        };
        let (status, reason) = classify(
            golfer.ghin_number.as_deref(),
            sheet.is_solo(record),
            &posted,
        );
        let key = (golfer.id, record.time.clone());
        let round = RoundUpsert {
            date,
            golfer_id: golfer.id,
            tee_time: record.time.clone(),
            posting_status: status,
            excuse_reason: reason.map(str::to_string),
        };
        let plan = match stored.get(&key) {
            None => Plan::Insert(round),
            Some(&current) if may_replace(current, status) => Plan::Upgrade(round),
            Some(_) => Plan::Keep,
        };
        if !matches!(plan, Plan::Keep) {
            stored.insert(key, status);
        }
        plans.push(plan);
    }

    for (i, chunk) in plans.chunks(WRITE_CHUNK).enumerate() {
        debug!("Writing round chunk {} for {}", i + 1, date);
        for plan in chunk {
            let (round, upgrade) = match plan {
                Plan::Insert(round) => (round.clone(), false),
                Plan::Upgrade(round) => (round.clone(), true),
                Plan::Keep => {
                    stats.kept += 1;
                    continue;
                }
            };
            let (golfer_id, tee_time, status) =
                (round.golfer_id, round.tee_time.clone(), round.posting_status);
            match round.upsert(db).await {
                Ok(()) => {
                    if upgrade {
                        stats.upgraded += 1;
                    } else {
                        stats.inserted += 1;
                    }
                    match status {
                        PostingStatus::Posted => stats.posted += 1,
                        PostingStatus::ExcusedNoPost => stats.excused += 1,
                        PostingStatus::UnexcusedNoPost => stats.unexcused += 1,
                    }
                }
                Err(e) => {
                    error!(
                        "Could not store round for golfer {} at {} on {}: {}",
                        golfer_id, tee_time, date, e
                    );
                    stats.skipped += 1;
                }
            }
        }
    }

    let unmatched: Vec<String> = unmatched.into_iter().unique().collect();
    if !unmatched.is_empty() {
        warn!("Unmatched member numbers for {}: {:?}", date, unmatched);
    }

    let degraded = matches!(posting_feed, PostingFeedStatus::Degraded { .. });
    let outcome = if stats.skipped > 0
        || stats.unmatched > 0
        || sheet.summary.missing_member_number > 0
        || degraded
    {
        RunOutcome::Partial
    } else {
        RunOutcome::Completed
    };
    info!("Run for {} finished {:?}: {:?}", date, outcome, stats);

    Ok(RunReport {
        date,
        outcome,
        stats,
        unmatched,
        posting_feed,
        tee_sheet: sheet.summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posted(ghins: &[&str]) -> PostedKeys {
        ghins.iter().collect()
    }

    #[test]
    fn posted_beats_solo() {
        let keys = posted(&["123"]);
        assert_eq!(classify(Some("123"), true, &keys), (PostingStatus::Posted, None));
        assert_eq!(classify(Some(" 123 "), false, &keys), (PostingStatus::Posted, None));
    }

    #[test]
    fn solo_rounds_are_excused() {
        assert_eq!(
            classify(Some("123"), true, &PostedKeys::default()),
            (PostingStatus::ExcusedNoPost, Some(SOLO_REASON))
        );
        assert_eq!(
            classify(None, true, &PostedKeys::default()),
            (PostingStatus::ExcusedNoPost, Some(SOLO_REASON))
        );
    }

    #[test]
    fn golfers_without_ghin_are_never_unexcused() {
        let keys = posted(&["123"]);
        for ghin in [None, Some(""), Some("   ")] {
            for solo in [true, false] {
                let (status, _) = classify(ghin, solo, &keys);
                assert_ne!(status, PostingStatus::UnexcusedNoPost);
            }
        }
        assert_eq!(
            classify(Some(" "), false, &keys),
            (PostingStatus::ExcusedNoPost, Some(NO_GHIN_REASON))
        );
    }

    #[test]
    fn unposted_group_rounds_are_unexcused() {
        assert_eq!(
            classify(Some("999"), false, &posted(&["123"])),
            (PostingStatus::UnexcusedNoPost, None)
        );
    }

    #[test]
    fn statuses_only_move_up() {
        use PostingStatus::*;
        assert!(may_replace(UnexcusedNoPost, Posted));
        assert!(may_replace(UnexcusedNoPost, ExcusedNoPost));
        assert!(may_replace(ExcusedNoPost, Posted));
        assert!(!may_replace(Posted, UnexcusedNoPost));
        assert!(!may_replace(Posted, ExcusedNoPost));
        assert!(!may_replace(ExcusedNoPost, UnexcusedNoPost));
        assert!(!may_replace(UnexcusedNoPost, UnexcusedNoPost));
    }
}
