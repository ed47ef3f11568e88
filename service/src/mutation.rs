use chrono::NaiveDate;
use entity::prelude::*;
use entity::sea_orm_active_enums::PostingStatus;
use entity::*;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, TransactionTrait,
};

use crate::dto::RoundOverride;
use crate::error::GenericError;

/// A classified round ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundUpsert {
    pub date: NaiveDate,
    pub golfer_id: i32,
    pub tee_time: String,
    pub posting_status: PostingStatus,
    pub excuse_reason: Option<String>,
}

impl RoundUpsert {
    fn into_active_model(self) -> tee_time::ActiveModel {
        tee_time::ActiveModel {
            id: NotSet,
            date: Set(self.date),
            golfer_id: Set(self.golfer_id),
            tee_time: Set(self.tee_time),
            posting_status: Set(self.posting_status),
            excuse_reason: Set(self.excuse_reason),
        }
    }

    /// Inserts the round or rewrites the status of the one already stored for the same
    /// date, golfer and tee time. A stored `posted` round is left as it is.
    pub async fn upsert(self, db: &impl ConnectionTrait) -> Result<(), DbErr> {
        TeeTime::insert(self.into_active_model())
            .on_conflict(
                OnConflict::columns([
                    tee_time::Column::Date,
                    tee_time::Column::GolferId,
                    tee_time::Column::TeeTime,
                ])
                .update_columns([
                    tee_time::Column::PostingStatus,
                    tee_time::Column::ExcuseReason,
                ])
                .action_and_where(
                    Expr::col((TeeTime, tee_time::Column::PostingStatus))
                        .ne(PostingStatus::Posted.to_value()),
                )
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
        Ok(())
    }
}

pub async fn delete_exclusion(db: &impl ConnectionTrait, id: i32) -> Result<(), GenericError> {
    let result = ExcludedDate::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(GenericError::NotFound("Exclusion not found"));
    }
    Ok(())
}

/// Deletes a golfer. Their rounds go too when `cascade` is set, otherwise a golfer with
/// rounds is refused.
pub async fn delete_golfer(
    db: &DatabaseConnection,
    id: i32,
    cascade: bool,
) -> Result<(), GenericError> {
    let txn = db.begin().await?;
    let golfer = crate::get_golfer(&txn, id).await?;
    let rounds = TeeTime::find()
        .filter(tee_time::Column::GolferId.eq(id))
        .count(&txn)
        .await?;
    if rounds > 0 {
        if !cascade {
            return Err(GenericError::Conflict("Golfer still has rounds"));
        }
        TeeTime::delete_many()
            .filter(tee_time::Column::GolferId.eq(id))
            .exec(&txn)
            .await?;
    }
    golfer.into_active_model().delete(&txn).await?;
    txn.commit().await?;
    Ok(())
}

/// Manual status edit. The excuse reason only survives on excused rounds.
pub async fn override_round(
    db: &impl ConnectionTrait,
    id: i32,
    change: RoundOverride,
) -> Result<tee_time::Model, GenericError> {
    let round = TeeTime::find_by_id(id)
        .one(db)
        .await?
        .ok_or(GenericError::NotFound("Round not found"))?;
    let status: PostingStatus = change.posting_status.into();
    let reason = match status {
        PostingStatus::ExcusedNoPost => change
            .excuse_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
        _ => None,
    };
    let mut round = round.into_active_model();
    round.posting_status = Set(status);
    round.excuse_reason = Set(reason);
    Ok(round.update(db).await?)
}

pub async fn delete_round(db: &impl ConnectionTrait, id: i32) -> Result<(), GenericError> {
    let result = TeeTime::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(GenericError::NotFound("Round not found"));
    }
    Ok(())
}
