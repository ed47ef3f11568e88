use crate::macros::*;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

use crate::enums::*;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Golfer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Golfer::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Golfer::FirstName).string().not_null())
                    .col(ColumnDef::new(Golfer::MiddleName).string())
                    .col(ColumnDef::new(Golfer::LastName).string().not_null())
                    .col(ColumnDef::new(Golfer::Suffix).string())
                    .col(ColumnDef::new(Golfer::Email).string())
                    .col(ColumnDef::new(Golfer::Gender).string_len(1))
                    // Not unique, see the duplicates report
                    .col(ColumnDef::new(Golfer::MemberNumber).string())
                    .col(ColumnDef::new(Golfer::GhinNumber).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("golfers_member_number_idx")
                    .table(Golfer::Table)
                    .col(Golfer::MemberNumber)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TeeTime::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeeTime::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TeeTime::Date).date().not_null())
                    .col(ColumnDef::new(TeeTime::GolferId).integer().not_null())
                    .col(ColumnDef::new(TeeTime::TeeTime).string_len(5).not_null())
                    .col(
                        ColumnDef::new(TeeTime::PostingStatus)
                            .string_len(24)
                            .not_null()
                            .default("unexcused_no_post"),
                    )
                    .col(ColumnDef::new(TeeTime::ExcuseReason).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("tee_times_golfer_id_fkey")
                            .from(TeeTime::Table, TeeTime::GolferId)
                            .to(Golfer::Table, Golfer::Id)
                            .on_delete(ForeignKeyAction::NoAction)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("tee_times_date_golfer_id_tee_time_key")
                    .table(TeeTime::Table)
                    .col(TeeTime::Date)
                    .col(TeeTime::GolferId)
                    .col(TeeTime::TeeTime)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_index!("tee_times_date_golfer_id_tee_time_key", TeeTime, manager);
        drop_table!(TeeTime, manager);
        drop_index!("golfers_member_number_idx", Golfer, manager);
        drop_table!(Golfer, manager);
        Ok(())
    }
}
