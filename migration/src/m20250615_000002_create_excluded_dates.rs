use crate::macros::*;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

use crate::enums::ExcludedDate;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExcludedDate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExcludedDate::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExcludedDate::Date).date().not_null())
                    .col(ColumnDef::new(ExcludedDate::StartTime).string_len(5))
                    .col(ColumnDef::new(ExcludedDate::EndTime).string_len(5))
                    .col(ColumnDef::new(ExcludedDate::Reason).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("excluded_dates_date_idx")
                    .table(ExcludedDate::Table)
                    .col(ExcludedDate::Date)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_index!("excluded_dates_date_idx", ExcludedDate, manager);
        drop_table!(ExcludedDate, manager);
        Ok(())
    }
}
