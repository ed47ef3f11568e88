use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub(crate) enum Golfer {
    #[sea_orm(iden = "golfers")]
    Table,
    Id,
    FirstName,
    MiddleName,
    LastName,
    Suffix,
    Email,
    Gender,
    MemberNumber,
    GhinNumber,
}

#[derive(DeriveIden)]
pub(crate) enum TeeTime {
    #[sea_orm(iden = "tee_times")]
    Table,
    Id,
    Date,
    GolferId,
    TeeTime,
    PostingStatus,
    ExcuseReason,
}

#[derive(DeriveIden)]
pub(crate) enum ExcludedDate {
    #[sea_orm(iden = "excluded_dates")]
    Table,
    Id,
    Date,
    StartTime,
    EndTime,
    Reason,
}
