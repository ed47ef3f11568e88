use rocket::http::ContentType;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use sea_orm::DatabaseConnection;
use service::dto::{BatchStatsRequest, DuplicateGolfers, Exclusion, Golfer, MissingField, Round};
use service::error::GenericError;
use service::report::{self, BatchStat, GolferStats, NoPostReport, PostingHistory, ReportFilter};

use crate::authenticate::Admin;
use crate::utils::{parse_date, yesterday};

#[openapi(tag = "Exclusions")]
#[get("/exclusions")]
pub(crate) async fn list_exclusions(
    db: &State<DatabaseConnection>,
    _admin: Admin,
) -> Result<Json<Vec<Exclusion>>, GenericError> {
    let exclusions = service::all_exclusions(db.inner()).await?;
    Ok(Json(exclusions.into_iter().map(Into::into).collect()))
}

/// Exclusion windows for a single date
#[openapi(tag = "Exclusions")]
#[get("/exclusions/on/<date>")]
pub(crate) async fn exclusions_on_date(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    date: &str,
) -> Result<Json<Vec<Exclusion>>, GenericError> {
    let date = parse_date(Some(date), "Invalid date")?.ok_or(GenericError::BadRequest("Missing date"))?;
    let exclusions = service::exclusions_for_date(db.inner(), date).await?;
    Ok(Json(exclusions.into_iter().map(Into::into).collect()))
}

/// Golfers by name, optionally filtered by a name or member number fragment
#[openapi(tag = "Golfers")]
#[get("/golfers?<search>")]
pub(crate) async fn list_golfers(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    search: Option<String>,
) -> Result<Json<Vec<Golfer>>, GenericError> {
    let golfers = service::search_golfers(db.inner(), search.as_deref()).await?;
    Ok(Json(golfers.into_iter().map(Into::into).collect()))
}

#[openapi(tag = "Golfers")]
#[get("/golfers/<id>")]
pub(crate) async fn get_golfer(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    id: i32,
) -> Result<Json<Golfer>, GenericError> {
    Ok(Json(service::get_golfer(db.inner(), id).await?.into()))
}

/// Golfers sharing a GHIN or member number
#[openapi(tag = "Golfers")]
#[get("/golfers/duplicates")]
pub(crate) async fn duplicate_golfers(
    db: &State<DatabaseConnection>,
    _admin: Admin,
) -> Result<Json<DuplicateGolfers>, GenericError> {
    Ok(Json(service::duplicate_golfers(db.inner()).await?))
}

/// Golfers with no email, GHIN or member number on file
#[openapi(tag = "Golfers")]
#[get("/golfers/missing?<field>")]
pub(crate) async fn golfers_missing(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    field: MissingField,
) -> Result<Json<Vec<Golfer>>, GenericError> {
    let golfers = service::golfers_missing(db.inner(), field).await?;
    Ok(Json(golfers.into_iter().map(Into::into).collect()))
}

/// A golfer's rounds, newest first
#[openapi(tag = "Rounds")]
#[get("/golfers/<id>/rounds?<start_date>&<end_date>")]
pub(crate) async fn golfer_rounds(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    id: i32,
    start_date: Option<String>,
    end_date: Option<String>,
) -> Result<Json<Vec<Round>>, GenericError> {
    let start = parse_date(start_date.as_deref(), "Invalid start date")?;
    let end = parse_date(end_date.as_deref(), "Invalid end date")?;
    service::get_golfer(db.inner(), id).await?;
    let rounds = service::rounds_for_golfer(db.inner(), id, start, end).await?;
    Ok(Json(rounds.into_iter().map(Into::into).collect()))
}

#[openapi(tag = "Reports")]
#[get("/golfers/<id>/stats?<start_date>&<end_date>")]
pub(crate) async fn golfer_stats(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    id: i32,
    start_date: Option<String>,
    end_date: Option<String>,
) -> Result<Json<GolferStats>, GenericError> {
    let start = parse_date(start_date.as_deref(), "Invalid start date")?;
    let end = parse_date(end_date.as_deref(), "Invalid end date")?;
    Ok(Json(report::golfer_stats(db.inner(), id, start, end).await?))
}

/// Posting percentage for each of the given member numbers
#[openapi(tag = "Reports")]
#[post("/golfer-stats/batch", format = "json", data = "<body>")]
pub(crate) async fn batch_golfer_stats(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    body: Json<BatchStatsRequest>,
) -> Result<Json<Vec<BatchStat>>, GenericError> {
    Ok(Json(report::batch_stats(db.inner(), &body.member_numbers).await?))
}

/// Posting history per golfer with a summary, worst posters first
#[openapi(tag = "Reports")]
#[get("/reports/posting-history?<filter..>")]
pub(crate) async fn posting_history(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    filter: ReportFilter,
) -> Result<Json<PostingHistory>, GenericError> {
    Ok(Json(report::posting_history(db.inner(), &filter).await?))
}

#[openapi(skip)]
#[get("/reports/posting-history.csv?<detailed>&<filter..>")]
pub(crate) async fn posting_history_csv(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    detailed: Option<bool>,
    filter: ReportFilter,
) -> Result<(ContentType, String), GenericError> {
    let history = report::posting_history(db.inner(), &filter).await?;
    let csv = if detailed.unwrap_or(false) {
        report::detailed_csv(&history.golfers)?
    } else {
        report::summary_csv(&history.golfers)?
    };
    Ok((ContentType::CSV, csv))
}

/// Unexcused non-posters for a date by gender, defaults to yesterday
#[openapi(tag = "Reports")]
#[get("/reports/no-posts?<date>")]
pub(crate) async fn no_posts(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    date: Option<String>,
) -> Result<Json<NoPostReport>, GenericError> {
    let date = parse_date(date.as_deref(), "Invalid date")?.unwrap_or_else(yesterday);
    Ok(Json(report::no_posts(db.inner(), date).await?))
}
