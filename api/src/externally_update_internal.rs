use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use sea_orm::DatabaseConnection;
use service::config::ConfigSource;
use service::dto::CheckHandicaps;
use service::error::GenericError;
use service::reconcile::{run_reconciliation, RunReport};

use crate::authenticate::Admin;
use crate::utils::{parse_date, yesterday};

/// Reconciles one date against the tee sheet and the posting report
///
/// Also used to back-load older dates. Configuration is read before anything is fetched;
/// missing values are listed in the error.
#[openapi(tag = "Reconciliation")]
#[post("/check-handicaps", format = "json", data = "<body>")]
pub(crate) async fn check_handicaps(
    db: &State<DatabaseConnection>,
    source: &State<ConfigSource>,
    _admin: Admin,
    body: Json<CheckHandicaps>,
) -> Result<Json<RunReport>, GenericError> {
    let config = source.load()?;
    run_reconciliation(db.inner(), &config, body.date)
        .await
        .map(Json)
}

/// Scheduled run, defaults to yesterday
#[openapi(tag = "Reconciliation")]
#[get("/cron/check-handicaps?<date>")]
pub(crate) async fn cron_check_handicaps(
    db: &State<DatabaseConnection>,
    source: &State<ConfigSource>,
    _admin: Admin,
    date: Option<String>,
) -> Result<Json<RunReport>, GenericError> {
    let date = parse_date(date.as_deref(), "Invalid date")?.unwrap_or_else(yesterday);
    let config = source.load()?;
    run_reconciliation(db.inner(), &config, date)
        .await
        .map(Json)
}
