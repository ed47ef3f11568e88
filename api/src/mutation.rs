use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use sea_orm::DatabaseConnection;
use service::dto::{Exclusion, Golfer, GolferForm, NewExclusion, Round, RoundOverride};
use service::error::GenericError;

use crate::authenticate::Admin;

/// Adds an exclusion window
///
/// No times excludes the whole day. Times are stored as 24 hour `HH:MM`.
#[openapi(tag = "Exclusions")]
#[post("/exclusions", format = "json", data = "<exclusion>")]
pub(crate) async fn create_exclusion(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    exclusion: Json<NewExclusion>,
) -> Result<Json<Exclusion>, GenericError> {
    let created = exclusion.into_inner().insert(db.inner()).await?;
    Ok(Json(created.into()))
}

#[openapi(tag = "Exclusions")]
#[delete("/exclusions/<id>")]
pub(crate) async fn delete_exclusion(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    id: i32,
) -> Result<Status, GenericError> {
    service::delete_exclusion(db.inner(), id).await?;
    Ok(Status::NoContent)
}

#[openapi(tag = "Golfers")]
#[post("/golfers", format = "json", data = "<golfer>")]
pub(crate) async fn create_golfer(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    golfer: Json<GolferForm>,
) -> Result<Json<Golfer>, GenericError> {
    Ok(Json(golfer.into_inner().insert(db.inner()).await?.into()))
}

#[openapi(tag = "Golfers")]
#[put("/golfers/<id>", format = "json", data = "<golfer>")]
pub(crate) async fn update_golfer(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    id: i32,
    golfer: Json<GolferForm>,
) -> Result<Json<Golfer>, GenericError> {
    Ok(Json(golfer.into_inner().update(db.inner(), id).await?.into()))
}

/// Deletes a golfer
///
/// Refused with 409 while the golfer has rounds, unless `cascade=true`.
#[openapi(tag = "Golfers")]
#[delete("/golfers/<id>?<cascade>")]
pub(crate) async fn delete_golfer(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    id: i32,
    cascade: Option<bool>,
) -> Result<Status, GenericError> {
    service::delete_golfer(db.inner(), id, cascade.unwrap_or(false)).await?;
    Ok(Status::NoContent)
}

/// Sets a round's posting status by hand
#[openapi(tag = "Rounds")]
#[put("/rounds/<id>", format = "json", data = "<change>")]
pub(crate) async fn override_round(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    id: i32,
    change: Json<RoundOverride>,
) -> Result<Json<Round>, GenericError> {
    Ok(Json(service::override_round(db.inner(), id, change.into_inner()).await?.into()))
}

#[openapi(tag = "Rounds")]
#[delete("/rounds/<id>")]
pub(crate) async fn delete_round(
    db: &State<DatabaseConnection>,
    _admin: Admin,
    id: i32,
) -> Result<Status, GenericError> {
    service::delete_round(db.inner(), id).await?;
    Ok(Status::NoContent)
}
