use log::error;
use rocket::response::Responder;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::{JsonSchema, Map};
use rocket_okapi::response::OpenApiResponderInner;
use sea_orm::DbErr;
use std::fmt::{Debug, Display, Formatter};

use crate::config::ConfigError;

#[derive(Serialize, Deserialize, JsonSchema, Debug, Responder)]
pub enum GenericError {
    #[response(status = 500)]
    UnknownError(&'static str),
    #[response(status = 404)]
    NotFound(&'static str),
    #[response(status = 409)]
    Conflict(&'static str),
    #[response(status = 400)]
    BadRequest(&'static str),
    #[response(status = 401)]
    Unauthorized(&'static str),
    /// Names of the missing configuration values, comma separated
    #[response(status = 500)]
    Configuration(String),
    /// The primary feed could not be read, nothing was reconciled
    #[response(status = 502)]
    UpstreamFeed(String),
}

impl Display for GenericError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GenericError::UnknownError(m)
            | GenericError::NotFound(m)
            | GenericError::Conflict(m)
            | GenericError::BadRequest(m)
            | GenericError::Unauthorized(m) => write!(f, "{m}"),
            GenericError::Configuration(m) => write!(f, "missing configuration: {m}"),
            GenericError::UpstreamFeed(m) => write!(f, "tee sheet unavailable: {m}"),
        }
    }
}

impl From<DbErr> for GenericError {
    fn from(e: DbErr) -> Self {
        match e {
            DbErr::RecordNotFound(_) => GenericError::NotFound("Record not found"),
            e => {
                error!("Database error: {:?}", e);
                GenericError::UnknownError("Unknown DB error")
            }
        }
    }
}

impl From<ConfigError> for GenericError {
    fn from(e: ConfigError) -> Self {
        error!("{}", e);
        GenericError::Configuration(e.missing.join(", "))
    }
}

impl OpenApiResponderInner for GenericError {
    fn responses(_: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse};

        let mut responses = Map::new();
        responses.insert(
            "400".to_string(),
            RefOr::Object(OpenApiResponse {
                description: "\
                # [400 Bad Request](https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/400)\n\
                The request is malformed, usually a date or time that could not be read. \
                "
                .to_string(),
                ..Default::default()
            }),
        );
        responses.insert(
            "401".to_string(),
            RefOr::Object(OpenApiResponse {
                description: "\
                # [401 Unauthorized](https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/401)\n\
                The admin bearer token is missing or wrong. \
                "
                .to_string(),
                ..Default::default()
            }),
        );
        responses.insert(
            "404".to_string(),
            RefOr::Object(OpenApiResponse {
                description: "\
                # [404 Not Found](https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/404)\n\
                The golfer, round or exclusion asked for does not exist.\
                "
                .to_string(),
                ..Default::default()
            }),
        );
        responses.insert(
            "409".to_string(),
            RefOr::Object(OpenApiResponse {
                description: "\
                # [409 Conflict](https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/409)\n\
                The change would clash with existing data, e.g. deleting a golfer that still has rounds. \
                "
                .to_string(),
                ..Default::default()
            }),
        );
        responses.insert(
            "500".to_string(),
            RefOr::Object(OpenApiResponse {
                description: "\
                # [500 Internal Server Error](https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/500)\n\
                Something went wrong on the server, or required configuration is missing. \
                ".to_string(),
                ..Default::default()
            }),
        );
        responses.insert(
            "502".to_string(),
            RefOr::Object(OpenApiResponse {
                description: "\
                # [502 Bad Gateway](https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/502)\n\
                The tee sheet vendor could not be reached, nothing was reconciled. \
                ".to_string(),
                ..Default::default()
            }),
        );
        Ok(Responses {
            responses,
            ..Default::default()
        })
    }
}
