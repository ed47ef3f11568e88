use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest};
use rocket::Request;
use rocket_okapi::request::OpenApiFromRequest;
use service::error::GenericError;

/// Shared secret for the admin api, from `ADMIN_TOKEN`. When unset every request is let
/// through.
#[derive(Debug, Clone, Default)]
pub struct AdminToken(Option<String>);

impl AdminToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn from_env() -> Self {
        Self(
            std::env::var("ADMIN_TOKEN")
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }

    fn accepts(&self, header: Option<&str>) -> bool {
        match &self.0 {
            None => true,
            Some(expected) => header
                .and_then(|h| h.strip_prefix("Bearer "))
                .is_some_and(|given| given.trim() == expected),
        }
    }
}

/// Request guard for every admin route.
#[derive(OpenApiFromRequest, Debug)]
pub struct Admin;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Admin {
    type Error = GenericError;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Some(token) = request.rocket().state::<AdminToken>() else {
            return Outcome::Error((
                Status::InternalServerError,
                GenericError::UnknownError("Admin token not configured"),
            ));
        };
        if token.accepts(request.headers().get_one("Authorization")) {
            Outcome::Success(Admin)
        } else {
            Outcome::Error((
                Status::Unauthorized,
                GenericError::Unauthorized("Missing or wrong admin token"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_must_match() {
        let token = AdminToken::new("s3cret");
        assert!(token.accepts(Some("Bearer s3cret")));
        assert!(!token.accepts(Some("Bearer nope")));
        assert!(!token.accepts(Some("s3cret")));
        assert!(!token.accepts(None));
    }

    #[test]
    fn no_token_means_open() {
        assert!(AdminToken::disabled().accepts(None));
    }
}
