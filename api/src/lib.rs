mod authenticate;
mod externally_update_internal;
mod mutation;
mod query;
mod utils;

use rocket_okapi::openapi_get_routes;

#[macro_use]
extern crate rocket;

use dotenvy::dotenv;
use externally_update_internal::*;
use mutation::*;
use query::*;
use rocket::{Build, Rocket, Route};

use rocket_okapi::rapidoc::{make_rapidoc, GeneralConfig, HideShowConfig, RapiDocConfig};
use rocket_okapi::settings::UrlObject;
use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};

pub use authenticate::AdminToken;
pub use service::config::ConfigSource;

#[catch(404)]
fn general_not_found() -> &'static str {
    "Api endpoint not found"
}

pub fn routes() -> Vec<Route> {
    openapi_get_routes![
        check_handicaps,
        cron_check_handicaps,
        list_exclusions,
        exclusions_on_date,
        create_exclusion,
        delete_exclusion,
        list_golfers,
        get_golfer,
        duplicate_golfers,
        golfers_missing,
        create_golfer,
        update_golfer,
        delete_golfer,
        golfer_rounds,
        golfer_stats,
        batch_golfer_stats,
        override_round,
        delete_round,
        posting_history,
        posting_history_csv,
        no_posts,
    ]
}

pub async fn launch() -> Rocket<Build> {
    dotenv().ok();

    let db =
        sea_orm::Database::connect(std::env::var("DATABASE_URL").expect("DATABASE_URL not set"))
            .await
            .expect("Could not connect to database");
    let admin_token = AdminToken::from_env();
    if !admin_token.is_enabled() {
        warn!("ADMIN_TOKEN not set, the api is open to anyone");
    }

    rocket::build()
        .manage(db)
        .manage(admin_token)
        .manage(ConfigSource::from_env())
        .mount("/api", routes())
        .mount(
            "/api/swagger",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("General", "./openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
        .register("/api", catchers![general_not_found])
}
