use std::env;
fn main() {
    dotenvy::dotenv().ok();

    // Needed at launch; the rest are read when a reconciliation run is triggered
    let required_vars = [
        "DATABASE_URL",
        "MTECH_API_KEY",
        "GOOGLE_CLIENT_ID",
        "GOOGLE_CLIENT_SECRET",
        "GOOGLE_REFRESH_TOKEN",
    ];

    for &var in &required_vars {
        if env::var(var).is_err() {
            println!("cargo:warning=Required environment variable {} is not set.", var);
        }
    }
    println!("cargo:rerun-if-changed=.env");
}
