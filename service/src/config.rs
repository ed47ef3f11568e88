//! Run-time configuration, read from the environment when a run is triggered.

use std::env;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use crate::feeds::gmail::OAuthCredentials;
use crate::feeds::{GmailClient, MtechClient, ReportLocator};

pub const MTECH_API_KEY: &str = "MTECH_API_KEY";
pub const GOOGLE_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
pub const GOOGLE_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";
pub const GOOGLE_REFRESH_TOKEN: &str = "GOOGLE_REFRESH_TOKEN";

const REQUIRED: [&str; 4] = [
    MTECH_API_KEY,
    GOOGLE_CLIENT_ID,
    GOOGLE_CLIENT_SECRET,
    GOOGLE_REFRESH_TOKEN,
];

const DEFAULT_MTECH_BASE_URL: &str = "https://www.clubmtech.com";
const DEFAULT_GMAIL_BASE_URL: &str = "https://gmail.googleapis.com";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_REPORT_SENDER: &str = "reporting@ghin.com";
const DEFAULT_REPORT_SUBJECT: &str =
    "Auto-Generated Scheduled Report - Played / Posted Report (Player Rounds)";
const DEFAULT_ATTACHMENT_MARKER: &str = "played";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub missing: Vec<&'static str>,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "missing configuration: {}", self.missing.join(", "))
    }
}

impl std::error::Error for ConfigError {}

/// Everything a reconciliation run needs to reach the two feeds.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mtech_base_url: String,
    pub mtech_api_key: String,
    pub gmail_base_url: String,
    pub token_url: String,
    pub credentials: OAuthCredentials,
    pub report: ReportLocator,
    pub timeout: Duration,
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any name lookup; every missing required name is reported at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or_default = |name: &str, default: &str| value(name).unwrap_or_else(|| default.to_string());

        let missing: Vec<&'static str> = REQUIRED
            .into_iter()
            .filter(|name| value(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError { missing });
        }
        let required = |name: &str| value(name).unwrap_or_default();

        let timeout = value("HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            mtech_base_url: or_default("MTECH_BASE_URL", DEFAULT_MTECH_BASE_URL),
            mtech_api_key: required(MTECH_API_KEY),
            gmail_base_url: or_default("GMAIL_BASE_URL", DEFAULT_GMAIL_BASE_URL),
            token_url: or_default("GOOGLE_TOKEN_URL", DEFAULT_TOKEN_URL),
            credentials: OAuthCredentials {
                client_id: required(GOOGLE_CLIENT_ID),
                client_secret: required(GOOGLE_CLIENT_SECRET),
                refresh_token: required(GOOGLE_REFRESH_TOKEN),
            },
            report: ReportLocator {
                sender: or_default("GHIN_REPORT_SENDER", DEFAULT_REPORT_SENDER),
                subject: or_default("GHIN_REPORT_SUBJECT", DEFAULT_REPORT_SUBJECT),
                attachment_marker: or_default("GHIN_ATTACHMENT_MARKER", DEFAULT_ATTACHMENT_MARKER),
            },
            timeout: Duration::from_secs(timeout),
        })
    }

    pub fn mtech_client(&self) -> MtechClient {
        MtechClient::new(&self.mtech_base_url, &self.mtech_api_key, self.timeout)
    }

    pub fn gmail_client(&self) -> GmailClient {
        GmailClient::new(
            &self.gmail_base_url,
            &self.token_url,
            self.credentials.clone(),
            self.timeout,
        )
    }
}

type Loader = dyn Fn() -> Result<RunConfig, ConfigError> + Send + Sync;

/// Where a trigger gets its [`RunConfig`] from. Read on every run so a changed environment
/// is picked up without a restart.
pub struct ConfigSource(Box<Loader>);

impl ConfigSource {
    pub fn new(loader: impl Fn() -> Result<RunConfig, ConfigError> + Send + Sync + 'static) -> Self {
        Self(Box::new(loader))
    }

    pub fn from_env() -> Self {
        Self(Box::new(RunConfig::from_env))
    }

    pub fn fixed(config: RunConfig) -> Self {
        Self(Box::new(move || Ok(config.clone())))
    }

    pub fn load(&self) -> Result<RunConfig, ConfigError> {
        (self.0)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn lists_every_missing_name() {
        let err = RunConfig::from_lookup(lookup(&[(GOOGLE_CLIENT_ID, "id"), (MTECH_API_KEY, "  ")]))
            .unwrap_err();
        assert_eq!(
            err.missing,
            vec![MTECH_API_KEY, GOOGLE_CLIENT_SECRET, GOOGLE_REFRESH_TOKEN]
        );
        assert!(err.to_string().contains("GOOGLE_REFRESH_TOKEN"));
    }

    #[test]
    fn defaults_fill_optional_values() {
        let config = RunConfig::from_lookup(lookup(&[
            (MTECH_API_KEY, "key"),
            (GOOGLE_CLIENT_ID, "id"),
            (GOOGLE_CLIENT_SECRET, "secret"),
            (GOOGLE_REFRESH_TOKEN, "refresh"),
            ("HTTP_TIMEOUT_SECS", "5"),
            ("GHIN_ATTACHMENT_MARKER", "posted"),
        ]))
        .unwrap();
        assert_eq!(config.mtech_base_url, DEFAULT_MTECH_BASE_URL);
        assert_eq!(config.report.sender, DEFAULT_REPORT_SENDER);
        assert_eq!(config.report.attachment_marker, "posted");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
