//! Per-ATS endpoint descriptions and record adapters.

pub mod bamboohr;
pub mod ceipal;
pub mod recruitee;
pub mod workable;

use std::time::Duration;

use reqwest::{Client, Url};

use crate::config::{ConfigError, FetchConfig, SourceCredentials};
use crate::domain::AtsSource;
use crate::fetch::{CollectionRequest, DetailRequest};
use crate::transform::RecordAdapter;

pub use bamboohr::{BambooHrAdapter, BambooHrConnector};
pub use ceipal::{CeipalAdapter, CeipalConnector};
pub use recruitee::{RecruiteeAdapter, RecruiteeConnector};
pub use workable::{WorkableAdapter, WorkableConnector};

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Shared client for upstream, sink and status requests.
pub fn http_client(timeout: Duration) -> Result<Client, ConnectorError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Everything the sync runner needs to know about one upstream.
pub trait AtsConnector: Send + Sync {
    fn source(&self) -> AtsSource;
    fn token(&self) -> &str;
    fn adapter(&self) -> &dyn RecordAdapter;

    /// Candidates, or employees for HR systems.
    fn profiles_request(&self) -> CollectionRequest;

    fn jobs_request(&self) -> Option<CollectionRequest>;

    fn applications_request(&self) -> Option<CollectionRequest> {
        None
    }

    fn detail_request(&self) -> Option<DetailRequest> {
        None
    }
}

/// Build the connector for `source`, failing when its token is not configured.
pub fn connector_for(
    source: AtsSource,
    credentials: &SourceCredentials,
    fetch: &FetchConfig,
) -> Result<Box<dyn AtsConnector>, ConfigError> {
    let page_limit = fetch.page_limit;

    let connector: Box<dyn AtsConnector> = match source {
        AtsSource::Workable => {
            let settings = &credentials.workable;
            let token = require(&settings.api_key, "WORKABLE_API_KEY")?;
            let base_url = settings
                .base_url
                .clone()
                .unwrap_or_else(|| WorkableConnector::default_base_url(&settings.subdomain));
            Box::new(WorkableConnector::new(base_url, token, page_limit))
        }
        AtsSource::BambooHr => {
            let settings = &credentials.bamboohr;
            let token = require(&settings.access_token, "ACCESS_TOKEN")?;
            let base_url = settings
                .base_url
                .clone()
                .unwrap_or_else(|| BambooHrConnector::default_base_url(&settings.subdomain));
            Box::new(BambooHrConnector::new(base_url, token))
        }
        AtsSource::Ceipal => {
            let settings = &credentials.ceipal;
            let token = require(&settings.api_token, "CEIPAL_API_TOKEN")?;
            let base_url = settings
                .base_url
                .clone()
                .unwrap_or_else(|| ceipal::DEFAULT_BASE_URL.to_string());
            Box::new(CeipalConnector::new(base_url, token, page_limit))
        }
        AtsSource::Recruitee => {
            let settings = &credentials.recruitee;
            let token = require(&settings.api_token, "RECRUITEE_API_TOKEN")?;
            let base_url = settings
                .base_url
                .clone()
                .unwrap_or_else(|| RecruiteeConnector::default_base_url(&settings.company_id));
            Box::new(RecruiteeConnector::new(base_url, token, page_limit))
        }
    };

    Ok(connector)
}

fn require(value: &Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value
        .clone()
        .ok_or(ConfigError::MissingCredential { key })
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Appends each segment percent-encoded, so `/`, `?` and `#` inside an id stay
/// part of that one segment.
///
/// `None` when `base_url` cannot carry a path, or a segment is empty, `.` or `..`.
pub(crate) fn endpoint_with_segments(base_url: &str, segments: &[&str]) -> Option<String> {
    if segments
        .iter()
        .any(|segment| matches!(*segment, "" | "." | ".."))
    {
        return None;
    }

    let mut url = Url::parse(base_url).ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(segments);
    Some(url.to_string())
}
