//! One source, start to finish: fetch, transform, dispatch.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{AppConfig, FetchConfig, SourceCredentials};
use crate::connectors::{connector_for, http_client, AtsConnector, ConnectorError};
use crate::domain::AtsSource;
use crate::error::AppError;
use crate::fetch::Fetcher;
use crate::sink::{DispatchReport, SinkDispatcher};
use crate::transform::{transform, RawBatch};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub source: AtsSource,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub profiles: usize,
    pub jobs: usize,
    pub applications: usize,
    pub dispatch: DispatchReport,
}

pub struct SyncRunner {
    client: Client,
    fetch: FetchConfig,
    dispatcher: SinkDispatcher,
}

impl SyncRunner {
    pub fn new(client: Client, fetch: FetchConfig, dispatcher: SinkDispatcher) -> Self {
        Self {
            client,
            fetch,
            dispatcher,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConnectorError> {
        let client = http_client(config.fetch.request_timeout)?;
        let dispatcher = SinkDispatcher::new(client.clone(), &config.sink);
        Ok(Self::new(client, config.fetch.clone(), dispatcher))
    }

    /// Runs every stage in order. Stage failures are logged and leave that
    /// stage's output empty; the run itself always completes.
    pub async fn run(&self, connector: &dyn AtsConnector) -> RunSummary {
        let source = connector.source();
        let started_at = Utc::now();
        info!(%source, "sync started");

        let fetcher = Fetcher::with_client(
            self.client.clone(),
            connector.token(),
            self.fetch.retry_policy(),
            self.fetch.max_pages,
        );

        let mut candidates = fetcher.fetch_all(&connector.profiles_request()).await;
        if let Some(detail) = connector.detail_request() {
            candidates = fetcher.enrich(candidates, &detail).await;
        }
        if candidates.is_empty() {
            warn!(%source, "no candidates retrieved");
        }

        let jobs = match connector.jobs_request() {
            Some(request) => fetcher.fetch_all(&request).await,
            None => Vec::new(),
        };

        let applications = match connector.applications_request() {
            Some(request) => Some(fetcher.fetch_all(&request).await),
            None => None,
        };

        let raw = RawBatch {
            candidates,
            jobs,
            applications,
        };
        let batch = transform(connector.adapter(), &raw);
        info!(
            %source,
            profiles = batch.profiles.len(),
            jobs = batch.jobs.len(),
            applications = batch.applications.len(),
            "records transformed"
        );

        let dispatch = self.dispatcher.dispatch(source, &batch).await;
        let finished_at = Utc::now();
        info!(
            %source,
            delivered = dispatch.forward.is_delivered(),
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "sync finished"
        );

        RunSummary {
            source,
            started_at,
            finished_at,
            profiles: batch.profiles.len(),
            jobs: batch.jobs.len(),
            applications: batch.applications.len(),
            dispatch,
        }
    }
}

/// Builds connectors from configured credentials and runs them on request.
pub struct SyncService {
    runner: SyncRunner,
    sources: SourceCredentials,
}

impl SyncService {
    pub fn new(runner: SyncRunner, sources: SourceCredentials) -> Self {
        Self { runner, sources }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConnectorError> {
        Ok(Self::new(
            SyncRunner::from_config(config)?,
            config.sources.clone(),
        ))
    }

    /// Fails only when the source has no credentials; the run itself never does.
    pub async fn run_source(&self, source: AtsSource) -> Result<RunSummary, AppError> {
        let connector = connector_for(source, &self.sources, &self.runner.fetch)?;
        Ok(self.runner.run(connector.as_ref()).await)
    }
}

/// `POST /sync/:source` runs one source and answers with its [`RunSummary`].
pub fn sync_router(service: Arc<SyncService>) -> Router {
    Router::new()
        .route("/sync/:source", post(sync_handler))
        .with_state(service)
}

async fn sync_handler(
    State(service): State<Arc<SyncService>>,
    Path(source): Path<String>,
) -> Result<Json<RunSummary>, AppError> {
    let source: AtsSource = source.parse()?;
    info!(%source, "sync requested over HTTP");
    Ok(Json(service.run_source(source).await?))
}
