//! Local persistence and forwarding of canonical batches.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::SinkConfig;
use crate::domain::{AtsSource, CanonicalBatch};

/// Whatever the analysis service reported back; every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analyzed: Option<u64>,
    pub grouped_jobs: Option<u64>,
    pub candidates: Option<Vec<Value>>,
}

impl AnalysisResponse {
    /// Reads known keys from any JSON value, ignoring ones of the wrong type.
    pub fn from_value(body: &Value) -> Self {
        Self {
            analyzed: body.get("analyzed").and_then(Value::as_u64),
            grouped_jobs: body.get("grouped_jobs").and_then(Value::as_u64),
            candidates: body.get("candidates").and_then(Value::as_array).cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ForwardOutcome {
    Delivered(AnalysisResponse),
    Rejected { status: u16, body: String },
    Unreachable { error: String },
}

impl ForwardOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, ForwardOutcome::Delivered(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchReport {
    /// `None` when the local write failed.
    pub persisted_to: Option<PathBuf>,
    pub forward: ForwardOutcome,
}

/// Writes `<source>_data.json` and POSTs the same document downstream.
#[derive(Debug, Clone)]
pub struct SinkDispatcher {
    client: Client,
    analysis_url: String,
    output_dir: PathBuf,
}

impl SinkDispatcher {
    pub fn new(client: Client, config: &SinkConfig) -> Self {
        Self {
            client,
            analysis_url: config.analysis_url.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    pub fn data_path(&self, source: AtsSource) -> PathBuf {
        self.output_dir.join(format!("{}_data.json", source.label()))
    }

    pub fn analysis_path(&self, source: AtsSource) -> PathBuf {
        self.output_dir.join(format!("analyzed_{}.json", source.label()))
    }

    /// Persist then forward. Neither step can fail the caller.
    pub async fn dispatch(&self, source: AtsSource, batch: &CanonicalBatch) -> DispatchReport {
        let persisted_to = self.persist(source, batch);
        let forward = self.forward(source, batch).await;

        DispatchReport {
            persisted_to,
            forward,
        }
    }

    fn persist(&self, source: AtsSource, batch: &CanonicalBatch) -> Option<PathBuf> {
        let path = self.data_path(source);
        let document = match serde_json::to_vec_pretty(batch) {
            Ok(document) => document,
            Err(err) => {
                warn!(%source, error = %err, "failed to encode canonical batch");
                return None;
            }
        };

        match write_file(&path, &document) {
            Ok(()) => {
                info!(
                    %source,
                    path = %path.display(),
                    profiles = batch.profiles.len(),
                    jobs = batch.jobs.len(),
                    applications = batch.applications.len(),
                    "canonical batch written"
                );
                Some(path)
            }
            Err(err) => {
                warn!(%source, path = %path.display(), error = %err, "failed to write canonical batch");
                None
            }
        }
    }

    async fn forward(&self, source: AtsSource, batch: &CanonicalBatch) -> ForwardOutcome {
        info!(%source, url = %self.analysis_url, "forwarding batch to analysis service");

        let response = match self.client.post(&self.analysis_url).json(batch).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%source, url = %self.analysis_url, error = %err, "analysis service unreachable");
                return ForwardOutcome::Unreachable {
                    error: err.to_string(),
                };
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(%source, error = %err, "failed to read analysis response");
                return ForwardOutcome::Unreachable {
                    error: err.to_string(),
                };
            }
        };

        if !status.is_success() {
            warn!(%source, %status, %body, "analysis service rejected batch");
            return ForwardOutcome::Rejected {
                status: status.as_u16(),
                body,
            };
        }

        let parsed = serde_json::from_str::<Value>(&body).ok();
        let analysis = parsed
            .as_ref()
            .map(AnalysisResponse::from_value)
            .unwrap_or_default();
        info!(
            %source,
            analyzed = ?analysis.analyzed,
            grouped_jobs = ?analysis.grouped_jobs,
            "analysis completed"
        );

        self.persist_analysis(source, parsed.as_ref(), &body);
        ForwardOutcome::Delivered(analysis)
    }

    fn persist_analysis(&self, source: AtsSource, parsed: Option<&Value>, raw: &str) {
        let path = self.analysis_path(source);
        let document = parsed
            .and_then(|value| serde_json::to_vec_pretty(value).ok())
            .unwrap_or_else(|| raw.as_bytes().to_vec());

        if let Err(err) = write_file(&path, &document) {
            warn!(%source, path = %path.display(), error = %err, "failed to write analysis response");
        }
    }
}

fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}
