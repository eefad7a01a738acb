//! Authenticated upstream reads with rate-limit backoff, pagination and
//! per-record enrichment.

mod enrich;
mod retry;

pub use enrich::{DetailRequest, FieldCopy};
pub use retry::{Attempt, Attempted, RetryPolicy};

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Receives the records a fetch produced.
pub trait RecordCollector {
    fn collect(&mut self, records: Vec<Value>);
}

impl RecordCollector for Vec<Value> {
    fn collect(&mut self, records: Vec<Value>) {
        self.extend(records);
    }
}

/// Where a response body keeps its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordsAt {
    Root,
    Key(&'static str),
}

impl RecordsAt {
    pub(crate) fn extract(self, body: &Value) -> Vec<Value> {
        let found = match self {
            RecordsAt::Root => Some(body),
            RecordsAt::Key(key) => body.get(key),
        };
        match found {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }
}

/// Description of one upstream list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRequest {
    pub label: &'static str,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub records_at: RecordsAt,
    /// JSON pointer to the next page URL in each response body.
    pub next_page: Option<&'static str>,
}

impl CollectionRequest {
    pub fn new(label: &'static str, url: impl Into<String>) -> Self {
        Self {
            label,
            url: url.into(),
            query: Vec::new(),
            records_at: RecordsAt::Root,
            next_page: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn records_at(mut self, records_at: RecordsAt) -> Self {
        self.records_at = records_at;
        self
    }

    pub fn next_page(mut self, pointer: &'static str) -> Self {
        self.next_page = Some(pointer);
        self
    }
}

/// A 429 is the only response the caller may want to repeat.
enum SendResult {
    RateLimited,
    Done(Attempt),
}

pub struct Fetcher {
    client: Client,
    token: String,
    policy: RetryPolicy,
    max_pages: usize,
}

impl Fetcher {
    pub fn with_client(
        client: Client,
        token: impl Into<String>,
        policy: RetryPolicy,
        max_pages: usize,
    ) -> Self {
        Self {
            client,
            token: token.into(),
            policy,
            max_pages: max_pages.max(1),
        }
    }

    /// GET one URL, retrying only on 429.
    pub async fn get_json(&self, url: &str, query: &[(String, String)]) -> Attempted {
        let mut backoff = Vec::new();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let outcome = self.send_once(url, query).await;

            match outcome {
                SendResult::RateLimited => {
                    if attempts >= self.policy.max_attempts() {
                        warn!(
                            %url,
                            attempts,
                            "upstream still rate limited after final attempt"
                        );
                        return Attempted {
                            outcome: Attempt::Exhausted,
                            attempts,
                            backoff,
                        };
                    }

                    let delay = self.policy.delay_before_retry(attempts);
                    info!(
                        %url,
                        attempt = attempts,
                        max_attempts = self.policy.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    backoff.push(delay);
                }
                SendResult::Done(outcome) => {
                    return Attempted {
                        outcome,
                        attempts,
                        backoff,
                    }
                }
            }
        }
    }

    async fn send_once(&self, url: &str, query: &[(String, String)]) -> SendResult {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.token));
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%url, error = %err, "upstream request failed");
                return SendResult::Done(Attempt::Transport(err.to_string()));
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return SendResult::RateLimited;
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            warn!(%url, %status, %body, "upstream rejected request");
            return SendResult::Done(Attempt::Rejected { status, body });
        }

        match response.json::<Value>().await {
            Ok(value) => SendResult::Done(Attempt::Success(value)),
            Err(err) => {
                warn!(%url, error = %err, "upstream returned an unreadable body");
                SendResult::Done(Attempt::Malformed(err.to_string()))
            }
        }
    }

    /// Fetch every page of a collection into `collector`.
    ///
    /// The collector only sees records once every page succeeded; a failed
    /// page yields nothing. Returns how many records were collected.
    pub async fn fetch_into<C>(&self, request: &CollectionRequest, collector: &mut C) -> usize
    where
        C: RecordCollector + ?Sized,
    {
        info!(collection = request.label, url = %request.url, "fetching collection");

        let mut records = Vec::new();
        let mut url = request.url.clone();
        let mut query = request.query.clone();
        let mut pages = 0;

        loop {
            pages += 1;
            let Some(body) = self.get_json(&url, &query).await.into_value() else {
                warn!(
                    collection = request.label,
                    page = pages,
                    "collection fetch failed; returning no records"
                );
                return 0;
            };

            let page = request.records_at.extract(&body);
            debug!(collection = request.label, page = pages, records = page.len(), "page received");
            records.extend(page);

            let Some(link) = request.next_page.and_then(|pointer| next_link(&body, pointer))
            else {
                break;
            };

            if pages >= self.max_pages {
                warn!(
                    collection = request.label,
                    max_pages = self.max_pages,
                    "page limit reached with more pages available"
                );
                break;
            }

            let Some(next) = same_origin_link(&url, &link) else {
                warn!(
                    collection = request.label,
                    next = %link,
                    "next page is on another origin; not sending credentials there"
                );
                break;
            };

            url = next;
            query.clear();
        }

        let count = records.len();
        info!(collection = request.label, count, pages, "collection retrieved");
        collector.collect(records);
        count
    }

    pub async fn fetch_all(&self, request: &CollectionRequest) -> Vec<Value> {
        let mut records = Vec::new();
        self.fetch_into(request, &mut records).await;
        records
    }

    /// One detail request per identified record; see [`DetailRequest`].
    pub async fn enrich(&self, records: Vec<Value>, detail: &DetailRequest) -> Vec<Value> {
        let total = records.len();
        let mut enriched = Vec::with_capacity(total);
        let mut degraded = 0usize;

        for mut record in records {
            let Some(id) = detail.record_id(&record) else {
                enriched.push(record);
                continue;
            };

            let Some(url) = detail.url_for(&id) else {
                degraded += 1;
                warn!(record_id = %id, "record id cannot form a detail URL; resume link left empty");
                detail.mark_missing(&mut record);
                enriched.push(record);
                continue;
            };
            let attempted = self.get_once(&url).await;
            match attempted.into_value() {
                Some(body) => detail.merge(&mut record, &body),
                None => {
                    degraded += 1;
                    warn!(record_id = %id, "detail lookup failed; resume link left empty");
                    detail.mark_missing(&mut record);
                }
            }
            enriched.push(record);
        }

        info!(total, degraded, "finished enriching records");
        enriched
    }

    async fn get_once(&self, url: &str) -> Attempted {
        let outcome = match self.send_once(url, &[]).await {
            SendResult::Done(outcome) => outcome,
            SendResult::RateLimited => Attempt::Rejected {
                status: StatusCode::TOO_MANY_REQUESTS,
                body: String::new(),
            },
        };
        Attempted {
            outcome,
            attempts: 1,
            backoff: Vec::new(),
        }
    }
}

fn next_link(body: &Value, pointer: &str) -> Option<String> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .map(str::to_string)
}

/// Resolves `link` against `current`, keeping it only when scheme, host and
/// port are unchanged.
fn same_origin_link(current: &str, link: &str) -> Option<String> {
    let current = Url::parse(current).ok()?;
    let next = current.join(link).ok()?;
    (next.origin() == current.origin()).then(|| next.to_string())
}
