//! Source records to canonical records.
//!
//! Mapping is total: each input record yields exactly one output record, in
//! input order, whatever shape it arrived in.

pub mod fields;

use serde_json::Value;

use crate::domain::{Application, AtsSource, CanonicalBatch, Job, Profile};

/// Explicit mapping from one upstream's record shapes to canonical records.
pub trait RecordAdapter {
    fn source(&self) -> AtsSource;
    fn profile(&self, raw: &Value) -> Profile;
    fn job(&self, raw: &Value) -> Job;
    /// Built from the record's own job sub-object, never from transformed jobs.
    fn application(&self, raw: &Value) -> Application;
}

/// Raw collections exactly as the fetcher returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    pub candidates: Vec<Value>,
    pub jobs: Vec<Value>,
    /// Upstreams with a dedicated applications listing; otherwise
    /// applications are derived from `candidates`.
    pub applications: Option<Vec<Value>>,
}

pub fn transform<A>(adapter: &A, raw: &RawBatch) -> CanonicalBatch
where
    A: RecordAdapter + ?Sized,
{
    let application_source = raw.applications.as_deref().unwrap_or(&raw.candidates);

    CanonicalBatch {
        profiles: raw.candidates.iter().map(|record| adapter.profile(record)).collect(),
        jobs: raw.jobs.iter().map(|record| adapter.job(record)).collect(),
        applications: application_source
            .iter()
            .map(|record| adapter.application(record))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::workable::WorkableAdapter;
    use serde_json::json;

    #[test]
    fn derives_applications_from_candidates_when_no_listing_exists() {
        let raw = RawBatch {
            candidates: vec![json!({ "id": "a" }), json!({ "id": "b" })],
            jobs: vec![json!({ "shortcode": "J1" })],
            applications: None,
        };

        let batch = transform(&WorkableAdapter, &raw);
        assert_eq!(batch.profiles.len(), 2);
        assert_eq!(batch.jobs.len(), 1);
        assert_eq!(batch.applications.len(), 2);
        assert_eq!(batch.applications[1].application_id.as_deref(), Some("b"));
    }

    #[test]
    fn uses_dedicated_application_listing_when_present() {
        let raw = RawBatch {
            candidates: vec![json!({ "id": "a" })],
            jobs: Vec::new(),
            applications: Some(vec![json!({}), json!({}), json!({})]),
        };

        let batch = transform(&WorkableAdapter, &raw);
        assert_eq!(batch.profiles.len(), 1);
        assert_eq!(batch.applications.len(), 3);
    }
}
