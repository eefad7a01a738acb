//! Receiving end of the relay: groups applications by job and scores each
//! applicant.

mod router;
mod scoring;

pub use router::{analysis_router, AnalysisService};
pub use scoring::{CandidateScorer, HeuristicScorer, ScoringInput};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transform::fields::{join_name, Fields};

pub const STRONG_FIT_THRESHOLD: u8 = 70;
pub const REJECT_THRESHOLD: u8 = 30;

/// BambooHR pipeline status ids proposed after scoring.
pub const STATUS_NEW: u32 = 1;
pub const STATUS_INTERVIEW: u32 = 3;
pub const STATUS_REJECTED: u32 = 5;

/// Any JSON object with these keys; missing keys read as empty lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default, deserialize_with = "list_or_empty")]
    pub profiles: Vec<Value>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub jobs: Vec<Value>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub applications: Vec<Value>,
}

fn list_or_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    pub candidate_id: Option<String>,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateAnalysis {
    pub job_id: Option<String>,
    pub job_name: String,
    pub candidate: CandidateSummary,
    pub ai_score: u8,
    pub recommendation: &'static str,
    pub application_id: Option<String>,
    pub source: Option<String>,
    pub proposed_status: u32,
    pub resume_url: Option<String>,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub analyzed: usize,
    pub grouped_jobs: usize,
    pub candidates: Vec<CandidateAnalysis>,
}

/// Result of scoring a single candidate document outside any batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateVerdict {
    pub candidate: String,
    pub ai_score: u8,
    pub recommendation: &'static str,
    pub feedback: String,
}

pub fn recommendation(score: u8) -> &'static str {
    if score > STRONG_FIT_THRESHOLD {
        "Strong Fit"
    } else {
        "Consider"
    }
}

pub fn proposed_status(score: u8) -> u32 {
    if score > STRONG_FIT_THRESHOLD {
        STATUS_INTERVIEW
    } else if score < REJECT_THRESHOLD {
        STATUS_REJECTED
    } else {
        STATUS_NEW
    }
}

pub fn analyze(request: &AnalysisRequest, scorer: &dyn CandidateScorer) -> AnalysisReport {
    let jobs = index_by(&request.jobs, &["job_id", "id", "code", "reference"]);
    let profiles = index_by(&request.profiles, &["id", "candidate_id", "employee_id"]);
    let groups = group_by_job(&request.applications);
    let empty = Value::Null;

    let mut candidates = Vec::with_capacity(request.applications.len());
    for (job_id, applications) in &groups {
        let job = job_id
            .as_deref()
            .and_then(|id| jobs.get(id).copied())
            .unwrap_or(&empty);
        let job_fields = Fields::new(job);

        for &application in applications {
            let application_fields = Fields::new(application);
            let candidate_id = application_fields.text_any(&["candidate_id", "employee_id"]);
            let candidate = candidate_id
                .as_deref()
                .and_then(|id| profiles.get(id).copied())
                .unwrap_or(application);
            let candidate_fields = Fields::new(candidate);

            let score = scorer.score(&ScoringInput {
                candidate: candidate_fields,
                application: application_fields,
                job: job_fields,
            });

            candidates.push(CandidateAnalysis {
                job_id: job_id.clone(),
                job_name: job_fields
                    .text_any(&["title", "job_title", "name"])
                    .or_else(|| application_fields.text("job_title"))
                    .unwrap_or_else(|| "Unknown Job".to_string()),
                candidate: CandidateSummary {
                    candidate_id,
                    name: display_name(&candidate_fields),
                    email: candidate_fields
                        .text_any(&["email", "work_email"])
                        .unwrap_or_else(|| "N/A".to_string()),
                },
                ai_score: score,
                recommendation: recommendation(score),
                application_id: application_fields.text("application_id"),
                source: application_fields.text("source"),
                proposed_status: proposed_status(score),
                resume_url: candidate_fields
                    .text("resume_url")
                    .or_else(|| application_fields.text("resume_url")),
                profile_url: candidate_fields
                    .text("profile_url")
                    .or_else(|| application_fields.text("profile_url")),
            });
        }
    }

    AnalysisReport {
        analyzed: candidates.len(),
        grouped_jobs: groups.len(),
        candidates,
    }
}

/// Scores one candidate with no job context. The document stands in for the
/// application as well, so stage and disqualification fields still count.
pub fn process(candidate: &Value, scorer: &dyn CandidateScorer) -> CandidateVerdict {
    let empty = Value::Null;
    let fields = Fields::new(candidate);
    let score = scorer.score(&ScoringInput {
        candidate: fields,
        application: fields,
        job: Fields::new(&empty),
    });

    let name = fields.text("name").or_else(|| {
        join_name(
            fields.text("first_name").as_deref(),
            fields.text("last_name").as_deref(),
        )
    });
    CandidateVerdict {
        feedback: format!(
            "AI analysis complete for {}.",
            name.as_deref().unwrap_or("candidate")
        ),
        candidate: name.unwrap_or_else(|| "Unknown".to_string()),
        ai_score: score,
        recommendation: if score > STRONG_FIT_THRESHOLD {
            "Strong Fit"
        } else {
            "Needs Review"
        },
    }
}

fn display_name(candidate: &Fields<'_>) -> String {
    match (candidate.text("first_name"), candidate.text("last_name")) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        _ => candidate
            .text("name")
            .unwrap_or_else(|| "Unknown Candidate".to_string()),
    }
}

/// First record wins for each key.
fn index_by<'a>(records: &'a [Value], keys: &[&str]) -> HashMap<String, &'a Value> {
    let mut index = HashMap::new();
    for record in records {
        let fields = Fields::new(record);
        for key in keys {
            if let Some(id) = fields.text(key) {
                index.entry(id).or_insert(record);
            }
        }
    }
    index
}

/// Groups in first-seen order; applications without a job share one group.
fn group_by_job(applications: &[Value]) -> Vec<(Option<String>, Vec<&Value>)> {
    let mut groups: Vec<(Option<String>, Vec<&Value>)> = Vec::new();
    for application in applications {
        let fields = Fields::new(application);
        let job_id = fields
            .text("job_id")
            .or_else(|| fields.child("job").text("id"));

        match groups.iter_mut().find(|(id, _)| *id == job_id) {
            Some((_, members)) => members.push(application),
            None => groups.push((job_id, vec![application])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedScorer(u8);

    impl CandidateScorer for FixedScorer {
        fn score(&self, _input: &ScoringInput<'_>) -> u8 {
            self.0
        }
    }

    fn request() -> AnalysisRequest {
        serde_json::from_value(json!({
            "profiles": [
                { "id": "c1", "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com" },
                { "id": "c2", "name": "Alan Turing" }
            ],
            "jobs": [
                { "job_id": "J1", "title": "Analyst" },
                { "job_id": "J2", "title": "Cryptographer" }
            ],
            "applications": [
                { "application_id": "a1", "candidate_id": "c1", "job_id": "J1" },
                { "application_id": "a2", "candidate_id": "c2", "job_id": "J2" },
                { "application_id": "a3", "candidate_id": "c9", "job_id": "J1", "name": "Grace" },
                { "application_id": "a4" }
            ]
        }))
        .expect("request parses")
    }

    #[test]
    fn groups_by_job_in_first_seen_order() {
        let report = analyze(&request(), &FixedScorer(50));
        assert_eq!(report.analyzed, 4);
        assert_eq!(report.grouped_jobs, 3);

        let order: Vec<_> = report
            .candidates
            .iter()
            .map(|c| c.application_id.as_deref().unwrap_or("-"))
            .collect();
        assert_eq!(order, vec!["a1", "a3", "a2", "a4"]);
    }

    #[test]
    fn resolves_candidates_and_falls_back_to_application() {
        let report = analyze(&request(), &FixedScorer(50));
        let by_app = |id: &str| {
            report
                .candidates
                .iter()
                .find(|c| c.application_id.as_deref() == Some(id))
                .expect("application analysed")
        };

        assert_eq!(by_app("a1").candidate.name, "Ada Lovelace");
        assert_eq!(by_app("a1").candidate.email, "ada@example.com");
        assert_eq!(by_app("a1").job_name, "Analyst");
        assert_eq!(by_app("a2").candidate.name, "Alan Turing");
        assert_eq!(by_app("a2").candidate.email, "N/A");
        assert_eq!(by_app("a3").candidate.name, "Grace");
        assert_eq!(by_app("a4").candidate.name, "Unknown Candidate");
        assert_eq!(by_app("a4").job_name, "Unknown Job");
        assert!(by_app("a4").job_id.is_none());
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(recommendation(71), "Strong Fit");
        assert_eq!(recommendation(70), "Consider");
        assert_eq!(proposed_status(71), STATUS_INTERVIEW);
        assert_eq!(proposed_status(70), STATUS_NEW);
        assert_eq!(proposed_status(30), STATUS_NEW);
        assert_eq!(proposed_status(29), STATUS_REJECTED);
    }

    #[test]
    fn single_candidate_verdict_uses_its_own_labels() {
        let strong = process(&json!({ "name": "Ada Lovelace" }), &FixedScorer(90));
        assert_eq!(strong.candidate, "Ada Lovelace");
        assert_eq!(strong.recommendation, "Strong Fit");
        assert_eq!(strong.feedback, "AI analysis complete for Ada Lovelace.");

        let anonymous = process(&json!({ "email": "x@example.com" }), &FixedScorer(70));
        assert_eq!(anonymous.candidate, "Unknown");
        assert_eq!(anonymous.recommendation, "Needs Review");
        assert_eq!(anonymous.feedback, "AI analysis complete for candidate.");

        let joined = process(
            &json!({ "first_name": "Grace", "last_name": "Hopper" }),
            &HeuristicScorer::default(),
        );
        assert_eq!(joined.candidate, "Grace Hopper");
        assert_eq!(joined.ai_score, 20);
    }

    #[test]
    fn missing_or_malformed_keys_read_as_empty() {
        let request: AnalysisRequest =
            serde_json::from_value(json!({ "profiles": "nope", "applications": null }))
                .expect("permissive parse");
        assert_eq!(request, AnalysisRequest::default());

        let report = analyze(&request, &HeuristicScorer::default());
        assert_eq!(report, AnalysisReport::default());
    }
}
