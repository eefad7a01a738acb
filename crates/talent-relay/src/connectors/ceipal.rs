use serde_json::Value;

use super::{endpoint, AtsConnector};
use crate::domain::{Application, AtsSource, Job, Profile};
use crate::fetch::{CollectionRequest, RecordsAt};
use crate::transform::fields::{join_name, Fields};
use crate::transform::RecordAdapter;

pub const DEFAULT_BASE_URL: &str = "https://api.ceipal.com/v1";

#[derive(Debug, Clone)]
pub struct CeipalConnector {
    base_url: String,
    token: String,
    page_limit: u32,
}

impl CeipalConnector {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, page_limit: u32) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            page_limit,
        }
    }
}

impl AtsConnector for CeipalConnector {
    fn source(&self) -> AtsSource {
        AtsSource::Ceipal
    }

    fn token(&self) -> &str {
        &self.token
    }

    fn adapter(&self) -> &dyn RecordAdapter {
        &CeipalAdapter
    }

    fn profiles_request(&self) -> CollectionRequest {
        CollectionRequest::new("candidates", endpoint(&self.base_url, "getCandidateList"))
            .query("limit", self.page_limit)
            .records_at(RecordsAt::Key("results"))
            .next_page("/next")
    }

    fn jobs_request(&self) -> Option<CollectionRequest> {
        Some(
            CollectionRequest::new("jobs", endpoint(&self.base_url, "getJobPostingsList"))
                .query("limit", self.page_limit)
                .records_at(RecordsAt::Key("results"))
                .next_page("/next"),
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CeipalAdapter;

impl RecordAdapter for CeipalAdapter {
    fn source(&self) -> AtsSource {
        AtsSource::Ceipal
    }

    fn profile(&self, raw: &Value) -> Profile {
        let candidate = Fields::new(raw);
        let first_name = candidate.text("first_name");
        let last_name = candidate.text("last_name");
        let name = candidate
            .text("full_name")
            .or_else(|| join_name(first_name.as_deref(), last_name.as_deref()));
        let id = candidate.text_any(&["candidate_id", "id"]);

        Profile {
            id: id.clone(),
            candidate_id: id,
            source: AtsSource::Ceipal,
            name,
            first_name,
            last_name,
            email: candidate.text_any(&["email", "email_address"]),
            phone: candidate.text_any(&["mobile_number", "home_phone_number", "phone"]),
            headline: candidate.text("job_title"),
            summary: candidate.text("summary"),
            job_id: candidate.text_any(&["job_id", "job_code"]),
            job_title: candidate.text("job_title"),
            stage: candidate.text("applicant_status"),
            stage_kind: None,
            disqualified: false,
            education: candidate.list("education"),
            experience: candidate.list("experience"),
            social_profiles: None,
            profile_url: candidate.text("linkedin_profile_url"),
            resume_url: candidate.text_any(&["resume_path", "resume_url"]),
            sourced: None,
            created_at: candidate.timestamp("created_at"),
        }
    }

    fn job(&self, raw: &Value) -> Job {
        let job = Fields::new(raw);
        let location = [job.text("city"), job.text("state"), job.text("country")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        Job {
            job_id: job.text("id"),
            code: job.text("job_code"),
            reference: job.text_any(&["job_code", "id"]),
            source: AtsSource::Ceipal,
            title: job.text_any(&["position_title", "job_title"]),
            description: job.text_any(&["public_job_desc", "requisition_description"]),
            requirements: job.text("skills"),
            benefits: None,
            employment_type: job.text_any(&["employment_type", "job_type"]),
            department: job.text("department"),
            location: (!location.is_empty()).then(|| location.join(", ")),
            state: job.text("job_status"),
            url: job.text("apply_job"),
            created_at: job.timestamp_any(&["created", "created_at"]),
        }
    }

    fn application(&self, raw: &Value) -> Application {
        let candidate = Fields::new(raw);

        Application {
            application_id: candidate.text_any(&["candidate_id", "id"]),
            candidate_id: candidate.text_any(&["candidate_id", "id"]),
            source: AtsSource::Ceipal,
            job_id: candidate.text_any(&["job_id", "job_code"]),
            stage: candidate.text("applicant_status"),
            stage_kind: None,
            disqualified: false,
            created_at: candidate.timestamp("created_at"),
            job_title: candidate.text("job_title"),
            resume_url: candidate.text_any(&["resume_path", "resume_url"]),
            profile_url: candidate.text("linkedin_profile_url"),
        }
    }
}
