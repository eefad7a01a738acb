use serde_json::Value;

use super::{endpoint, AtsConnector};
use crate::domain::{Application, AtsSource, Job, Profile};
use crate::fetch::{CollectionRequest, RecordsAt};
use crate::transform::fields::{join_name, Fields};
use crate::transform::RecordAdapter;

#[derive(Debug, Clone)]
pub struct BambooHrConnector {
    base_url: String,
    token: String,
}

impl BambooHrConnector {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    pub fn default_base_url(subdomain: &str) -> String {
        format!("https://{subdomain}.bamboohr.com/api/v1")
    }
}

impl AtsConnector for BambooHrConnector {
    fn source(&self) -> AtsSource {
        AtsSource::BambooHr
    }

    fn token(&self) -> &str {
        &self.token
    }

    fn adapter(&self) -> &dyn RecordAdapter {
        &BambooHrAdapter
    }

    fn profiles_request(&self) -> CollectionRequest {
        CollectionRequest::new("employees", endpoint(&self.base_url, "employees/directory"))
            .records_at(RecordsAt::Key("employees"))
    }

    fn jobs_request(&self) -> Option<CollectionRequest> {
        Some(CollectionRequest::new(
            "jobs",
            endpoint(&self.base_url, "applicant_tracking/jobs"),
        ))
    }

    fn applications_request(&self) -> Option<CollectionRequest> {
        Some(
            CollectionRequest::new(
                "applications",
                endpoint(&self.base_url, "applicant_tracking/applications"),
            )
            .records_at(RecordsAt::Key("applications"))
            .next_page("/nextPageUrl"),
        )
    }
}

/// Employee directory entries, ATS job openings and ATS applications.
///
/// Most ATS attributes arrive as `{"id": .., "label": ..}` objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct BambooHrAdapter;

impl RecordAdapter for BambooHrAdapter {
    fn source(&self) -> AtsSource {
        AtsSource::BambooHr
    }

    fn profile(&self, raw: &Value) -> Profile {
        let employee = Fields::new(raw);
        let first_name = employee.text("firstName");
        let last_name = employee.text("lastName");
        let name = employee
            .text("displayName")
            .or_else(|| join_name(first_name.as_deref(), last_name.as_deref()));

        Profile {
            id: employee.text("id"),
            candidate_id: employee.text("id"),
            source: AtsSource::BambooHr,
            name,
            first_name,
            last_name,
            email: employee.text_any(&["workEmail", "email"]),
            phone: employee.text_any(&["mobilePhone", "workPhone"]),
            headline: employee.text("jobTitle"),
            summary: None,
            job_id: None,
            job_title: employee.text("jobTitle"),
            stage: None,
            stage_kind: None,
            disqualified: false,
            education: None,
            experience: None,
            social_profiles: None,
            profile_url: None,
            resume_url: None,
            sourced: None,
            created_at: employee.timestamp("hireDate"),
        }
    }

    fn job(&self, raw: &Value) -> Job {
        let job = Fields::new(raw);

        Job {
            job_id: job.text("id"),
            code: None,
            reference: job.text("id"),
            source: AtsSource::BambooHr,
            title: job.label("title"),
            description: job.text("description"),
            requirements: None,
            benefits: None,
            employment_type: job.label("employmentType"),
            department: job.label("department"),
            location: job.label("location"),
            state: job.label("status"),
            url: job.text("postingUrl"),
            created_at: job.timestamp("postedDate"),
        }
    }

    fn application(&self, raw: &Value) -> Application {
        let application = Fields::new(raw);
        let applicant = application.child("applicant");
        let job = application.child("job");

        Application {
            application_id: application.text("id"),
            candidate_id: applicant.text("id"),
            source: AtsSource::BambooHr,
            job_id: job.text("id"),
            stage: application.label("status"),
            stage_kind: None,
            disqualified: false,
            created_at: application.timestamp("appliedDate"),
            job_title: job.label("title"),
            resume_url: None,
            profile_url: None,
        }
    }
}
