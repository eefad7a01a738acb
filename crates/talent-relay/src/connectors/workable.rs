use serde_json::Value;

use super::{endpoint, AtsConnector};
use crate::domain::{Application, AtsSource, Job, Profile};
use crate::fetch::{CollectionRequest, DetailRequest, FieldCopy, RecordsAt};
use crate::transform::fields::Fields;
use crate::transform::RecordAdapter;

/// Detail-only candidate fields merged during enrichment.
const DETAIL_FIELDS: &[FieldCopy] = &[
    FieldCopy::same("resume_url"),
    FieldCopy::same("experience_entries"),
    FieldCopy::same("education_entries"),
    FieldCopy::same("summary"),
    FieldCopy::same("social_profiles"),
];

#[derive(Debug, Clone)]
pub struct WorkableConnector {
    base_url: String,
    token: String,
    page_limit: u32,
}

impl WorkableConnector {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, page_limit: u32) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            page_limit,
        }
    }

    pub fn default_base_url(subdomain: &str) -> String {
        format!("https://{subdomain}.workable.com/spi/v3")
    }
}

impl AtsConnector for WorkableConnector {
    fn source(&self) -> AtsSource {
        AtsSource::Workable
    }

    fn token(&self) -> &str {
        &self.token
    }

    fn adapter(&self) -> &dyn RecordAdapter {
        &WorkableAdapter
    }

    fn profiles_request(&self) -> CollectionRequest {
        CollectionRequest::new("candidates", endpoint(&self.base_url, "candidates"))
            .query("limit", self.page_limit)
            .records_at(RecordsAt::Key("candidates"))
            .next_page("/paging/next")
    }

    fn jobs_request(&self) -> Option<CollectionRequest> {
        Some(
            CollectionRequest::new("jobs", endpoint(&self.base_url, "jobs"))
                .records_at(RecordsAt::Key("jobs"))
                .next_page("/paging/next"),
        )
    }

    fn detail_request(&self) -> Option<DetailRequest> {
        Some(DetailRequest {
            base_url: endpoint(&self.base_url, "candidates"),
            id_field: "id",
            record_at: RecordsAt::Key("candidate"),
            fields: DETAIL_FIELDS,
            resume_field: "resume_url",
        })
    }
}

/// Workable SPI v3 candidate and job shapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkableAdapter;

impl RecordAdapter for WorkableAdapter {
    fn source(&self) -> AtsSource {
        AtsSource::Workable
    }

    fn profile(&self, raw: &Value) -> Profile {
        let candidate = Fields::new(raw);
        let job = candidate.child("job");

        Profile {
            id: candidate.text("id"),
            candidate_id: candidate.text("id"),
            source: AtsSource::Workable,
            name: candidate.text("name"),
            first_name: candidate.text("firstname"),
            last_name: candidate.text("lastname"),
            email: candidate.text("email"),
            phone: candidate.text("phone"),
            headline: candidate.text("headline"),
            summary: candidate.text("summary"),
            job_id: job.text("shortcode"),
            job_title: job.text("title"),
            stage: candidate.text("stage"),
            stage_kind: candidate.text("stage_kind"),
            disqualified: candidate.flag("disqualified").unwrap_or(false),
            education: candidate.list("education_entries"),
            experience: candidate.list("experience_entries"),
            social_profiles: candidate.list("social_profiles"),
            profile_url: candidate.text("profile_url"),
            resume_url: candidate.text("resume_url"),
            sourced: candidate.flag("sourced"),
            created_at: candidate.timestamp("created_at"),
        }
    }

    fn job(&self, raw: &Value) -> Job {
        let job = Fields::new(raw);

        Job {
            job_id: job.text("shortcode"),
            code: job.text("code"),
            reference: job.text("shortcode"),
            source: AtsSource::Workable,
            title: job.text("title"),
            description: job.text("description"),
            requirements: job.text("requirements"),
            benefits: job.text("benefits"),
            employment_type: job.text("employment_type"),
            department: job.text("department"),
            location: job.child("location").text("location_str"),
            state: job.text("state"),
            url: job.text("url"),
            created_at: job.timestamp("created_at"),
        }
    }

    fn application(&self, raw: &Value) -> Application {
        let candidate = Fields::new(raw);
        let job = candidate.child("job");

        Application {
            application_id: candidate.text("id"),
            candidate_id: candidate.text("id"),
            source: AtsSource::Workable,
            job_id: job.text("shortcode"),
            stage: candidate.text("stage"),
            stage_kind: candidate.text("stage_kind"),
            disqualified: candidate.flag("disqualified").unwrap_or(false),
            created_at: candidate.timestamp("created_at"),
            job_title: job.text("title"),
            resume_url: candidate.text("resume_url"),
            profile_url: candidate.text("profile_url"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enriched_candidate() -> Value {
        json!({
            "id": "3fc9a80f",
            "name": "Grace Hopper",
            "firstname": "Grace",
            "lastname": "Hopper",
            "headline": "Compiler engineer",
            "email": "grace@example.com",
            "phone": "+1 555 0100",
            "job": { "shortcode": "GROOV003", "title": "Staff Engineer" },
            "stage": "Interview",
            "stage_kind": "interview",
            "disqualified": false,
            "sourced": true,
            "profile_url": "https://acme.workable.com/backend/candidates/3fc9a80f",
            "created_at": "2025-02-11T14:03:20Z",
            "resume_url": "https://files.workable.com/3fc9a80f.pdf",
            "education_entries": [{ "school": "Yale", "degree": "PhD" }],
            "experience_entries": [{ "company": "US Navy" }],
            "summary": "Built the first compiler.",
            "social_profiles": [{ "type": "linkedin", "url": "https://linkedin.com/in/grace" }]
        })
    }

    #[test]
    fn maps_an_enriched_candidate() {
        let profile = WorkableAdapter.profile(&enriched_candidate());
        assert_eq!(profile.id.as_deref(), Some("3fc9a80f"));
        assert_eq!(profile.candidate_id, profile.id);
        assert_eq!(profile.job_id.as_deref(), Some("GROOV003"));
        assert_eq!(profile.job_title.as_deref(), Some("Staff Engineer"));
        assert_eq!(profile.stage_kind.as_deref(), Some("interview"));
        assert_eq!(profile.education.as_ref().map(Vec::len), Some(1));
        assert_eq!(profile.summary.as_deref(), Some("Built the first compiler."));
        assert_eq!(profile.sourced, Some(true));
        assert_eq!(profile.created_at.as_deref(), Some("2025-02-11T14:03:20Z"));
    }

    #[test]
    fn application_denormalizes_job_title_from_candidate() {
        let application = WorkableAdapter.application(&enriched_candidate());
        assert_eq!(application.application_id.as_deref(), Some("3fc9a80f"));
        assert_eq!(application.job_id.as_deref(), Some("GROOV003"));
        assert_eq!(application.job_title.as_deref(), Some("Staff Engineer"));
        assert_eq!(
            application.resume_url.as_deref(),
            Some("https://files.workable.com/3fc9a80f.pdf")
        );
    }

    #[test]
    fn maps_job_location_string() {
        let job = WorkableAdapter.job(&json!({
            "shortcode": "GROOV003",
            "code": "ENG-7",
            "title": "Staff Engineer",
            "state": "published",
            "location": { "location_str": "Remote, EU", "country": "Germany" },
            "url": "https://apply.workable.com/acme/j/GROOV003"
        }));
        assert_eq!(job.job_id.as_deref(), Some("GROOV003"));
        assert_eq!(job.reference, job.job_id);
        assert_eq!(job.location.as_deref(), Some("Remote, EU"));
        assert!(job.description.is_none());
    }

    #[test]
    fn missing_job_object_leaves_job_fields_empty() {
        let profile = WorkableAdapter.profile(&json!({ "id": "c2", "job": null }));
        assert!(profile.job_id.is_none());
        assert!(profile.job_title.is_none());
        assert!(!profile.disqualified);
    }
}
