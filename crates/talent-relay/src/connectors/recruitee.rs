use serde_json::Value;

use super::{endpoint, AtsConnector};
use crate::domain::{Application, AtsSource, Job, Profile};
use crate::fetch::{CollectionRequest, DetailRequest, FieldCopy, RecordsAt};
use crate::transform::fields::Fields;
use crate::transform::RecordAdapter;

const DETAIL_FIELDS: &[FieldCopy] = &[
    FieldCopy::same("cv_url"),
    FieldCopy::same("fields"),
    FieldCopy::same("social_links"),
    FieldCopy {
        from: "cover_letter",
        to: "summary",
    },
];

#[derive(Debug, Clone)]
pub struct RecruiteeConnector {
    base_url: String,
    token: String,
    page_limit: u32,
}

impl RecruiteeConnector {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, page_limit: u32) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            page_limit,
        }
    }

    pub fn default_base_url(company_id: &str) -> String {
        format!("https://api.recruitee.com/c/{company_id}")
    }
}

impl AtsConnector for RecruiteeConnector {
    fn source(&self) -> AtsSource {
        AtsSource::Recruitee
    }

    fn token(&self) -> &str {
        &self.token
    }

    fn adapter(&self) -> &dyn RecordAdapter {
        &RecruiteeAdapter
    }

    fn profiles_request(&self) -> CollectionRequest {
        CollectionRequest::new("candidates", endpoint(&self.base_url, "candidates"))
            .query("limit", self.page_limit)
            .records_at(RecordsAt::Key("candidates"))
    }

    fn jobs_request(&self) -> Option<CollectionRequest> {
        Some(
            CollectionRequest::new("offers", endpoint(&self.base_url, "offers"))
                .records_at(RecordsAt::Key("offers")),
        )
    }

    fn detail_request(&self) -> Option<DetailRequest> {
        Some(DetailRequest {
            base_url: endpoint(&self.base_url, "candidates"),
            id_field: "id",
            record_at: RecordsAt::Key("candidate"),
            fields: DETAIL_FIELDS,
            resume_field: "cv_url",
        })
    }
}

/// Recruitee candidates carry their job linkage as a list of placements;
/// the first placement stands in for the application.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecruiteeAdapter;

impl RecruiteeAdapter {
    /// Values of the profile `fields` entries of one kind, e.g. "education".
    fn profile_section(candidate: &Fields<'_>, kind: &str) -> Option<Vec<Value>> {
        let sections = candidate.list("fields")?;
        let values = sections
            .iter()
            .filter(|section| Fields::new(section).text("kind").as_deref() == Some(kind))
            .flat_map(|section| Fields::new(section).list("values").unwrap_or_default())
            .collect();
        Some(values)
    }
}

impl RecordAdapter for RecruiteeAdapter {
    fn source(&self) -> AtsSource {
        AtsSource::Recruitee
    }

    fn profile(&self, raw: &Value) -> Profile {
        let candidate = Fields::new(raw);
        let placement = candidate.first("placements");

        Profile {
            id: candidate.text("id"),
            candidate_id: candidate.text("id"),
            source: AtsSource::Recruitee,
            name: candidate.text("name"),
            first_name: None,
            last_name: None,
            email: candidate.first_text("emails"),
            phone: candidate.first_text("phones"),
            headline: candidate.text("headline"),
            summary: candidate.text("summary"),
            job_id: placement.text("offer_id"),
            job_title: placement.text("offer_title"),
            stage: placement.child("stage").text("name"),
            stage_kind: placement.child("stage").text("category"),
            disqualified: placement.raw("disqualify_reason").is_some(),
            education: Self::profile_section(&candidate, "education"),
            experience: Self::profile_section(&candidate, "experience"),
            social_profiles: candidate.list("social_links"),
            profile_url: None,
            resume_url: candidate.text("cv_url"),
            sourced: candidate.flag("sourced"),
            created_at: candidate.timestamp("created_at"),
        }
    }

    fn job(&self, raw: &Value) -> Job {
        let offer = Fields::new(raw);

        Job {
            job_id: offer.text("id"),
            code: offer.text("slug"),
            reference: offer.text_any(&["guid", "slug"]),
            source: AtsSource::Recruitee,
            title: offer.text("title"),
            description: offer.text("description"),
            requirements: offer.text("requirements"),
            benefits: None,
            employment_type: offer.text("employment_type_code"),
            department: offer.text("department"),
            location: offer.text("location"),
            state: offer.text("status"),
            url: offer.text("careers_url"),
            created_at: offer.timestamp("created_at"),
        }
    }

    fn application(&self, raw: &Value) -> Application {
        let candidate = Fields::new(raw);
        let placement = candidate.first("placements");

        Application {
            application_id: placement.text("id"),
            candidate_id: candidate.text("id"),
            source: AtsSource::Recruitee,
            job_id: placement.text("offer_id"),
            stage: placement.child("stage").text("name"),
            stage_kind: placement.child("stage").text("category"),
            disqualified: placement.raw("disqualify_reason").is_some(),
            created_at: placement
                .timestamp("created_at")
                .or_else(|| candidate.timestamp("created_at")),
            job_title: placement.text("offer_title"),
            resume_url: candidate.text("cv_url"),
            profile_url: None,
        }
    }
}
