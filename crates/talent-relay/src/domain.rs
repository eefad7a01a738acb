//! Canonical, source-agnostic record shapes.
//!
//! Every field is serialized on every record. Fields the upstream did not
//! supply are written as `null` so that all records in a batch share one
//! schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Upstream applicant tracking systems the relay can pull from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtsSource {
    Workable,
    #[serde(rename = "bamboohr")]
    BambooHr,
    Ceipal,
    Recruitee,
}

impl AtsSource {
    pub const ALL: [AtsSource; 4] = [
        AtsSource::Workable,
        AtsSource::BambooHr,
        AtsSource::Ceipal,
        AtsSource::Recruitee,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            AtsSource::Workable => "workable",
            AtsSource::BambooHr => "bamboohr",
            AtsSource::Ceipal => "ceipal",
            AtsSource::Recruitee => "recruitee",
        }
    }
}

impl fmt::Display for AtsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ATS source '{0}' (expected workable, bamboohr, ceipal or recruitee)")]
pub struct UnknownSource(pub String);

impl FromStr for AtsSource {
    type Err = UnknownSource;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "workable" => Ok(AtsSource::Workable),
            "bamboohr" | "bamboo" => Ok(AtsSource::BambooHr),
            "ceipal" => Ok(AtsSource::Ceipal),
            "recruitee" => Ok(AtsSource::Recruitee),
            _ => Err(UnknownSource(value.to_string())),
        }
    }
}

/// Candidate or employee as seen by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Option<String>,
    pub candidate_id: Option<String>,
    pub source: AtsSource,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub job_id: Option<String>,
    pub job_title: Option<String>,
    pub stage: Option<String>,
    pub stage_kind: Option<String>,
    pub disqualified: bool,
    pub education: Option<Vec<Value>>,
    pub experience: Option<Vec<Value>>,
    pub social_profiles: Option<Vec<Value>>,
    pub profile_url: Option<String>,
    pub resume_url: Option<String>,
    pub sourced: Option<bool>,
    pub created_at: Option<String>,
}

/// Open or closed requisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: Option<String>,
    pub code: Option<String>,
    pub reference: Option<String>,
    pub source: AtsSource,
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub employment_type: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub state: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<String>,
}

/// A candidate's membership in one job pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub application_id: Option<String>,
    pub candidate_id: Option<String>,
    pub source: AtsSource,
    pub job_id: Option<String>,
    pub stage: Option<String>,
    pub stage_kind: Option<String>,
    pub disqualified: bool,
    pub created_at: Option<String>,
    pub job_title: Option<String>,
    pub resume_url: Option<String>,
    pub profile_url: Option<String>,
}

/// The document persisted to disk and posted to the analysis service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalBatch {
    pub profiles: Vec<Profile>,
    pub jobs: Vec<Job>,
    pub applications: Vec<Application>,
}

impl CanonicalBatch {
    pub fn total_records(&self) -> usize {
        self.profiles.len() + self.jobs.len() + self.applications.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_source_names_case_insensitively() {
        assert_eq!("Workable".parse::<AtsSource>(), Ok(AtsSource::Workable));
        assert_eq!(" bamboo ".parse::<AtsSource>(), Ok(AtsSource::BambooHr));
        assert!("greenhouse".parse::<AtsSource>().is_err());
        for source in AtsSource::ALL {
            assert_eq!(source.label().parse::<AtsSource>(), Ok(source));
        }
    }

    #[test]
    fn absent_fields_serialize_as_null() {
        let job = Job {
            job_id: Some("ENG1".to_string()),
            code: None,
            reference: None,
            source: AtsSource::Workable,
            title: None,
            description: None,
            requirements: None,
            benefits: None,
            employment_type: None,
            department: None,
            location: None,
            state: None,
            url: None,
            created_at: None,
        };

        let value = serde_json::to_value(&job).expect("job serializes");
        let object = value.as_object().expect("object");
        assert_eq!(object.len(), 14);
        assert_eq!(object["code"], Value::Null);
        assert_eq!(object["source"], "workable");
    }
}
