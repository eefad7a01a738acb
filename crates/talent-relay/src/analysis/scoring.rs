use crate::transform::fields::Fields;

/// Everything a scorer may look at for one application.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    /// Resolved profile, or the application itself when no profile matched.
    pub candidate: Fields<'a>,
    pub application: Fields<'a>,
    /// Empty when the job is unknown.
    pub job: Fields<'a>,
}

pub trait CandidateScorer: Send + Sync {
    /// Score in `0..=100`.
    fn score(&self, input: &ScoringInput<'_>) -> u8;
}

/// Deterministic points-based scorer built from whatever the profile carries.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicScorer {
    pub base: i32,
    pub resume: i32,
    pub per_experience_entry: i32,
    pub experience_cap: i32,
    pub education: i32,
    pub narrative: i32,
    pub advanced_stage: i32,
    pub disqualified_penalty: i32,
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self {
            base: 20,
            resume: 20,
            per_experience_entry: 8,
            experience_cap: 24,
            education: 12,
            narrative: 8,
            advanced_stage: 16,
            disqualified_penalty: 50,
        }
    }
}

const ADVANCED_STAGES: &[&str] = &["interview", "assessment", "offer", "hired"];

impl CandidateScorer for HeuristicScorer {
    fn score(&self, input: &ScoringInput<'_>) -> u8 {
        let candidate = &input.candidate;
        let application = &input.application;
        let mut points = self.base;

        let resume = candidate
            .text("resume_url")
            .or_else(|| application.text("resume_url"));
        if resume.is_some() {
            points += self.resume;
        }

        let experience = candidate.list("experience").map_or(0, |entries| entries.len());
        points += (experience as i32 * self.per_experience_entry).min(self.experience_cap);

        if candidate.list("education").is_some_and(|entries| !entries.is_empty()) {
            points += self.education;
        }

        if candidate.text_any(&["headline", "summary"]).is_some() {
            points += self.narrative;
        }

        let stage_kind = application
            .text("stage_kind")
            .or_else(|| candidate.text("stage_kind"))
            .map(|kind| kind.to_ascii_lowercase());
        if stage_kind.is_some_and(|kind| ADVANCED_STAGES.contains(&kind.as_str())) {
            points += self.advanced_stage;
        }

        let disqualified = application
            .flag("disqualified")
            .or_else(|| candidate.flag("disqualified"))
            .unwrap_or(false);
        if disqualified {
            points -= self.disqualified_penalty;
        }

        points.clamp(0, 100) as u8
    }
}
