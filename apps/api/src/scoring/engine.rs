//! ATS scoring engine: deterministic, explainable rule-based score.
//!
//! Six categories, each with a fixed ceiling:
//!
//! | category      | max |
//! |---------------|-----|
//! | format        | 20  |
//! | skills        | 25  |
//! | keywords      | 20  |
//! | role_clarity  | 15  |
//! | chronology    | 10  |
//! | contact       | 10  |
//!
//! `total == min(100, sum(components))`. Every rule leaves either a feedback
//! line (satisfied) or a recommendation (unsatisfied); the lists are capped
//! after scoring so the caps never change the number.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::scoring::fields::ParsedResumeFields;

pub const MAX_TOTAL: u32 = 100;
pub const MAX_FEEDBACK: usize = 5;
pub const MAX_RECOMMENDATIONS: usize = 3;

pub(crate) static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
pub(crate) static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[\s.-]?)?(?:\(\d{3}\)|\d{3})[\s.-]?\d{3}[\s.-]?\d{4}\b").unwrap()
});

/// Sanitized extractions are ASCII-only, so there only `-` and `*` can match;
/// `/score` receives caller text verbatim and may still carry `\u{2022}`.
const BULLET_MARKERS: [char; 3] = ['\u{2022}', '-', '*'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Format,
    Skills,
    Keywords,
    RoleClarity,
    Chronology,
    Contact,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 6] = [
        ScoreCategory::Format,
        ScoreCategory::Skills,
        ScoreCategory::Keywords,
        ScoreCategory::RoleClarity,
        ScoreCategory::Chronology,
        ScoreCategory::Contact,
    ];

    pub fn max_points(self) -> u32 {
        match self {
            ScoreCategory::Format => 20,
            ScoreCategory::Skills => 25,
            ScoreCategory::Keywords => 20,
            ScoreCategory::RoleClarity => 15,
            ScoreCategory::Chronology => 10,
            ScoreCategory::Contact => 10,
        }
    }
}

/// Result of one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub total: u32,
    pub components: BTreeMap<ScoreCategory, u32>,
    pub feedback: Vec<String>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
impl ScoreBreakdown {
    pub fn component(&self, category: ScoreCategory) -> u32 {
        self.components.get(&category).copied().unwrap_or(0)
    }
}

/// Accumulates points and messages while the rules run.
struct Tally {
    components: BTreeMap<ScoreCategory, u32>,
    feedback: Vec<String>,
    recommendations: Vec<String>,
}

impl Tally {
    fn new() -> Self {
        Self {
            components: ScoreCategory::ALL.iter().map(|c| (*c, 0)).collect(),
            feedback: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    fn award(&mut self, category: ScoreCategory, points: u32, feedback: impl Into<String>) {
        *self.components.entry(category).or_insert(0) += points;
        self.feedback.push(feedback.into());
    }

    fn recommend(&mut self, recommendation: impl Into<String>) {
        self.recommendations.push(recommendation.into());
    }

    fn finish(mut self) -> ScoreBreakdown {
        for category in ScoreCategory::ALL {
            if let Some(points) = self.components.get_mut(&category) {
                *points = (*points).min(category.max_points());
            }
        }
        let sum: u32 = self.components.values().sum();
        self.feedback.truncate(MAX_FEEDBACK);
        self.recommendations.truncate(MAX_RECOMMENDATIONS);
        ScoreBreakdown {
            total: sum.min(MAX_TOTAL),
            components: self.components,
            feedback: self.feedback,
            recommendations: self.recommendations,
        }
    }
}

/// Stateless; shared freely across requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtsScoringEngine;

impl AtsScoringEngine {
    /// Scores canonical text plus whatever structured data is available.
    /// Never fails: absent inputs simply earn nothing.
    pub fn score(
        &self,
        text: &str,
        fields: Option<&ParsedResumeFields>,
        keywords: Option<&[String]>,
    ) -> ScoreBreakdown {
        let empty = ParsedResumeFields::default();
        let parsed = fields.unwrap_or(&empty);
        let mut tally = Tally::new();

        score_format(&mut tally, text, parsed);
        score_skills(&mut tally, parsed);
        score_keywords(&mut tally, keywords.unwrap_or(&[]));
        score_role_clarity(&mut tally, parsed);
        score_chronology(&mut tally, parsed);
        score_contact(&mut tally, text, parsed);

        tally.finish()
    }
}

fn score_format(tally: &mut Tally, text: &str, fields: &ParsedResumeFields) {
    if text.chars().count() > 300 {
        tally.award(ScoreCategory::Format, 5, "Adequate content length");
    } else {
        tally.recommend("Expand your resume content for better impact");
    }

    if text.contains(BULLET_MARKERS) {
        tally.award(ScoreCategory::Format, 5, "Good use of bullet points");
    } else {
        tally.recommend("Use bullet points to improve readability");
    }

    if !fields.experiences.is_empty() {
        tally.award(ScoreCategory::Format, 5, "Experience section present");
    }
    if !fields.education.is_empty() {
        tally.award(ScoreCategory::Format, 5, "Education section included");
    }
}

fn score_skills(tally: &mut Tally, fields: &ParsedResumeFields) {
    let count = fields.skills.distinct_count();
    if count >= 5 {
        tally.award(ScoreCategory::Skills, 15, format!("{count} skills listed"));
    } else if count > 0 {
        tally.award(ScoreCategory::Skills, 8, format!("{count} skills found"));
        tally.recommend("Add more relevant technical skills");
    } else {
        tally.recommend("Include a comprehensive skills section");
    }

    if !fields.skills.technical.is_empty() {
        tally.award(ScoreCategory::Skills, 10, "Technical skills identified");
    } else {
        tally.recommend("Add specific technical skills for your field");
    }
}

fn score_keywords(tally: &mut Tally, keywords: &[String]) {
    match keywords.len() {
        n if n >= 10 => tally.award(ScoreCategory::Keywords, 20, "Rich keyword content detected"),
        n if n >= 5 => {
            tally.award(ScoreCategory::Keywords, 12, "Good keyword presence");
            tally.recommend("Include more industry-specific keywords");
        }
        _ => {
            *tally.components.entry(ScoreCategory::Keywords).or_insert(0) += 5;
            tally.recommend("Add more relevant keywords from job descriptions");
        }
    }
}

fn score_role_clarity(tally: &mut Tally, fields: &ParsedResumeFields) {
    if fields.experiences.iter().any(|e| e.position.is_some()) {
        tally.award(ScoreCategory::RoleClarity, 8, "Job titles clearly stated");
    } else {
        tally.recommend("Clearly state your job titles and roles");
    }

    if fields
        .experiences
        .iter()
        .any(|e| !e.responsibilities.is_empty())
    {
        tally.award(ScoreCategory::RoleClarity, 7, "Job responsibilities described");
    } else {
        tally.recommend("Add detailed job responsibilities");
    }
}

fn score_chronology(tally: &mut Tally, fields: &ParsedResumeFields) {
    if fields.experiences.is_empty() {
        return;
    }
    // An end date of "Present" is just another non-empty end date.
    if fields
        .experiences
        .iter()
        .any(|e| e.start_date.is_some() && e.end_date.is_some())
    {
        tally.award(ScoreCategory::Chronology, 10, "Work timeline provided");
    } else {
        tally.recommend("Include start and end dates for positions");
    }
}

fn score_contact(tally: &mut Tally, text: &str, fields: &ParsedResumeFields) {
    let personal = &fields.personal_data;

    let has_email = match &personal.email {
        Some(email) => email.contains('@') || EMAIL_PATTERN.is_match(text),
        None => EMAIL_PATTERN.is_match(text),
    };
    if has_email {
        tally.award(ScoreCategory::Contact, 5, "Valid email address found");
    } else {
        tally.recommend("Include a professional email address");
    }

    let has_phone = personal.phone.is_some() || PHONE_PATTERN.is_match(text);
    if has_phone {
        tally.award(ScoreCategory::Contact, 3, "Phone number included");
    } else {
        tally.recommend("Add your phone number");
    }

    if personal.name.is_some() {
        tally.award(ScoreCategory::Contact, 2, "Name clearly displayed");
    } else {
        tally.recommend("Put your full name at the top of the resume");
    }
}
