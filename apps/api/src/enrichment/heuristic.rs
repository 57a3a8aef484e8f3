//! Deterministic local enrichment. No network, never fails.
//!
//! - email / phone: first pattern match in the text
//! - name: the first non-empty line, when it reads like a person's name
//! - keywords: professional vocabulary terms present in the text

use async_trait::async_trait;

use crate::enrichment::{Enrichment, EnrichmentSource, ResumeEnricher};
use crate::errors::AppError;
use crate::scoring::engine::{EMAIL_PATTERN, PHONE_PATTERN};
use crate::scoring::fields::{ParsedResumeFields, PersonalData};

pub const PROFESSIONAL_VOCABULARY: [&str; 16] = [
    "experience",
    "skills",
    "education",
    "work",
    "project",
    "management",
    "development",
    "analysis",
    "leadership",
    "communication",
    "teamwork",
    "problem-solving",
    "technical",
    "software",
    "programming",
    "data",
];

pub struct HeuristicEnricher;

impl HeuristicEnricher {
    pub fn extract(text: &str) -> Enrichment {
        let personal_data = PersonalData {
            name: guess_name(text),
            email: EMAIL_PATTERN.find(text).map(|m| m.as_str().to_string()),
            phone: PHONE_PATTERN.find(text).map(|m| m.as_str().trim().to_string()),
            ..PersonalData::default()
        };

        let lower = text.to_lowercase();
        let keywords = PROFESSIONAL_VOCABULARY
            .iter()
            .filter(|term| lower.contains(*term))
            .map(|term| term.to_string())
            .collect();

        Enrichment {
            fields: Some(ParsedResumeFields {
                personal_data,
                ..ParsedResumeFields::default()
            }),
            keywords: Some(keywords),
            source: EnrichmentSource::Heuristic,
        }
    }
}

#[async_trait]
impl ResumeEnricher for HeuristicEnricher {
    async fn enrich(&self, text: &str) -> Result<Enrichment, AppError> {
        Ok(Self::extract(text))
    }
}

/// Two to four capitalized alphabetic words on the first non-empty line.
fn guess_name(text: &str) -> Option<String> {
    let first = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    if first.len() > 60 {
        return None;
    }
    let words: Vec<&str> = first.split_whitespace().collect();
    if !(2..=4).contains(&words.len()) {
        return None;
    }
    let looks_like_name = words.iter().all(|word| {
        word.chars().next().is_some_and(|c| c.is_ascii_uppercase())
            && word
                .chars()
                .all(|c| c.is_ascii_alphabetic() || matches!(c, '.' | '-' | '\''))
    });
    looks_like_name.then(|| words.join(" "))
}
