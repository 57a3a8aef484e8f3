//! Structured résumé fields as produced by an enricher.
//!
//! Deserialization is lenient: a malformed field or list entry becomes its
//! default instead of failing the whole object. Blank strings read as absent.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub linkedin: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub portfolio: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default, deserialize_with = "lenient_string")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_date: Option<String>,
    /// `"Present"` for an ongoing role.
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub responsibilities: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub technologies: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub technical: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub soft: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub languages: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub tools: Vec<String>,
}

impl Skills {
    /// Distinct skills across all categories, compared case-insensitively.
    pub fn distinct_count(&self) -> usize {
        self.technical
            .iter()
            .chain(&self.soft)
            .chain(&self.languages)
            .chain(&self.tools)
            .map(|s| s.trim().to_lowercase())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default, deserialize_with = "lenient_string")]
    pub institution: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub field_of_study: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub gpa: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchWork {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub publication_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub collaborators: Vec<String>,
}

/// Full structured view of a résumé.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResumeFields {
    #[serde(default, deserialize_with = "lenient")]
    pub personal_data: PersonalData,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub experiences: Vec<Experience>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub projects: Vec<Project>,
    #[serde(default, deserialize_with = "lenient")]
    pub skills: Skills,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub education: Vec<Education>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub achievements: Vec<Achievement>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub research_work: Vec<ResearchWork>,
}

impl ParsedResumeFields {
    /// Parses a JSON value, never failing: anything unusable yields defaults.
    pub fn from_value(value: Value) -> Self {
        Self::deserialize(value).unwrap_or_default()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient deserializers
// ────────────────────────────────────────────────────────────────────────────

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .map(|item| T::deserialize(item).unwrap_or_default())
        .collect())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items.into_iter().filter_map(scalar_text).collect())
}

/// Strings and numbers become trimmed text; blanks and everything else are absent.
fn scalar_text(value: Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_document_parses() {
        let fields: ParsedResumeFields = serde_json::from_value(json!({
            "personal_data": { "name": "Jane Smith", "email": "jane@example.com", "phone": "" },
            "experiences": [{
                "company": "Acme",
                "position": "Engineer",
                "start_date": "2019-03-01",
                "end_date": "Present",
                "responsibilities": ["Built things"]
            }],
            "skills": { "technical": ["Rust", "SQL"], "soft": ["Mentoring"] },
            "education": [{ "institution": "State U", "gpa": 3.8 }],
            "research_work": [{ "title": "Paper", "collaborators": ["A. Author"] }]
        }))
        .unwrap();

        assert_eq!(fields.personal_data.name.as_deref(), Some("Jane Smith"));
        assert_eq!(fields.personal_data.phone, None);
        assert_eq!(fields.experiences[0].end_date.as_deref(), Some("Present"));
        assert_eq!(fields.education[0].gpa.as_deref(), Some("3.8"));
        assert_eq!(fields.research_work[0].collaborators, vec!["A. Author"]);
        assert_eq!(fields.skills.distinct_count(), 3);
    }

    #[test]
    fn test_malformed_fields_become_defaults() {
        let fields: ParsedResumeFields = serde_json::from_value(json!({
            "personal_data": "not an object",
            "experiences": [42, { "position": "Lead", "responsibilities": "oops" }],
            "skills": { "technical": ["Go", null, {"x": 1}, "  "] },
            "education": { "institution": "should be a list" }
        }))
        .unwrap();

        assert_eq!(fields.personal_data, PersonalData::default());
        assert_eq!(fields.experiences.len(), 2);
        assert_eq!(fields.experiences[0], Experience::default());
        assert_eq!(fields.experiences[1].position.as_deref(), Some("Lead"));
        assert!(fields.experiences[1].responsibilities.is_empty());
        assert_eq!(fields.skills.technical, vec!["Go"]);
        assert!(fields.education.is_empty());
    }

    #[test]
    fn test_from_value_never_fails() {
        assert_eq!(
            ParsedResumeFields::from_value(json!([1, 2, 3])),
            ParsedResumeFields::default()
        );
        assert_eq!(
            ParsedResumeFields::from_value(json!({})),
            ParsedResumeFields::default()
        );
    }

    #[test]
    fn test_distinct_skills_ignore_case_and_category() {
        let skills = Skills {
            technical: vec!["Rust".into(), "rust ".into()],
            tools: vec!["RUST".into(), "Git".into()],
            ..Skills::default()
        };
        assert_eq!(skills.distinct_count(), 2);
    }
}
