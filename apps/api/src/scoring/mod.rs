// Rule-based ATS scoring. Pure and synchronous; never fails.

pub mod engine;
pub mod experience;
pub mod fields;

pub use engine::{AtsScoringEngine, ScoreBreakdown};
pub use experience::total_experience_years;
pub use fields::ParsedResumeFields;
