// Analysis prompt templates.
// All prompts for the analysis module are defined here.

use crate::models::profile::{Profile, ProfileContext};

pub const ANALYST_SYSTEM: &str = "\
You are an expert strategic analyst. Perform a deep SWOT analysis.
CRITICAL: Provide exactly 6 to 7 points per category.
At least 2 points per category must be a \"Very Deep Strategic Analysis\" (detailed paragraph).";

/// The mode-specific context line interpolated from the profile's
/// structured fields.
pub fn context_line(profile: &Profile) -> String {
    match &profile.context {
        ProfileContext::Individual(c) => format!(
            "Context: {} ({}) in {}. Goal: {}",
            c.role, c.seniority, c.industry, c.career_goal
        ),
        ProfileContext::Business(c) => format!(
            "Context: {} in {}. Value Prop: {}",
            c.company, c.industry, c.value_proposition
        ),
    }
}

/// Full system instruction for one analysis run.
pub fn build_system_prompt(profile: &Profile) -> String {
    format!("{ANALYST_SYSTEM}\n{}", context_line(profile))
}
