use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which profile a session is currently working on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Individual,
    Business,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Individual => "individual",
            Mode::Business => "business",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(Mode::Individual),
            "business" => Ok(Mode::Business),
            other => Err(FieldError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("Unknown mode '{0}' (expected 'individual' or 'business')")]
    UnknownMode(String),

    #[error("Unknown field '{field}' for {mode} profile")]
    Unknown { mode: Mode, field: String },
}

/// Career context for the individual mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndividualContext {
    pub role: String,
    pub seniority: String,
    pub industry: String,
    pub market: String,
    pub career_goal: String,
}

/// Market context for the business mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusinessContext {
    pub company: String,
    pub product_service: String,
    pub industry: String,
    pub market_region: String,
    pub customer_segment: String,
    pub value_proposition: String,
    pub website: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProfileContext {
    Individual(IndividualContext),
    Business(BusinessContext),
}

/// A profile is its mode-specific structured context plus the free-text
/// `content` that is actually analyzed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(flatten)]
    pub context: ProfileContext,
    pub content: String,
}

impl Profile {
    /// An all-empty profile of the given mode.
    pub fn empty(mode: Mode) -> Self {
        let context = match mode {
            Mode::Individual => ProfileContext::Individual(IndividualContext::default()),
            Mode::Business => ProfileContext::Business(BusinessContext::default()),
        };
        Profile {
            context,
            content: String::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        match self.context {
            ProfileContext::Individual(_) => Mode::Individual,
            ProfileContext::Business(_) => Mode::Business,
        }
    }

    /// Sets a field by its wire name (`careerGoal`, `valueProposition`, ...).
    pub fn set_field(&mut self, field: &str, value: String) -> Result<(), FieldError> {
        if field == "content" {
            self.content = value;
            return Ok(());
        }

        let mode = self.mode();
        let slot = match &mut self.context {
            ProfileContext::Individual(c) => match field {
                "role" => &mut c.role,
                "seniority" => &mut c.seniority,
                "industry" => &mut c.industry,
                "market" => &mut c.market,
                "careerGoal" => &mut c.career_goal,
                _ => return Err(unknown(mode, field)),
            },
            ProfileContext::Business(c) => match field {
                "company" => &mut c.company,
                "productService" => &mut c.product_service,
                "industry" => &mut c.industry,
                "marketRegion" => &mut c.market_region,
                "customerSegment" => &mut c.customer_segment,
                "valueProposition" => &mut c.value_proposition,
                "website" => &mut c.website,
                _ => return Err(unknown(mode, field)),
            },
        };
        *slot = value;
        Ok(())
    }

    /// True when every field, `content` included, is empty text.
    #[cfg(test)]
    pub fn is_blank(&self) -> bool {
        *self == Profile::empty(self.mode())
    }
}

fn unknown(mode: Mode, field: &str) -> FieldError {
    FieldError::Unknown {
        mode,
        field: field.to_string(),
    }
}
