use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsuranceType {
    Auto,
    Home,
    Renters,
    Life,
    Disability,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported insurance type `{0}` (expected auto|home|renters|life|disability)")]
pub struct UnknownInsuranceType(pub String);

impl InsuranceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Home => "home",
            Self::Renters => "renters",
            Self::Life => "life",
            Self::Disability => "disability",
        }
    }
}

impl fmt::Display for InsuranceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsuranceType {
    type Err = UnknownInsuranceType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "home" => Ok(Self::Home),
            "renters" => Ok(Self::Renters),
            "life" => Ok(Self::Life),
            "disability" => Ok(Self::Disability),
            other => Err(UnknownInsuranceType(other.to_string())),
        }
    }
}
