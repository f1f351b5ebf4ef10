use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PhotoError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bib(String);

impl Bib {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Bib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Bib {
    type Err = PhotoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
            return Err(PhotoError::InvalidBib(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    Low,
    High,
}

impl Pass {
    pub fn cache_suffix(self) -> &'static str {
        match self {
            Pass::Low => "_cache.csv",
            Pass::High => "_high_cache.csv",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Low => write!(f, "low"),
            Pass::High => write!(f, "high"),
        }
    }
}

/// Index key of a URL: its final `/` segment, query string included.
pub fn url_key(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

pub fn file_name_of(location: &str) -> &str {
    let without_query = location.split(['?', '#']).next().unwrap_or(location);
    without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(without_query)
}
