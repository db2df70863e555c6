//! Contract with the connector catalog plus the last-request-wins search coordinator.

mod coordinator;

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::workflows::configuration::{ConnectionSpec, JurisdictionProfile};

pub use coordinator::{SearchCoordinator, SearchOutcome, SearchTicket, SearchTracker};

/// Relative price of a candidate against the cheapest result of the same search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CostTier {
    Lowest,
    /// Percentage above the baseline, e.g. `+12%`.
    Delta(u16),
}

impl fmt::Display for CostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lowest => f.write_str("Lowest"),
            Self::Delta(percent) => write!(f, "+{percent}%"),
        }
    }
}

impl FromStr for CostTier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("lowest") {
            return Ok(Self::Lowest);
        }
        let digits = trimmed
            .strip_prefix('+')
            .unwrap_or(trimmed)
            .strip_suffix('%')
            .ok_or_else(|| format!("cost tier '{value}' is neither Lowest nor +N%"))?;
        match digits.trim().parse::<u16>() {
            Ok(0) => Ok(Self::Lowest),
            Ok(percent) => Ok(Self::Delta(percent)),
            Err(_) => Err(format!("cost tier '{value}' has no whole percentage")),
        }
    }
}

impl TryFrom<String> for CostTier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CostTier> for String {
    fn from(value: CostTier) -> Self {
        value.to_string()
    }
}

/// One connector returned by a search. Read-only once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub model: String,
    pub cost_tier: CostTier,
    pub rated_load: String,
    pub material: String,
    #[serde(default)]
    pub face_fastener_descriptor: Option<String>,
    #[serde(default)]
    pub joist_fastener_descriptor: Option<String>,
}

impl Candidate {
    /// Descriptor texts present on the candidate, header/face first.
    pub fn fastener_descriptors(&self) -> impl Iterator<Item = &str> {
        self.face_fastener_descriptor
            .as_deref()
            .into_iter()
            .chain(self.joist_fastener_descriptor.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub spec: ConnectionSpec,
    pub jurisdiction: &'static str,
    pub design_standard: &'static str,
}

impl SearchRequest {
    pub fn new(spec: ConnectionSpec, profile: &'static JurisdictionProfile) -> Self {
        Self {
            spec,
            jurisdiction: profile.id,
            design_standard: profile.design_standard,
        }
    }
}

/// Remote or canned catalog answering connector searches, cheapest first.
pub trait CandidateService: Send + Sync {
    fn search(
        &self,
        request: SearchRequest,
    ) -> impl Future<Output = Result<Vec<Candidate>, CatalogError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
    #[error("catalog did not answer within {0} ms")]
    TimedOut(u128),
}
