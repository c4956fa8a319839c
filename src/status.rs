use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome category of a mutant.
///
/// `Other` lumps together timeouts, memory errors, non-viable mutants and run
/// errors: they say more about the test fixture than about test quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutantStatus {
    NoCoverage,
    Killed,
    Survived,
    Other,
    Unknown,
}

impl MutantStatus {
    pub const ALL: [MutantStatus; 5] = [
        MutantStatus::NoCoverage,
        MutantStatus::Killed,
        MutantStatus::Survived,
        MutantStatus::Other,
        MutantStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MutantStatus::NoCoverage => "NO_COVERAGE",
            MutantStatus::Killed => "KILLED",
            MutantStatus::Survived => "SURVIVED",
            MutantStatus::Other => "OTHER",
            MutantStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for MutantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine detection statuses that end up in [`MutantStatus::Other`].
pub const OTHER_DETECTION_STATUSES: [&str; 4] =
    ["TIMED_OUT", "NON_VIABLE", "MEMORY_ERROR", "RUN_ERROR"];

/// Maps a raw `status` attribute to its category.
///
/// Matching is exact and case-sensitive. Anything unrecognized, including a
/// missing or empty token, is `Unknown`.
pub fn classify(raw: Option<&str>) -> MutantStatus {
    match raw {
        Some("NO_COVERAGE") => MutantStatus::NoCoverage,
        Some("KILLED") => MutantStatus::Killed,
        Some("SURVIVED") => MutantStatus::Survived,
        Some(token) if OTHER_DETECTION_STATUSES.contains(&token) => MutantStatus::Other,
        _ => MutantStatus::Unknown,
    }
}
