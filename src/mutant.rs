use crate::location::MutantLocation;
use crate::mutator::Mutator;
use crate::status::MutantStatus;
use std::sync::Arc;

/// One mutation entry from a PIT report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutant {
    detected: bool,
    status: MutantStatus,
    location: MutantLocation,
    mutator: Arc<Mutator>,
    index: u32,
    description: Option<String>,
    killing_test: Option<String>,
}

impl Mutant {
    /// Empty descriptions and killing tests are stored as absent.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        detected: bool,
        status: MutantStatus,
        location: MutantLocation,
        mutator: Arc<Mutator>,
        index: u32,
        description: Option<String>,
        killing_test: Option<String>,
    ) -> Self {
        Mutant {
            detected,
            status,
            location,
            mutator,
            index,
            description: description.filter(|d| !d.is_empty()),
            killing_test: killing_test.filter(|t| !t.is_empty()),
        }
    }

    pub fn detected(&self) -> bool {
        self.detected
    }

    pub fn status(&self) -> MutantStatus {
        self.status
    }

    pub fn location(&self) -> &MutantLocation {
        &self.location
    }

    pub fn mutator(&self) -> &Mutator {
        &self.mutator
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn killing_test(&self) -> Option<&str> {
        self.killing_test.as_deref()
    }

    pub fn relative_path(&self) -> &str {
        self.location.relative_path()
    }

    pub fn line_number(&self) -> u32 {
        self.location.line_number()
    }

    /// Issue message for a mutant that no test caught.
    pub fn violation_description(&self) -> String {
        let mut message = format!(
            "{} without breaking the tests",
            self.mutator.violation_description
        );
        if let Some(description) = &self.description {
            message.push_str(&format!(" [{}]", description));
        }
        message
    }
}
