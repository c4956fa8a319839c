use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML is not valid: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed report: {0}")]
    Malformed(String),

    #[error("Unrecognized extension '{extension}' for source file '{source_file}'")]
    UnsupportedExtension {
        source_file: String,
        extension: String,
    },

    #[error("Relative paths do not match: {expected} vs {actual}")]
    PathMismatch { expected: String, actual: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Mutation coverage of {path} is {coverage:.2}%, below the threshold of {threshold}%")]
    ThresholdViolation {
        path: String,
        coverage: f64,
        threshold: u32,
    },
}

impl ReportError {
    /// True when the report stream itself could not be read or is not
    /// well-formed markup. Such failures abort the whole report.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Xml(_) | Self::Malformed(_))
    }

    /// True for data-integrity failures: a location that cannot be mapped to
    /// a source file, or a mutant added to the wrong file report.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedExtension { .. } | Self::PathMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let malformed = ReportError::Malformed("unexpected end of document".to_string());
        assert!(malformed.is_structural());
        assert!(!malformed.is_invariant_violation());

        let mismatch = ReportError::PathMismatch {
            expected: "com/foo/Qix.java".to_string(),
            actual: "Foo.kt".to_string(),
        };
        assert!(mismatch.is_invariant_violation());
        assert!(!mismatch.is_structural());
        assert_eq!(
            mismatch.to_string(),
            "Relative paths do not match: com/foo/Qix.java vs Foo.kt"
        );
    }
}
