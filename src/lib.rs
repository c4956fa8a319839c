//! # PIT Report
//!
//! Reads the XML reports written by the PIT mutation testing engine and turns
//! them into per-source-file mutant reports.
//!
//! This library provides functionality to:
//! - Stream-parse `mutations.xml` into [`Mutant`] records
//! - Resolve mutator keys against a catalog of known PIT mutators
//! - Classify PIT detection statuses into a small set of outcomes
//! - Group mutants by project-relative source path with running counts
//! - Project each file's mutants into the JSON shape used by source viewers
//!
//! ## Example
//!
//! ```rust,no_run
//! use pitest_report::{load_project_report, Result};
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//!     let project = load_project_report(Path::new("target/pit-reports/mutations.xml"))?;
//!
//!     for file in project.source_file_reports() {
//!         println!("{}: {} of {} killed", file.relative_path(), file.killed(), file.total());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod location;
pub mod mutant;
pub mod mutator;
pub mod parser;
pub mod report;
pub mod status;
pub mod summary;

pub use error::{ReportError, Result};
pub use location::MutantLocation;
pub use mutant::Mutant;
pub use mutator::{Mutator, MutatorCatalog};
pub use parser::ReportParser;
pub use report::{MutationCounts, ProjectReport, SourceFileReport};
pub use status::MutantStatus;

use std::path::Path;

/// Parses the report at `path` and groups its mutants by source file.
pub fn load_project_report(path: &Path) -> Result<ProjectReport> {
    let mutants = parser::parse_report_file(path)?;
    report::aggregate(mutants)
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ReportError, Result};
    pub use crate::load_project_report;
    pub use crate::mutator::lookup;
    pub use crate::parser::{parse_report, parse_report_file, ReportParser};
    pub use crate::report::{aggregate, ProjectReport, SourceFileReport};
    pub use crate::status::{classify, MutantStatus};
    pub use crate::summary::ReportSummary;
}
