use crate::error::{ReportError, Result};
use crate::report::{MutationCounts, ProjectReport};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    pub path: String,
    #[serde(flatten)]
    pub counts: MutationCounts,
    pub mutation_coverage: f64,
}

/// Serializable digest of a [`ProjectReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub report: String,
    pub date: String,
    pub totals: MutationCounts,
    pub mutation_coverage: f64,
    pub files: Vec<FileSummary>,
}

impl ReportSummary {
    pub fn new(report: impl Into<String>, project: &ProjectReport) -> Self {
        let now: DateTime<Local> = Local::now();
        let totals = project.totals();

        let files = project
            .source_file_reports()
            .map(|file| FileSummary {
                path: file.relative_path().to_string(),
                counts: file.counts(),
                mutation_coverage: file.mutation_coverage(),
            })
            .collect();

        ReportSummary {
            report: report.into(),
            date: now.format("%d/%m/%Y %H:%M:%S").to_string(),
            totals,
            mutation_coverage: totals.mutation_coverage(),
            files,
        }
    }

    pub fn below_threshold(&self, threshold: u32) -> impl Iterator<Item = &FileSummary> {
        self.files
            .iter()
            .filter(move |file| !file.counts.meets_threshold(threshold))
    }

    /// Fails on the first file whose mutation coverage is under `threshold`.
    pub fn check_threshold(&self, threshold: u32) -> Result<()> {
        match self.below_threshold(threshold).next() {
            Some(file) => Err(ReportError::ThresholdViolation {
                path: file.path.clone(),
                coverage: file.mutation_coverage,
                threshold,
            }),
            None => Ok(()),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Report: {} ({})", self.report, self.date);

        if self.files.is_empty() {
            let _ = writeln!(out, "  no mutants");
            return out;
        }

        for file in &self.files {
            let _ = writeln!(out, "  {}", render_row(&file.path, &file.counts, file.mutation_coverage));
        }
        let _ = writeln!(
            out,
            "  {}",
            render_row("TOTAL", &self.totals, self.mutation_coverage)
        );
        out
    }
}

fn render_row(label: &str, counts: &MutationCounts, coverage: f64) -> String {
    format!(
        "{:<60} total {:>4}  killed {:>4}  survived {:>4}  no coverage {:>4}  other {:>4}  unknown {:>4}  coverage {:>6.2}%",
        label,
        counts.total,
        counts.killed,
        counts.survived,
        counts.no_coverage,
        counts.other,
        counts.unknown,
        coverage
    )
}
