use crate::error::{ReportError, Result};
use crate::mutant::Mutant;
use crate::status::MutantStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;
use tracing::info;

/// Running per-status mutant counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationCounts {
    pub total: usize,
    pub killed: usize,
    pub survived: usize,
    pub no_coverage: usize,
    pub other: usize,
    pub unknown: usize,
    pub detected: usize,
}

impl MutationCounts {
    fn record(&mut self, status: MutantStatus, detected: bool) {
        self.total += 1;
        if detected {
            self.detected += 1;
        }
        match status {
            MutantStatus::NoCoverage => self.no_coverage += 1,
            MutantStatus::Killed => self.killed += 1,
            // Only survivors are reported as violations downstream
            MutantStatus::Survived => self.survived += 1,
            MutantStatus::Other => self.other += 1,
            MutantStatus::Unknown => self.unknown += 1,
        }
    }

    pub fn count(&self, status: MutantStatus) -> usize {
        match status {
            MutantStatus::NoCoverage => self.no_coverage,
            MutantStatus::Killed => self.killed,
            MutantStatus::Survived => self.survived,
            MutantStatus::Other => self.other,
            MutantStatus::Unknown => self.unknown,
        }
    }

    /// `total` equals the sum of the five status counters.
    pub fn is_consistent(&self) -> bool {
        let by_status: usize = MutantStatus::ALL.iter().map(|s| self.count(*s)).sum();
        by_status == self.total
    }

    /// Percentage of killed mutants, 0.0 when there are none.
    pub fn mutation_coverage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        100.0 * self.killed as f64 / self.total as f64
    }

    /// Whether the truncated killed percentage reaches `threshold`.
    /// Nothing to kill counts as reached.
    pub fn meets_threshold(&self, threshold: u32) -> bool {
        if self.total == 0 {
            return true;
        }
        let killed_percent = self.killed * 100 / self.total;
        killed_percent >= threshold as usize
    }
}

impl AddAssign for MutationCounts {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.killed += other.killed;
        self.survived += other.survived;
        self.no_coverage += other.no_coverage;
        self.other += other.other;
        self.unknown += other.unknown;
        self.detected += other.detected;
    }
}

/// JSON shape of one mutant in the per-line projection. The short keys are
/// read by the source viewer and must not change.
#[derive(Debug, Serialize)]
struct MutantJson<'a> {
    d: bool,
    s: MutantStatus,
    c: &'a str,
    mname: &'a str,
    mdesc: &'a str,
    #[serde(rename = "sourceFile", skip_serializing_if = "Option::is_none")]
    source_file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mmethod: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    l: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    killtest: Option<&'a str>,
}

impl<'a> From<&'a Mutant> for MutantJson<'a> {
    fn from(mutant: &'a Mutant) -> Self {
        let location = mutant.location();
        let line_number = location.line_number();

        MutantJson {
            d: mutant.detected(),
            s: mutant.status(),
            c: location.class_name(),
            mname: &mutant.mutator().name,
            mdesc: &mutant.mutator().violation_description,
            source_file: Some(location.source_file()).filter(|f| !f.is_empty()),
            mmethod: Some(location.mutated_method()).filter(|m| !m.is_empty()),
            l: (line_number > 0).then(|| line_number.to_string()),
            killtest: mutant.killing_test(),
        }
    }
}

/// All mutants of one source file, in the order they were read.
#[derive(Debug, Clone)]
pub struct SourceFileReport {
    relative_path: String,
    mutants: Vec<Mutant>,
    counts: MutationCounts,
}

impl SourceFileReport {
    pub fn new(relative_path: impl Into<String>) -> Self {
        SourceFileReport {
            relative_path: relative_path.into(),
            mutants: Vec::new(),
            counts: MutationCounts::default(),
        }
    }

    /// Adds a mutant that belongs to this file.
    ///
    /// A mutant resolved to another relative path is rejected and leaves the
    /// report untouched.
    pub fn add_mutant(&mut self, mutant: Mutant) -> Result<()> {
        if mutant.relative_path() != self.relative_path {
            return Err(ReportError::PathMismatch {
                expected: self.relative_path.clone(),
                actual: mutant.relative_path().to_string(),
            });
        }
        self.counts.record(mutant.status(), mutant.detected());
        self.mutants.push(mutant);
        Ok(())
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn mutants(&self) -> &[Mutant] {
        &self.mutants
    }

    pub fn counts(&self) -> MutationCounts {
        self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.total
    }

    pub fn killed(&self) -> usize {
        self.counts.killed
    }

    pub fn survived(&self) -> usize {
        self.counts.survived
    }

    pub fn no_coverage(&self) -> usize {
        self.counts.no_coverage
    }

    pub fn other(&self) -> usize {
        self.counts.other
    }

    pub fn unknown(&self) -> usize {
        self.counts.unknown
    }

    pub fn detected(&self) -> usize {
        self.counts.detected
    }

    pub fn mutation_coverage(&self) -> f64 {
        self.counts.mutation_coverage()
    }

    pub fn meets_threshold(&self, threshold: u32) -> bool {
        self.counts.meets_threshold(threshold)
    }

    pub fn survivors(&self) -> impl Iterator<Item = &Mutant> {
        self.mutants
            .iter()
            .filter(|m| m.status() == MutantStatus::Survived)
    }

    /// Mutants grouped by ascending line number, keeping arrival order within
    /// a line. `None` when the report has no mutants.
    ///
    /// The output is compact JSON. Keys, key order and values are stable, but
    /// whitespace is not part of the format: compare parsed values, not raw
    /// strings.
    pub fn to_json(&self) -> Result<Option<String>> {
        if self.mutants.is_empty() {
            return Ok(None);
        }

        let mut by_line: BTreeMap<u32, Vec<MutantJson<'_>>> = BTreeMap::new();
        for mutant in &self.mutants {
            by_line
                .entry(mutant.line_number())
                .or_default()
                .push(MutantJson::from(mutant));
        }

        Ok(Some(serde_json::to_string(&by_line)?))
    }
}

/// Source file reports for one parsed report, keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct ProjectReport {
    source_files: BTreeMap<String, SourceFileReport>,
}

impl ProjectReport {
    pub fn new() -> Self {
        ProjectReport::default()
    }

    pub fn from_mutants<I>(mutants: I) -> Result<Self>
    where
        I: IntoIterator<Item = Mutant>,
    {
        let mut report = ProjectReport::new();
        for mutant in mutants {
            report.add_mutant(mutant)?;
        }
        Ok(report)
    }

    /// Files the mutant under its relative path, creating the file report on
    /// first sight.
    pub fn add_mutant(&mut self, mutant: Mutant) -> Result<()> {
        let relative_path = mutant.relative_path().to_string();
        self.source_files
            .entry(relative_path)
            .or_insert_with_key(|path| SourceFileReport::new(path.clone()))
            .add_mutant(mutant)
    }

    pub fn source_file_reports(&self) -> impl Iterator<Item = &SourceFileReport> {
        self.source_files.values()
    }

    pub fn source_file_report(&self, relative_path: &str) -> Option<&SourceFileReport> {
        self.source_files.get(relative_path)
    }

    pub fn totals(&self) -> MutationCounts {
        let mut totals = MutationCounts::default();
        for report in self.source_files.values() {
            totals += report.counts();
        }
        totals
    }

    pub fn survivors(&self) -> impl Iterator<Item = &Mutant> {
        self.source_files.values().flat_map(|r| r.survivors())
    }

    pub fn len(&self) -> usize {
        self.source_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_files.is_empty()
    }
}

/// Groups mutants into per-file reports.
pub fn aggregate<I>(mutants: I) -> Result<ProjectReport>
where
    I: IntoIterator<Item = Mutant>,
{
    let project = ProjectReport::from_mutants(mutants)?;
    let totals = project.totals();
    info!(
        "Aggregated {} mutants into {} source files ({} killed, {} survived, {} no coverage)",
        totals.total,
        project.len(),
        totals.killed,
        totals.survived,
        totals.no_coverage
    );
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::MutantLocation;
    use crate::mutator;

    const INLINE_CONSTANT_MUTATOR: &str =
        "org.pitest.mutationtest.engine.gregor.mutators.InlineConstantMutator";
    const RETURN_VALS_MUTATOR: &str =
        "org.pitest.mutationtest.engine.gregor.mutators.ReturnValsMutator";

    #[allow(clippy::too_many_arguments)]
    fn mutant(
        detected: bool,
        status: MutantStatus,
        class_name: &str,
        source_file: &str,
        method: &str,
        line: u32,
        mutator_key: &str,
        killing_test: Option<&str>,
    ) -> Mutant {
        let location = MutantLocation::new(class_name, source_file, method, "()V", line).unwrap();
        Mutant::new(
            detected,
            status,
            location,
            mutator::lookup(mutator_key),
            0,
            None,
            killing_test.map(String::from),
        )
    }

    fn qix(status: MutantStatus, line: u32) -> Mutant {
        mutant(
            false,
            status,
            "com.foo.bar.Qix",
            "Qix.java",
            "mutatedMethod",
            line,
            INLINE_CONSTANT_MUTATOR,
            None,
        )
    }

    #[test]
    fn test_json_for_one_line() {
        let m1 = mutant(
            true,
            MutantStatus::Killed,
            "com.foo.bar.Qix",
            "Qix.java",
            "mutatedMethod",
            17,
            INLINE_CONSTANT_MUTATOR,
            Some("killingtest93"),
        );
        let m2 = mutant(
            false,
            MutantStatus::Survived,
            "com.foo.bar.Qix",
            "Qix.java",
            "anotherMutatedMethod",
            17,
            RETURN_VALS_MUTATOR,
            None,
        );

        let mut report = SourceFileReport::new("com/foo/bar/Qix.java");
        report.add_mutant(m1).unwrap();
        report.add_mutant(m2).unwrap();

        let expected = concat!(
            r#"{"17":["#,
            r#"{"d":true,"s":"KILLED","c":"com.foo.bar.Qix","mname":"Inline Constant Mutator","#,
            r#""mdesc":"An inline constant has been changed","sourceFile":"Qix.java","#,
            r#""mmethod":"mutatedMethod","l":"17","killtest":"killingtest93"},"#,
            r#"{"d":false,"s":"SURVIVED","c":"com.foo.bar.Qix","mname":"Return Values Mutator","#,
            r#""mdesc":"The return value of a method call has been replaced","sourceFile":"Qix.java","#,
            r#""mmethod":"anotherMutatedMethod","l":"17"}"#,
            "]}"
        );
        assert_eq!(report.to_json().unwrap().unwrap(), expected);
    }

    #[test]
    fn test_json_lines_are_ascending() {
        let mut report = SourceFileReport::new("com/foo/bar/Qix.java");
        for line in [42, 7, 100, 7] {
            report.add_mutant(qix(MutantStatus::Killed, line)).unwrap();
        }

        let json = report.to_json().unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let lines: Vec<&String> = value.as_object().unwrap().keys().collect();

        assert!(json.starts_with(r#"{"7":["#));
        assert_eq!(lines.len(), 3);
        assert_eq!(value["7"].as_array().unwrap().len(), 2);
        assert!(json.find(r#""42""#).unwrap() < json.find(r#""100""#).unwrap());
    }

    #[test]
    fn test_json_compares_as_value() {
        let mut report = SourceFileReport::new("com/foo/bar/Qix.java");
        report.add_mutant(qix(MutantStatus::NoCoverage, 3)).unwrap();

        let json = report.to_json().unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let spaced: serde_json::Value = serde_json::from_str(
            r#"{ "3" : [ { "d" : false, "s" : "NO_COVERAGE", "c" : "com.foo.bar.Qix",
                "mname" : "Inline Constant Mutator", "mdesc" : "An inline constant has been changed",
                "sourceFile" : "Qix.java", "mmethod" : "mutatedMethod", "l" : "3" } ] }"#,
        )
        .unwrap();

        assert_eq!(value, spaced);
    }

    #[test]
    fn test_json_empty_report() {
        let report = SourceFileReport::new("FooBar.java");
        assert_eq!(report.to_json().unwrap(), None);
    }

    #[test]
    fn test_add_mutant_with_other_path_fails() {
        let foo = mutant(
            false,
            MutantStatus::Killed,
            "com.foo.bar.Foo",
            "Foo.kt",
            "mutatedMethod",
            42,
            "EXPERIMENTAL_MEMBER_VARIABLE",
            None,
        );

        let mut report = SourceFileReport::new("com/foo/bar/Qix.java");
        let err = report.add_mutant(foo).unwrap_err();

        assert!(err.is_invariant_violation());
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_collects_counts() {
        let mut report = SourceFileReport::new("com/foo/bar/Qix.java");
        for status in [
            MutantStatus::Killed,
            MutantStatus::Survived,
            MutantStatus::Killed,
            MutantStatus::NoCoverage,
            MutantStatus::Unknown,
            MutantStatus::Other,
        ] {
            report.add_mutant(qix(status, 17)).unwrap();
        }

        assert_eq!(report.total(), 6);
        assert_eq!(report.mutants().len(), 6);
        assert_eq!(report.killed(), 2);
        assert_eq!(report.survived(), 1);
        assert_eq!(report.no_coverage(), 1);
        assert_eq!(report.unknown(), 1);
        assert_eq!(report.other(), 1);
        assert!(report.counts().is_consistent());
        assert_eq!(report.survivors().count(), 1);
    }

    #[test]
    fn test_coverage_and_threshold() {
        let mut report = SourceFileReport::new("com/foo/bar/Qix.java");
        assert!(report.meets_threshold(100));
        assert_eq!(report.mutation_coverage(), 0.0);

        report.add_mutant(qix(MutantStatus::Killed, 1)).unwrap();
        report.add_mutant(qix(MutantStatus::Survived, 2)).unwrap();
        report.add_mutant(qix(MutantStatus::Survived, 3)).unwrap();

        assert!((report.mutation_coverage() - 33.333).abs() < 0.01);
        assert!(report.meets_threshold(33));
        assert!(!report.meets_threshold(34));
    }

    #[test]
    fn test_project_report_groups_by_path() {
        let mutants = vec![
            qix(MutantStatus::Killed, 1),
            mutant(
                true,
                MutantStatus::Killed,
                "com.foo.bar.Qix$Inner",
                "Qix.java",
                "inner",
                5,
                "MATH",
                Some("QixTest.inner"),
            ),
            mutant(
                false,
                MutantStatus::Survived,
                "some.Hello",
                "MainKotlin.kt",
                "hello",
                3,
                "MATH",
                None,
            ),
        ];

        let project = aggregate(mutants).unwrap();
        assert_eq!(project.len(), 2);

        let qix = project.source_file_report("com/foo/bar/Qix.java").unwrap();
        assert_eq!(qix.total(), 2);
        assert_eq!(qix.mutants()[1].location().class_name(), "com.foo.bar.Qix$Inner");

        let kotlin = project.source_file_report("MainKotlin.kt").unwrap();
        assert_eq!(kotlin.survived(), 1);

        let totals = project.totals();
        assert_eq!(totals.total, 3);
        assert_eq!(totals.killed, 2);
        assert_eq!(totals.detected, 1);
        assert!(totals.is_consistent());
        assert_eq!(project.survivors().count(), 1);
    }

    #[test]
    fn test_empty_project_report() {
        let project = aggregate(Vec::new()).unwrap();
        assert!(project.is_empty());
        assert_eq!(project.totals(), MutationCounts::default());
    }
}
