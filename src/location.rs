use crate::error::{ReportError, Result};
use serde::Serialize;

const INNER_CLASS_SEPARATOR: char = '$';

/// Language of a mutated source file, judged by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    Java,
    Kotlin,
    Scala,
    Groovy,
}

impl SourceLanguage {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "java" => Some(SourceLanguage::Java),
            "kt" => Some(SourceLanguage::Kotlin),
            "scala" => Some(SourceLanguage::Scala),
            "groovy" => Some(SourceLanguage::Groovy),
            _ => None,
        }
    }
}

/// Derives the project-relative path of the file a mutated class lives in.
///
/// Java files map to the package directory of the outermost class, so
/// `com.foo.Bar$1` recorded in `Bar.java` becomes `com/foo/Bar.java`. Files
/// in the other JVM languages keep the recorded name as is.
pub fn resolve_relative_path(class_name: &str, source_file: &str) -> Result<String> {
    let extension = source_file
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default();

    match SourceLanguage::from_extension(extension) {
        Some(SourceLanguage::Java) => {
            let outer_class = class_name
                .split(INNER_CLASS_SEPARATOR)
                .next()
                .unwrap_or_default();
            if outer_class.is_empty() {
                return Err(ReportError::InvalidInput(format!(
                    "missing mutated class for source file {}",
                    source_file
                )));
            }
            Ok(format!("{}.{}", outer_class.replace('.', "/"), extension))
        }
        Some(_) => Ok(source_file.to_string()),
        None => Err(ReportError::UnsupportedExtension {
            source_file: source_file.to_string(),
            extension: extension.to_string(),
        }),
    }
}

/// Where a mutant was applied. The relative path is computed on
/// construction and never stored independently of the class and file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutantLocation {
    class_name: String,
    source_file: String,
    mutated_method: String,
    method_descriptor: String,
    line_number: u32,
    relative_path: String,
}

impl MutantLocation {
    pub fn new(
        class_name: impl Into<String>,
        source_file: impl Into<String>,
        mutated_method: impl Into<String>,
        method_descriptor: impl Into<String>,
        line_number: u32,
    ) -> Result<Self> {
        let class_name = class_name.into();
        let source_file = source_file.into();
        let relative_path = resolve_relative_path(&class_name, &source_file)?;

        Ok(MutantLocation {
            class_name,
            source_file,
            mutated_method: mutated_method.into(),
            method_descriptor: method_descriptor.into(),
            line_number,
            relative_path,
        })
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn mutated_method(&self) -> &str {
        &self.mutated_method
    }

    pub fn method_descriptor(&self) -> &str {
        &self.method_descriptor
    }

    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_java() {
        assert_eq!(
            resolve_relative_path("com.foo.Bar", "Bar.java").unwrap(),
            "com/foo/Bar.java"
        );
    }

    #[test]
    fn test_relative_path_java_inner_class() {
        assert_eq!(
            resolve_relative_path("com.foo.Bar$1", "Bar.java").unwrap(),
            "com/foo/Bar.java"
        );
        assert_eq!(
            resolve_relative_path("com.foo.Bar$Inner$2", "Bar.java").unwrap(),
            "com/foo/Bar.java"
        );
    }

    #[test]
    fn test_relative_path_default_package() {
        assert_eq!(resolve_relative_path("Bar", "Bar.java").unwrap(), "Bar.java");
    }

    #[test]
    fn test_relative_path_kotlin_passes_through() {
        assert_eq!(
            resolve_relative_path("some.Hello", "MainKotlin.kt").unwrap(),
            "MainKotlin.kt"
        );
    }

    #[test]
    fn test_unsupported_extension_fails() {
        let err = resolve_relative_path("com.foo.Bar", "Bar.cpp").unwrap_err();
        assert!(err.is_invariant_violation());

        let err = resolve_relative_path("com.foo.Bar", "").unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedExtension { .. }));
    }

    #[test]
    fn test_java_file_without_class_fails() {
        assert!(resolve_relative_path("", "Bar.java").is_err());
    }

    #[test]
    fn test_location_derives_path() {
        let location =
            MutantLocation::new("com.foo.bar.Qix$Inner", "Qix.java", "compute", "()V", 17).unwrap();

        assert_eq!(location.relative_path(), "com/foo/bar/Qix.java");
        assert_eq!(location.class_name(), "com.foo.bar.Qix$Inner");
        assert_eq!(location.line_number(), 17);
    }
}
