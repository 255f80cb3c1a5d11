//! Diagnostics collected during a parse.
//!
//! A [`Report`] holds at most one [`ErrorCode`] annotation and any number of
//! [`WarningCode`] annotations. Warnings never stop parsing; the first error
//! does, and later errors are dropped.

use std::fmt;

use apiblueprint_markdown::SourceRanges;
use serde::Serialize;

/// Warning categories with their stable numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum WarningCode {
    ApiName = 1,
    Duplicate = 2,
    Formatting = 3,
    Redefinition = 4,
    Ignoring = 5,
    EmptyDefinition = 6,
    NotEmptyDefinition = 7,
    LogicalError = 8,
    Deprecated = 9,
    Indentation = 10,
    Ambiguity = 11,
    Uri = 12,
}

/// Error categories with their stable numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum ErrorCode {
    Application = 1,
    Business = 2,
    Symbol = 3,
    Model = 4,
}

impl WarningCode {
    pub fn name(self) -> &'static str {
        match self {
            WarningCode::ApiName => "api-name",
            WarningCode::Duplicate => "duplicate",
            WarningCode::Formatting => "formatting",
            WarningCode::Redefinition => "redefinition",
            WarningCode::Ignoring => "ignoring",
            WarningCode::EmptyDefinition => "empty-definition",
            WarningCode::NotEmptyDefinition => "not-empty-definition",
            WarningCode::LogicalError => "logical-error",
            WarningCode::Deprecated => "deprecated",
            WarningCode::Indentation => "indentation",
            WarningCode::Ambiguity => "ambiguity",
            WarningCode::Uri => "uri",
        }
    }
}

impl ErrorCode {
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::Application => "application",
            ErrorCode::Business => "business",
            ErrorCode::Symbol => "symbol",
            ErrorCode::Model => "model",
        }
    }
}

impl From<WarningCode> for u8 {
    fn from(code: WarningCode) -> Self {
        code as u8
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        code as u8
    }
}

/// One diagnostic: a code, a message, and the bytes it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation<C> {
    pub code: C,
    pub message: String,
    pub location: SourceRanges,
}

pub type Warning = Annotation<WarningCode>;
pub type Error = Annotation<ErrorCode>;

impl<C> Annotation<C> {
    pub fn new(code: C, message: impl Into<String>, location: SourceRanges) -> Self {
        Self {
            code,
            message: message.into(),
            location,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub error: Option<Error>,
    pub warnings: Vec<Warning>,
}

impl Report {
    pub fn warn(&mut self, code: WarningCode, message: impl Into<String>, location: &SourceRanges) {
        self.warnings
            .push(Annotation::new(code, message, location.clone()));
    }

    /// Records an error unless one is already present.
    pub fn fail(&mut self, code: ErrorCode, message: impl Into<String>, location: &SourceRanges) {
        if self.error.is_none() {
            self.error = Some(Annotation::new(code, message, location.clone()));
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_clean(&self) -> bool {
        self.error.is_none() && self.warnings.is_empty()
    }

    /// Warning codes in the order they were reported.
    pub fn warning_codes(&self) -> Vec<WarningCode> {
        self.warnings.iter().map(|w| w.code).collect()
    }

    /// Appends another report; its error is kept only if this one has none.
    pub fn merge(&mut self, other: Report) {
        if self.error.is_none() {
            self.error = other.error;
        }
        self.warnings.extend(other.warnings);
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.error {
            writeln!(f, "error({}): {}", error.code.name(), error.message)?;
        }
        for warning in &self.warnings {
            writeln!(f, "warning({}): {}", warning.code.name(), warning.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn first_error_wins() {
        let mut report = Report::default();
        report.fail(ErrorCode::Business, "first", &SourceRanges::new());
        report.fail(ErrorCode::Symbol, "second", &SourceRanges::new());

        let error = report.error.as_ref().map(|e| e.message.as_str());
        assert_eq!(error, Some("first"));
    }

    #[test]
    fn numeric_codes_are_stable() {
        assert_eq!(u8::from(WarningCode::Duplicate), 2);
        assert_eq!(u8::from(WarningCode::Uri), 12);
        assert_eq!(u8::from(ErrorCode::Symbol), 3);
    }

    #[test]
    fn display_lists_error_then_warnings() {
        let mut report = Report::default();
        report.warn(WarningCode::Ignoring, "ignoring unrecognized block", &SourceRanges::new());
        report.fail(ErrorCode::Business, "expected API name", &SourceRanges::new());

        assert_snapshot!(report.to_string().trim_end(), @r"
        error(business): expected API name
        warning(ignoring): ignoring unrecognized block
        ");
    }

    #[test]
    fn merge_keeps_existing_error() {
        let mut report = Report::default();
        report.fail(ErrorCode::Business, "mine", &SourceRanges::new());
        let mut other = Report::default();
        other.fail(ErrorCode::Symbol, "theirs", &SourceRanges::new());
        other.warn(WarningCode::Duplicate, "dup", &SourceRanges::new());

        report.merge(other);
        assert_eq!(report.error.map(|e| e.code), Some(ErrorCode::Business));
        assert_eq!(report.warnings.len(), 1);
    }
}
