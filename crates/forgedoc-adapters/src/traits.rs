//! Trait definitions for the external collaborators.

use serde::{Deserialize, Serialize};

/// Severity of an engine diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    #[default]
    Error,
    Warning,
    Info,
}

/// A diagnostic reported by the macro engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default)]
    pub level: DiagnosticLevel,
    pub message: String,
    /// Byte offset where the diagnostic starts, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    /// Byte offset where the diagnostic ends, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

/// Output of one engine invocation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineOutput {
    /// Expanded source text
    pub code: String,
    /// Diagnostics in the order the engine reported them
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Errors from the macro engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Macro engine not found: {0}")]
    NotFound(String),

    #[error("Failed to run macro engine: {0}")]
    Io(#[from] std::io::Error),

    #[error("Macro engine failed on {filename}: {message}")]
    Failed { filename: String, message: String },
}

/// Errors from the code formatter.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Failed to run formatter for {label}: {source}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Formatter exited with {status} for {label}: {stderr}")]
    Exit {
        label: String,
        status: String,
        stderr: String,
    },

    #[error("Formatter output for {label} exceeded {limit} bytes")]
    OutputTooLarge { label: String, limit: usize },

    #[error("Formatter output for {label} is not valid UTF-8")]
    InvalidUtf8 { label: String },
}

/// The macro expansion engine: source text in, expanded text out.
pub trait MacroEngine: Send + Sync {
    /// Engine identifier, for logs.
    fn name(&self) -> &str;

    /// Expand macros in `source`.
    ///
    /// # Arguments
    /// * `source` - TypeScript source containing macro annotations
    /// * `filename` - Virtual filename passed to the engine
    fn expand(&self, source: &str, filename: &str) -> Result<EngineOutput, EngineError>;
}

/// An external code formatter.
pub trait CodeFormatter: Send + Sync {
    /// Format `code`. `label` names the input in logs and errors.
    fn format(&self, code: &str, label: Option<&str>) -> Result<String, FormatError>;
}

/// Formatter that only trims its input.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughFormatter;

impl CodeFormatter for PassthroughFormatter {
    fn format(&self, code: &str, _label: Option<&str>) -> Result<String, FormatError> {
        Ok(code.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_engine_output_json() {
        let output: EngineOutput = serde_json::from_str(
            r#"{"code":"class A {}","diagnostics":[{"level":"warning","message":"unused","start":0,"end":5}]}"#,
        )
        .unwrap();

        assert_eq!(output.code, "class A {}");
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].level, DiagnosticLevel::Warning);
        assert_eq!(output.diagnostics[0].end, Some(5));
    }

    #[test]
    fn diagnostics_default_to_empty() {
        let output: EngineOutput = serde_json::from_str(r#"{"code":"x"}"#).unwrap();
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn passthrough_trims() {
        assert_eq!(PassthroughFormatter.format("  a\n", None).unwrap(), "a");
    }
}
