//! Macro expansion for documentation examples.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::traits::{CodeFormatter, Diagnostic, EngineError, FormatError, MacroEngine};

/// The macroforge import line, removed from expanded output for display.
static MACROFORGE_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^import\s+\{[^}]+\}\s+from\s+['"]macroforge['"];\s*\n?"#)
        .expect("Invalid macroforge import regex")
});

/// Expanded engine output ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expansion {
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// A source example and its expansion, both formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedExample {
    pub before: String,
    pub after: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Errors from expanding an example.
#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Remove the first `import { ... } from "macroforge";` line.
pub fn strip_macroforge_import(code: &str) -> String {
    MACROFORGE_IMPORT_RE.replace(code, "").into_owned()
}

/// Calls the macro engine and formatter for documentation examples.
///
/// Holds the engine for the life of the process; results are not cached.
#[derive(Clone)]
pub struct MacroExpander {
    engine: Arc<dyn MacroEngine>,
    formatter: Arc<dyn CodeFormatter>,
}

impl std::fmt::Debug for MacroExpander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacroExpander")
            .field("engine", &self.engine.name())
            .finish_non_exhaustive()
    }
}

impl MacroExpander {
    pub fn new(engine: Arc<dyn MacroEngine>, formatter: Arc<dyn CodeFormatter>) -> Self {
        Self { engine, formatter }
    }

    /// Expand `source` and strip the macroforge import from the result.
    pub fn expand(&self, source: &str, filename: &str) -> Result<Expansion, EngineError> {
        let output = self.engine.expand(source, filename)?;

        Ok(Expansion {
            code: strip_macroforge_import(&output.code),
            diagnostics: output.diagnostics,
        })
    }

    /// Expand `source` and format the expanded code.
    pub fn expand_formatted(&self, source: &str, filename: &str) -> Result<Expansion, ExpandError> {
        let expansion = self.expand(source, filename)?;
        let code = self.formatter.format(&expansion.code, Some(filename))?;

        Ok(Expansion {
            code,
            diagnostics: expansion.diagnostics,
        })
    }

    /// Expand an example, formatting both the source and the expansion.
    pub fn expand_example(
        &self,
        source: &str,
        filename: &str,
    ) -> Result<ExpandedExample, ExpandError> {
        let expansion = self.expand(source, filename)?;
        let after = self.formatter.format(&expansion.code, Some(filename))?;
        let before = self.formatter.format(source.trim(), Some(filename))?;

        Ok(ExpandedExample {
            before,
            after,
            diagnostics: expansion.diagnostics,
        })
    }

    /// Expand several keyed examples; each uses `{key}.ts` as its filename.
    pub fn expand_examples(
        &self,
        examples: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, ExpandedExample>, ExpandError> {
        examples
            .iter()
            .map(|(key, source)| {
                let example = self.expand_example(source, &format!("{}.ts", key))?;
                Ok((key.clone(), example))
            })
            .collect()
    }

    /// The formatter shared with other pipeline stages.
    pub fn formatter(&self) -> &Arc<dyn CodeFormatter> {
        &self.formatter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{EngineOutput, PassthroughFormatter};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Engine that appends a generated method and records filenames.
    #[derive(Default)]
    struct StubEngine {
        seen: Mutex<Vec<String>>,
    }

    impl MacroEngine for StubEngine {
        fn name(&self) -> &str {
            "stub"
        }

        fn expand(&self, source: &str, filename: &str) -> Result<EngineOutput, EngineError> {
            self.seen.lock().unwrap().push(filename.to_string());
            if source.contains("@derive(Broken)") {
                return Err(EngineError::Failed {
                    filename: filename.to_string(),
                    message: "unknown macro".to_string(),
                });
            }
            Ok(EngineOutput {
                code: format!("{}\n// generated", source.trim()),
                diagnostics: Vec::new(),
            })
        }
    }

    struct FailingFormatter;

    impl CodeFormatter for FailingFormatter {
        fn format(&self, _code: &str, label: Option<&str>) -> Result<String, FormatError> {
            Err(FormatError::InvalidUtf8 {
                label: label.unwrap_or("?").to_string(),
            })
        }
    }

    fn expander() -> (Arc<StubEngine>, MacroExpander) {
        let engine = Arc::new(StubEngine::default());
        let expander = MacroExpander::new(engine.clone(), Arc::new(PassthroughFormatter));
        (engine, expander)
    }

    #[test]
    fn strips_first_macroforge_import() {
        let code = "import { Debug } from \"macroforge\";\nclass A {}\n";
        assert_eq!(strip_macroforge_import(code), "class A {}\n");
    }

    #[test]
    fn keeps_other_imports() {
        let code = "import { x } from 'other';\nclass A {}";
        assert_eq!(strip_macroforge_import(code), code);
    }

    #[test]
    fn strips_only_the_first_match() {
        let code = "import { A } from 'macroforge';\nimport { B } from 'macroforge';\nx";
        assert_eq!(
            strip_macroforge_import(code),
            "import { B } from 'macroforge';\nx"
        );
    }

    #[test]
    fn expands_example() {
        let (_, expander) = expander();
        let source = "import { Debug } from \"macroforge\";\n/** @derive(Debug) */\nclass A {}\n";

        let example = expander.expand_example(source, "a.ts").unwrap();

        assert_eq!(example.before, source.trim());
        assert_eq!(example.after, "/** @derive(Debug) */\nclass A {}\n// generated");
    }

    #[test]
    fn expands_keyed_examples_with_key_filenames() {
        let (engine, expander) = expander();
        let mut examples = BTreeMap::new();
        examples.insert("basic".to_string(), "class A {}".to_string());
        examples.insert("skip".to_string(), "class B {}".to_string());

        let expanded = expander.expand_examples(&examples).unwrap();

        assert_eq!(expanded.len(), 2);
        assert_eq!(*engine.seen.lock().unwrap(), vec!["basic.ts", "skip.ts"]);
    }

    #[test]
    fn engine_failure_propagates() {
        let (_, expander) = expander();

        assert!(matches!(
            expander.expand_example("/** @derive(Broken) */ class A {}", "a.ts"),
            Err(ExpandError::Engine(_))
        ));
    }

    #[test]
    fn formatter_failure_propagates() {
        let expander = MacroExpander::new(Arc::new(StubEngine::default()), Arc::new(FailingFormatter));

        assert!(matches!(
            expander.expand_formatted("class A {}", "a.ts"),
            Err(ExpandError::Format(_))
        ));
    }
}
