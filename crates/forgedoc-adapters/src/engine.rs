//! Macro engine reached through its command-line interface.

use std::path::PathBuf;

use crate::process::{run_with_stdin, CommandSpec};
use crate::traits::{EngineError, EngineOutput, MacroEngine};

/// A [`MacroEngine`] that runs an external executable per expansion.
///
/// The executable is resolved once, when the engine is created, and reused
/// for the life of the process. Source goes in on stdin; stdout is read as
/// `{"code": ..., "diagnostics": [...]}` JSON, or as plain expanded code when
/// it is not JSON.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
    spec: CommandSpec,
}

impl CommandEngine {
    /// Resolve the engine executable on `PATH`.
    pub fn locate(spec: CommandSpec) -> Result<Self, EngineError> {
        let program = spec
            .locate()
            .ok_or_else(|| EngineError::NotFound(spec.program.clone()))?;

        tracing::debug!("Using macro engine at {}", program.display());

        Ok(Self { program, spec })
    }

    /// Path of the resolved executable.
    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

impl MacroEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.spec.program
    }

    fn expand(&self, source: &str, filename: &str) -> Result<EngineOutput, EngineError> {
        let output = run_with_stdin(&self.program, &self.spec.args_for(filename), source)?;

        if !output.status.success() {
            return Err(EngineError::Failed {
                filename: filename.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| EngineError::Failed {
            filename: filename.to_string(),
            message: "output is not valid UTF-8".to_string(),
        })?;

        Ok(parse_output(stdout))
    }
}

/// Interpret engine stdout.
fn parse_output(stdout: String) -> EngineOutput {
    if stdout.trim_start().starts_with('{') {
        if let Ok(output) = serde_json::from_str::<EngineOutput>(&stdout) {
            return output;
        }
    }

    EngineOutput {
        code: stdout,
        diagnostics: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_output() {
        let output = parse_output(r#"{"code":"class A {}","diagnostics":[]}"#.to_string());
        assert_eq!(output.code, "class A {}");
    }

    #[test]
    fn falls_back_to_plain_text() {
        let output = parse_output("class A {}\n".to_string());

        assert_eq!(output.code, "class A {}\n");
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn brace_text_that_is_not_json_stays_code() {
        let output = parse_output("{ let x = 1; }".to_string());
        assert_eq!(output.code, "{ let x = 1; }");
    }

    #[test]
    fn missing_engine_is_reported() {
        let spec = CommandSpec::new("forgedoc-missing-engine", ["expand"]);

        assert!(matches!(
            CommandEngine::locate(spec),
            Err(EngineError::NotFound(name)) if name == "forgedoc-missing-engine"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn runs_engine_process() {
        let engine = CommandEngine::locate(CommandSpec::new("cat", Vec::<String>::new())).unwrap();
        let output = engine.expand("class A {}", "a.ts").unwrap();

        assert_eq!(output.code, "class A {}");
    }

    #[cfg(unix)]
    #[test]
    fn reports_nonzero_exit() {
        let engine = CommandEngine::locate(CommandSpec::new("false", Vec::<String>::new())).unwrap();

        assert!(matches!(
            engine.expand("class A {}", "a.ts"),
            Err(EngineError::Failed { filename, .. }) if filename == "a.ts"
        ));
    }
}
