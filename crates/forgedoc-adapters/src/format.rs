//! Code formatter invoked as a subprocess.

use std::path::PathBuf;

use serde::Deserialize;

use crate::process::{run_with_stdin, CommandSpec};
use crate::traits::{CodeFormatter, FormatError};

/// Default ceiling for formatter output (10 MiB).
pub const DEFAULT_MAX_OUTPUT: usize = 10 * 1024 * 1024;

/// Build mode, which decides what a formatter failure means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Formatting failures are logged and the input is used unformatted.
    #[default]
    Development,
    /// Formatting failures fail the build.
    Production,
}

impl BuildMode {
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// A [`CodeFormatter`] backed by an external command such as Biome.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    spec: CommandSpec,
    program: PathBuf,
    mode: BuildMode,
    max_output: usize,
    filename: String,
}

impl CommandFormatter {
    /// Create a formatter for `spec`.
    ///
    /// The program is resolved on `PATH` once, here; when it cannot be found
    /// the name is kept as-is and the failure surfaces on the first
    /// [`format`](CodeFormatter::format) call under the mode's policy.
    pub fn new(spec: CommandSpec, mode: BuildMode) -> Self {
        let program = spec
            .locate()
            .unwrap_or_else(|| PathBuf::from(&spec.program));

        Self {
            spec,
            program,
            mode,
            max_output: DEFAULT_MAX_OUTPUT,
            filename: "example.ts".to_string(),
        }
    }

    /// Biome via `npx`, reading TypeScript from stdin.
    pub fn biome(mode: BuildMode) -> Self {
        Self::new(
            CommandSpec::new("npx", ["biome", "format", "--stdin-file-path={filename}"]),
            mode,
        )
    }

    /// Set the output ceiling in bytes.
    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }

    /// Set the virtual filename handed to the formatter.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    fn run(&self, code: &str, label: &str) -> Result<String, FormatError> {
        let output = run_with_stdin(&self.program, &self.spec.args_for(&self.filename), code)
            .map_err(|source| FormatError::Spawn {
                label: label.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(FormatError::Exit {
                label: label.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if output.stdout.len() > self.max_output {
            return Err(FormatError::OutputTooLarge {
                label: label.to_string(),
                limit: self.max_output,
            });
        }

        let formatted = String::from_utf8(output.stdout).map_err(|_| FormatError::InvalidUtf8 {
            label: label.to_string(),
        })?;

        Ok(formatted.trim().to_string())
    }
}

impl CodeFormatter for CommandFormatter {
    fn format(&self, code: &str, label: Option<&str>) -> Result<String, FormatError> {
        let label = label.unwrap_or(self.filename.as_str());

        match self.run(code, label) {
            Ok(formatted) => Ok(formatted),
            Err(e) if self.mode.is_production() => Err(e),
            Err(e) => {
                tracing::warn!("Formatting skipped: {}", e);
                Ok(code.trim().to_string())
            }
        }
    }
}
