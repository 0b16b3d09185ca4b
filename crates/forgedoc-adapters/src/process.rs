//! Running external tools with input on stdin.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Program and argument template for an external tool.
///
/// The placeholder `{filename}` in any argument is replaced with the virtual
/// filename of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Arguments with `{filename}` substituted.
    pub fn args_for(&self, filename: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace("{filename}", filename))
            .collect()
    }

    /// Resolve the program on `PATH`.
    pub fn locate(&self) -> Option<PathBuf> {
        which::which(&self.program).ok()
    }
}

/// Run `program`, feeding `input` on stdin, and collect its output.
///
/// Stdin is written from a separate thread so a tool that starts writing
/// before it has read everything cannot deadlock against us.
pub(crate) fn run_with_stdin(
    program: &Path,
    args: &[String],
    input: &str,
) -> std::io::Result<Output> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| std::io::Error::other("child stdin unavailable"))?;
    let input = input.to_string();
    let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

    let output = child.wait_with_output()?;

    match writer.join() {
        Ok(Ok(())) => {}
        // The tool may exit without reading all input; its exit status says
        // whether that was a failure.
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
        Ok(Err(e)) => return Err(e),
        Err(_) => return Err(std::io::Error::other("stdin writer panicked")),
    }

    Ok(output)
}
