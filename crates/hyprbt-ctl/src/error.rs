use std::fmt;

/// The single failure kind produced by the adapter.
///
/// Every failed `bluetoothctl` interaction ends up here: the tool could not be
/// launched, it exited nonzero, or its reply lacked a line the caller needed.
/// There are no sub-codes. Callers display [`message`] and may
/// inspect [`output`], but must not branch on the text.
///
/// [`message`]: AdapterError::message
/// [`output`]: AdapterError::output
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AdapterError {
    subcommand: String,
    message: String,
    output: Option<String>,
}

impl AdapterError {
    /// The tool could not be started at all (not installed, not executable).
    pub(crate) fn launch(subcommand: &str, context: &str, err: &std::io::Error) -> Self {
        Self {
            subcommand: subcommand.to_string(),
            message: format!("{context}: {err}"),
            output: None,
        }
    }

    /// The tool ran but exited unsuccessfully.
    pub(crate) fn exit(
        subcommand: &str,
        context: &str,
        status: impl fmt::Display,
        output: &str,
    ) -> Self {
        let output = output.trim();
        let message = if output.is_empty() {
            format!("{context}: {status}")
        } else {
            format!("{context}: {status}, output: {}", one_line(output))
        };
        Self {
            subcommand: subcommand.to_string(),
            message,
            output: (!output.is_empty()).then(|| output.to_string()),
        }
    }

    /// The tool succeeded but its reply did not contain the expected field.
    pub(crate) fn missing(subcommand: &str, context: &str, output: &str) -> Self {
        let output = output.trim();
        Self {
            subcommand: subcommand.to_string(),
            message: context.to_string(),
            output: (!output.is_empty()).then(|| output.to_string()),
        }
    }

    /// The subcommand line that failed, e.g. `connect AA:BB:CC:DD:EE:FF`.
    pub fn subcommand(&self) -> &str {
        &self.subcommand
    }

    /// Human-readable description, suitable for the status line.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Combined stdout/stderr of the failed invocation, when there was any.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }
}

/// Non-blank lines of `output` joined with `"; "`.
fn one_line(output: &str) -> String {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}
