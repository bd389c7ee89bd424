use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;

/// Captured result of one finished `bluetoothctl` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run that printed `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A run that exited with `code` and printed `stderr`.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr, the way a terminal would have shown them.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }

    /// Displayable exit status, e.g. `exit status 1`.
    pub fn status(&self) -> ExitDescription {
        ExitDescription(self.code)
    }
}

/// `Display` wrapper for an exit code.
#[derive(Debug, Clone, Copy)]
pub struct ExitDescription(Option<i32>);

impl fmt::Display for ExitDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit status {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Executes the control tool with a list of arguments.
///
/// This is the only seam between the adapter and the operating system.
/// [`SystemRunner`] spawns the real binary; tests substitute
/// [`ScriptedRunner`](crate::testing::ScriptedRunner).
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the tool to completion and capture its output.
    ///
    /// An `Err` means the process could not be launched. A process that ran
    /// and failed is an `Ok` whose [`CommandOutput::success`] is false.
    async fn run(&self, args: &[&str]) -> io::Result<CommandOutput>;
}

/// Runs the real `bluetoothctl` (or a replacement binary) as a subprocess.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    program: PathBuf,
}

impl SystemRunner {
    /// Use the tool at `program`, resolved through `PATH` if relative.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new("bluetoothctl")
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, args: &[&str]) -> io::Result<CommandOutput> {
        // stdin is closed so the tool never drops into its interactive shell.
        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
