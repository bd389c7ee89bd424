//! A scripted [`CommandRunner`] for exercising the adapter without a real
//! Bluetooth stack.

use crate::runner::{CommandOutput, CommandRunner};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

/// Fake runner that answers from a script and records every invocation.
///
/// Replies are keyed by the full argument line (`"info AA:BB:CC:DD:EE:FF"`).
/// Unscripted invocations succeed with empty output, which is what
/// `bluetoothctl` prints for most successful one-shot commands. Clones share
/// the same script and call log, so a test can keep one clone for assertions
/// while the adapter owns another.
///
/// # Example
///
/// ```rust,ignore
/// let runner = ScriptedRunner::new()
///     .reply("devices", "Device AA:BB:CC:DD:EE:FF Headphones\n")
///     .fail("pair AA:BB:CC:DD:EE:FF", "Failed to pair");
/// let ctl = Bluetoothctl::new(runner.clone());
/// // ... drive ctl ...
/// assert_eq!(runner.count("connect"), 0);
/// ```
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    script: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    replies: HashMap<String, Reply>,
    calls: Vec<String>,
}

enum Reply {
    Output(CommandOutput),
    Unlaunchable,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `args` with a successful run printing `stdout`.
    pub fn reply(self, args: &str, stdout: &str) -> Self {
        self.insert(args, Reply::Output(CommandOutput::ok(stdout)))
    }

    /// Answer `args` with exit status 1 and `stderr`.
    pub fn fail(self, args: &str, stderr: &str) -> Self {
        self.insert(args, Reply::Output(CommandOutput::failed(1, stderr)))
    }

    /// Make `args` fail to launch, as if the binary were missing.
    pub fn unlaunchable(self, args: &str) -> Self {
        self.insert(args, Reply::Unlaunchable)
    }

    /// Every invocation so far, in order, as space-joined argument lines.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of invocations whose first argument is `subcommand`.
    pub fn count(&self, subcommand: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.split(' ').next() == Some(subcommand))
            .count()
    }

    fn insert(self, args: &str, reply: Reply) -> Self {
        self.lock().replies.insert(args.to_string(), reply);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, args: &[&str]) -> io::Result<CommandOutput> {
        let line = args.join(" ");
        let mut script = self.lock();
        script.calls.push(line.clone());
        match script.replies.get(&line) {
            Some(Reply::Output(output)) => Ok(output.clone()),
            Some(Reply::Unlaunchable) => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "No such file or directory",
            )),
            None => Ok(CommandOutput::ok("")),
        }
    }
}
