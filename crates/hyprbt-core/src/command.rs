use futures::future::BoxFuture;
use std::future::Future;

/// A side effect returned from [`Model::update`](crate::Model::update) or
/// [`Model::init`](crate::Model::init).
///
/// The runtime executes commands; models only describe them. A future passed
/// to [`Command::perform`] runs as its own tokio task and its output comes
/// back through `update` as a single message, so background work never
/// touches the model directly.
///
/// # Examples
///
/// ```rust,ignore
/// // Do nothing:
/// let cmd = Command::none();
///
/// // Query the controller in the background:
/// let cmd = Command::perform(
///     async move { ctl.is_powered().await },
///     Msg::PowerChecked,
/// );
///
/// // Quit the program:
/// let cmd = Command::quit();
/// ```
pub struct Command<Msg: Send + 'static> {
    pub(crate) inner: CommandInner<Msg>,
}

pub(crate) enum CommandInner<Msg: Send + 'static> {
    None,
    Message(Msg),
    Quit,
    Future(BoxFuture<'static, Msg>),
    Batch(Vec<Command<Msg>>),
}

impl<Msg: Send + 'static> Command<Msg> {
    /// No-op command.
    pub fn none() -> Self {
        Command {
            inner: CommandInner::None,
        }
    }

    /// Run an async future as a background task, map the result to a message.
    pub fn perform<F, T>(future: F, map: impl FnOnce(T) -> Msg + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Command {
            inner: CommandInner::Future(Box::pin(async move { map(future.await) })),
        }
    }

    /// Deliver a message on the next loop iteration without spawning a task.
    pub fn message(msg: Msg) -> Self {
        Command {
            inner: CommandInner::Message(msg),
        }
    }

    /// Quit the program.
    pub fn quit() -> Self {
        Command {
            inner: CommandInner::Quit,
        }
    }

    /// Combine commands. No-ops are dropped, and a single survivor is
    /// returned as is.
    ///
    /// Each future in the batch is spawned separately; their messages arrive
    /// in completion order.
    pub fn batch(cmds: impl IntoIterator<Item = Command<Msg>>) -> Self {
        let mut cmds: Vec<_> = cmds.into_iter().filter(|cmd| !cmd.is_none()).collect();
        match cmds.len() {
            0 => Command::none(),
            1 => cmds.remove(0),
            _ => Command {
                inner: CommandInner::Batch(cmds),
            },
        }
    }

    /// Whether this command does nothing.
    pub fn is_none(&self) -> bool {
        matches!(self.inner, CommandInner::None)
    }

    /// Whether this command ends the program.
    pub fn is_quit(&self) -> bool {
        matches!(self.inner, CommandInner::Quit)
    }

    /// The message, for an immediate-message command.
    pub fn into_message(self) -> Option<Msg> {
        match self.inner {
            CommandInner::Message(msg) => Some(msg),
            _ => None,
        }
    }

    /// The parts, for a batch.
    pub fn into_batch(self) -> Option<Vec<Command<Msg>>> {
        match self.inner {
            CommandInner::Batch(cmds) => Some(cmds),
            _ => None,
        }
    }

    /// Await this command's futures inline and collect every message it
    /// would have produced, in batch order.
    ///
    /// The runtime never calls this; it exists so tests can drive background
    /// work to completion without a terminal.
    pub async fn collect(self) -> Vec<Msg> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(cmd) = stack.pop() {
            match cmd.inner {
                CommandInner::None | CommandInner::Quit => {}
                CommandInner::Message(msg) => out.push(msg),
                CommandInner::Future(fut) => out.push(fut.await),
                CommandInner::Batch(cmds) => stack.extend(cmds.into_iter().rev()),
            }
        }
        out
    }
}

impl<Msg: Send + 'static> std::fmt::Debug for Command<Msg> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            CommandInner::None => f.write_str("Command::None"),
            CommandInner::Message(_) => f.write_str("Command::Message"),
            CommandInner::Quit => f.write_str("Command::Quit"),
            CommandInner::Future(_) => f.write_str("Command::Future"),
            CommandInner::Batch(cmds) => f.debug_tuple("Command::Batch").field(cmds).finish(),
        }
    }
}
