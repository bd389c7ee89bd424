use crate::command::{Command, CommandInner};
use crate::model::Model;
use crate::subscription::SubscriptionManager;
use futures::future::{self, BoxFuture, FutureExt};
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout, Stdout};
use std::sync::Once;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Messages handled back to back before the next frame gets a chance to draw.
const DRAIN_LIMIT: u32 = 100;
const DRAIN_BUDGET: Duration = Duration::from_micros(100);

/// Failure to set up, draw on, or tear down the terminal.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

/// Terminal and loop settings for a [`Program`].
///
/// ```rust,ignore
/// let opts = ProgramOptions {
///     mouse_capture: true,
///     title: Some("hyprbt".into()),
///     ..ProgramOptions::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ProgramOptions {
    /// Redraw rate cap (default: 60, clamped to 1..=120).
    pub fps: u32,
    /// Draw on the alternate screen (default: true).
    pub alt_screen: bool,
    /// Report clicks and wheel events (default: false).
    pub mouse_capture: bool,
    pub title: Option<String>,
    /// Put the terminal back before a panic message prints (default: true).
    pub catch_panics: bool,
    /// Stop on SIGINT sent from outside the terminal (default: true).
    pub handle_signals: bool,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            fps: 60,
            alt_screen: true,
            mouse_capture: false,
            title: None,
            catch_panics: true,
            handle_signals: true,
        }
    }
}

/// Drives a [`Model`] against the real terminal.
///
/// One loop task owns the model. It takes messages off a single queue in
/// arrival order, applies each with [`Model::update`], spawns whatever the
/// returned [`Command`] asks for, and redraws at most once per frame.
/// Futures from [`Command::perform`] run as their own tokio tasks and only
/// talk back by pushing their result onto the queue.
///
/// ```rust,ignore
/// let app = Program::<App>::with_options(flags, options)?.run().await?;
/// ```
pub struct Program<M: Model> {
    model: M,
    terminal: Terminal<CrosstermBackend<Stdout>>,
    guard: TerminalGuard,
    queue_tx: mpsc::UnboundedSender<M::Message>,
    queue_rx: mpsc::UnboundedReceiver<M::Message>,
    subscriptions: SubscriptionManager<M::Message>,
    fps: u32,
    handle_signals: bool,
    dirty: bool,
    quitting: bool,
}

impl<M: Model> Program<M> {
    /// Take over the terminal and run [`Model::init`].
    ///
    /// Fails if the terminal cannot enter raw mode.
    pub fn with_options(flags: M::Flags, options: ProgramOptions) -> Result<Self, ProgramError> {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let guard = TerminalGuard::acquire(&options)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        let (model, init) = M::init(flags);

        let mut program = Self {
            model,
            terminal,
            guard,
            subscriptions: SubscriptionManager::new(queue_tx.clone()),
            queue_tx,
            queue_rx,
            fps: options.fps.clamp(1, 120),
            handle_signals: options.handle_signals,
            dirty: true,
            quitting: false,
        };
        program.execute(init);
        program.subscriptions.reconcile(program.model.subscriptions());
        debug!("program initialized");
        Ok(program)
    }

    /// Loop until the model quits, then hand the final model back.
    ///
    /// The terminal is restored on every exit path.
    pub async fn run(mut self) -> Result<M, ProgramError> {
        let outcome = self.event_loop().await;
        debug!("shutting down");
        self.subscriptions.shutdown();
        let released = self.guard.release();
        outcome?;
        released?;
        Ok(self.model)
    }

    async fn event_loop(&mut self) -> Result<(), ProgramError> {
        self.draw()?;

        let mut frames = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(self.fps)));
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut interrupted = interrupt(self.handle_signals);

        while !self.quitting {
            tokio::select! {
                biased;

                _ = &mut interrupted => {
                    info!("interrupted");
                    break;
                }

                Some(msg) = self.queue_rx.recv() => {
                    self.apply(msg);
                    self.drain_ready();
                }

                _ = frames.tick() => {
                    if self.dirty {
                        self.draw()?;
                        self.dirty = false;
                    }
                }
            }
        }
        Ok(())
    }

    /// Handle messages that are already queued, within a small budget, so a
    /// burst of results lands in one frame.
    fn drain_ready(&mut self) {
        let deadline = Instant::now() + DRAIN_BUDGET;
        for _ in 0..DRAIN_LIMIT {
            if self.quitting || Instant::now() >= deadline {
                return;
            }
            match self.queue_rx.try_recv() {
                Ok(msg) => self.apply(msg),
                Err(_) => return,
            }
        }
    }

    fn apply(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.execute(cmd);
        self.subscriptions.reconcile(self.model.subscriptions());
        self.dirty = true;
    }

    fn execute(&mut self, cmd: Command<M::Message>) {
        match cmd.inner {
            CommandInner::None => {}
            CommandInner::Message(msg) => {
                let _ = self.queue_tx.send(msg);
            }
            CommandInner::Quit => {
                debug!("quit requested");
                self.quitting = true;
            }
            CommandInner::Future(task) => {
                let queue = self.queue_tx.clone();
                tokio::spawn(async move {
                    // Fails only once the loop is gone, when nobody cares.
                    let _ = queue.send(task.await);
                });
            }
            CommandInner::Batch(cmds) => cmds.into_iter().for_each(|cmd| self.execute(cmd)),
        }
    }

    fn draw(&mut self) -> Result<(), ProgramError> {
        let model = &self.model;
        self.terminal.draw(|frame| model.view(frame))?;
        Ok(())
    }
}

/// Resolves on the first SIGINT. Built once per loop so the listener stays
/// registered between iterations. Never resolves when `enabled` is false.
fn interrupt(enabled: bool) -> BoxFuture<'static, ()> {
    if !enabled {
        return future::pending().boxed();
    }
    async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "cannot listen for SIGINT");
            future::pending::<()>().await;
        }
    }
    .boxed()
}

/// Terminal modes switched on by [`Program`]. Switched back off on
/// [`release`](Self::release), or on drop if the program unwinds first.
struct TerminalGuard {
    alt_screen: bool,
    active: bool,
}

impl TerminalGuard {
    fn acquire(options: &ProgramOptions) -> io::Result<Self> {
        if options.catch_panics {
            install_panic_hook(options.alt_screen);
        }

        enable_raw_mode()?;
        let guard = Self {
            alt_screen: options.alt_screen,
            active: true,
        };

        let mut out = stdout();
        if options.alt_screen {
            execute!(out, EnterAlternateScreen)?;
        }
        if options.mouse_capture {
            execute!(out, EnableMouseCapture)?;
        }
        if let Some(title) = &options.title {
            execute!(out, SetTitle(title))?;
        }
        execute!(out, cursor::Hide)?;
        Ok(guard)
    }

    fn release(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        restore(self.alt_screen)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

fn install_panic_hook(alt_screen: bool) {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = restore(alt_screen);
            previous(info);
        }));
    });
}

/// Undo every mode the guard may have set. Keeps going after a failed step so
/// as much of the terminal as possible comes back; reports the raw-mode result.
fn restore(alt_screen: bool) -> io::Result<()> {
    let raw = disable_raw_mode();
    let mut out = stdout();
    execute!(out, DisableMouseCapture).ok();
    execute!(out, cursor::Show).ok();
    if alt_screen {
        execute!(out, LeaveAlternateScreen).ok();
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let opts = ProgramOptions::default();
        assert_eq!(opts.fps, 60);
        assert!(opts.alt_screen);
        assert!(!opts.mouse_capture);
        assert!(opts.catch_panics);
        assert!(opts.handle_signals);
        assert!(opts.title.is_none());
    }

    #[test]
    fn program_error_display() {
        let err = ProgramError::from(io::Error::other("not a tty"));
        assert_eq!(err.to_string(), "terminal error: not a tty");
    }

    #[tokio::test]
    async fn interrupt_listener_survives_repeated_polls() {
        let mut interrupted = interrupt(true);
        for _ in 0..3 {
            assert!(futures::poll!(&mut interrupted).is_pending());
        }
        let mut disabled = interrupt(false);
        assert!(futures::poll!(&mut disabled).is_pending());
    }

    #[test]
    fn released_guard_does_not_restore_twice() {
        let mut guard = TerminalGuard {
            alt_screen: false,
            active: false,
        };
        assert!(guard.release().is_ok());
        assert!(!guard.active);
    }
}
