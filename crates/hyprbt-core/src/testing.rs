use crate::command::{Command, CommandInner};
use crate::model::Model;
use ratatui::backend::TestBackend;
use ratatui::buffer::{Buffer, Cell};
use ratatui::Terminal;

/// Runs a [`Model`] with no terminal and no executor.
///
/// Commands are recorded, not executed: immediate messages wait in a queue
/// until [`flush`](TestProgram::flush), background futures are only counted
/// and then dropped. A test plays the part of those futures by
/// [`send`](TestProgram::send)ing the result messages itself.
///
/// ```rust,ignore
/// let mut prog = TestProgram::<App>::new(flags);
/// prog.send(Msg::DevicesLoaded(devices));
/// assert_eq!(prog.model().cursor(), 0);
/// assert!(prog.render_string(60, 20).contains("Headphones"));
/// ```
pub struct TestProgram<M: Model> {
    model: M,
    queued: Vec<M::Message>,
    spawned: usize,
    quit: bool,
}

impl<M: Model> TestProgram<M> {
    /// Start from [`Model::init`]; its futures count towards
    /// [`spawned`](Self::spawned).
    pub fn new(flags: M::Flags) -> Self {
        let (model, init) = M::init(flags);
        let mut program = Self {
            model,
            queued: Vec::new(),
            spawned: 0,
            quit: false,
        };
        program.record(init);
        program
    }

    /// One update cycle.
    pub fn send(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.record(cmd);
    }

    /// Deliver queued immediate messages, including the ones they queue.
    pub fn flush(&mut self) {
        while !self.queued.is_empty() {
            let batch = std::mem::take(&mut self.queued);
            batch.into_iter().for_each(|msg| self.send(msg));
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Background futures launched so far.
    pub fn spawned(&self) -> usize {
        self.spawned
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Draw one frame of the given size.
    pub fn render(&self, width: u16, height: u16) -> Buffer {
        let mut terminal =
            Terminal::new(TestBackend::new(width, height)).expect("test backend never fails");
        terminal
            .draw(|frame| self.model.view(frame))
            .expect("test backend never fails");
        terminal.backend().buffer().clone()
    }

    /// Draw one frame and return its text, rows joined by `\n` with
    /// trailing blanks removed from each row.
    pub fn render_string(&self, width: u16, height: u16) -> String {
        let buffer = self.render(width, height);
        buffer
            .content
            .chunks(usize::from(width.max(1)))
            .map(|row| row.iter().map(Cell::symbol).collect::<String>())
            .map(|row| row.trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn record(&mut self, cmd: Command<M::Message>) {
        match cmd.inner {
            CommandInner::None => {}
            CommandInner::Message(msg) => self.queued.push(msg),
            CommandInner::Quit => self.quit = true,
            CommandInner::Future(_) => self.spawned += 1,
            CommandInner::Batch(cmds) => cmds.into_iter().for_each(|cmd| self.record(cmd)),
        }
    }
}
