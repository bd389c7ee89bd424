//! Elm-architecture runtime for **hyprbt**.
//!
//! The device view is written as a pure **init -> update -> view** cycle with
//! side effects pushed to the edges through [`Command`]s. This crate owns the
//! terminal, the single message queue and the background tasks; the model
//! only ever sees one message at a time.
//!
//! # Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Model`] | Top-level application trait (init / update / view) |
//! | [`Command`] | Side effect for the runtime to execute |
//! | [`Subscription`] | Long-lived event source (terminal input) |
//! | [`Program`] | Wires a [`Model`] to the real terminal and drives the loop |
//! | [`TestProgram`](testing::TestProgram) | Headless harness for unit-testing a [`Model`] |
//!
//! # Concurrency
//!
//! `update` runs on the loop task and never blocks. Every
//! [`Command::perform`] future is spawned as its own tokio task; its output
//! re-enters the loop as a message through an unbounded channel, in
//! completion order. Nothing else can reach the model.

pub mod command;
pub mod event;
pub mod model;
pub mod runtime;
pub mod subscription;
pub mod testing;

pub use command::Command;
pub use event::TerminalEvent;
pub use model::Model;
pub use runtime::{Program, ProgramError, ProgramOptions};
pub use subscription::{terminal_events, Subscription, SubscriptionId};

/// Take over the terminal and run `M` until it quits.
pub async fn run_with<M: Model>(
    flags: M::Flags,
    options: ProgramOptions,
) -> Result<M, ProgramError> {
    Program::<M>::with_options(flags, options)?.run().await
}
