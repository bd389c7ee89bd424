use crate::command::Command;
use crate::subscription::Subscription;
use ratatui::Frame;

/// An application in [Elm Architecture] form.
///
/// The runtime calls [`init`](Model::init) once, then loops: draw with
/// [`view`](Model::view), wait for one message (input or a finished
/// background task), feed it to [`update`](Model::update), run the
/// [`Command`] that comes back. A [`Command::quit`] ends the loop.
///
/// `update` is the only place state changes and it is never re-entered.
/// Background work reports back through messages and never sees `self`.
///
/// [Elm Architecture]: https://guide.elm-lang.org/architecture/
pub trait Model: Sized + Send + 'static {
    type Message: Send + 'static;

    /// Handed to [`Model::init`] by whoever starts the program.
    type Flags: Send + 'static;

    fn init(flags: Self::Flags) -> (Self, Command<Self::Message>);

    /// Apply one message. Anything that can block goes into a
    /// [`Command::perform`] instead of running here.
    fn update(&mut self, msg: Self::Message) -> Command<Self::Message>;

    /// Draw the current state. Runs after updates, at most once per frame.
    fn view(&self, frame: &mut Frame);

    /// Event sources to keep running, queried after every update. Sources
    /// are matched by [`SubscriptionId`](crate::subscription::SubscriptionId):
    /// new ones start, missing ones stop.
    fn subscriptions(&self) -> Vec<Subscription<Self::Message>> {
        vec![]
    }
}
