use crate::event::TerminalEvent;
use crossterm::event::EventStream;
use futures::StreamExt;
use std::any::TypeId;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

type Starter<Msg> = Box<dyn FnOnce(mpsc::UnboundedSender<Msg>) -> AbortHandle + Send>;

/// A background event source that feeds the message queue for as long as
/// the model keeps returning it from
/// [`Model::subscriptions`](crate::Model::subscriptions).
pub struct Subscription<Msg: Send + 'static> {
    pub(crate) id: SubscriptionId,
    pub(crate) start: Starter<Msg>,
}

impl<Msg: Send + 'static> Subscription<Msg> {
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }
}

/// Two subscriptions with equal ids are the same source; the runtime keeps
/// the running one and discards the new declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    kind: TypeId,
    instance: u64,
}

impl SubscriptionId {
    /// One of several sources of kind `T`.
    pub fn new<T: 'static>(instance: u64) -> Self {
        Self {
            kind: TypeId::of::<T>(),
            instance,
        }
    }

    /// The only source of kind `T`.
    pub fn of<T: 'static>() -> Self {
        Self::new::<T>(0)
    }
}

/// Kind marker for [`terminal_events`].
pub struct TerminalEvents;

/// Keyboard, mouse and resize input.
///
/// `map` turns each [`TerminalEvent`] into a message; returning `None` drops
/// the event.
///
/// ```rust,ignore
/// fn subscriptions(&self) -> Vec<Subscription<Msg>> {
///     vec![terminal_events(|event| Some(Msg::Input(event)))]
/// }
/// ```
pub fn terminal_events<Msg: Send + 'static>(
    map: impl Fn(TerminalEvent) -> Option<Msg> + Send + Sync + 'static,
) -> Subscription<Msg> {
    // The stream must not exist before the task starts: subscriptions() runs
    // after every update, and a second EventStream would compete with the
    // live one for crossterm's global reader.
    let start = move |queue: mpsc::UnboundedSender<Msg>| {
        tokio::spawn(async move {
            let mut input = EventStream::new();
            while let Some(next) = input.next().await {
                let event = match next {
                    Ok(event) => event,
                    Err(err) => {
                        warn!(error = %err, "terminal input failed");
                        return;
                    }
                };
                let Some(msg) = TerminalEvent::from_crossterm(event).and_then(&map) else {
                    continue;
                };
                if queue.send(msg).is_err() {
                    return;
                }
            }
        })
        .abort_handle()
    };
    Subscription {
        id: SubscriptionId::of::<TerminalEvents>(),
        start: Box::new(start),
    }
}

/// The set of running subscriptions, brought in line with the model's
/// declarations after each update.
pub(crate) struct SubscriptionManager<Msg: Send + 'static> {
    running: HashMap<SubscriptionId, AbortHandle>,
    queue: mpsc::UnboundedSender<Msg>,
}

impl<Msg: Send + 'static> SubscriptionManager<Msg> {
    pub fn new(queue: mpsc::UnboundedSender<Msg>) -> Self {
        Self {
            running: HashMap::new(),
            queue,
        }
    }

    /// Abort sources that are no longer declared and start new ones.
    /// Sources declared again keep running untouched.
    pub fn reconcile(&mut self, declared: Vec<Subscription<Msg>>) {
        let declared: HashMap<_, _> = declared
            .into_iter()
            .map(|sub| (sub.id.clone(), sub))
            .collect();

        let stale: Vec<_> = self
            .running
            .keys()
            .filter(|id| !declared.contains_key(*id))
            .cloned()
            .collect();
        for id in stale {
            if let Some(handle) = self.running.remove(&id) {
                debug!(?id, "stopping subscription");
                handle.abort();
            }
        }

        for (id, sub) in declared {
            self.running
                .entry(id)
                .or_insert_with(|| (sub.start)(self.queue.clone()));
        }
    }

    pub fn shutdown(&mut self) {
        self.running.drain().for_each(|(_, handle)| handle.abort());
    }

    #[cfg(test)]
    pub fn running(&self) -> usize {
        self.running.len()
    }
}
