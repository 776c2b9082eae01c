//! The hub task: one source, many sinks.

use std::fmt;

use tokio::sync::mpsc;

/// Identifies one registered sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(u64);

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink-{}", self.0)
    }
}

struct Sink<T> {
    id: SinkId,
    name: String,
    tx: mpsc::UnboundedSender<T>,
}

/// Summary returned by [`Hub::run`] once the source is exhausted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubReport {
    /// Items taken from the source.
    pub received: u64,
    /// Individual sink deliveries that succeeded.
    pub delivered: u64,
    /// Names of sinks detached because their receiver was dropped, in the
    /// order it was noticed.
    pub detached: Vec<String>,
}

/// Fans items from one unbounded source out to any number of unbounded
/// sinks.
///
/// Delivery is a non-blocking `send` on each sink, so a slow consumer only
/// grows its own queue. Every live sink sees every item, in source order.
/// A sink whose receiver is gone is detached and never tried again.
pub struct Hub<T> {
    source: mpsc::UnboundedReceiver<T>,
    sinks: Vec<Sink<T>>,
    next_id: u64,
}

impl<T> Hub<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(source: mpsc::UnboundedReceiver<T>) -> Self {
        Self {
            source,
            sinks: Vec::new(),
            next_id: 1,
        }
    }

    /// Registers an existing sender as a sink.
    pub fn attach(&mut self, name: impl Into<String>, tx: mpsc::UnboundedSender<T>) -> SinkId {
        let id = SinkId(self.next_id);
        self.next_id += 1;
        let name = name.into();
        tracing::debug!(%id, name = %name, "sink attached");
        self.sinks.push(Sink { id, name, tx });
        id
    }

    /// Creates a new sink and returns the receiving end of its queue.
    pub fn subscribe(&mut self, name: impl Into<String>) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.attach(name, tx);
        rx
    }

    /// Number of sinks currently registered.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Delivers items until the source is exhausted.
    ///
    /// Cancelling the task that runs this future (abort, `select!`) is
    /// the other way to stop it.
    pub async fn run(mut self) -> HubReport {
        let mut report = HubReport::default();
        tracing::debug!(sinks = self.sinks.len(), "hub running");

        while let Some(item) = self.source.recv().await {
            report.received += 1;
            self.broadcast(item, &mut report);
        }

        tracing::debug!(
            received = report.received,
            detached = report.detached.len(),
            "hub source exhausted"
        );
        report
    }

    fn broadcast(&mut self, item: T, report: &mut HubReport) {
        // The last sink gets the original; the others get clones.
        let Some((last, rest)) = self.sinks.split_last() else {
            return;
        };
        let mut closed = Vec::new();
        for sink in rest {
            if sink.tx.send(item.clone()).is_ok() {
                report.delivered += 1;
            } else {
                closed.push(sink.id);
            }
        }
        if last.tx.send(item).is_ok() {
            report.delivered += 1;
        } else {
            closed.push(last.id);
        }

        if !closed.is_empty() {
            self.sinks.retain(|sink| {
                let keep = !closed.contains(&sink.id);
                if !keep {
                    tracing::info!(id = %sink.id, name = %sink.name, "sink closed, detaching");
                    report.detached.push(sink.name.clone());
                }
                keep
            });
        }
    }
}
