// ── Async update stream ──
//
// Bridges the synchronous listener interface onto a tokio broadcast
// channel for consumers that prefer `Stream`s.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{trace, warn};

use super::SignalCallback;
use crate::error::ListenerError;
use crate::model::IndicatorUpdate;

/// Listener that republishes every update on a broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastListener {
    tx: broadcast::Sender<Arc<IndicatorUpdate>>,
}

impl BroadcastListener {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Open a new stream. It only sees updates sent after this call.
    pub fn subscribe(&self) -> UpdateStream {
        UpdateStream {
            inner: Box::pin(BroadcastStream::new(self.tx.subscribe())),
        }
    }
}

impl SignalCallback for BroadcastListener {
    fn on_indicator_update(&self, update: &IndicatorUpdate) -> Result<(), ListenerError> {
        if self.tx.send(Arc::new(update.clone())).is_err() {
            trace!("no update stream subscribers");
        }
        Ok(())
    }
}

/// `Stream` of dispatched updates. Lagging receivers skip what they missed.
pub struct UpdateStream {
    inner: Pin<Box<BroadcastStream<Arc<IndicatorUpdate>>>>,
}

impl UpdateStream {
    /// Wait for the next update. `None` once every sender is gone.
    pub async fn next_update(&mut self) -> Option<Arc<IndicatorUpdate>> {
        self.next().await
    }
}

impl Stream for UpdateStream {
    type Item = Arc<IndicatorUpdate>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(update))) => return Poll::Ready(Some(update)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "update stream lagged");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{EthernetIndicatorUpdate, IconState};

    fn update(description: &str) -> IndicatorUpdate {
        IndicatorUpdate::Ethernet(EthernetIndicatorUpdate {
            visible: true,
            status_icon: IconState::default(),
            description: description.into(),
        })
    }

    #[tokio::test]
    async fn stream_yields_updates_in_order() {
        let listener = BroadcastListener::new(8);
        let mut stream = listener.subscribe();

        listener.on_indicator_update(&update("one")).unwrap();
        listener.on_indicator_update(&update("two")).unwrap();

        let first = stream.next_update().await.unwrap();
        let second = stream.next_update().await.unwrap();
        assert_eq!(*first, update("one"));
        assert_eq!(*second, update("two"));
    }

    #[tokio::test]
    async fn stream_ends_when_listener_dropped() {
        let listener = BroadcastListener::new(4);
        let mut stream = listener.subscribe();
        drop(listener);
        assert!(stream.next_update().await.is_none());
    }

    #[tokio::test]
    async fn lagged_stream_skips_to_latest() {
        let listener = BroadcastListener::new(1);
        let mut stream = listener.subscribe();

        listener.on_indicator_update(&update("old")).unwrap();
        listener.on_indicator_update(&update("new")).unwrap();

        let got = stream.next_update().await.unwrap();
        assert_eq!(*got, update("new"));
    }

    #[test]
    fn send_without_subscribers_is_not_an_error() {
        let listener = BroadcastListener::new(4);
        assert!(listener.on_indicator_update(&update("nobody")).is_ok());
    }
}
