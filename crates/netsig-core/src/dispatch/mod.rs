// ── Notification dispatcher ──
//
// Synchronous fan-out of indicator payloads to registered display
// listeners, in registration order. A failing listener never blocks
// delivery to the ones after it.

mod broadcast;

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::error::ListenerError;
use crate::model::IndicatorUpdate;

pub use broadcast::{BroadcastListener, UpdateStream};

/// A display consumer.
///
/// Callbacks run on the dispatching thread and may block; the dispatcher
/// imposes no timeout.
pub trait SignalCallback: Send + Sync {
    fn on_indicator_update(&self, update: &IndicatorUpdate) -> Result<(), ListenerError>;
}

impl<F> SignalCallback for F
where
    F: Fn(&IndicatorUpdate) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_indicator_update(&self, update: &IndicatorUpdate) -> Result<(), ListenerError> {
        self(update)
    }
}

/// Opaque token returned by [`Dispatcher::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u64);

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Result of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Ordered set of listeners shared by every controller of a registry.
pub struct Dispatcher {
    listeners: RwLock<IndexMap<SubscriptionHandle, Arc<dyn SignalCallback>>>,
    next_id: AtomicU64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(IndexMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn register(&self, listener: Arc<dyn SignalCallback>) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, listener);
        trace!(%handle, "listener registered");
        handle
    }

    /// Remove a listener. Returns `false` if the handle was unknown.
    pub fn unregister(&self, handle: SubscriptionHandle) -> bool {
        let removed = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(&handle)
            .is_some();
        trace!(%handle, removed, "listener unregistered");
        removed
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `update` to every listener, in registration order.
    ///
    /// The listener list is copied before any callback runs, so callbacks
    /// may register or unregister without deadlocking; such changes apply
    /// from the next dispatch on.
    pub fn dispatch(&self, update: &IndicatorUpdate) -> DispatchReport {
        let listeners: Vec<(SubscriptionHandle, Arc<dyn SignalCallback>)> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(h, l)| (*h, Arc::clone(l)))
            .collect();

        let mut report = DispatchReport::default();
        for (handle, listener) in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener.on_indicator_update(update))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    warn!(%handle, kind = update.label(), error = %e, "listener failed");
                    report.failed += 1;
                }
                Err(_) => {
                    warn!(%handle, kind = update.label(), "listener panicked");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listeners", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::model::{EthernetIndicatorUpdate, IconState};

    fn sample() -> IndicatorUpdate {
        IndicatorUpdate::Ethernet(EthernetIndicatorUpdate {
            visible: true,
            status_icon: IconState::default(),
            description: "Ethernet connected".into(),
        })
    }

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Arc<dyn SignalCallback> {
        let log = Arc::clone(log);
        Arc::new(move |_: &IndicatorUpdate| -> Result<(), ListenerError> {
            log.lock().unwrap().push(name);
            Ok(())
        })
    }

    #[test]
    fn delivers_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let d = Dispatcher::new();
        d.register(recorder(&log, "a"));
        d.register(recorder(&log, "b"));
        d.register(recorder(&log, "c"));

        let report = d.dispatch(&sample());
        assert_eq!(report, DispatchReport { delivered: 3, failed: 0 });
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn failing_listener_does_not_block_later_ones() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let d = Dispatcher::new();
        d.register(recorder(&log, "first"));
        d.register(Arc::new(|_: &IndicatorUpdate| -> Result<(), ListenerError> {
            Err(ListenerError::Rejected("boom".into()))
        }));
        d.register(Arc::new(|_: &IndicatorUpdate| -> Result<(), ListenerError> {
            panic!("listener bug")
        }));
        d.register(recorder(&log, "last"));

        let report = d.dispatch(&sample());
        assert_eq!(report, DispatchReport { delivered: 2, failed: 2 });
        assert_eq!(*log.lock().unwrap(), vec!["first", "last"]);
    }

    #[test]
    fn unregister_stops_delivery_and_keeps_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let d = Dispatcher::new();
        d.register(recorder(&log, "a"));
        let b = d.register(recorder(&log, "b"));
        d.register(recorder(&log, "c"));

        assert!(d.unregister(b));
        assert!(!d.unregister(b));
        assert_eq!(d.len(), 2);

        d.dispatch(&sample());
        assert_eq!(*log.lock().unwrap(), vec!["a", "c"]);
    }

    #[test]
    fn empty_dispatcher_reports_nothing() {
        let d = Dispatcher::default();
        assert!(d.is_empty());
        assert_eq!(d.dispatch(&sample()), DispatchReport::default());
    }
}
