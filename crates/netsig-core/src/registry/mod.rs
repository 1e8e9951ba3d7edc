// ── Controller registry ──
//
// Owns one controller per transport, the shared dispatcher, and the
// aggregate. Events for different transports may be handled concurrently;
// events for the same transport serialize on that transport's delivery
// lock, so listeners see payloads in commit order. The controller lock
// itself is only held while committing, never while listeners run.

mod aggregate;

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::SignalConfig;
use crate::controller::{
    DispatchOutcome, EthernetSignalController, SignalController, WifiSignalController,
};
use crate::dispatch::{DispatchReport, Dispatcher, SignalCallback, SubscriptionHandle};
use crate::error::CoreError;
use crate::model::{EthernetStatus, IndicatorUpdate, StatusEvent, TransportKind, WifiStatus};
use crate::source::StatusSource;

pub use aggregate::{Aggregate, AggregateState};

/// One registered transport.
struct Slot {
    /// Taken before `controller` and held until delivery finishes.
    delivery: Mutex<()>,
    controller: Mutex<Box<dyn SignalController>>,
}

/// Entry point for hosts: route status events, manage listeners, read the
/// aggregate.
///
/// Listeners may query the registry from inside a callback. Mutating calls
/// made from inside a callback fail with [`CoreError::ReentrantUpdate`].
pub struct ControllerRegistry {
    config: Arc<SignalConfig>,
    dispatcher: Arc<Dispatcher>,
    aggregate: Aggregate,
    controllers: DashMap<TransportKind, Arc<Slot>>,
    dispatching: DashSet<ThreadId>,
}

impl ControllerRegistry {
    pub fn new(config: SignalConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            dispatcher: Arc::new(Dispatcher::new()),
            aggregate: Aggregate::new(),
            controllers: DashMap::new(),
            dispatching: DashSet::new(),
        })
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    // ── Controllers ──────────────────────────────────────────────────

    pub fn add_wifi(&self, source: Arc<dyn StatusSource<WifiStatus>>) -> Result<(), CoreError> {
        let controller = WifiSignalController::new(
            Arc::clone(&self.config),
            source,
            self.aggregate.clone(),
            Arc::clone(&self.dispatcher),
        );
        self.insert(Box::new(controller))
    }

    pub fn add_ethernet(
        &self,
        source: Arc<dyn StatusSource<EthernetStatus>>,
    ) -> Result<(), CoreError> {
        let controller = EthernetSignalController::new(
            source,
            self.aggregate.clone(),
            Arc::clone(&self.dispatcher),
            self.config.history_size,
        );
        self.insert(Box::new(controller))
    }

    /// Register a controller. At most one per transport.
    pub fn insert(&self, controller: Box<dyn SignalController>) -> Result<(), CoreError> {
        let transport = controller.transport();
        match self.controllers.entry(transport) {
            Entry::Occupied(_) => Err(CoreError::DuplicateTransport { transport }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Slot {
                    delivery: Mutex::new(()),
                    controller: Mutex::new(controller),
                }));
                info!(%transport, "controller registered");
                Ok(())
            }
        }
    }

    /// Drop a transport's controller. Returns `false` if none was registered.
    pub fn remove(&self, transport: TransportKind) -> bool {
        let removed = self.controllers.remove(&transport).is_some();
        if removed {
            info!(%transport, "controller removed");
        }
        removed
    }

    pub fn transports(&self) -> Vec<TransportKind> {
        let mut kinds: Vec<TransportKind> = self.controllers.iter().map(|e| *e.key()).collect();
        kinds.sort();
        kinds
    }

    /// Clone the slot out so no map shard lock is held while the
    /// controller runs.
    fn slot(&self, transport: TransportKind) -> Result<Arc<Slot>, CoreError> {
        self.controllers
            .get(&transport)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(CoreError::UnknownTransport { transport })
    }

    /// Read-only access. Never waits on a delivery in progress.
    fn with_controller<T>(
        &self,
        transport: TransportKind,
        f: impl FnOnce(&dyn SignalController) -> T,
    ) -> Result<T, CoreError> {
        let slot = self.slot(transport)?;
        let guard = slot
            .controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(f(&**guard))
    }

    /// Commit under the controller lock, then deliver with only the
    /// delivery lock held.
    fn commit_and_deliver(
        &self,
        transport: TransportKind,
        commit: impl FnOnce(&mut dyn SignalController) -> Result<Option<IndicatorUpdate>, CoreError>,
    ) -> Result<DispatchOutcome, CoreError> {
        if self.dispatching.contains(&thread::current().id()) {
            return Err(CoreError::ReentrantUpdate { transport });
        }
        let slot = self.slot(transport)?;
        let _delivery = slot.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        let pending = {
            let mut controller = slot
                .controller
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            commit(&mut **controller)?
        };
        Ok(match pending {
            Some(update) => DispatchOutcome::Notified(self.dispatch(&update)),
            None => DispatchOutcome::Unchanged,
        })
    }

    fn dispatch(&self, update: &IndicatorUpdate) -> DispatchReport {
        let thread = thread::current().id();
        self.dispatching.insert(thread);
        let report = self.dispatcher.dispatch(update);
        self.dispatching.remove(&thread);
        report
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Route one status event to its transport's controller.
    pub fn handle_status_event(
        &self,
        transport: TransportKind,
        event: &StatusEvent,
    ) -> Result<DispatchOutcome, CoreError> {
        let ethernet_default = self.aggregate.ethernet_default();
        let outcome = self.commit_and_deliver(transport, |c| c.apply_status_event(event))?;
        if transport == TransportKind::Ethernet
            && ethernet_default != self.aggregate.ethernet_default()
        {
            self.refresh_wifi();
        }
        Ok(outcome)
    }

    pub fn fetch_initial_state(&self, transport: TransportKind) -> Result<DispatchOutcome, CoreError> {
        let ethernet_default = self.aggregate.ethernet_default();
        let outcome = self.commit_and_deliver(transport, |c| c.apply_initial_state())?;
        if transport == TransportKind::Ethernet
            && ethernet_default != self.aggregate.ethernet_default()
        {
            self.refresh_wifi();
        }
        Ok(outcome)
    }

    /// Fetch every registered transport, ethernet first so that wifi sees
    /// the final default route. Stops at the first failure.
    pub fn fetch_all_initial_states(&self) -> Result<(), CoreError> {
        let mut transports = self.transports();
        transports.sort_by_key(|t| *t != TransportKind::Ethernet);
        for transport in transports {
            self.fetch_initial_state(transport)?;
        }
        Ok(())
    }

    pub fn current_level(&self, transport: TransportKind) -> Result<u8, CoreError> {
        self.with_controller(transport, |c| c.current_level())
    }

    /// Whether wifi is the default route as carrier-merged wifi on `sub_id`.
    pub fn is_carrier_merged_wifi(&self, sub_id: i32) -> bool {
        self.with_controller(TransportKind::Wifi, |c| c.is_carrier_merged_for(sub_id))
            .unwrap_or(false)
    }

    // ── Aggregate inputs ─────────────────────────────────────────────

    /// Airplane mode feeds the wifi `is_default` payload flag.
    pub fn set_radio_on(&self, radio_on: bool) {
        if self.aggregate.set_radio_on(radio_on) {
            info!(radio_on, "radio state changed");
            self.refresh_wifi();
        }
    }

    pub fn set_carrier_network_name(&self, sub_id: i32, name: impl Into<String>) {
        if self.aggregate.set_carrier_network_name(sub_id, name) {
            debug!(sub_id, "carrier network name changed");
            self.refresh_wifi();
        }
    }

    /// Re-send wifi if the aggregate changed what its payload says.
    fn refresh_wifi(&self) {
        match self.commit_and_deliver(TransportKind::Wifi, |c| Ok(c.refreshed_update())) {
            Ok(DispatchOutcome::Notified(report)) => {
                debug!(delivered = report.delivered, failed = report.failed, "wifi re-dispatched");
            }
            Ok(DispatchOutcome::Unchanged) | Err(CoreError::UnknownTransport { .. }) => {}
            Err(e) => warn!(error = %e, "wifi refresh skipped"),
        }
    }

    pub fn subscribe_aggregate(&self) -> watch::Receiver<AggregateState> {
        self.aggregate.subscribe()
    }

    pub fn aggregate_snapshot(&self) -> AggregateState {
        self.aggregate.snapshot()
    }

    // ── Listeners ────────────────────────────────────────────────────

    pub fn register(&self, listener: Arc<dyn SignalCallback>) -> SubscriptionHandle {
        self.dispatcher.register(listener)
    }

    pub fn unregister(&self, handle: SubscriptionHandle) -> bool {
        self.dispatcher.unregister(handle)
    }

    /// Re-dispatch every transport's current snapshot, e.g. to a listener
    /// that just registered.
    pub fn notify_all(&self) -> DispatchReport {
        let mut total = DispatchReport::default();
        for transport in self.transports() {
            match self.commit_and_deliver(transport, |c| Ok(Some(c.current_update()))) {
                Ok(DispatchOutcome::Notified(report)) => {
                    total.delivered += report.delivered;
                    total.failed += report.failed;
                }
                Ok(DispatchOutcome::Unchanged) => {}
                Err(e) => warn!(%transport, error = %e, "re-dispatch skipped"),
            }
        }
        total
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    pub fn dump(&self) -> String {
        let mut out = String::new();
        for transport in self.transports() {
            if let Ok(section) = self.with_controller(transport, |c| c.dump()) {
                out.push_str(&section);
            }
        }
        out
    }

    /// Drop every controller and listener.
    pub fn shutdown(&self) {
        self.controllers.clear();
        let listeners = self.dispatcher.len();
        self.dispatcher.clear();
        info!(listeners, "registry shut down");
    }
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("transports", &self.transports())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::mpsc;
    use std::sync::{Mutex, Weak};
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ListenerError;
    use crate::model::{
        CapabilityUpdate, ConnectivityUpdate, IconGroup, IconRef, InternetReachability,
        WifiIndicatorUpdate,
    };
    use crate::source::StaticStatusSource;

    fn recording_registry() -> (ControllerRegistry, Arc<Mutex<Vec<IndicatorUpdate>>>) {
        let registry = ControllerRegistry::new(SignalConfig::default()).unwrap();
        registry
            .add_wifi(Arc::new(StaticStatusSource::new(WifiStatus {
                enabled: true,
                connected: true,
                level: 2,
                internet: InternetReachability::Yes,
                wifi_standard: 6,
                ..WifiStatus::default()
            })))
            .unwrap();
        registry
            .add_ethernet(Arc::new(StaticStatusSource::new(EthernetStatus {
                enabled: true,
                connected: true,
                is_default: true,
                internet: InternetReachability::Yes,
            })))
            .unwrap();

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        registry.register(Arc::new(
            move |u: &IndicatorUpdate| -> Result<(), ListenerError> {
                sink.lock().unwrap().push(u.clone());
                Ok(())
            },
        ));
        (registry, received)
    }

    fn wifi_updates(received: &Mutex<Vec<IndicatorUpdate>>) -> Vec<WifiIndicatorUpdate> {
        received
            .lock()
            .unwrap()
            .iter()
            .filter_map(IndicatorUpdate::as_wifi)
            .cloned()
            .collect()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = ControllerRegistry::new(SignalConfig {
            max_wifi_level: 0,
            ..SignalConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
    }

    #[test]
    fn duplicate_transport_is_rejected() {
        let (registry, _) = recording_registry();
        let err = registry
            .add_wifi(Arc::new(StaticStatusSource::<WifiStatus>::empty()))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::DuplicateTransport {
                transport: TransportKind::Wifi
            }
        ));
    }

    #[test]
    fn unknown_transport_is_an_error() {
        let (registry, _) = recording_registry();
        assert!(registry.remove(TransportKind::Ethernet));
        assert!(!registry.remove(TransportKind::Ethernet));
        assert!(matches!(
            registry.current_level(TransportKind::Ethernet),
            Err(CoreError::UnknownTransport { .. })
        ));
    }

    #[test]
    fn fetch_all_orders_ethernet_first() {
        let (registry, received) = recording_registry();
        registry.fetch_all_initial_states().unwrap();

        // Wifi has sent nothing yet, so the ethernet default route change
        // does not push a placeholder wifi payload.
        let kinds: Vec<&str> = received.lock().unwrap().iter().map(IndicatorUpdate::label).collect();
        assert_eq!(kinds, vec!["ethernet", "wifi"]);
        assert_eq!(registry.current_level(TransportKind::Wifi).unwrap(), 2);

        let snapshot = registry.aggregate_snapshot();
        assert_eq!(snapshot.default_transport, Some(TransportKind::Ethernet));
        assert_eq!(snapshot.wifi_level, Some(2));
    }

    #[test]
    fn airplane_mode_redispatches_wifi() {
        let (registry, received) = recording_registry();
        registry.fetch_initial_state(TransportKind::Wifi).unwrap();
        assert!(!wifi_updates(&received).last().unwrap().is_default);

        registry.set_radio_on(false);
        assert!(wifi_updates(&received).last().unwrap().is_default);

        // No change, no dispatch.
        let before = received.lock().unwrap().len();
        registry.set_radio_on(false);
        assert_eq!(received.lock().unwrap().len(), before);
    }

    #[test]
    fn ethernet_default_change_redispatches_wifi() {
        let (registry, received) = recording_registry();
        registry.set_radio_on(false);
        registry.fetch_initial_state(TransportKind::Wifi).unwrap();
        assert!(wifi_updates(&received).last().unwrap().is_default);

        registry.fetch_initial_state(TransportKind::Ethernet).unwrap();
        let wifi = wifi_updates(&received);
        assert!(!wifi.last().unwrap().is_default);
    }

    #[test]
    fn aggregate_changes_never_resend_identical_wifi_payloads() {
        let (registry, received) = recording_registry();
        registry
            .handle_status_event(
                TransportKind::Wifi,
                &StatusEvent::ConnectivityChanged(ConnectivityUpdate {
                    enabled: Some(true),
                    connected: Some(true),
                    is_default: Some(true),
                    level: Some(3),
                    ..ConnectivityUpdate::default()
                }),
            )
            .unwrap();
        assert_eq!(received.lock().unwrap().len(), 1);

        registry.set_radio_on(false);
        registry.set_radio_on(true);
        registry.set_carrier_network_name(1, "Unrelated");
        assert_eq!(received.lock().unwrap().len(), 1);

        registry
            .handle_status_event(
                TransportKind::Wifi,
                &StatusEvent::ConnectivityChanged(ConnectivityUpdate {
                    is_carrier_merged: Some(true),
                    sub_id: Some(4),
                    ..ConnectivityUpdate::default()
                }),
            )
            .unwrap();
        registry.set_radio_on(false);
        registry.set_radio_on(true);
        registry.fetch_initial_state(TransportKind::Ethernet).unwrap();

        let kinds: Vec<&str> = received.lock().unwrap().iter().map(IndicatorUpdate::label).collect();
        assert_eq!(kinds, vec!["wifi", "carrier_data", "ethernet"]);
    }

    #[test]
    fn listeners_can_query_the_registry_during_dispatch() {
        let registry = Arc::new(ControllerRegistry::new(SignalConfig::default()).unwrap());
        registry
            .add_wifi(Arc::new(StaticStatusSource::<WifiStatus>::empty()))
            .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let weak: Weak<ControllerRegistry> = Arc::downgrade(&registry);
        registry.register(Arc::new(
            move |_: &IndicatorUpdate| -> Result<(), ListenerError> {
                let registry = weak.upgrade().ok_or(ListenerError::Closed)?;
                let level = registry.current_level(TransportKind::Wifi).unwrap();
                let nested = registry.handle_status_event(
                    TransportKind::Wifi,
                    &StatusEvent::ConnectivityChanged(ConnectivityUpdate {
                        level: Some(0),
                        ..ConnectivityUpdate::default()
                    }),
                );
                assert!(registry.dump().contains("WifiSignalController"));
                sink.lock().unwrap().push((level, nested));
                Ok(())
            },
        ));

        let (done_tx, done_rx) = mpsc::channel();
        let worker = Arc::clone(&registry);
        std::thread::spawn(move || {
            let outcome = worker.handle_status_event(
                TransportKind::Wifi,
                &StatusEvent::ConnectivityChanged(ConnectivityUpdate {
                    enabled: Some(true),
                    connected: Some(true),
                    level: Some(3),
                    ..ConnectivityUpdate::default()
                }),
            );
            done_tx.send(outcome.map(|o| o.is_notified())).unwrap();
        });

        let notified = done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(notified.unwrap());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, 3);
        assert!(matches!(
            seen[0].1,
            Err(CoreError::ReentrantUpdate {
                transport: TransportKind::Wifi
            })
        ));
        assert_eq!(registry.current_level(TransportKind::Wifi).unwrap(), 3);
    }

    #[test]
    fn concurrent_events_commit_whole_and_deliver_in_order() {
        const THREADS: u8 = 8;
        const EVENTS: u8 = 40;

        let registry = Arc::new(ControllerRegistry::new(SignalConfig::default()).unwrap());
        registry
            .add_wifi(Arc::new(StaticStatusSource::<WifiStatus>::empty()))
            .unwrap();
        registry
            .add_ethernet(Arc::new(StaticStatusSource::<EthernetStatus>::empty()))
            .unwrap();

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        registry.register(Arc::new(
            move |u: &IndicatorUpdate| -> Result<(), ListenerError> {
                sink.lock().unwrap().push(u.clone());
                Ok(())
            },
        ));

        let workers: Vec<_> = (0..THREADS)
            .map(|t| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for i in 0..EVENTS {
                        let level = (t + i) % 5;
                        let event = match i % 3 {
                            0 => StatusEvent::ConnectivityChanged(ConnectivityUpdate {
                                enabled: Some(true),
                                connected: Some(true),
                                level: Some(level),
                                ssid: Some(format!("net{level}")),
                                ..ConnectivityUpdate::default()
                            }),
                            1 if t % 2 == 0 => StatusEvent::CapabilityChanged(CapabilityUpdate {
                                wifi_standard: Some(5),
                                high_tier_ready: Some(true),
                            }),
                            1 => StatusEvent::CapabilityChanged(CapabilityUpdate {
                                wifi_standard: Some(4),
                                high_tier_ready: Some(false),
                            }),
                            _ => {
                                registry
                                    .handle_status_event(
                                        TransportKind::Ethernet,
                                        &StatusEvent::ConnectivityChanged(ConnectivityUpdate {
                                            enabled: Some(true),
                                            connected: Some(i % 2 == 0),
                                            ..ConnectivityUpdate::default()
                                        }),
                                    )
                                    .unwrap();
                                continue;
                            }
                        };
                        registry
                            .handle_status_event(TransportKind::Wifi, &event)
                            .unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let wifi = wifi_updates(&received);
        assert!(!wifi.is_empty());
        for update in &wifi {
            let IconRef::WifiSignal { group, level, .. } = update.status_icon.icon else {
                panic!("connected wifi must carry a signal icon: {update:?}");
            };
            // Level and SSID always travel in the same event.
            assert_eq!(update.description, Some(format!("net{level}")));
            // Standard 5 only ever arrives together with the ready flag.
            assert_ne!(group, IconGroup::Wifi5);
        }

        let IconRef::WifiSignal { level, .. } = wifi.last().unwrap().status_icon.icon else {
            panic!("last wifi payload has no signal icon");
        };
        assert_eq!(registry.current_level(TransportKind::Wifi).unwrap(), level);
        assert_eq!(registry.aggregate_snapshot().wifi_level, Some(level));
    }

    #[test]
    fn events_route_to_their_controller() {
        let (registry, received) = recording_registry();
        let event = StatusEvent::ConnectivityChanged(ConnectivityUpdate {
            enabled: Some(true),
            ..ConnectivityUpdate::default()
        });
        assert!(
            registry
                .handle_status_event(TransportKind::Wifi, &event)
                .unwrap()
                .is_notified()
        );
        assert_eq!(
            registry
                .handle_status_event(TransportKind::Wifi, &event)
                .unwrap(),
            DispatchOutcome::Unchanged
        );
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[test]
    fn notify_all_and_unregister() {
        let (registry, received) = recording_registry();
        registry.fetch_all_initial_states().unwrap();
        received.lock().unwrap().clear();

        let report = registry.notify_all();
        assert_eq!(report, DispatchReport { delivered: 2, failed: 0 });

        let extra = registry.register(Arc::new(|_: &IndicatorUpdate| -> Result<(), ListenerError> {
            Err(ListenerError::Closed)
        }));
        assert_eq!(registry.notify_all(), DispatchReport { delivered: 2, failed: 2 });
        assert!(registry.unregister(extra));
    }

    #[test]
    fn carrier_merged_query_follows_wifi_state() {
        let (registry, _) = recording_registry();
        assert!(!registry.is_carrier_merged_wifi(3));
        registry
            .handle_status_event(
                TransportKind::Wifi,
                &StatusEvent::ConnectivityChanged(ConnectivityUpdate {
                    enabled: Some(true),
                    connected: Some(true),
                    is_default: Some(true),
                    is_carrier_merged: Some(true),
                    sub_id: Some(3),
                    ..ConnectivityUpdate::default()
                }),
            )
            .unwrap();
        assert!(registry.is_carrier_merged_wifi(3));
    }

    #[test]
    fn dump_and_shutdown() {
        let (registry, _) = recording_registry();
        let dump = registry.dump();
        assert!(dump.contains("WifiSignalController"));
        assert!(dump.contains("EthernetSignalController"));

        registry.shutdown();
        assert!(registry.transports().is_empty());
        assert!(registry.dump().is_empty());
    }
}
