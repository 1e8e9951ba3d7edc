// ── Aggregate cross-transport state ──
//
// Facts that span transports: which one is the default route, the wifi
// level, airplane mode, carrier network names. Controllers write here
// synchronously before they dispatch; consumers watch it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::model::TransportKind;

/// Point-in-time view of the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateState {
    /// False while airplane mode is on.
    pub radio_on: bool,
    pub wifi_level: Option<u8>,
    pub wifi_default: bool,
    pub ethernet_default: bool,
    /// Ethernet wins over wifi when both claim the default route.
    pub default_transport: Option<TransportKind>,
    pub carrier_network_names: BTreeMap<i32, String>,
}

impl Default for AggregateState {
    fn default() -> Self {
        Self {
            radio_on: true,
            wifi_level: None,
            wifi_default: false,
            ethernet_default: false,
            default_transport: None,
            carrier_network_names: BTreeMap::new(),
        }
    }
}

impl AggregateState {
    fn reconcile_default(&mut self) {
        self.default_transport = if self.ethernet_default {
            Some(TransportKind::Ethernet)
        } else if self.wifi_default {
            Some(TransportKind::Wifi)
        } else {
            None
        };
    }
}

/// Shared handle to the aggregate. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Aggregate {
    tx: Arc<watch::Sender<AggregateState>>,
}

impl Aggregate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AggregateState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> AggregateState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregateState> {
        self.tx.subscribe()
    }

    pub fn radio_on(&self) -> bool {
        self.tx.borrow().radio_on
    }

    pub fn ethernet_default(&self) -> bool {
        self.tx.borrow().ethernet_default
    }

    pub fn network_name_for_sub(&self, sub_id: i32) -> Option<String> {
        self.tx.borrow().carrier_network_names.get(&sub_id).cloned()
    }

    /// Record a new wifi level. Raised before the wifi dispatch so that
    /// watchers reconcile first.
    pub fn wifi_level_changed(&self, level: u8) {
        self.tx.send_if_modified(|s| {
            if s.wifi_level == Some(level) {
                return false;
            }
            debug!(level, previous = ?s.wifi_level, "wifi level changed");
            s.wifi_level = Some(level);
            true
        });
    }

    /// Returns `true` if the flag changed.
    pub fn set_default_route(&self, transport: TransportKind, is_default: bool) -> bool {
        self.tx.send_if_modified(|s| {
            let slot = match transport {
                TransportKind::Wifi => &mut s.wifi_default,
                TransportKind::Ethernet => &mut s.ethernet_default,
            };
            if *slot == is_default {
                return false;
            }
            *slot = is_default;
            s.reconcile_default();
            debug!(%transport, is_default, chosen = ?s.default_transport, "default route changed");
            true
        })
    }

    /// Returns `true` if the flag changed.
    pub fn set_radio_on(&self, radio_on: bool) -> bool {
        self.tx.send_if_modified(|s| {
            if s.radio_on == radio_on {
                return false;
            }
            s.radio_on = radio_on;
            true
        })
    }

    /// Returns `true` if the stored name changed.
    pub fn set_carrier_network_name(&self, sub_id: i32, name: impl Into<String>) -> bool {
        let name = name.into();
        self.tx.send_if_modified(|s| {
            if s.carrier_network_names.get(&sub_id) == Some(&name) {
                return false;
            }
            s.carrier_network_names.insert(sub_id, name);
            true
        })
    }
}

impl Default for Aggregate {
    fn default() -> Self {
        Self::new()
    }
}
