// ── Ethernet signal controller ──

use std::sync::Arc;

use tracing::{debug, warn};

use super::{SentUpdate, ShadowState, SignalController};
use crate::dispatch::Dispatcher;
use crate::error::CoreError;
use crate::model::{
    ConnectivityUpdate, EthernetIndicatorUpdate, EthernetState, EthernetStatus, IconRef,
    IconState, IndicatorUpdate, InternetReachability, StatusEvent, TransportKind,
};
use crate::registry::Aggregate;
use crate::source::StatusSource;

const ETHERNET_CONNECTED: &str = "Ethernet connected";
const ETHERNET_DISCONNECTED: &str = "Ethernet disconnected";

/// Wired transport. Has no level, capability, or traffic activity.
pub struct EthernetSignalController {
    source: Arc<dyn StatusSource<EthernetStatus>>,
    aggregate: Aggregate,
    dispatcher: Arc<Dispatcher>,
    states: ShadowState<EthernetState>,
    sent: SentUpdate,
}

impl EthernetSignalController {
    pub fn new(
        source: Arc<dyn StatusSource<EthernetStatus>>,
        aggregate: Aggregate,
        dispatcher: Arc<Dispatcher>,
        history_size: usize,
    ) -> Self {
        Self {
            source,
            aggregate,
            dispatcher,
            states: ShadowState::new(EthernetState::default(), history_size),
            sent: SentUpdate::default(),
        }
    }

    pub fn current_state(&self) -> &EthernetState {
        self.states.current()
    }

    fn commit(&mut self, candidate: EthernetState) -> Result<Option<IndicatorUpdate>, CoreError> {
        candidate.validate()?;
        self.aggregate
            .set_default_route(TransportKind::Ethernet, candidate.is_default);
        self.states.replace_current(candidate);

        if !self.states.is_dirty() {
            return Ok(None);
        }
        let update = self.build_update();
        self.states.save_last_state();
        Ok(Some(self.sent.record(update)))
    }

    fn build_update(&self) -> IndicatorUpdate {
        let s = self.states.current();
        let visible = s.enabled && s.connected;
        let icon = if s.connected {
            IconRef::Ethernet {
                no_internet: s.internet == InternetReachability::No,
            }
        } else {
            IconRef::None
        };
        let description = if s.connected {
            ETHERNET_CONNECTED
        } else {
            ETHERNET_DISCONNECTED
        };
        IndicatorUpdate::Ethernet(EthernetIndicatorUpdate {
            visible,
            status_icon: IconState::new(visible, icon, description),
            description: description.to_owned(),
        })
    }
}

fn malformed(reason: impl Into<String>) -> CoreError {
    CoreError::MalformedEvent {
        transport: TransportKind::Ethernet,
        reason: reason.into(),
    }
}

fn apply_connectivity(
    state: &mut EthernetState,
    update: &ConnectivityUpdate,
) -> Result<(), CoreError> {
    if update.is_empty() {
        return Err(malformed("connectivity update carries no fields"));
    }
    if update.level.is_some()
        || update.rssi.is_some()
        || update.ssid.is_some()
        || update.is_carrier_merged.is_some()
        || update.sub_id.is_some()
        || update.status_label.is_some()
        || update.is_transient.is_some()
        || update.is_captive_portal.is_some()
    {
        return Err(malformed("wifi-only fields on an ethernet update"));
    }

    if let Some(enabled) = update.enabled {
        state.enabled = enabled;
    }
    if let Some(connected) = update.connected {
        state.connected = connected;
        if !connected {
            state.internet = InternetReachability::Unknown;
        }
    }
    if let Some(is_default) = update.is_default {
        state.is_default = is_default;
    }
    if let Some(internet) = update.internet {
        state.internet = internet;
    }
    Ok(())
}

impl SignalController for EthernetSignalController {
    fn transport(&self) -> TransportKind {
        TransportKind::Ethernet
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn apply_status_event(
        &mut self,
        event: &StatusEvent,
    ) -> Result<Option<IndicatorUpdate>, CoreError> {
        let mut candidate = self.states.current().clone();
        let result = match event {
            StatusEvent::ConnectivityChanged(update) => apply_connectivity(&mut candidate, update),
            StatusEvent::CapabilityChanged(_) | StatusEvent::TrafficActivityChanged { .. } => Err(
                malformed(format!("{} is not an ethernet event", event.shape())),
            ),
        }
        .and_then(|()| self.commit(candidate));

        match &result {
            Ok(pending) => debug!(
                transport = %TransportKind::Ethernet,
                shape = event.shape(),
                changed = pending.is_some(),
                "status event applied"
            ),
            Err(e) => warn!(
                transport = %TransportKind::Ethernet,
                shape = event.shape(),
                error = %e,
                "status event rejected"
            ),
        }
        result
    }

    fn apply_initial_state(&mut self) -> Result<Option<IndicatorUpdate>, CoreError> {
        let status = self.source.fetch()?;
        self.commit(EthernetState {
            enabled: status.enabled,
            connected: status.connected,
            is_default: status.is_default,
            internet: status.internet,
        })
    }

    fn current_level(&self) -> u8 {
        0
    }

    fn current_update(&mut self) -> IndicatorUpdate {
        let update = self.build_update();
        self.sent.record(update)
    }

    /// Ethernet payloads read nothing from the aggregate.
    fn refreshed_update(&mut self) -> Option<IndicatorUpdate> {
        let update = self.build_update();
        self.sent.replace_if_changed(update)
    }

    fn dump(&self) -> String {
        let mut out = String::from("EthernetSignalController:\n");
        self.states.dump_into(&mut out);
        out
    }
}
