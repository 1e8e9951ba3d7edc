// ── Wifi signal controller ──
//
// Tracks the wifi transport. Depending on `is_carrier_merged` a dispatch
// produces either a standalone wifi indicator or a carrier data indicator,
// never both.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::{DispatchOutcome, SentUpdate, ShadowState, SignalController};
use crate::config::SignalConfig;
use crate::dispatch::Dispatcher;
use crate::error::CoreError;
use crate::model::{
    CapabilityTier, CapabilityUpdate, CarrierDataIndicatorUpdate, ConnectivityUpdate,
    DataActivity, IconRef, IconState, IndicatorUpdate, InternetReachability, StatusEvent, Surface,
    TransportKind, WifiIndicatorUpdate, WifiState, WifiStatus,
};
use crate::policy;
use crate::registry::Aggregate;
use crate::source::StatusSource;

/// Data content description of the carrier-merged wifi icon group.
const CARRIER_MERGED_DATA_DESCRIPTION: &str = "Carrier Wi-Fi";

pub struct WifiSignalController {
    config: Arc<SignalConfig>,
    source: Arc<dyn StatusSource<WifiStatus>>,
    aggregate: Aggregate,
    dispatcher: Arc<Dispatcher>,
    states: ShadowState<WifiState>,
    sent: SentUpdate,
}

impl WifiSignalController {
    pub fn new(
        config: Arc<SignalConfig>,
        source: Arc<dyn StatusSource<WifiStatus>>,
        aggregate: Aggregate,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        let states = ShadowState::new(WifiState::default(), config.history_size);
        Self {
            config,
            source,
            aggregate,
            dispatcher,
            states,
            sent: SentUpdate::default(),
        }
    }

    pub fn current_state(&self) -> &WifiState {
        self.states.current()
    }

    /// The snapshot listeners last saw.
    pub fn last_dispatched(&self) -> &WifiState {
        self.states.last()
    }

    /// Entry point for the platform traffic-state callback, which reports
    /// activity as a raw code.
    pub fn set_activity_code(&mut self, code: i32) -> Result<DispatchOutcome, CoreError> {
        let Some(direction) = DataActivity::from_code(code) else {
            let err = malformed(format!("unknown traffic state code {code}"));
            warn!(transport = %TransportKind::Wifi, error = %err, "status event rejected");
            return Err(err);
        };
        self.handle_status_event(&StatusEvent::TrafficActivityChanged { direction })
    }

    // ── Event application ────────────────────────────────────────────

    fn apply_event(candidate: &mut WifiState, event: &StatusEvent) -> Result<(), CoreError> {
        match event {
            StatusEvent::ConnectivityChanged(update) => apply_connectivity(candidate, update),
            StatusEvent::CapabilityChanged(update) => apply_capability(candidate, *update),
            StatusEvent::TrafficActivityChanged { direction } => {
                candidate.set_activity(*direction);
                Ok(())
            }
        }
    }

    /// Copy a full status read over the current snapshot. Activity is not
    /// part of the status source and carries over.
    fn copy_wifi_status(&self, status: &WifiStatus) -> WifiState {
        let current = self.states.current();
        WifiState {
            enabled: status.enabled,
            connected: status.connected,
            is_default: status.is_default,
            level: status.level,
            rssi: status.rssi,
            internet: status.internet,
            ssid: status.ssid.clone(),
            capability: CapabilityTier::from_standard(status.wifi_standard),
            high_tier_ready: status.high_tier_ready(),
            is_carrier_merged: status.is_carrier_merged,
            sub_id: status.sub_id,
            status_label: status.status_label.clone(),
            is_transient: status.is_transient,
            is_captive_portal: status.is_captive_portal,
            activity_in: current.activity_in,
            activity_out: current.activity_out,
            icon_group: current.icon_group,
        }
    }

    /// Validate, derive the icon group, publish aggregate facts, swap the
    /// candidate in, then diff.
    fn commit(&mut self, mut candidate: WifiState) -> Result<Option<IndicatorUpdate>, CoreError> {
        candidate.validate(self.config.max_wifi_level)?;
        candidate.icon_group = policy::resolve(candidate.capability, candidate.high_tier_ready);

        self.notify_level_change_if_necessary(candidate.level);
        self.aggregate
            .set_default_route(TransportKind::Wifi, candidate.is_default);

        self.states.replace_current(candidate);
        Ok(self.update_if_dirty())
    }

    fn notify_level_change_if_necessary(&self, level: u8) {
        if level != self.states.current().level {
            self.aggregate.wifi_level_changed(level);
        }
    }

    fn update_if_dirty(&mut self) -> Option<IndicatorUpdate> {
        if !self.states.is_dirty() {
            debug!(transport = %TransportKind::Wifi, "snapshot unchanged, not notifying");
            return None;
        }
        let update = self.build_update();
        self.states.save_last_state();
        trace!(state = ?self.states.current(), "wifi snapshot committed");
        Some(self.sent.record(update))
    }

    // ── Indicator construction ───────────────────────────────────────

    fn build_update(&self) -> IndicatorUpdate {
        if self.states.current().is_carrier_merged {
            IndicatorUpdate::CarrierData(self.carrier_wifi_indicators())
        } else {
            IndicatorUpdate::Wifi(self.wifi_indicators())
        }
    }

    fn content_description(&self) -> &'static str {
        let s = self.states.current();
        if s.connected {
            s.icon_group.content_description(s.level)
        } else {
            s.icon_group.disconnected_description()
        }
    }

    fn current_icon(&self, surface: Surface) -> IconRef {
        let s = self.states.current();
        if s.connected {
            s.icon_group
                .signal_icon(surface, s.level, s.internet == InternetReachability::No)
        } else if s.enabled {
            s.icon_group.no_network_icon(surface)
        } else {
            IconRef::None
        }
    }

    fn wifi_indicators(&self) -> WifiIndicatorUpdate {
        let s = self.states.current();
        let cfg = &self.config;

        // Only show wifi in the cluster if connected or if wifi-only.
        let visible = s.enabled
            && ((s.connected && s.internet == InternetReachability::Yes)
                || !cfg.has_mobile_data
                || s.is_default
                || cfg.show_wifi_indicator_when_enabled);
        let description = if s.connected { s.ssid.clone() } else { None };
        let ssid_present = visible && s.ssid.is_some();

        let mut content_description = self.content_description().to_owned();
        if s.internet == InternetReachability::No {
            content_description.push(',');
            content_description.push_str(&cfg.no_internet_label);
        }

        let qs_icon = if s.is_captive_portal {
            IconRef::QsWifiDisconnected
        } else {
            self.current_icon(Surface::QuickSettings)
        };
        let aggregate = self.aggregate.snapshot();

        WifiIndicatorUpdate {
            enabled: s.enabled,
            visible,
            status_icon: IconState::new(
                visible,
                self.current_icon(Surface::StatusBar),
                content_description.clone(),
            ),
            qs_icon: IconState::new(s.connected, qs_icon, content_description),
            activity_in: ssid_present && s.activity_in,
            activity_out: ssid_present && s.activity_out,
            description,
            is_transient: s.is_transient,
            status_label: s.status_label.clone(),
            is_default: s.is_default || (!aggregate.radio_on && !aggregate.ethernet_default),
        }
    }

    fn carrier_wifi_icon(&self) -> IconRef {
        let s = self.states.current();
        let total_levels = self.config.total_wifi_levels();
        if s.connected {
            IconRef::carrier_signal(
                s.level,
                total_levels,
                s.internet == InternetReachability::No,
            )
        } else if s.enabled {
            IconRef::carrier_empty(total_levels)
        } else {
            IconRef::None
        }
    }

    fn carrier_wifi_indicators(&self) -> CarrierDataIndicatorUpdate {
        let s = self.states.current();
        let content_description = self.content_description();
        let description = if s.internet == InternetReachability::No {
            self.config.no_internet_label.clone()
        } else {
            CARRIER_MERGED_DATA_DESCRIPTION.to_owned()
        };

        let visible = s.enabled && s.connected && s.is_default;
        let icon = self.carrier_wifi_icon();
        let (type_icon, qs_type_icon, qs_icon) = if visible {
            (
                IconRef::CarrierDataType {
                    surface: Surface::StatusBar,
                },
                IconRef::CarrierDataType {
                    surface: Surface::QuickSettings,
                },
                Some(IconState::new(s.connected, icon, content_description)),
            )
        } else {
            (IconRef::None, IconRef::None, None)
        };

        CarrierDataIndicatorUpdate {
            status_icon: IconState::new(visible, icon, content_description),
            is_default: qs_icon.is_some(),
            qs_icon,
            type_icon,
            qs_type_icon,
            activity_in: s.activity_in,
            activity_out: s.activity_out,
            voice_icon: IconRef::None,
            description,
            description_rich: CARRIER_MERGED_DATA_DESCRIPTION.to_owned(),
            network_name: s
                .sub_id
                .and_then(|id| self.aggregate.network_name_for_sub(id)),
            is_wide: false,
            sub_id: s.sub_id,
            roaming: false,
            show_triangle: true,
        }
    }
}

impl SignalController for WifiSignalController {
    fn transport(&self) -> TransportKind {
        TransportKind::Wifi
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn apply_status_event(
        &mut self,
        event: &StatusEvent,
    ) -> Result<Option<IndicatorUpdate>, CoreError> {
        let mut candidate = self.states.current().clone();
        let result =
            Self::apply_event(&mut candidate, event).and_then(|()| self.commit(candidate));
        match &result {
            Ok(pending) => debug!(
                transport = %TransportKind::Wifi,
                shape = event.shape(),
                changed = pending.is_some(),
                "status event applied"
            ),
            Err(e) => warn!(
                transport = %TransportKind::Wifi,
                shape = event.shape(),
                error = %e,
                "status event rejected"
            ),
        }
        result
    }

    fn apply_initial_state(&mut self) -> Result<Option<IndicatorUpdate>, CoreError> {
        let result = self.source.fetch().and_then(|status| {
            let candidate = self.copy_wifi_status(&status);
            self.commit(candidate)
        });
        if let Err(e) = &result {
            warn!(transport = %TransportKind::Wifi, error = %e, "initial state fetch failed");
        }
        result
    }

    fn current_level(&self) -> u8 {
        self.states.current().level
    }

    fn current_update(&mut self) -> IndicatorUpdate {
        let update = self.build_update();
        self.sent.record(update)
    }

    fn refreshed_update(&mut self) -> Option<IndicatorUpdate> {
        let update = self.build_update();
        self.sent.replace_if_changed(update)
    }

    fn is_carrier_merged_for(&self, sub_id: i32) -> bool {
        let s = self.states.current();
        s.is_default && s.is_carrier_merged && s.sub_id == Some(sub_id)
    }

    fn dump(&self) -> String {
        let mut out = String::new();
        let s = self.states.current();
        let _ = writeln!(
            out,
            "WifiSignalController: group={} ({}) carrier_merged={}",
            s.icon_group,
            s.icon_group.name(),
            s.is_carrier_merged
        );
        self.states.dump_into(&mut out);
        out
    }
}

// ── Field copy helpers ──────────────────────────────────────────────

fn malformed(reason: impl Into<String>) -> CoreError {
    CoreError::MalformedEvent {
        transport: TransportKind::Wifi,
        reason: reason.into(),
    }
}

fn apply_connectivity(state: &mut WifiState, update: &ConnectivityUpdate) -> Result<(), CoreError> {
    if update.is_empty() {
        return Err(malformed("connectivity update carries no fields"));
    }

    if let Some(enabled) = update.enabled {
        state.enabled = enabled;
    }
    if let Some(connected) = update.connected {
        state.connected = connected;
        if !connected {
            // A disconnect invalidates what we knew about the network.
            state.internet = InternetReachability::Unknown;
            state.ssid = None;
        }
    }
    if let Some(is_default) = update.is_default {
        state.is_default = is_default;
    }
    if let Some(level) = update.level {
        state.level = level;
    }
    if let Some(rssi) = update.rssi {
        state.rssi = rssi;
    }
    if let Some(internet) = update.internet {
        state.internet = internet;
    }
    if let Some(ssid) = &update.ssid {
        state.ssid = Some(ssid.clone());
    }
    if let Some(merged) = update.is_carrier_merged {
        state.is_carrier_merged = merged;
    }
    if let Some(sub_id) = update.sub_id {
        state.sub_id = Some(sub_id);
    }
    if let Some(label) = &update.status_label {
        state.status_label = Some(label.clone());
    }
    if let Some(transient) = update.is_transient {
        state.is_transient = transient;
    }
    if let Some(captive) = update.is_captive_portal {
        state.is_captive_portal = captive;
    }
    Ok(())
}

fn apply_capability(state: &mut WifiState, update: CapabilityUpdate) -> Result<(), CoreError> {
    if update.is_empty() {
        return Err(malformed("capability update carries no fields"));
    }

    if let Some(standard) = update.wifi_standard {
        state.capability = CapabilityTier::from_standard(standard);
        if state.capability == CapabilityTier::Baseline && standard != 0 {
            debug!(standard, "unrecognised wifi standard, using baseline icons");
        }
    }
    if let Some(ready) = update.high_tier_ready {
        state.high_tier_ready = ready;
    }
    Ok(())
}
