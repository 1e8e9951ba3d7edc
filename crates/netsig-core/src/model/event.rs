// ── Status events ──
//
// Push-based input from the external status sources. Connectivity and
// capability updates are partial: only present fields are applied.

use serde::{Deserialize, Serialize};

use super::state::{DataActivity, InternetReachability};

/// Partial connectivity update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectivityUpdate {
    pub enabled: Option<bool>,
    pub connected: Option<bool>,
    pub is_default: Option<bool>,
    pub level: Option<u8>,
    pub rssi: Option<i32>,
    pub internet: Option<InternetReachability>,
    pub ssid: Option<String>,
    pub is_carrier_merged: Option<bool>,
    pub sub_id: Option<i32>,
    pub status_label: Option<String>,
    pub is_transient: Option<bool>,
    pub is_captive_portal: Option<bool>,
}

impl ConnectivityUpdate {
    /// True when the update carries no field at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Partial capability update.
///
/// `wifi_standard` is the raw standard number (4, 5, 6); anything else
/// resolves to the baseline tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapabilityUpdate {
    pub wifi_standard: Option<u8>,
    pub high_tier_ready: Option<bool>,
}

impl CapabilityUpdate {
    pub fn is_empty(&self) -> bool {
        self.wifi_standard.is_none() && self.high_tier_ready.is_none()
    }
}

/// One event delivered to a signal state controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    ConnectivityChanged(ConnectivityUpdate),
    CapabilityChanged(CapabilityUpdate),
    TrafficActivityChanged { direction: DataActivity },
}

impl StatusEvent {
    /// Short name of the event shape, for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::ConnectivityChanged(_) => "connectivity_changed",
            Self::CapabilityChanged(_) => "capability_changed",
            Self::TrafficActivityChanged { .. } => "traffic_activity_changed",
        }
    }
}

/// Full wifi status as re-read from the source by `fetch_initial_state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WifiStatus {
    pub enabled: bool,
    pub connected: bool,
    pub is_default: bool,
    pub level: u8,
    pub rssi: i32,
    pub internet: InternetReachability,
    pub ssid: Option<String>,
    pub wifi_standard: u8,
    /// The radio supports eight spatial streams on VHT.
    pub vht_max_8_spatial_streams: bool,
    /// The access point is HE capable with eight spatial streams.
    pub he_8ss_capable_ap: bool,
    pub is_carrier_merged: bool,
    pub sub_id: Option<i32>,
    pub status_label: Option<String>,
    pub is_transient: bool,
    pub is_captive_portal: bool,
}

impl WifiStatus {
    /// Full high-throughput capability needs both radio and access point.
    pub fn high_tier_ready(&self) -> bool {
        self.vht_max_8_spatial_streams && self.he_8ss_capable_ap
    }
}

/// Full ethernet status as re-read from the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EthernetStatus {
    pub enabled: bool,
    pub connected: bool,
    pub is_default: bool,
    pub internet: InternetReachability,
}
