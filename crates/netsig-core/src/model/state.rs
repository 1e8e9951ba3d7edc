// ── Transport snapshots ──
//
// Plain value holders. A controller keeps two of each: the current
// snapshot it mutates and the last snapshot it actually dispatched.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::icon::IconGroup;
use crate::error::CoreError;

/// Whether the connected network has validated internet access.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InternetReachability {
    #[default]
    Unknown,
    Yes,
    No,
}

/// Radio generation class reported by the wifi source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CapabilityTier {
    #[default]
    Baseline,
    Wifi4,
    Wifi5,
    Wifi6,
}

impl CapabilityTier {
    /// Map a raw wifi standard number. Unrecognised standards fall back to
    /// `Baseline` so the indicator never goes blank.
    pub fn from_standard(standard: u8) -> Self {
        match standard {
            4 => Self::Wifi4,
            5 => Self::Wifi5,
            6 => Self::Wifi6,
            _ => Self::Baseline,
        }
    }
}

/// Traffic direction reported by the traffic-activity source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DataActivity {
    #[default]
    None,
    In,
    Out,
    #[serde(alias = "both")]
    #[strum(to_string = "in_out", serialize = "both")]
    InOut,
}

impl DataActivity {
    /// Decode the platform traffic-state code (0 none, 1 in, 2 out, 3 in/out).
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::In),
            2 => Some(Self::Out),
            3 => Some(Self::InOut),
            _ => None,
        }
    }

    pub fn is_in(self) -> bool {
        matches!(self, Self::In | Self::InOut)
    }

    pub fn is_out(self) -> bool {
        matches!(self, Self::Out | Self::InOut)
    }
}

// ── WifiState ───────────────────────────────────────────────────────

/// Snapshot of the wifi transport.
///
/// `icon_group` is derived from `capability` and `high_tier_ready` and is
/// excluded from equality; `high_tier_ready` only takes part in equality
/// while `capability` is `Wifi5`, the only tier where it means anything.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WifiState {
    pub enabled: bool,
    pub connected: bool,
    pub is_default: bool,
    pub level: u8,
    pub rssi: i32,
    pub internet: InternetReachability,
    pub ssid: Option<String>,
    pub capability: CapabilityTier,
    pub high_tier_ready: bool,
    pub is_carrier_merged: bool,
    pub sub_id: Option<i32>,
    pub status_label: Option<String>,
    pub is_transient: bool,
    pub is_captive_portal: bool,
    pub activity_in: bool,
    pub activity_out: bool,
    pub icon_group: IconGroup,
}

impl WifiState {
    /// Check the snapshot invariants before it replaces the current state.
    pub fn validate(&self, max_level: u8) -> Result<(), CoreError> {
        if self.level > max_level {
            return Err(CoreError::LevelOutOfRange {
                level: self.level,
                max: max_level,
            });
        }
        if !self.connected && self.internet == InternetReachability::Yes {
            return Err(CoreError::InconsistentState {
                reason: "internet reachable while disconnected".into(),
            });
        }
        Ok(())
    }

    pub fn set_activity(&mut self, activity: DataActivity) {
        self.activity_in = activity.is_in();
        self.activity_out = activity.is_out();
    }

    fn ready_matters(&self) -> bool {
        self.capability == CapabilityTier::Wifi5
    }
}

impl PartialEq for WifiState {
    fn eq(&self, other: &Self) -> bool {
        self.enabled == other.enabled
            && self.connected == other.connected
            && self.is_default == other.is_default
            && self.level == other.level
            && self.rssi == other.rssi
            && self.internet == other.internet
            && self.ssid == other.ssid
            && self.capability == other.capability
            && (!self.ready_matters() || self.high_tier_ready == other.high_tier_ready)
            && self.is_carrier_merged == other.is_carrier_merged
            && self.sub_id == other.sub_id
            && self.status_label == other.status_label
            && self.is_transient == other.is_transient
            && self.is_captive_portal == other.is_captive_portal
            && self.activity_in == other.activity_in
            && self.activity_out == other.activity_out
    }
}

impl Eq for WifiState {}

// ── EthernetState ───────────────────────────────────────────────────

/// Snapshot of the ethernet transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EthernetState {
    pub enabled: bool,
    pub connected: bool,
    pub is_default: bool,
    pub internet: InternetReachability,
}

impl EthernetState {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.connected && self.internet == InternetReachability::Yes {
            return Err(CoreError::InconsistentState {
                reason: "internet reachable while disconnected".into(),
            });
        }
        Ok(())
    }
}
