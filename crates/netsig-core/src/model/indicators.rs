// ── Indicator payloads ──
//
// What display consumers receive. Exactly one payload is produced per
// dispatched transition.

use serde::Serialize;

use super::icon::{IconRef, IconState};
use super::transport::TransportKind;

/// Standalone wifi indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WifiIndicatorUpdate {
    pub enabled: bool,
    pub visible: bool,
    pub status_icon: IconState,
    pub qs_icon: IconState,
    pub activity_in: bool,
    pub activity_out: bool,
    /// Network name while connected.
    pub description: Option<String>,
    pub is_transient: bool,
    pub status_label: Option<String>,
    pub is_default: bool,
}

/// Carrier-merged wifi, presented as a cellular data connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarrierDataIndicatorUpdate {
    pub status_icon: IconState,
    /// Present only while the status-bar icon is visible.
    pub qs_icon: Option<IconState>,
    pub type_icon: IconRef,
    pub qs_type_icon: IconRef,
    pub activity_in: bool,
    pub activity_out: bool,
    pub voice_icon: IconRef,
    pub description: String,
    pub description_rich: String,
    pub network_name: Option<String>,
    pub is_wide: bool,
    pub sub_id: Option<i32>,
    pub roaming: bool,
    pub show_triangle: bool,
    pub is_default: bool,
}

/// Ethernet indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EthernetIndicatorUpdate {
    pub visible: bool,
    pub status_icon: IconState,
    pub description: String,
}

/// Tagged union of every payload a listener can receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorUpdate {
    Wifi(WifiIndicatorUpdate),
    CarrierData(CarrierDataIndicatorUpdate),
    Ethernet(EthernetIndicatorUpdate),
}

impl IndicatorUpdate {
    /// Transport that produced the payload.
    pub fn transport(&self) -> TransportKind {
        match self {
            Self::Wifi(_) | Self::CarrierData(_) => TransportKind::Wifi,
            Self::Ethernet(_) => TransportKind::Ethernet,
        }
    }

    /// Short label for the payload shape.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Wifi(_) => "wifi",
            Self::CarrierData(_) => "carrier_data",
            Self::Ethernet(_) => "ethernet",
        }
    }

    /// Whether the status-bar icon is shown.
    pub fn visible(&self) -> bool {
        match self {
            Self::Wifi(u) => u.visible,
            Self::CarrierData(u) => u.status_icon.visible,
            Self::Ethernet(u) => u.visible,
        }
    }

    pub fn status_icon(&self) -> &IconState {
        match self {
            Self::Wifi(u) => &u.status_icon,
            Self::CarrierData(u) => &u.status_icon,
            Self::Ethernet(u) => &u.status_icon,
        }
    }

    pub fn as_wifi(&self) -> Option<&WifiIndicatorUpdate> {
        match self {
            Self::Wifi(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_carrier_data(&self) -> Option<&CarrierDataIndicatorUpdate> {
        match self {
            Self::CarrierData(u) => Some(u),
            _ => None,
        }
    }
}
