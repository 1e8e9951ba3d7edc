// ── Icon descriptors ──
//
// Icons are opaque references resolved to resources by the display layer.
// `Display` renders the resource name a consumer would look up.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Accessibility strings indexed by signal level.
const WIFI_CONNECTION_STRENGTH: [&str; 5] = [
    "No Wi-Fi",
    "Wi-Fi one bar",
    "Wi-Fi two bars",
    "Wi-Fi three bars",
    "Wi-Fi signal full",
];

const WIFI_NO_CONNECTION: &str = "No Wi-Fi";

/// Where an icon is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Surface {
    StatusBar,
    QuickSettings,
}

impl Surface {
    fn prefix(self) -> &'static str {
        match self {
            Self::StatusBar => "ic_",
            Self::QuickSettings => "ic_qs_",
        }
    }
}

// ── IconGroup ───────────────────────────────────────────────────────

/// Family of wifi icon resources and accessibility strings, selected by
/// capability tier. Connectivity only gates visibility, never the family.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IconGroup {
    #[default]
    Default,
    Wifi4,
    Wifi5,
    Wifi6,
}

impl IconGroup {
    /// Human-readable group name used in dumps.
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "Wi-Fi Icons",
            Self::Wifi4 => "Wi-Fi 4 Icons",
            Self::Wifi5 => "Wi-Fi 5 Icons",
            Self::Wifi6 => "Wi-Fi 6 Icons",
        }
    }

    fn generation(self) -> &'static str {
        match self {
            Self::Default => "",
            Self::Wifi4 => "_4",
            Self::Wifi5 => "_5",
            Self::Wifi6 => "_6",
        }
    }

    pub fn signal_icon(self, surface: Surface, level: u8, no_internet: bool) -> IconRef {
        IconRef::WifiSignal {
            group: self,
            surface,
            level,
            no_internet,
        }
    }

    /// Icon shown while enabled but not connected.
    pub fn no_network_icon(self, surface: Surface) -> IconRef {
        IconRef::WifiNoNetwork { surface }
    }

    /// Strength description for a connected state. Levels past the table
    /// clamp to "signal full".
    pub fn content_description(self, level: u8) -> &'static str {
        let idx = usize::from(level).min(WIFI_CONNECTION_STRENGTH.len() - 1);
        WIFI_CONNECTION_STRENGTH
            .get(idx)
            .copied()
            .unwrap_or(WIFI_NO_CONNECTION)
    }

    pub fn disconnected_description(self) -> &'static str {
        WIFI_NO_CONNECTION
    }
}

// ── IconRef ─────────────────────────────────────────────────────────

/// Opaque reference to a single icon resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IconRef {
    /// Nothing drawn.
    #[default]
    None,
    WifiSignal {
        group: IconGroup,
        surface: Surface,
        level: u8,
        no_internet: bool,
    },
    WifiNoNetwork {
        surface: Surface,
    },
    /// Quick-settings icon shown behind a captive portal.
    QsWifiDisconnected,
    /// Packed signal-drawable state used by carrier-merged wifi.
    CarrierSignal {
        level: u8,
        total_levels: u8,
        no_internet: bool,
    },
    /// The carrier-merged data type badge.
    CarrierDataType {
        surface: Surface,
    },
    Ethernet {
        no_internet: bool,
    },
}

impl IconRef {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Signal-drawable state for a level out of `total_levels` buckets.
    pub fn carrier_signal(level: u8, total_levels: u8, no_internet: bool) -> Self {
        Self::CarrierSignal {
            level,
            total_levels,
            no_internet,
        }
    }

    /// Signal-drawable state with no bars, drawn cut out.
    pub fn carrier_empty(total_levels: u8) -> Self {
        Self::carrier_signal(0, total_levels, true)
    }
}

impl fmt::Display for IconRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cut = |no_internet: bool| if no_internet { "_no_internet" } else { "" };
        match *self {
            Self::None => write!(f, "none"),
            Self::WifiSignal {
                group,
                surface,
                level,
                no_internet,
            } => write!(
                f,
                "{}wifi{}_signal_{level}{}",
                surface.prefix(),
                group.generation(),
                cut(no_internet)
            ),
            Self::WifiNoNetwork { surface } => write!(f, "{}wifi_no_network", surface.prefix()),
            Self::QsWifiDisconnected => write!(f, "ic_qs_wifi_disconnected"),
            Self::CarrierSignal {
                level,
                total_levels,
                no_internet,
            } => write!(f, "signal_{level}_of_{total_levels}{}", cut(no_internet)),
            Self::CarrierDataType { surface } => write!(f, "{}carrier_wifi", surface.prefix()),
            Self::Ethernet { no_internet } => write!(f, "ic_ethernet{}", cut(no_internet)),
        }
    }
}

/// An icon together with its visibility and accessibility text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct IconState {
    pub visible: bool,
    pub icon: IconRef,
    pub content_description: String,
}

impl IconState {
    pub fn new(visible: bool, icon: IconRef, content_description: impl Into<String>) -> Self {
        Self {
            visible,
            icon,
            content_description: content_description.into(),
        }
    }
}
