// ── Runtime signal configuration ──
//
// Tuning knobs for indicator policy. Core never reads config files;
// `netsig-config` builds a `SignalConfig` and hands it in.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Highest wifi level bucket a transport may report.
pub const MAX_SUPPORTED_WIFI_LEVEL: u8 = 8;

/// Policy inputs that do not come from the status source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Whether the device has a cellular data transport. Without one, wifi
    /// stays visible whenever it is enabled.
    pub has_mobile_data: bool,
    /// Show the wifi indicator whenever wifi is enabled, even if unvalidated.
    pub show_wifi_indicator_when_enabled: bool,
    /// Highest signal level the wifi source reports (levels are `0..=max`).
    pub max_wifi_level: u8,
    /// Number of dispatched snapshots each controller keeps for `dump()`.
    pub history_size: usize,
    /// Suffix appended to content descriptions when internet is unreachable.
    pub no_internet_label: String,
}

impl SignalConfig {
    /// Reject values no transport can satisfy.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_wifi_level == 0 || self.max_wifi_level > MAX_SUPPORTED_WIFI_LEVEL {
            return Err(CoreError::Config {
                message: format!(
                    "max_wifi_level must be within 1..={MAX_SUPPORTED_WIFI_LEVEL}, got {}",
                    self.max_wifi_level
                ),
            });
        }
        Ok(())
    }

    /// Number of level buckets, as used by packed signal-drawable states.
    pub fn total_wifi_levels(&self) -> u8 {
        self.max_wifi_level.saturating_add(1)
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            has_mobile_data: true,
            show_wifi_indicator_when_enabled: false,
            max_wifi_level: 4,
            history_size: 64,
            no_internet_label: "No internet".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SignalConfig::default().validate().is_ok());
        assert_eq!(SignalConfig::default().total_wifi_levels(), 5);
    }

    #[test]
    fn zero_max_level_is_rejected() {
        let cfg = SignalConfig {
            max_wifi_level: 0,
            ..SignalConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(CoreError::Config { .. })));
    }

    #[test]
    fn oversized_max_level_is_rejected() {
        let cfg = SignalConfig {
            max_wifi_level: MAX_SUPPORTED_WIFI_LEVEL + 1,
            ..SignalConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
