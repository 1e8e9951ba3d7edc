// ── Transport identity ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identity of a transport owned by the registry. At most one controller
/// exists per kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransportKind {
    Wifi,
    Ethernet,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        assert_eq!(TransportKind::Wifi.to_string(), "wifi");
        assert_eq!("ethernet".parse::<TransportKind>().unwrap(), TransportKind::Ethernet);
    }
}
