// ── Icon policy ──
//
// Pure mapping from capability inputs to the wifi icon family. Stateless,
// so it is safe to call from any thread.

use crate::model::{CapabilityTier, IconGroup};

/// Select the icon group for a capability tier.
///
/// First match wins:
///
/// | tier     | high_tier_ready | group    |
/// |----------|-----------------|----------|
/// | wifi4    | any             | `Wifi4`  |
/// | wifi5    | true            | `Wifi6`  |
/// | wifi5    | false           | `Wifi5`  |
/// | wifi6    | any             | `Wifi6`  |
/// | baseline | any             | `Default`|
///
/// A wifi5 radio running at full high-throughput capability presents the
/// wifi6 family.
pub fn resolve(tier: CapabilityTier, high_tier_ready: bool) -> IconGroup {
    match tier {
        CapabilityTier::Wifi4 => IconGroup::Wifi4,
        CapabilityTier::Wifi5 if high_tier_ready => IconGroup::Wifi6,
        CapabilityTier::Wifi5 => IconGroup::Wifi5,
        CapabilityTier::Wifi6 => IconGroup::Wifi6,
        CapabilityTier::Baseline => IconGroup::Default,
    }
}

/// Resolve straight from a raw wifi standard number.
pub fn resolve_standard(wifi_standard: u8, high_tier_ready: bool) -> IconGroup {
    resolve(CapabilityTier::from_standard(wifi_standard), high_tier_ready)
}
