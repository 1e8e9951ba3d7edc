// ── Domain model ──
//
// Snapshots, status events, icon descriptors and the indicator payloads
// handed to display consumers.

pub mod event;
pub mod icon;
pub mod indicators;
pub mod state;
pub mod transport;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use netsig_core::model::*` gives you everything.

pub use event::{
    CapabilityUpdate, ConnectivityUpdate, EthernetStatus, StatusEvent, WifiStatus,
};
pub use icon::{IconGroup, IconRef, IconState, Surface};
pub use indicators::{
    CarrierDataIndicatorUpdate, EthernetIndicatorUpdate, IndicatorUpdate, WifiIndicatorUpdate,
};
pub use state::{CapabilityTier, DataActivity, EthernetState, InternetReachability, WifiState};
pub use transport::TransportKind;
