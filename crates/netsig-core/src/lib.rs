//! Signal-state aggregation and diff-and-notify engine for network
//! transport indicators.
//!
//! Status events from a platform source flow in; typed indicator payloads
//! flow out to display listeners, only when something a listener can see
//! has changed:
//!
//! - **[`ControllerRegistry`]**: Host-facing facade. Owns one controller
//!   per [`TransportKind`], the shared [`Dispatcher`], and the
//!   [`Aggregate`] of cross-transport facts (default route, wifi level,
//!   airplane mode).
//!
//! - **[`WifiSignalController`] / [`EthernetSignalController`]**: Keep a
//!   current/last snapshot pair each. Events are applied to a candidate,
//!   validated, committed, and dispatched only when the committed snapshot
//!   differs from the last dispatched one.
//!
//! - **[`policy`]**: Maps capability tier and readiness to an
//!   [`IconGroup`]. Pure and total.
//!
//! - **[`Dispatcher`]**: Ordered fan-out to [`SignalCallback`]s with
//!   per-listener failure isolation. [`BroadcastListener`] bridges it onto
//!   an async [`UpdateStream`].

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod policy;
pub mod registry;
pub mod source;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{MAX_SUPPORTED_WIFI_LEVEL, SignalConfig};
pub use controller::{
    DispatchOutcome, EthernetSignalController, HistoryEntry, SentUpdate, ShadowState,
    SignalController, WifiSignalController,
};
pub use dispatch::{
    BroadcastListener, DispatchReport, Dispatcher, SignalCallback, SubscriptionHandle,
    UpdateStream,
};
pub use error::{CoreError, ListenerError};
pub use registry::{Aggregate, AggregateState, ControllerRegistry};
pub use source::{StaticStatusSource, StatusSource};

pub use model::{
    CapabilityTier, CapabilityUpdate, CarrierDataIndicatorUpdate, ConnectivityUpdate,
    DataActivity, EthernetIndicatorUpdate, EthernetState, EthernetStatus, IconGroup, IconRef,
    IconState, IndicatorUpdate, InternetReachability, StatusEvent, Surface, TransportKind,
    WifiIndicatorUpdate, WifiState, WifiStatus,
};
