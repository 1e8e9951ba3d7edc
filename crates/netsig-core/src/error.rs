// ── Core error types ──
//
// Nothing in this crate is fatal to the process. Rejected events leave the
// snapshot untouched; listener failures are isolated by the dispatcher.

use thiserror::Error;

use crate::model::TransportKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Event errors ─────────────────────────────────────────────────
    #[error("Malformed {transport} status event: {reason}")]
    MalformedEvent {
        transport: TransportKind,
        reason: String,
    },

    #[error("Signal level {level} out of range (max {max})")]
    LevelOutOfRange { level: u8, max: u8 },

    #[error("Inconsistent snapshot: {reason}")]
    InconsistentState { reason: String },

    // ── Registry errors ──────────────────────────────────────────────
    #[error("A controller for {transport} is already registered")]
    DuplicateTransport { transport: TransportKind },

    #[error("No controller registered for {transport}")]
    UnknownTransport { transport: TransportKind },

    #[error("Cannot update {transport} from inside a listener callback")]
    ReentrantUpdate { transport: TransportKind },

    // ── Collaborator errors ──────────────────────────────────────────
    #[error("Status source failed: {message}")]
    StatusSource { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Error a display listener may return from a callback.
///
/// The dispatcher logs it and moves on to the next listener; the state
/// transition that triggered the callback is not rolled back.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("listener rejected update: {0}")]
    Rejected(String),

    #[error("listener channel closed")]
    Closed,

    #[error("listener I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
