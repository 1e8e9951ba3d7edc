// ── Status source boundary ──
//
// The external collaborator a controller re-reads from at startup. Event
// delivery itself is push-based and goes through `handle_status_event`.

use std::sync::{Mutex, PoisonError};

use crate::error::CoreError;

/// Pull access to the full status of one transport.
pub trait StatusSource<S>: Send + Sync {
    /// Read the complete current status.
    fn fetch(&self) -> Result<S, CoreError>;
}

/// A source that serves whatever status was last stored in it.
///
/// Used by hosts that receive full status snapshots out of band, and by
/// the CLI replay driver.
#[derive(Debug, Default)]
pub struct StaticStatusSource<S> {
    status: Mutex<Option<S>>,
}

impl<S: Clone + Send> StaticStatusSource<S> {
    pub fn new(status: S) -> Self {
        Self {
            status: Mutex::new(Some(status)),
        }
    }

    /// A source with nothing to report yet; `fetch` fails until `set` is called.
    pub fn empty() -> Self {
        Self {
            status: Mutex::new(None),
        }
    }

    pub fn set(&self, status: S) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = Some(status);
    }
}

impl<S: Clone + Send> StatusSource<S> for StaticStatusSource<S> {
    fn fetch(&self) -> Result<S, CoreError> {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| CoreError::StatusSource {
                message: "no status available yet".into(),
            })
    }
}
