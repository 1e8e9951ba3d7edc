//! Replay script model and loader.
//!
//! ```yaml
//! initial:
//!   wifi: { enabled: true, connected: true, level: 3, wifi_standard: 5 }
//! steps:
//!   - transport: wifi
//!     event: { type: capability_changed, high_tier_ready: true }
//!   - radio_on: false
//!   - carrier_name: { sub_id: 1, name: Example }
//! ```

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use netsig_core::{EthernetStatus, StatusEvent, TransportKind, WifiStatus};

use crate::error::CliError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub initial: InitialStatus,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Full status each transport's source serves at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitialStatus {
    pub wifi: Option<WifiStatus>,
    pub ethernet: Option<EthernetStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Event {
        transport: TransportKind,
        event: StatusEvent,
    },
    RadioOn {
        radio_on: bool,
    },
    CarrierName {
        carrier_name: CarrierName,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarrierName {
    pub sub_id: i32,
    pub name: String,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Event { event, .. } => event.shape(),
            Self::RadioOn { .. } => "radio_on",
            Self::CarrierName { .. } => "carrier_name",
        }
    }
}

/// Read a script from `path`, or from stdin when `path` is `-`.
pub fn load(path: &Path) -> Result<Script, CliError> {
    let display = path.display().to_string();
    let read_err = |source| CliError::ScriptRead {
        path: display.clone(),
        source,
    };

    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(read_err)?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(read_err)?
    };

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    parse(&text, is_json).map_err(|reason| CliError::ScriptParse {
        path: display.clone(),
        reason,
    })
}

pub fn parse(text: &str, is_json: bool) -> Result<Script, String> {
    if is_json {
        serde_json::from_str(text).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    }
}
